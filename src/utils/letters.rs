use std::collections::HashMap;
use once_cell::sync::Lazy;

/// Marker for a blank tile, on an easel or in the bag
pub const BLANK: char = '*';

/// Letter values, Scrabble scoring (blank scores nothing)
pub static LETTER_VALUES: Lazy<HashMap<char, i32>> = Lazy::new(|| {
    let mut map = HashMap::new();

    map.insert(BLANK, 0);

    // 1 point letters
    for ch in ['A', 'E', 'I', 'O', 'U', 'L', 'N', 'R', 'S', 'T'] {
        map.insert(ch, 1);
    }

    // 2 points
    for ch in ['D', 'G'] {
        map.insert(ch, 2);
    }

    // 3 points
    for ch in ['B', 'C', 'M', 'P'] {
        map.insert(ch, 3);
    }

    // 4 points
    for ch in ['F', 'H', 'V', 'W', 'Y'] {
        map.insert(ch, 4);
    }

    // 5 points
    map.insert('K', 5);

    // 8 points
    for ch in ['J', 'X'] {
        map.insert(ch, 8);
    }

    // 10 points
    for ch in ['Q', 'Z'] {
        map.insert(ch, 10);
    }

    map
});

/// Tile counts for a standard 100 tile bag
pub static LETTER_DISTRIBUTION: Lazy<Vec<(char, u32)>> = Lazy::new(|| {
    vec![
        ('A', 9),
        ('B', 2),
        ('C', 2),
        ('D', 4),
        ('E', 12),
        ('F', 2),
        ('G', 3),
        ('H', 2),
        ('I', 9),
        ('J', 1),
        ('K', 1),
        ('L', 4),
        ('M', 2),
        ('N', 6),
        ('O', 8),
        ('P', 2),
        ('Q', 1),
        ('R', 6),
        ('S', 4),
        ('T', 6),
        ('U', 4),
        ('V', 2),
        ('W', 2),
        ('X', 1),
        ('Y', 2),
        ('Z', 1),
        (BLANK, 2),
    ]
});

pub fn is_vowel(letter: char) -> bool {
    matches!(letter.to_ascii_uppercase(), 'A' | 'E' | 'I' | 'O' | 'U' | 'Y')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_values() {
        assert_eq!(LETTER_VALUES[&'E'], 1);
        assert_eq!(LETTER_VALUES[&'Q'], 10);
        assert_eq!(LETTER_VALUES[&'X'], 8);
        assert_eq!(LETTER_VALUES[&'D'], 2);
        assert_eq!(LETTER_VALUES[&BLANK], 0);
    }

    #[test]
    fn test_distribution_totals_one_hundred_tiles() {
        let total: u32 = LETTER_DISTRIBUTION.iter().map(|(_, count)| count).sum();
        assert_eq!(total, 100);
        // Every distributed letter must have a value
        assert!(LETTER_DISTRIBUTION
            .iter()
            .all(|(letter, _)| LETTER_VALUES.contains_key(letter)));
    }
}
