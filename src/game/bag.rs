use rand::Rng;

use crate::config::LetterSpec;

/// The pool of letters not yet drawn by any player
#[derive(Debug, Clone)]
pub struct Bag {
    letters: Vec<char>,
}

impl Bag {
    /// Fill a bag with `amount` copies of every configured letter
    pub fn new(distribution: &[LetterSpec]) -> Self {
        let letters = distribution
            .iter()
            .flat_map(|spec| std::iter::repeat(spec.letter).take(spec.amount as usize))
            .collect();
        Self { letters }
    }

    #[cfg(test)]
    pub fn from_letters(letters: Vec<char>) -> Self {
        Self { letters }
    }

    /// Draw up to `count` random letters, fewer if the bag runs out
    pub fn draw(&mut self, count: usize) -> Vec<char> {
        let mut rng = rand::rng();
        let count = count.min(self.letters.len());

        (0..count)
            .map(|_| {
                let idx = rng.random_range(0..self.letters.len());
                self.letters.swap_remove(idx)
            })
            .collect()
    }

    /// Put `old` back in the bag, then draw as many replacements
    pub fn exchange_letters(&mut self, old: &[char]) -> Vec<char> {
        self.letters.extend_from_slice(old);
        self.draw(old.len())
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;

    #[test]
    fn test_bag_holds_configured_letter_count() {
        let config = BoardConfig::default();
        let expected: u32 = config.letter_distribution.iter().map(|spec| spec.amount).sum();

        let bag = Bag::new(&config.letter_distribution);
        assert_eq!(bag.len(), expected as usize);
    }

    #[test]
    fn test_draw_shrinks_bag() {
        let mut bag = Bag::new(&BoardConfig::default().letter_distribution);
        let before = bag.len();

        let drawn = bag.draw(7);
        assert_eq!(drawn.len(), 7);
        assert_eq!(bag.len(), before - 7);
    }

    #[test]
    fn test_draw_more_than_remaining_empties_bag() {
        let mut bag = Bag::from_letters(vec!['A', 'B', 'C']);

        let drawn = bag.draw(7);
        assert_eq!(drawn.len(), 3, "Only the remaining letters can be drawn");
        assert!(bag.is_empty());
    }

    #[test]
    fn test_exchange_keeps_bag_size() {
        let mut bag = Bag::new(&BoardConfig::default().letter_distribution);
        let before = bag.len();

        let replacements = bag.exchange_letters(&['Q', 'Z', 'X']);
        assert_eq!(replacements.len(), 3);
        assert_eq!(bag.len(), before, "Exchanging must not change the bag size");
    }

    #[test]
    fn test_exchange_on_empty_bag_returns_old_letters() {
        let mut bag = Bag::from_letters(Vec::new());

        let mut replacements = bag.exchange_letters(&['K', 'K']);
        replacements.sort();
        assert_eq!(replacements, vec!['K', 'K']);
        assert!(bag.is_empty());
    }
}
