use std::collections::HashMap;

use crate::{game::player::letter_counts, utils::letters::BLANK};

/// What an easel can supply to a candidate word
#[derive(Debug, Clone)]
pub struct Rack {
    counts: HashMap<char, usize>,
    blanks: usize,
    size: usize,
}

impl Rack {
    pub fn from_easel(easel: &[char]) -> Self {
        let mut counts = letter_counts(easel);
        let blanks = counts.remove(&BLANK).unwrap_or(0);
        Self {
            counts,
            blanks,
            size: easel.len(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Decide which of the `needed` letters must come from a blank.
    ///
    /// Returns the indices (into `needed`) played with a blank, or `None` when
    /// the easel cannot supply the letters at all.
    pub fn assign(&self, needed: &[char]) -> Option<Vec<usize>> {
        if needed.len() > self.size {
            return None;
        }

        let mut counts = self.counts.clone();
        let mut blanks_left = self.blanks;
        let mut from_blank = Vec::new();

        for (idx, letter) in needed.iter().enumerate() {
            match counts.get_mut(letter) {
                Some(count) if *count > 0 => *count -= 1,
                _ if blanks_left > 0 => {
                    blanks_left -= 1;
                    from_blank.push(idx);
                }
                _ => return None,
            }
        }

        Some(from_blank)
    }
}
