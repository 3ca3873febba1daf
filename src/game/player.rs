use std::collections::HashMap;

use serde::Serialize;

use super::error::{GameError, GameResult};

pub const EASEL_SIZE: usize = 7;

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub name: String,
    pub easel: Vec<char>,
    pub score: i32,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            easel: Vec::with_capacity(EASEL_SIZE),
            score: 0,
        }
    }

    /// True when every letter of `letters` (counted with repetition) is on the easel
    pub fn has_letters(&self, letters: &[char]) -> bool {
        let mut available = letter_counts(&self.easel);
        letters.iter().all(|letter| match available.get_mut(letter) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        })
    }

    /// Remove `letters` from the easel, all or nothing
    pub fn remove_letters(&mut self, letters: &[char]) -> GameResult<()> {
        if !self.has_letters(letters) {
            return Err(GameError::LettersAreNotInEasel);
        }

        for letter in letters {
            if let Some(idx) = self.easel.iter().position(|l| l == letter) {
                self.easel.swap_remove(idx);
            }
        }
        Ok(())
    }

    pub fn add_letters(&mut self, letters: &[char]) {
        self.easel.extend_from_slice(letters);
    }

    /// Sum of the point values of the letters left on the easel
    pub fn easel_points(&self, points: &HashMap<char, i32>) -> i32 {
        self.easel
            .iter()
            .map(|letter| points.get(letter).copied().unwrap_or(0))
            .sum()
    }
}

pub fn letter_counts(letters: &[char]) -> HashMap<char, usize> {
    let mut counts = HashMap::new();
    for letter in letters {
        *counts.entry(*letter).or_insert(0) += 1;
    }
    counts
}
