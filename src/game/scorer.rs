use std::collections::HashMap;

use super::{
    error::{GameError, GameResult},
    Multiplier, MultiplierKind,
};

/// One cell of a word as seen by the scorer
#[derive(Debug, Clone, Copy)]
pub struct ScoredCell {
    pub letter: Option<char>,
    /// Multiplier still available on the cell, `None` once consumed
    pub multiplier: Option<Multiplier>,
    pub is_blank: bool,
}

pub struct Scorer;

impl Scorer {
    /// Calculate the score of one word.
    ///
    /// Scoring rules:
    /// - Each letter has a base value, a blank is worth 0
    /// - A letter multiplier multiplies that letter's value
    /// - A word multiplier multiplies the summed word, several of them compound
    pub fn score_word(cells: &[ScoredCell], points: &HashMap<char, i32>) -> GameResult<i32> {
        let mut subtotal = 0;
        let mut word_factor = 1;

        for cell in cells {
            let letter = cell.letter.ok_or(GameError::LetterIsNull)?;
            let base_value = if cell.is_blank {
                0
            } else {
                *points
                    .get(&letter)
                    .ok_or(GameError::PointsNotFound(letter))?
            };

            subtotal += match cell.multiplier {
                Some(Multiplier {
                    amount,
                    kind: MultiplierKind::Letter,
                }) => base_value * amount,
                Some(Multiplier {
                    amount,
                    kind: MultiplierKind::Word,
                }) => {
                    word_factor *= amount;
                    base_value
                }
                None => base_value,
            };
        }

        Ok(subtotal * word_factor)
    }
}
