use std::collections::HashSet;

use super::{
    board::Board,
    error::{GameError, GameResult},
    Direction, PlacedLetter, Position,
};

pub struct PlacementValidator;

impl PlacementValidator {
    /// Check that `letters` can physically go on the board as one word and
    /// return the direction they run in.
    ///
    /// A single letter has no direction of its own, it is reported as
    /// horizontal.
    pub fn check_shape(board: &Board, letters: &[PlacedLetter]) -> GameResult<Direction> {
        if letters.is_empty() {
            return Err(GameError::WrongWordPosition);
        }

        // Check that all positions are within bounds
        if !letters.iter().all(|l| l.position.is_within(board.size())) {
            return Err(GameError::WrongPosition);
        }

        // Check that no position is used twice or already holds a letter
        let unique_positions: HashSet<_> = letters.iter().map(|l| l.position).collect();
        if unique_positions.len() != letters.len()
            || letters.iter().any(|l| board.is_occupied(l.position))
        {
            return Err(GameError::PositionOccupied);
        }

        let direction = Self::direction_of(letters)?;

        // Every cell between the first and last letter must end up filled
        let step = direction.step();
        let first = letters.iter().map(|l| l.position).min().unwrap_or(letters[0].position);
        let last = letters.iter().map(|l| l.position).max().unwrap_or(letters[0].position);
        let mut current = first;
        while current != last {
            current = current + step;
            if !unique_positions.contains(&current) && !board.is_occupied(current) {
                return Err(GameError::WrongWordPosition);
            }
        }

        Ok(direction)
    }

    /// The first word of a game must cover the center cell
    pub fn covers_center(board: &Board, letters: &[PlacedLetter]) -> bool {
        letters.iter().any(|l| l.position == board.center())
    }

    fn direction_of(letters: &[PlacedLetter]) -> GameResult<Direction> {
        let origin = letters[0].position;
        if letters.iter().all(|l| l.position.y == origin.y) {
            Ok(Direction::Horizontal)
        } else if letters.iter().all(|l| l.position.x == origin.x) {
            Ok(Direction::Vertical)
        } else {
            Err(GameError::WrongWordPosition)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BoardConfig, dictionary::Dictionary};
    use std::sync::Arc;

    fn board() -> Board {
        Board::new(&BoardConfig::default(), Arc::new(Dictionary::empty()))
    }

    fn letters(cells: &[(char, i32, i32)]) -> Vec<PlacedLetter> {
        cells
            .iter()
            .map(|&(letter, x, y)| PlacedLetter::new(letter, Position::new(x, y)))
            .collect()
    }

    #[test]
    fn test_aligned_letters() {
        let board = board();
        assert_eq!(
            PlacementValidator::check_shape(&board, &letters(&[('A', 7, 7), ('B', 8, 7)])),
            Ok(Direction::Horizontal)
        );
        assert_eq!(
            PlacementValidator::check_shape(&board, &letters(&[('A', 7, 7), ('B', 7, 8)])),
            Ok(Direction::Vertical)
        );
    }

    #[test]
    fn test_rejects_diagonal_and_gaps() {
        let board = board();
        assert_eq!(
            PlacementValidator::check_shape(&board, &letters(&[('A', 7, 7), ('B', 8, 8)])),
            Err(GameError::WrongWordPosition)
        );
        assert_eq!(
            PlacementValidator::check_shape(&board, &letters(&[('A', 7, 7), ('B', 9, 7)])),
            Err(GameError::WrongWordPosition),
            "An empty cell between two letters splits the word"
        );
    }

    #[test]
    fn test_rejects_out_of_board_and_duplicates() {
        let board = board();
        assert_eq!(
            PlacementValidator::check_shape(&board, &letters(&[('A', 14, 7), ('B', 15, 7)])),
            Err(GameError::WrongPosition)
        );
        assert_eq!(
            PlacementValidator::check_shape(&board, &letters(&[('A', 3, 3), ('B', 3, 3)])),
            Err(GameError::PositionOccupied)
        );
    }
}
