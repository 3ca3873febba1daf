//! Candidate search on a board that already holds letters.
//!
//! Every row and column is matched against the dictionary: a word fits a line
//! when it agrees with the letters already there, touches at least one of
//! them, and the easel can supply the remaining cells. Candidates that would
//! create an invalid word across the line are dropped.

use std::collections::HashSet;

use tokio::time::Instant;

use super::{rack::Rack, Solution};
use crate::{
    dictionary::Dictionary,
    game::{
        board::{Board, Pending},
        Direction, PlacedLetter, Position,
    },
};

/// Cell `index` of line `line` read along `direction`
fn cell_position(direction: Direction, line: usize, index: usize) -> Position {
    let position = Position::new(index as i32, line as i32);
    match direction {
        Direction::Horizontal => position,
        Direction::Vertical => position.flip(),
    }
}

pub async fn line_solutions(
    board: &Board,
    dictionary: &Dictionary,
    rack: &Rack,
    deadline: Instant,
) -> Vec<Solution> {
    let size = board.size();
    let mut solutions = Vec::new();

    for direction in [Direction::Horizontal, Direction::Vertical] {
        for line in 0..size {
            tokio::task::yield_now().await;
            if Instant::now() >= deadline {
                tracing::debug!("Solver deadline reached during line search");
                return solutions;
            }

            let cells: Vec<Option<char>> = (0..size)
                .map(|index| board.letter_at(cell_position(direction, line, index)))
                .collect();
            let filled: Vec<usize> = (0..size).filter(|&i| cells[i].is_some()).collect();
            let (Some(&first_filled), Some(&last_filled)) = (filled.first(), filled.last()) else {
                continue;
            };

            for word in dictionary.words_in(2..=size) {
                let letters: Vec<char> = word.chars().collect();
                let len = letters.len();

                let lowest = (first_filled + 1).saturating_sub(len);
                let highest = last_filled.min(size - len);
                for start in lowest..=highest {
                    let Some(needed) = match_line(&cells, &letters, start, rack.size()) else {
                        continue;
                    };
                    let wanted: Vec<char> = needed.iter().map(|(_, letter)| *letter).collect();
                    let Some(from_blank) = rack.assign(&wanted) else {
                        continue;
                    };

                    let placed: Vec<PlacedLetter> = needed
                        .iter()
                        .map(|&(index, letter)| {
                            PlacedLetter::new(letter, cell_position(direction, line, index))
                        })
                        .collect();
                    let blank_positions: HashSet<Position> =
                        from_blank.iter().map(|&idx| placed[idx].position).collect();

                    if crosses_are_valid(board, dictionary, &placed, &blank_positions, direction) {
                        solutions.push(Solution {
                            placed_letters: placed,
                            blank_positions,
                            direction,
                        });
                    }
                }
            }
        }
    }

    solutions
}

/// Check `word` laid on `cells` from `start`.
///
/// Returns the empty cells the easel must fill, as `(index, letter)`, when the
/// word agrees with the line, is not glued to a neighbouring letter, uses at
/// least one existing letter and needs between one and `max_new` new ones.
fn match_line(
    cells: &[Option<char>],
    word: &[char],
    start: usize,
    max_new: usize,
) -> Option<Vec<(usize, char)>> {
    let end = start + word.len();
    if end > cells.len() {
        return None;
    }
    if start > 0 && cells[start - 1].is_some() {
        return None;
    }
    if end < cells.len() && cells[end].is_some() {
        return None;
    }

    let mut anchored = false;
    let mut needed = Vec::new();
    for (offset, &letter) in word.iter().enumerate() {
        match cells[start + offset] {
            Some(existing) if existing == letter => anchored = true,
            Some(_) => return None,
            None => {
                needed.push((start + offset, letter));
                if needed.len() > max_new {
                    return None;
                }
            }
        }
    }

    (anchored && !needed.is_empty()).then_some(needed)
}

/// Every word the placement forms across `direction` must be in the dictionary
pub fn crosses_are_valid(
    board: &Board,
    dictionary: &Dictionary,
    placed: &[PlacedLetter],
    blanks: &HashSet<Position>,
    direction: Direction,
) -> bool {
    let pending = Pending {
        letters: placed,
        blanks,
    };
    placed.iter().all(|letter| {
        let cross = board.word_through(letter.position, direction.perpendicular(), &pending);
        cross.len() < 2 || dictionary.contains(&cross.iter().map(|l| l.letter).collect::<String>())
    })
}

/// Grow new words across the line through each single-letter candidate.
///
/// The new word may only use empty cells on both sides of the anchor letter,
/// stopping one cell short of any letter already on the board.
pub async fn perpendicular_extensions(
    board: &Board,
    dictionary: &Dictionary,
    rack: &Rack,
    singles: &[Solution],
    deadline: Instant,
) -> Vec<Solution> {
    let mut extensions = Vec::new();

    for single in singles.iter().filter(|s| s.placed_letters.len() == 1) {
        tokio::task::yield_now().await;
        if Instant::now() >= deadline {
            tracing::debug!("Solver deadline reached during extension search");
            break;
        }

        let anchor = single.placed_letters[0];
        let direction = single.direction.perpendicular();
        let step = direction.step();

        let Some(before) = free_span(board, anchor.position, step * -1) else {
            continue;
        };
        let Some(after) = free_span(board, anchor.position, step) else {
            continue;
        };

        let longest = (before + after + 1).min(rack.size());
        for word in dictionary.words_in(2..=longest) {
            let letters: Vec<char> = word.chars().collect();
            let len = letters.len();

            for (k, _) in letters.iter().enumerate().filter(|&(_, &l)| l == anchor.letter) {
                if k > before || len - 1 - k > after {
                    continue;
                }
                let Some(from_blank) = rack.assign(&letters) else {
                    continue;
                };

                let origin = anchor.position - step * k as i32;
                let placed: Vec<PlacedLetter> = letters
                    .iter()
                    .enumerate()
                    .map(|(i, &letter)| PlacedLetter::new(letter, origin + step * i as i32))
                    .collect();
                let blank_positions: HashSet<Position> =
                    from_blank.iter().map(|&idx| placed[idx].position).collect();

                if crosses_are_valid(board, dictionary, &placed, &blank_positions, direction) {
                    extensions.push(Solution {
                        placed_letters: placed,
                        blank_positions,
                        direction,
                    });
                }
            }
        }
    }

    extensions
}

/// Empty cells usable from `from` towards `step`, or `None` when the very next
/// cell already holds a letter
fn free_span(board: &Board, from: Position, step: Position) -> Option<usize> {
    let mut span = 0;
    let mut current = from + step;
    while current.is_within(board.size()) && !board.is_occupied(current) {
        span += 1;
        current = current + step;
    }

    if current.is_within(board.size()) {
        // Stopped by a letter, keep one empty cell between it and the new word
        if span == 0 {
            return None;
        }
        span -= 1;
    }
    Some(span)
}
