use std::collections::HashSet;

use tokio::time::Instant;

use super::{rack::Rack, Solution};
use crate::{
    dictionary::Dictionary,
    game::{Board, Direction, MultiplierKind, PlacedLetter, Position},
};

/// Words at least this long are shifted to put their best letter on a bonus
pub const BONUS_ALIGN_MIN_LENGTH: usize = 5;

const WORDS_BETWEEN_YIELDS: usize = 512;

/// Opening moves: every word the easel can spell, laid across the center row
pub async fn first_move_solutions(
    board: &Board,
    dictionary: &Dictionary,
    rack: &Rack,
    deadline: Instant,
) -> Vec<Solution> {
    let center = board.center();
    let longest = rack.size().min(board.size());
    let mut solutions = Vec::new();

    for (count, word) in dictionary.words_in(2..=longest).enumerate() {
        if count % WORDS_BETWEEN_YIELDS == 0 {
            tokio::task::yield_now().await;
            if Instant::now() >= deadline {
                tracing::debug!("Solver deadline reached during opening search");
                break;
            }
        }

        let letters: Vec<char> = word.chars().collect();
        let Some(from_blank) = rack.assign(&letters) else {
            continue;
        };

        let start = opening_start(board, &letters, &from_blank);
        let placed: Vec<PlacedLetter> = letters
            .iter()
            .enumerate()
            .map(|(i, &letter)| PlacedLetter::new(letter, Position::new(start + i as i32, center.y)))
            .collect();
        let blank_positions: HashSet<Position> =
            from_blank.iter().map(|&idx| placed[idx].position).collect();

        solutions.push(Solution {
            placed_letters: placed,
            blank_positions,
            direction: Direction::Horizontal,
        });
    }

    solutions
}

/// First column of an opening word. The word is centered, unless it is long
/// enough to land its most valuable letter on a letter bonus of the center row
/// while still covering the center.
fn opening_start(board: &Board, letters: &[char], from_blank: &[usize]) -> i32 {
    let center = board.center();
    let len = letters.len() as i32;
    let centered = center.x - (len - 1) / 2;

    if letters.len() < BONUS_ALIGN_MIN_LENGTH {
        return centered;
    }

    let points = board.points();
    let Some(best) = (0..letters.len())
        .filter(|idx| !from_blank.contains(idx))
        .max_by_key(|&idx| points.get(&letters[idx]).copied().unwrap_or(0))
    else {
        return centered;
    };

    let size = board.size() as i32;
    (0..size)
        .filter(|&x| {
            board
                .multiplier_at(Position::new(x, center.y))
                .is_some_and(|m| m.kind == MultiplierKind::Letter)
        })
        .map(|x| x - best as i32)
        .filter(|&start| start >= 0 && start + len <= size)
        .filter(|&start| start <= center.x && center.x < start + len)
        .min_by_key(|&start| (start - centered).abs())
        .unwrap_or(centered)
}
