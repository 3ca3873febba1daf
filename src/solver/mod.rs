// Move search for hints and the bot

pub mod bot;
mod first_move;
mod rack;
mod search;

use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::game::{Board, Direction, GameError, GameResult, PlaceCommand, PlacedLetter, Position};
use rack::Rack;

pub use bot::{choose_move, BotMove};

/// Suggestions returned for one `!hint`
pub const HINT_COUNT: usize = 3;

/// A legal placement found by the search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub placed_letters: Vec<PlacedLetter>,
    pub blank_positions: HashSet<Position>,
    pub direction: Direction,
}

impl Solution {
    /// The `!place` command that replays this solution
    pub fn to_command(&self) -> PlaceCommand {
        PlaceCommand::from_placement(&self.placed_letters, &self.blank_positions, self.direction)
    }

    fn key(&self) -> Vec<(Position, char, bool)> {
        let mut key: Vec<(Position, char, bool)> = self
            .placed_letters
            .iter()
            .map(|l| (l.position, l.letter, self.blank_positions.contains(&l.position)))
            .collect();
        key.sort();
        key
    }
}

/// Searches one board snapshot for the placements an easel allows.
///
/// The search works on its own copy of the board and never blocks past its
/// deadline: whatever was found by then is returned.
pub struct Solver {
    board: Board,
    easel: Vec<char>,
    deadline: Instant,
}

impl Solver {
    pub fn new(board: Board, easel: Vec<char>, timeout: Duration) -> Self {
        Self {
            board,
            easel,
            deadline: Instant::now() + timeout,
        }
    }

    /// A few `!place` suggestions spread across the range of scores
    pub async fn hints(&self) -> GameResult<Vec<String>> {
        let scored = self.scored_solutions(false).await?;
        let commands: Vec<String> = scored
            .iter()
            .map(|(solution, _)| solution.to_command().to_string())
            .collect();

        Ok(spread_sample(&mut rand::rng(), &commands, HINT_COUNT))
    }

    /// Every candidate found with its score, best first.
    ///
    /// `extend_search` adds words grown across single-letter candidates.
    pub async fn bot_solutions(&self, extend_search: bool) -> GameResult<Vec<(Solution, i32)>> {
        self.scored_solutions(extend_search).await
    }

    async fn scored_solutions(&self, extend_search: bool) -> GameResult<Vec<(Solution, i32)>> {
        let started = Instant::now();
        let rack = Rack::from_easel(&self.easel);
        let dictionary = self.board.dictionary();
        let is_first_move = self.board.is_center_empty();

        let mut candidates = if is_first_move {
            first_move::first_move_solutions(&self.board, dictionary, &rack, self.deadline).await
        } else {
            search::line_solutions(&self.board, dictionary, &rack, self.deadline).await
        };

        if extend_search && !is_first_move {
            let extensions = search::perpendicular_extensions(
                &self.board,
                dictionary,
                &rack,
                &candidates,
                self.deadline,
            )
            .await;
            candidates.extend(extensions);
        }

        let mut seen = HashSet::new();
        let mut scored = Vec::new();
        for solution in candidates {
            if !seen.insert(solution.key()) {
                continue;
            }
            match self
                .board
                .evaluate(&solution.placed_letters, &solution.blank_positions, is_first_move)
            {
                Ok(evaluation) => scored.push((solution, evaluation.score)),
                Err(err @ (GameError::LetterIsNull | GameError::PointsNotFound(_))) => {
                    return Err(err)
                }
                Err(err) => tracing::trace!("Dropping candidate: {}", err),
            }
        }

        scored.sort_by(|a, b| b.1.cmp(&a.1));

        tracing::debug!(
            "Solver found {} candidates in {:?}",
            scored.len(),
            started.elapsed()
        );

        Ok(scored)
    }
}

/// Keep every item when there are few of them, otherwise one random pick from
/// each of `count` equal slices of the list
fn spread_sample<T: Clone, R: Rng>(rng: &mut R, items: &[T], count: usize) -> Vec<T> {
    if items.len() <= count {
        return items.to_vec();
    }

    let slice = items.len() / count;
    (0..count)
        .map(|i| {
            let low = i * slice;
            let high = if i + 1 == count { items.len() } else { low + slice };
            items[rng.random_range(low..high)].clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::BoardConfig,
        dictionary::Dictionary,
        game::{bag::Bag, player::Player, Command, Game, TurnTimer},
    };
    use std::sync::Arc;
    use tokio_test::assert_ok;

    fn game_with(words: &[&str], easel: &[char]) -> Game {
        let dictionary = Arc::new(Dictionary::from_words(words));
        let mut players = [Player::new("Alice"), Player::new("Bot")];
        players[0].add_letters(easel);
        players[1].add_letters(&['E'; 7]);

        Game::from_parts(
            players,
            Board::new(&BoardConfig::default(), dictionary),
            Bag::from_letters(vec!['E'; 30]),
            0,
            TurnTimer::detached(Duration::from_secs(60)),
            None,
        )
    }

    #[test]
    fn test_spread_sample() {
        let items: Vec<u32> = (0..9).collect();
        let sample = spread_sample(&mut rand::rng(), &items, 3);

        assert_eq!(sample.len(), 3);
        assert!(sample[0] < 3 && (3..6).contains(&sample[1]) && sample[2] >= 6);
        assert_eq!(spread_sample(&mut rand::rng(), &items[..2], 3), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_hints_are_valid_place_commands() {
        let game = game_with(&["CON", "CONE", "ON", "NO", "ONCE"], &['C', 'O', 'N', 'E']);
        let solver = Solver::new(
            game.board().copy(),
            game.player(0).easel.clone(),
            Duration::from_secs(5),
        );

        let hints = solver.hints().await.unwrap();
        assert_eq!(hints.len(), HINT_COUNT);
        for hint in hints {
            assert!(matches!(Command::parse(&hint), Ok(Command::Place(_))), "{hint}");
        }
    }

    #[tokio::test]
    async fn test_bot_solutions_replay_through_game() {
        let mut game = game_with(&["CON", "CONE", "ICON", "ICONS"], &['C', 'O', 'N', 'E', 'I', 'S', 'T']);
        let solver = Solver::new(
            game.board().copy(),
            game.player(0).easel.clone(),
            Duration::from_secs(5),
        );

        let solutions = solver.bot_solutions(false).await.unwrap();
        assert!(!solutions.is_empty());
        assert!(solutions.windows(2).all(|w| w[0].1 >= w[1].1), "Sorted best first");

        let (best, score) = solutions[0].clone();
        let played = assert_ok!(game.place_command(0, &best.to_command()));
        assert_eq!(played, score);
    }

    #[tokio::test]
    async fn test_solver_never_mutates_live_board() {
        let game = game_with(&["CON"], &['C', 'O', 'N']);
        let solver = Solver::new(
            game.board().copy(),
            game.player(0).easel.clone(),
            Duration::from_secs(5),
        );

        let solutions = solver.bot_solutions(true).await.unwrap();
        assert_eq!(solutions.len(), 1);
        assert!(game.board().is_center_empty());
    }

    #[tokio::test]
    async fn test_expired_solver_returns_nothing() {
        let game = game_with(&["CON"], &['C', 'O', 'N']);
        let solver = Solver::new(game.board().copy(), vec!['C', 'O', 'N'], Duration::ZERO);

        assert!(solver.bot_solutions(false).await.unwrap().is_empty());
        assert!(solver.hints().await.unwrap().is_empty());
    }
}
