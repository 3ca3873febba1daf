use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{
    bag::Bag,
    board::Board,
    command::PlaceCommand,
    error::{GameError, GameResult},
    objectives::{ObjectiveEngine, ObjectiveView, PlacementContext},
    player::{Player, EASEL_SIZE},
    timer::TurnTimer,
    PlacedLetter, Position,
};
use crate::{
    config::BoardConfig,
    dictionary::Dictionary,
    models::{FinishedPlayer, GameFinish, GameMode, GameStatus, MultiplierCell, PlayerView},
    utils::letters::BLANK,
};

/// Consecutive skips, by both players together, that end the game
pub const MAX_CONSECUTIVE_SKIPS: u32 = 6;
/// Bonus for playing all seven letters of the easel in one move
pub const FULL_EASEL_BONUS: i32 = 50;
/// Letters the bag must hold for an exchange to be allowed
pub const MIN_BAG_FOR_EXCHANGE: usize = 7;

/// One match between two seats.
///
/// State only changes through [`Game::place`], [`Game::draw`] and
/// [`Game::skip`], each of which checks the move belongs to the active player.
pub struct Game {
    players: [Player; 2],
    board: Board,
    bag: Bag,
    active: usize,
    place_count: u32,
    skipped_in_a_row: u32,
    finish: Option<GameFinish>,
    timer: TurnTimer,
    objectives: Option<ObjectiveEngine>,
    started_at: DateTime<Utc>,
}

impl Game {
    pub fn new(
        names: [String; 2],
        mode: GameMode,
        board_config: &BoardConfig,
        dictionary: Arc<Dictionary>,
        first_player: usize,
        timer: TurnTimer,
    ) -> Self {
        let bag = Bag::new(&board_config.letter_distribution);
        let objectives = match mode {
            GameMode::Classic => None,
            GameMode::Log2990 => Some(ObjectiveEngine::new(&dictionary)),
        };
        let board = Board::new(board_config, dictionary);
        let [first, second] = names;

        Self::from_parts(
            [Player::new(first), Player::new(second)],
            board,
            bag,
            first_player % 2,
            timer,
            objectives,
        )
    }

    /// Assemble a game from prepared parts, dealing a full easel to each player
    pub fn from_parts(
        mut players: [Player; 2],
        board: Board,
        mut bag: Bag,
        first_player: usize,
        mut timer: TurnTimer,
        objectives: Option<ObjectiveEngine>,
    ) -> Self {
        for player in players.iter_mut() {
            let missing = EASEL_SIZE.saturating_sub(player.easel.len());
            let letters = bag.draw(missing);
            player.add_letters(&letters);
        }
        timer.reset();

        Self {
            players,
            board,
            bag,
            active: first_player,
            place_count: 0,
            skipped_in_a_row: 0,
            finish: None,
            timer,
            objectives,
            started_at: Utc::now(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self, seat: usize) -> &Player {
        &self.players[seat]
    }

    pub fn active_player(&self) -> usize {
        self.active
    }

    pub fn bag_len(&self) -> usize {
        self.bag.len()
    }

    #[cfg(test)]
    pub fn place_count(&self) -> u32 {
        self.place_count
    }

    pub fn is_finished(&self) -> bool {
        self.finish.is_some()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn time_left(&self) -> Duration {
        self.timer.time_left()
    }

    pub fn timer_generation(&self) -> u64 {
        self.timer.generation()
    }

    pub fn objectives_for(&self, seat: usize) -> Option<ObjectiveView> {
        self.objectives.as_ref().map(|engine| engine.objectives_for(seat))
    }

    /// A move is only accepted from the active player, with letters they hold
    pub fn check_move(&self, letters: &[char], seat: usize) -> GameResult<()> {
        if self.is_finished() {
            return Err(GameError::GameFinished);
        }
        if seat != self.active {
            return Err(GameError::WrongPlayer);
        }
        if !self.players[seat].has_letters(letters) {
            return Err(GameError::LettersAreNotInEasel);
        }
        Ok(())
    }

    /// Parse-level entry point: lay out a `!place` command and play it
    pub fn place_command(&mut self, seat: usize, command: &PlaceCommand) -> GameResult<i32> {
        self.check_move(&command.easel_letters(), seat)?;
        let (letters, blanks) = command.resolve(&self.board)?;
        self.place(seat, &letters, &blanks)
    }

    /// Put letters on the board and return the points earned by the move
    pub fn place(
        &mut self,
        seat: usize,
        letters: &[PlacedLetter],
        blanks: &HashSet<Position>,
    ) -> GameResult<i32> {
        let easel_letters: Vec<char> = letters
            .iter()
            .map(|l| if blanks.contains(&l.position) { BLANK } else { l.letter })
            .collect();
        self.check_move(&easel_letters, seat)?;

        let is_first_move = self.place_count == 0;
        let mut score = self.board.place(letters, blanks, is_first_move)?;

        if let Some(engine) = self.objectives.as_mut() {
            let context = PlacementContext {
                placed: letters,
                blanks,
                words: self.board.last_placed_words(),
                points: self.board.points(),
                player_score: self.players[seat].score,
                placements_so_far: self.place_count,
            };
            score = engine.verify_objectives(seat, &context, score);
        }

        if letters.len() == EASEL_SIZE {
            score += FULL_EASEL_BONUS;
        }

        self.players[seat].remove_letters(&easel_letters)?;
        let refill = self.bag.draw(letters.len());
        self.players[seat].add_letters(&refill);

        if self.bag.is_empty() && self.players[seat].easel.is_empty() {
            score += self.players[1 - seat].easel_points(self.board.points());
        }

        self.players[seat].score += score;
        self.place_count += 1;
        self.skipped_in_a_row = 0;
        self.end_turn();

        tracing::debug!(
            "{} placed {} letters for {} points",
            self.players[seat].name,
            letters.len(),
            score
        );

        Ok(score)
    }

    /// Exchange easel letters with the bag
    pub fn draw(&mut self, seat: usize, letters: &[char]) -> GameResult<()> {
        self.check_move(letters, seat)?;
        if self.bag.len() < MIN_BAG_FOR_EXCHANGE {
            return Err(GameError::NotEnoughLettersInBag);
        }

        self.players[seat].remove_letters(letters)?;
        let replacements = self.bag.exchange_letters(letters);
        self.players[seat].add_letters(&replacements);

        self.skipped_in_a_row = 0;
        self.end_turn();
        Ok(())
    }

    pub fn skip(&mut self, seat: usize) -> GameResult<()> {
        self.check_move(&[], seat)?;

        self.skipped_in_a_row += 1;
        self.end_turn();
        Ok(())
    }

    /// True once the game must stop; stops the turn timer when it is
    pub fn needs_to_end(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }

        let out_of_letters =
            self.bag.is_empty() && self.players.iter().any(|p| p.easel.is_empty());
        if self.skipped_in_a_row >= MAX_CONSECUTIVE_SKIPS || out_of_letters {
            self.timer.stop();
            return true;
        }
        false
    }

    /// Apply the end of game penalties once and produce the final record.
    ///
    /// Later calls return the same record unchanged.
    pub fn end_game(&mut self) -> GameFinish {
        if let Some(finish) = &self.finish {
            return finish.clone();
        }

        self.timer.stop();
        for player in self.players.iter_mut() {
            player.score -= player.easel_points(self.board.points());
        }

        let [first, second] = &self.players;
        let winner = match first.score.cmp(&second.score) {
            std::cmp::Ordering::Greater => Some(first.name.clone()),
            std::cmp::Ordering::Less => Some(second.name.clone()),
            std::cmp::Ordering::Equal => None,
        };

        let finish = GameFinish {
            players: self
                .players
                .iter()
                .map(|p| FinishedPlayer {
                    name: p.name.clone(),
                    score: p.score,
                    remaining_letters: p.easel.clone(),
                })
                .collect(),
            bag_size: self.bag.len(),
            winner,
        };

        tracing::info!("Game finished, winner: {:?}", finish.winner);
        self.finish = Some(finish.clone());
        finish
    }

    /// End the game with `seat` giving up. The other seat wins whatever the
    /// scores are.
    pub fn concede(&mut self, seat: usize) -> GameFinish {
        let already_over = self.is_finished();
        let mut finish = self.end_game();
        if !already_over {
            finish.winner = Some(self.players[1 - seat].name.clone());
            tracing::info!("{} conceded to {:?}", self.players[seat].name, finish.winner);
            self.finish = Some(finish.clone());
        }
        finish
    }

    /// Exchange the two seats, players and objectives together
    pub fn swap_seats(&mut self) {
        self.players.swap(0, 1);
        self.active = 1 - self.active;
        if let Some(engine) = self.objectives.as_mut() {
            engine.switching_players_objectives();
        }
    }

    pub fn rename_player(&mut self, seat: usize, name: impl Into<String>) {
        self.players[seat].name = name.into();
    }

    pub fn stop_timer(&mut self) {
        self.timer.stop();
    }

    /// Snapshot of the game from `seat`'s point of view
    pub fn status_for(&self, seat: usize) -> GameStatus {
        GameStatus {
            active_player: self.players[self.active].name.clone(),
            time_left: self.time_left().as_secs(),
            bag_size: self.bag.len(),
            board: self.board.rows(),
            multipliers: self
                .board
                .remaining_multipliers()
                .into_iter()
                .map(|(position, multiplier)| MultiplierCell {
                    position,
                    multiplier,
                })
                .collect(),
            players: self
                .players
                .iter()
                .enumerate()
                .map(|(idx, p)| PlayerView {
                    name: p.name.clone(),
                    score: p.score,
                    easel: (idx == seat).then(|| p.easel.clone()),
                    easel_size: p.easel.len(),
                })
                .collect(),
            finished: self.is_finished(),
            objectives: self.objectives_for(seat),
        }
    }

    fn end_turn(&mut self) {
        self.active = 1 - self.active;
        self.timer.reset();
    }
}
