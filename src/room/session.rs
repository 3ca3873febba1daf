use std::sync::Arc;

use rand::{seq::IndexedRandom, Rng};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::Instant,
};
use uuid::Uuid;

use super::{ConnectionId, Outbound, RoomCommand, RoomHandle, RoomManager, ROOM_CHANNEL_SIZE};
use crate::{
    config::GameConfig,
    db::GameRecorder,
    dictionary::Dictionary,
    game::{Command, Game, GameError, GameResult, TurnExpired, TurnTimer},
    models::{BotDifficulty, GameHistory, GameMode, PlayerScore},
    solver::{choose_move, BotMove, Solver},
    websocket::messages::ServerMessage,
};

const BOT_NAMES: [&str; 4] = ["Marvin", "Ada", "Turing", "Hopper"];

/// A socket taking part in a room
#[derive(Debug, Clone)]
pub struct Participant {
    pub connection: ConnectionId,
    pub name: String,
    pub outbound: Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// Host waiting for someone to ask to join
    AwaitingJoin,
    /// A joiner is waiting for the host's answer
    InvitePending,
    InGame,
    /// A human surrendered and a bot took the seat
    SoloConverted,
    Closed,
}

struct Link {
    connection: ConnectionId,
    /// `None` while the socket is gone and the seat waits for a rejoin
    outbound: Option<Outbound>,
    grace: Option<JoinHandle<()>>,
}

enum Occupant {
    Human(Link),
    Bot(BotDifficulty),
    /// The human left after the game
    Gone,
}

struct Seat {
    name: String,
    occupant: Occupant,
}

impl Seat {
    fn human(participant: Participant) -> Self {
        Self {
            name: participant.name,
            occupant: Occupant::Human(Link {
                connection: participant.connection,
                outbound: Some(participant.outbound),
                grace: None,
            }),
        }
    }

    fn bot(name: String, difficulty: BotDifficulty) -> Self {
        Self {
            name,
            occupant: Occupant::Bot(difficulty),
        }
    }

    fn is_bot(&self) -> bool {
        matches!(self.occupant, Occupant::Bot(_))
    }

    fn connection(&self) -> Option<ConnectionId> {
        match &self.occupant {
            Occupant::Human(link) => Some(link.connection),
            _ => None,
        }
    }

    fn outbound(&self) -> Option<&Outbound> {
        match &self.occupant {
            Occupant::Human(link) => link.outbound.as_ref(),
            _ => None,
        }
    }

    fn send(&self, message: ServerMessage) {
        if let Some(outbound) = self.outbound() {
            let _ = outbound.send(message);
        }
    }

    fn abort_grace(&mut self) {
        if let Occupant::Human(link) = &mut self.occupant {
            if let Some(grace) = link.grace.take() {
                grace.abort();
            }
        }
    }
}

/// Results of background work, fed back into the room task
enum RoomEvent {
    BotPlayed { token: u64, bot_move: BotMove },
    GraceExpired { connection: ConnectionId },
}

struct Room {
    id: Uuid,
    mode: GameMode,
    phase: RoomPhase,
    manager: Arc<RoomManager>,
    config: Arc<GameConfig>,
    dictionary: Arc<Dictionary>,
    recorder: Arc<dyn GameRecorder>,
    /// Host in seat 0 from the start, the second seat once the game begins
    seats: Vec<Seat>,
    pending: Option<Participant>,
    game: Option<Game>,
    /// Humans still attached to the room
    players_remaining: usize,
    recorded: bool,
    timer_tx: mpsc::UnboundedSender<TurnExpired>,
    events: mpsc::UnboundedSender<RoomEvent>,
}

pub fn spawn_room(
    manager: Arc<RoomManager>,
    room_id: Uuid,
    mode: GameMode,
    host: Participant,
    bot: Option<BotDifficulty>,
) -> RoomHandle {
    let (sender, commands) = mpsc::channel(ROOM_CHANNEL_SIZE);
    let (timer_tx, timer_rx) = mpsc::unbounded_channel();
    let (events, events_rx) = mpsc::unbounded_channel();

    let mut room = Room {
        id: room_id,
        mode,
        phase: RoomPhase::AwaitingJoin,
        config: manager.config().clone(),
        dictionary: manager.dictionary().clone(),
        recorder: manager.recorder().clone(),
        manager,
        seats: vec![Seat::human(host)],
        pending: None,
        game: None,
        players_remaining: 1,
        recorded: false,
        timer_tx,
        events,
    };

    tokio::spawn(async move {
        if let Some(difficulty) = bot {
            let name = bot_name(&room.seats[0].name);
            room.seats.push(Seat::bot(name, difficulty));
            room.start_game();
        }
        room.run(commands, timer_rx, events_rx).await;
    });

    RoomHandle { room_id, sender }
}

/// A bot name that differs from the human's
fn bot_name(human: &str) -> String {
    let names: Vec<&str> = BOT_NAMES.iter().copied().filter(|n| *n != human).collect();
    names
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("Bot")
        .to_string()
}

fn exchange_text(count: usize) -> String {
    format!("!exchange ({} letters)", count)
}

impl Room {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<RoomCommand>,
        mut timer_rx: mpsc::UnboundedReceiver<TurnExpired>,
        mut events_rx: mpsc::UnboundedReceiver<RoomEvent>,
    ) {
        tracing::info!("Room {} opened by {}", self.id, self.seats[0].name);

        while self.phase != RoomPhase::Closed {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => self.close(),
                },
                Some(expired) = timer_rx.recv() => self.on_turn_expired(expired),
                Some(event) = events_rx.recv() => match event {
                    RoomEvent::BotPlayed { token, bot_move } => self.play_bot_move(token, bot_move),
                    RoomEvent::GraceExpired { connection } => self.on_grace_expired(connection),
                },
            }
        }

        tracing::info!("Room {} closed", self.id);
    }

    fn handle_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                connection,
                player_name,
                outbound,
                reply,
            } => {
                let result = self.join(Participant {
                    connection,
                    name: player_name,
                    outbound,
                });
                let _ = reply.send(result);
            }
            RoomCommand::Respond { connection, accept } => self.respond(connection, accept),
            RoomCommand::Cancel { connection } => self.cancel(connection),
            RoomCommand::Play { connection, text } => self.play(connection, &text),
            RoomCommand::Chat { connection, text } => self.chat(connection, text),
            RoomCommand::Surrender { connection } => self.surrender(connection),
            RoomCommand::Leave { connection } => self.leave(connection),
            RoomCommand::Detach { connection } => self.detach(connection),
            RoomCommand::Rejoin {
                connection,
                player_name,
                outbound,
                reply,
            } => {
                let result = self.rejoin(connection, player_name, outbound);
                let _ = reply.send(result);
            }
        }
    }

    // Matchmaking

    fn join(&mut self, joiner: Participant) -> GameResult<()> {
        if self.phase != RoomPhase::AwaitingJoin || joiner.name == self.seats[0].name {
            return Err(GameError::RoomUnavailable);
        }

        tracing::info!("{} asks to join room {}", joiner.name, self.id);
        self.seats[0].send(ServerMessage::JoinRequest {
            player_name: joiner.name.clone(),
        });
        let _ = joiner.outbound.send(ServerMessage::JoinPending { room_id: self.id });

        self.pending = Some(joiner);
        self.phase = RoomPhase::InvitePending;
        self.manager.set_joinable(self.id, false);
        Ok(())
    }

    fn respond(&mut self, connection: ConnectionId, accept: bool) {
        if self.phase != RoomPhase::InvitePending || !self.is_host(connection) {
            self.reject(connection, GameError::NotInRoom);
            return;
        }
        let Some(joiner) = self.pending.take() else {
            return;
        };

        if accept {
            self.seats.push(Seat::human(joiner));
            self.players_remaining += 1;
            self.start_game();
        } else {
            tracing::info!("Host of room {} refused {}", self.id, joiner.name);
            let _ = joiner.outbound.send(ServerMessage::JoinRefused);
            self.reopen();
        }
    }

    fn cancel(&mut self, connection: ConnectionId) {
        let waiting = matches!(
            self.phase,
            RoomPhase::AwaitingJoin | RoomPhase::InvitePending
        );

        if waiting && self.is_host(connection) {
            if let Some(joiner) = self.pending.take() {
                let _ = joiner.outbound.send(ServerMessage::RoomCancelled);
            }
            self.close();
        } else if waiting && self.is_pending(connection) {
            if let Some(joiner) = self.pending.take() {
                self.seats[0].send(ServerMessage::JoinCancelled {
                    player_name: joiner.name,
                });
            }
            self.reopen();
        }
    }

    fn reopen(&mut self) {
        self.phase = RoomPhase::AwaitingJoin;
        self.manager.set_joinable(self.id, true);
    }

    fn start_game(&mut self) {
        let names = [self.seats[0].name.clone(), self.seats[1].name.clone()];
        let first_player = rand::rng().random_range(0..2);
        let timer = TurnTimer::new(self.config.time_per_round, self.timer_tx.clone());

        self.game = Some(Game::new(
            names,
            self.mode,
            &self.config.board,
            self.dictionary.clone(),
            first_player,
            timer,
        ));
        self.phase = RoomPhase::InGame;

        tracing::info!(
            "Game started in room {}: {} vs {}",
            self.id,
            self.seats[0].name,
            self.seats[1].name
        );

        for seat in 0..2 {
            self.seats[seat].send(ServerMessage::GameStarted {
                room_id: self.id,
                opponent: self.seats[1 - seat].name.clone(),
            });
        }
        self.broadcast_status();
        self.schedule_bot_turn();
    }

    // Turns

    fn play(&mut self, connection: ConnectionId, text: &str) {
        let Some(seat) = self.seat_of(connection) else {
            self.reject(connection, GameError::NotInRoom);
            return;
        };
        if let Err(err) = self.try_play(seat, text) {
            tracing::debug!("Rejected '{}' from {}: {}", text, self.seats[seat].name, err);
            self.seats[seat].send(ServerMessage::CommandRejected {
                reason: err.to_string(),
            });
        }
    }

    fn try_play(&mut self, seat: usize, text: &str) -> GameResult<()> {
        let game = self.game.as_mut().ok_or(GameError::NotInRoom)?;
        if game.is_finished() {
            return Err(GameError::GameFinished);
        }

        let (own, public, score) = match Command::parse(text)? {
            Command::Place(place) => {
                let score = game.place_command(seat, &place)?;
                let command = place.to_string();
                (command.clone(), command, score)
            }
            Command::Exchange(letters) => {
                game.draw(seat, &letters)?;
                (text.trim().to_string(), exchange_text(letters.len()), 0)
            }
            Command::Skip => {
                game.skip(seat)?;
                ("!skip".to_string(), "!skip".to_string(), 0)
            }
            Command::Hint => {
                game.check_move(&[], seat)?;
                self.spawn_hints(seat);
                return Ok(());
            }
        };

        self.announce_move(seat, own, public, score);
        self.after_move();
        Ok(())
    }

    /// Post-turn hook: end the game, or publish the new state and let a bot
    /// play if it is now its turn
    fn after_move(&mut self) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        if game.needs_to_end() {
            self.finish_game(None);
            return;
        }
        self.broadcast_status();
        self.schedule_bot_turn();
    }

    fn spawn_hints(&self, seat: usize) {
        let Some(game) = &self.game else {
            return;
        };
        let Some(outbound) = self.seats[seat].outbound().cloned() else {
            return;
        };
        let solver = Solver::new(
            game.board().copy(),
            game.player(seat).easel.clone(),
            self.config.solver_timeout,
        );

        tokio::spawn(async move {
            let message = match solver.hints().await {
                Ok(hints) => ServerMessage::Hints { hints },
                Err(err) => ServerMessage::CommandRejected {
                    reason: err.to_string(),
                },
            };
            let _ = outbound.send(message);
        });
    }

    /// Search for the bot's move in the background. The result comes back as
    /// a [`RoomEvent::BotPlayed`] tagged with the current turn.
    fn schedule_bot_turn(&self) {
        let Some(game) = &self.game else {
            return;
        };
        if game.is_finished() {
            return;
        }
        let seat = game.active_player();
        let Occupant::Bot(difficulty) = &self.seats[seat].occupant else {
            return;
        };

        let difficulty = *difficulty;
        let token = game.timer_generation();
        let easel = game.player(seat).easel.clone();
        let bag_len = game.bag_len();
        let solver = Solver::new(game.board().copy(), easel.clone(), self.config.solver_timeout);
        let thinking_floor = self.config.bot_thinking_floor;
        let events = self.events.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let bot_move = match solver.bot_solutions(difficulty == BotDifficulty::Hard).await {
                Ok(candidates) => choose_move(difficulty, candidates, &easel, bag_len),
                Err(err) => {
                    tracing::warn!("Bot search failed, skipping: {}", err);
                    BotMove::Skip
                }
            };

            tokio::time::sleep(thinking_floor.saturating_sub(started.elapsed())).await;
            let _ = events.send(RoomEvent::BotPlayed { token, bot_move });
        });
    }

    fn play_bot_move(&mut self, token: u64, bot_move: BotMove) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let seat = game.active_player();
        if game.is_finished() || game.timer_generation() != token || !self.seats[seat].is_bot() {
            tracing::debug!("Dropping stale bot move in room {}", self.id);
            return;
        }

        // Replayed through the same checks as a human move
        let played = match &bot_move {
            BotMove::Place(solution) => game
                .place(seat, &solution.placed_letters, &solution.blank_positions)
                .map(|score| (solution.to_command().to_string(), score)),
            BotMove::Exchange(letters) => game
                .draw(seat, letters)
                .map(|_| (exchange_text(letters.len()), 0)),
            BotMove::Skip => game.skip(seat).map(|_| ("!skip".to_string(), 0)),
        };

        let (command, score) = match played {
            Ok(played) => played,
            Err(err) => {
                tracing::warn!("Bot move rejected, skipping instead: {}", err);
                if let Err(err) = game.skip(seat) {
                    tracing::warn!("Bot could not skip: {}", err);
                    return;
                }
                ("!skip".to_string(), 0)
            }
        };

        self.announce_move(seat, command.clone(), command, score);
        self.after_move();
    }

    fn on_turn_expired(&mut self, expired: TurnExpired) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        if game.is_finished() || expired.generation != game.timer_generation() {
            return;
        }

        let seat = game.active_player();
        if let Err(err) = game.skip(seat) {
            tracing::warn!("Could not skip expired turn: {}", err);
            return;
        }

        tracing::debug!("Turn of {} ran out in room {}", self.seats[seat].name, self.id);
        self.announce_move(seat, "!skip".to_string(), "!skip".to_string(), 0);
        self.after_move();
    }

    /// End the game, `surrendered_by` naming the seat that gave up if any
    fn finish_game(&mut self, surrendered_by: Option<usize>) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let started_at = game.started_at();
        let finish = match surrendered_by {
            Some(seat) => game.concede(seat),
            None => game.end_game(),
        };
        let surrendered = surrendered_by.is_some();
        if self.recorded {
            return;
        }
        self.recorded = true;

        tracing::info!(
            "Game over in room {} (winner: {:?}, surrendered: {})",
            self.id,
            finish.winner,
            surrendered
        );

        self.broadcast_status();
        self.broadcast(ServerMessage::GameOver {
            finish: finish.clone(),
        });

        let scores: Vec<PlayerScore> = self
            .seats
            .iter()
            .zip(&finish.players)
            .filter(|(seat, _)| !seat.is_bot())
            .map(|(_, player)| PlayerScore {
                player_name: player.name.clone(),
                score: player.score,
            })
            .collect();
        let history = GameHistory::from_finish(&finish, self.mode, started_at, surrendered);
        let recorder = self.recorder.clone();
        let mode = self.mode;

        tokio::spawn(async move {
            for score in &scores {
                if let Err(err) = recorder.update_high_score(score, mode).await {
                    tracing::warn!("Failed to save highscore of {}: {}", score.player_name, err);
                }
            }
            if let Err(err) = recorder.add_game_history(&history).await {
                tracing::warn!("Failed to save game history {}: {}", history.id, err);
            }
        });
    }

    // Leaving

    fn surrender(&mut self, connection: ConnectionId) {
        let Some(seat) = self.seat_of(connection) else {
            self.cancel(connection);
            return;
        };
        if self.game_in_progress() {
            self.surrender_seat(seat);
        } else {
            self.leave(connection);
        }
    }

    /// Against a bot the game ends on the spot. Between two humans the
    /// surrendering seat is handed to an easy bot, the remaining human
    /// moving to seat 0.
    fn surrender_seat(&mut self, seat: usize) {
        let name = self.seats[seat].name.clone();
        tracing::info!("{} surrendered in room {}", name, self.id);

        if self.seats.iter().any(Seat::is_bot) {
            self.finish_game(Some(seat));
            self.release_seat(seat);
            return;
        }

        let mut departing = seat;
        if seat == 0 {
            self.seats.swap(0, 1);
            if let Some(game) = self.game.as_mut() {
                game.swap_seats();
            }
            departing = 1;
        }

        let bot = bot_name(&self.seats[0].name);
        let mut departed = std::mem::replace(
            &mut self.seats[departing],
            Seat::bot(bot.clone(), BotDifficulty::Easy),
        );
        departed.abort_grace();
        departed.send(ServerMessage::System {
            text: "You surrendered the game".to_string(),
        });
        if let Some(game) = self.game.as_mut() {
            game.rename_player(departing, bot.clone());
        }

        self.players_remaining = self.players_remaining.saturating_sub(1);
        self.phase = RoomPhase::SoloConverted;
        self.seats[0].send(ServerMessage::System {
            text: format!("{} surrendered, {} takes over", name, bot),
        });

        self.broadcast_status();
        self.schedule_bot_turn();
    }

    fn leave(&mut self, connection: ConnectionId) {
        if matches!(
            self.phase,
            RoomPhase::AwaitingJoin | RoomPhase::InvitePending
        ) {
            self.cancel(connection);
            return;
        }
        let Some(seat) = self.seat_of(connection) else {
            return;
        };
        if self.game_in_progress() {
            self.surrender_seat(seat);
            return;
        }

        let name = self.seats[seat].name.clone();
        self.release_seat(seat);
        self.broadcast(ServerMessage::System {
            text: format!("{} left the game", name),
        });
    }

    /// Drop a human from the room, closing it once nobody is left
    fn release_seat(&mut self, seat: usize) {
        self.seats[seat].abort_grace();
        if matches!(self.seats[seat].occupant, Occupant::Human(_)) {
            self.seats[seat].occupant = Occupant::Gone;
            self.players_remaining = self.players_remaining.saturating_sub(1);
        }
        if self.players_remaining == 0 {
            self.close();
        }
    }

    fn detach(&mut self, connection: ConnectionId) {
        if matches!(
            self.phase,
            RoomPhase::AwaitingJoin | RoomPhase::InvitePending
        ) {
            self.cancel(connection);
            return;
        }
        let Some(seat) = self.seat_of(connection) else {
            return;
        };
        if !self.game_in_progress() {
            self.leave(connection);
            return;
        }

        let grace = self.config.reconnect_grace;
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = events.send(RoomEvent::GraceExpired { connection });
        });

        if let Occupant::Human(link) = &mut self.seats[seat].occupant {
            link.outbound = None;
            if let Some(previous) = link.grace.replace(task) {
                previous.abort();
            }
        }
        tracing::info!(
            "{} disconnected from room {}, seat kept for {:?}",
            self.seats[seat].name,
            self.id,
            grace
        );
    }

    fn on_grace_expired(&mut self, connection: ConnectionId) {
        let Some(seat) = self.seat_of(connection) else {
            return;
        };
        let detached = matches!(
            &self.seats[seat].occupant,
            Occupant::Human(link) if link.outbound.is_none()
        );
        if !detached {
            return;
        }

        tracing::info!("{} did not come back to room {}", self.seats[seat].name, self.id);
        if self.game_in_progress() {
            self.surrender_seat(seat);
        } else {
            self.release_seat(seat);
        }
    }

    /// Attach a new socket to a seat left by a dropped connection. Repeating it
    /// from the same socket only replaces the outbound channel.
    fn rejoin(
        &mut self,
        connection: ConnectionId,
        player_name: String,
        outbound: Outbound,
    ) -> GameResult<()> {
        if !matches!(self.phase, RoomPhase::InGame | RoomPhase::SoloConverted) {
            return Err(GameError::NotInRoom);
        }
        let seat = self
            .seats
            .iter()
            .position(|s| s.name == player_name && matches!(s.occupant, Occupant::Human(_)))
            .ok_or(GameError::NotInRoom)?;

        // A seat with a live socket belongs to that socket
        let reclaimable = matches!(
            &self.seats[seat].occupant,
            Occupant::Human(link) if link.outbound.is_none() || link.connection == connection
        );
        if !reclaimable {
            tracing::warn!("Refused rejoin of connected seat {} in room {}", player_name, self.id);
            return Err(GameError::RoomUnavailable);
        }

        self.seats[seat].abort_grace();
        if let Occupant::Human(link) = &mut self.seats[seat].occupant {
            link.connection = connection;
            link.outbound = Some(outbound);
        }
        tracing::info!("{} rejoined room {}", player_name, self.id);

        self.seats[seat].send(ServerMessage::GameStarted {
            room_id: self.id,
            opponent: self.seats[1 - seat].name.clone(),
        });
        if let Some(game) = &self.game {
            self.seats[seat].send(ServerMessage::GameStatus {
                status: game.status_for(seat),
            });
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.phase == RoomPhase::Closed {
            return;
        }
        self.phase = RoomPhase::Closed;
        if let Some(game) = self.game.as_mut() {
            game.stop_timer();
        }
        for seat in self.seats.iter_mut() {
            seat.abort_grace();
        }
        self.manager.remove(self.id);
    }

    // Messaging

    fn chat(&self, connection: ConnectionId, text: String) {
        let from = self
            .seat_of(connection)
            .map(|seat| self.seats[seat].name.clone())
            .or_else(|| {
                self.pending
                    .as_ref()
                    .filter(|p| p.connection == connection)
                    .map(|p| p.name.clone())
            });
        let Some(from) = from else {
            self.reject(connection, GameError::NotInRoom);
            return;
        };

        let message = ServerMessage::Chat { from, text };
        for seat in &self.seats {
            if seat.connection() != Some(connection) {
                seat.send(message.clone());
            }
        }
        if let Some(pending) = &self.pending {
            if pending.connection != connection {
                let _ = pending.outbound.send(message);
            }
        }
    }

    fn announce_move(&self, seat: usize, own: String, public: String, score: i32) {
        let player_name = self.seats[seat].name.clone();
        for (idx, recipient) in self.seats.iter().enumerate() {
            let command = if idx == seat { own.clone() } else { public.clone() };
            recipient.send(ServerMessage::MovePlayed {
                player_name: player_name.clone(),
                command,
                score,
            });
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        for seat in &self.seats {
            seat.send(message.clone());
        }
    }

    fn broadcast_status(&self) {
        let Some(game) = &self.game else {
            return;
        };
        for (idx, seat) in self.seats.iter().enumerate() {
            seat.send(ServerMessage::GameStatus {
                status: game.status_for(idx),
            });
        }
    }

    fn reject(&self, connection: ConnectionId, err: GameError) {
        let message = ServerMessage::CommandRejected {
            reason: err.to_string(),
        };
        if let Some(seat) = self.seat_of(connection) {
            self.seats[seat].send(message);
        } else if let Some(pending) = self.pending.as_ref().filter(|p| p.connection == connection) {
            let _ = pending.outbound.send(message);
        }
    }

    // Lookups

    fn seat_of(&self, connection: ConnectionId) -> Option<usize> {
        self.seats
            .iter()
            .position(|seat| seat.connection() == Some(connection))
    }

    fn is_host(&self, connection: ConnectionId) -> bool {
        self.seats[0].connection() == Some(connection)
    }

    fn is_pending(&self, connection: ConnectionId) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.connection == connection)
    }

    fn game_in_progress(&self) -> bool {
        self.game.as_ref().is_some_and(|game| !game.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::MemoryRecorder;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(30);

    fn config() -> GameConfig {
        GameConfig {
            time_per_round: Duration::from_secs(60),
            bot_thinking_floor: Duration::from_millis(100),
            solver_timeout: Duration::from_secs(1),
            reconnect_grace: Duration::from_secs(5),
            ..GameConfig::default()
        }
    }

    fn manager(recorder: Arc<MemoryRecorder>) -> Arc<RoomManager> {
        Arc::new(RoomManager::new(
            Arc::new(config()),
            Arc::new(Dictionary::from_words(["CON", "CONE", "ON", "NO"])),
            recorder,
        ))
    }

    fn participant(name: &str) -> (Participant, mpsc::UnboundedReceiver<ServerMessage>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let participant = Participant {
            connection: Uuid::new_v4(),
            name: name.to_string(),
            outbound,
        };
        (participant, rx)
    }

    /// Next message matching `filter`, skipping the others
    async fn expect<F>(rx: &mut mpsc::UnboundedReceiver<ServerMessage>, filter: F) -> ServerMessage
    where
        F: Fn(&ServerMessage) -> bool,
    {
        loop {
            let message = tokio::time::timeout(WAIT, rx.recv())
                .await
                .expect("Timed out waiting for a message")
                .expect("Room dropped the channel");
            if filter(&message) {
                return message;
            }
        }
    }

    async fn wait_until<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("Condition never became true");
    }

    async fn active_player(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> String {
        match expect(rx, |m| matches!(m, ServerMessage::GameStatus { .. })).await {
            ServerMessage::GameStatus { status } => status.active_player,
            _ => unreachable!(),
        }
    }

    /// Host and joiner in a started two player game
    async fn two_player_room(
        manager: &Arc<RoomManager>,
    ) -> (
        RoomHandle,
        (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>),
        (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>),
    ) {
        let (host, mut host_rx) = participant("Alice");
        let (joiner, mut joiner_rx) = participant("Bob");
        let (host_id, joiner_id) = (host.connection, joiner.connection);

        let room = manager.create_room(host, GameMode::Classic);
        room.join(joiner_id, joiner.name.clone(), joiner.outbound.clone())
            .await
            .unwrap();
        expect(&mut host_rx, |m| matches!(m, ServerMessage::JoinRequest { .. })).await;

        room.respond(host_id, true).await.unwrap();
        expect(&mut host_rx, |m| matches!(m, ServerMessage::GameStarted { .. })).await;
        expect(&mut joiner_rx, |m| matches!(m, ServerMessage::GameStarted { .. })).await;

        (room, (host_id, host_rx), (joiner_id, joiner_rx))
    }

    #[tokio::test(start_paused = true)]
    async fn test_solo_surrender_records_once() {
        let recorder = Arc::new(MemoryRecorder::default());
        let manager = manager(recorder.clone());
        let (host, mut host_rx) = participant("Alice");
        let host_id = host.connection;

        let room = manager.create_solo_room(host, GameMode::Classic, BotDifficulty::Easy);
        expect(&mut host_rx, |m| matches!(m, ServerMessage::GameStarted { .. })).await;

        room.surrender(host_id).await.unwrap();
        match expect(&mut host_rx, |m| matches!(m, ServerMessage::GameOver { .. })).await {
            ServerMessage::GameOver { finish } => assert_eq!(finish.players.len(), 2),
            _ => unreachable!(),
        }

        wait_until(|| !recorder.histories.lock().unwrap().is_empty()).await;
        wait_until(|| manager.room_count() == 0).await;

        let high_scores = recorder.high_scores.lock().unwrap();
        assert_eq!(high_scores.len(), 1, "Only the human gets a highscore");
        assert_eq!(high_scores[0].0.player_name, "Alice");
        let histories = recorder.histories.lock().unwrap();
        assert_eq!(histories.len(), 1);
        assert!(histories[0].surrendered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_join_reopens_room() {
        let manager = manager(Arc::new(MemoryRecorder::default()));
        let (host, mut host_rx) = participant("Alice");
        let (joiner, mut joiner_rx) = participant("Bob");
        let host_id = host.connection;

        let room = manager.create_room(host, GameMode::Classic);
        assert_eq!(manager.listings().len(), 1);

        room.join(joiner.connection, joiner.name.clone(), joiner.outbound.clone())
            .await
            .unwrap();
        expect(&mut host_rx, |m| matches!(m, ServerMessage::JoinRequest { player_name } if player_name == "Bob")).await;
        assert!(manager.listings().is_empty(), "A pending room is hidden from the lobby");

        let (other, _other_rx) = participant("Carol");
        let second = room.join(other.connection, other.name, other.outbound).await;
        assert_eq!(second, Err(GameError::RoomUnavailable));

        room.respond(host_id, false).await.unwrap();
        expect(&mut joiner_rx, |m| matches!(m, ServerMessage::JoinRefused)).await;
        wait_until(|| manager.listings().len() == 1).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_cancel_closes_room() {
        let manager = manager(Arc::new(MemoryRecorder::default()));
        let (host, _host_rx) = participant("Alice");
        let host_id = host.connection;

        let room = manager.create_room(host, GameMode::Classic);
        room.cancel(host_id).await.unwrap();

        wait_until(|| manager.room_count() == 0).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_active_player_may_move() {
        let manager = manager(Arc::new(MemoryRecorder::default()));
        let (room, (host_id, mut host_rx), (joiner_id, mut joiner_rx)) =
            two_player_room(&manager).await;

        let active = active_player(&mut host_rx).await;
        active_player(&mut joiner_rx).await;
        let (active_id, waiting_id, waiting_rx) = if active == "Alice" {
            (host_id, joiner_id, &mut joiner_rx)
        } else {
            (joiner_id, host_id, &mut host_rx)
        };

        room.play(waiting_id, "!skip".to_string()).await.unwrap();
        match expect(waiting_rx, |m| matches!(m, ServerMessage::CommandRejected { .. })).await {
            ServerMessage::CommandRejected { reason } => {
                assert_eq!(reason, GameError::WrongPlayer.to_string())
            }
            _ => unreachable!(),
        }

        room.play(active_id, "!skip".to_string()).await.unwrap();
        match expect(waiting_rx, |m| matches!(m, ServerMessage::MovePlayed { .. })).await {
            ServerMessage::MovePlayed {
                player_name,
                command,
                score,
            } => {
                assert_eq!(player_name, active);
                assert_eq!(command, "!skip");
                assert_eq!(score, 0);
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_command_is_rejected() {
        let manager = manager(Arc::new(MemoryRecorder::default()));
        let (room, (host_id, mut host_rx), _joiner) = two_player_room(&manager).await;

        room.play(host_id, "!dance".to_string()).await.unwrap();
        expect(&mut host_rx, |m| matches!(m, ServerMessage::CommandRejected { .. })).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_timeout_skips() {
        let manager = manager(Arc::new(MemoryRecorder::default()));
        let (_room, (_, mut host_rx), _joiner) = two_player_room(&manager).await;
        let active = active_player(&mut host_rx).await;

        tokio::time::sleep(Duration::from_secs(61)).await;

        match expect(&mut host_rx, |m| matches!(m, ServerMessage::MovePlayed { .. })).await {
            ServerMessage::MovePlayed {
                player_name,
                command,
                ..
            } => {
                assert_eq!(player_name, active);
                assert_eq!(command, "!skip");
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_is_relayed_to_others() {
        let manager = manager(Arc::new(MemoryRecorder::default()));
        let (room, (host_id, mut host_rx), (_, mut joiner_rx)) = two_player_room(&manager).await;

        room.chat(host_id, "good luck".to_string()).await.unwrap();
        match expect(&mut joiner_rx, |m| matches!(m, ServerMessage::Chat { .. })).await {
            ServerMessage::Chat { from, text } => {
                assert_eq!(from, "Alice");
                assert_eq!(text, "good luck");
            }
            _ => unreachable!(),
        }

        room.chat(host_id, "again".to_string()).await.unwrap();
        expect(&mut joiner_rx, |m| matches!(m, ServerMessage::Chat { .. })).await;
        while let Ok(message) = host_rx.try_recv() {
            assert!(!matches!(message, ServerMessage::Chat { .. }), "No echo to the sender");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_surrender_between_humans_hands_seat_to_bot() {
        let recorder = Arc::new(MemoryRecorder::default());
        let manager = manager(recorder.clone());
        let (room, (host_id, mut host_rx), (_, mut joiner_rx)) = two_player_room(&manager).await;

        room.surrender(host_id).await.unwrap();
        expect(&mut host_rx, |m| matches!(m, ServerMessage::System { .. })).await;
        expect(&mut joiner_rx, |m| matches!(m, ServerMessage::System { .. })).await;

        match expect(&mut joiner_rx, |m| matches!(m, ServerMessage::GameStatus { .. })).await {
            ServerMessage::GameStatus { status } => {
                assert_eq!(status.players[0].name, "Bob");
                assert_ne!(status.players[1].name, "Alice");
                assert!(status.players[0].easel.is_some(), "Bob now sits in seat 0");
            }
            _ => unreachable!(),
        }

        assert!(recorder.histories.lock().unwrap().is_empty(), "The game goes on");
        assert_eq!(manager.room_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejoin_within_grace_keeps_seat() {
        let manager = manager(Arc::new(MemoryRecorder::default()));
        let (room, (host_id, _host_rx), (_, mut joiner_rx)) = two_player_room(&manager).await;

        room.detach(host_id).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let (new_outbound, mut new_rx) = mpsc::unbounded_channel();
        let new_id = Uuid::new_v4();
        room.rejoin(new_id, "Alice".to_string(), new_outbound.clone())
            .await
            .unwrap();
        expect(&mut new_rx, |m| matches!(m, ServerMessage::GameStarted { .. })).await;
        expect(&mut new_rx, |m| matches!(m, ServerMessage::GameStatus { .. })).await;

        // Rejoining again only swaps the socket
        room.rejoin(new_id, "Alice".to_string(), new_outbound)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        while let Ok(message) = joiner_rx.try_recv() {
            assert!(
                !matches!(message, ServerMessage::System { .. }),
                "Nobody surrendered"
            );
        }

        let unknown = room
            .rejoin(Uuid::new_v4(), "Mallory".to_string(), mpsc::unbounded_channel().0)
            .await;
        assert_eq!(unknown, Err(GameError::NotInRoom));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejoin_cannot_take_a_connected_seat() {
        let manager = manager(Arc::new(MemoryRecorder::default()));
        let (room, (_, mut host_rx), (joiner_id, _joiner_rx)) = two_player_room(&manager).await;

        let (outbound, mut rx) = mpsc::unbounded_channel();
        let result = room.rejoin(Uuid::new_v4(), "Alice".to_string(), outbound).await;
        assert_eq!(result, Err(GameError::RoomUnavailable));

        // The opponent's own socket cannot claim it either
        let (outbound, _rx) = mpsc::unbounded_channel();
        let result = room.rejoin(joiner_id, "Alice".to_string(), outbound).await;
        assert_eq!(result, Err(GameError::RoomUnavailable));

        assert!(rx.try_recv().is_err(), "No status may leak to the other socket");

        // The seat still belongs to Alice
        room.chat(joiner_id, "still there?".to_string()).await.unwrap();
        expect(&mut host_rx, |m| matches!(m, ServerMessage::Chat { .. })).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_expiry_surrenders_seat() {
        let manager = manager(Arc::new(MemoryRecorder::default()));
        let (room, (host_id, _host_rx), (_, mut joiner_rx)) = two_player_room(&manager).await;

        room.detach(host_id).await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;

        match expect(&mut joiner_rx, |m| matches!(m, ServerMessage::System { .. })).await {
            ServerMessage::System { text } => assert!(text.starts_with("Alice surrendered")),
            _ => unreachable!(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_surrender_gives_the_win_to_the_bot() {
        let recorder = Arc::new(MemoryRecorder::default());
        let manager = manager(recorder.clone());
        let (host, mut host_rx) = participant("Alice");
        let host_id = host.connection;

        let room = manager.create_solo_room(host, GameMode::Classic, BotDifficulty::Easy);
        expect(&mut host_rx, |m| matches!(m, ServerMessage::GameStarted { .. })).await;

        room.surrender(host_id).await.unwrap();
        let finish = match expect(&mut host_rx, |m| matches!(m, ServerMessage::GameOver { .. })).await {
            ServerMessage::GameOver { finish } => finish,
            _ => unreachable!(),
        };
        let bot = finish.players[1].name.clone();
        assert_eq!(finish.winner.as_deref(), Some(bot.as_str()));

        wait_until(|| !recorder.histories.lock().unwrap().is_empty()).await;
        let histories = recorder.histories.lock().unwrap();
        assert_eq!(histories[0].winner.as_deref(), Some(bot.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bot_plays_after_thinking_floor_then_waits() {
        let manager = manager(Arc::new(MemoryRecorder::default()));
        let (host, mut host_rx) = participant("Alice");
        let host_id = host.connection;

        let room = manager.create_solo_room(host, GameMode::Classic, BotDifficulty::Easy);
        expect(&mut host_rx, |m| matches!(m, ServerMessage::GameStarted { .. })).await;

        let mut turn_started = Instant::now();
        if active_player(&mut host_rx).await == "Alice" {
            room.play(host_id, "!skip".to_string()).await.unwrap();
            turn_started = Instant::now();
            expect(&mut host_rx, |m| {
                matches!(m, ServerMessage::MovePlayed { player_name, .. } if player_name == "Alice")
            })
            .await;
        }

        match expect(&mut host_rx, |m| matches!(m, ServerMessage::MovePlayed { .. })).await {
            ServerMessage::MovePlayed { player_name, .. } => assert_ne!(player_name, "Alice"),
            _ => unreachable!(),
        }
        assert!(turn_started.elapsed() >= config().bot_thinking_floor);
        assert_eq!(active_player(&mut host_rx).await, "Alice");

        // Alice's turn runs for a minute, the bot must not move meanwhile
        tokio::time::sleep(Duration::from_secs(10)).await;
        while let Ok(message) = host_rx.try_recv() {
            assert!(
                !matches!(message, ServerMessage::MovePlayed { .. }),
                "The bot played out of turn"
            );
        }
    }
}
