use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::{
    session::{spawn_room, Participant},
    ConnectionId, Outbound, RoomHandle,
};
use crate::{
    config::GameConfig,
    db::GameRecorder,
    dictionary::Dictionary,
    game::{GameError, GameResult},
    models::{BotDifficulty, GameMode},
    websocket::messages::{RoomListing, ServerMessage},
};

struct RoomEntry {
    handle: RoomHandle,
    listing: RoomListing,
    joinable: bool,
}

/// Registry of running rooms and of the sockets watching the lobby
pub struct RoomManager {
    config: Arc<GameConfig>,
    dictionary: Arc<Dictionary>,
    recorder: Arc<dyn GameRecorder>,
    rooms: DashMap<Uuid, RoomEntry>,
    lobby: DashMap<ConnectionId, Outbound>,
}

impl RoomManager {
    pub fn new(
        config: Arc<GameConfig>,
        dictionary: Arc<Dictionary>,
        recorder: Arc<dyn GameRecorder>,
    ) -> Self {
        Self {
            config,
            dictionary,
            recorder,
            rooms: DashMap::new(),
            lobby: DashMap::new(),
        }
    }

    pub fn config(&self) -> &Arc<GameConfig> {
        &self.config
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    pub fn recorder(&self) -> &Arc<dyn GameRecorder> {
        &self.recorder
    }

    /// Open a room that waits for a second player
    pub fn create_room(self: &Arc<Self>, host: Participant, mode: GameMode) -> RoomHandle {
        self.open(host, mode, None)
    }

    /// Open a room against a bot; the game starts right away
    pub fn create_solo_room(
        self: &Arc<Self>,
        host: Participant,
        mode: GameMode,
        difficulty: BotDifficulty,
    ) -> RoomHandle {
        self.open(host, mode, Some(difficulty))
    }

    fn open(
        self: &Arc<Self>,
        host: Participant,
        mode: GameMode,
        bot: Option<BotDifficulty>,
    ) -> RoomHandle {
        let room_id = Uuid::new_v4();
        let listing = RoomListing {
            room_id,
            host_name: host.name.clone(),
            mode,
            time_per_round: self.config.time_per_round.as_secs(),
        };
        let joinable = bot.is_none();

        let handle = spawn_room(self.clone(), room_id, mode, host, bot);
        self.rooms.insert(
            room_id,
            RoomEntry {
                handle: handle.clone(),
                listing,
                joinable,
            },
        );
        tracing::info!("Room {} created ({} rooms open)", room_id, self.rooms.len());

        if joinable {
            self.broadcast_room_list();
        }
        handle
    }

    pub fn get(&self, room_id: Uuid) -> GameResult<RoomHandle> {
        self.rooms
            .get(&room_id)
            .map(|entry| entry.handle.clone())
            .ok_or(GameError::RoomNotFound)
    }

    /// Rooms currently waiting for a joiner
    pub fn listings(&self) -> Vec<RoomListing> {
        self.rooms
            .iter()
            .filter(|entry| entry.joinable)
            .map(|entry| entry.listing.clone())
            .collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Watch the lobby; the current room list is sent right away
    pub fn subscribe_lobby(&self, connection: ConnectionId, outbound: Outbound) {
        let _ = outbound.send(ServerMessage::RoomList {
            rooms: self.listings(),
        });
        self.lobby.insert(connection, outbound);
    }

    pub fn unsubscribe_lobby(&self, connection: ConnectionId) {
        self.lobby.remove(&connection);
    }

    pub(crate) fn set_joinable(&self, room_id: Uuid, joinable: bool) {
        if let Some(mut entry) = self.rooms.get_mut(&room_id) {
            entry.joinable = joinable;
        }
        self.broadcast_room_list();
    }

    pub(crate) fn remove(&self, room_id: Uuid) {
        if let Some((_, entry)) = self.rooms.remove(&room_id) {
            tracing::info!("Room {} removed ({} rooms open)", room_id, self.rooms.len());
            if entry.joinable {
                self.broadcast_room_list();
            }
        }
    }

    fn broadcast_room_list(&self) {
        let message = ServerMessage::RoomList {
            rooms: self.listings(),
        };

        // Drop lobby sockets whose connection is gone
        self.lobby
            .retain(|_, outbound| outbound.send(message.clone()).is_ok());
    }
}
