//! Rooms: one actor task per match.
//!
//! Sockets never touch a [`Game`](crate::game::Game) directly. They send
//! [`RoomCommand`]s through a [`RoomHandle`] and the room task applies them one
//! at a time, alongside its turn timer and bot moves.

pub mod manager;
pub mod session;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::{
    game::{GameError, GameResult},
    websocket::messages::ServerMessage,
};

pub use manager::RoomManager;

/// Channel delivering server messages to one socket
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Identifies one socket connection
pub type ConnectionId = Uuid;

/// Command channel size of each room task
const ROOM_CHANNEL_SIZE: usize = 64;

pub enum RoomCommand {
    Join {
        connection: ConnectionId,
        player_name: String,
        outbound: Outbound,
        reply: oneshot::Sender<GameResult<()>>,
    },
    Respond {
        connection: ConnectionId,
        accept: bool,
    },
    Cancel {
        connection: ConnectionId,
    },
    Play {
        connection: ConnectionId,
        text: String,
    },
    Chat {
        connection: ConnectionId,
        text: String,
    },
    Surrender {
        connection: ConnectionId,
    },
    Leave {
        connection: ConnectionId,
    },
    /// The socket dropped without leaving
    Detach {
        connection: ConnectionId,
    },
    Rejoin {
        connection: ConnectionId,
        player_name: String,
        outbound: Outbound,
        reply: oneshot::Sender<GameResult<()>>,
    },
}

/// Cheap, cloneable way to reach a room task
#[derive(Clone)]
pub struct RoomHandle {
    room_id: Uuid,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    pub async fn join(
        &self,
        connection: ConnectionId,
        player_name: String,
        outbound: Outbound,
    ) -> GameResult<()> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Join {
            connection,
            player_name,
            outbound,
            reply,
        })
        .await?;
        response.await.map_err(|_| GameError::RoomUnavailable)?
    }

    pub async fn rejoin(
        &self,
        connection: ConnectionId,
        player_name: String,
        outbound: Outbound,
    ) -> GameResult<()> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Rejoin {
            connection,
            player_name,
            outbound,
            reply,
        })
        .await?;
        response.await.map_err(|_| GameError::RoomUnavailable)?
    }

    pub async fn respond(&self, connection: ConnectionId, accept: bool) -> GameResult<()> {
        self.send(RoomCommand::Respond { connection, accept }).await
    }

    pub async fn cancel(&self, connection: ConnectionId) -> GameResult<()> {
        self.send(RoomCommand::Cancel { connection }).await
    }

    pub async fn play(&self, connection: ConnectionId, text: String) -> GameResult<()> {
        self.send(RoomCommand::Play { connection, text }).await
    }

    pub async fn chat(&self, connection: ConnectionId, text: String) -> GameResult<()> {
        self.send(RoomCommand::Chat { connection, text }).await
    }

    pub async fn surrender(&self, connection: ConnectionId) -> GameResult<()> {
        self.send(RoomCommand::Surrender { connection }).await
    }

    pub async fn leave(&self, connection: ConnectionId) -> GameResult<()> {
        self.send(RoomCommand::Leave { connection }).await
    }

    pub async fn detach(&self, connection: ConnectionId) -> GameResult<()> {
        self.send(RoomCommand::Detach { connection }).await
    }

    async fn send(&self, command: RoomCommand) -> GameResult<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| GameError::RoomUnavailable)
    }
}
