use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BotDifficulty, GameFinish, GameMode, GameStatus};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        player_name: String,
        mode: GameMode,
    },
    CreateSoloRoom {
        player_name: String,
        mode: GameMode,
        difficulty: BotDifficulty,
    },
    JoinRoom {
        room_id: Uuid,
        player_name: String,
    },
    /// The host's answer to a pending join request
    RespondToJoin {
        accept: bool,
    },
    /// Host closes a room before the game starts, or a joiner withdraws
    CancelRoom,
    /// `!place`, `!exchange`, `!skip` or `!hint`
    Command {
        text: String,
    },
    Chat {
        text: String,
    },
    Surrender,
    LeaveRoom,
    Rejoin {
        room_id: Uuid,
        player_name: String,
    },
    ListRooms,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomCreated {
        room_id: Uuid,
    },
    RoomList {
        rooms: Vec<RoomListing>,
    },
    JoinRequest {
        player_name: String,
    },
    JoinPending {
        room_id: Uuid,
    },
    JoinRefused,
    JoinCancelled {
        player_name: String,
    },
    RoomCancelled,
    GameStarted {
        room_id: Uuid,
        opponent: String,
    },
    GameStatus {
        status: GameStatus,
    },
    MovePlayed {
        player_name: String,
        command: String,
        score: i32,
    },
    Hints {
        hints: Vec<String>,
    },
    CommandRejected {
        reason: String,
    },
    Chat {
        from: String,
        text: String,
    },
    System {
        text: String,
    },
    GameOver {
        finish: GameFinish,
    },
    Error {
        message: String,
    },
}

/// A room waiting for a second player, as shown in the lobby
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomListing {
    pub room_id: Uuid,
    pub host_name: String,
    pub mode: GameMode,
    pub time_per_round: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_format() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"type":"command","text":"!place h8h con"}"#).unwrap();
        assert!(matches!(message, ClientMessage::Command { text } if text == "!place h8h con"));

        let message: ClientMessage = serde_json::from_str(
            r#"{"type":"create_solo_room","player_name":"Alice","mode":"log2990","difficulty":"hard"}"#,
        )
        .unwrap();
        assert!(matches!(
            message,
            ClientMessage::CreateSoloRoom {
                mode: GameMode::Log2990,
                difficulty: BotDifficulty::Hard,
                ..
            }
        ));
    }

    #[test]
    fn test_server_message_is_tagged() {
        let json = serde_json::to_value(ServerMessage::Hints {
            hints: vec!["!place h8h con".to_string()],
        })
        .unwrap();
        assert_eq!(json["type"], "hints");
        assert_eq!(json["hints"][0], "!place h8h con");
    }
}
