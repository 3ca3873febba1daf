use serde::{Deserialize, Serialize};

use crate::game::{Multiplier, ObjectiveView, Position};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Classic,
    Log2990,
}

impl GameMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Log2990 => "log2990",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BotDifficulty {
    Easy,
    Hard,
}

/// A player as seen by one seat. The opponent's easel is reduced to its size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub score: i32,
    pub easel: Option<Vec<char>>,
    pub easel_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierCell {
    pub position: Position,
    pub multiplier: Multiplier,
}

/// Everything a client needs to draw the game for one seat
#[derive(Debug, Clone, Serialize)]
pub struct GameStatus {
    pub active_player: String,
    pub time_left: u64,
    pub bag_size: usize,
    pub board: Vec<Vec<Option<char>>>,
    pub multipliers: Vec<MultiplierCell>,
    pub players: Vec<PlayerView>,
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectives: Option<ObjectiveView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinishedPlayer {
    pub name: String,
    pub score: i32,
    pub remaining_letters: Vec<char>,
}

/// End of game summary, `winner` is `None` on an exact tie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameFinish {
    pub players: Vec<FinishedPlayer>,
    pub bag_size: usize,
    pub winner: Option<String>,
}
