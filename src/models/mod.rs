pub mod game;
pub mod history;

pub use game::{
    BotDifficulty, FinishedPlayer, GameFinish, GameMode, GameStatus, MultiplierCell, PlayerView,
};
pub use history::{GameHistory, HighScore, PlayerScore};
