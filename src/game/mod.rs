// Game engine modules

pub mod bag;
pub mod board;
pub mod command;
pub mod error;
pub mod objectives;
pub mod player;
pub mod position;
pub mod scorer;
pub mod state;
pub mod timer;
pub mod validator;

pub use board::Board;
pub use command::{Command, PlaceCommand};
pub use error::{GameError, GameResult};
pub use objectives::ObjectiveView;
pub use position::{Direction, Multiplier, MultiplierKind, PlacedLetter, Position};
pub use state::Game;
pub use timer::{TurnExpired, TurnTimer};
