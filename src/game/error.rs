use thiserror::Error;

/// Rule violations detected while processing a player action.
///
/// These are returned as values and turned into a rejection for the player
/// who sent the action; none of them is fatal to the room.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("it is not your turn")]
    WrongPlayer,
    #[error("the letters are not in your easel")]
    LettersAreNotInEasel,
    #[error("a letter is already placed on that cell")]
    PositionOccupied,
    #[error("the word {0} is not in the dictionary")]
    InvalidWord(String),
    #[error("a letter of the word is missing")]
    LetterIsNull,
    #[error("no points are defined for letter {0}")]
    PointsNotFound(char),
    #[error("the letters do not form a single word")]
    WrongWordPosition,
    #[error("the position is outside of the board")]
    WrongPosition,
    #[error("invalid arguments for the place command")]
    InvalidPlaceCommand,
    #[error("invalid arguments for the exchange command")]
    InvalidExchangeCommand,
    #[error("unknown command {0}")]
    UnknownCommand(String),
    #[error("the game is already finished")]
    GameFinished,
    #[error("the room does not exist")]
    RoomNotFound,
    #[error("the room is not accepting this request")]
    RoomUnavailable,
    #[error("you are not seated in this room")]
    NotInRoom,
    #[error("the word is not connected to the letters on the board")]
    WordNotConnected,
    #[error("the first word must cover the center cell")]
    BadStartingMove,
    #[error("not enough letters left in the bag to exchange")]
    NotEnoughLettersInBag,
}

pub type GameResult<T> = Result<T, GameError>;
