use std::collections::HashSet;
use std::fmt;

use super::{
    board::Board,
    error::{GameError, GameResult},
    Direction, PlacedLetter, Position,
};
use crate::utils::letters::BLANK;

const MAX_LETTERS: usize = 7;

/// A player's turn action, parsed from its text form.
///
/// ```text
/// !place h8h con     row h, column 8, horizontal; uppercase letters use a blank
/// !exchange ab*      put a, b and a blank back in the bag
/// !skip
/// !hint
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Place(PlaceCommand),
    Exchange(Vec<char>),
    Skip,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceCommand {
    pub start: Position,
    pub direction: Direction,
    /// Letters in placement order, `true` when played with a blank
    pub letters: Vec<(char, bool)>,
}

impl Command {
    pub fn parse(text: &str) -> GameResult<Command> {
        let mut parts = text.split_whitespace();
        let verb = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match verb {
            "!place" => match args.as_slice() {
                [position, letters] => PlaceCommand::parse(position, letters).map(Command::Place),
                _ => Err(GameError::InvalidPlaceCommand),
            },
            "!exchange" => match args.as_slice() {
                [letters] => parse_exchange(letters).map(Command::Exchange),
                _ => Err(GameError::InvalidExchangeCommand),
            },
            "!skip" if args.is_empty() => Ok(Command::Skip),
            "!hint" if args.is_empty() => Ok(Command::Hint),
            _ => Err(GameError::UnknownCommand(text.trim().to_string())),
        }
    }
}

impl PlaceCommand {
    fn parse(position: &str, letters: &str) -> GameResult<PlaceCommand> {
        let mut chars = position.chars();
        let row = chars
            .next()
            .filter(|c| c.is_ascii_lowercase())
            .ok_or(GameError::InvalidPlaceCommand)?;
        let rest: String = chars.collect();

        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        let column: i32 = digits.parse().map_err(|_| GameError::InvalidPlaceCommand)?;
        if column < 1 {
            return Err(GameError::InvalidPlaceCommand);
        }

        let letters: Vec<(char, bool)> = letters
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() {
                    Ok((c.to_ascii_uppercase(), false))
                } else if c.is_ascii_uppercase() {
                    Ok((c, true))
                } else {
                    Err(GameError::InvalidPlaceCommand)
                }
            })
            .collect::<GameResult<_>>()?;
        if letters.is_empty() || letters.len() > MAX_LETTERS {
            return Err(GameError::InvalidPlaceCommand);
        }

        let direction = match &rest[digits.len()..] {
            "h" => Direction::Horizontal,
            "v" => Direction::Vertical,
            "" if letters.len() == 1 => Direction::Horizontal,
            _ => return Err(GameError::InvalidPlaceCommand),
        };

        Ok(PlaceCommand {
            start: Position::new(column - 1, (row as u8 - b'a') as i32),
            direction,
            letters,
        })
    }

    /// Build the command that replays a placement
    pub fn from_placement(
        letters: &[PlacedLetter],
        blanks: &HashSet<Position>,
        direction: Direction,
    ) -> PlaceCommand {
        let mut ordered = letters.to_vec();
        ordered.sort_by_key(|l| match direction {
            Direction::Horizontal => l.position.x,
            Direction::Vertical => l.position.y,
        });

        PlaceCommand {
            start: ordered.first().map(|l| l.position).unwrap_or_default(),
            direction,
            letters: ordered
                .iter()
                .map(|l| (l.letter, blanks.contains(&l.position)))
                .collect(),
        }
    }

    /// Letters the easel must hold, a blank counting as `*`
    pub fn easel_letters(&self) -> Vec<char> {
        self.letters
            .iter()
            .map(|&(letter, is_blank)| if is_blank { BLANK } else { letter })
            .collect()
    }

    /// Lay the letters out from the start cell, stepping over occupied cells
    pub fn resolve(&self, board: &Board) -> GameResult<(Vec<PlacedLetter>, HashSet<Position>)> {
        let step = self.direction.step();
        let mut current = self.start;
        let mut placed = Vec::with_capacity(self.letters.len());
        let mut blanks = HashSet::new();

        for &(letter, is_blank) in &self.letters {
            while board.is_occupied(current) {
                current = current + step;
            }
            if !current.is_within(board.size()) {
                return Err(GameError::WrongPosition);
            }
            placed.push(PlacedLetter::new(letter, current));
            if is_blank {
                blanks.insert(current);
            }
            current = current + step;
        }

        Ok((placed, blanks))
    }
}

impl fmt::Display for PlaceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = (b'a' + self.start.y as u8) as char;
        let letters: String = self
            .letters
            .iter()
            .map(|&(letter, is_blank)| {
                if is_blank {
                    letter
                } else {
                    letter.to_ascii_lowercase()
                }
            })
            .collect();
        write!(
            f,
            "!place {}{}{} {}",
            row,
            self.start.x + 1,
            self.direction.as_char(),
            letters
        )
    }
}

fn parse_exchange(letters: &str) -> GameResult<Vec<char>> {
    let parsed: Vec<char> = letters
        .chars()
        .map(|c| match c {
            'a'..='z' => Ok(c.to_ascii_uppercase()),
            BLANK => Ok(BLANK),
            _ => Err(GameError::InvalidExchangeCommand),
        })
        .collect::<GameResult<_>>()?;

    if parsed.is_empty() || parsed.len() > MAX_LETTERS {
        return Err(GameError::InvalidExchangeCommand);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BoardConfig, dictionary::Dictionary};
    use std::sync::Arc;

    #[test]
    fn test_parse_place() {
        let command = Command::parse("!place h8h coN").unwrap();
        assert_eq!(
            command,
            Command::Place(PlaceCommand {
                start: Position::new(7, 7),
                direction: Direction::Horizontal,
                letters: vec![('C', false), ('O', false), ('N', true)],
            })
        );
    }

    #[test]
    fn test_parse_single_letter_without_direction() {
        let command = Command::parse("!place a15 e").unwrap();
        let Command::Place(place) = command else {
            panic!("expected a place command");
        };
        assert_eq!(place.start, Position::new(14, 0));
        assert_eq!(place.direction, Direction::Horizontal);
    }

    #[test]
    fn test_parse_rejects_malformed_arguments() {
        assert_eq!(Command::parse("!place h8 con"), Err(GameError::InvalidPlaceCommand));
        assert_eq!(Command::parse("!place 8h con"), Err(GameError::InvalidPlaceCommand));
        assert_eq!(Command::parse("!place h8h c0n"), Err(GameError::InvalidPlaceCommand));
        assert_eq!(Command::parse("!place h8h"), Err(GameError::InvalidPlaceCommand));
        assert_eq!(Command::parse("!exchange ABC"), Err(GameError::InvalidExchangeCommand));
        assert_eq!(Command::parse("!exchange abcdefgh"), Err(GameError::InvalidExchangeCommand));
        assert_eq!(
            Command::parse("!shuffle"),
            Err(GameError::UnknownCommand("!shuffle".to_string()))
        );
    }

    #[test]
    fn test_parse_exchange_skip_hint() {
        assert_eq!(Command::parse("!exchange ab*"), Ok(Command::Exchange(vec!['A', 'B', '*'])));
        assert_eq!(Command::parse("!skip"), Ok(Command::Skip));
        assert_eq!(Command::parse("  !hint "), Ok(Command::Hint));
    }

    #[test]
    fn test_resolve_steps_over_existing_letters() {
        let dictionary = Arc::new(Dictionary::from_words(["CON", "CONE"]));
        let mut board = Board::new(&BoardConfig::default(), dictionary);
        let Command::Place(first) = Command::parse("!place h7h con").unwrap() else {
            panic!("expected a place command");
        };
        let (letters, blanks) = first.resolve(&board).unwrap();
        board.place(&letters, &blanks, true).unwrap();

        // Starting on the C, the new letter lands after the existing N
        let Command::Place(extension) = Command::parse("!place h7h E").unwrap() else {
            panic!("expected a place command");
        };
        let (letters, blanks) = extension.resolve(&board).unwrap();
        assert_eq!(letters, vec![PlacedLetter::new('E', Position::new(9, 7))]);
        assert!(blanks.contains(&Position::new(9, 7)));
        assert_eq!(extension.easel_letters(), vec!['*']);
    }

    #[test]
    fn test_resolve_off_board() {
        let board = Board::new(&BoardConfig::default(), Arc::new(Dictionary::empty()));
        let Command::Place(command) = Command::parse("!place h14h con").unwrap() else {
            panic!("expected a place command");
        };
        assert_eq!(command.resolve(&board), Err(GameError::WrongPosition));
    }

    #[test]
    fn test_display_matches_parse() {
        let letters = vec![
            PlacedLetter::new('O', Position::new(8, 7)),
            PlacedLetter::new('C', Position::new(7, 7)),
        ];
        let blanks = HashSet::from([Position::new(8, 7)]);
        let command = PlaceCommand::from_placement(&letters, &blanks, Direction::Horizontal);

        assert_eq!(command.to_string(), "!place h8h cO");
        assert_eq!(Command::parse(&command.to_string()), Ok(Command::Place(command)));
    }
}
