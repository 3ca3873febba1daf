use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, sync::Arc, time::Duration};

use crate::{
    game::{Multiplier, MultiplierKind, Position},
    utils::letters::{LETTER_DISTRIBUTION, LETTER_VALUES},
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database: Option<DatabaseConfig>,
    pub server: ServerConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub dictionary_path: String,
    pub time_per_round: Duration,
    pub bot_thinking_floor: Duration,
    pub solver_timeout: Duration,
    pub reconnect_grace: Duration,
    pub board: Arc<BoardConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            dictionary_path: "./dictionary.txt".to_string(),
            time_per_round: Duration::from_secs(60),
            bot_thinking_floor: Duration::from_millis(3000),
            solver_timeout: Duration::from_millis(20_000),
            reconnect_grace: Duration::from_secs(5),
            board: Arc::new(BoardConfig::default()),
        }
    }
}

/// One entry of the letter distribution
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LetterSpec {
    pub letter: char,
    pub amount: u32,
    pub points: i32,
}

/// Largest board whose rows can be written as a single letter
pub const MAX_BOARD_SIZE: usize = 26;

/// A multiplier cell of the board layout
#[derive(Debug, Clone, Deserialize)]
pub struct MultiplierSpec {
    pub x: i32,
    pub y: i32,
    pub amount: i32,
    pub kind: MultiplierKind,
}

impl MultiplierSpec {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn multiplier(&self) -> Multiplier {
        Multiplier {
            amount: self.amount,
            kind: self.kind,
        }
    }
}

/// Immutable description of the board: size, tiles and multiplier layout
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    pub size: usize,
    pub letter_distribution: Vec<LetterSpec>,
    pub multipliers: Vec<MultiplierSpec>,
}

impl BoardConfig {
    /// Load a board layout file (JSON, TOML or YAML, picked by extension)
    pub fn load(path: &str) -> Result<Self> {
        let board = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .with_context(|| format!("failed to read board config {}", path))?
            .try_deserialize::<BoardConfig>()
            .context("board config has an unexpected shape")?;

        board.validate()?;
        Ok(board)
    }

    /// Rows are named by a single letter, so a board has at most 26 of them
    fn validate(&self) -> Result<()> {
        if self.size == 0 || self.size % 2 == 0 {
            anyhow::bail!("board size must be odd so the board has a center cell");
        }
        if self.size > MAX_BOARD_SIZE {
            anyhow::bail!("board size {} exceeds the {} rows a..z", self.size, MAX_BOARD_SIZE);
        }
        let size = self.size as i32;
        if let Some(cell) = self
            .multipliers
            .iter()
            .find(|m| m.x < 0 || m.y < 0 || m.x >= size || m.y >= size)
        {
            anyhow::bail!("multiplier at ({}, {}) is outside the board", cell.x, cell.y);
        }
        Ok(())
    }

    pub fn center(&self) -> Position {
        let middle = (self.size / 2) as i32;
        Position::new(middle, middle)
    }

    pub fn points(&self) -> std::collections::HashMap<char, i32> {
        self.letter_distribution
            .iter()
            .map(|spec| (spec.letter, spec.points))
            .collect()
    }
}

impl Default for BoardConfig {
    /// Standard 15x15 layout with the classic 100 tile bag
    fn default() -> Self {
        let letter_distribution = LETTER_DISTRIBUTION
            .iter()
            .map(|(letter, amount)| LetterSpec {
                letter: *letter,
                amount: *amount,
                points: LETTER_VALUES.get(letter).copied().unwrap_or(0),
            })
            .collect();

        // One octant of the layout, mirrored across both axes and the diagonal
        const TRIPLE_WORD: &[(i32, i32)] = &[(0, 0), (7, 0)];
        const DOUBLE_WORD: &[(i32, i32)] = &[(1, 1), (2, 2), (3, 3), (4, 4), (7, 7)];
        const TRIPLE_LETTER: &[(i32, i32)] = &[(5, 1), (5, 5)];
        const DOUBLE_LETTER: &[(i32, i32)] = &[(3, 0), (6, 2), (7, 3), (6, 6)];

        let mut cells: Vec<(Position, Multiplier)> = Vec::new();
        let groups = [
            (TRIPLE_WORD, Multiplier::word(3)),
            (DOUBLE_WORD, Multiplier::word(2)),
            (TRIPLE_LETTER, Multiplier::letter(3)),
            (DOUBLE_LETTER, Multiplier::letter(2)),
        ];
        for (coords, multiplier) in groups {
            for &(x, y) in coords {
                for (mx, my) in [(x, y), (14 - x, y), (x, 14 - y), (14 - x, 14 - y)] {
                    for position in [Position::new(mx, my), Position::new(my, mx)] {
                        if !cells.iter().any(|(p, _)| *p == position) {
                            cells.push((position, multiplier));
                        }
                    }
                }
            }
        }

        let multipliers = cells
            .into_iter()
            .map(|(position, multiplier)| MultiplierSpec {
                x: position.x,
                y: position.y,
                amount: multiplier.amount,
                kind: multiplier.kind,
            })
            .collect();

        Self {
            size: 15,
            letter_distribution,
            multipliers,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = match env::var("DATABASE_URL") {
            Ok(url) => Some(DatabaseConfig {
                url,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            }),
            Err(_) => None,
        };

        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a number")?,
        };

        let board = match env::var("BOARD_CONFIG_PATH") {
            Ok(path) => BoardConfig::load(&path)?,
            Err(_) => BoardConfig::default(),
        };

        let game = GameConfig {
            dictionary_path: env::var("DICTIONARY_PATH")
                .unwrap_or_else(|_| "./dictionary.txt".to_string()),
            time_per_round: Duration::from_secs(env_number("TIME_PER_ROUND", 60)),
            bot_thinking_floor: Duration::from_millis(env_number("BOT_THINKING_FLOOR_MS", 3000)),
            solver_timeout: Duration::from_millis(env_number("SOLVER_TIMEOUT_MS", 20_000)),
            reconnect_grace: Duration::from_secs(env_number("RECONNECT_GRACE_SECS", 5)),
            board: Arc::new(board),
        };

        Ok(Config {
            database,
            server,
            game,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn env_number(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_board_layout() {
        let board = BoardConfig::default();
        assert_eq!(board.size, 15);
        assert_eq!(board.center(), Position::new(7, 7));

        let count = |kind: MultiplierKind, amount: i32| {
            board
                .multipliers
                .iter()
                .filter(|m| m.kind == kind && m.amount == amount)
                .count()
        };
        assert_eq!(count(MultiplierKind::Word, 3), 8);
        assert_eq!(count(MultiplierKind::Word, 2), 17, "16 double words plus the center");
        assert_eq!(count(MultiplierKind::Letter, 3), 12);
        assert_eq!(count(MultiplierKind::Letter, 2), 24);
    }

    #[test]
    fn test_board_size_is_checked() {
        assert_ok!(BoardConfig::default().validate());

        let even = BoardConfig {
            size: 14,
            ..BoardConfig::default()
        };
        assert_err!(even.validate());

        let too_large = BoardConfig {
            size: 27,
            ..BoardConfig::default()
        };
        assert_err!(too_large.validate());
    }

    #[test]
    fn test_multiplier_outside_board_is_rejected() {
        let board = BoardConfig {
            size: 7,
            ..BoardConfig::default()
        };
        assert_err!(board.validate());
    }

    #[test]
    fn test_default_board_points_match_letter_table() {
        let points = BoardConfig::default().points();
        assert_eq!(points.get(&'Z'), Some(&10));
        assert_eq!(points.get(&'*'), Some(&0));
        assert_eq!(points.len(), 27);
    }
}
