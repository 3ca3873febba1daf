//! Secondary goals of the Log2990 mode.
//!
//! Four distinct kinds are drawn from [`OBJECTIVE_POOL`] when a game starts:
//! two are public and shared by both players, the other two are private, one
//! per player. A completed private objective is revealed to the opponent.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use serde::Serialize;

use super::{board::word_text, PlacedLetter, Position};
use crate::{dictionary::Dictionary, utils::letters::is_vowel};

pub const TARGET_WORD_LENGTH: usize = 5;
pub const TARGET_TOTAL_SCORE: i32 = 100;
const PALINDROME_MIN_LENGTH: usize = 3;
const CONSONANTS_NEEDED: usize = 4;
const EXTENSION_MIN_EXISTING: usize = 3;
const EARLY_PLACEMENTS: u32 = 6;
const HIGH_VALUE: i32 = 8;
const PAIR_VALUE: i32 = 4;
const LONG_WORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    Palindrome,
    Consonants,
    WordExtension,
    EarlyHighValue,
    HighValuePair,
    LongWord,
    TargetScore,
    TargetWord,
}

pub const OBJECTIVE_POOL: [ObjectiveKind; 8] = [
    ObjectiveKind::Palindrome,
    ObjectiveKind::Consonants,
    ObjectiveKind::WordExtension,
    ObjectiveKind::EarlyHighValue,
    ObjectiveKind::HighValuePair,
    ObjectiveKind::LongWord,
    ObjectiveKind::TargetScore,
    ObjectiveKind::TargetWord,
];

impl ObjectiveKind {
    fn description(self, target_word: Option<&str>) -> String {
        match self {
            ObjectiveKind::Palindrome => {
                "Form a palindrome of 3 letters or more: the move scores double".to_string()
            }
            ObjectiveKind::Consonants => "Place 4 consonants in a single move: +30".to_string(),
            ObjectiveKind::WordExtension => {
                "Extend a word of 3 letters or more at both ends: +25".to_string()
            }
            ObjectiveKind::EarlyHighValue => {
                "Place a letter worth 8 points or more within the first 6 moves: +20".to_string()
            }
            ObjectiveKind::HighValuePair => {
                "Place two letters worth 4 points or more in a single move: +20".to_string()
            }
            ObjectiveKind::LongWord => "Form a word of 8 letters or more: +40".to_string(),
            ObjectiveKind::TargetScore => {
                format!("Reach exactly {} points: +30", TARGET_TOTAL_SCORE)
            }
            ObjectiveKind::TargetWord => format!(
                "Form the word {}: +50",
                target_word.unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Objective {
    pub kind: ObjectiveKind,
    pub description: String,
    pub is_validated: bool,
}

impl Objective {
    fn new(kind: ObjectiveKind, target_word: Option<&str>) -> Self {
        Self {
            kind,
            description: kind.description(target_word),
            is_validated: false,
        }
    }
}

/// What a player sees of the objectives
#[derive(Debug, Clone, Serialize)]
pub struct ObjectiveView {
    pub public: Vec<Objective>,
    pub private: Objective,
    /// Private objectives the opponent completed
    pub revealed: Vec<Objective>,
}

/// Facts about a successful placement the objectives are checked against
pub struct PlacementContext<'a> {
    pub placed: &'a [PlacedLetter],
    pub blanks: &'a HashSet<Position>,
    pub words: &'a [Vec<PlacedLetter>],
    pub points: &'a HashMap<char, i32>,
    /// Score of the player before this move
    pub player_score: i32,
    /// Placements made in the game before this one
    pub placements_so_far: u32,
}

impl PlacementContext<'_> {
    fn placed_value(&self, letter: &PlacedLetter) -> i32 {
        if self.blanks.contains(&letter.position) {
            0
        } else {
            self.points.get(&letter.letter).copied().unwrap_or(0)
        }
    }

    fn is_new(&self, position: Position) -> bool {
        self.placed.iter().any(|l| l.position == position)
    }
}

#[derive(Debug, Clone)]
pub struct ObjectiveEngine {
    public: Vec<Objective>,
    private: [Objective; 2],
    revealed: [Vec<Objective>; 2],
    target_word: Option<String>,
}

impl ObjectiveEngine {
    /// Draw four distinct objectives for a new game
    pub fn new(dictionary: &Dictionary) -> Self {
        let target_word = dictionary.random_word(TARGET_WORD_LENGTH);

        let mut pool: Vec<ObjectiveKind> = OBJECTIVE_POOL
            .iter()
            .copied()
            .filter(|kind| *kind != ObjectiveKind::TargetWord || target_word.is_some())
            .collect();
        pool.shuffle(&mut rand::rng());

        Self::with_kinds([pool[0], pool[1]], [pool[2], pool[3]], target_word)
    }

    pub fn with_kinds(
        public: [ObjectiveKind; 2],
        private: [ObjectiveKind; 2],
        target_word: Option<String>,
    ) -> Self {
        let target = target_word.as_deref();
        Self {
            public: public.iter().map(|kind| Objective::new(*kind, target)).collect(),
            private: [
                Objective::new(private[0], target),
                Objective::new(private[1], target),
            ],
            revealed: [Vec::new(), Vec::new()],
            target_word,
        }
    }

    /// Apply every objective `player` has not completed yet to `score`.
    ///
    /// An objective is completed when it changes the score.
    pub fn verify_objectives(&mut self, player: usize, context: &PlacementContext, score: i32) -> i32 {
        let mut adjusted = score;

        for objective in self.public.iter_mut().filter(|o| !o.is_validated) {
            let next = apply(objective.kind, context, adjusted, self.target_word.as_deref());
            if next != adjusted {
                objective.is_validated = true;
                adjusted = next;
                tracing::debug!("Player {} completed public objective {:?}", player, objective.kind);
            }
        }

        let private = &mut self.private[player];
        if !private.is_validated {
            let next = apply(private.kind, context, adjusted, self.target_word.as_deref());
            if next != adjusted {
                private.is_validated = true;
                adjusted = next;
                self.revealed[1 - player].push(private.clone());
                tracing::debug!("Player {} completed private objective {:?}", player, private.kind);
            }
        }

        adjusted
    }

    /// Exchange everything the two seats hold, used when a seat changes hands
    pub fn switching_players_objectives(&mut self) {
        self.private.swap(0, 1);
        self.revealed.swap(0, 1);
    }

    pub fn objectives_for(&self, player: usize) -> ObjectiveView {
        ObjectiveView {
            public: self.public.clone(),
            private: self.private[player].clone(),
            revealed: self.revealed[player].clone(),
        }
    }
}

fn apply(kind: ObjectiveKind, context: &PlacementContext, score: i32, target_word: Option<&str>) -> i32 {
    match kind {
        ObjectiveKind::Palindrome => {
            let found = context.words.iter().any(|word| {
                let text = word_text(word);
                text.len() >= PALINDROME_MIN_LENGTH && text.chars().eq(text.chars().rev())
            });
            if found && score > 0 {
                score * 2
            } else {
                score
            }
        }
        ObjectiveKind::Consonants => {
            let consonants = context
                .placed
                .iter()
                .filter(|l| !is_vowel(l.letter))
                .count();
            if consonants >= CONSONANTS_NEEDED {
                score + 30
            } else {
                score
            }
        }
        ObjectiveKind::WordExtension => {
            let extended = context.words.iter().any(|word| {
                let existing = word.iter().filter(|l| !context.is_new(l.position)).count();
                let (first, last) = (word[0], word[word.len() - 1]);
                existing >= EXTENSION_MIN_EXISTING
                    && context.is_new(first.position)
                    && context.is_new(last.position)
            });
            if extended {
                score + 25
            } else {
                score
            }
        }
        ObjectiveKind::EarlyHighValue => {
            let early = context.placements_so_far < EARLY_PLACEMENTS
                && context.placed.iter().any(|l| context.placed_value(l) >= HIGH_VALUE);
            if early {
                score + 20
            } else {
                score
            }
        }
        ObjectiveKind::HighValuePair => {
            let valuable = context
                .placed
                .iter()
                .filter(|l| context.placed_value(l) >= PAIR_VALUE)
                .count();
            if valuable >= 2 {
                score + 20
            } else {
                score
            }
        }
        ObjectiveKind::LongWord => {
            if context.words.iter().any(|word| word.len() >= LONG_WORD_LENGTH) {
                score + 40
            } else {
                score
            }
        }
        ObjectiveKind::TargetScore => {
            if context.player_score + score == TARGET_TOTAL_SCORE {
                score + 30
            } else {
                score
            }
        }
        ObjectiveKind::TargetWord => {
            let formed = target_word.is_some_and(|target| {
                context.words.iter().any(|word| word_text(word) == target)
            });
            if formed {
                score + 50
            } else {
                score
            }
        }
    }
}
