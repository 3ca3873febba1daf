use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{
    error::{GameError, GameResult},
    scorer::{ScoredCell, Scorer},
    validator::PlacementValidator,
    Direction, Multiplier, PlacedLetter, Position,
};
use crate::{config::BoardConfig, dictionary::Dictionary};

/// Letters proposed for a move, looked up before the committed grid
#[derive(Debug, Clone, Copy)]
pub struct Pending<'a> {
    pub letters: &'a [PlacedLetter],
    pub blanks: &'a HashSet<Position>,
}

impl Pending<'_> {
    fn letter_at(&self, position: Position) -> Option<char> {
        self.letters
            .iter()
            .find(|l| l.position == position)
            .map(|l| l.letter)
    }
}

/// Outcome of a validated, not yet committed placement
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub score: i32,
    pub words: Vec<Vec<PlacedLetter>>,
}

#[derive(Clone)]
pub struct Board {
    size: usize,
    /// Indexed `grid[x][y]`
    grid: Vec<Vec<Option<char>>>,
    multipliers: Vec<Vec<Option<Multiplier>>>,
    points: Arc<HashMap<char, i32>>,
    blanks: HashSet<Position>,
    last_placed_words: Vec<Vec<PlacedLetter>>,
    dictionary: Arc<Dictionary>,
}

impl Board {
    pub fn new(config: &BoardConfig, dictionary: Arc<Dictionary>) -> Self {
        let mut multipliers = vec![vec![None; config.size]; config.size];
        for spec in &config.multipliers {
            let position = spec.position();
            if position.is_within(config.size) {
                multipliers[position.x as usize][position.y as usize] = Some(spec.multiplier());
            }
        }

        Self {
            size: config.size,
            grid: vec![vec![None; config.size]; config.size],
            multipliers,
            points: Arc::new(config.points()),
            blanks: HashSet::new(),
            last_placed_words: Vec::new(),
            dictionary,
        }
    }

    /// Snapshot for hypothetical evaluation, the live board is left untouched
    pub fn copy(&self) -> Board {
        self.clone()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn center(&self) -> Position {
        let middle = (self.size / 2) as i32;
        Position::new(middle, middle)
    }

    pub fn points(&self) -> &HashMap<char, i32> {
        &self.points
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn letter_at(&self, position: Position) -> Option<char> {
        if !position.is_within(self.size) {
            return None;
        }
        self.grid[position.x as usize][position.y as usize]
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        self.letter_at(position).is_some()
    }

    pub fn multiplier_at(&self, position: Position) -> Option<Multiplier> {
        if !position.is_within(self.size) {
            return None;
        }
        self.multipliers[position.x as usize][position.y as usize]
    }

    pub fn is_blank(&self, position: Position) -> bool {
        self.blanks.contains(&position)
    }

    /// True until the first word has been placed
    pub fn is_center_empty(&self) -> bool {
        !self.is_occupied(self.center())
    }

    pub fn last_placed_words(&self) -> &[Vec<PlacedLetter>] {
        &self.last_placed_words
    }

    /// Letters row by row, for the game status snapshot
    pub fn rows(&self) -> Vec<Vec<Option<char>>> {
        (0..self.size)
            .map(|y| (0..self.size).map(|x| self.grid[x][y]).collect())
            .collect()
    }

    /// Multipliers not consumed yet
    pub fn remaining_multipliers(&self) -> Vec<(Position, Multiplier)> {
        let mut remaining = Vec::new();
        for x in 0..self.size {
            for y in 0..self.size {
                if let Some(multiplier) = self.multipliers[x][y] {
                    remaining.push((Position::new(x as i32, y as i32), multiplier));
                }
            }
        }
        remaining
    }

    /// Validate and commit a placement, returning the points it earned.
    ///
    /// Nothing is written unless every affected word is valid.
    pub fn place(
        &mut self,
        letters: &[PlacedLetter],
        blanks: &HashSet<Position>,
        is_first_move: bool,
    ) -> GameResult<i32> {
        let evaluation = self.evaluate(letters, blanks, is_first_move)?;

        for placed in letters {
            let (x, y) = (placed.position.x as usize, placed.position.y as usize);
            self.grid[x][y] = Some(placed.letter);
            self.multipliers[x][y] = None;
            if blanks.contains(&placed.position) {
                self.blanks.insert(placed.position);
            }
        }
        self.last_placed_words = evaluation.words;

        Ok(evaluation.score)
    }

    /// Run every placement rule and score the result without touching the board
    pub fn evaluate(
        &self,
        letters: &[PlacedLetter],
        blanks: &HashSet<Position>,
        is_first_move: bool,
    ) -> GameResult<Evaluation> {
        PlacementValidator::check_shape(self, letters)?;

        if is_first_move && !PlacementValidator::covers_center(self, letters) {
            return Err(GameError::BadStartingMove);
        }

        let pending = Pending { letters, blanks };
        let words = self.affected_words(letters, &pending);

        if !is_first_move {
            let touches_board = words
                .iter()
                .flatten()
                .any(|cell| self.is_occupied(cell.position));
            if !touches_board {
                return Err(GameError::WordNotConnected);
            }
        }

        if words.is_empty() {
            return Err(GameError::WrongWordPosition);
        }

        for word in &words {
            let text = word_text(word);
            if !self.dictionary.contains(&text) {
                return Err(GameError::InvalidWord(text));
            }
        }

        let mut score = 0;
        for word in &words {
            let positions: Vec<Position> = word.iter().map(|cell| cell.position).collect();
            score += self.score_position(&positions, &pending)?;
        }

        Ok(Evaluation { score, words })
    }

    /// Score one word given by its cells, reading pending letters first
    pub fn score_position(&self, word: &[Position], pending: &Pending) -> GameResult<i32> {
        let cells: Vec<ScoredCell> = word
            .iter()
            .map(|&position| ScoredCell {
                letter: pending.letter_at(position).or_else(|| self.letter_at(position)),
                multiplier: self.multiplier_at(position),
                is_blank: pending.blanks.contains(&position) || self.is_blank(position),
            })
            .collect();

        Scorer::score_word(&cells, &self.points)
    }

    /// Every run of two or more letters going through a newly placed letter,
    /// along both axes, without duplicates
    pub fn affected_words(&self, letters: &[PlacedLetter], pending: &Pending) -> Vec<Vec<PlacedLetter>> {
        let mut seen: HashSet<(Position, Direction)> = HashSet::new();
        let mut words = Vec::new();

        for placed in letters {
            for direction in [Direction::Horizontal, Direction::Vertical] {
                let word = self.word_through(placed.position, direction, pending);
                if word.len() < 2 {
                    continue;
                }
                if seen.insert((word[0].position, direction)) {
                    words.push(word);
                }
            }
        }

        words
    }

    /// The contiguous run of letters through `position` along `direction`
    pub fn word_through(&self, position: Position, direction: Direction, pending: &Pending) -> Vec<PlacedLetter> {
        let step = direction.step();
        let cell = |p: Position| pending.letter_at(p).or_else(|| self.letter_at(p));

        let mut start = position;
        while cell(start - step).is_some() {
            start = start - step;
        }

        let mut word = Vec::new();
        let mut current = start;
        while let Some(letter) = cell(current) {
            word.push(PlacedLetter::new(letter, current));
            current = current + step;
        }
        word
    }
}

pub fn word_text(word: &[PlacedLetter]) -> String {
    word.iter().map(|cell| cell.letter).collect()
}
