use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tokio::fs;
use anyhow::Result;
use rand::seq::IndexedRandom;

/// Word list used to validate placements and feed the solver.
///
/// Words are stored uppercase, and also bucketed by length so the solver can
/// scan only the candidates that fit a given span.
pub struct Dictionary {
    words: HashSet<String>,
    by_length: BTreeMap<usize, Vec<String>>,
}

impl Dictionary {
    /// Load dictionary from a file, one word per line
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let dictionary = Self::from_words(content.lines());

        tracing::info!("Loaded {} words into dictionary", dictionary.len());

        Ok(dictionary)
    }

    /// Build a dictionary from an in-memory word list
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: HashSet<String> = words
            .into_iter()
            .map(|line| line.as_ref().trim().to_uppercase())
            .filter(|word| word.len() >= 2 && word.chars().all(|c| c.is_ascii_uppercase()))
            .collect();

        let mut by_length: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for word in &words {
            by_length.entry(word.len()).or_default().push(word.clone());
        }
        for bucket in by_length.values_mut() {
            bucket.sort();
        }

        Self { words, by_length }
    }

    /// Create an empty dictionary (for testing)
    pub fn empty() -> Self {
        Self::from_words(std::iter::empty::<&str>())
    }

    /// Check if a word exists in the dictionary
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_uppercase())
    }

    /// Words of exactly `length` letters, sorted
    pub fn words_of_length(&self, length: usize) -> &[String] {
        self.by_length
            .get(&length)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every word whose length lies in `range`, shortest first
    pub fn words_in(&self, range: std::ops::RangeInclusive<usize>) -> impl Iterator<Item = &String> {
        let buckets = (!range.is_empty()).then(|| self.by_length.range(range));
        buckets.into_iter().flatten().flat_map(|(_, bucket)| bucket.iter())
    }

    /// Pick a random word of the given length
    pub fn random_word(&self, length: usize) -> Option<String> {
        self.words_of_length(length)
            .choose(&mut rand::rng())
            .cloned()
    }

    /// Get the number of words in the dictionary
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
