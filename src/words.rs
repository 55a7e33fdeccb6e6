//! Word list loading and challenge-text generation.

use rand::Rng;
use std::path::Path;

/// Number of words in a generated challenge text.
pub const WORDS_PER_TEXT: usize = 200;

/// Immutable word list, loaded once at process start.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Load a newline-separated word file.
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        tracing::info!("Loading word list from {}", path.as_ref().display());

        let raw = std::fs::read_to_string(path)?;
        let words = raw
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        Ok(Self::from_words(words))
    }

    pub fn from_words(words: Vec<String>) -> Self {
        Self { words }
    }

    /// Build a random challenge text of `num` words. Every word is followed
    /// by a single space, including the last one; clients index into the
    /// text by absolute position, so the shape must stay stable.
    pub fn random_text(&self, num: usize) -> String {
        if self.words.is_empty() {
            return String::new();
        }

        let mut rng = rand::rng();
        let mut chars = String::new();
        for _ in 0..num {
            chars.push_str(&self.words[rng.random_range(0..self.words.len())]);
            chars.push(' ');
        }

        chars
    }
}
