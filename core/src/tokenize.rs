//! Whitespace tokenization and stopword filtering.
//!
//! Tokenization is deliberately minimal: lowercase, split on whitespace,
//! optionally drop function words. The stopword set is an explicit value
//! passed into `tokenize`, never ambient global state, so the tokenizer
//! stays pure and the filter is testable in isolation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Immutable set of function words excluded from training and query tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stopwords(HashSet<String>);

impl Stopwords {
    /// Build a stopword set from arbitrary words (case-folded).
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        )
    }

    /// Default English function-word list.
    pub fn english() -> Self {
        Self::from_words([
            // articles & determiners
            "the", "a", "an", "this", "that", "these", "those",
            // be-verbs & auxiliaries
            "is", "are", "was", "were", "be", "been", "being", "am", "have", "has", "had", "do",
            "does", "did",
            // modals
            "will", "would", "shall", "should", "may", "might", "can", "could", "must",
            // prepositions
            "to", "of", "in", "for", "on", "with", "at", "by", "from", "into", "about",
            // conjunctions & negation
            "and", "or", "but", "not", "no", "if", "then", "than", "so", "as",
            // pronouns
            "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my",
            "your", "his", "our", "their", "its",
        ])
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lowercase and whitespace-split a line, dropping stopwords when a set is
/// supplied. May return an empty vector (e.g. a stopword-only line); callers
/// decide whether to keep or drop empty sentences.
pub fn tokenize(line: &str, stopwords: Option<&Stopwords>) -> Vec<String> {
    line.split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| stopwords.map_or(true, |s| !s.contains(w)))
        .collect()
}
