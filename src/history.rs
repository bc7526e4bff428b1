//! Ordered guess history of one run.

use std::collections::HashSet;

use crate::index::EmbeddingIndex;
use crate::normalize::normalize;
use crate::types::{rank_order, Feedback, TriedWord};
use crate::SolverError;

/// Every submission of a run, in order, plus the set of words already tried.
///
/// A word is recorded at most once; the best scored entry is tracked as
/// entries arrive so it can only move to a strictly better score or, on an
/// equal score, to a lexicographically smaller word.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<TriedWord>,
    seen: HashSet<String>,
    best: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from a previous, partially completed run.
    ///
    /// Words are mapped to their canonical vocabulary spelling when the
    /// index knows them. Attempts must be numbered `1..=n` in order and no
    /// word may appear twice.
    pub fn from_prior(prior: Vec<TriedWord>, index: &EmbeddingIndex) -> Result<Self, SolverError> {
        let mut history = Self::new();
        for (i, tried) in prior.into_iter().enumerate() {
            if tried.attempt != i + 1 {
                return Err(SolverError::Config(format!(
                    "resumed history out of order: entry {} has attempt {}",
                    i + 1,
                    tried.attempt
                )));
            }
            let word = match index.canonical(&tried.word) {
                Some(canonical) => canonical.to_string(),
                None => {
                    tracing::warn!(
                        word = %tried.word,
                        attempt = tried.attempt,
                        "resumed word not in vocabulary, it cannot steer the search"
                    );
                    normalize(&tried.word)
                }
            };
            if history.contains(&word) {
                return Err(SolverError::Config(format!(
                    "resumed history repeats {word:?}"
                )));
            }
            history.record(word, tried.feedback)?;
        }
        Ok(history)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.seen.contains(word)
    }

    /// Words already submitted, for neighbour exclusion.
    pub fn tried(&self) -> &HashSet<String> {
        &self.seen
    }

    pub fn entries(&self) -> &[TriedWord] {
        &self.entries
    }

    /// Append a submission and return it.
    pub fn record(&mut self, word: String, feedback: Feedback) -> Result<&TriedWord, SolverError> {
        if !self.seen.insert(word.clone()) {
            return Err(SolverError::Internal(format!("{word:?} submitted twice")));
        }
        let position = self.entries.len();
        self.entries.push(TriedWord {
            word,
            attempt: position + 1,
            feedback,
        });

        let tried = &self.entries[position];
        if let Some(score) = tried.score() {
            let better = match self.best.and_then(|b| {
                let cur = &self.entries[b];
                cur.score().map(|s| (s, cur.word.as_str()))
            }) {
                None => true,
                Some((best_score, best_word)) => {
                    rank_order(score, &tried.word, best_score, best_word).is_lt()
                }
            };
            if better {
                self.best = Some(position);
            }
        }
        Ok(&self.entries[position])
    }

    /// Best scored entry so far.
    pub fn best(&self) -> Option<&TriedWord> {
        self.best.map(|i| &self.entries[i])
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best().and_then(TriedWord::score)
    }

    /// First exact match, if any.
    pub fn exact(&self) -> Option<&TriedWord> {
        self.entries.iter().find(|t| t.is_exact())
    }

    /// Scored entries from best to worst.
    pub fn ranked(&self) -> Vec<&TriedWord> {
        let mut scored: Vec<&TriedWord> = self.entries.iter().filter(|t| t.score().is_some()).collect();
        scored.sort_by(|a, b| {
            rank_order(
                a.score().unwrap_or(f64::NEG_INFINITY),
                &a.word,
                b.score().unwrap_or(f64::NEG_INFINITY),
                &b.word,
            )
        });
        scored
    }

    pub fn into_entries(self) -> Vec<TriedWord> {
        self.entries
    }
}
