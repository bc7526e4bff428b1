//! Records produced by a solver run.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// What the oracle said about one submitted word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    /// The word is the hidden target.
    Exact,
    /// Raw oracle score plus the 0–1000 percentile when the oracle reports one.
    Scored { score: f64, percentile: Option<u16> },
    /// The oracle does not know the word; carries no information.
    Unknown,
}

/// One attempt of a run. `attempt` is 1-based submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriedWord {
    pub word: String,
    pub attempt: usize,
    pub feedback: Feedback,
}

impl TriedWord {
    /// Score usable as an ordering signal, if any.
    pub fn score(&self) -> Option<f64> {
        match self.feedback {
            Feedback::Scored { score, .. } => Some(score),
            _ => None,
        }
    }

    pub fn percentile(&self) -> Option<u16> {
        match self.feedback {
            Feedback::Scored { percentile, .. } => percentile,
            Feedback::Exact => Some(1000),
            Feedback::Unknown => None,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self.feedback, Feedback::Exact)
    }
}

/// Ranking used for pivot and best-so-far selection: higher score first,
/// lexicographically smaller word on ties.
pub fn rank_order(a_score: f64, a_word: &str, b_score: f64, b_word: &str) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| a_word.cmp(b_word))
}

/// Coarse phase tag used in logs, observers and round summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Seeding,
    Reconstructing,
    Iterating,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseKind::Seeding => "seeding",
            PhaseKind::Reconstructing => "reconstructing",
            PhaseKind::Iterating => "iterating",
        };
        f.write_str(name)
    }
}

/// Why a run ended without an exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustReason {
    /// `max_total_attempts` submissions were made.
    AttemptBudget,
    /// Too many consecutive iteration rounds without a better score.
    NoImprovement,
    /// Every reachable neighbour has already been tried.
    NoCandidates,
    /// No submission ever produced a usable score.
    NoScoredGuesses,
}

impl fmt::Display for ExhaustReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExhaustReason::AttemptBudget => "attempt budget spent",
            ExhaustReason::NoImprovement => "no improvement",
            ExhaustReason::NoCandidates => "no untried candidates left",
            ExhaustReason::NoScoredGuesses => "no scored guesses",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Found { word: String },
    Exhausted { best: Option<String>, reason: ExhaustReason },
}

/// State after one completed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub phase: PhaseKind,
    /// 1-based within its phase.
    pub round: usize,
    pub submitted: usize,
    pub best_word: Option<String>,
    pub best_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveStats {
    pub attempts: usize,
    pub scored: usize,
    pub unknown: usize,
    /// Attempts carried over from a resumed history.
    pub resumed: usize,
    pub reconstruction_rounds: usize,
    pub iteration_rounds: usize,
    pub rounds: Vec<RoundSummary>,
}

/// Terminal outcome of one run, owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub outcome: Outcome,
    pub history: Vec<TriedWord>,
    pub stats: SolveStats,
    /// Fingerprint of the embedding space the run used.
    pub index_fingerprint: String,
}

impl SolveResult {
    pub fn attempts(&self) -> usize {
        self.history.len()
    }

    pub fn found_word(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Found { word } => Some(word),
            Outcome::Exhausted { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.found_word().is_some()
    }
}
