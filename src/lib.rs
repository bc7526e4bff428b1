//! Core logic for the sonde semantic-proximity solver.
//!
//! Given an oracle that scores guesses by closeness to a hidden word, the
//! solver finds that word using a word embedding space as its only prior.

mod config;
mod engine;
mod error;
mod history;
pub mod hints;
mod index;
pub mod io_utils;
pub mod loader;
pub mod normalize;
pub mod oracle;
pub mod phase;
pub mod trail;
pub mod types;
pub mod weighting;

pub use config::{SolverConfig, DEFAULT_SEEDS};
pub use engine::{solve, SolveObserver, SolverEngine};
pub use error::{OracleError, SolverError};
pub use hints::{select_hints, Hints};
pub use history::History;
pub use index::{cosine_similarity, EmbeddingIndex, Neighbor};
pub use loader::{load_cache, load_path, load_text, load_word2vec_binary, save_cache};
pub use oracle::{FnOracle, GuessOracle, InteractiveOracle, OracleResult, SimulatedOracle};
pub use phase::{Phase, Termination};
pub use trail::{format_attempt, write_history_csv, ScoreScale, Temperature};
pub use types::{
    ExhaustReason, Feedback, Outcome, PhaseKind, RoundSummary, SolveResult, SolveStats, TriedWord,
};
pub use weighting::{MinMaxWeighting, RankWeighting, WeightStrategy, WeightingKind};
