use thiserror::Error;

/// Boxed failure reported by a [`crate::oracle::GuessOracle`].
pub type OracleError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum SolverError {
    /// Word absent from the embedding vocabulary.
    #[error("word not in vocabulary: {0}")]
    NotFound(String),

    /// Two vectors of different dimensionality met in one operation.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The guess oracle failed; the current run is aborted.
    #[error("oracle failure: {0}")]
    Oracle(#[source] OracleError),

    /// Malformed embedding source.
    #[error("load error: {0}")]
    Load(String),

    /// Invalid solver configuration or resume history.
    #[error("config error: {0}")]
    Config(String),

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache or history (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Catch all for unexpected internal problems.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SolverError {
    /// Whether the error only concerns a single lookup and the run can go on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SolverError::NotFound(_))
    }
}

impl From<bincode::Error> for SolverError {
    fn from(err: bincode::Error) -> Self {
        SolverError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SolverError {
    fn from(err: serde_json::Error) -> Self {
        SolverError::Serialization(err.to_string())
    }
}
