//! Solver phases and the predicates that move between them.
//!
//! `Seeding -> Reconstructing -> Iterating -> Terminated`. Transitions are
//! driven by score feedback; every predicate here is a pure function of the
//! round just completed so it can be tested without an oracle.

use crate::config::SolverConfig;
use crate::types::{ExhaustReason, PhaseKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    Found(String),
    Exhausted(ExhaustReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Seeding,
    /// `round` completed rounds, `stale` of them consecutive without improvement.
    Reconstructing { round: usize, stale: usize },
    Iterating { round: usize, stale: usize },
    Terminated(Termination),
}

impl Phase {
    pub fn kind(&self) -> Option<PhaseKind> {
        match self {
            Phase::Seeding => Some(PhaseKind::Seeding),
            Phase::Reconstructing { .. } => Some(PhaseKind::Reconstructing),
            Phase::Iterating { .. } => Some(PhaseKind::Iterating),
            Phase::Terminated(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Terminated(_))
    }
}

/// Limits the transition predicates read from the config.
#[derive(Debug, Clone, Copy)]
pub struct PhaseLimits {
    pub reconstruction_rounds: usize,
    pub no_improvement_rounds: usize,
    pub min_improvement: f64,
}

impl From<&SolverConfig> for PhaseLimits {
    fn from(config: &SolverConfig) -> Self {
        Self {
            reconstruction_rounds: config.reconstruction_rounds,
            no_improvement_rounds: config.no_improvement_rounds,
            min_improvement: config.min_improvement,
        }
    }
}

/// Whether `after` beats `before` by more than `min_improvement`.
pub fn improved(before: Option<f64>, after: Option<f64>, min_improvement: f64) -> bool {
    match (before, after) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(b), Some(a)) => a > b + min_improvement,
    }
}

/// Seeding hands over to reconstruction, or straight to iteration when no
/// reconstruction rounds are allowed.
pub fn after_seeding(limits: &PhaseLimits) -> Phase {
    if limits.reconstruction_rounds == 0 {
        Phase::Iterating { round: 0, stale: 0 }
    } else {
        Phase::Reconstructing { round: 0, stale: 0 }
    }
}

/// Next phase once reconstruction round `round` (1-based) has finished.
///
/// `estimated` is false when no target estimate could be formed and
/// `submitted` counts the candidates sent to the oracle this round.
pub fn after_reconstruction(
    limits: &PhaseLimits,
    round: usize,
    stale: usize,
    estimated: bool,
    submitted: usize,
) -> Phase {
    if !estimated
        || submitted == 0
        || stale >= limits.no_improvement_rounds
        || round >= limits.reconstruction_rounds
    {
        Phase::Iterating { round: 0, stale: 0 }
    } else {
        Phase::Reconstructing { round, stale }
    }
}

/// Next phase once iteration round `round` (1-based) has finished.
///
/// `pivot` is false when no scored word with a vector exists.
pub fn after_iteration(
    limits: &PhaseLimits,
    round: usize,
    stale: usize,
    pivot: bool,
    submitted: usize,
) -> Phase {
    if !pivot {
        Phase::Terminated(Termination::Exhausted(ExhaustReason::NoScoredGuesses))
    } else if submitted == 0 {
        Phase::Terminated(Termination::Exhausted(ExhaustReason::NoCandidates))
    } else if stale >= limits.no_improvement_rounds {
        Phase::Terminated(Termination::Exhausted(ExhaustReason::NoImprovement))
    } else {
        Phase::Iterating { round, stale }
    }
}

/// Stale counter after a round.
pub fn next_stale(stale: usize, improved: bool) -> usize {
    if improved {
        0
    } else {
        stale + 1
    }
}
