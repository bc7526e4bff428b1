//! Phased search for the hidden word.
//!
//! The engine seeds the history with fixed words, reconstructs an estimated
//! target vector from the best scores and probes its neighbourhood, then
//! hill-climbs from the best word found. See [`crate::phase`] for the
//! transition rules.

use tracing::{debug, info, warn};

use crate::config::SolverConfig;
use crate::history::History;
use crate::index::EmbeddingIndex;
use crate::oracle::{GuessOracle, OracleResult};
use crate::phase::{
    after_iteration, after_reconstruction, after_seeding, improved, next_stale, Phase,
    PhaseLimits, Termination,
};
use crate::types::{
    ExhaustReason, Feedback, Outcome, PhaseKind, RoundSummary, SolveResult, SolveStats, TriedWord,
};
use crate::weighting::{estimate_target, WeightStrategy};
use crate::SolverError;

/// Progress callbacks; both default to doing nothing.
pub trait SolveObserver {
    fn on_attempt(&mut self, _tried: &TriedWord, _phase: PhaseKind) {}
    fn on_round(&mut self, _summary: &RoundSummary) {}
}

impl SolveObserver for () {}

enum Step {
    Continue,
    Stop(Termination),
}

/// One run against one puzzle. Not reusable: [`SolverEngine::run`] consumes it.
pub struct SolverEngine<'a, O> {
    index: &'a EmbeddingIndex,
    oracle: O,
    config: SolverConfig,
    limits: PhaseLimits,
    strategy: Box<dyn WeightStrategy>,
    history: History,
    phase: Phase,
    stats: SolveStats,
    observer: Option<Box<dyn SolveObserver + 'a>>,
}

impl<'a, O: GuessOracle> SolverEngine<'a, O> {
    pub fn new(index: &'a EmbeddingIndex, oracle: O, config: SolverConfig) -> Result<Self, SolverError> {
        Self::resume(index, oracle, config, Vec::new())
    }

    /// Continue a partially completed puzzle from its previous history.
    pub fn resume(
        index: &'a EmbeddingIndex,
        oracle: O,
        config: SolverConfig,
        prior: Vec<TriedWord>,
    ) -> Result<Self, SolverError> {
        config.validate()?;
        if prior.len() > config.max_total_attempts {
            return Err(SolverError::Config(format!(
                "resumed history holds {} attempts, budget is {}",
                prior.len(),
                config.max_total_attempts
            )));
        }
        let history = History::from_prior(prior, index)?;
        let phase = match history.exact() {
            Some(t) => Phase::Terminated(Termination::Found(t.word.clone())),
            None => Phase::Seeding,
        };
        let stats = SolveStats {
            resumed: history.len(),
            ..SolveStats::default()
        };
        Ok(Self {
            index,
            oracle,
            limits: PhaseLimits::from(&config),
            strategy: config.weighting.build(),
            config,
            history,
            phase,
            stats,
            observer: None,
        })
    }

    /// Replace the weighting strategy chosen by the config.
    pub fn with_strategy(mut self, strategy: Box<dyn WeightStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_observer(mut self, observer: impl SolveObserver + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Drive the state machine to termination.
    pub fn run(mut self) -> Result<SolveResult, SolverError> {
        while !self.phase.is_terminal() {
            self.step()?;
        }
        Ok(self.finish())
    }

    /// Execute one round of the current phase and apply its transition.
    pub fn step(&mut self) -> Result<&Phase, SolverError> {
        let next = match self.phase.clone() {
            Phase::Seeding => self.seed()?,
            Phase::Reconstructing { round, stale } => self.reconstruct(round, stale)?,
            Phase::Iterating { round, stale } => self.iterate(round, stale)?,
            Phase::Terminated(_) => return Ok(&self.phase),
        };
        if next.kind() != self.phase.kind() {
            info!(
                from = ?self.phase.kind(),
                to = ?next.kind(),
                attempts = self.history.len(),
                best = ?self.history.best_score(),
                "phase transition"
            );
        }
        self.phase = next;
        Ok(&self.phase)
    }

    fn submit(&mut self, word: String, phase: PhaseKind) -> Result<Step, SolverError> {
        if self.history.contains(&word) {
            debug!(word = %word, "already tried, not resubmitted");
            return Ok(Step::Continue);
        }
        if self.history.len() >= self.config.max_total_attempts {
            return Ok(Step::Stop(Termination::Exhausted(ExhaustReason::AttemptBudget)));
        }

        let result = self.oracle.submit(&word).map_err(SolverError::Oracle)?;
        let feedback = match result {
            OracleResult::ExactMatch => Feedback::Exact,
            OracleResult::Scored { score, .. } if !score.is_finite() => {
                return Err(SolverError::Oracle(
                    format!("non-finite score {score} for {word:?}").into(),
                ));
            }
            OracleResult::Scored { score, percentile } => Feedback::Scored { score, percentile },
            OracleResult::UnknownWord => Feedback::Unknown,
        };
        let tried = self.history.record(word, feedback)?;
        debug!(
            attempt = tried.attempt,
            word = %tried.word,
            phase = %phase,
            feedback = ?tried.feedback,
            "oracle answered"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_attempt(tried, phase);
        }

        if tried.is_exact() {
            Ok(Step::Stop(Termination::Found(tried.word.clone())))
        } else {
            Ok(Step::Continue)
        }
    }

    fn close_round(&mut self, phase: PhaseKind, round: usize, submitted: usize) {
        let best = self.history.best();
        let summary = RoundSummary {
            phase,
            round,
            submitted,
            best_word: best.map(|t| t.word.clone()),
            best_score: best.and_then(TriedWord::score),
        };
        match phase {
            PhaseKind::Seeding => {}
            PhaseKind::Reconstructing => self.stats.reconstruction_rounds += 1,
            PhaseKind::Iterating => self.stats.iteration_rounds += 1,
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.on_round(&summary);
        }
        self.stats.rounds.push(summary);
    }

    fn seed(&mut self) -> Result<Phase, SolverError> {
        let index = self.index;
        let seeds = self.config.seeds.clone();
        let mut submitted = 0;
        for seed in &seeds {
            let canonical = match index.canonical(seed) {
                Some(word) => word.to_string(),
                None => {
                    warn!(seed = %seed, "seed not in vocabulary, skipped");
                    continue;
                }
            };
            if self.history.contains(&canonical) {
                continue;
            }
            submitted += 1;
            if let Step::Stop(t) = self.submit(canonical, PhaseKind::Seeding)? {
                return Ok(Phase::Terminated(t));
            }
        }
        self.close_round(PhaseKind::Seeding, 1, submitted);
        Ok(after_seeding(&self.limits))
    }

    fn reconstruct(&mut self, round: usize, stale: usize) -> Result<Phase, SolverError> {
        let index = self.index;
        let round = round + 1;
        let before = self.history.best_score();

        let estimate = estimate_target(
            index,
            self.history.entries(),
            self.config.top_n,
            self.strategy.as_ref(),
        )?;
        let mut submitted = 0;
        match &estimate {
            Some(target) => {
                let candidates = index.nearest_neighbors(
                    target,
                    self.config.reconstruction_fanout,
                    self.history.tried(),
                )?;
                debug!(round, candidates = candidates.len(), "reconstruction candidates");
                for candidate in candidates {
                    submitted += 1;
                    if let Step::Stop(t) = self.submit(candidate.word, PhaseKind::Reconstructing)? {
                        return Ok(Phase::Terminated(t));
                    }
                }
            }
            None => info!(round, "no usable scores, target cannot be estimated"),
        }

        let stale = next_stale(
            stale,
            improved(before, self.history.best_score(), self.limits.min_improvement),
        );
        self.close_round(PhaseKind::Reconstructing, round, submitted);
        Ok(after_reconstruction(
            &self.limits,
            round,
            stale,
            estimate.is_some(),
            submitted,
        ))
    }

    fn iterate(&mut self, round: usize, stale: usize) -> Result<Phase, SolverError> {
        let index = self.index;
        let round = round + 1;
        let before = self.history.best_score();

        let mut pivot = None;
        for tried in self.history.ranked() {
            match index.vector_of(&tried.word) {
                Ok(vector) => {
                    pivot = Some((tried.word.clone(), vector));
                    break;
                }
                Err(err) if err.is_recoverable() => {
                    debug!(word = %tried.word, "pivot candidate has no vector")
                }
                Err(err) => return Err(err),
            }
        }
        let Some((pivot_word, pivot_vector)) = pivot else {
            return Ok(after_iteration(&self.limits, round, stale, false, 0));
        };

        let candidates =
            index.nearest_neighbors(pivot_vector, self.config.iteration_fanout, self.history.tried())?;
        debug!(round, pivot = %pivot_word, candidates = candidates.len(), "iteration candidates");
        let mut submitted = 0;
        for candidate in candidates {
            submitted += 1;
            if let Step::Stop(t) = self.submit(candidate.word, PhaseKind::Iterating)? {
                return Ok(Phase::Terminated(t));
            }
        }

        let after = self.history.best_score();
        let stale = next_stale(stale, improved(before, after, self.limits.min_improvement));
        if let Some(best) = self.history.best() {
            if best.word != pivot_word {
                info!(round, from = %pivot_word, to = %best.word, score = ?after, "pivot moved");
            }
        }
        self.close_round(PhaseKind::Iterating, round, submitted);
        Ok(after_iteration(&self.limits, round, stale, true, submitted))
    }

    fn finish(self) -> SolveResult {
        let best = self.history.best().map(|t| t.word.clone());
        let outcome = match &self.phase {
            Phase::Terminated(Termination::Found(word)) => Outcome::Found { word: word.clone() },
            Phase::Terminated(Termination::Exhausted(reason)) => Outcome::Exhausted {
                best,
                reason: *reason,
            },
            other => {
                warn!(phase = ?other, "finished outside a terminal phase");
                Outcome::Exhausted {
                    best,
                    reason: ExhaustReason::AttemptBudget,
                }
            }
        };

        let history = self.history.into_entries();
        let mut stats = self.stats;
        stats.attempts = history.len();
        stats.scored = history.iter().filter(|t| t.score().is_some()).count();
        stats.unknown = history
            .iter()
            .filter(|t| matches!(t.feedback, Feedback::Unknown))
            .count();

        match &outcome {
            Outcome::Found { word } => info!(word = %word, attempts = stats.attempts, "target found"),
            Outcome::Exhausted { best, reason } => {
                info!(best = ?best, reason = %reason, attempts = stats.attempts, "search exhausted")
            }
        }

        SolveResult {
            outcome,
            history,
            stats,
            index_fingerprint: self.index.fingerprint().to_string(),
        }
    }
}

/// Run a fresh solver over `index` against `oracle`.
pub fn solve<O: GuessOracle>(
    oracle: O,
    index: &EmbeddingIndex,
    config: &SolverConfig,
) -> Result<SolveResult, SolverError> {
    SolverEngine::new(index, oracle, config.clone())?.run()
}
