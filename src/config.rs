use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io_utils::io_error;
use crate::weighting::WeightingKind;
use crate::SolverError;

/// Frequent, semantically central French words submitted at the start of
/// every run.
pub const DEFAULT_SEEDS: &[&str] = &[
    "vie", "mort", "amour", "temps", "monde", "homme", "femme", "enfant",
    "travail", "argent", "guerre", "paix", "liberté", "nature", "corps",
    "science", "art", "politique", "société", "histoire", "joie", "peur",
    "rouge", "grand", "vieux", "chien", "arbre", "montagne", "mer", "ville",
    "roi", "dieu", "soleil", "rêve", "silence",
];

/// Runtime parameters of a solver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Words submitted unconditionally before any reconstruction.
    pub seeds: Vec<String>,
    /// Hard ceiling on oracle submissions, resumed attempts included.
    pub max_total_attempts: usize,
    /// Upper bound on reconstruction rounds.
    pub reconstruction_rounds: usize,
    /// Consecutive rounds without improvement that end a phase.
    pub no_improvement_rounds: usize,
    /// Number of best scored attempts combined into the target estimate.
    pub top_n: usize,
    /// Candidates submitted per reconstruction round.
    pub reconstruction_fanout: usize,
    /// Candidates submitted per iteration round.
    pub iteration_fanout: usize,
    /// Margin, in oracle units, a new best score must clear to count as an
    /// improvement.
    pub min_improvement: f64,
    pub weighting: WeightingKind,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seeds: DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect(),
            max_total_attempts: 1000,
            reconstruction_rounds: 20,
            no_improvement_rounds: 3,
            top_n: 20,
            reconstruction_fanout: 10,
            iteration_fanout: 5,
            min_improvement: 0.0,
            weighting: WeightingKind::Rank,
        }
    }
}

impl SolverConfig {
    /// Read a JSON config; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, SolverError> {
        let text = std::fs::read_to_string(path).map_err(|e| io_error("reading config", path, e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| SolverError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SolverError> {
        let positive = [
            ("max_total_attempts", self.max_total_attempts),
            ("no_improvement_rounds", self.no_improvement_rounds),
            ("top_n", self.top_n),
            ("reconstruction_fanout", self.reconstruction_fanout),
            ("iteration_fanout", self.iteration_fanout),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(SolverError::Config(format!("{name} must be at least 1")));
            }
        }
        if self.seeds.iter().all(|s| s.trim().is_empty()) {
            return Err(SolverError::Config("seed list is empty".into()));
        }
        if !self.min_improvement.is_finite() || self.min_improvement < 0.0 {
            return Err(SolverError::Config(format!(
                "min_improvement must be a non-negative number, got {}",
                self.min_improvement
            )));
        }
        if let WeightingKind::MinMax { floor } = self.weighting {
            if !(0.0..=1.0).contains(&floor) {
                return Err(SolverError::Config(format!(
                    "min_max floor must lie in [0, 1], got {floor}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SolverConfig::default();
        config.validate().unwrap();
        assert_eq!(config.seeds.len(), 35);
    }

    #[test]
    fn zero_fanout_is_rejected() {
        let config = SolverConfig { iteration_fanout: 0, ..SolverConfig::default() };
        assert!(matches!(config.validate(), Err(SolverError::Config(msg)) if msg.contains("iteration_fanout")));
    }

    #[test]
    fn empty_seed_list_is_rejected() {
        let config = SolverConfig { seeds: vec![" ".into()], ..SolverConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solver.json");
        std::fs::write(
            &path,
            r#"{"seeds": ["chat"], "max_total_attempts": 10, "weighting": {"kind": "min_max", "floor": 0.2}}"#,
        )
        .unwrap();
        let config = SolverConfig::from_json_file(&path).unwrap();
        assert_eq!(config.seeds, vec!["chat".to_string()]);
        assert_eq!(config.max_total_attempts, 10);
        assert_eq!(config.top_n, 20);
        assert_eq!(config.weighting, WeightingKind::MinMax { floor: 0.2 });
    }
}
