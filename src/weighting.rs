//! Weighting of scored attempts when estimating the target vector.
//!
//! Oracle scores are treated as ordering signals. Their scale can be raw
//! cosine similarity, degrees, or a percentile rank depending on the puzzle
//! provider, so the numeric mapping to embedding space lives entirely behind
//! [`WeightStrategy`].

use serde::{Deserialize, Serialize};

use crate::index::EmbeddingIndex;
use crate::types::{rank_order, TriedWord};
use crate::SolverError;

/// Weights below this contribute nothing to an estimate.
pub const NEGLIGIBLE_WEIGHT: f64 = 1e-9;

pub trait WeightStrategy: Send + Sync {
    /// One non-negative weight per score. `scores` is sorted descending.
    fn weights(&self, scores: &[f64]) -> Vec<f64>;
}

/// Weights from rank alone, `((n - r) / n)^2` where `r` is the rank of the
/// first entry sharing the score. Any strictly increasing transform of the
/// oracle's scores yields the same weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankWeighting;

impl WeightStrategy for RankWeighting {
    fn weights(&self, scores: &[f64]) -> Vec<f64> {
        let n = scores.len() as f64;
        let mut out = Vec::with_capacity(scores.len());
        let mut rank = 0usize;
        for (i, s) in scores.iter().enumerate() {
            if i > 0 && s.total_cmp(&scores[i - 1]).is_ne() {
                rank = i;
            }
            let w = (n - rank as f64) / n;
            out.push(w * w);
        }
        out
    }
}

/// Min-max normalized scores; invariant under positive affine rescaling.
/// Weights under `floor` are dropped. All-equal scores weigh 1 each.
#[derive(Debug, Clone, Copy)]
pub struct MinMaxWeighting {
    pub floor: f64,
}

impl WeightStrategy for MinMaxWeighting {
    fn weights(&self, scores: &[f64]) -> Vec<f64> {
        let (Some(max), Some(min)) = (scores.first(), scores.last()) else {
            return Vec::new();
        };
        let span = max - min;
        if span <= f64::EPSILON {
            return vec![1.0; scores.len()];
        }
        scores
            .iter()
            .map(|s| {
                let w = (s - min) / span;
                if w < self.floor {
                    0.0
                } else {
                    w
                }
            })
            .collect()
    }
}

/// Serializable choice of strategy for [`crate::SolverConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightingKind {
    #[default]
    Rank,
    MinMax { floor: f64 },
}

impl WeightingKind {
    pub fn build(self) -> Box<dyn WeightStrategy> {
        match self {
            WeightingKind::Rank => Box::new(RankWeighting),
            WeightingKind::MinMax { floor } => Box::new(MinMaxWeighting { floor }),
        }
    }
}

/// Weighted mean of the unit vectors of the `top_n` best scored attempts.
///
/// Unknown and exact entries are ignored, as are words missing from the
/// index. Returns `None` when nothing usable remains or every weight is
/// negligible.
pub fn estimate_target(
    index: &EmbeddingIndex,
    history: &[TriedWord],
    top_n: usize,
    strategy: &dyn WeightStrategy,
) -> Result<Option<Vec<f32>>, SolverError> {
    let mut scored: Vec<(f64, &str, &[f32])> = Vec::new();
    for tried in history {
        let Some(score) = tried.score() else {
            continue;
        };
        match index.vector_of(&tried.word) {
            Ok(vector) => scored.push((score, tried.word.as_str(), vector)),
            Err(err) if err.is_recoverable() => {
                tracing::debug!(word = %tried.word, "scored word has no vector, left out of estimate");
            }
            Err(err) => return Err(err),
        }
    }
    if scored.is_empty() {
        return Ok(None);
    }

    scored.sort_by(|a, b| rank_order(a.0, a.1, b.0, b.1));
    scored.truncate(top_n);

    let scores: Vec<f64> = scored.iter().map(|(s, _, _)| *s).collect();
    let weights = strategy.weights(&scores);
    if weights.len() != scored.len() {
        return Err(SolverError::Internal(format!(
            "weight strategy returned {} weights for {} scores",
            weights.len(),
            scored.len()
        )));
    }

    let mut estimate = vec![0f32; index.dimension()];
    let mut total = 0.0f64;
    for ((_, _, vector), w) in scored.iter().zip(&weights) {
        if !w.is_finite() || *w < NEGLIGIBLE_WEIGHT {
            continue;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < f32::EPSILON {
            continue;
        }
        let scale = (*w as f32) / norm;
        for (e, x) in estimate.iter_mut().zip(vector.iter()) {
            *e += scale * x;
        }
        total += w;
    }

    if total < NEGLIGIBLE_WEIGHT {
        return Ok(None);
    }
    let inv = (1.0 / total) as f32;
    for e in estimate.iter_mut() {
        *e *= inv;
    }
    Ok(Some(estimate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Feedback;

    fn tried(word: &str, attempt: usize, feedback: Feedback) -> TriedWord {
        TriedWord { word: word.into(), attempt, feedback }
    }

    fn scored(word: &str, attempt: usize, score: f64) -> TriedWord {
        tried(word, attempt, Feedback::Scored { score, percentile: None })
    }

    #[test]
    fn rank_weights_decay_and_share_ties() {
        let w = RankWeighting.weights(&[0.9, 0.5, 0.5, 0.1]);
        assert_eq!(w, vec![1.0, 0.5625, 0.5625, 0.0625]);
    }

    #[test]
    fn rank_weights_ignore_scale() {
        let cosine = RankWeighting.weights(&[0.42, 0.2, -0.1]);
        let percentile = RankWeighting.weights(&[990.0, 400.0, 3.0]);
        assert_eq!(cosine, percentile);
    }

    #[test]
    fn min_max_drops_under_floor() {
        let w = MinMaxWeighting { floor: 0.3 }.weights(&[10.0, 6.0, 2.0, 0.0]);
        assert_eq!(w, vec![1.0, 0.6, 0.0, 0.0]);
        assert_eq!(MinMaxWeighting { floor: 0.3 }.weights(&[5.0, 5.0]), vec![1.0, 1.0]);
    }

    #[test]
    fn empty_history_gives_no_estimate() {
        let index = EmbeddingIndex::from_entries(vec![("a", vec![1.0, 0.0])]).unwrap();
        assert_eq!(estimate_target(&index, &[], 5, &RankWeighting).unwrap(), None);
    }

    #[test]
    fn unknown_and_out_of_vocabulary_words_are_ignored() {
        let index = EmbeddingIndex::from_entries(vec![("a", vec![1.0, 0.0])]).unwrap();
        let history = vec![
            tried("a", 1, Feedback::Unknown),
            scored("zzz", 2, 0.8),
        ];
        assert_eq!(estimate_target(&index, &history, 5, &RankWeighting).unwrap(), None);
    }

    #[test]
    fn estimate_leans_toward_best_scores() {
        let index = EmbeddingIndex::from_entries(vec![
            ("nord", vec![0.0, 2.0]),
            ("est", vec![3.0, 0.0]),
        ])
        .unwrap();
        let history = vec![scored("est", 1, 0.1), scored("nord", 2, 0.7)];
        let estimate = estimate_target(&index, &history, 5, &RankWeighting)
            .unwrap()
            .unwrap();
        assert!(estimate[1] > estimate[0]);
    }

    #[test]
    fn top_n_limits_contributors() {
        let index = EmbeddingIndex::from_entries(vec![
            ("nord", vec![0.0, 1.0]),
            ("est", vec![1.0, 0.0]),
        ])
        .unwrap();
        let history = vec![scored("est", 1, 0.1), scored("nord", 2, 0.7)];
        let estimate = estimate_target(&index, &history, 1, &RankWeighting)
            .unwrap()
            .unwrap();
        assert_eq!(estimate, vec![0.0, 1.0]);
    }
}
