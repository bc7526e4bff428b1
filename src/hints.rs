//! Progressive hints for a solved word.

use serde::{Deserialize, Serialize};

use crate::index::EmbeddingIndex;
use crate::oracle::PERCENTILE_SCALE;
use crate::SolverError;

const HINTS_PER_LEVEL: usize = 3;

/// Neighbour words grouped by closeness to the answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hints {
    /// Percentile 200–400.
    pub level1: Vec<String>,
    /// Percentile 500–700.
    pub level2: Vec<String>,
    /// Percentile 800–950.
    pub level3: Vec<String>,
}

/// Rank `word`'s 999 nearest neighbours as percentiles and pick evenly
/// spaced words in each band.
pub fn select_hints(index: &EmbeddingIndex, word: &str) -> Result<Hints, SolverError> {
    let neighbors = index.neighbors_of_word(word, (PERCENTILE_SCALE - 1) as usize)?;
    // ascending percentile, like the provider's nearby list
    let ranked: Vec<(u16, String)> = neighbors
        .into_iter()
        .enumerate()
        .map(|(rank, n)| (PERCENTILE_SCALE - 1 - rank as u16, n.word))
        .rev()
        .collect();

    Ok(Hints {
        level1: pick(&ranked, 200, 400),
        level2: pick(&ranked, 500, 700),
        level3: pick(&ranked, 800, 950),
    })
}

fn pick(ranked: &[(u16, String)], lo: u16, hi: u16) -> Vec<String> {
    let band: Vec<&String> = ranked
        .iter()
        .filter(|(p, _)| (lo..=hi).contains(p))
        .map(|(_, w)| w)
        .collect();
    if band.len() <= HINTS_PER_LEVEL {
        return band.into_iter().cloned().collect();
    }
    let step = band.len() / HINTS_PER_LEVEL;
    (0..HINTS_PER_LEVEL).map(|i| band[i * step].clone()).collect()
}
