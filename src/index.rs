//! Immutable word embedding index.
//!
//! The index is built once from a vocabulary-to-vector source and shared by
//! reference between solver runs. Nothing mutates it after construction, so
//! any number of runs may read it concurrently.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::normalize::{fold_key, normalize};
use crate::SolverError;

/// A vocabulary word returned by a neighbour query.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub word: String,
    pub similarity: f32,
}

/// Cosine similarity between two vectors.
///
/// Zero vectors have similarity `0.0` with everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SolverError> {
    if a.len() != b.len() {
        return Err(SolverError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        Ok(0.0)
    } else {
        Ok(dot / denom)
    }
}

/// Descending similarity, then ascending word.
pub(crate) fn neighbor_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.word.cmp(&b.word))
}

/// On-disk form of the index; the lookup table is rebuilt on load.
#[derive(Serialize, Deserialize)]
pub(crate) struct StoredIndex {
    pub words: Vec<String>,
    pub dimension: usize,
    pub vectors: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    words: Vec<String>,
    dimension: usize,
    /// Row-major, `words.len() * dimension` values.
    vectors: Vec<f32>,
    norms: Vec<f32>,
    lookup: HashMap<String, usize>,
    fingerprint: String,
}

impl EmbeddingIndex {
    /// Build an index from `(word, vector)` pairs.
    ///
    /// Words are normalized; entries whose folded key is already present are
    /// skipped so the first surface form wins. Every vector must share the
    /// dimension of the first one.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, SolverError>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: AsRef<str>,
    {
        let mut words = Vec::new();
        let mut vectors = Vec::new();
        let mut lookup = HashMap::new();
        let mut dimension = None;

        for (raw, vector) in entries {
            let word = normalize(raw.as_ref());
            if word.is_empty() {
                continue;
            }
            let expected = *dimension.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(SolverError::DimensionMismatch {
                    expected,
                    found: vector.len(),
                });
            }
            if let Some(bad) = vector.iter().find(|x| !x.is_finite()) {
                return Err(SolverError::Load(format!("{word}: non-finite component {bad}")));
            }
            let key = fold_key(&word);
            if lookup.contains_key(&key) {
                tracing::debug!(word = %word, "duplicate vocabulary key skipped");
                continue;
            }
            lookup.insert(key, words.len());
            words.push(word);
            vectors.extend_from_slice(&vector);
        }

        let dimension = dimension.unwrap_or(0);
        if dimension == 0 && !words.is_empty() {
            return Err(SolverError::Load("vectors have zero dimensions".into()));
        }
        Ok(Self::assemble(words, dimension, vectors, lookup))
    }

    fn assemble(
        words: Vec<String>,
        dimension: usize,
        vectors: Vec<f32>,
        lookup: HashMap<String, usize>,
    ) -> Self {
        let norms = if dimension == 0 {
            Vec::new()
        } else {
            vectors
                .chunks_exact(dimension)
                .map(|row| row.iter().map(|x| x * x).sum::<f32>().sqrt())
                .collect()
        };

        let mut hasher = Sha256::new();
        hasher.update((dimension as u64).to_le_bytes());
        for (i, word) in words.iter().enumerate() {
            hasher.update(word.as_bytes());
            hasher.update([0u8]);
            hasher.update(bytemuck::cast_slice::<f32, u8>(
                &vectors[i * dimension..(i + 1) * dimension],
            ));
        }
        let fingerprint = hex::encode(hasher.finalize());

        Self {
            words,
            dimension,
            vectors,
            norms,
            lookup,
            fingerprint,
        }
    }

    pub(crate) fn to_stored(&self) -> StoredIndex {
        StoredIndex {
            words: self.words.clone(),
            dimension: self.dimension,
            vectors: self.vectors.clone(),
        }
    }

    pub(crate) fn from_stored(stored: StoredIndex) -> Result<Self, SolverError> {
        if stored.dimension == 0 && !stored.words.is_empty() {
            return Err(SolverError::Load("cache vectors have zero dimensions".into()));
        }
        let expected = stored.words.len().checked_mul(stored.dimension);
        if expected != Some(stored.vectors.len()) {
            return Err(SolverError::Load(format!(
                "cache holds {} values for {} words of dimension {}",
                stored.vectors.len(),
                stored.words.len(),
                stored.dimension
            )));
        }
        if let Some(i) = stored.vectors.iter().position(|x| !x.is_finite()) {
            return Err(SolverError::Load(format!(
                "{}: non-finite component in cache",
                stored.words[i / stored.dimension]
            )));
        }
        let mut lookup = HashMap::with_capacity(stored.words.len());
        for (i, word) in stored.words.iter().enumerate() {
            lookup.entry(fold_key(word)).or_insert(i);
        }
        Ok(Self::assemble(
            stored.words,
            stored.dimension,
            stored.vectors,
            lookup,
        ))
    }

    /// Number of vocabulary words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Dimensionality shared by every vector.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Hex SHA-256 over the ordered vocabulary and vectors.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Vocabulary in load order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    fn position(&self, word: &str) -> Option<usize> {
        self.lookup.get(&fold_key(word)).copied()
    }

    /// Canonical vocabulary spelling of `word`, if known.
    pub fn canonical(&self, word: &str) -> Option<&str> {
        self.position(word).map(|i| self.words[i].as_str())
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.vectors[i * self.dimension..(i + 1) * self.dimension]
    }

    /// Vector of `word` after normalization and diacritic folding.
    pub fn vector_of(&self, word: &str) -> Result<&[f32], SolverError> {
        self.position(word)
            .map(|i| self.row(i))
            .ok_or_else(|| SolverError::NotFound(normalize(word)))
    }

    /// Cosine similarity between two vectors of this index's space.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> Result<f32, SolverError> {
        cosine_similarity(a, b)
    }

    /// The `k` words most similar to `query`, skipping `exclude`.
    ///
    /// Ordered by descending similarity; equal similarities are ordered by
    /// word so repeated queries are reproducible.
    pub fn nearest_neighbors(
        &self,
        query: &[f32],
        k: usize,
        exclude: &HashSet<String>,
    ) -> Result<Vec<Neighbor>, SolverError> {
        if query.len() != self.dimension {
            return Err(SolverError::DimensionMismatch {
                expected: self.dimension,
                found: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_norm = query.iter().map(|x| x * x).sum::<f32>().sqrt();
        let mut scored: Vec<Neighbor> = self
            .words
            .iter()
            .enumerate()
            .filter(|(_, word)| !exclude.contains(word.as_str()))
            .map(|(i, word)| {
                let denom = query_norm * self.norms[i];
                let similarity = if denom < f32::EPSILON {
                    0.0
                } else {
                    let dot: f32 = self.row(i).iter().zip(query).map(|(x, y)| x * y).sum();
                    dot / denom
                };
                Neighbor {
                    word: word.clone(),
                    similarity,
                }
            })
            .collect();

        if scored.len() > k {
            scored.select_nth_unstable_by(k - 1, neighbor_order);
            scored.truncate(k);
        }
        scored.sort_by(neighbor_order);
        Ok(scored)
    }

    /// Nearest neighbours of a vocabulary word, the word itself excluded.
    pub fn neighbors_of_word(&self, word: &str, k: usize) -> Result<Vec<Neighbor>, SolverError> {
        let i = self
            .position(word)
            .ok_or_else(|| SolverError::NotFound(normalize(word)))?;
        let mut exclude = HashSet::new();
        exclude.insert(self.words[i].clone());
        self.nearest_neighbors(self.row(i), k, &exclude)
    }
}
