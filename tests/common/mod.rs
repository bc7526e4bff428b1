#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sonde::{EmbeddingIndex, SolverConfig};

/// Random vocabulary `w000..` of unit-ish vectors drawn from a seeded RNG.
pub fn random_index(seed: u64, words: usize, dim: usize) -> EmbeddingIndex {
    let mut rng = StdRng::seed_from_u64(seed);
    let entries: Vec<(String, Vec<f32>)> = (0..words)
        .map(|i| {
            let v: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
            (format!("w{i:03}"), v)
        })
        .collect();
    EmbeddingIndex::from_entries(entries).unwrap()
}

pub fn small_config(seeds: &[&str], max_total_attempts: usize) -> SolverConfig {
    SolverConfig {
        seeds: seeds.iter().map(|s| s.to_string()).collect(),
        max_total_attempts,
        reconstruction_rounds: 4,
        no_improvement_rounds: 2,
        top_n: 8,
        reconstruction_fanout: 4,
        iteration_fanout: 3,
        ..SolverConfig::default()
    }
}

/// The five-word French vocabulary used by the scenario tests.
pub fn pets_index() -> EmbeddingIndex {
    EmbeddingIndex::from_entries(vec![
        ("chat", vec![1.0, 0.2, 0.0]),
        ("chien", vec![0.9, 0.5, 0.0]),
        ("animal", vec![0.8, 0.6, 0.1]),
        ("table", vec![0.0, 0.1, 1.0]),
        ("chaise", vec![0.1, 0.0, 0.9]),
    ])
    .unwrap()
}
