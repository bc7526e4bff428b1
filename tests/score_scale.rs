mod common;

use std::collections::HashMap;

use common::{random_index, small_config};
use sonde::{
    EmbeddingIndex, FnOracle, GuessOracle, OracleError, OracleResult, SimulatedOracle, SolveResult,
    SolverEngine,
};

const SEEDS: [&str; 5] = ["w010", "w020", "w030", "w040", "w050"];

fn run_with<F>(index: &EmbeddingIndex, target: &str, transform: F) -> SolveResult
where
    F: Fn(&str, f64) -> f64,
{
    let mut inner = SimulatedOracle::new(index, target).unwrap();
    let oracle = FnOracle(|word: &str| -> Result<OracleResult, OracleError> {
        Ok(match inner.submit(word)? {
            OracleResult::Scored { score, percentile } => OracleResult::Scored {
                score: transform(word, score),
                percentile,
            },
            other => other,
        })
    });
    SolverEngine::new(index, oracle, small_config(&SEEDS, 60))
        .unwrap()
        .run()
        .unwrap()
}

fn words(result: &SolveResult) -> Vec<&str> {
    result.history.iter().map(|t| t.word.as_str()).collect()
}

#[test]
fn monotone_rescaling_leaves_the_guess_sequence_unchanged() {
    for (seed, target) in [(1u64, "w005"), (2, "w077"), (3, "w123")] {
        let index = random_index(seed, 160, 12);
        let cosine = run_with(&index, target, |_, s| s);
        let affine = run_with(&index, target, |_, s| 40.0 * s - 7.0);
        let exponential = run_with(&index, target, |_, s| (3.0 * s).exp());

        assert_eq!(words(&cosine), words(&affine), "seed {seed}");
        assert_eq!(words(&cosine), words(&exponential), "seed {seed}");
        assert_eq!(cosine.outcome, affine.outcome);
        assert_eq!(cosine.outcome, exponential.outcome);
    }
}

#[test]
fn rank_scores_behave_like_raw_similarities() {
    let index = random_index(11, 160, 12);
    let target = "w042";
    let ranks: HashMap<String, f64> = index
        .neighbors_of_word(target, index.len())
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(rank, n)| (n.word, (index.len() - rank) as f64))
        .collect();

    let cosine = run_with(&index, target, |_, s| s);
    let ranked = run_with(&index, target, |word, _| ranks[word]);
    assert_eq!(words(&cosine), words(&ranked));
    assert_eq!(cosine.outcome, ranked.outcome);
}
