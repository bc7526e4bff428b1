mod common;

use std::collections::HashSet;

use common::{random_index, small_config};
use proptest::prelude::*;
use sonde::{PhaseKind, SimulatedOracle, SolverConfig, SolverEngine};

const SEEDS: [&str; 4] = ["w003", "w041", "w077", "w102"];

proptest! {
    #![proptest_config(ProptestConfig { cases: 12, .. ProptestConfig::default() })]
    #[test]
    fn history_is_unique_and_within_budget(seed in any::<u64>(),
                                           target in 0usize..150,
                                           max in 5usize..60) {
        let index = random_index(seed, 150, 8);
        let target = format!("w{target:03}");
        let mut oracle = SimulatedOracle::new(&index, &target).unwrap();
        let result = SolverEngine::new(&index, &mut oracle, small_config(&SEEDS, max))
            .unwrap()
            .run()
            .unwrap();

        prop_assert!(result.attempts() <= max);
        let distinct: HashSet<&str> = result.history.iter().map(|t| t.word.as_str()).collect();
        prop_assert_eq!(distinct.len(), result.history.len());
        prop_assert_eq!(oracle.submissions().len(), result.history.len());
        for (i, tried) in result.history.iter().enumerate() {
            prop_assert_eq!(tried.attempt, i + 1);
        }
    }

    #[test]
    fn exact_match_ends_the_run_on_the_last_submission(seed in any::<u64>(), target in 0usize..150) {
        let index = random_index(seed, 150, 8);
        let target = format!("w{target:03}");
        let mut oracle = SimulatedOracle::new(&index, &target).unwrap();
        let result = SolverEngine::new(&index, &mut oracle, small_config(&SEEDS, 150))
            .unwrap()
            .run()
            .unwrap();

        let exact: Vec<_> = result.history.iter().filter(|t| t.is_exact()).collect();
        prop_assert!(exact.len() <= 1);
        if let Some(hit) = exact.first() {
            prop_assert_eq!(result.found_word(), Some(target.as_str()));
            prop_assert_eq!(hit.attempt, result.attempts());
            prop_assert_eq!(oracle.submissions().len(), result.attempts());
        } else {
            prop_assert!(!result.is_found());
        }
    }

    #[test]
    fn identical_inputs_give_identical_runs(seed in any::<u64>(), target in 0usize..150) {
        let index = random_index(seed, 150, 8);
        let target = format!("w{target:03}");
        let run = || {
            let oracle = SimulatedOracle::new(&index, &target).unwrap();
            SolverEngine::new(&index, oracle, small_config(&SEEDS, 40)).unwrap().run().unwrap()
        };
        let first = run();
        let second = run();
        prop_assert_eq!(&first, &second);
        let a = serde_json::to_string(&first.history).unwrap();
        let b = serde_json::to_string(&second.history).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn best_score_never_decreases(seed in any::<u64>(), target in 0usize..150) {
        let index = random_index(seed, 150, 8);
        let target = format!("w{target:03}");
        let oracle = SimulatedOracle::new(&index, &target).unwrap();
        let result = SolverEngine::new(&index, oracle, small_config(&SEEDS, 80))
            .unwrap()
            .run()
            .unwrap();

        let mut last = f64::NEG_INFINITY;
        for round in &result.stats.rounds {
            let best = round.best_score.unwrap_or(f64::NEG_INFINITY);
            prop_assert!(best >= last, "round {:?} dropped to {}", round, best);
            last = best;
        }
        let iterating: Vec<_> = result
            .stats
            .rounds
            .iter()
            .filter(|r| r.phase == PhaseKind::Iterating)
            .collect();
        prop_assert_eq!(iterating.len(), result.stats.iteration_rounds);
    }
}

#[test]
fn solver_finds_most_targets_in_a_random_space() {
    let index = random_index(7, 150, 8);
    let mut found = 0;
    for t in (0..150).step_by(15) {
        let target = format!("w{t:03}");
        let oracle = SimulatedOracle::new(&index, &target).unwrap();
        let config = SolverConfig {
            reconstruction_rounds: 10,
            no_improvement_rounds: 5,
            ..small_config(&SEEDS, 150)
        };
        let result = SolverEngine::new(&index, oracle, config).unwrap().run().unwrap();
        if result.is_found() {
            assert!(result.attempts() <= 75, "{target} took {} attempts", result.attempts());
            found += 1;
        }
    }
    assert!(found >= 8, "only {found} of 10 targets found");
}
