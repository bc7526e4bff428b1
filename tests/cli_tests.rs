use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const PETS: &str = "5 3\n\
chat 1.0 0.2 0.0\n\
chien 0.9 0.5 0.0\n\
animal 0.8 0.6 0.1\n\
table 0.0 0.1 1.0\n\
chaise 0.1 0.0 0.9\n";

fn sonde(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sonde"))
        .args(args)
        .output()
        .expect("failed to run sonde")
}

fn pets_model(dir: &Path) -> PathBuf {
    let path = dir.join("pets.txt");
    fs::write(&path, PETS).unwrap();
    path
}

#[test]
fn simulate_prints_a_json_result() {
    let dir = tempfile::tempdir().unwrap();
    let model = pets_model(dir.path());
    let csv = dir.path().join("history.csv");

    let out = sonde(&[
        "simulate",
        "--model",
        model.to_str().unwrap(),
        "--target",
        "chien",
        "--seeds",
        "chat",
        "--json",
        "--quiet",
        "--history-csv",
        csv.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let result: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(result["outcome"]["status"], "found");
    assert_eq!(result["outcome"]["word"], "chien");
    assert_eq!(result["history"].as_array().unwrap().len(), 2);

    let rows = fs::read_to_string(&csv).unwrap();
    assert_eq!(rows.lines().count(), 3);
    assert!(rows.lines().last().unwrap().starts_with("2,chien,exact"));
}

#[test]
fn neighbors_lists_closest_words_first() {
    let dir = tempfile::tempdir().unwrap();
    let model = pets_model(dir.path());
    let out = sonde(&["neighbors", "--model", model.to_str().unwrap(), "chat", "-k", "2"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let words: Vec<&str> = stdout.lines().map(|l| l.split('\t').next().unwrap()).collect();
    assert_eq!(words, vec!["chien", "animal"]);
}

#[test]
fn cache_round_trip_keeps_answers() {
    let dir = tempfile::tempdir().unwrap();
    let model = pets_model(dir.path());
    let cache = dir.path().join("pets.idx");

    let out = sonde(&["cache", "--model", model.to_str().unwrap(), cache.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Cached 5 words (3 dimensions)"));

    let from_text = sonde(&["neighbors", "--model", model.to_str().unwrap(), "table"]);
    let from_cache = sonde(&["neighbors", "--model", cache.to_str().unwrap(), "table"]);
    assert_eq!(from_text.stdout, from_cache.stdout);
}

#[test]
fn hints_json_has_three_levels() {
    let dir = tempfile::tempdir().unwrap();
    let model = pets_model(dir.path());
    let out = sonde(&["hints", "--model", model.to_str().unwrap(), "chat", "--json"]);
    assert!(out.status.success());
    let hints: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    for level in ["level1", "level2", "level3"] {
        assert!(hints[level].is_array(), "{level} missing");
    }
}

#[test]
fn corrupt_model_reports_a_hint() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("broken.bin");
    fs::write(&model, b"not a header\n").unwrap();

    let out = sonde(&["neighbors", "--model", model.to_str().unwrap(), "chat"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Verify the embedding file is intact"), "{stderr}");
}

#[test]
fn unknown_target_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let model = pets_model(dir.path());
    let out = sonde(&["simulate", "--model", model.to_str().unwrap(), "--target", "licorne"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("'licorne' is not in the embedding vocabulary"));
}

#[test]
fn play_reads_answers_and_saves_history() {
    let dir = tempfile::tempdir().unwrap();
    let model = pets_model(dir.path());
    let saved = dir.path().join("run.json");

    let mut child = Command::new(env!("CARGO_BIN_EXE_sonde"))
        .args([
            "play",
            "--model",
            model.to_str().unwrap(),
            "--seeds",
            "chat",
            "--quiet",
            "--save",
            saved.to_str().unwrap(),
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"0.95 990\n!\n").unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Found 'chien' in 2 attempts"));

    let run: serde_json::Value = serde_json::from_str(&fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(run["history"][0]["word"], "chat");
    assert_eq!(run["history"][1]["feedback"]["kind"], "exact");
}

fn play_with_input(model: &Path, saved: &Path, resume: bool, input: &[u8]) -> Output {
    let mut args = vec![
        "play",
        "--model",
        model.to_str().unwrap(),
        "--seeds",
        "chat",
        "--quiet",
        "--save",
        saved.to_str().unwrap(),
    ];
    if resume {
        args.extend(["--resume", saved.to_str().unwrap()]);
    }
    let mut child = Command::new(env!("CARGO_BIN_EXE_sonde"))
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(input).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn aborted_play_can_be_resumed_from_its_save() {
    let dir = tempfile::tempdir().unwrap();
    let model = pets_model(dir.path());
    let saved = dir.path().join("run.json");

    let out = play_with_input(&model, &saved, false, b"0.95 990\n");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("History saved to"));
    let run: serde_json::Value = serde_json::from_str(&fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(run["history"].as_array().unwrap().len(), 1);

    let out = play_with_input(&model, &saved, true, b"!\n");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Found 'chien' in 2 attempts"));
    let run: serde_json::Value = serde_json::from_str(&fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(run["history"].as_array().unwrap().len(), 2);
    let leftovers = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 2, "temporary files left behind");
}
