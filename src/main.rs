use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

use sonde::io_utils::{io_cli_error, simple_cli_error, solver_cli_error, CliError};
use sonde::{
    format_attempt, load_path, save_cache, select_hints, write_history_csv, EmbeddingIndex,
    GuessOracle, InteractiveOracle, Outcome, PhaseKind, ScoreScale, SimulatedOracle,
    SolveObserver, SolveResult, SolverConfig, SolverEngine, TriedWord,
};

/// Find a hidden word from similarity feedback using word embeddings.
#[derive(Parser)]
#[command(name = "sonde", version)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve an offline puzzle whose answer is known.
    Simulate {
        #[command(flatten)]
        model: ModelArgs,
        /// Hidden word the simulated oracle scores against
        #[arg(long)]
        target: String,
        #[command(flatten)]
        solve: SolveArgs,
    },
    /// Solve a real puzzle, typing the site's answers for each guess.
    Play {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        solve: SolveArgs,
        /// Continue from a history saved with --save
        #[arg(long)]
        resume: Option<PathBuf>,
        /// Save the history, even when the run is aborted
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Print the nearest neighbours of a word.
    Neighbors {
        #[command(flatten)]
        model: ModelArgs,
        word: String,
        #[arg(short, default_value_t = 10)]
        k: usize,
    },
    /// Print three bands of hints for a word.
    Hints {
        #[command(flatten)]
        model: ModelArgs,
        word: String,
        #[arg(long)]
        json: bool,
    },
    /// Convert a model to the fast-loading .idx cache.
    Cache {
        #[command(flatten)]
        model: ModelArgs,
        output: PathBuf,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// Embeddings: word2vec .bin, text, or .idx cache
    #[arg(long)]
    model: PathBuf,
}

#[derive(Args)]
struct SolveArgs {
    /// JSON solver configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Comma separated seed words
    #[arg(long, value_delimiter = ',')]
    seeds: Option<Vec<String>>,
    #[arg(long)]
    max_attempts: Option<usize>,
    /// Print the full result as JSON on stdout
    #[arg(long)]
    json: bool,
    /// Export the guess history as CSV
    #[arg(long)]
    history_csv: Option<PathBuf>,
    /// Do not print the trail of attempts
    #[arg(long)]
    quiet: bool,
}

impl SolveArgs {
    fn config(&self) -> Result<SolverConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => SolverConfig::from_json_file(path)
                .map_err(|e| solver_cli_error("loading config", e))?,
            None => SolverConfig::default(),
        };
        if let Some(seeds) = &self.seeds {
            config.seeds = seeds.clone();
        }
        if let Some(max) = self.max_attempts {
            config.max_total_attempts = max;
        }
        config
            .validate()
            .map_err(|e| solver_cli_error("invalid options", e))?;
        Ok(config)
    }
}

/// History persisted between `play` sessions.
#[derive(Serialize, Deserialize)]
struct SavedRun {
    index_fingerprint: String,
    history: Vec<TriedWord>,
}

/// Prints the trail, above a progress bar when one is shown.
struct TrailObserver {
    bar: Option<ProgressBar>,
    scale: ScoreScale,
    quiet: bool,
}

impl SolveObserver for TrailObserver {
    fn on_attempt(&mut self, tried: &TriedWord, _phase: PhaseKind) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
            if let Some(score) = tried.score() {
                bar.set_message(format!("{} ({score:.3})", tried.word));
            }
        }
        if self.quiet {
            return;
        }
        let line = format_attempt(tried, self.scale);
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Simulate { model, target, solve } => {
            let index = load_model(&model.model)?;
            let config = solve.config()?;
            let oracle = SimulatedOracle::new(&index, &target)
                .map_err(|e| solver_cli_error("choosing target", e))?;
            let bar = progress_bar(config.max_total_attempts as u64);
            let engine = SolverEngine::new(&index, oracle, config)
                .map_err(|e| solver_cli_error("starting solver", e))?
                .with_observer(TrailObserver {
                    bar: Some(bar.clone()),
                    scale: ScoreScale::Cosine,
                    quiet: solve.quiet,
                });
            let result = engine.run().map_err(|e| solver_cli_error("solving", e))?;
            bar.finish_and_clear();
            report(&result, &solve)?;
        }
        Command::Play { model, solve, resume, save } => {
            let index = load_model(&model.model)?;
            let config = solve.config()?;
            let prior = match &resume {
                Some(path) => read_saved_run(path, &index)?,
                None => Vec::new(),
            };
            let stdin = io::stdin();
            let oracle = InteractiveOracle::new(stdin.lock(), io::stdout());
            let result = play(&index, oracle, config, prior, save.as_deref(), solve.quiet)?;
            if let Some(path) = &save {
                write_saved_run(path, &index, &result.history)?;
            }
            report(&result, &solve)?;
        }
        Command::Neighbors { model, word, k } => {
            let index = load_model(&model.model)?;
            let neighbors = index
                .neighbors_of_word(&word, k)
                .map_err(|e| solver_cli_error("neighbour query failed", e))?;
            for n in neighbors {
                println!("{}\t{:.4}", n.word, n.similarity);
            }
        }
        Command::Hints { model, word, json } => {
            let index = load_model(&model.model)?;
            let hints =
                select_hints(&index, &word).map_err(|e| solver_cli_error("hints failed", e))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&hints)?);
            } else {
                println!("level1: {}", hints.level1.join(", "));
                println!("level2: {}", hints.level2.join(", "));
                println!("level3: {}", hints.level3.join(", "));
            }
        }
        Command::Cache { model, output } => {
            let index = load_model(&model.model)?;
            save_cache(&index, &output).map_err(|e| solver_cli_error("writing cache", e))?;
            eprintln!(
                "Cached {} words ({} dimensions) to {}",
                index.len(),
                index.dimension(),
                output.display()
            );
        }
    }
    Ok(())
}

fn load_model(path: &Path) -> Result<EmbeddingIndex, CliError> {
    let index = load_path(path).map_err(|e| solver_cli_error("loading model", e))?;
    if index.is_empty() {
        return Err(simple_cli_error(&format!(
            "{} holds no words. Check the model file.",
            path.display()
        )));
    }
    Ok(index)
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} attempts {msg}") {
        bar.set_style(style);
    }
    bar
}

/// Step the engine by hand so the history can be saved when the oracle fails.
fn play<O: GuessOracle>(
    index: &EmbeddingIndex,
    oracle: O,
    config: SolverConfig,
    prior: Vec<TriedWord>,
    save: Option<&Path>,
    quiet: bool,
) -> Result<SolveResult, Box<dyn std::error::Error>> {
    let mut engine = SolverEngine::resume(index, oracle, config, prior)
        .map_err(|e| solver_cli_error("starting solver", e))?
        .with_observer(TrailObserver {
            bar: None,
            scale: ScoreScale::AsGiven,
            quiet,
        });
    loop {
        match engine.step() {
            Ok(phase) if phase.is_terminal() => break,
            Ok(_) => {}
            Err(e) => {
                if let Some(path) = save {
                    write_saved_run(path, index, engine.history().entries())?;
                    eprintln!("History saved to {}", path.display());
                }
                return Err(solver_cli_error("solving", e).into());
            }
        }
    }
    Ok(engine.run().map_err(|e| solver_cli_error("solving", e))?)
}

fn read_saved_run(path: &Path, index: &EmbeddingIndex) -> Result<Vec<TriedWord>, CliError> {
    let text = fs::read_to_string(path).map_err(|e| io_cli_error("reading history", path, e))?;
    let saved: SavedRun = serde_json::from_str(&text)
        .map_err(|e| simple_cli_error(&format!("{}: invalid history: {e}", path.display())))?;
    if saved.index_fingerprint != index.fingerprint() {
        return Err(simple_cli_error(&format!(
            "{} was produced with another embedding model. Use the same --model to resume.",
            path.display()
        )));
    }
    Ok(saved.history)
}

fn write_saved_run(path: &Path, index: &EmbeddingIndex, history: &[TriedWord]) -> Result<(), CliError> {
    let saved = SavedRun {
        index_fingerprint: index.fingerprint().to_string(),
        history: history.to_vec(),
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(parent).map_err(|e| io_cli_error("writing history", path, e))?;
    let mut writer = BufWriter::new(temp.as_file());
    serde_json::to_writer_pretty(&mut writer, &saved)
        .map_err(|e| simple_cli_error(&format!("writing history: {e}")))?;
    writer.flush().map_err(|e| io_cli_error("writing history", path, e))?;
    drop(writer);
    temp.persist(path)
        .map_err(|e| io_cli_error("writing history", path, e.error))?;
    Ok(())
}

fn report(result: &SolveResult, args: &SolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &args.history_csv {
        let file = File::create(path).map_err(|e| io_cli_error("writing CSV", path, e))?;
        write_history_csv(&result.history, BufWriter::new(file))
            .map_err(|e| solver_cli_error("writing CSV", e))?;
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    match &result.outcome {
        Outcome::Found { word } => println!("Found '{}' in {} attempts", word, result.attempts()),
        Outcome::Exhausted { best, reason } => {
            let best = best.as_deref().unwrap_or("-");
            println!(
                "Not found after {} attempts ({reason}). Best: '{best}'",
                result.attempts()
            );
        }
    }
    Ok(())
}
