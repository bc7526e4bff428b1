//! The guess oracle boundary and the oracles shipped with the crate.
//!
//! Network clients for a real puzzle provider live outside this crate; they
//! only need to implement [`GuessOracle`]. Retries and rate limiting belong
//! to them, the solver treats every `Err` as fatal to the run.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::error::OracleError;
use crate::index::EmbeddingIndex;
use crate::normalize::{fold_key, normalize};

/// Percentiles are reported for the target's 999 nearest neighbours.
pub const PERCENTILE_SCALE: u16 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub enum OracleResult {
    ExactMatch,
    /// `score` is only an ordering signal; its scale is the oracle's own.
    Scored { score: f64, percentile: Option<u16> },
    UnknownWord,
}

pub trait GuessOracle {
    /// Score one normalized word against the hidden target.
    fn submit(&mut self, word: &str) -> Result<OracleResult, OracleError>;
}

impl<O: GuessOracle + ?Sized> GuessOracle for &mut O {
    fn submit(&mut self, word: &str) -> Result<OracleResult, OracleError> {
        (**self).submit(word)
    }
}

impl<O: GuessOracle + ?Sized> GuessOracle for Box<O> {
    fn submit(&mut self, word: &str) -> Result<OracleResult, OracleError> {
        (**self).submit(word)
    }
}

/// Adapts a closure into an oracle.
pub struct FnOracle<F>(pub F);

impl<F> GuessOracle for FnOracle<F>
where
    F: FnMut(&str) -> Result<OracleResult, OracleError>,
{
    fn submit(&mut self, word: &str) -> Result<OracleResult, OracleError> {
        (self.0)(word)
    }
}

/// Offline puzzle over an embedding index with a known target.
///
/// Scores are cosine similarities to the target. Percentiles follow the
/// Cémantix convention: the closest neighbour is 999, the 999th is 1.
pub struct SimulatedOracle<'a> {
    index: &'a EmbeddingIndex,
    target: String,
    target_key: String,
    percentiles: HashMap<String, u16>,
    submissions: Vec<String>,
}

impl<'a> SimulatedOracle<'a> {
    pub fn new(index: &'a EmbeddingIndex, target: &str) -> Result<Self, crate::SolverError> {
        let canonical = index
            .canonical(target)
            .ok_or_else(|| crate::SolverError::NotFound(normalize(target)))?
            .to_string();
        let neighbors = index.neighbors_of_word(&canonical, (PERCENTILE_SCALE - 1) as usize)?;
        let percentiles = neighbors
            .into_iter()
            .enumerate()
            .map(|(rank, n)| (n.word, PERCENTILE_SCALE - 1 - rank as u16))
            .collect();
        Ok(Self {
            index,
            target_key: fold_key(&canonical),
            target: canonical,
            percentiles,
            submissions: Vec::new(),
        })
    }

    /// Every word submitted so far, in order.
    pub fn submissions(&self) -> &[String] {
        &self.submissions
    }
}

impl GuessOracle for SimulatedOracle<'_> {
    fn submit(&mut self, word: &str) -> Result<OracleResult, OracleError> {
        self.submissions.push(word.to_string());
        if fold_key(word) == self.target_key {
            return Ok(OracleResult::ExactMatch);
        }
        let Some(canonical) = self.index.canonical(word) else {
            return Ok(OracleResult::UnknownWord);
        };
        let score = self
            .index
            .similarity(self.index.vector_of(canonical)?, self.index.vector_of(&self.target)?)?;
        Ok(OracleResult::Scored {
            score: f64::from(score),
            percentile: self.percentiles.get(canonical).copied(),
        })
    }
}

const MAX_PROMPT_RETRIES: usize = 3;

/// Relays guesses to a human playing the real puzzle.
///
/// Answers: `!` or `=` for the exact word, `?` or an empty line when the site
/// does not know the word, otherwise `<score> [percentile]` in whatever scale
/// the site shows.
pub struct InteractiveOracle<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveOracle<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

/// Parse one answer line; `None` when it is not understood.
pub fn parse_answer(line: &str) -> Option<OracleResult> {
    let line = line.trim();
    match line {
        "!" | "=" => return Some(OracleResult::ExactMatch),
        "" | "?" => return Some(OracleResult::UnknownWord),
        _ => {}
    }
    let mut parts = line.split_whitespace();
    let score = parts
        .next()?
        .trim_end_matches("°C")
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())?;
    let percentile = match parts.next() {
        Some(p) => Some(
            p.trim_end_matches('‰')
                .parse::<u16>()
                .ok()
                .filter(|p| *p <= PERCENTILE_SCALE)?,
        ),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(OracleResult::Scored { score, percentile })
}

impl<R: BufRead, W: Write> GuessOracle for InteractiveOracle<R, W> {
    fn submit(&mut self, word: &str) -> Result<OracleResult, OracleError> {
        for _ in 0..MAX_PROMPT_RETRIES {
            write!(self.output, "{word} > ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err("input closed before an answer was given".into());
            }
            match parse_answer(&line) {
                Some(result) => return Ok(result),
                None => {
                    tracing::debug!(word, answer = %line.trim(), "unparsed answer");
                    writeln!(self.output, "  expected `!`, `?` or `<score> [percentile]`")?;
                }
            }
        }
        Err(format!("no valid answer for {word:?} after {MAX_PROMPT_RETRIES} prompts").into())
    }
}
