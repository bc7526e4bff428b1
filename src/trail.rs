//! Human readable hint trail and CSV export of a run's history.

use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::types::{Feedback, TriedWord};
use crate::SolverError;

/// How warm an attempt was, in the puzzle site's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temperature {
    Found,
    /// Percentile 999 and above.
    Scorching,
    /// Percentile 990 and above.
    Burning,
    /// Percentile 900 and above.
    Hot,
    Warm,
    Cold,
    Freezing,
    Unknown,
}

impl Temperature {
    pub fn of(tried: &TriedWord) -> Self {
        match tried.feedback {
            Feedback::Exact => Temperature::Found,
            Feedback::Unknown => Temperature::Unknown,
            Feedback::Scored { score, percentile } => match percentile {
                Some(p) if p >= 999 => Temperature::Scorching,
                Some(p) if p >= 990 => Temperature::Burning,
                Some(p) if p >= 900 => Temperature::Hot,
                _ if score > 0.0 => Temperature::Warm,
                _ if score == 0.0 => Temperature::Cold,
                _ => Temperature::Freezing,
            },
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Temperature::Found => "🥳",
            Temperature::Scorching => "😱",
            Temperature::Burning => "🔥",
            Temperature::Hot => "🥵",
            Temperature::Warm => "😎",
            Temperature::Cold => "🥶",
            Temperature::Freezing => "🧊",
            Temperature::Unknown => "❓",
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}

/// How the oracle's scores relate to what the puzzle site shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreScale {
    /// Raw cosine similarity, shown as degrees (score × 100).
    Cosine,
    /// Already in the site's own units; shown as given.
    AsGiven,
}

/// One trail line, e.g. `#  7  montagne   42.00°C   950‰  🥵`.
pub fn format_attempt(tried: &TriedWord, scale: ScoreScale) -> String {
    let temperature = Temperature::of(tried);
    let score = match tried.feedback {
        Feedback::Exact => "found".to_string(),
        Feedback::Unknown => "unknown".to_string(),
        Feedback::Scored { score, .. } => match scale {
            ScoreScale::Cosine => format!("{:.2}°C", score * 100.0),
            ScoreScale::AsGiven => format!("{score:.2}"),
        },
    };
    let percentile = match (&tried.feedback, tried.percentile()) {
        (Feedback::Scored { .. }, Some(p)) => format!("{p:>4}‰"),
        _ => "     ".to_string(),
    };
    format!(
        "#{:>3}  {:<24} {:>9}  {}  {}",
        tried.attempt, tried.word, score, percentile, temperature
    )
}

#[derive(Serialize)]
struct CsvRow<'a> {
    attempt: usize,
    word: &'a str,
    outcome: &'static str,
    score: Option<f64>,
    percentile: Option<u16>,
}

/// Write the history as CSV with a header row.
pub fn write_history_csv<W: Write>(history: &[TriedWord], writer: W) -> Result<(), SolverError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for tried in history {
        let outcome = match tried.feedback {
            Feedback::Exact => "exact",
            Feedback::Scored { .. } => "scored",
            Feedback::Unknown => "unknown",
        };
        wtr.serialize(CsvRow {
            attempt: tried.attempt,
            word: &tried.word,
            outcome,
            score: tried.score(),
            percentile: tried.percentile(),
        })
        .map_err(|e| SolverError::Serialization(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tried(word: &str, attempt: usize, feedback: Feedback) -> TriedWord {
        TriedWord { word: word.into(), attempt, feedback }
    }

    #[test]
    fn temperatures_follow_percentile_then_sign() {
        let s = |score, percentile| tried("x", 1, Feedback::Scored { score, percentile });
        assert_eq!(Temperature::of(&s(0.6, Some(999))), Temperature::Scorching);
        assert_eq!(Temperature::of(&s(0.5, Some(995))), Temperature::Burning);
        assert_eq!(Temperature::of(&s(0.4, Some(901))), Temperature::Hot);
        assert_eq!(Temperature::of(&s(0.1, Some(10))), Temperature::Warm);
        assert_eq!(Temperature::of(&s(0.0, None)), Temperature::Cold);
        assert_eq!(Temperature::of(&s(-0.2, None)), Temperature::Freezing);
        assert_eq!(Temperature::of(&tried("x", 1, Feedback::Exact)), Temperature::Found);
    }

    #[test]
    fn attempt_line_shows_degrees_and_percentile() {
        let line = format_attempt(
            &tried("montagne", 7, Feedback::Scored { score: 0.42, percentile: Some(950) }),
            ScoreScale::Cosine,
        );
        assert!(line.starts_with("#  7  montagne"), "{line}");
        assert!(line.contains("42.00°C"), "{line}");
        assert!(line.contains(" 950‰"), "{line}");
        assert!(line.ends_with("🥵"), "{line}");
    }

    #[test]
    fn typed_degrees_are_shown_unscaled() {
        let feedback = match crate::oracle::parse_answer("42,17°C 950‰") {
            Some(crate::oracle::OracleResult::Scored { score, percentile }) => {
                Feedback::Scored { score, percentile }
            }
            other => panic!("unexpected {other:?}"),
        };
        let line = format_attempt(&tried("montagne", 7, feedback), ScoreScale::AsGiven);
        assert!(line.contains(" 42.17 "), "{line}");
        assert!(!line.contains("4217"), "{line}");
    }

    #[test]
    fn csv_export_has_one_row_per_attempt() {
        let history = vec![
            tried("mer", 1, Feedback::Scored { score: 0.25, percentile: None }),
            tried("zzz", 2, Feedback::Unknown),
            tried("océan", 3, Feedback::Exact),
        ];
        let mut out = Vec::new();
        write_history_csv(&history, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "attempt,word,outcome,score,percentile");
        assert_eq!(lines[1], "1,mer,scored,0.25,");
        assert_eq!(lines[2], "2,zzz,unknown,,");
        assert_eq!(lines[3], "3,océan,exact,,1000");
    }
}
