//! Embedding sources: word2vec text and binary formats plus a bincode cache.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::index::{EmbeddingIndex, StoredIndex};
use crate::io_utils::io_error;
use crate::SolverError;

/// Larger headers are rejected rather than allocated.
const MAX_DIMENSION: usize = 1 << 16;

/// Parse the word2vec/fastText text format.
///
/// An optional `"<count> <dim>"` first line is recognised and its dimension
/// enforced. Blank lines are ignored.
pub fn load_text<R: BufRead>(reader: R) -> Result<EmbeddingIndex, SolverError> {
    let mut entries = Vec::new();
    let mut declared_dim = None;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            continue;
        };
        let rest: Vec<&str> = parts.collect();

        if lineno == 0 && rest.len() == 1 {
            if let (Ok(_), Ok(dim)) = (word.parse::<usize>(), rest[0].parse::<usize>()) {
                declared_dim = Some(dim);
                continue;
            }
        }

        let vector = rest
            .iter()
            .map(|v| v.parse::<f32>())
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| SolverError::Load(format!("line {}: {e}", lineno + 1)))?;
        if let Some(expected) = declared_dim {
            if vector.len() != expected {
                return Err(SolverError::DimensionMismatch {
                    expected,
                    found: vector.len(),
                });
            }
        }
        entries.push((word.to_string(), vector));
    }

    EmbeddingIndex::from_entries(entries)
}

/// Parse the word2vec binary format.
///
/// Layout: an ASCII `"<count> <dim>\n"` header, then per entry the word bytes
/// up to a space followed by `dim` little-endian `f32`. Bytes that are not
/// valid UTF-8 are dropped from words.
pub fn load_word2vec_binary<R: BufRead>(mut reader: R) -> Result<EmbeddingIndex, SolverError> {
    let mut header = String::new();
    reader.read_line(&mut header)?;
    let mut fields = header.split_whitespace().map(str::parse::<usize>);
    let (count, dim) = match (fields.next(), fields.next()) {
        (Some(Ok(count)), Some(Ok(dim))) => (count, dim),
        _ => {
            return Err(SolverError::Load(format!(
                "invalid word2vec header: {:?}",
                header.trim()
            )))
        }
    };

    if dim == 0 || dim > MAX_DIMENSION {
        return Err(SolverError::Load(format!("unsupported dimension {dim}")));
    }

    let mut entries = Vec::with_capacity(count.min(1 << 20));
    let mut word_bytes = Vec::new();
    for i in 0..count {
        word_bytes.clear();
        reader.read_until(b' ', &mut word_bytes)?;
        if word_bytes.last() != Some(&b' ') {
            return Err(SolverError::Load(format!(
                "entry {i}: truncated before vector ({count} declared)"
            )));
        }
        word_bytes.pop();
        let word: String = String::from_utf8_lossy(&word_bytes)
            .chars()
            .filter(|c| *c != char::REPLACEMENT_CHARACTER && *c != '\n')
            .collect();

        let mut vector = vec![0f32; dim];
        reader
            .read_exact(bytemuck::cast_slice_mut(&mut vector))
            .map_err(|e| SolverError::Load(format!("entry {i} ({word}): {e}")))?;
        if cfg!(target_endian = "big") {
            for v in vector.iter_mut() {
                *v = f32::from_bits(v.to_bits().swap_bytes());
            }
        }
        entries.push((word, vector));
    }

    EmbeddingIndex::from_entries(entries)
}

/// Read a bincode snapshot written by [`save_cache`].
pub fn load_cache<R: Read>(reader: R) -> Result<EmbeddingIndex, SolverError> {
    let stored: StoredIndex = bincode::deserialize_from(reader)?;
    EmbeddingIndex::from_stored(stored)
}

/// Atomically write a bincode snapshot of `index` to `path`.
pub fn save_cache(index: &EmbeddingIndex, path: &Path) -> Result<(), SolverError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| io_error("creating directory", parent, e))?;

    let temp = NamedTempFile::new_in(parent).map_err(|e| io_error("creating temp file in", parent, e))?;
    let mut writer = BufWriter::new(temp.as_file());
    bincode::serialize_into(&mut writer, &index.to_stored())?;
    writer.flush()?;
    drop(writer);
    temp.persist(path)
        .map_err(|e| io_error("writing cache", path, e.error))?;
    Ok(())
}

/// Load an index choosing the format by extension: `.bin` word2vec binary,
/// `.idx` bincode cache, anything else text.
pub fn load_path(path: &Path) -> Result<EmbeddingIndex, SolverError> {
    let file = File::open(path).map_err(|e| io_error("opening embeddings", path, e))?;
    let reader = BufReader::new(file);
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    let index = match ext.as_deref() {
        Some("bin") => load_word2vec_binary(reader)?,
        Some("idx") => load_cache(reader)?,
        _ => load_text(reader)?,
    };
    tracing::info!(
        path = %path.display(),
        words = index.len(),
        dimension = index.dimension(),
        "embedding index loaded"
    );
    Ok(index)
}
