//! Chunk accumulation, overlap carry-over, and oversize sub-splitting.

use std::sync::LazyLock;

use regex::Regex;

use super::boundary::split_units;
use super::config::{SplitConfig, SplitError, SplitOptions};

static NEWLINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("literal pattern"));
static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("literal pattern"));

/// Boundary-aware text splitter.
///
/// Holds a validated [`SplitConfig`] for its lifetime; [`split_with`] merges
/// per-call overrides without mutating the held config. Splitting is pure and
/// synchronous: no I/O, no shared state, safe to call concurrently.
///
/// Every emitted chunk is trimmed and non-empty, and no chunk exceeds
/// `max_length` characters unless `overlap > 0` (the overlap prefix is
/// prepended after the length check).
///
/// # Examples
///
/// ```
/// use ragkit::segmentation::{SplitConfig, Splitter};
///
/// let splitter = Splitter::new(SplitConfig {
///     max_length: 4,
///     ..Default::default()
/// })
/// .unwrap();
/// assert_eq!(splitter.split("A. B. C. D."), vec!["A.", "B.", "C.", "D."]);
/// ```
///
/// [`split_with`]: Splitter::split_with
#[derive(Debug, Clone)]
pub struct Splitter {
    config: SplitConfig,
}

impl Splitter {
    /// Creates a splitter, validating the configuration.
    pub fn new(config: SplitConfig) -> Result<Self, SplitError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration held by this splitter.
    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Splits `text` into ordered chunks using the held configuration.
    pub fn split(&self, text: &str) -> Vec<String> {
        run(text, &self.config.clone().with_structural_floor())
    }

    /// Splits `text` with per-call overrides. The overrides are scoped to
    /// this call; the held configuration is unchanged afterwards.
    pub fn split_with(&self, text: &str, options: &SplitOptions) -> Result<Vec<String>, SplitError> {
        let config = self.config.merged(options)?.with_structural_floor();
        Ok(run(text, &config))
    }
}

fn run(text: &str, config: &SplitConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let normalized = NEWLINE_RUNS.replace_all(text, "\n\n");
    let units = split_units(&normalized, config.boundary, config.custom_boundary.as_ref());
    let chunks = accumulate(&units, config);

    if config.normalize_whitespace {
        chunks
            .into_iter()
            .map(|chunk| WHITESPACE_RUNS.replace_all(&chunk, " ").trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    } else {
        chunks
    }
}

/// Accumulation state: the pending unit buffer and the chunks emitted so far.
///
/// Kept explicit (rather than captured in closures) so each finalization step
/// is a plain function over it.
struct Accumulator {
    pending: Vec<String>,
    pending_len: usize,
    chunks: Vec<String>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
            pending_len: 0,
            chunks: Vec::new(),
        }
    }

    fn push(&mut self, unit: &str) {
        self.pending_len += char_len(unit);
        self.pending.push(unit.to_string());
    }

    fn take_pending(&mut self) -> String {
        self.pending_len = 0;
        std::mem::take(&mut self.pending).concat()
    }

    /// Trims and emits a chunk; chunks that trim to nothing are dropped.
    fn emit(&mut self, chunk: &str) {
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            self.chunks.push(trimmed.to_string());
        }
    }

    /// Overlap prefix derived from the most recently emitted chunk.
    fn overlap_prefix(&self, overlap: usize) -> String {
        match self.chunks.last() {
            Some(prev) => overlap_text(prev, overlap),
            None => String::new(),
        }
    }
}

fn accumulate(units: &[&str], config: &SplitConfig) -> Vec<String> {
    let mut acc = Accumulator::new();

    for unit in units {
        if char_len(unit.trim()) <= 1 {
            continue;
        }
        acc.push(unit);
        if acc.pending_len < config.min_length {
            continue;
        }
        if acc.pending_len > config.max_length {
            finalize_oversize(&mut acc, config);
        } else {
            finalize_in_range(&mut acc, config);
        }
    }

    // Flush whatever is left, regardless of min_length.
    if !acc.pending.is_empty() {
        finalize_in_range(&mut acc, config);
    }

    acc.chunks
}

/// Emits the pending buffer as a single chunk, prefixed with overlap text
/// from the previously emitted chunk.
fn finalize_in_range(acc: &mut Accumulator, config: &SplitConfig) {
    let mut chunk = acc.overlap_prefix(config.overlap);
    chunk.push_str(&acc.take_pending());
    acc.emit(&chunk);
}

/// Sub-splits a pending buffer that grew past `max_length`. Any remainder too
/// short to stand alone is carried into the next accumulation buffer.
fn finalize_oversize(acc: &mut Accumulator, config: &SplitConfig) {
    let mut buffer = acc.overlap_prefix(config.overlap);
    buffer.push_str(&acc.take_pending());

    let (sub_chunks, remainder) = split_oversize(buffer, config.max_length, config.overlap);
    for chunk in &sub_chunks {
        acc.emit(chunk);
    }
    if !remainder.is_empty() {
        acc.push(&remainder);
    }
}

/// Cuts an oversize buffer into chunks of at most `max_length` characters.
///
/// Each iteration cuts at the nearest space at or before `max_length`, or
/// hard-cuts at exactly `max_length` when the buffer has no usable space.
/// Overlap text from the emitted prefix is prepended to the remainder only
/// when it is strictly shorter than that prefix, so the buffer strictly
/// shrinks on every iteration and the loop always terminates.
///
/// Returns the emitted chunks and the final remainder (at most `max_length`
/// characters) to be merged into the next accumulation buffer.
fn split_oversize(buffer: String, max_length: usize, overlap: usize) -> (Vec<String>, String) {
    let overlap = if overlap >= max_length {
        max_length / 2
    } else {
        overlap
    };

    let mut sub_chunks = Vec::new();
    let mut remainder = String::new();
    let mut chunk_string = buffer;

    loop {
        let chars: Vec<char> = chunk_string.chars().collect();
        if chars.len() <= max_length {
            break;
        }
        if char_len(chunk_string.trim()) <= 1 {
            // Oversize run of whitespace; nothing worth emitting.
            chunk_string.clear();
            break;
        }

        let break_point = if chars[max_length] == ' ' {
            max_length
        } else {
            match rfind_space(&chars, max_length) {
                // A space at position 0 would cut an empty prefix.
                Some(at) if at > 0 => at,
                _ => max_length,
            }
        };

        let prefix: String = chars[..break_point].iter().collect();
        let rest: String = chars[break_point..].iter().collect();

        if char_len(&rest) > max_length {
            let carried = overlap_text(&prefix, overlap);
            sub_chunks.push(prefix);
            chunk_string = if char_len(&carried) < break_point {
                let mut next = carried;
                next.push_str(&rest);
                next.trim().to_string()
            } else {
                rest.trim_start().to_string()
            };
        } else {
            sub_chunks.push(prefix);
            remainder = rest;
            chunk_string.clear();
            break;
        }
    }

    if !chunk_string.is_empty() && char_len(&chunk_string) <= max_length {
        sub_chunks.push(chunk_string);
    }

    (sub_chunks, remainder)
}

/// Extracts the overlap text from the tail of `previous`.
///
/// An overlap covering the whole previous chunk is clamped to half of it.
/// The cut lands on the nearest space at or before `len - overlap`, falling
/// forward when none exists behind, and on the literal last `overlap`
/// characters when the chunk has no spaces at all.
fn overlap_text(previous: &str, overlap: usize) -> String {
    if overlap == 0 || previous.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = previous.chars().collect();
    let overlap = if overlap >= chars.len() {
        chars.len() / 2
    } else {
        overlap
    };
    if overlap == 0 {
        return String::new();
    }

    let position = chars.len() - overlap;
    let cut = match rfind_space(&chars, position) {
        Some(at) if at > 0 => Some(at),
        _ => find_space(&chars, position),
    };

    let tail: String = match cut {
        Some(at) => chars[at..].iter().collect(),
        None => chars[chars.len() - overlap..].iter().collect(),
    };
    tail.trim_start().to_string()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Index of the nearest space at or before `position`.
fn rfind_space(chars: &[char], position: usize) -> Option<usize> {
    let position = position.min(chars.len() - 1);
    (0..=position).rev().find(|&i| chars[i] == ' ')
}

/// Index of the nearest space at or after `position`.
fn find_space(chars: &[char], position: usize) -> Option<usize> {
    (position..chars.len()).find(|&i| chars[i] == ' ')
}
