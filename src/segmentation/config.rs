//! Configuration for the segmentation engine.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum chunk length in characters.
pub const DEFAULT_MAX_LENGTH: usize = 5000;

/// Minimum length applied to paragraph/markdown splits when the caller left
/// `min_length` at zero. Structural boundaries fire rarely, so without a floor
/// they produce pathologically small chunks.
pub const STRUCTURAL_MIN_LENGTH: usize = 200;

/// Configuration errors raised when constructing a [`Splitter`] or merging
/// per-call overrides.
///
/// [`Splitter`]: super::Splitter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// `min_length` must not exceed `max_length`.
    #[error("min_length {min} exceeds max_length {max}")]
    MinExceedsMax { min: usize, max: usize },

    /// `max_length` must be positive.
    #[error("max_length must be greater than zero")]
    ZeroMaxLength,

    /// The boundary identifier is not one of the built-in modes.
    #[error("unknown boundary mode '{0}': use 'sentence', 'paragraph' or 'markdown'")]
    UnknownBoundary(String),
}

/// Built-in boundary grammars dividing raw text into primitive units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// Split after `.`, `!` or `?` followed by whitespace or an uppercase letter.
    #[default]
    Sentence,
    /// Split after a terminator and a newline run, before a paragraph opener.
    Paragraph,
    /// Split after closing punctuation and a newline run, before a markdown
    /// marker or a capitalized word.
    Markdown,
}

impl FromStr for BoundaryMode {
    type Err = SplitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sentence" => Ok(BoundaryMode::Sentence),
            "paragraph" => Ok(BoundaryMode::Paragraph),
            "markdown" => Ok(BoundaryMode::Markdown),
            other => Err(SplitError::UnknownBoundary(other.to_string())),
        }
    }
}

impl fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BoundaryMode::Sentence => "sentence",
            BoundaryMode::Paragraph => "paragraph",
            BoundaryMode::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

/// Immutable configuration for one split operation.
///
/// All lengths are measured in characters, not bytes.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// A chunk accumulates units until it reaches at least this length.
    pub min_length: usize,
    /// Hard upper bound on chunk length (see [`Splitter`] for the overlap
    /// caveat).
    ///
    /// [`Splitter`]: super::Splitter
    pub max_length: usize,
    /// Trailing characters of the previous chunk copied onto the next one.
    pub overlap: usize,
    /// Built-in boundary grammar; ignored when `custom_boundary` is set.
    pub boundary: BoundaryMode,
    /// Custom boundary pattern. Match positions mark unit starts; matched text
    /// stays at the head of the following unit so chunks reassemble the
    /// source.
    pub custom_boundary: Option<Regex>,
    /// Collapse whitespace runs to single spaces and trim each final chunk.
    pub normalize_whitespace: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            min_length: 0,
            max_length: DEFAULT_MAX_LENGTH,
            overlap: 0,
            boundary: BoundaryMode::default(),
            custom_boundary: None,
            normalize_whitespace: false,
        }
    }
}

impl SplitConfig {
    /// Checks the construction-time invariants.
    pub fn validate(&self) -> Result<(), SplitError> {
        if self.max_length == 0 {
            return Err(SplitError::ZeroMaxLength);
        }
        if self.min_length > self.max_length {
            return Err(SplitError::MinExceedsMax {
                min: self.min_length,
                max: self.max_length,
            });
        }
        Ok(())
    }

    /// Merges per-call overrides into a copy of this config and validates the
    /// result. The receiver is never mutated.
    pub fn merged(&self, options: &SplitOptions) -> Result<SplitConfig, SplitError> {
        let mut config = self.clone();
        if let Some(min_length) = options.min_length {
            config.min_length = min_length;
        }
        if let Some(max_length) = options.max_length {
            config.max_length = max_length;
        }
        if let Some(overlap) = options.overlap {
            config.overlap = overlap;
        }
        if let Some(boundary) = options.boundary {
            config.boundary = boundary;
        }
        if let Some(pattern) = &options.custom_boundary {
            config.custom_boundary = Some(pattern.clone());
        }
        if let Some(normalize) = options.normalize_whitespace {
            config.normalize_whitespace = normalize;
        }
        config.validate()?;
        Ok(config)
    }

    /// Applies the structural minimum for paragraph/markdown splits when the
    /// caller left `min_length` at zero. Runs after validation, matching the
    /// contract that `min_length > max_length` is only an error when the
    /// caller asked for it.
    pub(crate) fn with_structural_floor(mut self) -> Self {
        if self.custom_boundary.is_none()
            && self.boundary != BoundaryMode::Sentence
            && self.min_length == 0
        {
            self.min_length = STRUCTURAL_MIN_LENGTH;
        }
        self
    }
}

/// Per-call partial override of a [`SplitConfig`].
#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub overlap: Option<usize>,
    pub boundary: Option<BoundaryMode>,
    pub custom_boundary: Option<Regex>,
    pub normalize_whitespace: Option<bool>,
}
