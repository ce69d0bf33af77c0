//! Boundary-aware text segmentation.
//!
//! Turns an arbitrary-length string into an ordered sequence of chunks
//! obeying min/max length constraints, with optional inter-chunk overlap:
//!
//! ```text
//! raw text ──► normalize newlines ──► boundary split ──► primitive units
//!                                                             │
//!                         accumulate until min_length ◄───────┘
//!                                   │
//!                ┌──────────────────┴──────────────────┐
//!                ▼                                     ▼
//!        within max_length                      over max_length
//!        emit (+ overlap prefix)        sub-split, carry remainder forward
//! ```
//!
//! The engine is pure and synchronous; the only failure mode is an invalid
//! configuration.

mod boundary;
mod config;
mod splitter;

pub use config::{
    BoundaryMode, DEFAULT_MAX_LENGTH, STRUCTURAL_MIN_LENGTH, SplitConfig, SplitError, SplitOptions,
};
pub use splitter::Splitter;
