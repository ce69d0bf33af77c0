//! Crate-wide error type.

use thiserror::Error;

use crate::segmentation::SplitError;

/// Errors surfaced by the retrieval/generation components.
///
/// The segmentation engine has its own leaf error ([`SplitError`]) which maps
/// into [`RagError::Configuration`]; everything else is a provider or store
/// failure carried upward without retries or suppression.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid segmentation parameters or an invalid structured-output schema.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The embedding or completion provider returned a failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// A vector store operation failed.
    #[error("vector store error: {0}")]
    Store(String),
}

impl From<SplitError> for RagError {
    fn from(err: SplitError) -> Self {
        RagError::Configuration(err.to_string())
    }
}
