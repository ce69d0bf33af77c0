//! Retrieval-augmented generation on top of the segmentation engine.
//!
//! ```text
//!   embed_text ──► Splitter ──► TextModel::embed ──► VectorStore::upsert
//!   find_similar ──► TextModel::embed ──► VectorStore::search
//!   generate_text ──► find_similar ──► prompt ──► TextModel::complete
//! ```
//!
//! [`RagService`] owns nothing but capability handles; every backend concern
//! lives behind [`crate::stores::VectorStore`] and
//! [`crate::providers::TextModel`].

mod options;
mod service;

pub use options::{
    DEFAULT_KEEP_ALIVE, DEFAULT_MIN_P, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
    GenerationOptions,
};
pub use service::{
    DEFAULT_SEARCH_LIMIT, INGEST_MAX_LENGTH, INGEST_MIN_LENGTH, IngestContext, IngestReport,
    RagService, RetrievedChunk, SearchContext,
};
