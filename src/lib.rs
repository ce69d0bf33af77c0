//! ```text
//! Raw text ──► segmentation::Splitter ──► chunks
//!                     │
//!                     ├─► boundary grammars (sentence / paragraph / markdown)
//!                     └─► overlap & oversize handling
//!
//! chunks ──► rag::RagService::embed_text ──► providers::TextModel::embed
//!                                        └─► stores::VectorStore::upsert
//!
//! query ──► rag::RagService::find_similar ──► stores::VectorStore::search
//!       └─► rag::RagService::generate_text ──► providers::TextModel::complete
//! ```
//!
pub mod config;
pub mod providers;
pub mod rag;
pub mod segmentation;
pub mod stores;
pub mod types;

pub use rag::{GenerationOptions, IngestContext, RagService, SearchContext};
pub use segmentation::{BoundaryMode, SplitConfig, SplitError, SplitOptions, Splitter};
pub use types::RagError;
