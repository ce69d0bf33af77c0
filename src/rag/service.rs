//! Retrieval-augmented generation orchestrator.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::providers::{Completion, TextModel};
use crate::segmentation::{BoundaryMode, SplitConfig, Splitter};
use crate::stores::{Condition, Filter, PointStruct, SearchQuery, VectorStore};
use crate::types::RagError;

use super::options::GenerationOptions;

/// Segmentation profile applied to every ingested document.
pub const INGEST_MAX_LENGTH: usize = 1024;
pub const INGEST_MIN_LENGTH: usize = 200;

/// Retrieval depth when the caller does not set one.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

const CONTEXT_PREAMBLE: &str = "Use this additional context for your response:\n\n------\n\n";
const CONTEXT_SEPARATOR: &str = "\n\n------\n\n";
const USER_INPUT_MARKER: &str = "User input:\n\n";

/// Metadata attached to a document at ingest time.
#[derive(Debug, Clone, Default)]
pub struct IngestContext {
    pub collection: String,
    pub tags: Vec<String>,
    pub key: Option<String>,
    pub kind: Option<String>,
    pub title: Option<String>,
}

/// Scoping for a retrieval call.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    pub collection: String,
    pub tags: Vec<String>,
    pub keys: Vec<String>,
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

/// Outcome of one [`RagService::embed_text`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub collection: String,
    pub chunks_written: usize,
    pub collection_created: bool,
}

/// A retrieved chunk with its similarity score and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub score: f32,
    pub text: String,
    pub payload: Value,
}

/// Orchestrates segmentation, embedding, storage, retrieval, and generation
/// over injected [`VectorStore`] and [`TextModel`] capabilities.
pub struct RagService {
    store: Arc<dyn VectorStore>,
    model: Arc<dyn TextModel>,
    default_model: String,
}

impl RagService {
    pub fn new(
        store: Arc<dyn VectorStore>,
        model: Arc<dyn TextModel>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            model,
            default_model: default_model.into(),
        }
    }

    /// Splits `text` into chunks, embeds each, and upserts them into the
    /// target collection. The collection is created on first use, sized from
    /// the first embedding.
    pub async fn embed_text(
        &self,
        text: &str,
        context: &IngestContext,
    ) -> Result<IngestReport, RagError> {
        let chunks = ingest_splitter()?.split(text);
        tracing::debug!(
            collection = %context.collection,
            chunks = chunks.len(),
            "segmented document for ingest"
        );

        let mut collection_created = false;
        let mut collection_ready = false;
        let mut written = 0usize;
        for chunk in &chunks {
            // The title prefix goes into both the embedding and the stored
            // source text, so retrieval returns it verbatim.
            let source = match &context.title {
                Some(title) => format!("Title: {title}\n\n{chunk}"),
                None => chunk.clone(),
            };
            let vector = self.model.embed(&source).await?;
            if !collection_ready {
                collection_created = self
                    .ensure_collection(&context.collection, vector.len())
                    .await?;
                collection_ready = true;
            }
            let point = PointStruct {
                id: Uuid::new_v4(),
                vector,
                payload: ingest_payload(&source, context),
            };
            self.store
                .upsert(&context.collection, vec![point])
                .await?;
            written += 1;
        }

        tracing::info!(
            collection = %context.collection,
            chunks = written,
            created = collection_created,
            "ingested document"
        );
        Ok(IngestReport {
            collection: context.collection.clone(),
            chunks_written: written,
            collection_created,
        })
    }

    /// Embeds `text` and returns the most similar stored chunks, scoped by
    /// the context's filters.
    ///
    /// An empty embedding cannot be searched; it yields an empty result
    /// rather than an error.
    pub async fn find_similar(
        &self,
        text: &str,
        context: &SearchContext,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        let vector = self.model.embed(text).await?;
        if vector.is_empty() {
            tracing::warn!(
                collection = %context.collection,
                "empty embedding for query text, skipping search"
            );
            return Ok(Vec::new());
        }

        let query = SearchQuery {
            vector,
            limit: context.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
            filter: search_filter(context),
        };
        let hits = self.store.search(&context.collection, query).await?;
        Ok(hits
            .into_iter()
            .map(|hit| {
                let text = hit
                    .payload
                    .get("source")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                RetrievedChunk {
                    score: hit.score,
                    text,
                    payload: hit.payload,
                }
            })
            .collect())
    }

    /// Generates a completion for `text`, optionally grounding the prompt in
    /// retrieved context.
    pub async fn generate_text(
        &self,
        text: &str,
        context: Option<&SearchContext>,
        options: Option<&GenerationOptions>,
    ) -> Result<Completion, RagError> {
        let prompt = match context {
            Some(search) => {
                let retrieved = self.find_similar(text, search).await?;
                let snippets: Vec<&str> = retrieved.iter().map(|c| c.text.as_str()).collect();
                build_prompt(text, Some(snippets.as_slice()))
            }
            None => build_prompt(text, None),
        };

        let default_options = GenerationOptions::default();
        let request = options
            .unwrap_or(&default_options)
            .to_request(prompt, &self.default_model)?;
        tracing::debug!(model = %request.model, "requesting completion");
        self.model.complete(&request).await
    }

    /// Lists the names of all collections in the store.
    pub async fn collections(&self) -> Result<Vec<String>, RagError> {
        let collections = self.store.list_collections().await?;
        Ok(collections.into_iter().map(|c| c.name).collect())
    }

    /// Drops a collection and all its points.
    pub async fn delete_collection(&self, name: &str) -> Result<(), RagError> {
        self.store.delete_collection(name).await
    }

    /// Deletes every point whose payload carries the given key.
    pub async fn delete_by_key(&self, collection: &str, key: &str) -> Result<(), RagError> {
        let filter = Filter {
            must: vec![Condition::value("key", key)],
        };
        self.store.delete_points(collection, &filter).await
    }

    /// Merges `payload` into every point whose payload carries the given key.
    pub async fn update_payload(
        &self,
        collection: &str,
        key: &str,
        payload: Value,
    ) -> Result<(), RagError> {
        let filter = Filter {
            must: vec![Condition::value("key", key)],
        };
        self.store.set_payload(collection, payload, &filter).await
    }

    async fn ensure_collection(
        &self,
        name: &str,
        vector_size: usize,
    ) -> Result<bool, RagError> {
        let existing = self.store.list_collections().await?;
        if existing.iter().any(|c| c.name == name) {
            return Ok(false);
        }
        tracing::info!(collection = %name, vector_size, "creating collection");
        self.store.create_collection(name, vector_size).await?;
        Ok(true)
    }
}

fn ingest_splitter() -> Result<Splitter, RagError> {
    let splitter = Splitter::new(SplitConfig {
        max_length: INGEST_MAX_LENGTH,
        min_length: INGEST_MIN_LENGTH,
        boundary: BoundaryMode::Paragraph,
        normalize_whitespace: true,
        ..SplitConfig::default()
    })?;
    Ok(splitter)
}

fn ingest_payload(source: &str, context: &IngestContext) -> Value {
    let mut payload = BTreeMap::new();
    payload.insert("source", json!(source));
    payload.insert("timestamp", json!(Utc::now().to_rfc3339()));
    if !context.tags.is_empty() {
        payload.insert("tags", json!(context.tags));
    }
    if let Some(key) = &context.key {
        payload.insert("key", json!(key));
    }
    if let Some(kind) = &context.kind {
        payload.insert("type", json!(kind));
    }
    if let Some(title) = &context.title {
        payload.insert("title", json!(title));
    }
    json!(payload)
}

fn search_filter(context: &SearchContext) -> Filter {
    let mut must = Vec::new();
    if !context.tags.is_empty() {
        must.push(Condition::any("tags", context.tags.clone()));
    }
    if let Some(kind) = &context.kind {
        must.push(Condition::value("type", kind));
    }
    if !context.keys.is_empty() {
        must.push(Condition::any("key", context.keys.clone()));
    }
    Filter { must }
}

/// Assembles the final prompt. `snippets` is `Some` when a search context was
/// supplied, even if retrieval came back empty.
fn build_prompt(text: &str, snippets: Option<&[&str]>) -> String {
    match snippets {
        None => text.to_string(),
        Some([]) => format!("{USER_INPUT_MARKER}{text}"),
        Some(found) => format!(
            "{CONTEXT_PREAMBLE}{}{CONTEXT_SEPARATOR}{USER_INPUT_MARKER}{text}",
            found.join(CONTEXT_SEPARATOR)
        ),
    }
}
