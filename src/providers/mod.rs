//! Text-model capability and its wire types.
//!
//! ```text
//!   +------------+       embed()        +--------------------+
//!   | RagService | -------------------> |  dyn TextModel     |
//!   |            | ----- complete() --> |  (HttpTextModel,   |
//!   +------------+                      |   MockTextModel)   |
//!                                       +--------------------+
//! ```
//!
//! [`TextModel`] abstracts a completion/embedding backend behind an
//! OpenAI-compatible proxy. [`HttpTextModel`] is the production adapter;
//! [`MockTextModel`] records calls for tests.

mod http;

pub use http::HttpTextModel;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use crate::types::RagError;

/// Sampling parameters forwarded verbatim to the completion backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingOptions {
    pub keep_alive: String,
    pub temperature: f64,
    pub seed: u64,
    pub top_k: u32,
    pub top_p: f64,
    pub min_p: f64,
}

/// A fully resolved completion request, ready for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub think: bool,
    pub stream: bool,
    pub options: SamplingOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_json::Value>,
}

/// A completion response, with the raw body retained for callers that need
/// backend-specific fields.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Option<serde_json::Value>,
    pub raw: serde_json::Value,
}

impl Completion {
    /// Extracts the generated text from either an Ollama-shaped (`response`)
    /// or OpenAI-shaped (`choices[0].text`) body.
    pub fn from_raw(raw: serde_json::Value) -> Self {
        let text = raw
            .get("response")
            .and_then(|v| v.as_str())
            .or_else(|| raw.pointer("/choices/0/text").and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string();
        let usage = raw.get("usage").cloned();
        Self { text, usage, raw }
    }
}

/// Capability trait for embedding and text generation.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Embeds a single text into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// Runs one completion request and returns the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, RagError>;
}

/// Deterministic in-memory [`TextModel`] for tests.
///
/// `embed` hashes the input into a small fixed-width vector; `complete`
/// returns a canned reply. Both record their inputs.
#[derive(Debug, Default)]
pub struct MockTextModel {
    pub reply: String,
    pub embed_calls: Mutex<Vec<String>>,
    pub complete_calls: Mutex<Vec<CompletionRequest>>,
}

impl MockTextModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl TextModel for MockTextModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        self.embed_calls.lock().push(text.to_string());
        let mut vector = vec![0.0f32; 8];
        for (i, b) in text.bytes().enumerate() {
            vector[i % 8] += f32::from(b) / 255.0;
        }
        Ok(vector)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, RagError> {
        self.complete_calls.lock().push(request.clone());
        Ok(Completion::from_raw(serde_json::json!({
            "response": self.reply,
        })))
    }
}
