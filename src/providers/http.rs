//! OpenAI-compatible HTTP adapter for the [`TextModel`] capability.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::json;
use url::Url;

use crate::config::ProviderConfig;
use crate::types::RagError;

use super::{Completion, CompletionRequest, TextModel};

/// [`TextModel`] backed by an OpenAI-compatible proxy (LiteLLM, Ollama's
/// compatibility layer, or the real thing).
///
/// `POST {base}/embeddings` and `POST {base}/completions`, bearer auth when an
/// API key is configured. One attempt per call; failures surface as
/// [`RagError::Provider`].
#[derive(Debug, Clone)]
pub struct HttpTextModel {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
}

impl HttpTextModel {
    /// Builds a model client from the given configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, RagError> {
        Url::parse(&config.base_url).map_err(|err| {
            RagError::Provider(format!("invalid provider url '{}': {err}", config.base_url))
        })?;
        let client = Client::builder()
            .build()
            .map_err(|err| RagError::Provider(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    /// Builds a model client reusing an existing HTTP client.
    pub fn with_client(client: Client, config: &ProviderConfig) -> Result<Self, RagError> {
        let mut model = Self::new(config)?;
        model.client = client;
        Ok(model)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let mut builder = self.client.post(format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<serde_json::Value, RagError> {
        let response = builder
            .send()
            .await
            .map_err(|err| RagError::Provider(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Provider(format!(
                "provider request failed ({status}): {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|err| RagError::Provider(format!("invalid provider response: {err}")))
    }
}

#[async_trait]
impl TextModel for HttpTextModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let body = self
            .send(self.post("/embeddings").json(&json!({
                "input": text,
                "model": self.embedding_model,
            })))
            .await?;
        let embedding = body
            .pointer("/data/0/embedding")
            .ok_or_else(|| RagError::Provider("embedding response missing data".to_string()))?;
        serde_json::from_value(embedding.clone())
            .map_err(|err| RagError::Provider(format!("invalid embedding: {err}")))
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, RagError> {
        let body = self.send(self.post("/completions").json(request)).await?;
        Ok(Completion::from_raw(body))
    }
}
