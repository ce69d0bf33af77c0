//! Qdrant REST adapter for the [`VectorStore`] capability.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::json;
use url::Url;

use crate::config::StoreConfig;
use crate::types::RagError;

use super::{CollectionInfo, Filter, PointStruct, ScoredPoint, SearchQuery, VectorStore};

/// [`VectorStore`] backed by a Qdrant instance over its REST API.
///
/// Uses cosine distance for all collections. One attempt per operation; any
/// transport or non-success status surfaces as [`RagError::Store`].
#[derive(Debug, Clone)]
pub struct QdrantStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl QdrantStore {
    /// Builds a store client from the given configuration.
    pub fn new(config: &StoreConfig) -> Result<Self, RagError> {
        // Parse once so a malformed base URL fails at construction.
        Url::parse(&config.url)
            .map_err(|err| RagError::Store(format!("invalid store url '{}': {err}", config.url)))?;
        let client = Client::builder()
            .build()
            .map_err(|err| RagError::Store(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Builds a store client reusing an existing HTTP client.
    pub fn with_client(client: Client, config: &StoreConfig) -> Result<Self, RagError> {
        let mut store = Self::new(config)?;
        store.client = client;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<serde_json::Value, RagError> {
        let response = builder
            .send()
            .await
            .map_err(|err| RagError::Store(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(store_error(status, &body));
        }
        response
            .json()
            .await
            .map_err(|err| RagError::Store(format!("invalid store response: {err}")))
    }
}

fn store_error(status: StatusCode, body: &str) -> RagError {
    RagError::Store(format!("qdrant request failed ({status}): {body}"))
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, RagError> {
        let body = self.send(self.request(Method::GET, "/collections")).await?;
        let collections = body
            .pointer("/result/collections")
            .cloned()
            .unwrap_or_else(|| json!([]));
        serde_json::from_value(collections)
            .map_err(|err| RagError::Store(format!("invalid collection listing: {err}")))
    }

    async fn create_collection(&self, name: &str, vector_size: usize) -> Result<(), RagError> {
        self.send(
            self.request(Method::PUT, &format!("/collections/{name}"))
                .json(&json!({
                    "vectors": {"size": vector_size, "distance": "Cosine"},
                })),
        )
        .await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<(), RagError> {
        self.send(
            self.request(Method::PUT, &format!("/collections/{collection}/points"))
                .json(&json!({"points": points})),
        )
        .await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: SearchQuery,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        let mut body = json!({
            "vector": query.vector,
            "limit": query.limit,
            "with_payload": true,
        });
        if !query.filter.is_empty() {
            body["filter"] = serde_json::to_value(&query.filter)
                .map_err(|err| RagError::Store(err.to_string()))?;
        }

        let response = self
            .send(
                self.request(
                    Method::POST,
                    &format!("/collections/{collection}/points/search"),
                )
                .json(&body),
            )
            .await?;
        let hits = response
            .get("result")
            .cloned()
            .unwrap_or_else(|| json!([]));
        serde_json::from_value(hits)
            .map_err(|err| RagError::Store(format!("invalid search response: {err}")))
    }

    async fn delete_collection(&self, name: &str) -> Result<(), RagError> {
        self.send(self.request(Method::DELETE, &format!("/collections/{name}")))
            .await?;
        Ok(())
    }

    async fn delete_points(&self, collection: &str, filter: &Filter) -> Result<(), RagError> {
        self.send(
            self.request(
                Method::POST,
                &format!("/collections/{collection}/points/delete"),
            )
            .json(&json!({"filter": filter})),
        )
        .await?;
        Ok(())
    }

    async fn set_payload(
        &self,
        collection: &str,
        payload: serde_json::Value,
        filter: &Filter,
    ) -> Result<(), RagError> {
        self.send(
            self.request(
                Method::POST,
                &format!("/collections/{collection}/points/payload"),
            )
            .json(&json!({"payload": payload, "filter": filter})),
        )
        .await?;
        Ok(())
    }
}
