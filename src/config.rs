//! Explicit configuration for the HTTP adapters.
//!
//! Nothing in the library reads ambient state: adapters take these structs at
//! construction. The `from_env` constructors exist for binaries that want the
//! conventional environment variables (after a [`dotenvy`] pass) and fall back
//! to the defaults below for anything unset.

use std::env;

/// Default base URL for the model proxy.
pub const DEFAULT_PROVIDER_URL: &str = "http://localhost:4000";
/// Default base URL for the vector store.
pub const DEFAULT_STORE_URL: &str = "http://localhost:6333";
/// Default completion model identifier.
pub const DEFAULT_MODEL: &str = "ollama/llama3.1:8b";

/// Connection settings for the embedding/completion proxy.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the proxy, without a trailing slash requirement.
    pub base_url: String,
    /// Bearer token sent as `Authorization` when present.
    pub api_key: Option<String>,
    /// Model used for completions unless overridden per request.
    pub model: String,
    /// Model used for embeddings. Defaults to [`ProviderConfig::model`].
    pub embedding_model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Builds a config from `LLM_PROXY_URL` and `LITELLM_API_KEY`, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(url) = env::var("LLM_PROXY_URL") {
            config.base_url = url;
        }
        if let Ok(key) = env::var("LITELLM_API_KEY") {
            config.api_key = Some(key);
        }
        config
    }
}

/// Connection settings for the vector store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the store REST endpoint.
    pub url: String,
    /// API key sent as the `api-key` header when present.
    pub api_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_STORE_URL.to_string(),
            api_key: None,
        }
    }
}

impl StoreConfig {
    /// Builds a config from `VECTOR_DB_URL`, falling back to the default URL.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(url) = env::var("VECTOR_DB_URL") {
            config.url = url;
        }
        config
    }
}
