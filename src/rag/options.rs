//! Per-call generation overrides and their resolution into wire requests.

use crate::providers::{CompletionRequest, SamplingOptions};
use crate::types::RagError;

pub const DEFAULT_TEMPERATURE: f64 = 0.8;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_MIN_P: f64 = 0.0;
pub const DEFAULT_KEEP_ALIVE: &str = "5m";

/// Optional overrides for a single generation call.
///
/// Every `None` falls back to the service default. `format` is a JSON schema
/// given as a string; it is parsed at resolution time so a malformed schema
/// fails before any network traffic.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub temperature: Option<f64>,
    pub top_k: Option<u32>,
    pub top_p: Option<f64>,
    pub min_p: Option<f64>,
    pub suffix: Option<String>,
    pub think: Option<bool>,
    pub model: Option<String>,
    pub format: Option<String>,
}

impl GenerationOptions {
    /// Resolves these overrides against the defaults into a concrete request.
    pub fn to_request(
        &self,
        prompt: String,
        default_model: &str,
    ) -> Result<CompletionRequest, RagError> {
        let format = match &self.format {
            Some(schema) => Some(serde_json::from_str(schema).map_err(|err| {
                RagError::Configuration(format!("invalid format schema: {err}"))
            })?),
            None => None,
        };
        Ok(CompletionRequest {
            prompt,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            suffix: self.suffix.clone(),
            think: self.think.unwrap_or(false),
            stream: false,
            options: SamplingOptions {
                keep_alive: DEFAULT_KEEP_ALIVE.to_string(),
                temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                seed: 0,
                top_k: self.top_k.unwrap_or(DEFAULT_TOP_K),
                top_p: self.top_p.unwrap_or(DEFAULT_TOP_P),
                min_p: self.min_p.unwrap_or(DEFAULT_MIN_P),
            },
            format,
        })
    }
}
