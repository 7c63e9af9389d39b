//! OpenAI-compatible client configuration with sensible defaults.
//!
//! Ollama, vLLM and OpenAI itself all accept the same chat completions API;
//! only the base URL and key differ.

use crate::config::ModelSettings;
use crate::error::{Result, TaskloopError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a chat completions client for the configured backend.
///
/// Requests time out after `timeout_secs`.
pub fn create_client(settings: &ModelSettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(|e| TaskloopError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.base_url.trim_end_matches('/'))
        .with_api_key(settings.resolved_api_key());

    Ok(Client::with_config(config).with_http_client(http_client))
}
