//! LLM agent module for itinerary generation.
//!
//! Uses rstructor's Gemini client as a plain text generator; the response is
//! free text in the course block format and is parsed downstream.

use crate::config::Config;
use async_trait::async_trait;
use rstructor::{GeminiClient, GeminiModel, LLMClient};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("LLM returned an empty response")]
    EmptyResponse,
    #[error("configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

/// Turns a prompt into a completion
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError>;
}

/// Gemini-backed generator
pub struct GeminiAgent {
    client: GeminiClient,
}

impl GeminiAgent {
    pub fn from_config(config: &Config) -> Result<Self, AgentError> {
        let api_key = config.api_key()?;

        // Parse the model from config
        let model = parse_gemini_model(&config.agent.model);

        // Build the client
        let client = GeminiClient::new(api_key)
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?
            .model(model);

        Ok(Self { client })
    }
}

#[async_trait]
impl TextGenerator for GeminiAgent {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        let result = self
            .client
            .generate_with_metadata(prompt)
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        debug!(chars = result.text.len(), "Received completion");

        let cleaned = strip_code_fence(&result.text);
        if cleaned.is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(cleaned)
    }
}

/// Strip a markdown code block wrapping the whole response
fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();

    // Remove ```markdown ... ``` or ``` ... ```
    if let Some(without_prefix) = trimmed.strip_prefix("```") {
        // Drop the language tag, if any, up to the first newline
        let body = match without_prefix.find('\n') {
            Some(idx) if !without_prefix[..idx].contains(' ') => &without_prefix[idx + 1..],
            _ => without_prefix,
        };

        if let Some(end_idx) = body.rfind("```") {
            return body[..end_idx].trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Parse a model string into a GeminiModel
fn parse_gemini_model(model: &str) -> GeminiModel {
    match model {
        "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
        "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
        "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
        _ => GeminiModel::Gemini20Flash, // Default
    }
}
