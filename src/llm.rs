//! Text-completion oracle client for an Ollama-compatible endpoint.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::{ChatError, Result};

/// Seam for the language model so the pipeline can run against a
/// deterministic stub in tests.
#[async_trait]
pub trait CompletionOracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub struct OllamaClient {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(url: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ChatError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl CompletionOracle for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {"temperature": 0}
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::Llm(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        // A missing text field is empty output, not a transport failure;
        // the sanitizer turns it into a generation failure downstream.
        let text = response_json
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        debug!(raw = %text, "raw LLM output");

        Ok(text)
    }
}
