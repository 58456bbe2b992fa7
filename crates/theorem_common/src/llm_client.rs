//! Model Client
//!
//! Text-in, text-out interface to the generative model used by the reasoner's
//! fallback tier. One call per question, no retries.
//!
//! `OllamaClient` talks to a local Ollama server; `FakeModelClient` returns
//! scripted responses for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434";
const DEFAULT_MODEL: &str = "qwen3:4b";

/// Default keep_alive duration - model stays loaded for 5 minutes after last request
const DEFAULT_KEEP_ALIVE: &str = "5m";

/// Model backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    /// How long to keep model loaded after request (e.g., "5m", "0", "1h")
    pub keep_alive: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
            keep_alive: DEFAULT_KEEP_ALIVE.to_string(),
        }
    }
}

/// Model call errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("LLM is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("LLM returned empty response")]
    EmptyResponse,
}

/// Generative model seam
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;

    /// Model identifier for logs
    fn model_name(&self) -> &str;
}

// ============================================================================
// Ollama
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    keep_alive: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Ollama `/api/generate` client
pub struct OllamaClient {
    http_client: reqwest::Client,
    config: ModelConfig,
}

impl OllamaClient {
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Check if the Ollama server answers at all
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.endpoint.trim_end_matches('/'));
        self.http_client
            .get(&url)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout(self.config.timeout_secs)
        } else {
            ModelError::HttpError(format!("Request failed: {}", e))
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        if !self.config.enabled {
            return Err(ModelError::Disabled);
        }

        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            keep_alive: &self.config.keep_alive,
        };

        debug!("Calling {} at {} ({} chars)", self.config.model, url, prompt.len());

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::HttpError(format!(
                "HTTP {} from Ollama: {}",
                status,
                body.trim()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        match parsed.response {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ModelError::EmptyResponse),
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// Fake
// ============================================================================

/// Scripted model client for tests
///
/// With one scripted response, every call returns it. With several, each call
/// pops the next one.
pub struct FakeModelClient {
    responses: Mutex<Vec<Result<String, ModelError>>>,
    prompts: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FakeModelClient {
    pub fn new(responses: Vec<Result<String, ModelError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    pub fn always_error(error: ModelError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl ModelClient for FakeModelClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        lock(&self.prompts).push(prompt.to_string());

        let mut responses = lock(&self.responses);
        match responses.len() {
            0 => Err(ModelError::EmptyResponse),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert!(config.enabled);
        assert_eq!(config.endpoint, "http://127.0.0.1:11434");
        assert_eq!(config.model, "qwen3:4b");
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.keep_alive, "5m");
    }

    #[tokio::test]
    async fn test_fake_client_always() {
        let client = FakeModelClient::always("Answer: 42");

        assert_eq!(client.generate("first").await.unwrap(), "Answer: 42");
        assert_eq!(client.generate("second").await.unwrap(), "Answer: 42");
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.prompts(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_fake_client_always_error() {
        let client = FakeModelClient::always_error(ModelError::Timeout(30));

        let err = client.generate("prompt").await.unwrap_err();
        assert_eq!(err, ModelError::Timeout(30));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fake_client_sequence() {
        let client = FakeModelClient::new(vec![
            Ok("one".to_string()),
            Err(ModelError::EmptyResponse),
            Ok("three".to_string()),
        ]);

        assert_eq!(client.generate("").await.unwrap(), "one");
        assert!(client.generate("").await.is_err());
        assert_eq!(client.generate("").await.unwrap(), "three");
        // last response repeats
        assert_eq!(client.generate("").await.unwrap(), "three");
        assert_eq!(client.call_count(), 4);
    }

    #[tokio::test]
    async fn test_disabled_ollama_client_does_not_call_out() {
        let client = OllamaClient::new(ModelConfig {
            enabled: false,
            ..ModelConfig::default()
        })
        .unwrap();

        assert_eq!(client.generate("hi").await.unwrap_err(), ModelError::Disabled);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_not_available() {
        let client = OllamaClient::new(ModelConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..ModelConfig::default()
        })
        .unwrap();

        assert!(!client.is_available().await);
    }

    #[test]
    fn test_model_error_messages() {
        assert_eq!(
            ModelError::Timeout(120).to_string(),
            "Request timeout after 120 seconds"
        );
        assert_eq!(
            ModelError::HttpError("refused".into()).to_string(),
            "HTTP error: refused"
        );
    }
}
