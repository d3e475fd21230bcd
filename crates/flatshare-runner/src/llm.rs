//! LLM backend abstraction and implementations.
//!
//! Defines an enum-based dispatch for LLM backends, avoiding the
//! dyn-compatibility issues with async trait methods. Concrete
//! implementations exist for OpenAI-compatible APIs and the Anthropic
//! Messages API, both over HTTP via `reqwest`, plus a scripted variant
//! that replays canned replies for tests.
//!
//! The runtime does not care which model is behind the API -- it sends a
//! chat transcript and expects a text reply in the household's brace
//! conventions.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::RuntimeError;
use crate::session::{ChatSession, ChatTurn};

// ---------------------------------------------------------------------------
// Unified backend enum (dyn-compatible alternative to async trait)
// ---------------------------------------------------------------------------

/// An LLM backend that can continue a chat session and return the reply.
///
/// Uses enum dispatch instead of trait objects because async methods
/// are not dyn-compatible in Rust.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
    /// Canned replies for tests.
    Scripted(ScriptedBackend),
}

impl LlmBackend {
    /// Send the session transcript plus one new prompt and return the reply.
    ///
    /// Dispatches to the concrete backend implementation. The session is
    /// not mutated; recording the exchange is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::LlmBackend`] if the HTTP call fails or the
    /// response cannot be extracted.
    pub async fn complete(
        &self,
        session: &ChatSession,
        prompt: &str,
    ) -> Result<String, RuntimeError> {
        match self {
            Self::OpenAi(backend) => backend.complete(session, prompt).await,
            Self::Anthropic(backend) => backend.complete(session, prompt).await,
            Self::Scripted(backend) => backend.complete(),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
            Self::Scripted(_) => "scripted",
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Works with `OpenAI`, `DeepSeek`, and Ollama endpoints.
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Send the transcript and return the reply text.
    async fn complete(
        &self,
        session: &ChatSession,
        prompt: &str,
    ) -> Result<String, RuntimeError> {
        let url = format!("{}/chat/completions", self.api_url);

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": session.system()
        })];
        messages.extend(session.history().iter().map(turn_json));
        messages.push(serde_json::json!({"role": "user", "content": prompt}));

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
            "max_tokens": 512
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RuntimeError::LlmBackend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(RuntimeError::LlmBackend(format!(
                "OpenAI returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RuntimeError::LlmBackend(format!("OpenAI response parse failed: {e}")))?;

        extract_openai_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, RuntimeError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            RuntimeError::LlmBackend(
                "OpenAI response missing choices[0].message.content".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Anthropic uses a different request format from `OpenAI`:
/// - Uses `x-api-key` header instead of `Authorization: Bearer`
/// - The system message is a top-level field, not a messages entry
/// - Response structure differs: `content[0].text`
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Send the transcript and return the reply text.
    async fn complete(
        &self,
        session: &ChatSession,
        prompt: &str,
    ) -> Result<String, RuntimeError> {
        let url = format!("{}/messages", self.api_url);

        let mut messages: Vec<serde_json::Value> =
            session.history().iter().map(turn_json).collect();
        messages.push(serde_json::json!({"role": "user", "content": prompt}));

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 512,
            "system": session.system(),
            "messages": messages
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RuntimeError::LlmBackend(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(RuntimeError::LlmBackend(format!(
                "Anthropic returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| {
                RuntimeError::LlmBackend(format!("Anthropic response parse failed: {e}"))
            })?;

        extract_anthropic_content(&json)
    }
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, RuntimeError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            RuntimeError::LlmBackend("Anthropic response missing content[0].text".to_owned())
        })
}

/// Serialize one transcript entry into the shared wire shape.
fn turn_json(turn: &ChatTurn) -> serde_json::Value {
    serde_json::json!({"role": turn.role.as_str(), "content": turn.content})
}

// ---------------------------------------------------------------------------
// Scripted backend for tests
// ---------------------------------------------------------------------------

/// A backend that replays a queue of canned results.
///
/// An exhausted queue yields a backend error, exercising the same path a
/// dead HTTP endpoint would.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedBackend {
    /// Create an empty scripted backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply.
    pub fn push_reply(&self, reply: &str) {
        self.lock().push_back(Ok(reply.to_owned()));
    }

    /// Queue a failure.
    pub fn push_failure(&self, message: &str) {
        self.lock().push_back(Err(message.to_owned()));
    }

    fn complete(&self) -> Result<String, RuntimeError> {
        match self.lock().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(RuntimeError::LlmBackend(message)),
            None => Err(RuntimeError::LlmBackend(
                "scripted backend exhausted".to_owned(),
            )),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM backend from configuration.
///
/// Dispatches to [`OpenAiBackend`] or [`AnthropicBackend`] based on the
/// configured [`BackendType`].
pub fn create_backend(config: &LlmBackendConfig) -> LlmBackend {
    match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config)),
        BackendType::Anthropic => LlmBackend::Anthropic(AnthropicBackend::new(config)),
    }
}
