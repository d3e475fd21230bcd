//! Error types for the flatshare runtime.
//!
//! Uses `thiserror` for typed errors that surface through the runtime
//! pipeline: configuration, prompt rendering, LLM calls, response parsing.
//! Errors crossing into the engine are converted to `DecisionError` at the
//! source boundary, where the tick cycle degrades them to safe defaults.

/// Errors that can occur inside the LLM runtime.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Failed to render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// A persona file could not be read.
    #[error("persona error: {0}")]
    Persona(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
