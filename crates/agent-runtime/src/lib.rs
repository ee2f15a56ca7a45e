//! # agent-runtime
//!
//! Concrete LLM backends for the mail assistant.
//!
//! ## Providers
//!
//! - **OpenAI-compatible** (default): chat completions and embeddings over
//!   any endpoint speaking the OpenAI REST dialect
//! - **Ollama** (feature `ollama`): local inference via `ollama-rs`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let completion = provider.complete(&messages, &options).await?;
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;

// Re-export core types for convenience
pub use agent_core::{
    AgentError, EmbeddingProvider, GenerationOptions, LlmProvider, Message, Result, Role,
};
