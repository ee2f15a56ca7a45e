//! Error Types for the Mail Assistant Toolkit

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Mailbox error: {0}")]
    Mailbox(String),

    #[error("Attachment unavailable: {0}")]
    AttachmentUnavailable(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(#[from] agent_core::AgentError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
