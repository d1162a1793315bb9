//! Error types for ytdlq.

use thiserror::Error;

/// Library-level error type for ytdlq operations.
#[derive(Error, Debug)]
pub enum YtdlqError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Queue empty: add at least one URL to the queue.")]
    EmptyQueue,

    #[error("Invalid output folder: {0}")]
    InvalidOutputDir(String),

    #[error("A task is already running.")]
    Busy,

    #[error("Canceled by user")]
    Canceled,
}

impl YtdlqError {
    /// Whether this error was caused by a user cancel request.
    pub fn is_canceled(&self) -> bool {
        matches!(self, YtdlqError::Canceled)
    }
}

/// Result type alias for ytdlq operations.
pub type Result<T> = std::result::Result<T, YtdlqError>;
