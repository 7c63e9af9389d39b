//! Error types for Taskloop.

use thiserror::Error;

/// Library-level error type for Taskloop operations.
#[derive(Error, Debug)]
pub enum TaskloopError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The tool provider could not be reached or exposed no tools.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A single tool call failed. Recoverable: the loop feeds it back to the model.
    #[error("Tool invocation failed: {0}")]
    Invocation(String),

    /// The model backend call failed.
    #[error("Model error: {0}")]
    Model(String),

    /// JSON-RPC error response from an MCP server.
    #[error("Protocol error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("Turn exceeded the maximum of {0} model invocations")]
    HopLimit(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TaskloopError {
    /// Whether the turn loop can recover from this error by reporting it to the model.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TaskloopError::Invocation(_))
    }
}

/// Result type alias for Taskloop operations.
pub type Result<T> = std::result::Result<T, TaskloopError>;
