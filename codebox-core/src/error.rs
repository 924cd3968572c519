//! Error types for codebox

use thiserror::Error;

/// Result type alias using codebox's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for codebox
#[derive(Debug, Error)]
pub enum Error {
    // ============ Run Errors ============
    /// Remote execution kept failing until the retry budget ran out
    #[error("Run failed after {attempts} attempt(s): {}", .detail.as_deref().unwrap_or("no error detail"))]
    RunFailed {
        /// Number of attempts that were made
        attempts: u32,
        /// Last error detail reported by the remote side
        detail: Option<String>,
    },

    /// Remote execution ended in a status other than completed or failed
    #[error("Run ended with unexpected status: {status} ({})", .detail.as_deref().unwrap_or("no error detail"))]
    UnexpectedRunStatus {
        /// Status as reported by the remote side
        status: String,
        /// Error detail, if any
        detail: Option<String>,
    },

    // ============ Provider Errors ============
    /// Provider API error
    #[error("Provider API error: {0}")]
    ProviderApi(String),

    /// Provider authentication failed
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    // ============ Tool Errors ============
    /// Tool invoked before a client was registered
    #[error("No code interpreter client registered{}", .session.as_ref().map(|s| format!(" for session {s}")).unwrap_or_default())]
    UninitializedClient {
        /// Session that was looked up, `None` for the process-wide slot
        session: Option<String>,
    },

    /// Tool not found in the tool set
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid tool arguments
    #[error("Invalid tool arguments for {tool_name}: {message}")]
    ToolArguments {
        /// Name of the tool
        tool_name: String,
        /// Error message
        message: String,
    },

    // ============ Configuration Errors ============
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML configuration could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_yaml_ng::Error),

    // ============ Serialization Errors ============
    /// JSON serialization failed
    #[error("Message serialization error: {0}")]
    MessageSerialize(#[from] serde_json::Error),

    // ============ Network Errors ============
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // ============ System Errors ============
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============ Generic Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new provider API error
    pub fn provider_api(msg: impl Into<String>) -> Self {
        Self::ProviderApi(msg.into())
    }

    /// Create a new tool argument error
    pub fn tool_arguments(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolArguments {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retryable at the transport level
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
