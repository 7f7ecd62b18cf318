//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Transport-level provider failure (connect, timeout, undecodable body)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider answered with a non-success status
    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Tool call arguments were not well-formed JSON
    #[error("Invalid arguments for action '{action}': {source}")]
    ArgumentParse {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    /// Action handler failed
    #[error("Action execution error: {0}")]
    ActionExecution(String),

    /// Action not found in registry
    #[error("Action not found: {0}")]
    ActionNotFound(String),

    /// The model kept requesting actions past the configured ceiling
    #[error("Too many tool hops (max {0})")]
    TooManyToolHops(usize),

    /// Request rejected before it reached the provider
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Turn-level failure. Always wraps the error that ended the turn.
    #[error("Failed to generate chat response")]
    GenerationFailed {
        #[source]
        source: Box<AgentError>,
    },

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

/// Coarse error category, stable across the turn-level wrapper
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Provider,
    Parse,
    Action,
    ToolHops,
    Config,
    Other,
}

impl AgentError {
    /// Wrap an error at the turn boundary. Already-wrapped errors pass through.
    pub fn generation_failed(err: Self) -> Self {
        match err {
            err @ Self::GenerationFailed { .. } => err,
            err => Self::GenerationFailed {
                source: Box::new(err),
            },
        }
    }

    /// The innermost error, looking through `GenerationFailed`
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::GenerationFailed { source } => source.root_cause(),
            other => other,
        }
    }

    /// Category of the underlying failure
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Self::Provider(_) | Self::Api { .. } | Self::Auth(_) | Self::RateLimited(_) => {
                ErrorKind::Provider
            }
            Self::ArgumentParse { .. } | Self::Json(_) => ErrorKind::Parse,
            Self::ActionExecution(_) | Self::ActionNotFound(_) => ErrorKind::Action,
            Self::TooManyToolHops(_) => ErrorKind::ToolHops,
            Self::InvalidRequest(_) | Self::Config(_) => ErrorKind::Config,
            Self::GenerationFailed { .. } | Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self.root_cause() {
            Self::Provider(_) | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self.root_cause() {
            Self::Provider(_) => "The AI service is currently unavailable. Please try again.".into(),
            Self::Api { status, .. } => format!("The AI service returned an error (HTTP {status})."),
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            Self::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            Self::ArgumentParse { action, .. } => {
                format!("The model sent invalid arguments for '{action}'.")
            }
            Self::ActionExecution(msg) => format!("Action error: {msg}"),
            Self::ActionNotFound(name) => format!("The action '{name}' is not available."),
            Self::TooManyToolHops(_) => {
                "The request took too many steps to process. Please try a simpler query.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
