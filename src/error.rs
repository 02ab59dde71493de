//! Error types for quickstart-worker.

use thiserror::Error;

/// Error codes carried in failed invocation results.
pub mod error_codes {
    /// All handler slots are taken.
    pub const WORKER_BUSY: &str = "worker_busy";
    /// No function or step registered under the requested id.
    pub const FUNCTION_NOT_FOUND: &str = "function_not_found";
    /// The handler returned an error.
    pub const HANDLER_ERROR: &str = "handler_error";
}

/// Main error type for all worker operations.
///
/// Payload validation failures are not represented here: they are data
/// (see [`crate::validation::ValidationErrors`]) and travel back to the
/// caller as a normal invocation result.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// I/O error (signal handling).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The engine client reported an error.
    #[error("Engine error: {0}")]
    Engine(#[from] iii_sdk::Error),

    /// No function registered under the given path.
    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    /// A step tried to emit a topic missing from its `emits` list.
    #[error("Step {step} does not declare emitted topic {topic}")]
    UndeclaredEmit { step: String, topic: String },

    /// The engine answered a state request with an error.
    #[error("State error: {0}")]
    State(String),

    /// The engine did not answer a state request in time.
    #[error("State request timed out")]
    StateTimeout,

    /// Invalid worker configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine connection is not available.
    #[error("Connection closed")]
    ConnectionClosed,

    /// A handler failed for a reason other than payload validation.
    #[error("Handler error: {0}")]
    Handler(String),
}

impl WorkerError {
    /// Code reported to the engine when an invocation fails with this error.
    pub fn code(&self) -> &'static str {
        match self {
            WorkerError::FunctionNotFound(_) => error_codes::FUNCTION_NOT_FOUND,
            _ => error_codes::HANDLER_ERROR,
        }
    }
}

impl From<WorkerError> for iii_sdk::Error {
    fn from(err: WorkerError) -> Self {
        iii_sdk::Error::Remote {
            code: err.code().to_string(),
            message: err.to_string(),
            stacktrace: None,
        }
    }
}

/// Result type alias using WorkerError.
pub type Result<T> = std::result::Result<T, WorkerError>;
