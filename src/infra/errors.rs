// src/infra/errors.rs — Error types for TaskMaster

use thiserror::Error;

/// Problems detected locally, before anything is sent to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("End time must be after start time")]
    EndNotAfterStart,

    #[error("Priority must be between 1 and 5")]
    PriorityOutOfRange(u8),
}

#[derive(Error, Debug)]
pub enum TaskMasterError {
    // Client-side errors (never reach the network)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // Remote errors
    #[error("Request failed ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Network error: {0}")]
    Network(String),

    // User errors
    #[error("Not logged in. Run `taskmaster login` first.")]
    NotAuthenticated,

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TaskMasterError>;

impl TaskMasterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskMasterError::NotFound { .. })
    }

    /// The most specific human-readable text for this error: the server's
    /// own message for remote failures, the display form otherwise.
    pub fn detail(&self) -> String {
        let text = match self {
            TaskMasterError::Remote { message, .. } | TaskMasterError::NotFound { message } => {
                message.clone()
            }
            TaskMasterError::Network(message) => message.clone(),
            other => other.to_string(),
        };
        if text.trim().is_empty() {
            "Failed to fetch data".to_string()
        } else {
            text
        }
    }
}
