// error.rs
//
// Validation errors stay on the form. Store errors become notices when a
// mutation is applied and never change the local list.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title must be at least 1 character long")]
    EmptyTitle,

    #[error("Description must be at least 1 character long")]
    EmptyDescription,

    #[error("Please enter a due date")]
    MissingDate,

    #[error("{0}")]
    InvalidDate(String),

    #[error("Due date cannot be in the past")]
    PastDate,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Item {id} not found")]
    NotFound { id: i64 },

    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
