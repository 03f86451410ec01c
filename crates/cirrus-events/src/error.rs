//! Event processing error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Event payload is missing required field: {0}")]
    MissingField(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Notifier delivery failures. These are logged and swallowed by the
/// processing path, never propagated out of a handler invocation.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to publish notification: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, EventError>;
