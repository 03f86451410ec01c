//! Cloud provider error types

use thiserror::Error;

/// Unified error surfaced by every adapter and factory operation.
///
/// Underlying SDK or CLI failures never cross the trait boundary; adapters
/// translate them here, keeping the provider name and (when the remote side
/// supplies one) the native error code.
#[derive(Debug, Clone)]
pub struct ProviderError {
    message: String,
    provider: String,
    code: Option<String>,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            provider: provider.into(),
            code: None,
        }
    }

    /// Attach the native error code reported by the provider.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} | Provider: {}", self.message, self.provider)?;
        if let Some(code) = &self.code {
            write!(f, " | Error Code: {}", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {}

/// Validation errors raised when constructing or decoding an [`Instance`].
///
/// [`Instance`]: crate::instance::Instance
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstanceError {
    #[error("Instance {0} cannot be empty")]
    EmptyField(&'static str),

    #[error("Failed to decode instance: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
