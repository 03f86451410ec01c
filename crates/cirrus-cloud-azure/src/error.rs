//! Azure provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("az CLI not found. Please install the Azure CLI")]
    AzNotFound,

    #[error("az command failed: {stderr}")]
    CommandFailed { stderr: String },

    #[error("Azure subscription ID not found. Set AZURE_SUBSCRIPTION_ID or configure subscription_id")]
    MissingSubscription,

    #[error("Timed out after {0}s waiting for Azure operation")]
    Timeout(u64),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AzureError {
    /// Whether the failure means the target resource does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            AzureError::CommandFailed { stderr } => {
                stderr.contains("ResourceNotFound")
                    || stderr.contains("ResourceGroupNotFound")
                    || stderr.contains("was not found")
            }
            _ => false,
        }
    }

    /// Native error code, when the CLI reports one in the
    /// `ERROR: (SomeCode) message` form.
    pub fn error_code(&self) -> Option<String> {
        let AzureError::CommandFailed { stderr } = self else {
            return None;
        };
        let start = stderr.find('(')?;
        let end = stderr[start..].find(')')? + start;
        let code = &stderr[start + 1..end];
        if code.is_empty() || code.contains(char::is_whitespace) {
            return None;
        }
        Some(code.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AzureError>;
