//! Per-call creation options
//!
//! A typed-access configuration bag. Recognized keys vary per adapter (AWS
//! reads `security_groups`, `key_name`, `subnet_id`, `user_data`; Azure
//! reads `resource_group`, `admin_username`, `admin_password`, `image`);
//! the wait keys below are honored by every adapter.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default bound for synchronous waits, in seconds.
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 300;

/// Options bag passed to [`CloudProvider::create_instance`].
///
/// [`CloudProvider::create_instance`]: crate::provider::CloudProvider::create_instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOptions {
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl CreateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, builder style. Values that fail to serialize are dropped.
    pub fn set(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.values.insert(key.into(), value);
        }
        self
    }

    /// Get an option value as a specific type.
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether the caller asked to block until the instance is up.
    pub fn wait_for_running(&self) -> bool {
        self.get("wait_for_running").unwrap_or(false)
    }

    /// Bound for synchronous waits. The underlying provider operation is
    /// abandoned with an error once this elapses.
    pub fn wait_timeout_secs(&self) -> u64 {
        self.get("wait_timeout_secs")
            .unwrap_or(DEFAULT_WAIT_TIMEOUT_SECS)
    }
}
