//! Normalized virtual machine representation
//!
//! Every adapter converts its native VM record into an [`Instance`] so that
//! callers never see provider-specific shapes. Instances are immutable
//! snapshots; a fresh one is built on every query.

use crate::error::InstanceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of an instance, normalized across providers.
///
/// Unrecognized native states map to `Unknown` rather than failing, so new
/// provider states degrade gracefully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// Instance is being provisioned or booted
    Starting,
    /// Instance is up
    Running,
    /// Instance is shutting down or deallocating
    Stopping,
    /// Instance is stopped or deallocated
    Stopped,
    /// Instance has been terminated
    Terminated,
    /// Native state did not map to any of the above
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceStatus::Starting => write!(f, "starting"),
            InstanceStatus::Running => write!(f, "running"),
            InstanceStatus::Stopping => write!(f, "stopping"),
            InstanceStatus::Stopped => write!(f, "stopped"),
            InstanceStatus::Terminated => write!(f, "terminated"),
            InstanceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One virtual machine, provider-agnostic.
///
/// The `id` format is opaque and differs per provider: AWS uses a flat
/// instance id, Azure a composite `"<resource-group>/<vm-name>"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub instance_type: String,
    pub status: InstanceStatus,
    pub provider: String,
    pub region: String,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Provider-specific extra fields; defaults to empty, never null.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Instance {
    /// Build an instance from the required fields, validating that none of
    /// the string fields is empty.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        instance_type: impl Into<String>,
        status: InstanceStatus,
        provider: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, InstanceError> {
        let instance = Self {
            id: id.into(),
            name: name.into(),
            instance_type: instance_type.into(),
            status,
            provider: provider.into(),
            region: region.into(),
            public_ip: None,
            private_ip: None,
            created_at: None,
            metadata: HashMap::new(),
        };
        instance.validate()?;
        Ok(instance)
    }

    fn validate(&self) -> Result<(), InstanceError> {
        if self.id.is_empty() {
            return Err(InstanceError::EmptyField("ID"));
        }
        if self.name.is_empty() {
            return Err(InstanceError::EmptyField("name"));
        }
        if self.instance_type.is_empty() {
            return Err(InstanceError::EmptyField("type"));
        }
        if self.provider.is_empty() {
            return Err(InstanceError::EmptyField("provider"));
        }
        if self.region.is_empty() {
            return Err(InstanceError::EmptyField("region"));
        }
        Ok(())
    }

    pub fn with_public_ip(mut self, ip: impl Into<String>) -> Self {
        self.public_ip = Some(ip.into());
        self
    }

    pub fn with_private_ip(mut self, ip: impl Into<String>) -> Self {
        self.private_ip = Some(ip.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_metadata_entry(
        mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn is_running(&self) -> bool {
        self.status == InstanceStatus::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.status == InstanceStatus::Stopped
    }

    pub fn is_terminated(&self) -> bool {
        self.status == InstanceStatus::Terminated
    }

    /// True while the instance is between steady states.
    pub fn is_transitioning(&self) -> bool {
        matches!(
            self.status,
            InstanceStatus::Starting | InstanceStatus::Stopping
        )
    }

    /// Display-friendly `"name (id)"` label.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }

    /// Primary address for reaching the instance: public IP when assigned,
    /// otherwise the private IP.
    pub fn endpoint(&self) -> Option<&str> {
        self.public_ip.as_deref().or(self.private_ip.as_deref())
    }

    /// Serialize to a JSON value, for logging and API responses.
    pub fn to_value(&self) -> serde_json::Value {
        // Serialization of these field types cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Decode an instance from a JSON value, re-running field validation.
    /// Unknown status strings decode to [`InstanceStatus::Unknown`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, InstanceError> {
        let instance: Instance =
            serde_json::from_value(value).map_err(|e| InstanceError::Decode(e.to_string()))?;
        instance.validate()?;
        Ok(instance)
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Instance({}, {}, {})",
            self.display_name(),
            self.status,
            self.provider
        )
    }
}
