//! Provider configuration settings
//!
//! The shapes the configuration layer hands to the factory. The providers
//! map is ordered: "first configured provider" semantics depend on it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `providers` configuration section, keyed by provider-type name,
/// in configuration order.
pub type ProviderSettingsMap = IndexMap<String, ProviderSettings>;

/// Settings for one configured provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Region (AWS) or location (Azure); adapters apply their own default
    /// when absent.
    #[serde(default)]
    pub region: Option<String>,

    /// Marks this provider as the one `create_default_provider` picks.
    #[serde(default)]
    pub default: bool,

    /// Azure subscription id.
    #[serde(default)]
    pub subscription_id: Option<String>,

    /// Credential source selection.
    #[serde(default)]
    pub credentials: Option<CredentialSettings>,

    /// Adapter-level defaults merged under per-call options
    /// (AWS: ami_id, security_groups, key_pair, subnet_id;
    /// Azure: resource_group, image).
    #[serde(default)]
    pub instance_defaults: Map<String, Value>,

    /// Any further provider-specific keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProviderSettings {
    /// Typed access to an `instance_defaults` entry.
    pub fn instance_default<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.instance_defaults
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// How an adapter should source credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSettings {
    #[serde(rename = "type", default = "default_credential_kind")]
    pub kind: String,
}

fn default_credential_kind() -> String {
    "environment".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_provider_section() {
        let yaml_equivalent = serde_json::json!({
            "region": "us-east-1",
            "default": true,
            "instance_defaults": {
                "ami_id": "ami-0c02fb55956c7d316",
                "security_groups": ["web"]
            },
            "profile": "sandbox"
        });

        let settings: ProviderSettings = serde_json::from_value(yaml_equivalent).unwrap();
        assert_eq!(settings.region.as_deref(), Some("us-east-1"));
        assert!(settings.default);
        assert_eq!(
            settings.instance_default::<String>("ami_id").as_deref(),
            Some("ami-0c02fb55956c7d316")
        );
        assert_eq!(
            settings.extra.get("profile"),
            Some(&serde_json::json!("sandbox"))
        );
    }

    #[test]
    fn test_settings_map_preserves_order() {
        let json = r#"{"azure": {}, "aws": {}}"#;
        let map: ProviderSettingsMap = serde_json::from_str(json).unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["azure", "aws"]);
    }
}
