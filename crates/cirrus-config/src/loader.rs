//! YAML configuration pipeline
//!
//! Load order: parse YAML, apply `environments.<env>` overrides (deep
//! merge), expand `${VAR}` references in string scalars, then deserialize
//! and validate. The providers map keeps file order; default-provider
//! selection depends on it.

use crate::error::{ConfigError, Result};
use cirrus_cloud::{ProviderSettings, ProviderSettingsMap};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;

/// Environment variables consulted to auto-detect the deployment
/// environment, in priority order.
const ENV_VAR_CANDIDATES: &[&str] = &["CIRRUS_ENV", "ENVIRONMENT", "ENV", "STAGE"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CirrusConfig {
    /// Provider sections, in file order.
    pub providers: ProviderSettingsMap,

    #[serde(default)]
    pub app: AppConfig,
}

impl CirrusConfig {
    /// Settings for one configured provider.
    pub fn provider(&self, name: &str) -> Result<&ProviderSettings> {
        self.providers.get(name).ok_or_else(|| {
            ConfigError::UnknownProvider(
                name.to_string(),
                self.providers.keys().cloned().collect::<Vec<_>>().join(", "),
            )
        })
    }
}

/// Application-level settings with serde-supplied defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub enable_file_logging: bool,
    pub log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_file_logging: false,
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub max_retries: u32,
    pub retry_backoff_factor: f64,
    pub request_timeout_secs: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff_factor: 2.0,
            request_timeout_secs: 60,
        }
    }
}

/// Load configuration from a YAML file.
pub fn load_from_path(path: impl AsRef<Path>, environment: Option<&str>) -> Result<CirrusConfig> {
    let path = path.as_ref();
    tracing::info!("Loading configuration from: {}", path.display());

    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&content)?;
    load_from_value(value, environment)
}

/// Load configuration from an already-parsed YAML value.
pub fn load_from_value(mut value: Value, environment: Option<&str>) -> Result<CirrusConfig> {
    if !matches!(value, Value::Mapping(ref m) if !m.is_empty()) {
        return Err(ConfigError::EmptyConfig);
    }

    let environment = environment
        .map(str::to_string)
        .or_else(detect_environment);
    if let Some(environment) = &environment {
        apply_environment_overrides(&mut value, environment);
    }

    expand_env_vars(&mut value);

    let Value::Mapping(mapping) = &value else {
        return Err(ConfigError::EmptyConfig);
    };
    if !mapping.contains_key(&Value::from("providers")) {
        return Err(ConfigError::MissingSection("providers"));
    }

    let config: CirrusConfig = serde_yaml::from_value(value)?;

    if config.providers.is_empty() {
        return Err(ConfigError::InvalidSection {
            section: "providers",
            reason: "at least one provider must be configured".to_string(),
        });
    }

    tracing::debug!(
        "Loaded configuration with {} providers",
        config.providers.len()
    );
    Ok(config)
}

/// Auto-detect the environment from well-known variables.
fn detect_environment() -> Option<String> {
    for candidate in ENV_VAR_CANDIDATES {
        if let Ok(value) = std::env::var(candidate) {
            if !value.is_empty() {
                let value = value.to_lowercase();
                tracing::info!("Detected environment '{}' from {}", value, candidate);
                return Some(value);
            }
        }
    }
    None
}

/// Deep-merge `environments.<env>` over the root, then drop the
/// `environments` section.
fn apply_environment_overrides(value: &mut Value, environment: &str) {
    let Value::Mapping(root) = value else {
        return;
    };

    let Some(Value::Mapping(environments)) = root.remove(&Value::from("environments")) else {
        return;
    };

    let Some(overrides) = environments.get(&Value::from(environment)) else {
        tracing::debug!("No overrides found for environment: {}", environment);
        return;
    };

    tracing::info!("Applying environment overrides for: {}", environment);
    deep_merge(value, overrides.clone());
}

/// Merge `overlay` into `base`: mappings merge recursively, everything else
/// is replaced by the overlay value.
fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Expand `${VAR}` references in string scalars, recursively. Unset
/// variables are left as written.
fn expand_env_vars(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.contains("${") {
                *s = expand_string(s);
            }
        }
        Value::Mapping(mapping) => {
            for (_, v) in mapping.iter_mut() {
                expand_env_vars(v);
            }
        }
        Value::Sequence(items) => {
            for item in items.iter_mut() {
                expand_env_vars(item);
            }
        }
        _ => {}
    }
}

fn expand_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) => output.push_str(&value),
                    Err(_) => {
                        output.push_str("${");
                        output.push_str(name);
                        output.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                output.push_str(&rest[start..]);
                return output;
            }
        }
    }

    output.push_str(rest);
    output
}
