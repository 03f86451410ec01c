//! Provider registry and factory
//!
//! The registry is a plain value owned by whichever component wires the
//! application together (the CLI, a test harness); there is no process-wide
//! provider table. Builders for new provider types can be registered at
//! runtime.

use crate::error::{ProviderError, Result};
use crate::provider::CloudProvider;
use crate::settings::{ProviderSettings, ProviderSettingsMap};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;

const FACTORY: &str = "factory";

/// Constructs one [`CloudProvider`] from its configuration section.
///
/// Construction is async because some adapters load SDK configuration;
/// builders should validate settings but avoid remote calls.
#[async_trait]
pub trait ProviderBuilder: Send + Sync {
    async fn build(&self, settings: &ProviderSettings) -> Result<Box<dyn CloudProvider>>;
}

/// Mapping from provider-type name to builder.
#[derive(Default)]
pub struct ProviderRegistry {
    builders: IndexMap<String, Arc<dyn ProviderBuilder>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builder under a type name. Names are matched
    /// case/whitespace-insensitively; a duplicate registration overwrites
    /// the previous builder with a warning.
    pub fn register(
        &mut self,
        provider_type: impl Into<String>,
        builder: Arc<dyn ProviderBuilder>,
    ) -> Result<()> {
        let provider_type = normalize(&provider_type.into());
        if provider_type.is_empty() {
            return Err(ProviderError::new(
                FACTORY,
                "Provider type must be a non-empty string",
            ));
        }

        if self.builders.contains_key(&provider_type) {
            tracing::warn!("Overriding existing provider: {}", provider_type);
        } else {
            tracing::debug!("Registering provider: {}", provider_type);
        }
        self.builders.insert(provider_type, builder);
        Ok(())
    }

    /// Registered provider-type names, in registration order.
    pub fn available_providers(&self) -> Vec<&str> {
        self.builders.keys().map(String::as_str).collect()
    }

    pub fn is_registered(&self, provider_type: &str) -> bool {
        self.builders.contains_key(&normalize(provider_type))
    }

    /// Build one provider of the given type from the `providers`
    /// configuration section.
    pub async fn create_provider(
        &self,
        provider_type: &str,
        providers: &ProviderSettingsMap,
    ) -> Result<Box<dyn CloudProvider>> {
        let provider_type = normalize(provider_type);
        tracing::info!("Creating provider of type: {}", provider_type);

        if provider_type.is_empty() {
            return Err(ProviderError::new(FACTORY, "Provider type cannot be empty"));
        }

        let builder = self.builders.get(&provider_type).ok_or_else(|| {
            ProviderError::new(
                FACTORY,
                format!(
                    "Unsupported provider type '{}'. Available providers: {}",
                    provider_type,
                    self.available_providers().join(", ")
                ),
            )
        })?;

        if providers.is_empty() {
            return Err(ProviderError::new(FACTORY, "Configuration cannot be empty"));
        }

        let fallback;
        let settings = match providers.get(&provider_type) {
            Some(settings) => settings,
            None => {
                tracing::warn!(
                    "No specific configuration found for provider '{}', using defaults",
                    provider_type
                );
                fallback = ProviderSettings::default();
                &fallback
            }
        };

        let provider = builder.build(settings).await.map_err(|e| {
            let wrapped = ProviderError::new(
                provider_type.clone(),
                format!("Failed to create {} provider: {}", provider_type, e.message()),
            );
            match e.code() {
                Some(code) => wrapped.with_code(code),
                None => wrapped,
            }
        })?;

        tracing::info!("Successfully created {} provider", provider_type);
        Ok(provider)
    }

    /// Build the provider flagged `default: true`, or the first configured
    /// one (with a warning) when none is flagged.
    pub async fn create_default_provider(
        &self,
        providers: &ProviderSettingsMap,
    ) -> Result<Box<dyn CloudProvider>> {
        let default_type = providers
            .iter()
            .find(|(_, settings)| settings.default)
            .map(|(name, _)| name.clone())
            .or_else(|| {
                let first = providers.keys().next().cloned();
                if let Some(name) = &first {
                    tracing::warn!(
                        "No default provider specified, using first available: {}",
                        name
                    );
                }
                first
            })
            .ok_or_else(|| ProviderError::new(FACTORY, "No providers configured"))?;

        tracing::info!("Using default provider: {}", default_type);
        self.create_provider(&default_type, providers).await
    }

    /// Build every configured provider, tolerating individual failures.
    ///
    /// Fails only when all of them fail, with the per-provider messages
    /// aggregated into one error.
    pub async fn create_multi_provider(
        &self,
        providers: &ProviderSettingsMap,
    ) -> Result<IndexMap<String, Box<dyn CloudProvider>>> {
        if providers.is_empty() {
            return Err(ProviderError::new(FACTORY, "No providers configured"));
        }

        let mut built = IndexMap::new();
        let mut errors = Vec::new();

        for provider_type in providers.keys() {
            match self.create_provider(provider_type, providers).await {
                Ok(provider) => {
                    built.insert(normalize(provider_type), provider);
                }
                Err(e) => {
                    let message = format!("Failed to create provider '{}': {}", provider_type, e);
                    tracing::error!("{}", message);
                    errors.push(message);
                }
            }
        }

        if built.is_empty() && !errors.is_empty() {
            return Err(ProviderError::new(
                FACTORY,
                format!("Failed to create any providers. Errors: {}", errors.join("; ")),
            ));
        }

        if !errors.is_empty() {
            tracing::warn!("Some providers failed to initialize: {}", errors.join("; "));
        }

        tracing::info!("Created {} providers successfully", built.len());
        Ok(built)
    }
}

fn normalize(provider_type: &str) -> String {
    provider_type.trim().to_ascii_lowercase()
}
