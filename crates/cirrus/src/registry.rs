//! Built-in provider registration
//!
//! The registry lives here, in the composition root: whoever needs
//! providers builds one of these and owns it.

use cirrus_cloud::{ProviderRegistry, Result};
use cirrus_cloud_aws::AwsProviderBuilder;
use cirrus_cloud_azure::AzureProviderBuilder;
use std::sync::Arc;

/// Registry with the built-in AWS and Azure adapters. Further provider
/// types can be registered on the returned value.
pub fn default_registry() -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    registry.register(cirrus_cloud_aws::PROVIDER, Arc::new(AwsProviderBuilder))?;
    registry.register(cirrus_cloud_azure::PROVIDER, Arc::new(AzureProviderBuilder))?;
    Ok(registry)
}
