//! Azure provider for Cirrus
//!
//! Implements the [`cirrus_cloud::CloudProvider`] contract over the Azure
//! CLI (`az ... -o json`), the same way the project wraps other vendor
//! tooling. VM identity is the composite `"<resource-group>/<vm-name>"`;
//! provisioning and power states are normalized into the shared status
//! model, and not-found responses become absent/success.

pub mod azcli;
pub mod error;
pub mod provider;

pub use azcli::{AzCli, CreateVmConfig, VmInfo};
pub use error::{AzureError, Result as AzureResult};
pub use provider::{AzureProvider, AzureProviderBuilder, PROVIDER};
