//! AWS provider for Cirrus
//!
//! Implements the [`cirrus_cloud::CloudProvider`] contract on top of the
//! AWS SDK for Rust (`aws-config` + `aws-sdk-ec2`). EC2 instance states are
//! normalized per the shared status model, "not found" is normalized to
//! absent/success, and all other SDK failures surface as
//! [`cirrus_cloud::ProviderError`] carrying the EC2 error code.

pub mod provider;

pub use provider::{AwsProvider, AwsProviderBuilder, PROVIDER};
