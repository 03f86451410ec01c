//! Cirrus cloud provider abstraction
//!
//! This crate defines the provider-agnostic instance model and the
//! [`CloudProvider`] contract, plus the registry-based factory that builds
//! adapters from configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Cirrus CLI                      │
//! │         (composition root, owns registry)        │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                cirrus-cloud                      │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │         Provider Abstraction              │   │
//! │  │  trait CloudProvider { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────────────┐     │
//! │  │   Instance   │  │  ProviderRegistry    │     │
//! │  │    model     │  │     (factory)        │     │
//! │  └──────────────┘  └──────────────────────┘     │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │     aws       │ │     azure     │
//! │   provider    │ │   provider    │
//! └───────────────┘ └───────────────┘
//! ```
//!
//! Adapters normalize native VM records into [`Instance`] values and native
//! failures into [`ProviderError`]; "not found" is normalized to
//! `Ok(None)` on get and `Ok(true)` on delete, never an error.

pub mod error;
pub mod factory;
pub mod instance;
pub mod options;
pub mod provider;
pub mod settings;

// Re-exports
pub use error::{InstanceError, ProviderError, Result};
pub use factory::{ProviderBuilder, ProviderRegistry};
pub use instance::{Instance, InstanceStatus};
pub use options::{CreateOptions, DEFAULT_WAIT_TIMEOUT_SECS};
pub use provider::CloudProvider;
pub use settings::{CredentialSettings, ProviderSettings, ProviderSettingsMap};
