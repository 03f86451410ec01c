//! Cirrus delivery packaging
//!
//! Produces the shippable project archive: a filtered walk of the project
//! tree written as a timestamped tar.gz, with a short delivery note. Build
//! output, dependency caches and local state never make it in.

pub mod error;
pub mod packager;

pub use error::{DeliveryError, Result};
pub use packager::{DeliveryManifest, DeliveryPackager};
