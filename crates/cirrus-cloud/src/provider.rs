//! Cloud provider trait definition

use crate::error::Result;
use crate::instance::Instance;
use crate::options::CreateOptions;
use async_trait::async_trait;

/// Cloud provider abstraction trait
///
/// All cloud providers (AWS, Azure, etc.) implement this trait to provide a
/// unified interface for instance lifecycle management. Implementations are
/// behaviorally interchangeable: callers may not rely on anything beyond
/// this contract and their configuration.
#[async_trait]
pub trait CloudProvider: Send + Sync + std::fmt::Debug {
    /// Create a new virtual machine instance.
    ///
    /// `options` is a provider-interpreted bag; see [`CreateOptions`] for
    /// the cross-provider keys. Fails with a [`ProviderError`] when the
    /// underlying call fails or returns no instance data.
    ///
    /// [`ProviderError`]: crate::error::ProviderError
    async fn create_instance(
        &self,
        name: &str,
        instance_type: &str,
        options: &CreateOptions,
    ) -> Result<Instance>;

    /// Delete an instance by id.
    ///
    /// Returns `Ok(true)` when deletion was initiated or the instance was
    /// already absent: delete is idempotent, not-found is success.
    async fn delete_instance(&self, id: &str) -> Result<bool>;

    /// Look up one instance. `Ok(None)` when it does not exist; not-found
    /// is never an error.
    async fn get_instance(&self, id: &str) -> Result<Option<Instance>>;

    /// List every instance visible to the configured credentials, region or
    /// subscription. Empty when none.
    async fn list_instances(&self) -> Result<Vec<Instance>>;

    /// Constant provider identifier (e.g. "aws", "azure").
    fn provider_name(&self) -> &str;
}
