//! Azure provider implementation
//!
//! Maps Azure VM create/delete/show/list onto the [`CloudProvider`]
//! contract through the [`AzCli`] wrapper. Instance identity is the
//! composite `"<resource-group>/<vm-name>"`.

use crate::azcli::{AzCli, CreateVmConfig, VmInfo};
use crate::error::AzureError;
use async_trait::async_trait;
use cirrus_cloud::{
    CloudProvider, CreateOptions, Instance, InstanceStatus, ProviderBuilder, ProviderError,
    ProviderSettings, Result,
};
use serde_json::{Map, Value};
use std::time::Duration;

pub const PROVIDER: &str = "azure";

const DEFAULT_REGION: &str = "eastus";
const DEFAULT_RESOURCE_GROUP: &str = "default-rg";
const DEFAULT_ADMIN_USERNAME: &str = "azureuser";
const DEFAULT_IMAGE_URN: &str = "Canonical:0001-com-ubuntu-server-focal:20_04-lts-gen2:latest";

/// Azure adapter over the az CLI.
#[derive(Debug)]
pub struct AzureProvider {
    az: AzCli,
    region: String,
    subscription_id: String,
    instance_defaults: Map<String, Value>,
}

impl AzureProvider {
    /// Initialize from the provider configuration section.
    ///
    /// Requires a subscription id (settings key or `AZURE_SUBSCRIPTION_ID`).
    /// Never shells out: construction failures are configuration failures.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let subscription_id = settings
            .subscription_id
            .clone()
            .or_else(|| std::env::var("AZURE_SUBSCRIPTION_ID").ok())
            .ok_or_else(|| {
                ProviderError::new(PROVIDER, AzureError::MissingSubscription.to_string())
            })?;

        let region = settings
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        tracing::info!("Azure provider initialized for region: {}", region);
        Ok(Self {
            az: AzCli::new(subscription_id.clone()),
            region,
            subscription_id,
            instance_defaults: settings.instance_defaults.clone(),
        })
    }

    fn default_resource_group(&self) -> String {
        self.instance_defaults
            .get("resource_group")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_RESOURCE_GROUP)
            .to_string()
    }

    /// Split a composite id into resource group and VM name. Without a
    /// separator the resource group falls back to the configured default.
    fn parse_instance_id(&self, id: &str) -> (String, String) {
        match id.split_once('/') {
            Some((group, name)) => (group.to_string(), name.to_string()),
            None => (self.default_resource_group(), id.to_string()),
        }
    }

    /// Image URN for `az vm create`: a plain string is used as-is, an
    /// object contributes publisher/offer/sku/version parts.
    fn image_urn(&self, options: &CreateOptions) -> String {
        let image = options
            .get::<Value>("image")
            .or_else(|| self.instance_defaults.get("image").cloned());

        match image {
            Some(Value::String(urn)) => urn,
            Some(Value::Object(parts)) => {
                let part = |key: &str, fallback: &str| {
                    parts
                        .get(key)
                        .and_then(|v| v.as_str())
                        .unwrap_or(fallback)
                        .to_string()
                };
                format!(
                    "{}:{}:{}:{}",
                    part("publisher", "Canonical"),
                    part("offer", "0001-com-ubuntu-server-focal"),
                    part("sku", "20_04-lts-gen2"),
                    part("version", "latest"),
                )
            }
            _ => DEFAULT_IMAGE_URN.to_string(),
        }
    }

    async fn ensure_resource_group(&self, name: &str) -> Result<()> {
        let exists = self
            .az
            .group_exists(name)
            .await
            .map_err(|e| self.api_error("Failed to check resource group", e))?;
        if !exists {
            tracing::info!("Creating resource group: {}", name);
            self.az
                .create_group(name, &self.region)
                .await
                .map_err(|e| self.api_error("Failed to create resource group", e))?;
        }
        Ok(())
    }

    /// Build an instance from a VM record.
    fn to_instance(&self, vm: &VmInfo, resource_group: &str) -> Result<Instance> {
        let state = state_token(vm);
        let mut instance = Instance::new(
            format!("{}/{}", resource_group, vm.name),
            vm.name.clone(),
            vm.vm_size(),
            map_vm_state(&state),
            PROVIDER,
            vm.location.clone().unwrap_or_else(|| self.region.clone()),
        )
        .map_err(|e| ProviderError::new(PROVIDER, e.to_string()))?
        .with_metadata_entry("resource_group", Value::from(resource_group))
        .with_metadata_entry("provisioning_state", Value::from(state))
        .with_metadata_entry("subscription_id", Value::from(self.subscription_id.clone()));

        if let Some(ip) = VmInfo::first_ip(&vm.public_ips) {
            instance = instance.with_public_ip(ip);
        }
        if let Some(ip) = VmInfo::first_ip(&vm.private_ips) {
            instance = instance.with_private_ip(ip);
        }
        if let Some(created) = vm.time_created {
            instance = instance.with_created_at(created);
        }

        Ok(instance)
    }

    /// Instance for a create that did not wait: only the request fields are
    /// known, the IPs would require a further query that is not performed.
    fn partial_instance(
        &self,
        name: &str,
        instance_type: &str,
        resource_group: &str,
    ) -> Result<Instance> {
        Ok(Instance::new(
            format!("{}/{}", resource_group, name),
            name,
            instance_type,
            InstanceStatus::Starting,
            PROVIDER,
            self.region.clone(),
        )
        .map_err(|e| ProviderError::new(PROVIDER, e.to_string()))?
        .with_metadata_entry("resource_group", Value::from(resource_group))
        .with_metadata_entry("subscription_id", Value::from(self.subscription_id.clone())))
    }

    fn api_error(&self, action: &str, err: AzureError) -> ProviderError {
        tracing::error!("{}: {}", action, err);
        let error = ProviderError::new(PROVIDER, format!("{}: {}", action, err));
        match err.error_code() {
            Some(code) => error.with_code(code),
            None => error,
        }
    }
}

#[async_trait]
impl CloudProvider for AzureProvider {
    async fn create_instance(
        &self,
        name: &str,
        instance_type: &str,
        options: &CreateOptions,
    ) -> Result<Instance> {
        let resource_group = options
            .get::<String>("resource_group")
            .unwrap_or_else(|| self.default_resource_group());

        self.ensure_resource_group(&resource_group).await?;

        let wait = options.get::<bool>("wait_for_completion").unwrap_or(false);
        let config = CreateVmConfig {
            name: name.to_string(),
            resource_group: resource_group.clone(),
            size: instance_type.to_string(),
            location: self.region.clone(),
            image: self.image_urn(options),
            admin_username: options
                .get::<String>("admin_username")
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            admin_password: options.get::<String>("admin_password"),
            no_wait: !wait,
        };

        tracing::info!("Creating Azure VM '{}' with size '{}'", name, instance_type);

        if wait {
            let timeout = options.wait_timeout_secs();
            match tokio::time::timeout(Duration::from_secs(timeout), self.az.create_vm(&config))
                .await
            {
                Ok(result) => {
                    result.map_err(|e| self.api_error("Failed to create Azure VM", e))?;
                }
                Err(_) => {
                    return Err(self
                        .api_error("Failed to create Azure VM", AzureError::Timeout(timeout)));
                }
            }
            // The create summary is a different shape from the VM view;
            // fetch the authoritative record now that the VM exists.
            match self.az.show_vm(&resource_group, name).await {
                Ok(vm) => {
                    tracing::info!("Successfully created Azure VM: {}", name);
                    return self.to_instance(&vm, &resource_group);
                }
                Err(e) => {
                    tracing::warn!("Created VM {} but could not fetch it: {}", name, e);
                }
            }
        } else {
            self.az
                .create_vm(&config)
                .await
                .map_err(|e| self.api_error("Failed to create Azure VM", e))?;
        }

        tracing::info!("Successfully initiated Azure VM creation: {}", name);
        self.partial_instance(name, instance_type, &resource_group)
    }

    async fn delete_instance(&self, id: &str) -> Result<bool> {
        let (resource_group, vm_name) = self.parse_instance_id(id);

        tracing::info!("Deleting Azure VM: {}", vm_name);

        match self.az.delete_vm(&resource_group, &vm_name).await {
            Ok(()) => {
                tracing::info!("VM {} deletion initiated successfully", vm_name);
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("VM {} not found (already deleted?)", id);
                Ok(true)
            }
            Err(e) => Err(self.api_error("Failed to delete Azure VM", e)),
        }
    }

    async fn get_instance(&self, id: &str) -> Result<Option<Instance>> {
        let (resource_group, vm_name) = self.parse_instance_id(id);

        match self.az.show_vm(&resource_group, &vm_name).await {
            Ok(vm) => Ok(Some(self.to_instance(&vm, &resource_group)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(self.api_error("Failed to get Azure VM info", e)),
        }
    }

    async fn list_instances(&self) -> Result<Vec<Instance>> {
        let vms = self
            .az
            .list_vms()
            .await
            .map_err(|e| self.api_error("Failed to list Azure VMs", e))?;

        let mut instances = Vec::new();
        for vm in &vms {
            let resource_group = vm
                .id
                .as_deref()
                .and_then(extract_resource_group)
                .or_else(|| vm.resource_group.clone())
                .unwrap_or_else(|| "unknown".to_string());
            instances.push(self.to_instance(vm, &resource_group)?);
        }

        tracing::info!("Retrieved {} Azure VMs", instances.len());
        Ok(instances)
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }
}

/// Registry builder for the Azure adapter.
pub struct AzureProviderBuilder;

#[async_trait]
impl ProviderBuilder for AzureProviderBuilder {
    async fn build(&self, settings: &ProviderSettings) -> Result<Box<dyn CloudProvider>> {
        Ok(Box::new(AzureProvider::from_settings(settings)?))
    }
}

/// State token fed to the status table. Provisioning states that describe
/// an in-flight operation win; otherwise the `-d` power state
/// (`"VM running"`) is normalized to its bare token (`"Running"`).
fn state_token(vm: &VmInfo) -> String {
    if let Some(state) = &vm.provisioning_state {
        if matches!(state.as_str(), "Creating" | "Deleting" | "Failed") {
            return state.clone();
        }
    }
    if let Some(power) = &vm.power_state {
        let token = power.strip_prefix("VM ").unwrap_or(power);
        return capitalize(token);
    }
    vm.provisioning_state
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}

/// Azure VM state tokens onto the normalized status.
fn map_vm_state(state: &str) -> InstanceStatus {
    match state {
        "Creating" => InstanceStatus::Starting,
        "Running" => InstanceStatus::Running,
        "Stopping" => InstanceStatus::Stopping,
        "Deallocating" => InstanceStatus::Stopping,
        "Stopped" => InstanceStatus::Stopped,
        "Deallocated" => InstanceStatus::Stopped,
        "Deleting" => InstanceStatus::Terminated,
        _ => InstanceStatus::Unknown,
    }
}

/// Resource group from an ARM resource id
/// (`/subscriptions/{sub}/resourceGroups/{rg}/providers/...`).
fn extract_resource_group(resource_id: &str) -> Option<String> {
    let mut parts = resource_id.split('/');
    while let Some(part) = parts.next() {
        if part.eq_ignore_ascii_case("resourceGroups") {
            return parts.next().map(str::to_string);
        }
    }
    None
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> AzureProvider {
        let settings = ProviderSettings {
            region: Some("eastus".to_string()),
            subscription_id: Some("0000-1111".to_string()),
            ..ProviderSettings::default()
        };
        AzureProvider::from_settings(&settings).unwrap()
    }

    fn vm(provisioning: Option<&str>, power: Option<&str>) -> VmInfo {
        serde_json::from_value(serde_json::json!({
            "name": "web-01",
            "provisioningState": provisioning,
            "powerState": power,
        }))
        .unwrap()
    }

    #[test]
    fn test_status_mapping_table() {
        assert_eq!(map_vm_state("Creating"), InstanceStatus::Starting);
        assert_eq!(map_vm_state("Running"), InstanceStatus::Running);
        assert_eq!(map_vm_state("Stopping"), InstanceStatus::Stopping);
        assert_eq!(map_vm_state("Deallocating"), InstanceStatus::Stopping);
        assert_eq!(map_vm_state("Stopped"), InstanceStatus::Stopped);
        assert_eq!(map_vm_state("Deallocated"), InstanceStatus::Stopped);
        assert_eq!(map_vm_state("Deleting"), InstanceStatus::Terminated);
        assert_eq!(map_vm_state("Succeeded"), InstanceStatus::Unknown);
        assert_eq!(map_vm_state("running"), InstanceStatus::Unknown);
    }

    #[test]
    fn test_state_token_prefers_in_flight_provisioning() {
        assert_eq!(state_token(&vm(Some("Creating"), Some("VM running"))), "Creating");
        assert_eq!(state_token(&vm(Some("Deleting"), Some("VM running"))), "Deleting");
        assert_eq!(state_token(&vm(Some("Succeeded"), Some("VM running"))), "Running");
        assert_eq!(
            state_token(&vm(Some("Succeeded"), Some("VM deallocated"))),
            "Deallocated"
        );
        assert_eq!(state_token(&vm(Some("Succeeded"), None)), "Succeeded");
        assert_eq!(state_token(&vm(None, None)), "unknown");
    }

    #[test]
    fn test_parse_instance_id() {
        let provider = provider();
        assert_eq!(
            provider.parse_instance_id("demo-rg/web-01"),
            ("demo-rg".to_string(), "web-01".to_string())
        );
        // Only the first separator splits; VM names keep the rest.
        assert_eq!(
            provider.parse_instance_id("demo-rg/web/01"),
            ("demo-rg".to_string(), "web/01".to_string())
        );
        assert_eq!(
            provider.parse_instance_id("web-01"),
            ("default-rg".to_string(), "web-01".to_string())
        );
    }

    #[test]
    fn test_extract_resource_group() {
        assert_eq!(
            extract_resource_group(
                "/subscriptions/0000/resourceGroups/demo-rg/providers/Microsoft.Compute/virtualMachines/web-01"
            )
            .as_deref(),
            Some("demo-rg")
        );
        assert_eq!(extract_resource_group("/subscriptions/0000"), None);
    }

    #[test]
    fn test_missing_subscription_is_construction_error() {
        temp_env::with_var_removed("AZURE_SUBSCRIPTION_ID", || {
            let err = AzureProvider::from_settings(&ProviderSettings::default()).unwrap_err();
            assert!(err.to_string().contains("subscription"));
            assert_eq!(err.provider(), "azure");
        });
    }

    #[test]
    fn test_subscription_from_env() {
        temp_env::with_var("AZURE_SUBSCRIPTION_ID", Some("env-sub"), || {
            let provider = AzureProvider::from_settings(&ProviderSettings::default()).unwrap();
            assert_eq!(provider.subscription_id, "env-sub");
        });
    }

    #[test]
    fn test_to_instance_composite_id_and_ips() {
        let provider = provider();
        let vm: VmInfo = serde_json::from_value(serde_json::json!({
            "name": "web-01",
            "location": "westeurope",
            "hardwareProfile": { "vmSize": "Standard_B1s" },
            "provisioningState": "Succeeded",
            "powerState": "VM running",
            "publicIps": "52.170.1.10",
            "privateIps": "10.0.0.4"
        }))
        .unwrap();

        let instance = provider.to_instance(&vm, "demo-rg").unwrap();
        assert_eq!(instance.id, "demo-rg/web-01");
        assert_eq!(instance.instance_type, "Standard_B1s");
        assert_eq!(instance.status, InstanceStatus::Running);
        assert_eq!(instance.region, "westeurope");
        assert_eq!(instance.endpoint(), Some("52.170.1.10"));
        assert_eq!(
            instance.metadata.get("resource_group"),
            Some(&Value::from("demo-rg"))
        );
    }

    #[test]
    fn test_partial_instance_has_no_ips() {
        let provider = provider();
        let instance = provider
            .partial_instance("web-01", "Standard_B1s", "demo-rg")
            .unwrap();
        assert_eq!(instance.id, "demo-rg/web-01");
        assert_eq!(instance.status, InstanceStatus::Starting);
        assert_eq!(instance.endpoint(), None);
        assert_eq!(instance.region, "eastus");
    }

    #[test]
    fn test_image_urn_sources() {
        let provider = provider();

        let plain = CreateOptions::new().set("image", "Debian:debian-12:12:latest");
        assert_eq!(provider.image_urn(&plain), "Debian:debian-12:12:latest");

        let parts = CreateOptions::new().set(
            "image",
            serde_json::json!({ "publisher": "Debian", "offer": "debian-12", "sku": "12" }),
        );
        assert_eq!(provider.image_urn(&parts), "Debian:debian-12:12:latest");

        assert_eq!(provider.image_urn(&CreateOptions::new()), DEFAULT_IMAGE_URN);
    }
}
