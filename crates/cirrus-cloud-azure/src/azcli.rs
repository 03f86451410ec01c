//! az CLI wrapper
//!
//! Wraps the Azure CLI for VM and resource-group operations. Every call
//! runs `az ... -o json` scoped to one subscription and parses the output
//! with serde; stderr travels inside [`AzureError::CommandFailed`] so the
//! provider layer can classify not-found responses.

use crate::error::{AzureError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;

/// az CLI wrapper bound to a subscription.
#[derive(Debug)]
pub struct AzCli {
    subscription: String,
}

impl AzCli {
    pub fn new(subscription: impl Into<String>) -> Self {
        Self {
            subscription: subscription.into(),
        }
    }

    /// Run an az command and return stdout.
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("az");
        cmd.args(args);
        cmd.arg("--subscription").arg(&self.subscription);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: az {}", args.join(" "));

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AzureError::AzNotFound
            } else {
                AzureError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AzureError::CommandFailed {
                stderr: stderr.to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Whether a resource group exists.
    pub async fn group_exists(&self, name: &str) -> Result<bool> {
        let output = self.run_command(&["group", "exists", "--name", name]).await?;
        Ok(output.trim() == "true")
    }

    /// Create a resource group.
    pub async fn create_group(&self, name: &str, location: &str) -> Result<()> {
        self.run_command(&[
            "group",
            "create",
            "--name",
            name,
            "--location",
            location,
            "--tags",
            "CreatedBy=cirrus",
            "Provider=azure",
            "-o",
            "json",
        ])
        .await?;
        Ok(())
    }

    /// Create a VM. Returns `None` when `no_wait` is set: az prints nothing
    /// useful before the operation completes.
    pub async fn create_vm(&self, config: &CreateVmConfig) -> Result<Option<serde_json::Value>> {
        let mut args = vec![
            "vm",
            "create",
            "--resource-group",
            config.resource_group.as_str(),
            "--name",
            config.name.as_str(),
            "--image",
            config.image.as_str(),
            "--size",
            config.size.as_str(),
            "--location",
            config.location.as_str(),
            "--admin-username",
            config.admin_username.as_str(),
            "--tags",
        ];
        let name_tag = format!("Name={}", config.name);
        args.push(name_tag.as_str());
        args.push("CreatedBy=cirrus");
        args.push("Provider=azure");

        if let Some(ref password) = config.admin_password {
            args.push("--admin-password");
            args.push(password.as_str());
        } else {
            args.push("--generate-ssh-keys");
        }

        if config.no_wait {
            args.push("--no-wait");
        }
        args.push("-o");
        args.push("json");

        let output = self.run_command(&args).await?;
        if config.no_wait || output.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&output)?))
    }

    /// Delete a VM. Initiation only; the call does not wait.
    pub async fn delete_vm(&self, resource_group: &str, name: &str) -> Result<()> {
        self.run_command(&[
            "vm",
            "delete",
            "--resource-group",
            resource_group,
            "--name",
            name,
            "--yes",
            "--no-wait",
        ])
        .await?;
        Ok(())
    }

    /// Fetch one VM with the instance view (power state, IPs).
    pub async fn show_vm(&self, resource_group: &str, name: &str) -> Result<VmInfo> {
        let output = self
            .run_command(&[
                "vm",
                "show",
                "--resource-group",
                resource_group,
                "--name",
                name,
                "-d",
                "-o",
                "json",
            ])
            .await?;
        let vm: VmInfo = serde_json::from_str(&output)?;
        Ok(vm)
    }

    /// List every VM in the subscription, across resource groups.
    pub async fn list_vms(&self) -> Result<Vec<VmInfo>> {
        let output = self
            .run_command(&["vm", "list", "--all", "-d", "-o", "json"])
            .await?;

        if output.trim().is_empty() || output.trim() == "[]" {
            return Ok(Vec::new());
        }

        let vms: Vec<VmInfo> = serde_json::from_str(&output)?;
        Ok(vms)
    }
}

/// Parameters for `az vm create`.
#[derive(Debug, Clone)]
pub struct CreateVmConfig {
    pub name: String,
    pub resource_group: String,
    pub size: String,
    pub location: String,
    pub image: String,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub no_wait: bool,
}

/// VM record as printed by `az vm show -d` / `az vm list -d`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmInfo {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub resource_group: Option<String>,
    #[serde(default)]
    pub hardware_profile: Option<HardwareProfile>,
    #[serde(default)]
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub power_state: Option<String>,
    #[serde(default)]
    pub public_ips: Option<String>,
    #[serde(default)]
    pub private_ips: Option<String>,
    #[serde(default)]
    pub time_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    #[serde(default)]
    pub vm_size: Option<String>,
}

impl VmInfo {
    pub fn vm_size(&self) -> &str {
        self.hardware_profile
            .as_ref()
            .and_then(|p| p.vm_size.as_deref())
            .unwrap_or("unknown")
    }

    /// First address from an az comma-separated IP list.
    pub fn first_ip(list: &Option<String>) -> Option<String> {
        list.as_deref()?
            .split(',')
            .map(str::trim)
            .find(|ip| !ip.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_OUTPUT: &str = r#"{
        "id": "/subscriptions/0000/resourceGroups/demo-rg/providers/Microsoft.Compute/virtualMachines/web-01",
        "name": "web-01",
        "location": "eastus",
        "resourceGroup": "demo-rg",
        "hardwareProfile": { "vmSize": "Standard_B1s" },
        "provisioningState": "Succeeded",
        "powerState": "VM running",
        "publicIps": "52.170.1.10",
        "privateIps": "10.0.0.4,10.0.0.5",
        "timeCreated": "2025-06-01T12:30:00+00:00",
        "tags": { "Name": "web-01", "Provider": "azure" }
    }"#;

    #[test]
    fn test_parse_show_output() {
        let vm: VmInfo = serde_json::from_str(SHOW_OUTPUT).unwrap();
        assert_eq!(vm.name, "web-01");
        assert_eq!(vm.resource_group.as_deref(), Some("demo-rg"));
        assert_eq!(vm.vm_size(), "Standard_B1s");
        assert_eq!(vm.power_state.as_deref(), Some("VM running"));
        assert_eq!(VmInfo::first_ip(&vm.public_ips).as_deref(), Some("52.170.1.10"));
        assert_eq!(VmInfo::first_ip(&vm.private_ips).as_deref(), Some("10.0.0.4"));
        assert!(vm.time_created.is_some());
    }

    #[test]
    fn test_parse_minimal_record() {
        let vm: VmInfo = serde_json::from_str(r#"{"name": "vm-02"}"#).unwrap();
        assert_eq!(vm.name, "vm-02");
        assert_eq!(vm.vm_size(), "unknown");
        assert_eq!(VmInfo::first_ip(&vm.public_ips), None);
    }

    #[test]
    fn test_first_ip_skips_blanks() {
        assert_eq!(
            VmInfo::first_ip(&Some(" , 10.0.0.7".to_string())).as_deref(),
            Some("10.0.0.7")
        );
        assert_eq!(VmInfo::first_ip(&Some("".to_string())), None);
    }
}
