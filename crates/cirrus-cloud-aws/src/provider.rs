//! AWS provider implementation
//!
//! Maps EC2 run/terminate/describe calls onto the [`CloudProvider`]
//! contract. One `aws_sdk_ec2::Client` handle per adapter instance.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::Client;
use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types as ec2;
use cirrus_cloud::{
    CloudProvider, CreateOptions, Instance, InstanceStatus, ProviderBuilder, ProviderError,
    ProviderSettings, Result,
};
use serde_json::{Map, Value};
use std::time::Duration;

pub const PROVIDER: &str = "aws";

const DEFAULT_REGION: &str = "us-east-1";
// Amazon Linux 2 in us-east-1, overridable via instance_defaults.ami_id.
const DEFAULT_AMI: &str = "ami-0c02fb55956c7d316";
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Error codes EC2 reports for ids that do not (or no longer) exist.
const NOT_FOUND_CODES: &[&str] = &["InvalidInstanceID.NotFound", "InvalidInstanceID.Malformed"];

/// AWS adapter over EC2.
#[derive(Debug)]
pub struct AwsProvider {
    client: Client,
    region: String,
    instance_defaults: Map<String, Value>,
}

impl AwsProvider {
    /// Initialize from the provider configuration section, loading the
    /// shared AWS config (credential chain, region) for the client handle.
    pub async fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let region = settings
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;
        let client = Client::new(&sdk_config);

        tracing::info!("AWS provider initialized for region: {}", region);
        Ok(Self {
            client,
            region,
            instance_defaults: settings.instance_defaults.clone(),
        })
    }

    fn default_str(&self, key: &str) -> Option<String> {
        self.instance_defaults
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn default_str_list(&self, key: &str) -> Option<Vec<String>> {
        let list = self.instance_defaults.get(key)?.as_array()?;
        Some(
            list.iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Convert a native EC2 record into the normalized model.
    fn to_instance(&self, native: &ec2::Instance) -> Result<Instance> {
        let id = native
            .instance_id()
            .ok_or_else(|| ProviderError::new(PROVIDER, "EC2 instance record has no id"))?;
        let instance_type = native
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let state = native
            .state()
            .and_then(|s| s.name())
            .map(|n| n.as_str())
            .unwrap_or("unknown");

        let mut instance = Instance::new(
            id,
            name_from_tags(native.tags()),
            instance_type,
            map_instance_state(state),
            PROVIDER,
            self.region.clone(),
        )
        .map_err(|e| ProviderError::new(PROVIDER, e.to_string()))?;

        if let Some(ip) = native.public_ip_address() {
            instance = instance.with_public_ip(ip);
        }
        if let Some(ip) = native.private_ip_address() {
            instance = instance.with_private_ip(ip);
        }
        if let Some(launched) = native.launch_time() {
            if let Some(at) =
                chrono::DateTime::from_timestamp(launched.secs(), launched.subsec_nanos())
            {
                instance = instance.with_created_at(at);
            }
        }

        if let Some(zone) = native.placement().and_then(|p| p.availability_zone()) {
            instance = instance.with_metadata_entry("availability_zone", Value::from(zone));
        }
        if let Some(vpc) = native.vpc_id() {
            instance = instance.with_metadata_entry("vpc_id", Value::from(vpc));
        }
        if let Some(subnet) = native.subnet_id() {
            instance = instance.with_metadata_entry("subnet_id", Value::from(subnet));
        }
        if let Some(key) = native.key_name() {
            instance = instance.with_metadata_entry("key_name", Value::from(key));
        }
        if let Some(arch) = native.architecture() {
            instance = instance.with_metadata_entry("architecture", Value::from(arch.as_str()));
        }
        let groups: Vec<Value> = native
            .security_groups()
            .iter()
            .filter_map(|g| g.group_name())
            .map(Value::from)
            .collect();
        if !groups.is_empty() {
            instance = instance.with_metadata_entry("security_groups", Value::from(groups));
        }

        Ok(instance)
    }

    /// Poll until the instance reports running, bounded by `timeout`.
    async fn wait_until_running(&self, id: &str, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(instance) = self.get_instance(id).await? {
                if instance.is_running() {
                    return Ok(());
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ProviderError::new(
                    PROVIDER,
                    format!(
                        "Timed out after {}s waiting for instance {} to run",
                        timeout.as_secs(),
                        id
                    ),
                ));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl CloudProvider for AwsProvider {
    async fn create_instance(
        &self,
        name: &str,
        instance_type: &str,
        options: &CreateOptions,
    ) -> Result<Instance> {
        let image_id = options
            .get::<String>("image_id")
            .or_else(|| self.default_str("ami_id"))
            .unwrap_or_else(|| DEFAULT_AMI.to_string());

        tracing::info!(
            "Creating EC2 instance '{}' with type '{}'",
            name,
            instance_type
        );

        let tags = ec2::TagSpecification::builder()
            .resource_type(ec2::ResourceType::Instance)
            .tags(tag("Name", name))
            .tags(tag("CreatedBy", "cirrus"))
            .tags(tag("Provider", PROVIDER))
            .build();

        let mut request = self
            .client
            .run_instances()
            .image_id(image_id)
            .instance_type(ec2::InstanceType::from(instance_type))
            .min_count(1)
            .max_count(1)
            .tag_specifications(tags);

        let security_groups = options
            .get::<Vec<String>>("security_groups")
            .or_else(|| self.default_str_list("security_groups"));
        if let Some(groups) = security_groups {
            request = request.set_security_groups(Some(groups));
        }
        if let Some(key_name) = options
            .get::<String>("key_name")
            .or_else(|| self.default_str("key_pair"))
        {
            request = request.key_name(key_name);
        }
        if let Some(subnet_id) = options
            .get::<String>("subnet_id")
            .or_else(|| self.default_str("subnet_id"))
        {
            request = request.subnet_id(subnet_id);
        }
        if let Some(user_data) = options.get::<String>("user_data") {
            request = request.user_data(user_data);
        }

        let response = request
            .send()
            .await
            .map_err(|e| api_error("Failed to create AWS instance", e))?;

        let created = response
            .instances()
            .first()
            .ok_or_else(|| ProviderError::new(PROVIDER, "No instances returned from AWS API"))?;
        let instance = self.to_instance(created)?;

        if options.wait_for_running() {
            tracing::info!("Waiting for instance {} to be running...", instance.id);
            self.wait_until_running(
                &instance.id,
                Duration::from_secs(options.wait_timeout_secs()),
            )
            .await?;
            if let Some(fresh) = self.get_instance(&instance.id).await? {
                tracing::info!("Successfully created EC2 instance: {}", fresh.id);
                return Ok(fresh);
            }
        }

        tracing::info!("Successfully created EC2 instance: {}", instance.id);
        Ok(instance)
    }

    async fn delete_instance(&self, id: &str) -> Result<bool> {
        tracing::info!("Deleting EC2 instance: {}", id);

        let response = match self
            .client
            .terminate_instances()
            .instance_ids(id)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => {
                tracing::warn!("Instance {} not found (already deleted?)", id);
                return Ok(true);
            }
            Err(e) => return Err(api_error("Failed to delete AWS instance", e)),
        };

        let state = response
            .terminating_instances()
            .first()
            .and_then(|change| change.current_state())
            .and_then(|state| state.name())
            .map(|name| name.as_str().to_string());

        match state {
            Some(state) => {
                tracing::info!("Instance {} termination initiated. State: {}", id, state);
                Ok(matches!(state.as_str(), "shutting-down" | "terminated"))
            }
            None => Ok(false),
        }
    }

    async fn get_instance(&self, id: &str) -> Result<Option<Instance>> {
        let response = match self
            .client
            .describe_instances()
            .instance_ids(id)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(api_error("Failed to get AWS instance info", e)),
        };

        let native = response
            .reservations()
            .first()
            .and_then(|r| r.instances().first());
        match native {
            Some(native) => Ok(Some(self.to_instance(native)?)),
            None => Ok(None),
        }
    }

    async fn list_instances(&self) -> Result<Vec<Instance>> {
        let response = self
            .client
            .describe_instances()
            .send()
            .await
            .map_err(|e| api_error("Failed to list AWS instances", e))?;

        let mut instances = Vec::new();
        for reservation in response.reservations() {
            for native in reservation.instances() {
                instances.push(self.to_instance(native)?);
            }
        }

        tracing::info!("Retrieved {} EC2 instances", instances.len());
        Ok(instances)
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }
}

/// Registry builder for the AWS adapter.
pub struct AwsProviderBuilder;

#[async_trait]
impl ProviderBuilder for AwsProviderBuilder {
    async fn build(&self, settings: &ProviderSettings) -> Result<Box<dyn CloudProvider>> {
        Ok(Box::new(AwsProvider::from_settings(settings).await?))
    }
}

fn tag(key: &str, value: &str) -> ec2::Tag {
    ec2::Tag::builder().key(key).value(value).build()
}

/// EC2 instance state names onto the normalized status.
fn map_instance_state(state: &str) -> InstanceStatus {
    match state {
        "pending" => InstanceStatus::Starting,
        "running" => InstanceStatus::Running,
        "shutting-down" => InstanceStatus::Stopping,
        "stopping" => InstanceStatus::Stopping,
        "stopped" => InstanceStatus::Stopped,
        "terminated" => InstanceStatus::Terminated,
        _ => InstanceStatus::Unknown,
    }
}

/// Instance name comes from the `Name` tag; "Unknown" when absent.
fn name_from_tags(tags: &[ec2::Tag]) -> String {
    tags.iter()
        .find(|t| t.key() == Some("Name"))
        .and_then(|t| t.value())
        .unwrap_or("Unknown")
        .to_string()
}

fn is_not_found<E, R>(err: &SdkError<E, R>) -> bool
where
    E: ProvideErrorMetadata,
{
    err.as_service_error()
        .and_then(|e| e.code())
        .is_some_and(|code| NOT_FOUND_CODES.contains(&code))
}

/// Translate an SDK failure, carrying the EC2 error code when present.
fn api_error<E, R>(action: &str, err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
    R: std::fmt::Debug,
{
    let code = err
        .as_service_error()
        .and_then(|e| e.code())
        .map(str::to_string);
    let message = err
        .as_service_error()
        .and_then(|e| e.message())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err));

    tracing::error!("{}: {}", action, message);
    let error = ProviderError::new(PROVIDER, format!("{}: {}", action, message));
    match code {
        Some(code) => error.with_code(code),
        None => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_table() {
        assert_eq!(map_instance_state("pending"), InstanceStatus::Starting);
        assert_eq!(map_instance_state("running"), InstanceStatus::Running);
        assert_eq!(map_instance_state("shutting-down"), InstanceStatus::Stopping);
        assert_eq!(map_instance_state("stopping"), InstanceStatus::Stopping);
        assert_eq!(map_instance_state("stopped"), InstanceStatus::Stopped);
        assert_eq!(map_instance_state("terminated"), InstanceStatus::Terminated);
        assert_eq!(map_instance_state("rebooting"), InstanceStatus::Unknown);
        assert_eq!(map_instance_state(""), InstanceStatus::Unknown);
    }

    #[test]
    fn test_name_from_tags() {
        let tags = vec![
            tag("Provider", "aws"),
            tag("Name", "web-01"),
        ];
        assert_eq!(name_from_tags(&tags), "web-01");
        assert_eq!(name_from_tags(&[tag("Env", "dev")]), "Unknown");
        assert_eq!(name_from_tags(&[]), "Unknown");
    }

    #[tokio::test]
    async fn test_to_instance_conversion() {
        let settings = ProviderSettings {
            region: Some("us-west-2".to_string()),
            ..ProviderSettings::default()
        };
        let provider = AwsProvider::from_settings(&settings).await.unwrap();

        let native = ec2::Instance::builder()
            .instance_id("i-0abc123")
            .instance_type(ec2::InstanceType::T3Micro)
            .state(
                ec2::InstanceState::builder()
                    .name(ec2::InstanceStateName::Running)
                    .build(),
            )
            .tags(tag("Name", "web-01"))
            .public_ip_address("54.1.2.3")
            .private_ip_address("10.0.0.5")
            .vpc_id("vpc-1")
            .build();

        let instance = provider.to_instance(&native).unwrap();
        assert_eq!(instance.id, "i-0abc123");
        assert_eq!(instance.name, "web-01");
        assert_eq!(instance.instance_type, "t3.micro");
        assert_eq!(instance.status, InstanceStatus::Running);
        assert_eq!(instance.provider, "aws");
        assert_eq!(instance.region, "us-west-2");
        assert_eq!(instance.endpoint(), Some("54.1.2.3"));
        assert_eq!(instance.metadata.get("vpc_id"), Some(&Value::from("vpc-1")));
    }

    #[tokio::test]
    async fn test_untagged_instance_gets_fallback_name() {
        let provider = AwsProvider::from_settings(&ProviderSettings::default())
            .await
            .unwrap();
        let native = ec2::Instance::builder()
            .instance_id("i-0abc123")
            .instance_type(ec2::InstanceType::T3Micro)
            .build();

        let instance = provider.to_instance(&native).unwrap();
        assert_eq!(instance.name, "Unknown");
        assert_eq!(instance.status, InstanceStatus::Unknown);
        assert_eq!(instance.region, "us-east-1");
    }
}
