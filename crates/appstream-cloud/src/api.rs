//! Cloud API traits and shapes
//!
//! The reconcilers only talk to AppStream and the resource-tagging service
//! through these traits. `appstream-cloud-aws` implements them on top of the
//! AWS SDK; tests implement them in memory.
//!
//! Shapes follow the cloud API's optional-field style: an absent field is
//! `None`, which is not the same thing as an empty value.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// AppStream image-builder operations
#[async_trait]
pub trait AppStreamApi: Send + Sync {
    async fn create_image_builder(&self, input: CreateImageBuilderInput) -> Result<ImageBuilder>;

    /// Describe the named image builders. An unknown name may either produce
    /// a `ResourceNotFoundException` or an empty list.
    async fn describe_image_builders(&self, names: Vec<String>) -> Result<Vec<ImageBuilder>>;

    async fn stop_image_builder(&self, name: &str) -> Result<ImageBuilder>;

    async fn delete_image_builder(&self, name: &str) -> Result<ImageBuilder>;
}

/// Generic resource-tagging operations
#[async_trait]
pub trait TaggingApi: Send + Sync {
    async fn get_resources(&self, resource_arns: Vec<String>) -> Result<Vec<ResourceTagMapping>>;

    /// Returns the per-ARN failure map (empty on full success)
    async fn tag_resources(
        &self,
        resource_arns: Vec<String>,
        tags: HashMap<String, String>,
    ) -> Result<HashMap<String, crate::error::TagFailure>>;

    /// Returns the per-ARN failure map (empty on full success)
    async fn untag_resources(
        &self,
        resource_arns: Vec<String>,
        tag_keys: Vec<String>,
    ) -> Result<HashMap<String, crate::error::TagFailure>>;
}

/// Lifecycle state of an image builder as reported by the cloud
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageBuilderState {
    Pending,
    UpdatingAgent,
    Running,
    Stopping,
    Stopped,
    Rebooting,
    Snapshotting,
    Deleting,
    Failed,
    Updating,
    PendingQualification,
    PendingSyncingApps,
    SyncingApps,
    PendingImageImport,
    /// A state this crate does not know about yet
    Unknown(String),
}

impl ImageBuilderState {
    pub fn as_str(&self) -> &str {
        match self {
            ImageBuilderState::Pending => "PENDING",
            ImageBuilderState::UpdatingAgent => "UPDATING_AGENT",
            ImageBuilderState::Running => "RUNNING",
            ImageBuilderState::Stopping => "STOPPING",
            ImageBuilderState::Stopped => "STOPPED",
            ImageBuilderState::Rebooting => "REBOOTING",
            ImageBuilderState::Snapshotting => "SNAPSHOTTING",
            ImageBuilderState::Deleting => "DELETING",
            ImageBuilderState::Failed => "FAILED",
            ImageBuilderState::Updating => "UPDATING",
            ImageBuilderState::PendingQualification => "PENDING_QUALIFICATION",
            ImageBuilderState::PendingSyncingApps => "PENDING_SYNCING_APPS",
            ImageBuilderState::SyncingApps => "SYNCING_APPS",
            ImageBuilderState::PendingImageImport => "PENDING_IMAGE_IMPORT",
            ImageBuilderState::Unknown(s) => s,
        }
    }
}

impl From<&str> for ImageBuilderState {
    fn from(value: &str) -> Self {
        match value {
            "PENDING" => ImageBuilderState::Pending,
            "UPDATING_AGENT" => ImageBuilderState::UpdatingAgent,
            "RUNNING" => ImageBuilderState::Running,
            "STOPPING" => ImageBuilderState::Stopping,
            "STOPPED" => ImageBuilderState::Stopped,
            "REBOOTING" => ImageBuilderState::Rebooting,
            "SNAPSHOTTING" => ImageBuilderState::Snapshotting,
            "DELETING" => ImageBuilderState::Deleting,
            "FAILED" => ImageBuilderState::Failed,
            "UPDATING" => ImageBuilderState::Updating,
            "PENDING_QUALIFICATION" => ImageBuilderState::PendingQualification,
            "PENDING_SYNCING_APPS" => ImageBuilderState::PendingSyncingApps,
            "SYNCING_APPS" => ImageBuilderState::SyncingApps,
            "PENDING_IMAGE_IMPORT" => ImageBuilderState::PendingImageImport,
            other => ImageBuilderState::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ImageBuilderState {
    fn from(value: String) -> Self {
        ImageBuilderState::from(value.as_str())
    }
}

impl From<ImageBuilderState> for String {
    fn from(value: ImageBuilderState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ImageBuilderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VpcConfig {
    pub subnet_ids: Option<Vec<String>>,
    pub security_group_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainJoinInfo {
    pub directory_name: Option<String>,
    pub organizational_unit_distinguished_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessEndpoint {
    pub endpoint_type: String,
    pub vpce_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeConfig {
    pub volume_size_in_gb: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkAccessConfiguration {
    pub eni_private_ip_address: Option<String>,
    pub eni_ipv6_addresses: Option<Vec<String>>,
    pub eni_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateChangeReason {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceError {
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub error_timestamp: Option<DateTime<Utc>>,
}

/// An image builder as returned by the cloud
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBuilder {
    pub name: String,
    pub arn: Option<String>,
    pub image_arn: Option<String>,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub vpc_config: Option<VpcConfig>,
    pub instance_type: Option<String>,
    pub platform: Option<String>,
    pub iam_role_arn: Option<String>,
    pub state: Option<ImageBuilderState>,
    pub state_change_reason: Option<StateChangeReason>,
    pub created_time: Option<DateTime<Utc>>,
    pub enable_default_internet_access: Option<bool>,
    pub domain_join_info: Option<DomainJoinInfo>,
    pub network_access_configuration: Option<NetworkAccessConfiguration>,
    pub image_builder_errors: Option<Vec<ResourceError>>,
    pub appstream_agent_version: Option<String>,
    pub access_endpoints: Option<Vec<AccessEndpoint>>,
    pub root_volume_config: Option<VolumeConfig>,
    pub latest_appstream_agent_version: Option<String>,
}

/// Input of `CreateImageBuilder`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateImageBuilderInput {
    pub name: String,
    pub instance_type: String,
    pub image_name: Option<String>,
    pub image_arn: Option<String>,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub vpc_config: Option<VpcConfig>,
    pub iam_role_arn: Option<String>,
    pub enable_default_internet_access: Option<bool>,
    pub domain_join_info: Option<DomainJoinInfo>,
    pub appstream_agent_version: Option<String>,
    pub access_endpoints: Option<Vec<AccessEndpoint>>,
    pub root_volume_config: Option<VolumeConfig>,
}

/// Tags attached to one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTagMapping {
    pub resource_arn: String,
    pub tags: HashMap<String, String>,
}
