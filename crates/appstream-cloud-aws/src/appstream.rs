//! AppStream image-builder API backed by `aws-sdk-appstream`

use crate::convert::{SdkList, SdkStr, non_empty, timestamp};
use crate::error::from_sdk_error;
use appstream_cloud::{
    AccessEndpoint, AppStreamApi, CloudError, CreateImageBuilderInput, DomainJoinInfo,
    ImageBuilder, ImageBuilderState, NetworkAccessConfiguration, ResourceError, Result,
    StateChangeReason, VolumeConfig, VpcConfig,
};
use async_trait::async_trait;
use aws_sdk_appstream::types;

/// AppStream client
#[derive(Clone, Debug)]
pub struct AwsAppStream {
    client: aws_sdk_appstream::Client,
}

impl AwsAppStream {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_appstream::Client::new(config),
        }
    }

    pub fn from_client(client: aws_sdk_appstream::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AppStreamApi for AwsAppStream {
    async fn create_image_builder(&self, input: CreateImageBuilderInput) -> Result<ImageBuilder> {
        const OP: &str = "CreateImageBuilder";

        tracing::debug!(name = %input.name, "calling CreateImageBuilder");
        let output = self
            .client
            .create_image_builder()
            .name(input.name)
            .instance_type(input.instance_type)
            .set_image_name(input.image_name)
            .set_image_arn(input.image_arn)
            .set_description(input.description)
            .set_display_name(input.display_name)
            .set_vpc_config(input.vpc_config.map(to_sdk_vpc_config))
            .set_iam_role_arn(input.iam_role_arn)
            .set_enable_default_internet_access(input.enable_default_internet_access)
            .set_domain_join_info(input.domain_join_info.map(to_sdk_domain_join_info))
            .set_appstream_agent_version(input.appstream_agent_version)
            .set_access_endpoints(
                input
                    .access_endpoints
                    .map(|endpoints| endpoints.into_iter().map(to_sdk_access_endpoint).collect()),
            )
            .set_root_volume_config(input.root_volume_config.map(to_sdk_volume_config))
            .send()
            .await
            .map_err(|e| from_sdk_error(OP, e))?;

        output
            .image_builder()
            .map(from_sdk_image_builder)
            .ok_or_else(|| empty_response(OP))
    }

    async fn describe_image_builders(&self, names: Vec<String>) -> Result<Vec<ImageBuilder>> {
        let output = self
            .client
            .describe_image_builders()
            .set_names(Some(names))
            .send()
            .await
            .map_err(|e| from_sdk_error("DescribeImageBuilders", e))?;

        Ok(output
            .image_builders()
            .items()
            .iter()
            .map(from_sdk_image_builder)
            .collect())
    }

    async fn stop_image_builder(&self, name: &str) -> Result<ImageBuilder> {
        const OP: &str = "StopImageBuilder";
        let output = self
            .client
            .stop_image_builder()
            .name(name)
            .send()
            .await
            .map_err(|e| from_sdk_error(OP, e))?;

        output
            .image_builder()
            .map(from_sdk_image_builder)
            .ok_or_else(|| empty_response(OP))
    }

    async fn delete_image_builder(&self, name: &str) -> Result<ImageBuilder> {
        const OP: &str = "DeleteImageBuilder";
        let output = self
            .client
            .delete_image_builder()
            .name(name)
            .send()
            .await
            .map_err(|e| from_sdk_error(OP, e))?;

        output
            .image_builder()
            .map(from_sdk_image_builder)
            .ok_or_else(|| empty_response(OP))
    }
}

fn empty_response(operation: &'static str) -> CloudError {
    CloudError::Api {
        operation,
        code: None,
        message: "response did not include an image builder".to_string(),
    }
}

// ============ Request conversion ============

fn to_sdk_vpc_config(vpc: VpcConfig) -> types::VpcConfig {
    types::VpcConfig::builder()
        .set_subnet_ids(vpc.subnet_ids)
        .set_security_group_ids(vpc.security_group_ids)
        .build()
}

fn to_sdk_domain_join_info(info: DomainJoinInfo) -> types::DomainJoinInfo {
    types::DomainJoinInfo::builder()
        .set_directory_name(info.directory_name)
        .set_organizational_unit_distinguished_name(info.organizational_unit_distinguished_name)
        .build()
}

fn to_sdk_access_endpoint(endpoint: AccessEndpoint) -> types::AccessEndpoint {
    types::AccessEndpoint::builder()
        .endpoint_type(types::AccessEndpointType::from(endpoint.endpoint_type.as_str()))
        .set_vpce_id(endpoint.vpce_id)
        .build()
}

fn to_sdk_volume_config(volume: VolumeConfig) -> types::VolumeConfig {
    types::VolumeConfig::builder()
        .set_volume_size_in_gb(volume.volume_size_in_gb)
        .build()
}

// ============ Response conversion ============

fn from_sdk_image_builder(ib: &types::ImageBuilder) -> ImageBuilder {
    ImageBuilder {
        name: ib.name().owned().unwrap_or_default(),
        arn: ib.arn().owned(),
        image_arn: ib.image_arn().owned(),
        description: ib.description().owned(),
        display_name: ib.display_name().owned(),
        vpc_config: ib.vpc_config().map(|vpc| VpcConfig {
            subnet_ids: non_empty(vpc.subnet_ids().items()),
            security_group_ids: non_empty(vpc.security_group_ids().items()),
        }),
        instance_type: ib.instance_type().owned(),
        platform: ib.platform().owned(),
        iam_role_arn: ib.iam_role_arn().owned(),
        state: ib
            .state()
            .owned()
            .map(|s| ImageBuilderState::from(s.as_str())),
        state_change_reason: ib.state_change_reason().map(|r| StateChangeReason {
            code: r.code().owned(),
            message: r.message().owned(),
        }),
        created_time: ib.created_time().and_then(timestamp),
        enable_default_internet_access: ib.enable_default_internet_access(),
        domain_join_info: ib.domain_join_info().map(|d| DomainJoinInfo {
            directory_name: d.directory_name().owned(),
            organizational_unit_distinguished_name: d
                .organizational_unit_distinguished_name()
                .owned(),
        }),
        network_access_configuration: ib.network_access_configuration().map(|n| {
            NetworkAccessConfiguration {
                eni_private_ip_address: n.eni_private_ip_address().owned(),
                eni_ipv6_addresses: non_empty(n.eni_ipv6_addresses().items()),
                eni_id: n.eni_id().owned(),
            }
        }),
        image_builder_errors: non_empty(ib.image_builder_errors().items()).map(|errors| {
            errors
                .iter()
                .map(|e| ResourceError {
                    error_code: e.error_code().owned(),
                    error_message: e.error_message().owned(),
                    error_timestamp: e.error_timestamp().and_then(timestamp),
                })
                .collect()
        }),
        appstream_agent_version: ib.appstream_agent_version().owned(),
        access_endpoints: non_empty(ib.access_endpoints().items()).map(|endpoints| {
            endpoints
                .iter()
                .map(|e| AccessEndpoint {
                    endpoint_type: e.endpoint_type().owned().unwrap_or_default(),
                    vpce_id: e.vpce_id().owned(),
                })
                .collect()
        }),
        root_volume_config: ib.root_volume_config().map(|v| VolumeConfig {
            volume_size_in_gb: v.volume_size_in_gb(),
        }),
        latest_appstream_agent_version: ib.latest_appstream_agent_version().owned(),
    }
}
