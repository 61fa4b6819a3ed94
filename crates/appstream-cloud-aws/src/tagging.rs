//! Resource Groups Tagging API backed by `aws-sdk-resourcegroupstagging`

use crate::convert::{SdkList, SdkStr};
use crate::error::from_sdk_error;
use appstream_cloud::{ResourceTagMapping, Result, TagFailure, TaggingApi};
use async_trait::async_trait;
use aws_sdk_resourcegroupstagging::types;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct AwsTagging {
    client: aws_sdk_resourcegroupstagging::Client,
}

impl AwsTagging {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_resourcegroupstagging::Client::new(config),
        }
    }

    pub fn from_client(client: aws_sdk_resourcegroupstagging::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaggingApi for AwsTagging {
    async fn get_resources(&self, resource_arns: Vec<String>) -> Result<Vec<ResourceTagMapping>> {
        let mut mappings = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let output = self
                .client
                .get_resources()
                .set_resource_arn_list(Some(resource_arns.clone()))
                .set_pagination_token(token.take())
                .send()
                .await
                .map_err(|e| from_sdk_error("GetResources", e))?;

            mappings.extend(
                output
                    .resource_tag_mapping_list()
                    .items()
                    .iter()
                    .map(from_sdk_mapping),
            );

            match output.pagination_token().owned() {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }

        Ok(mappings)
    }

    async fn tag_resources(
        &self,
        resource_arns: Vec<String>,
        tags: HashMap<String, String>,
    ) -> Result<HashMap<String, TagFailure>> {
        let output = self
            .client
            .tag_resources()
            .set_resource_arn_list(Some(resource_arns))
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| from_sdk_error("TagResources", e))?;

        Ok(from_sdk_failures(output.failed_resources_map()))
    }

    async fn untag_resources(
        &self,
        resource_arns: Vec<String>,
        tag_keys: Vec<String>,
    ) -> Result<HashMap<String, TagFailure>> {
        let output = self
            .client
            .untag_resources()
            .set_resource_arn_list(Some(resource_arns))
            .set_tag_keys(Some(tag_keys))
            .send()
            .await
            .map_err(|e| from_sdk_error("UntagResources", e))?;

        Ok(from_sdk_failures(output.failed_resources_map()))
    }
}

fn from_sdk_mapping(mapping: &types::ResourceTagMapping) -> ResourceTagMapping {
    ResourceTagMapping {
        resource_arn: mapping.resource_arn().owned().unwrap_or_default(),
        tags: mapping
            .tags()
            .items()
            .iter()
            .filter_map(|tag| Some((tag.key().owned()?, tag.value().owned()?)))
            .collect(),
    }
}

fn from_sdk_failures(
    failures: Option<&HashMap<String, types::FailureInfo>>,
) -> HashMap<String, TagFailure> {
    failures
        .map(|map| {
            map.iter()
                .map(|(arn, info)| {
                    (
                        arn.clone(),
                        TagFailure {
                            status_code: Some(info.status_code()),
                            error_code: info.error_code().owned(),
                            error_message: info.error_message().owned(),
                        },
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}
