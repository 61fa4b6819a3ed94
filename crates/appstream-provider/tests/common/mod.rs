#![allow(dead_code)]

use appstream_cloud::error::RESOURCE_NOT_FOUND;
use appstream_cloud::{
    AppStreamApi, CloudError, Context, CreateImageBuilderInput, DefaultTags, ImageBuilder,
    ImageBuilderState, ResourceTagMapping, Result, TagFailure, TagMap, TaggingApi, Value,
};
use appstream_provider::{ImageBuilderModel, ImageBuilderResource, ProviderData};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const REGION: &str = "eu-central-1";

pub fn builder_arn(name: &str) -> String {
    format!("arn:aws:appstream:{REGION}:1:image-builder/{name}")
}

pub fn image_arn(image: &str) -> String {
    format!("arn:aws:appstream:{REGION}::image/{image}")
}

pub fn not_found(operation: &'static str) -> CloudError {
    CloudError::api(operation, RESOURCE_NOT_FOUND, "image builder not found")
}

/// In-memory AppStream with scriptable describe results
#[derive(Default)]
pub struct FakeAppStream {
    pub builders: Mutex<HashMap<String, ImageBuilder>>,
    /// Errors returned by the next CreateImageBuilder calls, in order
    pub create_errors: Mutex<VecDeque<CloudError>>,
    /// States reported by the next DescribeImageBuilders calls; `None` reports
    /// the builder as gone. The stored builder is used once exhausted.
    pub describe_script: Mutex<VecDeque<Option<ImageBuilderState>>>,
    /// Report a missing builder as an empty list instead of an error
    pub missing_as_empty: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeAppStream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_builder(builder: ImageBuilder) -> Arc<Self> {
        let fake = Self::default();
        fake.insert(builder);
        Arc::new(fake)
    }

    pub fn insert(&self, builder: ImageBuilder) {
        self.builders
            .lock()
            .unwrap()
            .insert(builder.name.clone(), builder);
    }

    pub fn builder(&self, name: &str) -> Option<ImageBuilder> {
        self.builders.lock().unwrap().get(name).cloned()
    }

    pub fn script_describe(&self, states: impl IntoIterator<Item = Option<ImageBuilderState>>) {
        self.describe_script.lock().unwrap().extend(states);
    }

    pub fn fail_create_with(&self, errors: impl IntoIterator<Item = CloudError>) {
        self.create_errors.lock().unwrap().extend(errors);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| *c == operation)
            .count()
    }

    fn record(&self, operation: &str) {
        self.calls.lock().unwrap().push(operation.to_string());
    }

    fn set_state(&self, name: &str, state: ImageBuilderState) -> Result<ImageBuilder> {
        let mut builders = self.builders.lock().unwrap();
        let builder = builders
            .get_mut(name)
            .ok_or_else(|| not_found("UpdateImageBuilderState"))?;
        builder.state = Some(state);
        Ok(builder.clone())
    }
}

/// A fully populated builder as DescribeImageBuilders reports it
pub fn described_builder(name: &str, state: ImageBuilderState) -> ImageBuilder {
    ImageBuilder {
        name: name.to_string(),
        arn: Some(builder_arn(name)),
        image_arn: Some(image_arn("AppStream-Ubuntu")),
        instance_type: Some("stream.standard.medium".to_string()),
        platform: Some("UBUNTU_PRO_2204".to_string()),
        state: Some(state),
        created_time: Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).single(),
        enable_default_internet_access: Some(false),
        latest_appstream_agent_version: Some("TRUE".to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl AppStreamApi for FakeAppStream {
    async fn create_image_builder(&self, input: CreateImageBuilderInput) -> Result<ImageBuilder> {
        self.record("CreateImageBuilder");
        if let Some(err) = self.create_errors.lock().unwrap().pop_front() {
            return Err(err);
        }

        let stored = ImageBuilder {
            name: input.name.clone(),
            arn: Some(builder_arn(&input.name)),
            image_arn: input
                .image_arn
                .clone()
                .or_else(|| input.image_name.as_deref().map(image_arn)),
            description: input.description,
            display_name: input.display_name,
            vpc_config: input.vpc_config,
            instance_type: Some(input.instance_type),
            platform: Some("UBUNTU_PRO_2204".to_string()),
            iam_role_arn: input.iam_role_arn,
            state: Some(ImageBuilderState::Pending),
            created_time: Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).single(),
            enable_default_internet_access: Some(
                input.enable_default_internet_access.unwrap_or(false),
            ),
            domain_join_info: input.domain_join_info,
            appstream_agent_version: input.appstream_agent_version,
            access_endpoints: input.access_endpoints,
            root_volume_config: input.root_volume_config,
            ..Default::default()
        };
        self.insert(stored.clone());

        // CreateImageBuilder only echoes a few fields
        Ok(ImageBuilder {
            name: stored.name,
            arn: stored.arn,
            state: stored.state,
            ..Default::default()
        })
    }

    async fn describe_image_builders(&self, names: Vec<String>) -> Result<Vec<ImageBuilder>> {
        self.record("DescribeImageBuilders");
        let name = names.first().cloned().unwrap_or_default();

        let scripted = self.describe_script.lock().unwrap().pop_front();
        match scripted {
            Some(Some(state)) => {
                return self.set_state(&name, state).map(|b| vec![b]);
            }
            Some(None) => {
                self.builders.lock().unwrap().remove(&name);
            }
            None => {}
        }

        match self.builder(&name) {
            Some(builder) => Ok(vec![builder]),
            None if self.missing_as_empty => Ok(vec![]),
            None => Err(not_found("DescribeImageBuilders")),
        }
    }

    async fn stop_image_builder(&self, name: &str) -> Result<ImageBuilder> {
        self.record("StopImageBuilder");
        self.set_state(name, ImageBuilderState::Stopping)
    }

    async fn delete_image_builder(&self, name: &str) -> Result<ImageBuilder> {
        self.record("DeleteImageBuilder");
        self.set_state(name, ImageBuilderState::Deleting)
    }
}

/// In-memory resource-tagging service keyed by ARN
#[derive(Default)]
pub struct FakeTagging {
    pub tags: Mutex<HashMap<String, TagMap>>,
    /// Failures reported in the failure map of the next TagResources calls
    pub tag_failures: Mutex<VecDeque<TagFailure>>,
    /// When set, GetResources cancels this context and never answers
    pub read_canceler: Mutex<Option<Context>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeTagging {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, arn: &str, tags: TagMap) {
        self.tags.lock().unwrap().insert(arn.to_string(), tags);
    }

    pub fn get(&self, arn: &str) -> TagMap {
        self.tags
            .lock()
            .unwrap()
            .get(arn)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn cancel_on_read(&self, ctx: &Context) {
        *self.read_canceler.lock().unwrap() = Some(ctx.clone());
    }

    pub fn mutations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| *c != "GetResources")
            .count()
    }
}

#[async_trait]
impl TaggingApi for FakeTagging {
    async fn get_resources(&self, resource_arns: Vec<String>) -> Result<Vec<ResourceTagMapping>> {
        self.calls.lock().unwrap().push("GetResources".to_string());
        let canceled = self.read_canceler.lock().unwrap().take();
        if let Some(ctx) = canceled {
            ctx.cancel();
            std::future::pending::<()>().await;
        }
        let tags = self.tags.lock().unwrap();
        Ok(resource_arns
            .iter()
            .filter_map(|arn| {
                tags.get(arn).filter(|t| !t.is_empty()).map(|t| ResourceTagMapping {
                    resource_arn: arn.clone(),
                    tags: t.clone(),
                })
            })
            .collect())
    }

    async fn tag_resources(
        &self,
        resource_arns: Vec<String>,
        tags: TagMap,
    ) -> Result<HashMap<String, TagFailure>> {
        self.calls.lock().unwrap().push("TagResources".to_string());
        if let Some(failure) = self.tag_failures.lock().unwrap().pop_front() {
            return Ok(resource_arns.into_iter().map(|arn| (arn, failure.clone())).collect());
        }
        let mut stored = self.tags.lock().unwrap();
        for arn in resource_arns {
            stored.entry(arn).or_default().extend(tags.clone());
        }
        Ok(HashMap::new())
    }

    async fn untag_resources(
        &self,
        resource_arns: Vec<String>,
        tag_keys: Vec<String>,
    ) -> Result<HashMap<String, TagFailure>> {
        self.calls.lock().unwrap().push("UntagResources".to_string());
        let mut stored = self.tags.lock().unwrap();
        for arn in resource_arns {
            if let Some(tags) = stored.get_mut(&arn) {
                for key in &tag_keys {
                    tags.remove(key);
                }
            }
        }
        Ok(HashMap::new())
    }
}

pub fn tags(pairs: &[(&str, &str)]) -> TagMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn resource(
    api: &Arc<FakeAppStream>,
    tagging: &Arc<FakeTagging>,
    default_tags: &[(&str, &str)],
) -> ImageBuilderResource {
    let data = ProviderData::new(
        api.clone(),
        tagging.clone(),
        DefaultTags::new(tags(default_tags)),
    );
    ImageBuilderResource::new(&data)
}

/// A minimal valid plan for a new image builder
pub fn plan(name: &str) -> ImageBuilderModel {
    ImageBuilderModel {
        id: Value::Unknown,
        arn: Value::Unknown,
        name: Value::known(name),
        instance_type: Value::known("stream.standard.medium"),
        image_name: Value::known("AppStream-Ubuntu"),
        ..Default::default()
    }
}
