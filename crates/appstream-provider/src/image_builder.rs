//! AppStream image builder resource
//!
//! Lifecycle:
//!
//! ```text
//! create:  CreateImageBuilder (retried) -> apply tags -> read
//! read:    DescribeImageBuilders -> flatten -> keep image_name -> read tags
//! update:  apply tags -> read                     (everything else replaces)
//! delete:  describe -> RUNNING: stop | STOPPED/FAILED: delete | other: wait
//!          repeated until the builder is gone
//! ```

use crate::bridge::{expand_create_input, flatten_image_builder};
use crate::config::ProviderData;
use crate::model::ImageBuilderModel;
use crate::plan::{PlanModification, modify_plan};
use crate::resource::{Resource, Response};
use crate::schema::{Attribute, PlanModifier, Schema};
use crate::validate::{NAME_PATTERN, Validator, require_image_source, validate_config};
use appstream_cloud::classify::{
    is_already_exists, is_canceled, is_concurrent_modification, is_not_found,
    is_operation_not_permitted, is_resource_not_available, is_unexpected_state,
};
use appstream_cloud::{
    AppStreamApi, AttributePath, CloudError, Context, Diagnostic, Diagnostics, ImageBuilder,
    ImageBuilderState, Result, RetryConfig, TagManager, Value, retry,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TYPE_NAME: &str = "aws_appstream_image_builder";

pub const CREATE_TIMEOUT: Duration = Duration::from_secs(15 * 60);
pub const CREATE_INITIAL_DELAY: Duration = Duration::from_secs(10);
pub const CREATE_MAX_DELAY: Duration = Duration::from_secs(2 * 60);

pub const DELETE_TIMEOUT: Duration = Duration::from_secs(45 * 60);
pub const DELETE_INITIAL_DELAY: Duration = Duration::from_secs(30);
pub const DELETE_MAX_DELAY: Duration = Duration::from_secs(60);

/// The state label the delete loop converges to
const GONE: &str = "DELETED";

pub struct ImageBuilderResource {
    api: Arc<dyn AppStreamApi>,
    tags: TagManager,
    schema: Schema,
}

impl ImageBuilderResource {
    pub fn new(data: &ProviderData) -> Self {
        Self {
            api: data.appstream.clone(),
            tags: data.tag_manager(),
            schema: image_builder_schema(),
        }
    }

    fn create_retry() -> RetryConfig {
        RetryConfig::new(CREATE_TIMEOUT, CREATE_INITIAL_DELAY, CREATE_MAX_DELAY)
            .retry_on(is_concurrent_modification)
            .retry_on(is_operation_not_permitted)
            .retry_on(is_resource_not_available)
            // the referenced image is not always visible right away
            .retry_on(is_not_found)
    }

    fn delete_retry() -> RetryConfig {
        RetryConfig::new(DELETE_TIMEOUT, DELETE_INITIAL_DELAY, DELETE_MAX_DELAY)
            .retry_on(is_unexpected_state)
            .retry_on(is_concurrent_modification)
            .retry_on(is_operation_not_permitted)
    }

    /// Describe one builder by name. `None` when it does not exist.
    async fn find(&self, name: &str) -> Result<Option<ImageBuilder>> {
        match self.api.describe_image_builders(vec![name.to_string()]).await {
            Ok(builders) => Ok(builders.into_iter().find(|b| b.name == name)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Describe the builder and turn it into state.
    ///
    /// `image_name` is never returned by the cloud and is carried over from
    /// `prior`, unless the observed `image_arn` drifted from the prior Known one.
    async fn refresh(
        &self,
        ctx: &Context,
        name: &str,
        prior: &ImageBuilderModel,
    ) -> Result<Option<(ImageBuilderModel, Diagnostics)>> {
        let Some(builder) = ctx.run(self.find(name)).await? else {
            return Ok(None);
        };

        let mut diags = Diagnostics::new();
        let mut state = flatten_image_builder(&builder);

        state.image_name = match &prior.image_name {
            Value::Known(image_name) if state.image_arn.differs_from(&prior.image_arn) => {
                warn!(
                    name,
                    image_name = %image_name,
                    prior_image_arn = ?prior.image_arn.as_str(),
                    image_arn = ?state.image_arn.as_str(),
                    "image ARN changed outside of configuration, clearing image_name"
                );
                diags.push(
                    Diagnostic::warning(
                        "Image Builder Image Changed",
                        format!(
                            "The image of image builder {name} changed from {} to {} outside of \
                             this configuration. image_name {image_name:?} no longer describes it \
                             and has been cleared.",
                            prior.image_arn.as_str().unwrap_or_default(),
                            state.image_arn.as_str().unwrap_or_default(),
                        ),
                    )
                    .with_attribute(AttributePath::root("image_name")),
                );
                Value::Null
            }
            Value::Known(image_name) => Value::Known(image_name.clone()),
            _ => Value::Null,
        };

        if let Value::Known(arn) = &state.arn {
            let (tags, tag_diags) = self.tags.read(ctx, arn).await?;
            state.tags = tags;
            diags.extend(tag_diags);
        }

        Ok(Some((state, diags)))
    }

    /// One step of the delete state machine. `Ok` once the builder is gone;
    /// `UnexpectedState` while a transition is still pending.
    async fn delete_step(&self, name: &str) -> Result<()> {
        let Some(builder) = self.find(name).await? else {
            debug!(name, "image builder gone");
            return Ok(());
        };

        let state = builder
            .state
            .unwrap_or_else(|| ImageBuilderState::Unknown(String::new()));
        debug!(name, state = %state, "observed image builder state");

        let result = match state {
            ImageBuilderState::Running => {
                info!(name, "stopping image builder");
                self.api.stop_image_builder(name).await
            }
            ImageBuilderState::Stopped | ImageBuilderState::Failed => {
                info!(name, state = %state, "deleting image builder");
                self.api.delete_image_builder(name).await
            }
            _ => return Err(CloudError::unexpected_state(GONE, state.as_str())),
        };

        match result {
            Ok(_) => Err(CloudError::unexpected_state(GONE, state.as_str())),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn missing_identifier() -> Diagnostics {
        Diagnostic::error(
            "Missing Image Builder Name",
            "The state does not contain the image builder name.",
        )
        .with_attribute(AttributePath::root("name"))
        .into()
    }
}

#[async_trait]
impl Resource for ImageBuilderResource {
    type Model = ImageBuilderModel;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    fn validate_config(&self, config: &ImageBuilderModel) -> Diagnostics {
        validate_config(&self.schema, config)
    }

    fn modify_plan(
        &self,
        prior: Option<&ImageBuilderModel>,
        plan: ImageBuilderModel,
    ) -> PlanModification {
        modify_plan(&self.schema, self.tags.default_tags(), prior, plan)
    }

    async fn create(&self, ctx: &Context, plan: ImageBuilderModel) -> Response<ImageBuilderModel> {
        let mut diags = require_image_source(&plan);
        let Some(input) = expand_create_input(&plan) else {
            diags.push(
                Diagnostic::error(
                    "Missing Required Attribute",
                    "name and instance_type must be known before the image builder can be created.",
                )
                .with_attribute(AttributePath::root("name")),
            );
            return Response::error(diags);
        };
        if diags.has_error() {
            return Response::error(diags);
        }

        let name = input.name.clone();
        info!(name = %name, instance_type = %input.instance_type, "creating image builder");

        let created = retry(ctx, &Self::create_retry(), "CreateImageBuilder", |_| {
            let input = input.clone();
            async move { self.api.create_image_builder(input).await }
        })
        .await;

        let builder = match created {
            Ok(builder) => builder,
            Err(e) if is_canceled(&e) => return Response::empty(),
            Err(e) if is_already_exists(&e) => {
                diags.add_error(
                    "AWS AppStream Image Builder Already Exists",
                    format!(
                        "An image builder named {name:?} already exists. To manage it with this \
                         configuration, bring it under management with `terraform import \
                         {TYPE_NAME}.<name> {name}`."
                    ),
                );
                return Response::error(diags);
            }
            Err(e) => {
                diags.add_error(
                    "Error Creating AWS AppStream Image Builder",
                    format!("Could not create image builder {name:?}: {e}"),
                );
                return Response::error(diags);
            }
        };

        // From here on the builder exists, so every exit returns state.
        let mut state = flatten_image_builder(&builder);
        state.image_name = Value::from_option(plan.image_name.as_known().cloned());

        let Some(arn) = state.arn.as_str().map(str::to_string) else {
            diags.add_error(
                "Error Creating AWS AppStream Image Builder",
                format!("CreateImageBuilder returned no ARN for {name:?}."),
            );
            return Response::new(Some(state), diags);
        };
        info!(name = %name, arn = %arn, state = ?state.state.as_str(), "image builder created");

        if let Err(e) = self.tags.apply(ctx, &arn, &plan.tags).await {
            if !is_canceled(&e) {
                diags.add_error(
                    "Error Setting AWS AppStream Image Builder Tags",
                    format!("Image builder {name:?} was created, but tagging failed: {e}"),
                );
            }
            return Response::new(Some(state), diags);
        }

        match self.refresh(ctx, &name, &plan).await {
            Ok(Some((refreshed, read_diags))) => {
                diags.extend(read_diags);
                Response::new(Some(refreshed), diags)
            }
            Ok(None) => {
                diags.add_error(
                    "Error Reading AWS AppStream Image Builder",
                    format!("Image builder {name:?} disappeared right after creation."),
                );
                Response::new(Some(state), diags)
            }
            Err(e) => {
                if !is_canceled(&e) {
                    diags.add_error(
                        "Error Reading AWS AppStream Image Builder",
                        format!("Could not read image builder {name:?} after creation: {e}"),
                    );
                }
                Response::new(Some(state), diags)
            }
        }
    }

    async fn read(&self, ctx: &Context, prior: ImageBuilderModel) -> Response<ImageBuilderModel> {
        let Some(name) = prior.identifier().map(str::to_string) else {
            return Response::new(Some(prior), Self::missing_identifier());
        };

        match self.refresh(ctx, &name, &prior).await {
            Ok(Some((state, diags))) => Response::new(Some(state), diags),
            Ok(None) => {
                warn!(name = %name, "image builder not found, removing from state");
                Response::empty()
            }
            Err(e) if is_canceled(&e) => Response::state(prior),
            Err(e) => {
                let diags = Diagnostic::error(
                    "Error Reading AWS AppStream Image Builder",
                    format!("Could not read image builder {name:?}: {e}"),
                )
                .into();
                Response::new(Some(prior), diags)
            }
        }
    }

    async fn update(
        &self,
        ctx: &Context,
        plan: ImageBuilderModel,
        prior: ImageBuilderModel,
    ) -> Response<ImageBuilderModel> {
        let identity_stable = plan.id.is_known()
            && plan.id == prior.id
            && !plan.arn.differs_from(&prior.arn);
        let (true, Some(arn), Some(name)) =
            (identity_stable, prior.arn.as_str(), prior.identifier())
        else {
            let diags = Diagnostic::error(
                "Provider Internal Error",
                format!(
                    "The planned identity of the image builder (id {:?}, arn {:?}) does not \
                     match the prior state (id {:?}, arn {:?}). This is a bug in the provider, \
                     please report it.",
                    plan.id.as_str(),
                    plan.arn.as_str(),
                    prior.id.as_str(),
                    prior.arn.as_str(),
                ),
            )
            .into();
            return Response::new(Some(prior), diags);
        };

        info!(name, arn, "updating image builder tags");
        let mut diags = Diagnostics::new();

        if let Err(e) = self.tags.apply(ctx, arn, &plan.tags).await {
            if !is_canceled(&e) {
                diags.add_error(
                    "Error Updating AWS AppStream Image Builder Tags",
                    format!("Could not update tags of image builder {name:?}: {e}"),
                );
            }
            return Response::new(Some(prior.clone()), diags);
        }

        match self.refresh(ctx, name, &plan).await {
            Ok(Some((state, read_diags))) => {
                diags.extend(read_diags);
                Response::new(Some(state), diags)
            }
            Ok(None) => {
                diags.add_error(
                    "Error Reading AWS AppStream Image Builder",
                    format!("Image builder {name:?} disappeared during update."),
                );
                Response::error(diags)
            }
            Err(e) => {
                if !is_canceled(&e) {
                    diags.add_error(
                        "Error Reading AWS AppStream Image Builder",
                        format!("Could not read image builder {name:?} after update: {e}"),
                    );
                }
                Response::new(Some(prior.clone()), diags)
            }
        }
    }

    async fn delete(&self, ctx: &Context, prior: ImageBuilderModel) -> Diagnostics {
        let Some(name) = prior.identifier() else {
            return Self::missing_identifier();
        };
        info!(name, "deleting image builder");

        match retry(ctx, &Self::delete_retry(), "DeleteImageBuilder", |_| {
            self.delete_step(name)
        })
        .await
        {
            Ok(()) => {
                info!(name, "image builder deleted");
                Diagnostics::new()
            }
            Err(e) if is_canceled(&e) => Diagnostics::new(),
            Err(e) => Diagnostic::error(
                "Error Deleting AWS AppStream Image Builder",
                format!("Could not delete image builder {name:?}: {e}"),
            )
            .into(),
        }
    }

    fn import_state(&self, id: &str) -> Response<ImageBuilderModel> {
        if id.trim().is_empty() {
            return Response::error(
                Diagnostic::error(
                    "Invalid Import Identifier",
                    "Expected the image builder name as import identifier, got an empty string.",
                )
                .into(),
            );
        }
        Response::state(ImageBuilderModel::from_import_id(id))
    }
}

/// Schema of the image builder resource
pub fn image_builder_schema() -> Schema {
    use PlanModifier::{RequiresReplace, UseStateForUnknown};

    let replace = |attr: Attribute| attr.with_plan_modifier(RequiresReplace);
    let computed_id = |description: &str| {
        Attribute::computed_string()
            .with_description(description)
            .with_plan_modifier(UseStateForUnknown)
    };

    Schema::new(0)
        .with_description("Manages an AppStream image builder.")
        .with_attribute("id", computed_id("Name of the image builder."))
        .with_attribute("arn", computed_id("ARN of the image builder."))
        .with_attribute(
            "name",
            replace(Attribute::required_string())
                .with_description("Unique name of the image builder.")
                .with_validator(Validator::Matches {
                    pattern: NAME_PATTERN,
                    message: "must start with a letter or digit and contain only letters, \
                              digits, '_', '.' and '-' (at most 101 characters)",
                }),
        )
        .with_attribute(
            "image_name",
            replace(Attribute::optional_string())
                .with_description("Name of the image used to create the builder."),
        )
        .with_attribute(
            "image_arn",
            replace(Attribute::optional_string().computed())
                .with_description("ARN of the public, private or shared image to use.")
                .with_validator(Validator::Arn),
        )
        .with_attribute(
            "instance_type",
            replace(Attribute::required_string())
                .with_description("Instance type to use when launching the image builder."),
        )
        .with_attribute(
            "description",
            replace(Attribute::optional_string().computed())
                .with_validator(Validator::LengthBetween { min: 0, max: 256 }),
        )
        .with_attribute(
            "display_name",
            replace(Attribute::optional_string().computed())
                .with_validator(Validator::LengthBetween { min: 0, max: 100 }),
        )
        .with_attribute(
            "vpc_config",
            replace(
                Attribute::object([
                    ("subnet_ids", Attribute::string_set().optional().computed()),
                    (
                        "security_group_ids",
                        Attribute::string_set()
                            .optional()
                            .computed()
                            .with_validator(Validator::SizeBetween { min: 0, max: 5 }),
                    ),
                ])
                .optional()
                .computed(),
            ),
        )
        .with_attribute(
            "iam_role_arn",
            replace(Attribute::optional_string().computed())
                .with_validator(Validator::IamRoleArn),
        )
        .with_attribute(
            "enable_default_internet_access",
            replace(Attribute::optional_bool().computed()),
        )
        .with_attribute(
            "domain_join_info",
            replace(
                Attribute::object([
                    ("directory_name", Attribute::optional_string()),
                    (
                        "organizational_unit_distinguished_name",
                        Attribute::optional_string()
                            .with_validator(Validator::LengthBetween { min: 0, max: 2000 }),
                    ),
                ])
                .optional()
                .computed(),
            ),
        )
        .with_attribute(
            "appstream_agent_version",
            replace(Attribute::optional_string().computed()),
        )
        .with_attribute(
            "access_endpoints",
            replace(
                Attribute::set_of_objects([
                    (
                        "endpoint_type",
                        Attribute::required_string().with_validator(Validator::OneOf(&["STREAMING"])),
                    ),
                    ("vpce_id", Attribute::optional_string().computed()),
                ])
                .optional()
                .computed()
                .with_validator(Validator::SizeBetween { min: 1, max: 4 }),
            ),
        )
        .with_attribute(
            "root_volume_config",
            replace(
                Attribute::object([(
                    "volume_size_in_gb",
                    Attribute::optional_int()
                        .computed()
                        .with_validator(Validator::IntBetween { min: 200, max: 500 }),
                )])
                .optional()
                .computed(),
            ),
        )
        .with_attribute(
            "tags",
            Attribute::string_map()
                .optional()
                .with_validator(Validator::SizeBetween { min: 0, max: 50 })
                .with_validator(Validator::Tags),
        )
        .with_attribute(
            "created_time",
            computed_id("Time the image builder was created, RFC 3339."),
        )
        .with_attribute(
            "platform",
            computed_id("Operating system platform of the image builder."),
        )
        .with_attribute(
            "network_access_configuration",
            Attribute::object([
                ("eni_private_ip_address", Attribute::computed_string()),
                (
                    "eni_ipv6_addresses",
                    Attribute::string_set().computed(),
                ),
                ("eni_id", Attribute::computed_string()),
            ])
            .computed(),
        )
        .with_attribute("latest_appstream_agent_version", Attribute::computed_string())
        .with_attribute("state", Attribute::computed_string())
        .with_attribute(
            "state_change_reason",
            Attribute::object([
                ("code", Attribute::computed_string()),
                ("message", Attribute::computed_string()),
            ])
            .computed(),
        )
        .with_attribute(
            "image_builder_errors",
            Attribute::set_of_objects([
                ("error_code", Attribute::computed_string()),
                ("error_message", Attribute::computed_string()),
                ("error_timestamp", Attribute::computed_string()),
            ])
            .computed(),
        )
}
