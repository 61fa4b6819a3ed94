//! AppStream image builder resource
//!
//! Reconciles the declarative `aws_appstream_image_builder` resource with the
//! AppStream API: creation with retries around transient cloud errors, state
//! refresh, tag-only updates and a deletion state machine that stops a running
//! builder before deleting it.
//!
//! # Features
//!
//! - `aws` (default): builds [`ProviderData`] from the AWS SDK via
//!   `appstream-cloud-aws`. Without it, callers supply their own
//!   [`AppStreamApi`](appstream_cloud::AppStreamApi) and
//!   [`TaggingApi`](appstream_cloud::TaggingApi) implementations.
//!
//! # Example
//!
//! ```ignore
//! use appstream_provider::{ImageBuilderResource, ProviderConfig, ProviderData, Resource};
//! use appstream_cloud::Context;
//!
//! appstream_provider::init_logging();
//! let config = ProviderConfig::load(host_block)?;
//! let data = ProviderData::connect(&config).await?;
//! let resource = ImageBuilderResource::new(&data);
//!
//! let response = resource.read(&Context::background(), prior_state).await;
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod image_builder;
pub mod logging;
pub mod model;
pub mod plan;
pub mod resource;
pub mod schema;
pub mod validate;

pub use config::{ProviderConfig, ProviderData};
pub use error::{ProviderError, Result};
pub use image_builder::{ImageBuilderResource, TYPE_NAME, image_builder_schema};
pub use logging::{init_logging, try_init_logging};
pub use model::ImageBuilderModel;
pub use plan::{PlanModification, modify_plan};
pub use resource::{Resource, Response};
pub use schema::{Attribute, AttributeType, PlanModifier, Schema};
pub use validate::Validator;
