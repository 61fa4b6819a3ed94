//! AWS backend for the AppStream provider
//!
//! Implements the [`AppStreamApi`] and [`TaggingApi`] traits of
//! `appstream-cloud` on top of the official AWS SDK.
//!
//! # Requirements
//!
//! - AWS credentials resolvable by the default provider chain
//!   (environment, shared profile, SSO, instance metadata)
//! - A region, either explicit or from the environment/profile
//!
//! # Example
//!
//! ```ignore
//! use appstream_cloud_aws::{SdkSettings, connect};
//!
//! let clients = connect(&SdkSettings {
//!     region: Some("eu-central-1".into()),
//!     ..Default::default()
//! })
//! .await?;
//! let builders = clients.appstream.describe_image_builders(vec!["ib".into()]).await?;
//! ```

pub mod appstream;
mod convert;
pub mod error;
pub mod tagging;

pub use appstream::AwsAppStream;
pub use error::{AwsError, Result};
pub use tagging::AwsTagging;

use appstream_cloud::{AppStreamApi, TaggingApi};
use aws_config::{BehaviorVersion, Region};
use std::sync::Arc;

/// Settings used to build the shared SDK configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
    /// Custom endpoint, e.g. a local API emulator
    pub endpoint_url: Option<String>,
}

/// API clients sharing one SDK configuration
#[derive(Clone)]
pub struct Clients {
    pub appstream: Arc<dyn AppStreamApi>,
    pub tagging: Arc<dyn TaggingApi>,
}

/// Load the SDK configuration from `settings` and the default chains
pub async fn load_sdk_config(settings: &SdkSettings) -> Result<aws_config::SdkConfig> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &settings.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &settings.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(endpoint_url) = &settings.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    let config = loader.load().await;
    match config.region() {
        Some(region) => {
            tracing::info!(region = %region, profile = ?settings.profile, "AWS SDK configured");
            Ok(config)
        }
        None => Err(AwsError::MissingRegion),
    }
}

/// Build the AppStream and tagging clients
pub async fn connect(settings: &SdkSettings) -> Result<Clients> {
    let config = load_sdk_config(settings).await?;
    Ok(Clients {
        appstream: Arc::new(AwsAppStream::new(&config)),
        tagging: Arc::new(AwsTagging::new(&config)),
    })
}
