//! Provider configuration
//!
//! `ProviderConfig` is read from the environment and from the host's provider
//! block; explicit host values win. Once configured, [`ProviderData`] is the
//! immutable bag of cloud clients and default tags shared by every resource.

use crate::error::{ProviderError, Result};
use crate::validate::check_tags;
use anyhow::Context as _;
use appstream_cloud::{
    AppStreamApi, AttributePath, DefaultTags, Diagnostic, Diagnostics, TagManager, TaggingApi,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const ENDPOINT_URL_ENV: &str = "APPSTREAM_ENDPOINT_URL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    /// Custom API endpoint, e.g. a local emulator
    pub endpoint_url: Option<String>,
    pub default_tags: DefaultTags,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl ProviderConfig {
    /// Create ProviderConfig from environment variables
    pub fn from_env() -> Self {
        Self {
            region: env_var("AWS_REGION").or_else(|| env_var("AWS_DEFAULT_REGION")),
            profile: env_var("AWS_PROFILE"),
            endpoint_url: env_var(ENDPOINT_URL_ENV),
            default_tags: DefaultTags::default(),
        }
    }

    /// Parse the host's provider block
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ProviderError::InvalidConfig(e.to_string()))
    }

    /// Overlay `other` on top of `self`; values set in `other` win
    pub fn merge(self, other: ProviderConfig) -> Self {
        Self {
            region: other.region.or(self.region),
            profile: other.profile.or(self.profile),
            endpoint_url: other.endpoint_url.or(self.endpoint_url),
            default_tags: if other.default_tags.is_empty() {
                self.default_tags
            } else {
                other.default_tags
            },
        }
    }

    pub fn validate(&self) -> Diagnostics {
        let mut diags = Diagnostics::new();

        if let Err(message) = check_tags(&self.default_tags.tags) {
            diags.push(
                Diagnostic::error("Invalid Default Tags", format!("default_tags {message}"))
                    .with_attribute(AttributePath::root("default_tags").child("tags")),
            );
        }

        if let Some(url) = &self.endpoint_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                diags.push(
                    Diagnostic::error(
                        "Invalid Endpoint URL",
                        format!("endpoint_url must be an http(s) URL, got {url:?}"),
                    )
                    .with_attribute(AttributePath::root("endpoint_url")),
                );
            }
        }

        diags
    }

    /// Environment overlaid with the host block, then validated
    pub fn load(host_config: serde_json::Value) -> anyhow::Result<Self> {
        let explicit = Self::from_json(host_config).context("failed to parse provider block")?;
        let config = Self::from_env().merge(explicit);

        let diags = config.validate();
        if diags.has_error() {
            let details: Vec<String> = diags.errors().map(|d| d.detail.clone()).collect();
            anyhow::bail!("invalid provider configuration: {}", details.join("; "));
        }

        tracing::debug!(
            region = ?config.region,
            profile = ?config.profile,
            default_tags = config.default_tags.tags.len(),
            "provider configuration loaded"
        );
        Ok(config)
    }

    #[cfg(feature = "aws")]
    pub fn sdk_settings(&self) -> appstream_cloud_aws::SdkSettings {
        appstream_cloud_aws::SdkSettings {
            region: self.region.clone(),
            profile: self.profile.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }
}

/// Provider-level clients and default tags, built once at configuration
#[derive(Clone)]
pub struct ProviderData {
    pub appstream: Arc<dyn AppStreamApi>,
    pub tagging: Arc<dyn TaggingApi>,
    pub default_tags: DefaultTags,
}

impl ProviderData {
    pub fn new(
        appstream: Arc<dyn AppStreamApi>,
        tagging: Arc<dyn TaggingApi>,
        default_tags: DefaultTags,
    ) -> Self {
        Self {
            appstream,
            tagging,
            default_tags,
        }
    }

    pub fn tag_manager(&self) -> TagManager {
        TagManager::new(self.tagging.clone(), self.default_tags.clone())
    }

    /// Build the AWS SDK clients for `config`
    #[cfg(feature = "aws")]
    pub async fn connect(config: &ProviderConfig) -> anyhow::Result<Self> {
        let clients = appstream_cloud_aws::connect(&config.sdk_settings())
            .await
            .map_err(ProviderError::from)
            .context("failed to configure AWS clients")?;
        Ok(Self::new(
            clients.appstream,
            clients.tagging,
            config.default_tags.clone(),
        ))
    }
}
