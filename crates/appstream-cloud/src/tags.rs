//! Tag management
//!
//! Reconciles a desired tag map against the tags the resource-tagging service
//! reports for an ARN. Provider-level default tags are merged underneath the
//! resource's own tags; the resource wins on key collision.
//!
//! Reconciliation is last-writer-wins against out-of-band edits. The host
//! serialises reconciliations of the same resource.

use crate::api::TaggingApi;
use crate::classify::{is_canceled, is_concurrent_modification, is_not_found};
use crate::context::Context;
use crate::diagnostics::Diagnostics;
use crate::error::{CloudError, Result, TagFailure};
use crate::retry::{RetryConfig, retry};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

pub type TagMap = HashMap<String, String>;

const TAG_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const TAG_INITIAL_DELAY: Duration = Duration::from_secs(2);
const TAG_MAX_DELAY: Duration = Duration::from_secs(30);

/// Provider-level tags applied to every resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultTags {
    #[serde(default)]
    pub tags: TagMap,
}

impl DefaultTags {
    pub fn new(tags: TagMap) -> Self {
        Self { tags }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// `merge(default_tags, desired)`, desired wins on collision
    pub fn merge(&self, desired: &Value<TagMap>) -> TagMap {
        let mut merged = self.tags.clone();
        if let Value::Known(tags) = desired {
            merged.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }
}

/// Changes needed to move the current tags to the effective ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDelta {
    pub to_set: TagMap,
    pub to_remove: Vec<String>,
}

impl TagDelta {
    pub fn compute(current: &TagMap, effective: &TagMap) -> Self {
        let to_set = effective
            .iter()
            .filter(|(k, v)| current.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut to_remove: Vec<String> = current
            .keys()
            .filter(|k| !effective.contains_key(*k))
            .cloned()
            .collect();
        to_remove.sort();
        Self { to_set, to_remove }
    }

    pub fn is_empty(&self) -> bool {
        self.to_set.is_empty() && self.to_remove.is_empty()
    }
}

/// Synchronises resource tags through the generic tagging API
#[derive(Clone)]
pub struct TagManager {
    client: Arc<dyn TaggingApi>,
    default_tags: DefaultTags,
}

impl TagManager {
    pub fn new(client: Arc<dyn TaggingApi>, default_tags: DefaultTags) -> Self {
        Self {
            client,
            default_tags,
        }
    }

    pub fn default_tags(&self) -> &DefaultTags {
        &self.default_tags
    }

    /// Tags the cloud should carry for `desired`
    pub fn effective(&self, desired: &Value<TagMap>) -> TagMap {
        self.default_tags.merge(desired)
    }

    /// Read the cloud-side tags of `arn`.
    ///
    /// Default tags are not merged back in: state only ever sees what the
    /// cloud echoes. Cancellation is returned as an error so the caller can
    /// keep the tags it already had.
    pub async fn read(&self, ctx: &Context, arn: &str) -> Result<(Value<TagMap>, Diagnostics)> {
        let mut diags = Diagnostics::new();
        match self.current_tags(ctx, arn).await {
            Ok(tags) if tags.is_empty() && self.default_tags.is_empty() => Ok((Value::Null, diags)),
            Ok(tags) => Ok((Value::Known(tags), diags)),
            Err(e) if is_canceled(&e) => Err(e),
            Err(e) if is_not_found(&e) => Ok((Value::Null, diags)),
            Err(e) => {
                diags.add_error(
                    "Error Reading Tags",
                    format!("Could not read tags for {arn}: {e}"),
                );
                Ok((Value::Null, diags))
            }
        }
    }

    /// Converge the tags of `arn` to `merge(default_tags, desired)`.
    ///
    /// A Null or Unknown desired map with no default tags leaves the
    /// resource's tags untouched.
    pub async fn apply(&self, ctx: &Context, arn: &str, desired: &Value<TagMap>) -> Result<()> {
        if desired.is_null_or_unknown() && self.default_tags.is_empty() {
            tracing::debug!(arn, "no tags configured, skipping tag reconciliation");
            return Ok(());
        }

        let effective = self.effective(desired);
        let current = self.current_tags(ctx, arn).await?;
        let delta = TagDelta::compute(&current, &effective);

        if delta.is_empty() {
            tracing::debug!(arn, "tags already up to date");
            return Ok(());
        }

        let config = RetryConfig::new(TAG_TIMEOUT, TAG_INITIAL_DELAY, TAG_MAX_DELAY)
            .retry_on(is_concurrent_modification);

        if !delta.to_set.is_empty() {
            tracing::info!(arn, count = delta.to_set.len(), "setting tags");
            retry(ctx, &config, "TagResources", |ctx| {
                let tags = delta.to_set.clone();
                async move {
                    let failures = ctx
                        .run(self.client.tag_resources(vec![arn.to_string()], tags))
                        .await?;
                    check_failures(arn, failures)
                }
            })
            .await
            .map_err(|e| e.context(format!("tagging {arn}")))?;
        }

        if !delta.to_remove.is_empty() {
            tracing::info!(arn, keys = ?delta.to_remove, "removing tags");
            retry(ctx, &config, "UntagResources", |ctx| {
                let keys = delta.to_remove.clone();
                async move {
                    let failures = ctx
                        .run(self.client.untag_resources(vec![arn.to_string()], keys))
                        .await?;
                    check_failures(arn, failures)
                }
            })
            .await
            .map_err(|e| e.context(format!("untagging {arn}")))?;
        }

        Ok(())
    }

    async fn current_tags(&self, ctx: &Context, arn: &str) -> Result<TagMap> {
        let mappings = ctx
            .run(self.client.get_resources(vec![arn.to_string()]))
            .await?;
        Ok(mappings
            .into_iter()
            .find(|m| m.resource_arn == arn)
            .map(|m| m.tags)
            .unwrap_or_default())
    }
}

fn check_failures(arn: &str, failures: HashMap<String, TagFailure>) -> Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    Err(CloudError::Tagging {
        arn: arn.to_string(),
        failures: failures.into_iter().collect::<BTreeMap<_, _>>(),
    })
}
