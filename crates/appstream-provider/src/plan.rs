//! Plan modification

use crate::model::ImageBuilderModel;
use crate::schema::{PlanModifier, Schema};
use appstream_cloud::{AttributePath, DefaultTags, TagMap, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanModification<M = ImageBuilderModel> {
    pub plan: M,
    /// Attributes whose change destroys and recreates the image builder
    pub requires_replace: Vec<AttributePath>,
    /// Tags the cloud will carry once applied: `merge(default_tags, plan.tags)`
    pub effective_tags: Value<TagMap>,
}

impl<M> PlanModification<M> {
    pub fn needs_replacement(&self) -> bool {
        !self.requires_replace.is_empty()
    }
}

/// Adjust `plan` against the prior state.
///
/// Unknown computed identifiers take their prior value, and every changed
/// attribute marked `RequiresReplace` is reported. A Null or Unknown plan value
/// for an optional+computed attribute is not a change: the cloud decides it.
pub fn modify_plan(
    schema: &Schema,
    default_tags: &DefaultTags,
    prior: Option<&ImageBuilderModel>,
    mut plan: ImageBuilderModel,
) -> PlanModification {
    let mut requires_replace = Vec::new();

    if let Some(prior) = prior {
        let keep = |name: &str| {
            schema
                .attribute(name)
                .is_some_and(|attr| attr.has_plan_modifier(PlanModifier::UseStateForUnknown))
        };
        if keep("id") {
            plan.id = plan.id.or_known(&prior.id);
        }
        if keep("arn") {
            plan.arn = plan.arn.or_known(&prior.arn);
        }
        if keep("created_time") {
            plan.created_time = plan.created_time.or_known(&prior.created_time);
        }
        if keep("platform") {
            plan.platform = plan.platform.or_known(&prior.platform);
        }

        let presence = plan.presence();
        for name in plan.changed_from(prior) {
            let Some(attr) = schema.attribute(name) else {
                continue;
            };
            if !attr.requires_replace() {
                continue;
            }
            let unset = presence
                .iter()
                .any(|(field, value)| *field == name && value.is_null_or_unknown());
            if attr.computed && unset {
                continue;
            }
            requires_replace.push(AttributePath::root(name));
        }
    }

    let effective_tags = match &plan.tags {
        Value::Unknown => Value::Unknown,
        Value::Null if default_tags.is_empty() => Value::Null,
        desired => Value::Known(default_tags.merge(desired)),
    };

    if !requires_replace.is_empty() {
        tracing::debug!(
            name = ?plan.name.as_str(),
            attributes = ?requires_replace.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "planned change requires replacement"
        );
    }

    PlanModification {
        plan,
        requires_replace,
        effective_tags,
    }
}
