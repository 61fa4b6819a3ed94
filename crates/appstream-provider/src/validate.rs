//! Configuration validation
//!
//! Attribute validators are declared on the [`Schema`](crate::schema::Schema)
//! and evaluated against Known values only; Null and Unknown values are left to
//! the required-attribute check and to later planning rounds. The cross-field
//! image rule runs after them.

use crate::model::ImageBuilderModel;
use crate::schema::Schema;
use appstream_cloud::{AttributePath, Diagnostic, Diagnostics, TagMap, Value};
use regex::Regex;
use std::collections::BTreeSet;

pub const NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,100}$";
pub const TAG_PATTERN: &str = r"^[\p{L}\p{Z}\p{N}_.:/=+\-@]*$";

pub const MAX_TAGS: usize = 50;
pub const MAX_TAG_KEY_LEN: usize = 128;
pub const MAX_TAG_VALUE_LEN: usize = 256;

/// A single attribute-level rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    /// String length in characters
    LengthBetween { min: usize, max: usize },
    Matches {
        pattern: &'static str,
        message: &'static str,
    },
    OneOf(&'static [&'static str]),
    /// `arn:<partition>:<service>:<region>:<account>:<resource>`
    Arn,
    /// An ARN of the `iam` service whose resource is `role/...`
    IamRoleArn,
    IntBetween { min: i64, max: i64 },
    /// Element count of a set, list or map
    SizeBetween { min: usize, max: usize },
    /// Resource tag rules for keys and values
    Tags,
}

impl Validator {
    pub fn check_string(&self, value: &str) -> Result<(), String> {
        match self {
            Validator::LengthBetween { min, max } => {
                let len = value.chars().count();
                if len < *min || len > *max {
                    return Err(format!(
                        "must be between {min} and {max} characters long, got {len}"
                    ));
                }
                Ok(())
            }
            Validator::Matches { pattern, message } => {
                if matches_pattern(pattern, value)? {
                    Ok(())
                } else {
                    Err(format!("{message}, got {value:?}"))
                }
            }
            Validator::OneOf(allowed) => {
                if allowed.iter().any(|a| *a == value) {
                    Ok(())
                } else {
                    Err(format!("must be one of {allowed:?}, got {value:?}"))
                }
            }
            Validator::Arn => parse_arn(value).map(|_| ()),
            Validator::IamRoleArn => {
                let arn = parse_arn(value)?;
                if arn.service != "iam" || !arn.resource.starts_with("role/") {
                    return Err(format!("must be an IAM role ARN, got {value:?}"));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn check_int(&self, value: i64) -> Result<(), String> {
        match self {
            Validator::IntBetween { min, max } if value < *min || value > *max => {
                Err(format!("must be between {min} and {max}, got {value}"))
            }
            _ => Ok(()),
        }
    }

    pub fn check_size(&self, len: usize) -> Result<(), String> {
        match self {
            Validator::SizeBetween { min, max } if len < *min || len > *max => Err(format!(
                "must contain between {min} and {max} elements, got {len}"
            )),
            _ => Ok(()),
        }
    }

    pub fn check_map(&self, map: &TagMap) -> Result<(), String> {
        match self {
            Validator::Tags => check_tags(map),
            Validator::SizeBetween { .. } => self.check_size(map.len()),
            _ => Ok(()),
        }
    }
}

/// Tag map rules shared by resource tags and provider default tags
pub fn check_tags(tags: &TagMap) -> Result<(), String> {
    if tags.len() > MAX_TAGS {
        return Err(format!(
            "must contain at most {MAX_TAGS} tags, got {}",
            tags.len()
        ));
    }

    let keys: BTreeSet<&String> = tags.keys().collect();
    for key in keys {
        let key_len = key.chars().count();
        if key_len == 0 || key_len > MAX_TAG_KEY_LEN {
            return Err(format!(
                "tag key {key:?} must be between 1 and {MAX_TAG_KEY_LEN} characters long"
            ));
        }
        if !matches_pattern(TAG_PATTERN, key)? {
            return Err(format!("tag key {key:?} contains invalid characters"));
        }

        let value = &tags[key];
        if value.chars().count() > MAX_TAG_VALUE_LEN {
            return Err(format!(
                "value of tag {key:?} must be at most {MAX_TAG_VALUE_LEN} characters long"
            ));
        }
        if !matches_pattern(TAG_PATTERN, value)? {
            return Err(format!("value of tag {key:?} contains invalid characters"));
        }
    }
    Ok(())
}

fn matches_pattern(pattern: &str, value: &str) -> Result<bool, String> {
    Regex::new(pattern)
        .map(|re| re.is_match(value))
        .map_err(|e| format!("invalid pattern {pattern}: {e}"))
}

struct Arn<'a> {
    service: &'a str,
    resource: &'a str,
}

fn parse_arn(value: &str) -> Result<Arn<'_>, String> {
    let parts: Vec<&str> = value.splitn(6, ':').collect();
    match parts.as_slice() {
        ["arn", partition, service, _region, _account, resource]
            if !partition.is_empty() && !service.is_empty() && !resource.is_empty() =>
        {
            Ok(Arn { service, resource })
        }
        _ => Err(format!(
            "must be an ARN (arn:partition:service:region:account:resource), got {value:?}"
        )),
    }
}

/// Evaluates schema validators against a typed configuration
struct Checker<'a> {
    schema: &'a Schema,
    diags: Diagnostics,
}

impl Checker<'_> {
    fn required(&mut self, path: &AttributePath, is_null: bool) -> bool {
        let required = self
            .schema
            .attribute_at(path)
            .is_some_and(|attr| attr.required);
        if required && is_null {
            self.diags.push(
                Diagnostic::error(
                    "Missing Required Attribute",
                    format!("The argument \"{path}\" is required, but no definition was found."),
                )
                .with_attribute(path.clone()),
            );
            return false;
        }
        true
    }

    fn report(&mut self, path: &AttributePath, result: Result<(), String>) {
        if let Err(message) = result {
            self.diags.push(
                Diagnostic::error(
                    "Invalid Attribute Value",
                    format!("Attribute {path} {message}"),
                )
                .with_attribute(path.clone()),
            );
        }
    }

    fn string(&mut self, path: AttributePath, value: &Value<String>) {
        if !self.required(&path, value.is_null()) {
            return;
        }
        let schema = self.schema;
        let (Some(attr), Value::Known(value)) = (schema.attribute_at(&path), value) else {
            return;
        };
        for validator in &attr.validators {
            self.report(&path, validator.check_string(value));
        }
    }

    fn int(&mut self, path: AttributePath, value: &Value<i64>) {
        if !self.required(&path, value.is_null()) {
            return;
        }
        let schema = self.schema;
        let (Some(attr), Value::Known(value)) = (schema.attribute_at(&path), value) else {
            return;
        };
        for validator in &attr.validators {
            self.report(&path, validator.check_int(*value));
        }
    }

    fn set<T>(&mut self, path: AttributePath, value: &Value<BTreeSet<T>>) {
        if !self.required(&path, value.is_null()) {
            return;
        }
        let schema = self.schema;
        let (Some(attr), Value::Known(value)) = (schema.attribute_at(&path), value) else {
            return;
        };
        for validator in &attr.validators {
            self.report(&path, validator.check_size(value.len()));
        }
    }

    fn map(&mut self, path: AttributePath, value: &Value<TagMap>) {
        let schema = self.schema;
        let (Some(attr), Value::Known(value)) = (schema.attribute_at(&path), value) else {
            return;
        };
        for validator in &attr.validators {
            self.report(&path, validator.check_map(value));
        }
    }
}

fn root(name: &str) -> AttributePath {
    AttributePath::root(name)
}

/// Attribute-level checks followed by the image source rule
pub fn validate_config(schema: &Schema, config: &ImageBuilderModel) -> Diagnostics {
    let mut checker = Checker {
        schema,
        diags: Diagnostics::new(),
    };

    checker.string(root("name"), &config.name);
    checker.string(root("instance_type"), &config.instance_type);
    checker.string(root("image_name"), &config.image_name);
    checker.string(root("image_arn"), &config.image_arn);
    checker.string(root("description"), &config.description);
    checker.string(root("display_name"), &config.display_name);
    checker.string(root("iam_role_arn"), &config.iam_role_arn);
    checker.string(root("appstream_agent_version"), &config.appstream_agent_version);
    checker.map(root("tags"), &config.tags);

    if let Value::Known(vpc) = &config.vpc_config {
        checker.set(root("vpc_config").child("subnet_ids"), &vpc.subnet_ids);
        checker.set(
            root("vpc_config").child("security_group_ids"),
            &vpc.security_group_ids,
        );
    }

    if let Value::Known(domain) = &config.domain_join_info {
        let path = root("domain_join_info");
        checker.string(path.child("directory_name"), &domain.directory_name);
        checker.string(
            path.child("organizational_unit_distinguished_name"),
            &domain.organizational_unit_distinguished_name,
        );
    }

    checker.set(root("access_endpoints"), &config.access_endpoints);
    if let Value::Known(endpoints) = &config.access_endpoints {
        let path = root("access_endpoints");
        for endpoint in endpoints {
            checker.string(path.child("endpoint_type"), &endpoint.endpoint_type);
            checker.string(path.child("vpce_id"), &endpoint.vpce_id);
        }
    }

    if let Value::Known(volume) = &config.root_volume_config {
        checker.int(
            root("root_volume_config").child("volume_size_in_gb"),
            &volume.volume_size_in_gb,
        );
    }

    let mut diags = checker.diags;
    diags.extend(validate_image_source(config));
    diags
}

/// Exactly one of `image_name` and `image_arn` must be configured.
///
/// An Unknown value on either side defers the check until it resolves.
pub fn validate_image_source(config: &ImageBuilderModel) -> Diagnostics {
    let mut diags = Diagnostics::new();
    if config.image_name.is_unknown() || config.image_arn.is_unknown() {
        return diags;
    }

    let path = AttributePath::root("image_name");
    match (config.image_name.is_known(), config.image_arn.is_known()) {
        (true, true) => diags.push(
            Diagnostic::error(
                "Invalid Image Configuration",
                "Only one of \"image_name\" or \"image_arn\" can be configured, but both were set.",
            )
            .with_attribute(path),
        ),
        (false, false) => diags.push(missing_image_source()),
        _ => {}
    }
    diags
}

/// Apply-time form of [`validate_image_source`]: a value that is still
/// Unknown counts as unset, so the request always carries an image source.
pub fn require_image_source(plan: &ImageBuilderModel) -> Diagnostics {
    let mut diags = validate_image_source(plan);
    if diags.is_empty() && !plan.image_name.is_known() && !plan.image_arn.is_known() {
        diags.push(missing_image_source());
    }
    diags
}

fn missing_image_source() -> Diagnostic {
    Diagnostic::error(
        "Missing Required Attribute",
        "Exactly one of \"image_name\" or \"image_arn\" must be configured.",
    )
    .with_attribute(AttributePath::root("image_name"))
}
