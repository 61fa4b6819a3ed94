//! Value bridge between the tri-state model and the cloud API shapes
//!
//! Expand (model to API): Known becomes `Some`, Null and Unknown become `None`,
//! and nested objects whose leaves are all absent collapse to `None` so the
//! request omits them. Sending an empty object is not the same as omitting it.
//!
//! Flatten (API to model): an absent field or empty container becomes Null.

use crate::model::{
    AccessEndpointModel, DomainJoinInfoModel, ImageBuilderModel, NetworkAccessConfigurationModel,
    ResourceErrorModel, StateChangeReasonModel, StringSet, VolumeConfigModel, VpcConfigModel,
};
use appstream_cloud::{
    AccessEndpoint, CreateImageBuilderInput, DomainJoinInfo, ImageBuilder, VolumeConfig,
    VpcConfig, Value,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeSet;

// ============ Expand ============

pub fn expand_string(value: &Value<String>) -> Option<String> {
    value.as_known().cloned()
}

pub fn expand_string_set(value: &Value<StringSet>) -> Option<Vec<String>> {
    value.as_known().map(|set| set.iter().cloned().collect())
}

pub fn expand_vpc_config(value: &Value<VpcConfigModel>) -> Option<VpcConfig> {
    let vpc = value.as_known()?;
    let expanded = VpcConfig {
        subnet_ids: expand_string_set(&vpc.subnet_ids),
        security_group_ids: expand_string_set(&vpc.security_group_ids),
    };
    (expanded != VpcConfig::default()).then_some(expanded)
}

pub fn expand_domain_join_info(value: &Value<DomainJoinInfoModel>) -> Option<DomainJoinInfo> {
    let info = value.as_known()?;
    let expanded = DomainJoinInfo {
        directory_name: expand_string(&info.directory_name),
        organizational_unit_distinguished_name: expand_string(
            &info.organizational_unit_distinguished_name,
        ),
    };
    (expanded != DomainJoinInfo::default()).then_some(expanded)
}

pub fn expand_access_endpoints(
    value: &Value<BTreeSet<AccessEndpointModel>>,
) -> Option<Vec<AccessEndpoint>> {
    let endpoints: Vec<AccessEndpoint> = value
        .as_known()?
        .iter()
        .filter_map(|endpoint| {
            Some(AccessEndpoint {
                endpoint_type: expand_string(&endpoint.endpoint_type)?,
                vpce_id: expand_string(&endpoint.vpce_id),
            })
        })
        .collect();
    (!endpoints.is_empty()).then_some(endpoints)
}

pub fn expand_root_volume_config(value: &Value<VolumeConfigModel>) -> Option<VolumeConfig> {
    let volume = value.as_known()?;
    let expanded = VolumeConfig {
        volume_size_in_gb: volume
            .volume_size_in_gb
            .as_known()
            .and_then(|size| i32::try_from(*size).ok()),
    };
    (expanded != VolumeConfig::default()).then_some(expanded)
}

/// Build the `CreateImageBuilder` request. Returns `None` unless `name` and
/// `instance_type` are Known.
pub fn expand_create_input(plan: &ImageBuilderModel) -> Option<CreateImageBuilderInput> {
    Some(CreateImageBuilderInput {
        name: expand_string(&plan.name)?,
        instance_type: expand_string(&plan.instance_type)?,
        image_name: expand_string(&plan.image_name),
        image_arn: expand_string(&plan.image_arn),
        description: expand_string(&plan.description),
        display_name: expand_string(&plan.display_name),
        vpc_config: expand_vpc_config(&plan.vpc_config),
        iam_role_arn: expand_string(&plan.iam_role_arn),
        enable_default_internet_access: plan.enable_default_internet_access.as_known().copied(),
        domain_join_info: expand_domain_join_info(&plan.domain_join_info),
        appstream_agent_version: expand_string(&plan.appstream_agent_version),
        access_endpoints: expand_access_endpoints(&plan.access_endpoints),
        root_volume_config: expand_root_volume_config(&plan.root_volume_config),
    })
}

// ============ Flatten ============

pub fn flatten_string(value: Option<&String>) -> Value<String> {
    match value {
        Some(v) => Value::Known(v.clone()),
        None => Value::Null,
    }
}

pub fn flatten_string_set(value: Option<&Vec<String>>) -> Value<StringSet> {
    match value {
        Some(items) if !items.is_empty() => Value::Known(items.iter().cloned().collect()),
        _ => Value::Null,
    }
}

/// RFC 3339 in UTC, e.g. `2024-01-02T15:04:05Z`
pub fn flatten_timestamp(value: Option<&DateTime<Utc>>) -> Value<String> {
    Value::from_option(value.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)))
}

pub fn flatten_vpc_config(value: Option<&VpcConfig>) -> Value<VpcConfigModel> {
    Value::from_option(value.map(|vpc| VpcConfigModel {
        subnet_ids: flatten_string_set(vpc.subnet_ids.as_ref()),
        security_group_ids: flatten_string_set(vpc.security_group_ids.as_ref()),
    }))
}

pub fn flatten_domain_join_info(value: Option<&DomainJoinInfo>) -> Value<DomainJoinInfoModel> {
    Value::from_option(value.map(|info| DomainJoinInfoModel {
        directory_name: flatten_string(info.directory_name.as_ref()),
        organizational_unit_distinguished_name: flatten_string(
            info.organizational_unit_distinguished_name.as_ref(),
        ),
    }))
}

pub fn flatten_access_endpoints(
    value: Option<&Vec<AccessEndpoint>>,
) -> Value<BTreeSet<AccessEndpointModel>> {
    match value {
        Some(endpoints) if !endpoints.is_empty() => Value::Known(
            endpoints
                .iter()
                .map(|e| AccessEndpointModel {
                    endpoint_type: Value::Known(e.endpoint_type.clone()),
                    vpce_id: flatten_string(e.vpce_id.as_ref()),
                })
                .collect(),
        ),
        _ => Value::Null,
    }
}

pub fn flatten_root_volume_config(value: Option<&VolumeConfig>) -> Value<VolumeConfigModel> {
    Value::from_option(value.map(|volume| VolumeConfigModel {
        volume_size_in_gb: Value::from_option(volume.volume_size_in_gb.map(i64::from)),
    }))
}

/// Flatten a described image builder into a state record.
///
/// `image_name` and `tags` are never part of the response and come back Null;
/// the reconciler fills them in.
pub fn flatten_image_builder(builder: &ImageBuilder) -> ImageBuilderModel {
    ImageBuilderModel {
        id: Value::Known(builder.name.clone()),
        name: Value::Known(builder.name.clone()),
        arn: flatten_string(builder.arn.as_ref()),
        image_name: Value::Null,
        image_arn: flatten_string(builder.image_arn.as_ref()),
        instance_type: flatten_string(builder.instance_type.as_ref()),
        description: flatten_string(builder.description.as_ref()),
        display_name: flatten_string(builder.display_name.as_ref()),
        vpc_config: flatten_vpc_config(builder.vpc_config.as_ref()),
        iam_role_arn: flatten_string(builder.iam_role_arn.as_ref()),
        enable_default_internet_access: Value::from_option(builder.enable_default_internet_access),
        domain_join_info: flatten_domain_join_info(builder.domain_join_info.as_ref()),
        appstream_agent_version: flatten_string(builder.appstream_agent_version.as_ref()),
        access_endpoints: flatten_access_endpoints(builder.access_endpoints.as_ref()),
        root_volume_config: flatten_root_volume_config(builder.root_volume_config.as_ref()),
        tags: Value::Null,
        created_time: flatten_timestamp(builder.created_time.as_ref()),
        platform: flatten_string(builder.platform.as_ref()),
        network_access_configuration: Value::from_option(
            builder
                .network_access_configuration
                .as_ref()
                .map(|n| NetworkAccessConfigurationModel {
                    eni_private_ip_address: flatten_string(n.eni_private_ip_address.as_ref()),
                    eni_ipv6_addresses: flatten_string_set(n.eni_ipv6_addresses.as_ref()),
                    eni_id: flatten_string(n.eni_id.as_ref()),
                }),
        ),
        latest_appstream_agent_version: flatten_string(
            builder.latest_appstream_agent_version.as_ref(),
        ),
        state: Value::from_option(builder.state.as_ref().map(|s| s.as_str().to_string())),
        state_change_reason: Value::from_option(builder.state_change_reason.as_ref().map(|r| {
            StateChangeReasonModel {
                code: flatten_string(r.code.as_ref()),
                message: flatten_string(r.message.as_ref()),
            }
        })),
        image_builder_errors: match &builder.image_builder_errors {
            Some(errors) if !errors.is_empty() => Value::Known(
                errors
                    .iter()
                    .map(|e| ResourceErrorModel {
                        error_code: flatten_string(e.error_code.as_ref()),
                        error_message: flatten_string(e.error_message.as_ref()),
                        error_timestamp: flatten_timestamp(e.error_timestamp.as_ref()),
                    })
                    .collect(),
            ),
            _ => Value::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appstream_cloud::ImageBuilderState;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn set(items: &[&str]) -> StringSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn full_plan() -> ImageBuilderModel {
        ImageBuilderModel {
            name: Value::known("ib"),
            instance_type: Value::known("stream.standard.medium"),
            image_arn: Value::known("arn:aws:appstream:eu-central-1::image/A"),
            description: Value::known("desc"),
            display_name: Value::known("Builder"),
            vpc_config: Value::Known(VpcConfigModel {
                subnet_ids: Value::Known(set(&["subnet-b", "subnet-a"])),
                security_group_ids: Value::Known(set(&["sg-1"])),
            }),
            iam_role_arn: Value::known("arn:aws:iam::123456789012:role/AppStream"),
            enable_default_internet_access: Value::Known(false),
            domain_join_info: Value::Known(DomainJoinInfoModel {
                directory_name: Value::known("corp.example.com"),
                organizational_unit_distinguished_name: Value::known("OU=AppStream,DC=corp"),
            }),
            appstream_agent_version: Value::known("LATEST"),
            access_endpoints: Value::Known(BTreeSet::from([AccessEndpointModel {
                endpoint_type: Value::known("STREAMING"),
                vpce_id: Value::known("vpce-1"),
            }])),
            root_volume_config: Value::Known(VolumeConfigModel {
                volume_size_in_gb: Value::Known(300),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_null_and_unknown_are_omitted() {
        let plan = ImageBuilderModel {
            name: Value::known("ib"),
            instance_type: Value::known("x"),
            image_name: Value::known("AppStream-Ubuntu"),
            description: Value::Unknown,
            ..Default::default()
        };
        let input = expand_create_input(&plan).unwrap();
        assert_eq!(input.image_name.as_deref(), Some("AppStream-Ubuntu"));
        assert_eq!(input.image_arn, None);
        assert_eq!(input.description, None);
        assert_eq!(input.vpc_config, None);
    }

    #[test]
    fn test_create_input_requires_name_and_instance_type() {
        let plan = ImageBuilderModel {
            name: Value::Unknown,
            instance_type: Value::known("x"),
            ..Default::default()
        };
        assert!(expand_create_input(&plan).is_none());
    }

    #[test]
    fn test_empty_nested_objects_collapse() {
        let vpc = Value::Known(VpcConfigModel {
            subnet_ids: Value::Null,
            security_group_ids: Value::Unknown,
        });
        assert_eq!(expand_vpc_config(&vpc), None);

        let volume = Value::Known(VolumeConfigModel {
            volume_size_in_gb: Value::Null,
        });
        assert_eq!(expand_root_volume_config(&volume), None);

        let domain = Value::Known(DomainJoinInfoModel::default());
        assert_eq!(expand_domain_join_info(&domain), None);
    }

    #[test]
    fn test_empty_set_is_sent_as_empty() {
        let vpc = Value::Known(VpcConfigModel {
            subnet_ids: Value::Known(StringSet::new()),
            security_group_ids: Value::Null,
        });
        assert_eq!(
            expand_vpc_config(&vpc),
            Some(VpcConfig {
                subnet_ids: Some(vec![]),
                security_group_ids: None,
            })
        );
    }

    #[test]
    fn test_flatten_of_expand_is_identity_for_known_values() {
        let plan = full_plan();
        let input = expand_create_input(&plan).unwrap();

        let described = ImageBuilder {
            name: input.name.clone(),
            instance_type: Some(input.instance_type.clone()),
            image_arn: input.image_arn.clone(),
            description: input.description.clone(),
            display_name: input.display_name.clone(),
            vpc_config: input.vpc_config.clone(),
            iam_role_arn: input.iam_role_arn.clone(),
            enable_default_internet_access: input.enable_default_internet_access,
            domain_join_info: input.domain_join_info.clone(),
            appstream_agent_version: input.appstream_agent_version.clone(),
            access_endpoints: input.access_endpoints.clone(),
            root_volume_config: input.root_volume_config.clone(),
            ..Default::default()
        };
        let flat = flatten_image_builder(&described);

        assert_eq!(flat.name, plan.name);
        assert_eq!(flat.instance_type, plan.instance_type);
        assert_eq!(flat.image_arn, plan.image_arn);
        assert_eq!(flat.description, plan.description);
        assert_eq!(flat.display_name, plan.display_name);
        assert_eq!(flat.vpc_config, plan.vpc_config);
        assert_eq!(flat.iam_role_arn, plan.iam_role_arn);
        assert_eq!(
            flat.enable_default_internet_access,
            plan.enable_default_internet_access
        );
        assert_eq!(flat.domain_join_info, plan.domain_join_info);
        assert_eq!(flat.appstream_agent_version, plan.appstream_agent_version);
        assert_eq!(flat.access_endpoints, plan.access_endpoints);
        assert_eq!(flat.root_volume_config, plan.root_volume_config);
    }

    #[test]
    fn test_flatten_absent_and_empty_are_null() {
        let builder = ImageBuilder {
            name: "ib".to_string(),
            vpc_config: Some(VpcConfig {
                subnet_ids: Some(vec![]),
                security_group_ids: None,
            }),
            access_endpoints: Some(vec![]),
            ..Default::default()
        };
        let flat = flatten_image_builder(&builder);
        assert_eq!(flat.id, Value::known("ib"));
        assert_eq!(flat.arn, Value::Null);
        assert_eq!(
            flat.vpc_config,
            Value::Known(VpcConfigModel {
                subnet_ids: Value::Null,
                security_group_ids: Value::Null,
            })
        );
        assert_eq!(flat.access_endpoints, Value::Null);
        assert_eq!(flat.domain_join_info, Value::Null);
        assert_eq!(flat.image_name, Value::Null);
        assert_eq!(flat.tags, Value::Null);
    }

    #[test]
    fn test_flatten_computed_fields() {
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap();
        let builder = ImageBuilder {
            name: "ib".to_string(),
            arn: Some("arn:aws:appstream:eu-central-1:1:image-builder/ib".to_string()),
            state: Some(ImageBuilderState::Running),
            created_time: Some(created),
            platform: Some("WINDOWS_SERVER_2019".to_string()),
            ..Default::default()
        };
        let flat = flatten_image_builder(&builder);
        assert_eq!(flat.created_time, Value::known("2024-01-02T15:04:05Z"));
        assert_eq!(flat.state, Value::known("RUNNING"));
        assert_eq!(flat.platform, Value::known("WINDOWS_SERVER_2019"));
        assert_eq!(flat.network_access_configuration, Value::Null);
        assert_eq!(flat.image_builder_errors, Value::Null);
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = flatten_string_set(Some(&vec!["b".to_string(), "a".to_string()]));
        let b = flatten_string_set(Some(&vec!["a".to_string(), "b".to_string()]));
        assert_eq!(a, b);
    }
}
