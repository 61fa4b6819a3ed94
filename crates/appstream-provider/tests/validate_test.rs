//! Plan-time validation of image builder configurations

mod common;

use appstream_cloud::{AttributePath, Diagnostic, Value};
use appstream_provider::model::{AccessEndpointModel, VolumeConfigModel, VpcConfigModel};
use appstream_provider::{ImageBuilderModel, Resource};
use common::{FakeAppStream, FakeTagging, resource, tags};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn validate(config: &ImageBuilderModel) -> Vec<Diagnostic> {
    let resource = resource(&FakeAppStream::new(), &FakeTagging::new(), &[]);
    resource.validate_config(config).iter().cloned().collect()
}

fn config() -> ImageBuilderModel {
    ImageBuilderModel {
        name: Value::known("b1"),
        instance_type: Value::known("stream.standard.medium"),
        image_name: Value::known("AppStream-Ubuntu"),
        ..Default::default()
    }
}

fn attribute_of(diag: &Diagnostic) -> Option<Vec<String>> {
    diag.attribute.as_ref().map(|p| p.steps().to_vec())
}

#[test]
fn test_minimal_config_is_valid() {
    assert!(validate(&config()).is_empty());
}

#[test]
fn test_image_name_and_image_arn_are_exclusive() {
    let diags = validate(&ImageBuilderModel {
        image_arn: Value::known("arn:aws:appstream:eu-central-1::image/AppStream-Ubuntu"),
        ..config()
    });

    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].summary, "Invalid Image Configuration");
    assert_eq!(
        diags[0].attribute,
        Some(AttributePath::root("image_name"))
    );
}

#[test]
fn test_one_image_source_is_required() {
    let diags = validate(&ImageBuilderModel {
        image_name: Value::Null,
        ..config()
    });

    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].summary, "Missing Required Attribute");
    assert_eq!(attribute_of(&diags[0]), Some(vec!["image_name".to_string()]));
}

#[test]
fn test_image_arn_alone_is_valid() {
    let diags = validate(&ImageBuilderModel {
        image_name: Value::Null,
        image_arn: Value::known("arn:aws:appstream:eu-central-1::image/AppStream-Ubuntu"),
        ..config()
    });
    assert!(diags.is_empty(), "{diags:?}");
}

#[test]
fn test_unknown_image_source_defers_the_check() {
    let diags = validate(&ImageBuilderModel {
        image_arn: Value::Unknown,
        ..config()
    });
    assert!(diags.is_empty(), "{diags:?}");

    let diags = validate(&ImageBuilderModel {
        image_name: Value::Unknown,
        image_arn: Value::Null,
        ..config()
    });
    assert!(diags.is_empty(), "{diags:?}");
}

#[test]
fn test_missing_instance_type() {
    let diags = validate(&ImageBuilderModel {
        instance_type: Value::Null,
        ..config()
    });

    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].summary, "Missing Required Attribute");
    assert_eq!(
        diags[0].attribute,
        Some(AttributePath::root("instance_type"))
    );
}

#[test]
fn test_invalid_name() {
    let too_long = "x".repeat(102);
    for name in ["-leading-dash", "has space", too_long.as_str()] {
        let diags = validate(&ImageBuilderModel {
            name: Value::known(name),
            ..config()
        });
        assert_eq!(diags.len(), 1, "name {name:?}");
        assert_eq!(diags[0].summary, "Invalid Attribute Value");
        assert_eq!(diags[0].attribute, Some(AttributePath::root("name")));
    }
}

#[test]
fn test_iam_role_arn_must_be_a_role() {
    let diags = validate(&ImageBuilderModel {
        iam_role_arn: Value::known("arn:aws:iam::123456789012:user/builder"),
        ..config()
    });
    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags[0].attribute,
        Some(AttributePath::root("iam_role_arn"))
    );

    let diags = validate(&ImageBuilderModel {
        iam_role_arn: Value::known("arn:aws:iam::123456789012:role/appstream-builder"),
        ..config()
    });
    assert!(diags.is_empty(), "{diags:?}");
}

#[test]
fn test_root_volume_size_bounds() {
    let volume = |size: i64| ImageBuilderModel {
        root_volume_config: Value::Known(VolumeConfigModel {
            volume_size_in_gb: Value::Known(size),
        }),
        ..config()
    };

    assert!(validate(&volume(200)).is_empty());
    assert!(validate(&volume(500)).is_empty());

    let diags = validate(&volume(100));
    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags[0].attribute,
        Some(AttributePath::root("root_volume_config").child("volume_size_in_gb"))
    );
}

#[test]
fn test_too_many_security_groups() {
    let groups: BTreeSet<String> = (0..6).map(|i| format!("sg-{i}")).collect();
    let diags = validate(&ImageBuilderModel {
        vpc_config: Value::Known(VpcConfigModel {
            subnet_ids: Value::Known(BTreeSet::from(["subnet-1".to_string()])),
            security_group_ids: Value::Known(groups),
        }),
        ..config()
    });

    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags[0].attribute,
        Some(AttributePath::root("vpc_config").child("security_group_ids"))
    );
}

#[test]
fn test_access_endpoint_type() {
    let endpoints = |types: &[&str]| ImageBuilderModel {
        access_endpoints: Value::Known(
            types
                .iter()
                .enumerate()
                .map(|(i, t)| AccessEndpointModel {
                    endpoint_type: Value::known(*t),
                    vpce_id: Value::known(format!("vpce-{i}")),
                })
                .collect(),
        ),
        ..config()
    };

    assert!(validate(&endpoints(&["STREAMING"])).is_empty());

    let diags = validate(&endpoints(&["WEB"]));
    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags[0].attribute,
        Some(AttributePath::root("access_endpoints").child("endpoint_type"))
    );

    let diags = validate(&endpoints(&["STREAMING"; 5]));
    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags[0].attribute,
        Some(AttributePath::root("access_endpoints"))
    );
}

#[test]
fn test_invalid_tags() {
    let diags = validate(&ImageBuilderModel {
        tags: Value::Known(tags(&[("bad*key", "x")])),
        ..config()
    });
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].attribute, Some(AttributePath::root("tags")));

    let too_many = (0..51).map(|i| (format!("k{i}"), "v".to_string())).collect();
    let diags = validate(&ImageBuilderModel {
        tags: Value::Known(too_many),
        ..config()
    });
    assert!(!diags.is_empty());
    assert!(diags.iter().all(|d| d.attribute == Some(AttributePath::root("tags"))));
}

#[test]
fn test_unknown_values_are_not_validated() {
    let diags = validate(&ImageBuilderModel {
        name: Value::Unknown,
        description: Value::Unknown,
        tags: Value::Unknown,
        ..config()
    });
    assert!(diags.is_empty(), "{diags:?}");
}
