//! Image builder resource model
//!
//! Every attribute is a tri-state [`Value`]. The model doubles as the persisted
//! state record: Null serializes to JSON `null`, Known to the value, and an
//! Unknown value refuses to serialize.

use crate::error::Result;
use appstream_cloud::{TagMap, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type StringSet = BTreeSet<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBuilderModel {
    pub id: Value<String>,
    pub name: Value<String>,
    pub arn: Value<String>,
    pub image_name: Value<String>,
    pub image_arn: Value<String>,
    pub instance_type: Value<String>,
    pub description: Value<String>,
    pub display_name: Value<String>,
    pub vpc_config: Value<VpcConfigModel>,
    pub iam_role_arn: Value<String>,
    pub enable_default_internet_access: Value<bool>,
    pub domain_join_info: Value<DomainJoinInfoModel>,
    pub appstream_agent_version: Value<String>,
    pub access_endpoints: Value<BTreeSet<AccessEndpointModel>>,
    pub root_volume_config: Value<VolumeConfigModel>,
    pub tags: Value<TagMap>,

    // Computed
    pub created_time: Value<String>,
    pub platform: Value<String>,
    pub network_access_configuration: Value<NetworkAccessConfigurationModel>,
    pub latest_appstream_agent_version: Value<String>,
    pub state: Value<String>,
    pub state_change_reason: Value<StateChangeReasonModel>,
    pub image_builder_errors: Value<BTreeSet<ResourceErrorModel>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct VpcConfigModel {
    pub subnet_ids: Value<StringSet>,
    pub security_group_ids: Value<StringSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainJoinInfoModel {
    pub directory_name: Value<String>,
    pub organizational_unit_distinguished_name: Value<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessEndpointModel {
    pub endpoint_type: Value<String>,
    pub vpce_id: Value<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfigModel {
    pub volume_size_in_gb: Value<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkAccessConfigurationModel {
    pub eni_private_ip_address: Value<String>,
    pub eni_ipv6_addresses: Value<StringSet>,
    pub eni_id: Value<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct StateChangeReasonModel {
    pub code: Value<String>,
    pub message: Value<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceErrorModel {
    pub error_code: Value<String>,
    pub error_message: Value<String>,
    pub error_timestamp: Value<String>,
}

/// Name-keyed access to the configurable attributes, in schema naming
macro_rules! configurable_attributes {
    ($($field:ident),* $(,)?) => {
        impl ImageBuilderModel {
            /// Presence (Null, Unknown or Known) of each configurable attribute
            pub fn presence(&self) -> Vec<(&'static str, Value<()>)> {
                vec![$((stringify!($field), self.$field.as_ref().map(|_| ()))),*]
            }

            /// Configurable attributes whose value differs from `other`
            pub fn changed_from(&self, other: &Self) -> Vec<&'static str> {
                let mut changed = Vec::new();
                $(
                    if self.$field != other.$field {
                        changed.push(stringify!($field));
                    }
                )*
                changed
            }
        }
    };
}

configurable_attributes!(
    name,
    image_name,
    image_arn,
    instance_type,
    description,
    display_name,
    vpc_config,
    iam_role_arn,
    enable_default_internet_access,
    domain_join_info,
    appstream_agent_version,
    access_endpoints,
    root_volume_config,
    tags,
);

impl ImageBuilderModel {
    /// Seed a state from an import identifier
    pub fn from_import_id(id: &str) -> Self {
        Self {
            id: Value::known(id),
            name: Value::known(id),
            ..Default::default()
        }
    }

    /// The name identifying the builder in the cloud, falling back to `id`
    pub fn identifier(&self) -> Option<&str> {
        self.name.as_str().or_else(|| self.id.as_str())
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
