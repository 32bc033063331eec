//! Resource specs (flavors) and the create-boundary normalization
//!
//! A [`ResourceSpec`] is what the user writes. An [`OrderRequest`] is what
//! the provider receives. The only path from one to the other is
//! [`build_order`], which applies the billing override, lifts `tags` out
//! (tags are set after creation), renames fields through the kind's
//! [`FieldRename`] table and adds the identity and SSH key.

use crate::error::{CloudError, Result};
use crate::provider::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Billing mode of a new resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    #[default]
    Hourly,
    Monthly,
}

impl BillingMode {
    pub fn is_hourly(self) -> bool {
        self == BillingMode::Hourly
    }
}

/// User-facing description of a resource to create
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceSpec(BTreeMap<String, Value>);

impl ResourceSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in profile used when the caller supplies no spec
    pub fn default_for(kind: ResourceKind) -> Self {
        let profile = match kind {
            ResourceKind::VirtualGuest => json!({
                "private": true,
                "dedicated": false,
                "hourly": true,
                "datacenter": "par01",
                "cpus": 1,
                "memory": 1024,
                "nic_speed": 1000,
                "local_disk": true,
                "disks": [25],
                "os_code": "UBUNTU_14_64",
                "tags": "mytag",
            }),
            ResourceKind::BareMetal => json!({
                "hourly": true,
                "private": true,
                "datacenter": "par01",
                "size": "S1270_8GB_2X1TBSATA_NORAID",
                "os_code": "UBUNTU_14_64",
                "port_speed": 100,
                "tags": "mytag",
            }),
        };
        Self::from_value(profile).unwrap_or_default()
    }

    /// Build from a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(CloudError::InvalidSpec(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

/// One entry of a normalization table
#[derive(Debug, Clone, Copy)]
pub struct FieldRename {
    pub from: &'static str,
    pub to: &'static str,
    pub transform: fn(Value) -> Value,
}

fn keep(value: Value) -> Value {
    value
}

/// Accept the usual truthy/falsy strings for flags
fn flag(value: Value) -> Value {
    match value {
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" | "on" => Value::Bool(true),
            "no" | "false" | "0" | "off" => Value::Bool(false),
            _ => Value::String(s),
        },
        other => other,
    }
}

/// Bare-metal orders use location/os/no_public
pub const BARE_METAL_RENAMES: &[FieldRename] = &[
    FieldRename {
        from: "os_code",
        to: "os",
        transform: keep,
    },
    FieldRename {
        from: "datacenter",
        to: "location",
        transform: keep,
    },
    FieldRename {
        from: "private",
        to: "no_public",
        transform: flag,
    },
];

/// Guest orders keep the user-facing names; only flags are coerced
pub const VIRTUAL_GUEST_RENAMES: &[FieldRename] = &[
    FieldRename {
        from: "private",
        to: "private",
        transform: flag,
    },
    FieldRename {
        from: "dedicated",
        to: "dedicated",
        transform: flag,
    },
    FieldRename {
        from: "local_disk",
        to: "local_disk",
        transform: flag,
    },
];

pub fn normalization_table(kind: ResourceKind) -> &'static [FieldRename] {
    match kind {
        ResourceKind::VirtualGuest => VIRTUAL_GUEST_RENAMES,
        ResourceKind::BareMetal => BARE_METAL_RENAMES,
    }
}

/// Apply a normalization table; keys without an entry pass through
pub fn normalize(table: &[FieldRename], spec: ResourceSpec) -> OrderRequest {
    let mut fields = spec.0;
    for rename in table {
        if let Some(value) = fields.remove(rename.from) {
            fields.insert(rename.to.to_string(), (rename.transform)(value));
        }
    }
    OrderRequest(fields)
}

/// Parse a tags value: a comma-separated string or a list of strings
pub fn parse_tags(value: &Value) -> Result<Vec<String>> {
    let tags: Vec<String> = match value {
        Value::Null => Vec::new(),
        Value::String(s) => s.split(',').map(|t| t.trim().to_string()).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(|s| s.trim().to_string()).ok_or_else(|| {
                    CloudError::InvalidSpec(format!("tag must be a string, got {}", item))
                })
            })
            .collect::<Result<_>>()?,
        other => {
            return Err(CloudError::InvalidSpec(format!(
                "tags must be a string or a list, got {}",
                other
            )));
        }
    };
    Ok(tags.into_iter().filter(|t| !t.is_empty()).collect())
}

/// The provider-facing order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderRequest(BTreeMap<String, Value>);

impl OrderRequest {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

/// A normalized order and the tags to apply once it exists
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedOrder {
    pub request: OrderRequest,
    pub deferred_tags: Option<Vec<String>>,
}

/// Turn a user spec into the provider order for `hostname.domain`
pub fn build_order(
    kind: ResourceKind,
    spec: &ResourceSpec,
    billing: BillingMode,
    hostname: &str,
    domain: &str,
    ssh_key_id: u64,
) -> Result<PreparedOrder> {
    let mut spec = spec.clone();
    spec.insert("hourly", Value::Bool(billing.is_hourly()));

    let deferred_tags = spec
        .remove("tags")
        .map(|value| parse_tags(&value))
        .transpose()?
        .filter(|tags| !tags.is_empty());

    let mut request = normalize(normalization_table(kind), spec);
    request.0.insert("hostname".to_string(), json!(hostname));
    request.0.insert("domain".to_string(), json!(domain));
    request.0.insert("ssh_keys".to_string(), json!([ssh_key_id]));

    Ok(PreparedOrder {
        request,
        deferred_tags,
    })
}
