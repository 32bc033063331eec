//! Order templates
//!
//! Translate a normalized `OrderRequest` into the object template the
//! SoftLayer create and order-template calls expect.

use crate::error::{Result, SoftLayerError};
use serde_json::{Map, Value, json};
use slflow_cloud::OrderRequest;

const GUEST_KEYS: &[&str] = &[
    "hostname",
    "domain",
    "cpus",
    "memory",
    "hourly",
    "dedicated",
    "datacenter",
    "os_code",
    "private",
    "local_disk",
    "nic_speed",
    "disks",
    "ssh_keys",
    "post_uri",
    "user_data",
];

const HARDWARE_KEYS: &[&str] = &[
    "hostname",
    "domain",
    "size",
    "os",
    "location",
    "no_public",
    "hourly",
    "port_speed",
    "ssh_keys",
    "post_uri",
];

/// `SoftLayer_Virtual_Guest` template
pub fn guest_template(request: &OrderRequest) -> Result<Value> {
    ignore_unknown_keys(request, GUEST_KEYS);

    let mut template = Map::new();
    template.insert("hostname".into(), json!(required_str(request, "hostname")?));
    template.insert("domain".into(), json!(required_str(request, "domain")?));
    template.insert("startCpus".into(), json!(required_u64(request, "cpus")?));
    template.insert("maxMemory".into(), json!(required_u64(request, "memory")?));
    template.insert(
        "datacenter".into(),
        json!({ "name": required_str(request, "datacenter")? }),
    );
    template.insert(
        "operatingSystemReferenceCode".into(),
        json!(required_str(request, "os_code")?),
    );
    template.insert(
        "hourlyBillingFlag".into(),
        json!(optional_bool(request, "hourly")?.unwrap_or(true)),
    );
    template.insert(
        "localDiskFlag".into(),
        json!(optional_bool(request, "local_disk")?.unwrap_or(true)),
    );

    if let Some(dedicated) = optional_bool(request, "dedicated")? {
        template.insert("dedicatedAccountHostOnlyFlag".into(), json!(dedicated));
    }
    if let Some(private) = optional_bool(request, "private")? {
        template.insert("privateNetworkOnlyFlag".into(), json!(private));
    }
    if let Some(speed) = request.get_u64("nic_speed") {
        template.insert("networkComponents".into(), json!([{ "maxSpeed": speed }]));
    }
    if let Some(disks) = request.get("disks") {
        template.insert("blockDevices".into(), block_devices(disks)?);
    }
    insert_common(&mut template, request)?;
    if let Some(user_data) = request.get_str("user_data") {
        template.insert("userData".into(), json!([{ "value": user_data }]));
    }

    Ok(Value::Object(template))
}

/// `SoftLayer_Hardware` template ordered from a fixed configuration preset
pub fn hardware_template(request: &OrderRequest) -> Result<Value> {
    ignore_unknown_keys(request, HARDWARE_KEYS);

    let mut template = Map::new();
    template.insert("hostname".into(), json!(required_str(request, "hostname")?));
    template.insert("domain".into(), json!(required_str(request, "domain")?));
    template.insert(
        "fixedConfigurationPreset".into(),
        json!({ "keyName": required_str(request, "size")? }),
    );
    template.insert(
        "operatingSystemReferenceCode".into(),
        json!(required_str(request, "os")?),
    );
    template.insert(
        "datacenter".into(),
        json!({ "name": required_str(request, "location")? }),
    );
    template.insert(
        "hourlyBillingFlag".into(),
        json!(optional_bool(request, "hourly")?.unwrap_or(true)),
    );

    if let Some(no_public) = optional_bool(request, "no_public")? {
        template.insert("privateNetworkOnlyFlag".into(), json!(no_public));
    }
    if let Some(speed) = request.get_u64("port_speed") {
        template.insert("networkComponents".into(), json!([{ "maxSpeed": speed }]));
    }
    insert_common(&mut template, request)?;

    Ok(Value::Object(template))
}

fn insert_common(template: &mut Map<String, Value>, request: &OrderRequest) -> Result<()> {
    if let Some(keys) = request.get("ssh_keys") {
        let ids = keys
            .as_array()
            .ok_or_else(|| invalid("ssh_keys", "a list of key ids"))?
            .iter()
            .map(|id| {
                id.as_u64()
                    .map(|id| json!({ "id": id }))
                    .ok_or_else(|| invalid("ssh_keys", "a list of key ids"))
            })
            .collect::<Result<Vec<_>>>()?;
        template.insert("sshKeys".into(), Value::Array(ids));
    }
    if let Some(uri) = request.get_str("post_uri") {
        template.insert("postInstallScriptUri".into(), json!(uri));
    }
    Ok(())
}

/// Disk sizes in GB; the first is the boot device `0`, the rest start at `2`
/// (device `1` is reserved for swap)
fn block_devices(disks: &Value) -> Result<Value> {
    let sizes = disks
        .as_array()
        .ok_or_else(|| invalid("disks", "a list of sizes in GB"))?;

    let mut devices = Vec::with_capacity(sizes.len());
    for (index, size) in sizes.iter().enumerate() {
        let capacity = size
            .as_u64()
            .ok_or_else(|| invalid("disks", "a list of sizes in GB"))?;
        let device = if index == 0 { 0 } else { index + 1 };
        devices.push(json!({
            "device": device.to_string(),
            "diskImage": { "capacity": capacity },
        }));
    }
    Ok(Value::Array(devices))
}

fn required_str<'a>(request: &'a OrderRequest, key: &str) -> Result<&'a str> {
    request
        .get_str(key)
        .ok_or_else(|| invalid(key, "a string"))
}

fn required_u64(request: &OrderRequest, key: &str) -> Result<u64> {
    request
        .get_u64(key)
        .ok_or_else(|| invalid(key, "a positive integer"))
}

/// An absent flag is `None`; a present one must be a bool
fn optional_bool(request: &OrderRequest, key: &str) -> Result<Option<bool>> {
    match request.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| invalid(key, "true or false")),
    }
}

fn invalid(key: &str, expected: &str) -> SoftLayerError {
    SoftLayerError::InvalidOrder(format!("'{}' must be {}", key, expected))
}

fn ignore_unknown_keys(request: &OrderRequest, known: &[&str]) {
    for key in request.keys().filter(|k| !known.contains(&k.as_str())) {
        tracing::debug!("Ignoring order key '{}'", key);
    }
}
