//! Fact projection
//!
//! Turns raw provider records into the two normalized views the engine
//! reports: a terse [`InstanceSummary`] for list/state output and a rich
//! [`FactRecord`] for `facts`. Both functions are pure.
//!
//! Optional facts are omitted, never emitted as null: a key only appears in
//! a serialized `FactRecord` when its source sub-structure was present and
//! non-empty in the raw record.

use crate::error::{CloudError, Result};
use crate::provider::{RawRecord, ResourceKind};
use crate::state::ObservedState;
use serde::{Deserialize, Serialize};

/// Address reported when the record carries neither a backend nor a public IP
pub const UNDEFINED_ADDRESS: &str = "undefined";

/// Coarse status reported for bare metal, which has no power state
pub const BARE_METAL_STATUS: &str = "Active";

const ACTIVE_INTERFACE: &str = "ACTIVE";
const SWAP_DISK: &str = "SWAP";
const PRIVATE_SPACE: &str = "PRIVATE";
const PUBLIC_SPACE: &str = "PUBLIC";

/// Terse view of one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    pub state: ObservedState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub address: String,
    /// Provider hardware status id (bare metal only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_status: Option<u64>,
    /// Active provisioning transaction (bare metal only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
}

/// Detailed description of one resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ObservedState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedicated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "privateAddress", skip_serializing_if = "Option::is_none")]
    pub private_address: Option<String>,
    #[serde(rename = "publicAddress", skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,
    #[serde(rename = "managementAddress", skip_serializing_if = "Option::is_none")]
    pub management_address: Option<String>,
    /// Capacity of each non-swap disk, in GB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disks: Option<Vec<u64>>,
    /// True when any non-swap disk is local rather than SAN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_disk: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_vlan: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_vlan: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nic_speed: Option<u64>,
    #[serde(rename = "userData", skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_uri: Option<String>,
}

/// Project a raw record into its summary
pub fn summarize(kind: ResourceKind, raw: &RawRecord) -> Result<InstanceSummary> {
    let record = ProviderRecord::parse(raw)?;
    let (id, name) = record.identity()?;

    let (state, status) = match kind {
        ResourceKind::BareMetal => (
            ObservedState::Running,
            Some(BARE_METAL_STATUS.to_string()),
        ),
        ResourceKind::VirtualGuest => {
            let state = record.power_state(&name)?.ok_or_else(|| {
                CloudError::MalformedRecord(format!("{} has no power state", name))
            })?;
            (state, record.status_name())
        }
    };

    let (hardware_status, transaction) = match kind {
        ResourceKind::BareMetal => (record.hardware_status_id, record.transaction_name()),
        ResourceKind::VirtualGuest => (None, None),
    };

    Ok(InstanceSummary {
        id,
        name,
        datacenter: record.datacenter_name(),
        state,
        status,
        address: record
            .best_address()
            .unwrap_or_else(|| UNDEFINED_ADDRESS.to_string()),
        hardware_status,
        transaction,
    })
}

/// Project a raw detail record into its fact record
pub fn extract_facts(kind: ResourceKind, raw: &RawRecord) -> Result<FactRecord> {
    let record = ProviderRecord::parse(raw)?;
    let (id, name) = record.identity()?;

    let mut facts = FactRecord {
        id,
        hostname: record.hostname.clone(),
        domain: record.domain.clone(),
        datacenter: record.datacenter_name(),
        os_code: record.os_code(),
        hourly: record.hourly_billing_flag,
        private: record.private_network_only_flag,
        tags: record.tag_names(),
        address: record.best_address(),
        private_address: record.primary_backend_ip_address.clone(),
        public_address: record.primary_ip_address.clone(),
        user_data: record.first_user_data(),
        post_uri: record.post_install_script_uri.clone(),
        ..FactRecord::default()
    };

    match kind {
        ResourceKind::VirtualGuest => {
            facts.state = record.power_state(&name)?;
            facts.status = record.status_name();
            facts.cpus = record.max_cpu;
            facts.memory = record.max_memory;
            facts.dedicated = record.dedicated_account_host_only_flag;
        }
        ResourceKind::BareMetal => {
            facts.state = Some(ObservedState::Running);
            facts.status = Some(BARE_METAL_STATUS.to_string());
            facts.cpus = record.processor_physical_core_amount;
            facts.memory = record.memory_capacity;
            facts.management_address = record.network_management_ip_address.clone();
        }
    }

    if let Some((disks, local_disk)) = record.disk_inventory() {
        facts.disks = Some(disks);
        facts.local_disk = Some(local_disk);
    }

    for vlan in record.network_vlans.iter().flatten() {
        match vlan.network_space.as_deref() {
            Some(PRIVATE_SPACE) => facts.private_vlan = vlan.vlan_number,
            Some(PUBLIC_SPACE) => facts.public_vlan = vlan.vlan_number,
            _ => {}
        }
    }

    facts.nic_speed = record.peak_nic_speed(kind);
    facts.name = name;

    Ok(facts)
}

/// Scale a disk capacity by its unit suffix (GB x1, TB x1000, otherwise 0)
pub fn scale_capacity(capacity: u64, units: &str) -> u64 {
    if units.contains("GB") {
        capacity
    } else if units.contains("TB") {
        capacity.saturating_mul(1000)
    } else {
        0
    }
}

// ============ Provider record shape ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderRecord {
    id: Option<u64>,
    fully_qualified_domain_name: Option<String>,
    hostname: Option<String>,
    domain: Option<String>,
    datacenter: Option<Named>,
    power_state: Option<Named>,
    status: Option<Named>,
    hardware_status_id: Option<u64>,
    active_transaction: Option<ActiveTransaction>,
    primary_backend_ip_address: Option<String>,
    primary_ip_address: Option<String>,
    network_management_ip_address: Option<String>,
    max_cpu: Option<u64>,
    max_memory: Option<u64>,
    processor_physical_core_amount: Option<u64>,
    memory_capacity: Option<u64>,
    operating_system: Option<OperatingSystem>,
    dedicated_account_host_only_flag: Option<bool>,
    hourly_billing_flag: Option<bool>,
    private_network_only_flag: Option<bool>,
    tag_references: Option<Vec<TagReference>>,
    block_devices: Option<Vec<BlockDevice>>,
    network_vlans: Option<Vec<NetworkVlan>>,
    network_components: Option<Vec<NetworkComponent>>,
    user_data: Option<Vec<UserData>>,
    post_install_script_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveTransaction {
    transaction_status: Option<TransactionStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionStatus {
    name: Option<String>,
    friendly_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperatingSystem {
    software_license: Option<SoftwareLicense>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SoftwareLicense {
    software_description: Option<SoftwareDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SoftwareDescription {
    reference_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagReference {
    tag: Option<Named>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockDevice {
    disk_image: Option<DiskImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiskImage {
    name: Option<String>,
    capacity: Option<u64>,
    units: Option<String>,
    local_disk_flag: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkVlan {
    network_space: Option<String>,
    vlan_number: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkComponent {
    status: Option<String>,
    max_speed: Option<u64>,
    primary_subnet: Option<serde_json::Value>,
}

impl NetworkComponent {
    fn is_active(&self) -> bool {
        self.status.as_deref() == Some(ACTIVE_INTERFACE)
    }

    fn has_primary_subnet(&self) -> bool {
        match &self.primary_subnet {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserData {
    value: Option<String>,
}

impl ProviderRecord {
    fn parse(raw: &RawRecord) -> Result<Self> {
        if !raw.0.is_object() {
            return Err(CloudError::MalformedRecord(format!(
                "expected an object, got {}",
                raw.0
            )));
        }
        serde_json::from_value(raw.0.clone())
            .map_err(|e| CloudError::MalformedRecord(e.to_string()))
    }

    fn identity(&self) -> Result<(u64, String)> {
        let id = self
            .id
            .ok_or_else(|| CloudError::MalformedRecord("missing id".to_string()))?;
        let name = self.fully_qualified_domain_name.clone().ok_or_else(|| {
            CloudError::MalformedRecord(format!("record {} has no fullyQualifiedDomainName", id))
        })?;
        Ok((id, name))
    }

    fn power_state(&self, name: &str) -> Result<Option<ObservedState>> {
        match self.power_state.as_ref().and_then(|p| p.name.as_deref()) {
            None => Ok(None),
            Some(state) => ObservedState::from_power_state(state).map(Some).ok_or_else(|| {
                CloudError::MalformedRecord(format!(
                    "{} reports unknown power state '{}'",
                    name, state
                ))
            }),
        }
    }

    fn status_name(&self) -> Option<String> {
        self.status.as_ref().and_then(|s| s.name.clone())
    }

    fn datacenter_name(&self) -> Option<String> {
        self.datacenter.as_ref().and_then(|d| d.name.clone())
    }

    /// Backend address first, then public
    fn best_address(&self) -> Option<String> {
        self.primary_backend_ip_address
            .clone()
            .or_else(|| self.primary_ip_address.clone())
    }

    fn transaction_name(&self) -> Option<String> {
        let status = self
            .active_transaction
            .as_ref()?
            .transaction_status
            .as_ref()?;
        let name = status.name.as_deref()?;
        Some(match status.friendly_name.as_deref() {
            Some(friendly) => format!("{} - {}", name, friendly),
            None => name.to_string(),
        })
    }

    fn os_code(&self) -> Option<String> {
        self.operating_system
            .as_ref()?
            .software_license
            .as_ref()?
            .software_description
            .as_ref()?
            .reference_code
            .clone()
    }

    fn tag_names(&self) -> Option<Vec<String>> {
        let tags: Vec<String> = self
            .tag_references
            .iter()
            .flatten()
            .filter_map(|r| r.tag.as_ref().and_then(|t| t.name.clone()))
            .collect();
        if tags.is_empty() { None } else { Some(tags) }
    }

    fn disk_inventory(&self) -> Option<(Vec<u64>, bool)> {
        let devices = self.block_devices.as_ref().filter(|d| !d.is_empty())?;

        let mut disks = Vec::new();
        let mut local_disk = false;
        for image in devices.iter().filter_map(|d| d.disk_image.as_ref()) {
            if image.name.as_deref().is_some_and(|n| n.contains(SWAP_DISK)) {
                continue;
            }
            if image.local_disk_flag.unwrap_or(false) {
                local_disk = true;
            }
            disks.push(scale_capacity(
                image.capacity.unwrap_or(0),
                image.units.as_deref().unwrap_or_default(),
            ));
        }
        Some((disks, local_disk))
    }

    /// Max speed over active interfaces; bare metal only counts interfaces
    /// bound to a primary subnet
    fn peak_nic_speed(&self, kind: ResourceKind) -> Option<u64> {
        let components = self.network_components.as_ref()?;
        let candidates: Vec<&NetworkComponent> = match kind {
            ResourceKind::VirtualGuest => components.iter().collect(),
            ResourceKind::BareMetal => components
                .iter()
                .filter(|c| c.has_primary_subnet())
                .collect(),
        };
        if candidates.is_empty() {
            return None;
        }
        Some(
            candidates
                .iter()
                .filter(|c| c.is_active())
                .filter_map(|c| c.max_speed)
                .max()
                .unwrap_or(0),
        )
    }

    fn first_user_data(&self) -> Option<String> {
        self.user_data.as_ref()?.first()?.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> RawRecord {
        RawRecord::new(json!({
            "id": 1001,
            "fullyQualifiedDomainName": "web01.example.com"
        }))
    }

    fn guest_detail() -> RawRecord {
        RawRecord::new(json!({
            "id": 1001,
            "fullyQualifiedDomainName": "web01.example.com",
            "hostname": "web01",
            "domain": "example.com",
            "datacenter": {"name": "par01"},
            "powerState": {"name": "Running"},
            "status": {"name": "Active"},
            "maxCpu": 2,
            "maxMemory": 4096,
            "operatingSystem": {"softwareLicense": {"softwareDescription": {"referenceCode": "UBUNTU_14_64"}}},
            "dedicatedAccountHostOnlyFlag": false,
            "hourlyBillingFlag": true,
            "privateNetworkOnlyFlag": true,
            "primaryBackendIpAddress": "10.0.0.5",
            "tagReferences": [{"tag": {"name": "web"}}, {"tag": {"name": "prod"}}],
            "blockDevices": [
                {"diskImage": {"name": "web01-disk0", "capacity": 25, "units": "GB", "localDiskFlag": true}},
                {"diskImage": {"name": "web01-SWAP", "capacity": 2, "units": "GB", "localDiskFlag": true}},
                {"diskImage": {"name": "web01-disk2", "capacity": 2, "units": "TB", "localDiskFlag": false}}
            ],
            "networkVlans": [
                {"networkSpace": "PRIVATE", "vlanNumber": 1234},
                {"networkSpace": "PUBLIC", "vlanNumber": 987}
            ],
            "networkComponents": [
                {"status": "ACTIVE", "maxSpeed": 100},
                {"status": "ACTIVE", "maxSpeed": 1000},
                {"status": "INACTIVE", "maxSpeed": 10000}
            ],
            "userData": [{"value": "#cloud-config"}],
            "postInstallScriptUri": "https://example.com/post.sh"
        }))
    }

    #[test]
    fn test_scale_capacity() {
        assert_eq!(scale_capacity(25, "GB"), 25);
        assert_eq!(scale_capacity(2, "TB"), 2000);
        assert_eq!(scale_capacity(512, "MB"), 0);
        assert_eq!(scale_capacity(u64::MAX, "TB"), u64::MAX);
    }

    #[test]
    fn test_minimal_record_omits_optional_keys() {
        let facts = extract_facts(ResourceKind::VirtualGuest, &minimal()).unwrap();
        let value = serde_json::to_value(&facts).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "name"]);

        for absent in [
            "address",
            "private_vlan",
            "public_vlan",
            "disks",
            "local_disk",
            "userData",
            "post_uri",
            "nic_speed",
            "tags",
        ] {
            assert!(value.get(absent).is_none(), "{} should be absent", absent);
        }
    }

    #[test]
    fn test_guest_facts() {
        let facts = extract_facts(ResourceKind::VirtualGuest, &guest_detail()).unwrap();

        assert_eq!(facts.name, "web01.example.com");
        assert_eq!(facts.state, Some(ObservedState::Running));
        assert_eq!(facts.cpus, Some(2));
        assert_eq!(facts.memory, Some(4096));
        assert_eq!(facts.os_code.as_deref(), Some("UBUNTU_14_64"));
        assert_eq!(facts.dedicated, Some(false));
        assert_eq!(facts.tags, Some(vec!["web".to_string(), "prod".to_string()]));
        assert_eq!(facts.disks, Some(vec![25, 2000]));
        assert_eq!(facts.local_disk, Some(true));
        assert_eq!(facts.private_vlan, Some(1234));
        assert_eq!(facts.public_vlan, Some(987));
        assert_eq!(facts.nic_speed, Some(1000));
        assert_eq!(facts.address.as_deref(), Some("10.0.0.5"));
        assert_eq!(facts.private_address.as_deref(), Some("10.0.0.5"));
        assert_eq!(facts.public_address, None);
        assert_eq!(facts.user_data.as_deref(), Some("#cloud-config"));
        assert_eq!(facts.post_uri.as_deref(), Some("https://example.com/post.sh"));
    }

    #[test]
    fn test_swap_only_disks_are_not_local() {
        let raw = RawRecord::new(json!({
            "id": 5,
            "fullyQualifiedDomainName": "a.b",
            "blockDevices": [
                {"diskImage": {"name": "SWAP", "capacity": 2, "units": "GB", "localDiskFlag": true}}
            ]
        }));
        let facts = extract_facts(ResourceKind::VirtualGuest, &raw).unwrap();
        assert_eq!(facts.disks, Some(vec![]));
        assert_eq!(facts.local_disk, Some(false));
    }

    #[test]
    fn test_summary_address_fallback() {
        let mut raw = json!({
            "id": 7,
            "fullyQualifiedDomainName": "db01.example.com",
            "powerState": {"name": "Halted"},
            "primaryIpAddress": "169.254.1.1"
        });
        let summary = summarize(ResourceKind::VirtualGuest, &RawRecord::new(raw.clone())).unwrap();
        assert_eq!(summary.address, "169.254.1.1");
        assert_eq!(summary.state, ObservedState::Halted);

        raw["primaryBackendIpAddress"] = json!("10.1.1.1");
        let summary = summarize(ResourceKind::VirtualGuest, &RawRecord::new(raw.clone())).unwrap();
        assert_eq!(summary.address, "10.1.1.1");

        raw.as_object_mut().unwrap().remove("primaryBackendIpAddress");
        raw.as_object_mut().unwrap().remove("primaryIpAddress");
        let summary = summarize(ResourceKind::VirtualGuest, &RawRecord::new(raw)).unwrap();
        assert_eq!(summary.address, UNDEFINED_ADDRESS);
    }

    #[test]
    fn test_bare_metal_is_running_when_it_exists() {
        let raw = RawRecord::new(json!({
            "id": 88,
            "fullyQualifiedDomainName": "bm01.example.com",
            "datacenter": {"name": "par01"},
            "hardwareStatusId": 5,
            "activeTransaction": {"transactionStatus": {"name": "OS_RELOAD", "friendlyName": "Reloading"}}
        }));
        let summary = summarize(ResourceKind::BareMetal, &raw).unwrap();
        assert_eq!(summary.state, ObservedState::Running);
        assert_eq!(summary.status.as_deref(), Some(BARE_METAL_STATUS));
        assert_eq!(summary.hardware_status, Some(5));
        assert_eq!(summary.transaction.as_deref(), Some("OS_RELOAD - Reloading"));
        assert_eq!(summary.address, UNDEFINED_ADDRESS);
    }

    #[test]
    fn test_bare_metal_nic_speed_uses_primary_subnet_only() {
        let raw = RawRecord::new(json!({
            "id": 88,
            "fullyQualifiedDomainName": "bm01.example.com",
            "processorPhysicalCoreAmount": 4,
            "memoryCapacity": 8,
            "networkManagementIpAddress": "10.9.9.9",
            "networkComponents": [
                {"status": "ACTIVE", "maxSpeed": 10000},
                {"status": "ACTIVE", "maxSpeed": 100, "primarySubnet": {"id": 1}},
                {"status": "ACTIVE", "maxSpeed": 1000, "primarySubnet": {"id": 2}}
            ]
        }));
        let facts = extract_facts(ResourceKind::BareMetal, &raw).unwrap();
        assert_eq!(facts.nic_speed, Some(1000));
        assert_eq!(facts.cpus, Some(4));
        assert_eq!(facts.memory, Some(8));
        assert_eq!(facts.management_address.as_deref(), Some("10.9.9.9"));
        assert_eq!(facts.state, Some(ObservedState::Running));
    }

    #[test]
    fn test_bare_metal_without_subnet_interfaces_has_no_speed() {
        let raw = RawRecord::new(json!({
            "id": 88,
            "fullyQualifiedDomainName": "bm01.example.com",
            "networkComponents": [{"status": "ACTIVE", "maxSpeed": 10000}]
        }));
        let facts = extract_facts(ResourceKind::BareMetal, &raw).unwrap();
        assert_eq!(facts.nic_speed, None);
    }

    #[test]
    fn test_missing_identity_is_malformed() {
        let no_id = RawRecord::new(json!({"fullyQualifiedDomainName": "a.b"}));
        assert!(matches!(
            extract_facts(ResourceKind::VirtualGuest, &no_id),
            Err(CloudError::MalformedRecord(_))
        ));

        let no_name = RawRecord::new(json!({"id": 3, "powerState": {"name": "Running"}}));
        assert!(matches!(
            summarize(ResourceKind::VirtualGuest, &no_name),
            Err(CloudError::MalformedRecord(_))
        ));

        let not_object = RawRecord::new(json!([1, 2]));
        assert!(matches!(
            summarize(ResourceKind::BareMetal, &not_object),
            Err(CloudError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_guest_summary_requires_power_state() {
        assert!(matches!(
            summarize(ResourceKind::VirtualGuest, &minimal()),
            Err(CloudError::MalformedRecord(_))
        ));

        let unknown = RawRecord::new(json!({
            "id": 1,
            "fullyQualifiedDomainName": "a.b",
            "powerState": {"name": "Rebooting"}
        }));
        assert!(matches!(
            summarize(ResourceKind::VirtualGuest, &unknown),
            Err(CloudError::MalformedRecord(_))
        ));
    }
}
