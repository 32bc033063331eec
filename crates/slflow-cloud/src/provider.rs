//! Resource provider trait definition

use crate::error::Result;
use crate::spec::OrderRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote provider abstraction
///
/// This is the only boundary the reconciliation engine depends on. Every
/// call is one remote round-trip; failures surface as `CloudError` and are
/// never retried by the engine.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Returns the provider name (e.g., "softlayer")
    fn name(&self) -> &str;

    /// Kind of resource this provider manages
    fn kind(&self) -> ResourceKind;

    /// List resources matching the filter, in the provider's natural order
    async fn query(&self, filter: &QueryFilter) -> Result<Vec<RawRecord>>;

    /// Fetch the full detail record of one resource
    async fn get_detail(&self, id: u64) -> Result<RawRecord>;

    /// Dry-run validation of an order; fails on an invalid request
    async fn verify_create(&self, request: &OrderRequest) -> Result<RawRecord>;

    /// Place the order. The returned record carries the assigned id.
    async fn commit_create(&self, request: &OrderRequest) -> Result<RawRecord>;

    /// Cancel a resource. Returns whether the provider acknowledged it.
    async fn cancel(&self, id: u64, immediate: bool) -> Result<bool>;

    /// Replace the tags of a resource
    async fn edit_tags(&self, id: u64, tags: &[String]) -> Result<bool>;

    /// Block until the resource reports ready, bounded by `timeout`
    async fn wait_until_ready(&self, id: u64, timeout: Duration) -> Result<()>;

    /// Resolve an SSH key label to its provider id
    async fn resolve_credential_id(&self, label: &str) -> Result<u64>;
}

/// Kind of compute resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Virtual server instance
    VirtualGuest,
    /// Bare-metal server
    BareMetal,
}

impl ResourceKind {
    /// Human label used in messages
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::VirtualGuest => "virtual guest",
            ResourceKind::BareMetal => "bare metal server",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Filter passed to `ResourceProvider::query`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub hostname: Option<String>,
    pub domain: Option<String>,
    pub datacenter: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A record exactly as the provider returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub serde_json::Value);

impl RawRecord {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Get a top-level field
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// The record id, if present and numeric
    pub fn id(&self) -> Option<u64> {
        self.get("id").and_then(|v| v.as_u64())
    }
}

impl From<serde_json::Value> for RawRecord {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_record_id() {
        assert_eq!(RawRecord::new(json!({"id": 7})).id(), Some(7));
        assert_eq!(RawRecord::new(json!({"id": "7"})).id(), None);
        assert_eq!(RawRecord::new(json!({})).id(), None);
    }

    #[test]
    fn test_raw_record_is_transparent() {
        let raw = RawRecord::new(json!({"id": 1, "hostname": "web"}));
        assert_eq!(
            serde_json::to_value(&raw).unwrap(),
            json!({"id": 1, "hostname": "web"})
        );
    }
}
