//! Bare-metal server provider
//!
//! Servers are ordered from a fixed configuration preset (`size`) through
//! `SoftLayer_Hardware`, then managed as `SoftLayer_Hardware_Server`.
//! Cancellation goes through the server's billing item.

use crate::client::{ServiceCall, SoftLayerClient};
use crate::filter::ObjectFilter;
use crate::template::hardware_template;
use async_trait::async_trait;
use serde_json::{Value, json};
use slflow_cloud::{
    OrderRequest, QueryFilter, RawRecord, ResourceKind, ResourceProvider, Result,
};
use std::time::Duration;

const ORDER_SERVICE: &str = "SoftLayer_Hardware";
const SERVICE: &str = "SoftLayer_Hardware_Server";
const COLLECTION: &str = "hardware";

const CANCEL_REASON: &str = "No longer needed";
const CANCEL_NOTE: &str = "Cancelled by slflow";

pub const LIST_MASK: &str = "id,fullyQualifiedDomainName,hostname,domain,datacenter.name,\
primaryIpAddress,primaryBackendIpAddress,hardwareStatusId,\
activeTransaction.transactionStatus[name,friendlyName]";

pub const DETAIL_MASK: &str = "id,fullyQualifiedDomainName,hostname,domain,datacenter.name,\
processorPhysicalCoreAmount,memoryCapacity,hourlyBillingFlag,privateNetworkOnlyFlag,\
primaryIpAddress,primaryBackendIpAddress,networkManagementIpAddress,tagReferences.tag.name,\
networkVlans[vlanNumber,networkSpace],networkComponents[maxSpeed,status,primarySubnet],\
operatingSystem.softwareLicense.softwareDescription.referenceCode,userData.value,\
postInstallScriptUri,provisionDate,hardwareStatusId";

/// SoftLayer bare-metal servers
pub struct BareMetalProvider {
    client: SoftLayerClient,
}

impl BareMetalProvider {
    pub fn new(client: SoftLayerClient) -> Self {
        Self { client }
    }

    async fn billing_item_id(&self, id: u64) -> Result<Option<u64>> {
        let item = self
            .client
            .call(&ServiceCall::new(SERVICE, "getBillingItem").on(id).mask("id"))
            .await?;
        Ok(item.get("id").and_then(Value::as_u64))
    }
}

#[async_trait]
impl ResourceProvider for BareMetalProvider {
    fn name(&self) -> &str {
        "softlayer"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::BareMetal
    }

    async fn query(&self, filter: &QueryFilter) -> Result<Vec<RawRecord>> {
        let call = ServiceCall::new("SoftLayer_Account", "getHardware")
            .mask(LIST_MASK)
            .filter(ObjectFilter::for_query(COLLECTION, filter));
        let items = self.client.call_list(&call).await?;
        Ok(items.into_iter().map(RawRecord::new).collect())
    }

    async fn get_detail(&self, id: u64) -> Result<RawRecord> {
        let call = ServiceCall::new(SERVICE, "getObject")
            .on(id)
            .mask(DETAIL_MASK);
        Ok(RawRecord::new(self.client.call(&call).await?))
    }

    async fn verify_create(&self, request: &OrderRequest) -> Result<RawRecord> {
        let template = hardware_template(request)?;
        let container = self
            .client
            .call(
                &ServiceCall::new(ORDER_SERVICE, "generateOrderTemplate")
                    .parameters(vec![template]),
            )
            .await?;
        let receipt = self
            .client
            .call(
                &ServiceCall::new("SoftLayer_Product_Order", "verifyOrder")
                    .parameters(vec![container]),
            )
            .await?;
        Ok(RawRecord::new(receipt))
    }

    async fn commit_create(&self, request: &OrderRequest) -> Result<RawRecord> {
        let template = hardware_template(request)?;
        tracing::info!(
            "Ordering bare metal server {}.{} ({})",
            request.get_str("hostname").unwrap_or_default(),
            request.get_str("domain").unwrap_or_default(),
            request.get_str("size").unwrap_or_default()
        );
        let created = self
            .client
            .call(&ServiceCall::new(ORDER_SERVICE, "createObject").parameters(vec![template]))
            .await?;
        Ok(RawRecord::new(created))
    }

    async fn cancel(&self, id: u64, immediate: bool) -> Result<bool> {
        let Some(billing_item) = self.billing_item_id(id).await? else {
            tracing::warn!("Bare metal server {} has no billing item to cancel", id);
            return Ok(false);
        };

        tracing::info!(
            "Cancelling bare metal server {} (billing item {}, immediate: {})",
            id,
            billing_item,
            immediate
        );
        let call = ServiceCall::new("SoftLayer_Billing_Item", "cancelItem")
            .on(billing_item)
            .parameters(vec![
                json!(immediate),
                json!(true),
                json!(CANCEL_REASON),
                json!(CANCEL_NOTE),
            ]);
        Ok(self.client.call_bool(&call).await?)
    }

    async fn edit_tags(&self, id: u64, tags: &[String]) -> Result<bool> {
        let call = ServiceCall::new(SERVICE, "setTags")
            .on(id)
            .parameters(vec![json!(tags.join(","))]);
        Ok(self.client.call_bool(&call).await?)
    }

    async fn wait_until_ready(&self, id: u64, timeout: Duration) -> Result<()> {
        self.client.wait_for_ready(SERVICE, id, timeout).await?;
        Ok(())
    }

    async fn resolve_credential_id(&self, label: &str) -> Result<u64> {
        Ok(self.client.ssh_key_id(label).await?)
    }
}
