//! Virtual guest provider

use crate::client::{ServiceCall, SoftLayerClient};
use crate::filter::ObjectFilter;
use crate::template::guest_template;
use async_trait::async_trait;
use serde_json::json;
use slflow_cloud::{
    OrderRequest, QueryFilter, RawRecord, ResourceKind, ResourceProvider, Result,
};
use std::time::Duration;

const SERVICE: &str = "SoftLayer_Virtual_Guest";
const COLLECTION: &str = "virtualGuests";

/// Fields the list query requests; enough to build a summary
pub const LIST_MASK: &str = "id,fullyQualifiedDomainName,hostname,domain,datacenter.name,\
status.name,powerState.name,primaryIpAddress,primaryBackendIpAddress";

/// Fields the detail call requests; enough to build a fact record
pub const DETAIL_MASK: &str = "id,fullyQualifiedDomainName,hostname,domain,datacenter.name,\
status.name,powerState.name,maxCpu,maxMemory,hourlyBillingFlag,privateNetworkOnlyFlag,\
dedicatedAccountHostOnlyFlag,primaryIpAddress,primaryBackendIpAddress,tagReferences.tag.name,\
blockDevices.diskImage[name,capacity,units,localDiskFlag],networkVlans[vlanNumber,networkSpace],\
networkComponents[maxSpeed,status],\
operatingSystem.softwareLicense.softwareDescription.referenceCode,userData.value,\
postInstallScriptUri,provisionDate";

/// SoftLayer virtual guests
pub struct VirtualGuestProvider {
    client: SoftLayerClient,
}

impl VirtualGuestProvider {
    pub fn new(client: SoftLayerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceProvider for VirtualGuestProvider {
    fn name(&self) -> &str {
        "softlayer"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::VirtualGuest
    }

    async fn query(&self, filter: &QueryFilter) -> Result<Vec<RawRecord>> {
        let call = ServiceCall::new("SoftLayer_Account", "getVirtualGuests")
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
        let template = guest_template(request)?;
        let container = self
            .client
            .call(&ServiceCall::new(SERVICE, "generateOrderTemplate").parameters(vec![template]))
            .await?;
        let receipt = self
            .client
            .call(&ServiceCall::new("SoftLayer_Product_Order", "verifyOrder").parameters(vec![container]))
            .await?;
        Ok(RawRecord::new(receipt))
    }

    async fn commit_create(&self, request: &OrderRequest) -> Result<RawRecord> {
        let template = guest_template(request)?;
        tracing::info!(
            "Creating virtual guest {}.{}",
            request.get_str("hostname").unwrap_or_default(),
            request.get_str("domain").unwrap_or_default()
        );
        let created = self
            .client
            .call(&ServiceCall::new(SERVICE, "createObject").parameters(vec![template]))
            .await?;
        Ok(RawRecord::new(created))
    }

    async fn cancel(&self, id: u64, _immediate: bool) -> Result<bool> {
        tracing::info!("Deleting virtual guest {}", id);
        Ok(self
            .client
            .call_bool(&ServiceCall::new(SERVICE, "deleteObject").on(id))
            .await?)
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
