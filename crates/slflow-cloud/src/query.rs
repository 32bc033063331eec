//! Resource query

use crate::error::Result;
use crate::identity::ResourceIdentity;
use crate::projector::{InstanceSummary, summarize};
use crate::provider::{RawRecord, ResourceProvider};
use crate::state::ObservedState;

/// A remote resource together with its projected summary
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedResource {
    pub summary: InstanceSummary,
    pub raw: RawRecord,
}

impl ObservedResource {
    pub fn id(&self) -> u64 {
        self.summary.id
    }

    pub fn name(&self) -> &str {
        &self.summary.name
    }

    pub fn state(&self) -> ObservedState {
        self.summary.state
    }
}

/// A query for the resources matching an identity
///
/// Building the query issues nothing. Each `fetch` re-issues the remote
/// call, so the same query can be awaited again after a mutation.
pub struct ResourceQuery<'a, P: ResourceProvider + ?Sized> {
    provider: &'a P,
    identity: ResourceIdentity,
    with_tags: bool,
}

/// Start a query for `identity` against `provider`
pub fn locate<'a, P: ResourceProvider + ?Sized>(
    provider: &'a P,
    identity: &ResourceIdentity,
) -> ResourceQuery<'a, P> {
    ResourceQuery {
        provider,
        identity: identity.clone(),
        with_tags: false,
    }
}

impl<'a, P: ResourceProvider + ?Sized> ResourceQuery<'a, P> {
    /// Also filter on the identity's tags
    pub fn with_tags(mut self) -> Self {
        self.with_tags = true;
        self
    }

    /// Issue the query and return the raw records
    pub async fn fetch_raw(&self) -> Result<Vec<RawRecord>> {
        let filter = self.identity.to_filter(self.with_tags)?;
        tracing::debug!(
            "Querying {} resources: {:?}",
            self.provider.kind(),
            filter
        );
        let records = self.provider.query(&filter).await?;
        tracing::debug!("Query matched {} resource(s)", records.len());
        Ok(records)
    }

    /// Issue the query and project every match
    pub async fn fetch(&self) -> Result<Vec<ObservedResource>> {
        let kind = self.provider.kind();
        self.fetch_raw()
            .await?
            .into_iter()
            .map(|raw| {
                Ok(ObservedResource {
                    summary: summarize(kind, &raw)?,
                    raw,
                })
            })
            .collect()
    }
}
