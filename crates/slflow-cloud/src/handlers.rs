//! Action handlers
//!
//! Each handler takes the target of one transition and the pass
//! accumulator. Only `create` and `destroy` call mutating provider APIs.
//! `start`, `stop`, `suspend` and `resume` refresh and report state exactly
//! like `no_op`; no power-control call is issued.

use crate::driver::{Reconciler, Target};
use crate::error::{CloudError, Result};
use crate::identity::split_name;
use crate::projector::{FactRecord, InstanceSummary, extract_facts};
use crate::provider::ResourceProvider;
use crate::query::locate;
use crate::result::ResultBuilder;
use crate::spec::{ResourceSpec, build_order};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

impl<P: ResourceProvider + ?Sized> Reconciler<'_, P> {
    fn not_found_message(&self) -> String {
        format!("{} not found", self.provider.kind().label())
    }

    /// Re-query whatever currently matches the target
    async fn refresh(&self, target: &Target) -> Result<Vec<InstanceSummary>> {
        let identity = match &target.name {
            Some(name) => self.request.identity.narrowed_to(name),
            None => self.request.identity.clone(),
        };
        let observed = locate(self.provider, &identity).fetch().await?;
        Ok(observed.into_iter().map(|r| r.summary).collect())
    }

    pub(crate) async fn create(&self, target: &Target, acc: &mut ResultBuilder) -> Result<()> {
        let kind = self.provider.kind();
        let name = target
            .name
            .as_deref()
            .ok_or_else(|| CloudError::MissingName(kind.label().to_string()))?;
        let (hostname, domain) = split_name(name)?;

        let spec = self
            .request
            .spec
            .clone()
            .unwrap_or_else(|| ResourceSpec::default_for(kind));
        let ssh_key_id = self
            .provider
            .resolve_credential_id(&self.request.credential_label)
            .await?;
        let prepared = build_order(
            kind,
            &spec,
            self.request.billing,
            hostname,
            domain,
            ssh_key_id,
        )?;

        self.provider.verify_create(&prepared.request).await?;
        tracing::info!("Ordering {} {}", kind, name);
        let created = self.provider.commit_create(&prepared.request).await?;
        acc.mark_changed();

        let created_id = created.id();
        if let (Some(id), Some(timeout)) = (created_id, self.request.ready_timeout) {
            tracing::info!("Waiting up to {:?} for {} to be ready", timeout, name);
            self.provider.wait_until_ready(id, timeout).await?;
        }

        let summaries = self.refresh(target).await?;

        if let Some(tags) = &prepared.deferred_tags {
            let ids: Vec<u64> = match created_id {
                Some(id) => vec![id],
                None => summaries.iter().map(|s| s.id).collect(),
            };
            for id in ids {
                tracing::info!("Tagging {} {} with {:?}", kind, id, tags);
                self.provider.edit_tags(id, tags).await?;
            }
        }

        acc.push_summaries(summaries);
        Ok(())
    }

    pub(crate) async fn destroy(&self, target: &Target, acc: &mut ResultBuilder) -> Result<()> {
        tracing::info!(
            "Cancelling {} {}",
            self.provider.kind(),
            target.name.as_deref().unwrap_or_default()
        );
        if self.provider.cancel(target.id, true).await? {
            acc.mark_changed();
            if let Some(timeout) = self.request.ready_timeout {
                self.provider.wait_until_ready(target.id, timeout).await?;
            }
        } else {
            tracing::warn!("Cancellation of {} was not acknowledged", target.id);
        }

        // bare metal may still be listed mid-teardown
        let summaries = self.refresh(target).await?;
        acc.push_summaries(summaries);
        Ok(())
    }

    pub(crate) async fn start(&self, target: &Target, acc: &mut ResultBuilder) -> Result<()> {
        self.no_op(target, acc).await
    }

    pub(crate) async fn stop(&self, target: &Target, acc: &mut ResultBuilder) -> Result<()> {
        self.no_op(target, acc).await
    }

    pub(crate) async fn suspend(&self, target: &Target, acc: &mut ResultBuilder) -> Result<()> {
        self.no_op(target, acc).await
    }

    pub(crate) async fn resume(&self, target: &Target, acc: &mut ResultBuilder) -> Result<()> {
        self.no_op(target, acc).await
    }

    pub(crate) async fn no_op(&self, target: &Target, acc: &mut ResultBuilder) -> Result<()> {
        let summaries = self.refresh(target).await?;
        acc.push_summaries(summaries);
        Ok(())
    }

    pub(crate) async fn list(&self, acc: &mut ResultBuilder) -> Result<()> {
        let observed = locate(self.provider, &self.request.identity).fetch().await?;
        if observed.is_empty() {
            acc.set_message(self.not_found_message());
        }
        acc.replace_summaries(observed.into_iter().map(|r| r.summary));
        Ok(())
    }

    pub(crate) async fn info(&self, acc: &mut ResultBuilder) -> Result<()> {
        let observed = locate(self.provider, &self.request.identity).fetch().await?;
        if observed.is_empty() {
            acc.set_message(self.not_found_message());
        }

        let mut details = Vec::with_capacity(observed.len());
        for resource in &observed {
            details.push(self.provider.get_detail(resource.id()).await?);
        }
        acc.push_details(details);
        Ok(())
    }

    pub(crate) async fn facts(&self, acc: &mut ResultBuilder) -> Result<()> {
        let kind = self.provider.kind();
        let records = locate(self.provider, &self.request.identity)
            .with_tags()
            .fetch_raw()
            .await?;

        let mut facts: BTreeMap<String, FactRecord> = BTreeMap::new();
        for record in &records {
            let id = record
                .id()
                .ok_or_else(|| CloudError::MalformedRecord("missing id".to_string()))?;
            let detail = self.provider.get_detail(id).await?;
            let fact = extract_facts(kind, &detail)?;

            match facts.entry(fact.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(fact);
                }
                Entry::Occupied(slot) => {
                    return Err(CloudError::DuplicateFactName(slot.key().clone()));
                }
            }
        }

        if facts.is_empty() {
            acc.set_message(self.not_found_message());
        }
        acc.set_facts(facts);
        Ok(())
    }
}
