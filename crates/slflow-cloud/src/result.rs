//! Reconciliation result and its accumulator

use crate::action::ActionRecord;
use crate::projector::{FactRecord, InstanceSummary};
use crate::provider::RawRecord;
use crate::state::DesiredState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// True iff a mutating provider call was believed to succeed
    pub changed: bool,

    /// The requested state of the pass
    pub state: DesiredState,

    /// Resources reported by every operation except `facts`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<Vec<Instance>>,

    /// Name -> fact record, reported by `facts` only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facts: Option<BTreeMap<String, FactRecord>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Transitions applied, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionRecord>,
}

impl ReconciliationResult {
    /// Summaries reported, skipping raw detail records
    pub fn summaries(&self) -> impl Iterator<Item = &InstanceSummary> {
        self.instances.iter().flatten().filter_map(|i| match i {
            Instance::Summary(summary) => Some(summary),
            Instance::Detail(_) => None,
        })
    }
}

/// One entry of `instances`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instance {
    Summary(InstanceSummary),
    /// Raw detail record, reported by `info`
    Detail(RawRecord),
}

/// Accumulator threaded through the handlers of a pass
///
/// The driver owns it and lends it to one handler at a time.
#[derive(Debug)]
pub struct ResultBuilder {
    changed: bool,
    state: DesiredState,
    instances: Vec<Instance>,
    facts: Option<BTreeMap<String, FactRecord>>,
    message: Option<String>,
    actions: Vec<ActionRecord>,
}

impl ResultBuilder {
    pub fn new(state: DesiredState) -> Self {
        Self {
            changed: false,
            state,
            instances: Vec::new(),
            facts: None,
            message: None,
            actions: Vec::new(),
        }
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn push_summaries(&mut self, summaries: impl IntoIterator<Item = InstanceSummary>) {
        self.instances
            .extend(summaries.into_iter().map(Instance::Summary));
    }

    pub fn push_details(&mut self, details: impl IntoIterator<Item = RawRecord>) {
        self.instances
            .extend(details.into_iter().map(Instance::Detail));
    }

    /// Replace the instances reported so far
    pub fn replace_summaries(&mut self, summaries: impl IntoIterator<Item = InstanceSummary>) {
        self.instances.clear();
        self.push_summaries(summaries);
    }

    pub fn set_facts(&mut self, facts: BTreeMap<String, FactRecord>) {
        self.facts = Some(facts);
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn record_action(&mut self, record: ActionRecord) {
        self.actions.push(record);
    }

    pub fn finish(self) -> ReconciliationResult {
        let instances = match self.facts {
            Some(_) => None,
            None => Some(self.instances),
        };
        ReconciliationResult {
            changed: self.changed,
            state: self.state,
            instances,
            facts: self.facts,
            message: self.message,
            actions: self.actions,
        }
    }
}
