//! Reconciliation driver
//!
//! One pass: dispatch read-only requests directly; otherwise query the
//! identity, synthesize an `Undefined` placeholder when nothing matched,
//! and apply the transition table to every match in query order. The first
//! error aborts the pass.

use crate::action::{Action, ActionRecord, ReadOnlyAction};
use crate::error::Result;
use crate::identity::ResourceIdentity;
use crate::provider::ResourceProvider;
use crate::query::{ObservedResource, locate};
use crate::result::{ReconciliationResult, ResultBuilder};
use crate::spec::{BillingMode, ResourceSpec};
use crate::state::{DesiredState, ObservedState};
use crate::transition;
use std::time::Duration;

/// SSH key label used when the caller names none
pub const DEFAULT_CREDENTIAL_LABEL: &str = "default";

/// Bound on the post-create/destroy readiness wait
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(600);

/// Parameters of one reconciliation pass
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub state: DesiredState,
    pub identity: ResourceIdentity,
    /// Shape of a resource to create; the kind's default profile if `None`
    pub spec: Option<ResourceSpec>,
    pub credential_label: String,
    pub billing: BillingMode,
    /// `None` skips the readiness wait
    pub ready_timeout: Option<Duration>,
}

impl ReconcileRequest {
    pub fn new(state: DesiredState, identity: ResourceIdentity) -> Self {
        Self {
            state,
            identity,
            spec: None,
            credential_label: DEFAULT_CREDENTIAL_LABEL.to_string(),
            billing: BillingMode::default(),
            ready_timeout: Some(DEFAULT_READY_TIMEOUT),
        }
    }

    pub fn with_spec(mut self, spec: ResourceSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn with_credential_label(mut self, label: impl Into<String>) -> Self {
        self.credential_label = label.into();
        self
    }

    pub fn with_billing(mut self, billing: BillingMode) -> Self {
        self.billing = billing;
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ready_timeout = timeout;
        self
    }
}

/// The resource a transition applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: u64,
    pub name: Option<String>,
    pub state: ObservedState,
}

impl Target {
    /// Placeholder for an identity that matched nothing
    pub fn undefined(identity: &ResourceIdentity) -> Result<Self> {
        Ok(Self {
            id: 0,
            name: identity.full_name()?,
            state: ObservedState::Undefined,
        })
    }
}

impl From<&ObservedResource> for Target {
    fn from(resource: &ObservedResource) -> Self {
        Self {
            id: resource.id(),
            name: Some(resource.name().to_string()),
            state: resource.state(),
        }
    }
}

/// Runs passes against one provider
pub struct Reconciler<'a, P: ResourceProvider + ?Sized> {
    pub(crate) provider: &'a P,
    pub(crate) request: &'a ReconcileRequest,
}

/// Run one reconciliation pass
pub async fn reconcile<P: ResourceProvider + ?Sized>(
    provider: &P,
    request: &ReconcileRequest,
) -> Result<ReconciliationResult> {
    Reconciler::new(provider, request).run().await
}

impl<'a, P: ResourceProvider + ?Sized> Reconciler<'a, P> {
    pub fn new(provider: &'a P, request: &'a ReconcileRequest) -> Self {
        Self { provider, request }
    }

    pub async fn run(&self) -> Result<ReconciliationResult> {
        let mut acc = ResultBuilder::new(self.request.state);

        if let Some(read_only) = ReadOnlyAction::for_state(self.request.state) {
            tracing::debug!("Dispatching read-only request: {}", self.request.state);
            match read_only {
                ReadOnlyAction::List => self.list(&mut acc).await?,
                ReadOnlyAction::Info => self.info(&mut acc).await?,
                ReadOnlyAction::Facts => self.facts(&mut acc).await?,
            }
            return Ok(acc.finish());
        }

        let observed = locate(self.provider, &self.request.identity).fetch().await?;
        let targets: Vec<Target> = if observed.is_empty() {
            vec![Target::undefined(&self.request.identity)?]
        } else {
            observed.iter().map(Target::from).collect()
        };

        for target in &targets {
            let action = transition::lookup(target.state, self.request.state)?;
            tracing::info!(
                "{} {} ({}): {} -> {} via {}",
                self.provider.kind(),
                target.name.as_deref().unwrap_or("<unnamed>"),
                target.id,
                target.state,
                self.request.state,
                action
            );

            self.apply(action, target, &mut acc).await?;
            acc.record_action(ActionRecord {
                id: target.id,
                name: target.name.clone(),
                observed: target.state,
                action,
            });
        }

        Ok(acc.finish())
    }

    async fn apply(&self, action: Action, target: &Target, acc: &mut ResultBuilder) -> Result<()> {
        match action {
            Action::Create => self.create(target, acc).await,
            Action::Destroy => self.destroy(target, acc).await,
            Action::Start => self.start(target, acc).await,
            Action::Stop => self.stop(target, acc).await,
            Action::Suspend => self.suspend(target, acc).await,
            Action::Resume => self.resume(target, acc).await,
            Action::NoOp => self.no_op(target, acc).await,
        }
    }
}
