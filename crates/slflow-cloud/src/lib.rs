//! slflow Cloud Lifecycle Engine
//!
//! This crate reconciles the requested lifecycle state of compute resources
//! (virtual guests and bare-metal servers) with what a remote provider
//! reports, one declarative and idempotent pass at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   slflow CLI                     │
//! │         (slflow guest running --name ...)        │
//! └─────────────────┬───────────────────────────────┘
//!                   │ ReconcileRequest
//! ┌─────────────────▼───────────────────────────────┐
//! │                 slflow-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   Driver ─▶ Transition Table ─▶ Handlers  │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────────────┐     │
//! │  │ Resource     │  │ Fact Projector       │     │
//! │  │ Query        │  │ (summary / facts)    │     │
//! │  └──────────────┘  └──────────────────────┘     │
//! └─────────────────┬───────────────────────────────┘
//!                   │ trait ResourceProvider
//! ┌─────────────────▼───────────────────────────────┐
//! │   softlayer provider (virtual guest / bare metal) │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use slflow_cloud::{DesiredState, ReconcileRequest, ResourceIdentity, reconcile};
//!
//! let request = ReconcileRequest::new(
//!     DesiredState::Running,
//!     ResourceIdentity::named("web01.example.com"),
//! );
//! let result = reconcile(&provider, &request).await?;
//! println!("changed: {}", result.changed);
//! ```

pub mod action;
pub mod driver;
pub mod error;
mod handlers;
pub mod identity;
pub mod projector;
pub mod provider;
pub mod query;
pub mod result;
pub mod spec;
pub mod state;
pub mod transition;

// Re-exports
pub use action::{Action, ActionRecord, ReadOnlyAction};
pub use driver::{
    DEFAULT_CREDENTIAL_LABEL, DEFAULT_READY_TIMEOUT, ReconcileRequest, Reconciler, Target,
    reconcile,
};
pub use error::{CloudError, Result};
pub use identity::{ResourceIdentity, split_name};
pub use projector::{FactRecord, InstanceSummary, extract_facts, summarize};
pub use provider::{QueryFilter, RawRecord, ResourceKind, ResourceProvider};
pub use query::{ObservedResource, ResourceQuery, locate};
pub use result::{Instance, ReconciliationResult, ResultBuilder};
pub use spec::{BillingMode, FieldRename, OrderRequest, PreparedOrder, ResourceSpec, build_order};
pub use state::{DesiredState, ObservedState};
