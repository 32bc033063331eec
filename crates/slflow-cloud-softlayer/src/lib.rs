//! SoftLayer provider for slflow
//!
//! This crate implements the `ResourceProvider` trait over the SoftLayer
//! REST API, one provider per resource kind.
//!
//! # Requirements
//!
//! - A SoftLayer username and API key (`SL_USERNAME`, `SL_API_KEY`)
//! - An SSH key registered on the account (label `default` unless told otherwise)
//!
//! # Example
//!
//! ```ignore
//! use slflow_cloud::{DesiredState, ReconcileRequest, ResourceIdentity, ResourceKind, reconcile};
//! use slflow_cloud_softlayer::{ClientConfig, SoftLayerClient, provider_for};
//!
//! let client = SoftLayerClient::new(ClientConfig::new("user", "api-key"))?;
//! let provider = provider_for(ResourceKind::VirtualGuest, client);
//!
//! let request = ReconcileRequest::new(DesiredState::List, ResourceIdentity::new());
//! let result = reconcile(provider.as_ref(), &request).await?;
//! ```

pub mod client;
pub mod error;
pub mod filter;
pub mod guest;
pub mod hardware;
pub mod template;

pub use client::{ClientConfig, SOFTLAYER_API_BASE, ServiceCall, SoftLayerClient};
pub use error::{Result, SoftLayerError};
pub use filter::ObjectFilter;
pub use guest::VirtualGuestProvider;
pub use hardware::BareMetalProvider;

use slflow_cloud::{ResourceKind, ResourceProvider};

/// The provider for one resource kind
pub fn provider_for(kind: ResourceKind, client: SoftLayerClient) -> Box<dyn ResourceProvider> {
    match kind {
        ResourceKind::VirtualGuest => Box::new(VirtualGuestProvider::new(client)),
        ResourceKind::BareMetal => Box::new(BareMetalProvider::new(client)),
    }
}
