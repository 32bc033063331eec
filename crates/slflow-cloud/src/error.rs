//! Reconciliation error types

use crate::state::{DesiredState, ObservedState};
use thiserror::Error;

/// Errors that abort a reconciliation pass
///
/// There is no partial result: any of these surfaces to the caller as a
/// failed pass, even when earlier resources in the same pass were handled.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Provider API error faultCode={code}, faultString={message}")]
    ProviderApi { code: String, message: String },

    #[error("No transition from observed state {observed} to requested state {requested}")]
    NoSuchTransition {
        observed: ObservedState,
        requested: DesiredState,
    },

    #[error("A full name (hostname.domain) is required to create a {0}")]
    MissingName(String),

    #[error("Invalid name '{0}': expected hostname.domain")]
    InvalidName(String),

    #[error("Duplicated name in facts: {0}")]
    DuplicateFactName(String),

    #[error("Malformed provider record: {0}")]
    MalformedRecord(String),

    #[error("SSH key not found for label: {0}")]
    CredentialNotFound(String),

    #[error("Invalid resource spec: {0}")]
    InvalidSpec(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Build a provider fault, keeping code and message verbatim
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        CloudError::ProviderApi {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable kind name reported in failure documents
    pub fn kind(&self) -> &'static str {
        match self {
            CloudError::ProviderUnavailable(_) => "ProviderUnavailable",
            CloudError::ProviderApi { .. } => "ProviderAPIError",
            CloudError::NoSuchTransition { .. } => "NoSuchTransition",
            CloudError::MissingName(_) => "MissingName",
            CloudError::InvalidName(_) => "InvalidName",
            CloudError::DuplicateFactName(_) => "DuplicateFactName",
            CloudError::MalformedRecord(_) => "MalformedRecord",
            CloudError::CredentialNotFound(_) => "CredentialNotFound",
            CloudError::InvalidSpec(_) => "InvalidSpec",
            CloudError::Json(_) => "MalformedRecord",
        }
    }

    /// The provider fault code, when the error came from the provider
    pub fn fault_code(&self) -> Option<&str> {
        match self {
            CloudError::ProviderApi { code, .. } => Some(code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
