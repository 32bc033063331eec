//! SoftLayer provider error types

use slflow_cloud::CloudError;
use thiserror::Error;

/// Fault code reported for transport-level failures
pub const HTTP_ERROR: &str = "HTTP_ERROR";

#[derive(Error, Debug)]
pub enum SoftLayerError {
    #[error("SoftLayer fault {code}: {message}")]
    Fault { code: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("SoftLayer credentials missing: {0}")]
    MissingCredentials(String),

    #[error("SSH key not found: {0}")]
    SshKeyNotFound(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SoftLayerError>;

impl From<SoftLayerError> for CloudError {
    fn from(err: SoftLayerError) -> Self {
        match err {
            SoftLayerError::Fault { code, message } => CloudError::api(code, message),
            SoftLayerError::Http(e) => CloudError::api(HTTP_ERROR, e.to_string()),
            e @ SoftLayerError::Status { .. } => CloudError::api(HTTP_ERROR, e.to_string()),
            SoftLayerError::MissingCredentials(msg) => CloudError::ProviderUnavailable(msg),
            SoftLayerError::SshKeyNotFound(label) => CloudError::CredentialNotFound(label),
            SoftLayerError::InvalidOrder(msg) => CloudError::InvalidSpec(msg),
            SoftLayerError::UnexpectedResponse(msg) => CloudError::MalformedRecord(msg),
            SoftLayerError::JsonError(e) => CloudError::Json(e),
        }
    }
}
