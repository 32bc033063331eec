//! SoftLayer REST API client
//!
//! Every service method is reachable as
//! `{endpoint}/{Service}[/{id}]/{method}.json`. Calls without parameters are
//! issued as GET; calls with parameters POST `{"parameters": [...]}`.
//! Faults come back as `{"error": ..., "code": ...}` bodies, usually with a
//! non-2xx status.

use crate::error::{Result, SoftLayerError};
use crate::filter::ObjectFilter;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::Instant;

pub const SOFTLAYER_API_BASE: &str = "https://api.softlayer.com/rest/v3.1";

/// Interval between readiness polls
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(10);

const READY_MASK: &str = "id,provisionDate,activeTransaction.id";
const SSH_KEY_MASK: &str = "id,label";

/// Connection settings for the SoftLayer API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub username: String,
    pub api_key: String,
    pub endpoint: String,
}

impl ClientConfig {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
            endpoint: SOFTLAYER_API_BASE.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// One service method call
#[derive(Debug, Clone)]
pub struct ServiceCall {
    service: &'static str,
    method: &'static str,
    id: Option<u64>,
    mask: Option<&'static str>,
    filter: Option<ObjectFilter>,
    parameters: Vec<Value>,
}

impl ServiceCall {
    pub fn new(service: &'static str, method: &'static str) -> Self {
        Self {
            service,
            method,
            id: None,
            mask: None,
            filter: None,
            parameters: Vec::new(),
        }
    }

    /// Call the method on one object
    pub fn on(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn mask(mut self, mask: &'static str) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn filter(mut self, filter: ObjectFilter) -> Self {
        if !filter.is_empty() {
            self.filter = Some(filter);
        }
        self
    }

    pub fn parameters(mut self, parameters: Vec<Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_end_matches('/');
        match self.id {
            Some(id) => format!("{}/{}/{}/{}.json", endpoint, self.service, id, self.method),
            None => format!("{}/{}/{}.json", endpoint, self.service, self.method),
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(mask) = self.mask {
            query.push(("objectMask", format!("mask[{}]", mask)));
        }
        if let Some(filter) = &self.filter {
            query.push(("objectFilter", filter.to_string()));
        }
        query
    }
}

impl std::fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}({})::{}", self.service, id, self.method),
            None => write!(f, "{}::{}", self.service, self.method),
        }
    }
}

/// SoftLayer API client
#[derive(Debug, Clone)]
pub struct SoftLayerClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl SoftLayerClient {
    /// Create a client; username and API key must be non-empty
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.username.is_empty() {
            return Err(SoftLayerError::MissingCredentials(
                "SoftLayer username is not set (SL_USERNAME)".to_string(),
            ));
        }
        if config.api_key.is_empty() {
            return Err(SoftLayerError::MissingCredentials(
                "SoftLayer API key is not set (SL_API_KEY)".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    /// Issue one call and return the decoded response body
    pub async fn call(&self, call: &ServiceCall) -> Result<Value> {
        let url = call.url(&self.config.endpoint);
        tracing::debug!("SoftLayer call {}", call);

        let request = if call.parameters.is_empty() {
            self.client.get(&url)
        } else {
            self.client
                .post(&url)
                .json(&json!({ "parameters": call.parameters }))
        };

        let response = request
            .basic_auth(&self.config.username, Some(&self.config.api_key))
            .query(&call.query())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_response(status.as_u16(), &body)
    }

    /// Issue a call whose response must be a list
    pub async fn call_list(&self, call: &ServiceCall) -> Result<Vec<Value>> {
        match self.call(call).await? {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(SoftLayerError::UnexpectedResponse(format!(
                "{} returned {} instead of a list",
                call, other
            ))),
        }
    }

    /// Issue a call whose response is a boolean acknowledgement
    pub async fn call_bool(&self, call: &ServiceCall) -> Result<bool> {
        Ok(self.call(call).await?.as_bool().unwrap_or(false))
    }

    /// Find the id of the account SSH key with `label`
    pub async fn ssh_key_id(&self, label: &str) -> Result<u64> {
        let mut filter = ObjectFilter::new();
        filter.exact(&["sshKeys", "label"], label);
        let call = ServiceCall::new("SoftLayer_Account", "getSshKeys")
            .mask(SSH_KEY_MASK)
            .filter(filter);

        self.call_list(&call)
            .await?
            .iter()
            .find(|key| key.get("label").and_then(Value::as_str) == Some(label))
            .and_then(|key| key.get("id").and_then(Value::as_u64))
            .ok_or_else(|| SoftLayerError::SshKeyNotFound(label.to_string()))
    }

    /// Poll `service` object `id` until it is provisioned with no active
    /// transaction, or until `timeout` elapses
    ///
    /// Returns whether the object became ready. A timeout is not an error.
    pub async fn wait_for_ready(
        &self,
        service: &'static str,
        id: u64,
        timeout: Duration,
    ) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let call = ServiceCall::new(service, "getObject")
            .on(id)
            .mask(READY_MASK);

        loop {
            let status: ReadyStatus = serde_json::from_value(self.call(&call).await?)?;
            if status.is_ready() {
                tracing::debug!("{} {} is ready", service, id);
                return Ok(true);
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    "{} {} not ready after {:?}; continuing",
                    service,
                    id,
                    timeout
                );
                return Ok(false);
            }
            tokio::time::sleep(READY_POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadyStatus {
    provision_date: Option<String>,
    active_transaction: Option<Value>,
}

impl ReadyStatus {
    fn is_ready(&self) -> bool {
        self.provision_date.as_deref().is_some_and(|d| !d.is_empty())
            && self.active_transaction.as_ref().is_none_or(Value::is_null)
    }
}

#[derive(Debug, Deserialize)]
struct ApiFault {
    error: String,
    code: Option<String>,
}

/// Decode a response body, turning fault documents into errors
pub fn parse_response(status: u16, body: &str) -> Result<Value> {
    let value = if body.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => value,
            Err(_) if !(200..300).contains(&status) => {
                return Err(SoftLayerError::Status {
                    status,
                    body: body.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }
    };

    if value.get("error").is_some() {
        let fault: ApiFault = serde_json::from_value(value)?;
        return Err(SoftLayerError::Fault {
            code: fault
                .code
                .unwrap_or_else(|| "SoftLayer_Exception".to_string()),
            message: fault.error,
        });
    }

    if !(200..300).contains(&status) {
        return Err(SoftLayerError::Status {
            status,
            body: body.to_string(),
        });
    }

    Ok(value)
}
