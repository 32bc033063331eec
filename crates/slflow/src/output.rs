//! JSON documents written to stdout

use serde::Serialize;
use slflow_cloud::{CloudError, ReconciliationResult};

/// Document printed when a pass fails
#[derive(Debug, Serialize)]
pub struct Failure<'a> {
    pub failed: bool,
    pub kind: &'a str,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_code: Option<&'a str>,
}

impl<'a> From<&'a CloudError> for Failure<'a> {
    fn from(err: &'a CloudError) -> Self {
        Self {
            failed: true,
            kind: err.kind(),
            msg: err.to_string(),
            fault_code: err.fault_code(),
        }
    }
}

pub fn render_result(result: &ReconciliationResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

pub fn render_failure(err: &CloudError) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Failure::from(err))
}
