use async_trait::async_trait;
use serde_json::json;
use slflow_cloud::{
    CloudError, OrderRequest, QueryFilter, RawRecord, ResourceKind, ResourceProvider, Result,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// A provider call, as recorded by `StubProvider`
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query(QueryFilter),
    GetDetail(u64),
    VerifyCreate(OrderRequest),
    CommitCreate(OrderRequest),
    Cancel(u64, bool),
    EditTags(u64, Vec<String>),
    WaitUntilReady(u64),
    ResolveCredential(String),
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Call::CommitCreate(_) | Call::Cancel(..) | Call::EditTags(..)
        )
    }
}

/// In-memory provider that replays scripted query results and records calls
///
/// Query responses are consumed in order; the last one repeats.
pub struct StubProvider {
    kind: ResourceKind,
    queries: Mutex<VecDeque<Vec<RawRecord>>>,
    details: HashMap<u64, RawRecord>,
    commit_response: RawRecord,
    cancel_ack: bool,
    cancel_fault: Option<(String, String)>,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl StubProvider {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            queries: Mutex::new(VecDeque::new()),
            details: HashMap::new(),
            commit_response: RawRecord::new(json!({"id": 9001})),
            cancel_ack: true,
            cancel_fault: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn guests() -> Self {
        Self::new(ResourceKind::VirtualGuest)
    }

    pub fn hardware() -> Self {
        Self::new(ResourceKind::BareMetal)
    }

    /// Queue the result of the next query
    pub fn then_query(self, records: Vec<RawRecord>) -> Self {
        self.queries.lock().unwrap().push_back(records);
        self
    }

    pub fn with_detail(mut self, record: RawRecord) -> Self {
        let id = record.id().expect("detail record needs an id");
        self.details.insert(id, record);
        self
    }

    pub fn commit_returns(mut self, record: RawRecord) -> Self {
        self.commit_response = record;
        self
    }

    pub fn cancel_returns(mut self, ack: bool) -> Self {
        self.cancel_ack = ack;
        self
    }

    pub fn cancel_fails(mut self, code: &str, message: &str) -> Self {
        self.cancel_fault = Some((code.to_string(), message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn committed_request(&self) -> Option<OrderRequest> {
        self.calls().into_iter().find_map(|c| match c {
            Call::CommitCreate(request) => Some(request),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ResourceProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn query(&self, filter: &QueryFilter) -> Result<Vec<RawRecord>> {
        self.record(Call::Query(filter.clone()));
        let mut queries = self.queries.lock().unwrap();
        let records = if queries.len() > 1 {
            queries.pop_front().unwrap_or_default()
        } else {
            queries.front().cloned().unwrap_or_default()
        };
        Ok(records)
    }

    async fn get_detail(&self, id: u64) -> Result<RawRecord> {
        self.record(Call::GetDetail(id));
        self.details.get(&id).cloned().ok_or_else(|| {
            CloudError::api(
                "SoftLayer_Exception_ObjectNotFound",
                format!("Unable to find object with id of '{}'.", id),
            )
        })
    }

    async fn verify_create(&self, request: &OrderRequest) -> Result<RawRecord> {
        self.record(Call::VerifyCreate(request.clone()));
        Ok(RawRecord::new(json!({"verified": true})))
    }

    async fn commit_create(&self, request: &OrderRequest) -> Result<RawRecord> {
        self.record(Call::CommitCreate(request.clone()));
        Ok(self.commit_response.clone())
    }

    async fn cancel(&self, id: u64, immediate: bool) -> Result<bool> {
        self.record(Call::Cancel(id, immediate));
        match &self.cancel_fault {
            Some((code, message)) => Err(CloudError::api(code.clone(), message.clone())),
            None => Ok(self.cancel_ack),
        }
    }

    async fn edit_tags(&self, id: u64, tags: &[String]) -> Result<bool> {
        self.record(Call::EditTags(id, tags.to_vec()));
        Ok(true)
    }

    async fn wait_until_ready(&self, id: u64, _timeout: Duration) -> Result<()> {
        self.record(Call::WaitUntilReady(id));
        Ok(())
    }

    async fn resolve_credential_id(&self, label: &str) -> Result<u64> {
        self.record(Call::ResolveCredential(label.to_string()));
        Ok(4242)
    }
}

/// A virtual guest as the list query returns it
#[allow(dead_code)]
pub fn guest(id: u64, name: &str, power_state: &str) -> RawRecord {
    RawRecord::new(json!({
        "id": id,
        "fullyQualifiedDomainName": name,
        "datacenter": {"name": "par01"},
        "powerState": {"name": power_state},
        "status": {"name": "Active"},
        "primaryBackendIpAddress": format!("10.0.0.{}", id % 250),
    }))
}

/// A bare-metal server as the list query returns it
#[allow(dead_code)]
pub fn server(id: u64, name: &str) -> RawRecord {
    RawRecord::new(json!({
        "id": id,
        "fullyQualifiedDomainName": name,
        "datacenter": {"name": "par01"},
        "hardwareStatusId": 5,
        "primaryIpAddress": "169.254.10.1",
    }))
}
