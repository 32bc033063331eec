//! SoftLayer object filters
//!
//! An object filter is a JSON tree rooted at the collection being listed,
//! e.g. `{"virtualGuests": {"hostname": {"operation": "_= web01"}}}`.

use serde_json::{Map, Value, json};
use slflow_cloud::QueryFilter;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectFilter {
    root: Map<String, Value>,
}

impl ObjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter a listed collection by a resource query
    pub fn for_query(collection: &str, query: &QueryFilter) -> Self {
        let mut filter = Self::new();
        if let Some(hostname) = &query.hostname {
            filter.exact(&[collection, "hostname"], hostname);
        }
        if let Some(domain) = &query.domain {
            filter.exact(&[collection, "domain"], domain);
        }
        if let Some(datacenter) = &query.datacenter {
            filter.exact(&[collection, "datacenter", "name"], datacenter);
        }
        if !query.tags.is_empty() {
            filter.any_of(&[collection, "tagReferences", "tag", "name"], &query.tags);
        }
        filter
    }

    /// `_=` exact match on the property at `path`
    pub fn exact(&mut self, path: &[&str], value: &str) -> &mut Self {
        self.set(path, json!({ "operation": format!("_= {}", value) }))
    }

    /// `in` match on the property at `path`
    pub fn any_of(&mut self, path: &[&str], values: &[String]) -> &mut Self {
        self.set(
            path,
            json!({
                "operation": "in",
                "options": [{ "name": "data", "value": values }],
            }),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    fn set(&mut self, path: &[&str], leaf: Value) -> &mut Self {
        insert_path(&mut self.root, path, leaf);
        self
    }
}

fn insert_path(node: &mut Map<String, Value>, path: &[&str], leaf: Value) {
    match path {
        [] => {}
        [last] => {
            node.insert(last.to_string(), leaf);
        }
        [first, rest @ ..] => {
            let child = node
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = child {
                insert_path(map, rest, leaf);
            } else {
                let mut map = Map::new();
                insert_path(&mut map, rest, leaf);
                *child = Value::Object(map);
            }
        }
    }
}

impl std::fmt::Display for ObjectFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
