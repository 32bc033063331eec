//! Logical resource identity

use crate::error::{CloudError, Result};
use crate::provider::QueryFilter;
use serde::{Deserialize, Serialize};

/// How the caller names the resources of a pass
///
/// Never unique by construction: a hostname/domain pair or a datacenter
/// filter may match many resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentity {
    /// Full dotted name; takes precedence over `hostname`/`domain`
    pub name: Option<String>,
    pub hostname: Option<String>,
    pub domain: Option<String>,
    pub datacenter: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ResourceIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve the full `hostname.domain` name, if the identity has one
    ///
    /// An explicit name is validated by splitting it. Without a name, both
    /// discrete halves must be present.
    pub fn full_name(&self) -> Result<Option<String>> {
        if let Some(name) = &self.name {
            split_name(name)?;
            return Ok(Some(name.clone()));
        }
        match (&self.hostname, &self.domain) {
            (Some(hostname), Some(domain)) => Ok(Some(format!("{}.{}", hostname, domain))),
            _ => Ok(None),
        }
    }

    /// The same filters, narrowed to one resource's full name
    pub fn narrowed_to(&self, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            hostname: None,
            domain: None,
            datacenter: self.datacenter.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Build the provider filter; the name wins over discrete hostname/domain
    pub fn to_filter(&self, with_tags: bool) -> Result<QueryFilter> {
        let (hostname, domain) = match &self.name {
            Some(name) => {
                let (hostname, domain) = split_name(name)?;
                (Some(hostname.to_string()), Some(domain.to_string()))
            }
            None => (self.hostname.clone(), self.domain.clone()),
        };

        Ok(QueryFilter {
            hostname,
            domain,
            datacenter: self.datacenter.clone(),
            tags: if with_tags {
                self.tags.clone()
            } else {
                Vec::new()
            },
        })
    }
}

/// Split `hostname.domain` on the first dot; both halves must be non-empty
pub fn split_name(name: &str) -> Result<(&str, &str)> {
    match name.split_once('.') {
        Some((hostname, domain)) if !hostname.is_empty() && !domain.is_empty() => {
            Ok((hostname, domain))
        }
        _ => Err(CloudError::InvalidName(name.to_string())),
    }
}
