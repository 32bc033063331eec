//! Reconcile arguments and their translation into a request

use clap::Args;
use slflow_cloud::{
    BillingMode, CloudError, DesiredState, ReconcileRequest, ResourceIdentity, ResourceSpec,
};
use slflow_config::Settings;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Requested state (running, halted, paused, destroy, list, info, facts)
    #[arg(value_parser = DesiredState::from_str)]
    pub state: DesiredState,

    /// Full name (hostname.domain)
    #[arg(short, long, conflicts_with_all = ["hostname", "domain"])]
    pub name: Option<String>,

    /// Host name, used with --domain
    #[arg(long)]
    pub hostname: Option<String>,

    /// Domain, used with --hostname
    #[arg(long)]
    pub domain: Option<String>,

    /// Datacenter short name (e.g. par01)
    #[arg(short, long)]
    pub datacenter: Option<String>,

    /// Tags, comma separated; filter for facts only
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Flavor file (YAML or JSON) describing the resource to create
    #[arg(short, long)]
    pub flavor: Option<PathBuf>,

    /// Label of the account SSH key installed on new resources
    #[arg(long, env = "SLFLOW_SSHKEY")]
    pub sshkey: Option<String>,

    /// Bill new resources hourly (default)
    #[arg(long, conflicts_with = "monthly")]
    pub hourly: bool,

    /// Bill new resources monthly
    #[arg(long)]
    pub monthly: bool,

    /// Seconds to wait for a resource to become ready
    #[arg(short, long, value_name = "SECS", conflicts_with = "no_wait")]
    pub wait: Option<u64>,

    /// Do not wait for readiness after create or destroy
    #[arg(long)]
    pub no_wait: bool,
}

impl ReconcileArgs {
    pub fn identity(&self) -> ResourceIdentity {
        let mut identity = ResourceIdentity::new().with_tags(self.tags.iter().cloned());
        identity.name = self.name.clone();
        identity.hostname = self.hostname.clone();
        identity.domain = self.domain.clone();
        identity.datacenter = self.datacenter.clone();
        identity
    }

    pub fn billing(&self) -> BillingMode {
        if self.monthly {
            BillingMode::Monthly
        } else {
            BillingMode::Hourly
        }
    }

    pub fn ready_timeout(&self, settings: &Settings) -> Option<Duration> {
        if self.no_wait {
            return None;
        }
        Some(
            self.wait
                .map(Duration::from_secs)
                .unwrap_or_else(|| settings.ready_timeout()),
        )
    }

    pub fn spec(&self) -> Result<Option<ResourceSpec>, CloudError> {
        let Some(path) = &self.flavor else {
            return Ok(None);
        };
        let flavor = slflow_config::load_flavor(path)
            .map_err(|e| CloudError::InvalidSpec(e.to_string()))?;
        ResourceSpec::from_value(serde_json::Value::Object(flavor.into_iter().collect())).map(Some)
    }

    pub fn to_request(&self, settings: &Settings) -> Result<ReconcileRequest, CloudError> {
        let mut request = ReconcileRequest::new(self.state, self.identity())
            .with_credential_label(
                self.sshkey
                    .clone()
                    .unwrap_or_else(|| settings.ssh_key_label.clone()),
            )
            .with_billing(self.billing())
            .with_ready_timeout(self.ready_timeout(settings));
        if let Some(spec) = self.spec()? {
            request = request.with_spec(spec);
        }
        Ok(request)
    }
}
