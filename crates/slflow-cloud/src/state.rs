//! Observed and requested lifecycle states

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle state of a resource as reported by the provider
///
/// `Undefined` is never reported by a provider. The driver synthesizes it
/// for an identity that matched nothing, so the transition table can route
/// to `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservedState {
    Undefined,
    Running,
    Halted,
    Paused,
}

impl ObservedState {
    pub const ALL: [ObservedState; 4] = [
        ObservedState::Undefined,
        ObservedState::Running,
        ObservedState::Halted,
        ObservedState::Paused,
    ];

    /// Parse a provider power state name (`powerState.name`)
    pub fn from_power_state(name: &str) -> Option<Self> {
        match name {
            "Running" => Some(ObservedState::Running),
            "Halted" => Some(ObservedState::Halted),
            "Paused" => Some(ObservedState::Paused),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObservedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObservedState::Undefined => write!(f, "Undefined"),
            ObservedState::Running => write!(f, "Running"),
            ObservedState::Halted => write!(f, "Halted"),
            ObservedState::Paused => write!(f, "Paused"),
        }
    }
}

/// What the caller asks for in one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    Running,
    Halted,
    Paused,
    Destroy,
    List,
    Info,
    Facts,
}

impl DesiredState {
    pub const ALL: [DesiredState; 7] = [
        DesiredState::Running,
        DesiredState::Halted,
        DesiredState::Paused,
        DesiredState::Destroy,
        DesiredState::List,
        DesiredState::Info,
        DesiredState::Facts,
    ];

    /// Read-only requests never consult the transition table
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            DesiredState::List | DesiredState::Info | DesiredState::Facts
        )
    }
}

impl std::fmt::Display for DesiredState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesiredState::Running => write!(f, "running"),
            DesiredState::Halted => write!(f, "halted"),
            DesiredState::Paused => write!(f, "paused"),
            DesiredState::Destroy => write!(f, "destroy"),
            DesiredState::List => write!(f, "list"),
            DesiredState::Info => write!(f, "info"),
            DesiredState::Facts => write!(f, "facts"),
        }
    }
}

impl FromStr for DesiredState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DesiredState::ALL
            .into_iter()
            .find(|state| state.to_string() == s)
            .ok_or_else(|| {
                format!(
                    "unknown state '{}' (expected one of: running, halted, paused, destroy, list, info, facts)",
                    s
                )
            })
    }
}
