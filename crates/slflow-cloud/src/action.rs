//! Action types for lifecycle transitions

use crate::state::{DesiredState, ObservedState};
use serde::{Deserialize, Serialize};

/// Handler selected by the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Order a new resource
    Create,
    /// Cancel an existing resource
    Destroy,
    /// Halted -> Running
    Start,
    /// Running -> Halted
    Stop,
    /// Running -> Paused
    Suspend,
    /// Paused -> Running
    Resume,
    /// Observed state already matches
    #[serde(rename = "no-op")]
    NoOp,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Destroy => write!(f, "destroy"),
            Action::Start => write!(f, "start"),
            Action::Stop => write!(f, "stop"),
            Action::Suspend => write!(f, "suspend"),
            Action::Resume => write!(f, "resume"),
            Action::NoOp => write!(f, "no-op"),
        }
    }
}

/// Handler for a read-only request
///
/// Read-only requests bypass the transition table and dispatch once for
/// the whole identity instead of once per matched resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOnlyAction {
    List,
    Info,
    Facts,
}

impl ReadOnlyAction {
    pub fn for_state(state: DesiredState) -> Option<Self> {
        match state {
            DesiredState::List => Some(ReadOnlyAction::List),
            DesiredState::Info => Some(ReadOnlyAction::Info),
            DesiredState::Facts => Some(ReadOnlyAction::Facts),
            _ => None,
        }
    }
}

/// One transition applied during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Resource id; 0 for a resource that did not exist yet
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub observed: ObservedState,
    pub action: Action,
}
