//! Lifecycle transition table
//!
//! | observed \ requested | running | halted | paused | destroy |
//! |----------------------|---------|--------|--------|---------|
//! | Undefined            | create  |        |        |         |
//! | Running              | no-op   | stop   | suspend| destroy |
//! | Halted               | start   | no-op  |        | destroy |
//! | Paused               | resume  |        | no-op  | destroy |
//!
//! Empty cells have no entry; routing into one is `NoSuchTransition`.
//! Read-only requests (`list`, `info`, `facts`) never reach this table.

use crate::action::Action;
use crate::error::{CloudError, Result};
use crate::state::{DesiredState, ObservedState};

/// Every legal `(observed, requested) -> action` move
pub const TRANSITIONS: &[(ObservedState, DesiredState, Action)] = &[
    (ObservedState::Undefined, DesiredState::Running, Action::Create),
    (ObservedState::Running, DesiredState::Running, Action::NoOp),
    (ObservedState::Running, DesiredState::Halted, Action::Stop),
    (ObservedState::Running, DesiredState::Paused, Action::Suspend),
    (ObservedState::Running, DesiredState::Destroy, Action::Destroy),
    (ObservedState::Halted, DesiredState::Running, Action::Start),
    (ObservedState::Halted, DesiredState::Halted, Action::NoOp),
    (ObservedState::Halted, DesiredState::Destroy, Action::Destroy),
    (ObservedState::Paused, DesiredState::Running, Action::Resume),
    (ObservedState::Paused, DesiredState::Paused, Action::NoOp),
    (ObservedState::Paused, DesiredState::Destroy, Action::Destroy),
];

/// Find the action for one observed resource
pub fn lookup(observed: ObservedState, requested: DesiredState) -> Result<Action> {
    TRANSITIONS
        .iter()
        .find(|(from, to, _)| *from == observed && *to == requested)
        .map(|(_, _, action)| *action)
        .ok_or(CloudError::NoSuchTransition {
            observed,
            requested,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_cells() {
        use Action::*;
        use DesiredState as D;
        use ObservedState as O;

        let expected = [
            (O::Undefined, D::Running, Create),
            (O::Running, D::Running, NoOp),
            (O::Running, D::Halted, Stop),
            (O::Running, D::Paused, Suspend),
            (O::Running, D::Destroy, Destroy),
            (O::Halted, D::Running, Start),
            (O::Halted, D::Halted, NoOp),
            (O::Halted, D::Destroy, Destroy),
            (O::Paused, D::Running, Resume),
            (O::Paused, D::Paused, NoOp),
            (O::Paused, D::Destroy, Destroy),
        ];
        for (observed, requested, action) in expected {
            assert_eq!(lookup(observed, requested).unwrap(), action);
        }
    }

    #[test]
    fn test_undefined_cells() {
        use DesiredState as D;
        use ObservedState as O;

        let missing = [
            (O::Undefined, D::Halted),
            (O::Undefined, D::Paused),
            (O::Undefined, D::Destroy),
            (O::Halted, D::Paused),
            (O::Paused, D::Halted),
        ];
        for (observed, requested) in missing {
            match lookup(observed, requested) {
                Err(CloudError::NoSuchTransition {
                    observed: o,
                    requested: r,
                }) => {
                    assert_eq!(o, observed);
                    assert_eq!(r, requested);
                }
                other => panic!("expected NoSuchTransition, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_read_only_requests_have_no_cells() {
        for observed in ObservedState::ALL {
            for requested in DesiredState::ALL.into_iter().filter(|r| r.is_read_only()) {
                assert!(lookup(observed, requested).is_err());
            }
        }
    }

    #[test]
    fn test_table_has_no_duplicate_keys() {
        for (i, (o1, r1, _)) in TRANSITIONS.iter().enumerate() {
            for (o2, r2, _) in &TRANSITIONS[i + 1..] {
                assert!(!(o1 == o2 && r1 == r2), "duplicate cell {} / {}", o1, r1);
            }
        }
    }
}
