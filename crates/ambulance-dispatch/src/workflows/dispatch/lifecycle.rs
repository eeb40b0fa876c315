//! Call status state machine.
//!
//! Every status change on a call goes through [`CallStatus::transition`]; there is no
//! other path that writes the status field.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Pending,
    Dispatched,
    #[serde(alias = "en-route")]
    EnRoute,
    Arrived,
    #[serde(alias = "in-transit")]
    InTransit,
    Completed,
    Cancelled,
}

impl CallStatus {
    pub const ALL: [CallStatus; 7] = [
        CallStatus::Pending,
        CallStatus::Dispatched,
        CallStatus::EnRoute,
        CallStatus::Arrived,
        CallStatus::InTransit,
        CallStatus::Completed,
        CallStatus::Cancelled,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Dispatched => "dispatched",
            CallStatus::EnRoute => "en_route",
            CallStatus::Arrived => "arrived",
            CallStatus::InTransit => "in_transit",
            CallStatus::Completed => "completed",
            CallStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, CallStatus::Completed | CallStatus::Cancelled)
    }

    /// Statuses reachable from `self` in a single step.
    pub const fn successors(self) -> &'static [CallStatus] {
        match self {
            CallStatus::Pending => &[CallStatus::Dispatched, CallStatus::Cancelled],
            // Re-dispatching swaps the crew without leaving the state.
            CallStatus::Dispatched => &[
                CallStatus::Dispatched,
                CallStatus::EnRoute,
                CallStatus::Cancelled,
            ],
            CallStatus::EnRoute => &[CallStatus::Arrived, CallStatus::Cancelled],
            CallStatus::Arrived => &[
                CallStatus::InTransit,
                CallStatus::Completed,
                CallStatus::Cancelled,
            ],
            CallStatus::InTransit => &[CallStatus::Completed],
            CallStatus::Completed | CallStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: CallStatus) -> bool {
        self.successors().contains(&next)
    }

    pub fn transition(self, next: CallStatus) -> Result<CallStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "call",
                from: self.label(),
                to: next.label(),
            })
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Rejected status move on a call or route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move {entity} from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}
