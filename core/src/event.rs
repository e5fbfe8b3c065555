//! Orchestrator lifecycle events.
//!
//! Emitted on an optional channel so tooling and tests can observe the
//! request lifecycle without reaching into orchestrator state.
//! Variants are appended, never removed or reordered.

use crate::types::Token;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    /// A parameter change (re)started the debounce timer.
    Scheduled {
        revision: u64,
    },
    /// The timer elapsed and a request left for the model.
    RequestIssued {
        token:    Token,
        revision: u64,
    },
    ResponseAccepted {
        token:     Token,
        malformed: usize,
    },
    /// A response arrived for a token that is no longer the latest.
    ResponseDiscarded {
        token:  Token,
        latest: Token,
    },
    RequestFailed {
        token: Token,
        error: String,
    },
    /// A failure for a superseded token; nothing changes.
    FailureIgnored {
        token:  Token,
        latest: Token,
    },
    TornDown {
        last_token: Token,
    },
}

impl OrchestratorEvent {
    /// Stable string name, used in log lines and the runner's output.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scheduled { .. }         => "scheduled",
            Self::RequestIssued { .. }     => "request_issued",
            Self::ResponseAccepted { .. }  => "response_accepted",
            Self::ResponseDiscarded { .. } => "response_discarded",
            Self::RequestFailed { .. }     => "request_failed",
            Self::FailureIgnored { .. }    => "failure_ignored",
            Self::TornDown { .. }          => "torn_down",
        }
    }
}
