//! # Service Lifecycle
//!
//! Runtime state enum, the operations that move a service between states, and
//! the transition table.
//!
//! State codes match the numeric values external callers already rely on:
//! PreRegistration = 1 through TerminatedBonded = 5. There is no state 0; a
//! service either exists or it does not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Service State ──────────────────────────────────────────────────────

/// Lifecycle state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceState {
    /// Defined but not accepting operators. Configuration may change.
    #[serde(rename = "PRE_REGISTRATION")]
    PreRegistration,
    /// Accepting operator registrations.
    #[serde(rename = "ACTIVE_REGISTRATION")]
    ActiveRegistration,
    /// Every slot is filled; ready to deploy.
    #[serde(rename = "FINISHED_REGISTRATION")]
    FinishedRegistration,
    /// A multisig wallet has been created for the instances.
    #[serde(rename = "DEPLOYED")]
    Deployed,
    /// Terminated while operators still hold bonds.
    #[serde(rename = "TERMINATED_BONDED")]
    TerminatedBonded,
}

impl ServiceState {
    /// All states in code order.
    pub const ALL: [ServiceState; 5] = [
        Self::PreRegistration,
        Self::ActiveRegistration,
        Self::FinishedRegistration,
        Self::Deployed,
        Self::TerminatedBonded,
    ];

    /// Numeric code, 1 through 5.
    pub fn code(&self) -> u8 {
        match self {
            Self::PreRegistration => 1,
            Self::ActiveRegistration => 2,
            Self::FinishedRegistration => 3,
            Self::Deployed => 4,
            Self::TerminatedBonded => 5,
        }
    }

    /// Inverse of [`Self::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreRegistration => "PRE_REGISTRATION",
            Self::ActiveRegistration => "ACTIVE_REGISTRATION",
            Self::FinishedRegistration => "FINISHED_REGISTRATION",
            Self::Deployed => "DEPLOYED",
            Self::TerminatedBonded => "TERMINATED_BONDED",
        }
    }

    /// Convert a canonical name back to a state.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Whether the owner may terminate from this state.
    pub fn is_terminable(&self) -> bool {
        matches!(
            self,
            Self::ActiveRegistration | Self::FinishedRegistration | Self::Deployed
        )
    }

    /// Target states reachable in one operation.
    pub fn valid_transitions(&self) -> &'static [ServiceState] {
        match self {
            Self::PreRegistration => &[Self::PreRegistration, Self::ActiveRegistration],
            Self::ActiveRegistration => &[
                Self::ActiveRegistration,
                Self::FinishedRegistration,
                Self::PreRegistration,
                Self::TerminatedBonded,
            ],
            Self::FinishedRegistration => &[
                Self::Deployed,
                Self::PreRegistration,
                Self::TerminatedBonded,
            ],
            Self::Deployed => &[Self::TerminatedBonded, Self::PreRegistration],
            Self::TerminatedBonded => &[Self::TerminatedBonded, Self::PreRegistration],
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Operations ─────────────────────────────────────────────────────────

/// A state-changing registry operation together with the guard facts that
/// decide its target state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    /// Replace the configuration of an unbonded service.
    Update,
    /// Open the service for operator registration.
    ActivateRegistration,
    /// Register one or more agent instances.
    RegisterAgents {
        /// Every slot of every role is filled after this registration.
        all_slots_filled: bool,
    },
    /// Create or attach the service multisig.
    Deploy,
    /// Owner terminates the service.
    Terminate {
        /// At least one operator still holds a bond.
        bonds_held: bool,
    },
    /// An operator withdraws its bonds after termination.
    Unbond {
        /// Other operators still hold bonds after this one leaves.
        bonds_remaining: bool,
    },
}

impl Operation {
    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::ActivateRegistration => "activate_registration",
            Self::RegisterAgents { .. } => "register_agents",
            Self::Deploy => "deploy",
            Self::Terminate { .. } => "terminate",
            Self::Unbond { .. } => "unbond",
        }
    }

    /// The only state this operation may start from, or `None` for
    /// terminate, which is allowed from several.
    fn required_state(&self) -> Option<ServiceState> {
        match self {
            Self::Update | Self::ActivateRegistration => Some(ServiceState::PreRegistration),
            Self::RegisterAgents { .. } => Some(ServiceState::ActiveRegistration),
            Self::Deploy => Some(ServiceState::FinishedRegistration),
            Self::Terminate { .. } => None,
            Self::Unbond { .. } => Some(ServiceState::TerminatedBonded),
        }
    }
}

/// Rejected transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The operation is not allowed from the current state.
    #[error("{operation} is not permitted in state {state}")]
    NotPermitted {
        /// Operation name.
        operation: &'static str,
        /// State the service was in.
        state: ServiceState,
    },
}

/// Compute the state after `operation`, or reject it.
pub fn next_state(from: ServiceState, operation: Operation) -> Result<ServiceState, TransitionError> {
    let allowed = match operation.required_state() {
        Some(required) => from == required,
        None => from.is_terminable(),
    };
    if !allowed {
        return Err(TransitionError::NotPermitted {
            operation: operation.name(),
            state: from,
        });
    }

    let to = match operation {
        Operation::Update => ServiceState::PreRegistration,
        Operation::ActivateRegistration => ServiceState::ActiveRegistration,
        Operation::RegisterAgents { all_slots_filled } => {
            if all_slots_filled {
                ServiceState::FinishedRegistration
            } else {
                ServiceState::ActiveRegistration
            }
        }
        Operation::Deploy => ServiceState::Deployed,
        Operation::Terminate { bonds_held } | Operation::Unbond { bonds_remaining: bonds_held } => {
            if bonds_held {
                ServiceState::TerminatedBonded
            } else {
                ServiceState::PreRegistration
            }
        }
    };
    debug_assert!(from.valid_transitions().contains(&to));
    Ok(to)
}

// ── Transition Record ──────────────────────────────────────────────────

/// One entry of a service's transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the operation.
    pub from_state: ServiceState,
    /// State after the operation.
    pub to_state: ServiceState,
    /// The operation and its guard facts.
    pub operation: Operation,
    /// When the transition was committed.
    pub timestamp: DateTime<Utc>,
}

impl TransitionRecord {
    /// Record a transition happening now.
    pub fn now(from_state: ServiceState, to_state: ServiceState, operation: Operation) -> Self {
        Self {
            from_state,
            to_state,
            operation,
            timestamp: Utc::now(),
        }
    }
}
