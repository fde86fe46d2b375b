//! # Validation Errors
//!
//! Structured rejection reasons for domain primitives and service
//! configurations, built with `thiserror`. Each variant carries the value that
//! failed so callers can report it without re-deriving context.

use thiserror::Error;

/// Errors produced while constructing or validating domain primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account identifier is malformed.
    #[error("invalid account id {value:?}: {reason}")]
    InvalidAccountId {
        /// The rejected input.
        value: String,
        /// Which rule it violated.
        reason: &'static str,
    },

    /// Configuration hash is all zeros.
    #[error("configuration hash must not be zero")]
    ZeroConfigHash,

    /// Configuration hash could not be decoded from hex.
    #[error("invalid configuration hash {value:?}: expected 64 hex characters")]
    InvalidConfigHash {
        /// The rejected input.
        value: String,
    },

    /// Service identifiers start at 1.
    #[error("service id must be positive")]
    ZeroServiceId,

    /// Agent ids must be non-zero.
    #[error("agent id must be non-zero")]
    ZeroAgentId,

    /// The same agent id appears twice in one configuration.
    #[error("duplicate agent id {agent_id}")]
    DuplicateAgentId {
        /// The repeated id.
        agent_id: u32,
    },

    /// The per-role arrays of a configuration have different lengths.
    #[error("agent parameter arrays differ in length: {agent_ids} ids, {num_instances} instance counts, {bonds} bonds")]
    WrongArrayLength {
        /// Number of agent ids supplied.
        agent_ids: usize,
        /// Number of instance counts supplied.
        num_instances: usize,
        /// Number of bonds supplied.
        bonds: usize,
    },

    /// A configuration must define at least one role.
    #[error("service must define at least one agent role")]
    NoAgents,

    /// A role was configured with zero instances or a zero bond.
    #[error("agent {agent_id} must have positive instance count and bond (got {num_instances} instances, bond {bond})")]
    EmptyAgentParams {
        /// The offending role.
        agent_id: u32,
        /// Configured instance count.
        num_instances: u32,
        /// Configured bond.
        bond: u128,
    },

    /// Instance counts across roles do not fit in a `u32`.
    #[error("total agent instances exceed {max}")]
    TooManyInstances {
        /// Largest representable total.
        max: u32,
    },

    /// Token metadata must describe exactly one copy.
    #[error("token metadata must have copies == 1, got {copies:?}")]
    InvalidCopies {
        /// The supplied value.
        copies: Option<u64>,
    },

    /// Registry metadata is incomplete.
    #[error("registry metadata field {field} must not be empty")]
    EmptyMetadataField {
        /// Which field was empty.
        field: &'static str,
    },
}
