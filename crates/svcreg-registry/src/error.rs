//! # Registry Errors
//!
//! One flat taxonomy for every public registry call. Any error aborts the
//! call and leaves the registry exactly as it was, with one exception:
//! [`RegistryError::TokenTransferFailed`] is reported after the compensating
//! credit for a failed token transfer has been committed.

use thiserror::Error;

use svcreg_core::{AccountId, AgentId, Balance, Currency, ServiceId, ValidationError};
use svcreg_ledger::{LedgerError, TransferId};
use svcreg_state::ServiceState;

use crate::deployment::DeploymentError;

/// Errors returned by [`crate::ServiceRegistry`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The operation is not allowed in the service's current state.
    #[error("service {service_id}: {operation} is not permitted in state {state}")]
    InvalidState {
        /// Service addressed.
        service_id: ServiceId,
        /// Operation attempted.
        operation: &'static str,
        /// State the service was in.
        state: ServiceState,
    },

    /// The caller lacks the required role.
    #[error("{caller} is not the {required}")]
    Unauthorized {
        /// The caller.
        caller: AccountId,
        /// Role the operation requires.
        required: &'static str,
    },

    /// No service with this id.
    #[error("service {service_id} not found")]
    UnknownService {
        /// Requested id.
        service_id: ServiceId,
    },

    /// The caller holds no bond in the service.
    #[error("operator {operator} holds no bond in this service")]
    UnknownOperator {
        /// The caller.
        operator: AccountId,
    },

    /// The role is not configured for the service.
    #[error("agent {agent_id} is not configured")]
    UnknownAgent {
        /// Requested role.
        agent_id: AgentId,
    },

    /// The instance is not registered in the service.
    #[error("agent instance {instance} is not registered")]
    UnknownInstance {
        /// The instance.
        instance: AccountId,
    },

    /// No free slot remains for the role.
    #[error("no free slot for agent {agent_id} (capacity {capacity})")]
    SlotsExhausted {
        /// Requested role.
        agent_id: AgentId,
        /// Configured instance count.
        capacity: u32,
    },

    /// The instance is already registered, here or in another service.
    #[error("agent instance {instance} is already registered")]
    DuplicateInstance {
        /// The instance.
        instance: AccountId,
    },

    /// An operator may not register itself as an instance.
    #[error("operator {operator} cannot be its own agent instance")]
    OperatorIsInstance {
        /// The operator.
        operator: AccountId,
    },

    /// Payment differs from the required amount.
    #[error("deposit mismatch: expected {expected}, attached {attached}")]
    DepositMismatch {
        /// Required amount.
        expected: Balance,
        /// Supplied amount.
        attached: Balance,
    },

    /// Threshold exceeds the number of instances.
    #[error("threshold {threshold} exceeds {max_instances} agent instances")]
    ThresholdExceedsInstances {
        /// Requested threshold.
        threshold: u32,
        /// Sum of instance counts.
        max_instances: u32,
    },

    /// Threshold is below two thirds of the instances.
    #[error("threshold {threshold} is below the minimum {minimum}")]
    ThresholdBelowQuorum {
        /// Requested threshold.
        threshold: u32,
        /// `ceil((2n + 1) / 3)`.
        minimum: u32,
    },

    /// Configuration cannot change while bonds are held.
    #[error("{total_bonded} still bonded by {operators} operator(s)")]
    BondsStillOutstanding {
        /// Aggregate bond.
        total_bonded: Balance,
        /// Bonded operators.
        operators: usize,
    },

    /// Update omitted a configured role.
    #[error("update omits configured agent {agent_id}")]
    IncompleteAgentUpdate {
        /// Omitted role.
        agent_id: AgentId,
    },

    /// Deposited tokens do not cover the requirement.
    #[error("insufficient token deposit: required {required}, available {available}")]
    InsufficientDeposit {
        /// Required amount.
        required: Balance,
        /// Available deposit.
        available: Balance,
    },

    /// The account has not registered storage for the token.
    #[error("account {account} is not registered for token {token}")]
    AccountNotRegistered {
        /// Token contract.
        token: AccountId,
        /// The account.
        account: AccountId,
    },

    /// Storage cannot be released while tokens remain.
    #[error("account {account} still holds {balance} of token {token}")]
    BalanceNotEmpty {
        /// Token contract.
        token: AccountId,
        /// The account.
        account: AccountId,
        /// Remaining balance.
        balance: Balance,
    },

    /// Nothing to pay out.
    #[error("zero {currency} balance to pay out")]
    NothingToPayOut {
        /// Currency requested.
        currency: Currency,
    },

    /// The registry does not hold enough to pay.
    #[error("registry holds {available} {currency}, cannot pay {required}")]
    InsufficientHoldings {
        /// Currency.
        currency: Currency,
        /// Requested.
        required: Balance,
        /// Held.
        available: Balance,
    },

    /// No pending transfer with this id.
    #[error("unknown or already resolved transfer {id}")]
    UnknownTransfer {
        /// The id.
        id: TransferId,
    },

    /// The token contract rejected an outbound transfer. The amount has been
    /// re-credited.
    #[error("token transfer {id} of {amount} {token} to {receiver} failed; amount re-credited")]
    TokenTransferFailed {
        /// Transfer id.
        id: TransferId,
        /// Token contract.
        token: AccountId,
        /// Intended recipient.
        receiver: AccountId,
        /// Amount re-credited.
        amount: Balance,
    },

    /// Operator is not on the service's whitelist.
    #[error("operator {operator} is not whitelisted for service {service_id}")]
    OperatorNotWhitelisted {
        /// Service addressed.
        service_id: ServiceId,
        /// The caller.
        operator: AccountId,
    },

    /// Multisig name is neither a bare name nor a factory sub-account.
    #[error("multisig name {name} must be a bare name or a sub-account of {factory}")]
    InvalidMultisigName {
        /// Supplied name.
        name: AccountId,
        /// Configured factory.
        factory: AccountId,
    },

    /// Existing multisig members differ from the registered instances.
    #[error("multisig {multisig} members do not match the registered agent instances")]
    MultisigMismatch {
        /// The wallet.
        multisig: AccountId,
    },

    /// The multisig factory failed.
    #[error("deployment failed: {0}")]
    DeploymentFailed(#[from] DeploymentError),

    /// Every service id has been issued.
    #[error("service ids exhausted after {last_id}")]
    ServiceIdsExhausted {
        /// The last id issued.
        last_id: u32,
    },

    /// The registry is paused.
    #[error("registry is paused")]
    Paused,

    /// Parallel arrays of a call have different lengths.
    #[error("{what}: {left} vs {right} entries")]
    ArrayLengthMismatch {
        /// Which arrays.
        what: &'static str,
        /// Length of the first.
        left: usize,
        /// Length of the second.
        right: usize,
    },

    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Registry state could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Arithmetic overflow on a balance.
    #[error("balance overflow")]
    Overflow,
}

impl From<LedgerError> for RegistryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownAgent { agent_id } => Self::UnknownAgent { agent_id },
            LedgerError::SlotsExhausted { agent_id, capacity } => {
                Self::SlotsExhausted { agent_id, capacity }
            }
            LedgerError::DuplicateInstance { instance } => Self::DuplicateInstance { instance },
            LedgerError::DepositMismatch { expected, attached } => {
                Self::DepositMismatch { expected, attached }
            }
            LedgerError::UnknownInstance { instance } => Self::UnknownInstance { instance },
            LedgerError::BondsStillOutstanding {
                total_bonded,
                operators,
            } => Self::BondsStillOutstanding {
                total_bonded,
                operators,
            },
            LedgerError::IncompleteAgentUpdate { agent_id } => {
                Self::IncompleteAgentUpdate { agent_id }
            }
            LedgerError::InsufficientDeposit {
                required,
                available,
            } => Self::InsufficientDeposit {
                required,
                available,
            },
            LedgerError::AccountNotRegistered { token, account } => {
                Self::AccountNotRegistered { token, account }
            }
            LedgerError::BalanceNotEmpty {
                token,
                account,
                balance,
            } => Self::BalanceNotEmpty {
                token,
                account,
                balance,
            },
            LedgerError::NothingToPayOut { currency } => Self::NothingToPayOut { currency },
            LedgerError::UnknownTransfer { id } => Self::UnknownTransfer { id },
            LedgerError::InsufficientHoldings {
                currency,
                required,
                available,
            } => Self::InsufficientHoldings {
                currency,
                required,
                available,
            },
            LedgerError::UnknownOperator { operator } => Self::UnknownOperator { operator },
            LedgerError::Overflow => Self::Overflow,
            LedgerError::Validation(e) => Self::Validation(e),
        }
    }
}
