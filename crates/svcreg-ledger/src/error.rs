//! Error types for bond bookkeeping and token settlement.

use thiserror::Error;

use svcreg_core::{AccountId, AgentId, Balance, Currency, ValidationError};

use crate::gateway::TransferId;

/// Errors from [`crate::BondBook`] and [`crate::TokenGateway`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The role is not configured for this service.
    #[error("agent {agent_id} is not configured for this service")]
    UnknownAgent {
        /// Requested role.
        agent_id: AgentId,
    },

    /// Every slot of the role is taken.
    #[error("no free slot for agent {agent_id} (capacity {capacity})")]
    SlotsExhausted {
        /// Requested role.
        agent_id: AgentId,
        /// Configured instance count.
        capacity: u32,
    },

    /// The instance is already registered.
    #[error("agent instance {instance} is already registered")]
    DuplicateInstance {
        /// The repeated instance.
        instance: AccountId,
    },

    /// Paid amount differs from the required amount.
    #[error("deposit mismatch: expected {expected}, attached {attached}")]
    DepositMismatch {
        /// Amount the operation requires.
        expected: Balance,
        /// Amount supplied.
        attached: Balance,
    },

    /// The account holds no bond in this service.
    #[error("operator {operator} holds no bond in this service")]
    UnknownOperator {
        /// The caller.
        operator: AccountId,
    },

    /// The instance is not registered in this service.
    #[error("agent instance {instance} is not registered in this service")]
    UnknownInstance {
        /// The instance.
        instance: AccountId,
    },

    /// Configuration cannot change while operators hold bonds.
    #[error("{operators} operator(s) still hold {total_bonded} in bonds")]
    BondsStillOutstanding {
        /// Aggregate bonded amount.
        total_bonded: Balance,
        /// Number of bonded operators.
        operators: usize,
    },

    /// An update must list every currently configured role.
    #[error("update omits configured agent {agent_id}")]
    IncompleteAgentUpdate {
        /// The omitted role.
        agent_id: AgentId,
    },

    /// Deposited token balance does not cover the requirement.
    #[error("insufficient token deposit: required {required}, available {available}")]
    InsufficientDeposit {
        /// Amount required.
        required: Balance,
        /// Amount deposited and unspent.
        available: Balance,
    },

    /// The account has not opted in to the token.
    #[error("account {account} is not registered for token {token}")]
    AccountNotRegistered {
        /// Token contract.
        token: AccountId,
        /// The account.
        account: AccountId,
    },

    /// Storage can only be released with a zero balance.
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

    /// No pending transfer with this id.
    #[error("unknown or already resolved transfer {id}")]
    UnknownTransfer {
        /// The id supplied.
        id: TransferId,
    },

    /// Registry holdings would go negative.
    #[error("registry holds {available} {currency}, cannot pay {required}")]
    InsufficientHoldings {
        /// Currency of the payout.
        currency: Currency,
        /// Amount requested.
        required: Balance,
        /// Amount held.
        available: Balance,
    },

    /// Arithmetic overflow on a balance.
    #[error("balance overflow")]
    Overflow,

    /// Invalid role configuration.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
