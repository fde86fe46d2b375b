//! # Registry Events
//!
//! Every committed mutation produces one or more [`RegistryEvent`]s. They are
//! emitted through `tracing` when the call commits and buffered in memory
//! until taken; they are never persisted with the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use svcreg_core::{AccountId, AgentId, Balance, ConfigHash, Currency, ServiceId};
use svcreg_ledger::{TransferId, TransferOutcome};

/// Something that happened in the registry.
///
/// Externally tagged: amounts are `u128` and must not pass through serde's
/// buffered content representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A service was created and its token minted.
    CreateService {
        /// New service.
        service_id: ServiceId,
        /// Initial configuration hash.
        config_hash: ConfigHash,
    },
    /// A service configuration was replaced.
    UpdateService {
        /// Service.
        service_id: ServiceId,
        /// New configuration hash.
        config_hash: ConfigHash,
    },
    /// Registration opened and the activation stake was paid.
    ActivateRegistration {
        /// Service.
        service_id: ServiceId,
        /// Stake collected.
        stake: Balance,
    },
    /// An agent instance was registered.
    RegisterInstance {
        /// Operator that bonded it.
        operator: AccountId,
        /// Service.
        service_id: ServiceId,
        /// Instance account.
        instance: AccountId,
        /// Role.
        agent_id: AgentId,
    },
    /// Bond payment accepted from an operator.
    Deposit {
        /// Payer.
        sender: AccountId,
        /// Amount.
        amount: Balance,
    },
    /// Tokens credited from a transfer notification.
    TokenDeposit {
        /// Token contract.
        token: AccountId,
        /// Sender.
        sender: AccountId,
        /// Amount.
        amount: Balance,
        /// Earmarked service, if any.
        service_id: Option<ServiceId>,
    },
    /// The service multisig is in place.
    DeployService {
        /// Service.
        service_id: ServiceId,
        /// Wallet address.
        multisig: AccountId,
        /// Whether an existing wallet was re-attached.
        reused: bool,
    },
    /// The owner terminated the service.
    TerminateService {
        /// Service.
        service_id: ServiceId,
    },
    /// Value returned to an account.
    Refund {
        /// Recipient.
        receiver: AccountId,
        /// Amount.
        amount: Balance,
    },
    /// An operator left a terminated service.
    OperatorUnbond {
        /// Operator.
        operator: AccountId,
        /// Service.
        service_id: ServiceId,
    },
    /// Bond slashed by the service multisig.
    OperatorSlashed {
        /// Amount actually slashed.
        amount: Balance,
        /// Operator.
        operator: AccountId,
        /// Service.
        service_id: ServiceId,
    },
    /// Slashed funds sent to the registry owner.
    Drain {
        /// Recipient.
        receiver: AccountId,
        /// Currency drained.
        currency: Currency,
        /// Amount.
        amount: Balance,
    },
    /// Token deposit balance withdrawn.
    Withdraw {
        /// Account.
        account: AccountId,
        /// Token contract.
        token: AccountId,
        /// Amount.
        amount: Balance,
    },
    /// A pending token transfer was resolved.
    TransferResolved {
        /// Transfer.
        id: TransferId,
        /// Outcome.
        outcome: TransferOutcome,
    },
    /// Registry ownership changed.
    OwnerUpdated {
        /// New owner.
        owner: AccountId,
    },
    /// Registry paused or unpaused.
    PausedUpdated {
        /// New flag.
        paused: bool,
    },
    /// Operator whitelist enforcement toggled.
    OperatorsCheckUpdated {
        /// Service.
        service_id: ServiceId,
        /// New flag.
        enabled: bool,
    },
    /// Operator whitelist entries changed.
    OperatorsWhitelistUpdated {
        /// Service.
        service_id: ServiceId,
        /// Operators and their new status.
        statuses: Vec<(AccountId, bool)>,
    },
}

impl RegistryEvent {
    /// Event name as it appears in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateService { .. } => "CreateService",
            Self::UpdateService { .. } => "UpdateService",
            Self::ActivateRegistration { .. } => "ActivateRegistration",
            Self::RegisterInstance { .. } => "RegisterInstance",
            Self::Deposit { .. } => "Deposit",
            Self::TokenDeposit { .. } => "TokenDeposit",
            Self::DeployService { .. } => "DeployService",
            Self::TerminateService { .. } => "TerminateService",
            Self::Refund { .. } => "Refund",
            Self::OperatorUnbond { .. } => "OperatorUnbond",
            Self::OperatorSlashed { .. } => "OperatorSlashed",
            Self::Drain { .. } => "Drain",
            Self::Withdraw { .. } => "Withdraw",
            Self::TransferResolved { .. } => "TransferResolved",
            Self::OwnerUpdated { .. } => "OwnerUpdated",
            Self::PausedUpdated { .. } => "PausedUpdated",
            Self::OperatorsCheckUpdated { .. } => "OperatorsCheckUpdated",
            Self::OperatorsWhitelistUpdated { .. } => "OperatorsWhitelistUpdated",
        }
    }
}

/// A logged event with its commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// The event.
    pub event: RegistryEvent,
}

impl EventRecord {
    /// Stamp `event` with the current time.
    pub fn new(event: RegistryEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }

    /// Emit the event as a structured log line.
    pub fn trace(&self) {
        match serde_json::to_string(&self.event) {
            Ok(payload) => tracing::info!(event = self.event.name(), %payload, "registry event"),
            Err(_) => tracing::info!(event = self.event.name(), "registry event"),
        }
    }
}
