//! # Service Record
//!
//! The canonical per-service record: owner, currency, configuration history,
//! role slots and operator bonds, lifecycle state and multisig address.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use svcreg_core::{
    quorum_floor, total_instances, AccountId, AgentParams, Balance, ConfigHash, Currency, ServiceId,
};
use svcreg_ledger::BondBook;
use svcreg_state::{next_state, ConfigHistory, Operation, ServiceState, TransitionRecord};

use crate::error::RegistryError;

/// Parameters shared by `create` and `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Configuration fingerprint.
    pub config_hash: ConfigHash,
    /// Role ids.
    pub agent_ids: Vec<u32>,
    /// Instances per role.
    pub agent_num_instances: Vec<u32>,
    /// Bond per instance, per role.
    pub agent_bonds: Vec<Balance>,
    /// Multisig confirmation threshold.
    pub threshold: u32,
}

impl ServiceConfig {
    /// Zip and validate the role arrays.
    pub fn agent_params(&self) -> Result<Vec<AgentParams>, RegistryError> {
        Ok(AgentParams::parse(
            &self.agent_ids,
            &self.agent_num_instances,
            &self.agent_bonds,
        )?)
    }
}

/// `ceil((2n + 1) / 3) <= threshold <= n` for the active roles in `params`.
pub(crate) fn check_threshold(params: &[AgentParams], threshold: u32) -> Result<(), RegistryError> {
    let active: Vec<AgentParams> = params.iter().filter(|p| !p.is_removal()).copied().collect();
    let max_instances = total_instances(&active)?;
    if threshold > max_instances {
        return Err(RegistryError::ThresholdExceedsInstances {
            threshold,
            max_instances,
        });
    }
    let minimum = quorum_floor(max_instances);
    if threshold < minimum {
        return Err(RegistryError::ThresholdBelowQuorum { threshold, minimum });
    }
    Ok(())
}

/// Transition records kept per service.
pub const TRANSITION_LOG_CAPACITY: usize = 32;

/// One registered service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service and token id.
    pub id: ServiceId,
    /// Token owner; controls the service.
    pub owner: AccountId,
    /// Settlement currency, fixed at creation.
    pub currency: Currency,
    /// Current and superseded configuration hashes.
    pub config: ConfigHistory,
    /// Multisig confirmation threshold.
    pub threshold: u32,
    /// Activation stake: the largest per-instance bond.
    pub security_deposit: Balance,
    /// Stake paid at activation and not yet returned.
    pub stake_held: Balance,
    /// Lifecycle state.
    pub state: ServiceState,
    /// Multisig wallet, once deployed.
    pub multisig: Option<AccountId>,
    /// Role slots and operator bonds.
    pub bonds: BondBook,
    /// Only whitelisted operators may register when set.
    pub operators_check: bool,
    /// Operators allowed to register when `operators_check` is set.
    pub whitelisted_operators: BTreeSet<AccountId>,
    /// Most recent committed state transitions, oldest first.
    pub transition_log: Vec<TransitionRecord>,
}

impl Service {
    pub(crate) fn require_owner(&self, caller: &AccountId) -> Result<(), RegistryError> {
        if &self.owner != caller {
            return Err(RegistryError::Unauthorized {
                caller: caller.clone(),
                required: "service owner",
            });
        }
        Ok(())
    }

    /// Fail with `InvalidState` unless `operation` is legal now. The guard
    /// facts carried by `operation` do not affect legality.
    pub(crate) fn precheck(&self, operation: Operation) -> Result<(), RegistryError> {
        next_state(self.state, operation)
            .map(|_| ())
            .map_err(|_| self.invalid_state(operation))
    }

    /// Apply `operation` and log the transition.
    pub(crate) fn transition(&mut self, operation: Operation) -> Result<ServiceState, RegistryError> {
        let to = next_state(self.state, operation).map_err(|_| self.invalid_state(operation))?;
        self.transition_log
            .push(TransitionRecord::now(self.state, to, operation));
        let excess = self.transition_log.len().saturating_sub(TRANSITION_LOG_CAPACITY);
        self.transition_log.drain(..excess);
        tracing::debug!(
            service_id = %self.id,
            from = %self.state,
            to = %to,
            operation = operation.name(),
            "service transition"
        );
        self.state = to;
        Ok(to)
    }

    fn invalid_state(&self, operation: Operation) -> RegistryError {
        RegistryError::InvalidState {
            service_id: self.id,
            operation: operation.name(),
            state: self.state,
        }
    }

    /// Current configuration hash.
    pub fn config_hash(&self) -> ConfigHash {
        self.config.current()
    }
}
