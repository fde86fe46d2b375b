//! # Agent Roles
//!
//! A service is configured as parallel arrays of role ids, per-role instance
//! counts and per-instance bonds. [`AgentParams::parse`] zips and validates
//! them into typed entries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::currency::Balance;
use crate::error::ValidationError;
use crate::identity::AgentId;

/// Requirements for one agent role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentParams {
    /// Role identifier.
    pub agent_id: AgentId,
    /// Number of operator-provided instances the role needs.
    pub num_instances: u32,
    /// Bond posted per instance.
    pub bond: Balance,
}

impl AgentParams {
    /// Zip the three parallel arrays into role entries.
    ///
    /// Rejects empty or mismatched arrays and zero or repeated role ids. Zero
    /// instance counts and zero bonds pass through; see [`Self::is_removal`].
    pub fn parse(
        agent_ids: &[u32],
        num_instances: &[u32],
        bonds: &[Balance],
    ) -> Result<Vec<AgentParams>, ValidationError> {
        if agent_ids.len() != num_instances.len() || agent_ids.len() != bonds.len() {
            return Err(ValidationError::WrongArrayLength {
                agent_ids: agent_ids.len(),
                num_instances: num_instances.len(),
                bonds: bonds.len(),
            });
        }
        if agent_ids.is_empty() {
            return Err(ValidationError::NoAgents);
        }

        let mut seen = BTreeSet::new();
        let mut params = Vec::with_capacity(agent_ids.len());
        for ((&id, &num), &bond) in agent_ids.iter().zip(num_instances).zip(bonds) {
            let agent_id = AgentId::new(id)?;
            if !seen.insert(agent_id) {
                return Err(ValidationError::DuplicateAgentId { agent_id: id });
            }
            params.push(AgentParams {
                agent_id,
                num_instances: num,
                bond,
            });
        }
        Ok(params)
    }

    /// An entry with no instances or no bond removes the role on update.
    pub fn is_removal(&self) -> bool {
        self.num_instances == 0 || self.bond == 0
    }

    /// Reject removal entries; used when a service is first created.
    pub fn require_positive(&self) -> Result<(), ValidationError> {
        if self.is_removal() {
            return Err(ValidationError::EmptyAgentParams {
                agent_id: self.agent_id.as_u32(),
                num_instances: self.num_instances,
                bond: self.bond,
            });
        }
        Ok(())
    }
}

/// Sum of instance counts across roles.
pub fn total_instances(params: &[AgentParams]) -> Result<u32, ValidationError> {
    params.iter().try_fold(0u32, |acc, p| {
        acc.checked_add(p.num_instances)
            .ok_or(ValidationError::TooManyInstances { max: u32::MAX })
    })
}

/// The activation stake: the largest per-instance bond among the roles.
pub fn security_deposit(params: &[AgentParams]) -> Balance {
    params.iter().map(|p| p.bond).max().unwrap_or(0)
}

/// Smallest acceptable signer threshold for `total` instances:
/// `ceil((2 * total + 1) / 3)`.
pub fn quorum_floor(total: u32) -> u32 {
    (total.saturating_mul(2).saturating_add(1)).div_ceil(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_zips_arrays() {
        let params = AgentParams::parse(&[1, 2], &[2, 1], &[100, 50]).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].agent_id.as_u32(), 1);
        assert_eq!(params[1].bond, 50);
        assert_eq!(total_instances(&params), Ok(3));
        assert_eq!(security_deposit(&params), 100);
    }

    #[test]
    fn parse_rejects_bad_arrays() {
        assert!(matches!(
            AgentParams::parse(&[1, 2], &[1], &[1, 1]),
            Err(ValidationError::WrongArrayLength { .. })
        ));
        assert_eq!(AgentParams::parse(&[], &[], &[]), Err(ValidationError::NoAgents));
        assert_eq!(
            AgentParams::parse(&[0], &[1], &[1]),
            Err(ValidationError::ZeroAgentId)
        );
        assert_eq!(
            AgentParams::parse(&[3, 3], &[1, 1], &[1, 1]),
            Err(ValidationError::DuplicateAgentId { agent_id: 3 })
        );
    }

    #[test]
    fn removal_entries() {
        let params = AgentParams::parse(&[1, 2], &[0, 1], &[0, 1]).unwrap();
        assert!(params[0].is_removal());
        assert!(params[0].require_positive().is_err());
        assert!(params[1].require_positive().is_ok());

        let either = AgentParams::parse(&[1, 2], &[0, 3], &[7, 0]).unwrap();
        assert!(either.iter().all(AgentParams::is_removal));
    }

    #[test]
    fn total_instances_rejects_overflow() {
        let params = AgentParams::parse(&[1, 2], &[u32::MAX, 2], &[10, 10]).unwrap();
        assert_eq!(
            total_instances(&params),
            Err(ValidationError::TooManyInstances { max: u32::MAX })
        );
        let params = AgentParams::parse(&[1, 2], &[u32::MAX - 1, 1], &[10, 10]).unwrap();
        assert_eq!(total_instances(&params), Ok(u32::MAX));
    }

    #[test]
    fn quorum_floor_matches_two_thirds_rule() {
        assert_eq!(quorum_floor(1), 1);
        assert_eq!(quorum_floor(2), 2);
        assert_eq!(quorum_floor(3), 3);
        assert_eq!(quorum_floor(4), 3);
        assert_eq!(quorum_floor(6), 5);
        assert_eq!(quorum_floor(7), 5);
    }
}
