//! # Bond Book
//!
//! Per-service bookkeeping of role capacity and operator bonds.
//!
//! ## Invariants
//!
//! - The sum of all operator balances equals [`BondBook::aggregate`].
//! - A role never holds more instances than its configured count.
//! - An instance appears at most once in the book.
//!
//! Every mutation checks all of its preconditions before touching state, so
//! a failed call leaves the book unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use svcreg_core::{security_deposit, total_instances, AccountId, AgentId, AgentParams, Balance};

use crate::error::LedgerError;

// ── Records ────────────────────────────────────────────────────────────

/// Capacity and registrations of one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSlot {
    /// Number of instances the role needs.
    pub required: u32,
    /// Bond per instance.
    pub bond: Balance,
    /// Registered instances, in registration order.
    pub instances: Vec<AccountId>,
}

impl AgentSlot {
    fn open_slots(&self) -> u32 {
        let taken = u32::try_from(self.instances.len()).unwrap_or(u32::MAX);
        self.required.saturating_sub(taken)
    }
}

/// Bond held by one operator in one service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorBond {
    /// Currently bonded amount.
    pub balance: Balance,
    /// Instances the operator registered, with their role.
    pub instances: BTreeMap<AccountId, AgentId>,
}

/// An instance together with its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInstance {
    /// Instance account.
    pub instance: AccountId,
    /// Role it fills.
    pub agent_id: AgentId,
}

/// Result of [`BondBook::debit_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unbonded {
    /// Amount released to the operator.
    pub amount: Balance,
    /// Instances the operator no longer holds.
    pub instances: Vec<AccountId>,
}

// ── Bond Book ──────────────────────────────────────────────────────────

/// Role slots and operator bonds of a single service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondBook {
    slots: BTreeMap<AgentId, AgentSlot>,
    operators: BTreeMap<AccountId, OperatorBond>,
    total_bonded: Balance,
}

impl BondBook {
    /// Book for a freshly created service. Every entry must be positive.
    pub fn new(params: &[AgentParams]) -> Result<Self, LedgerError> {
        let mut slots = BTreeMap::new();
        for p in params {
            p.require_positive()?;
            slots.insert(
                p.agent_id,
                AgentSlot {
                    required: p.num_instances,
                    bond: p.bond,
                    instances: Vec::new(),
                },
            );
        }
        Ok(Self {
            slots,
            operators: BTreeMap::new(),
            total_bonded: 0,
        })
    }

    /// Replace the role configuration.
    ///
    /// `params` must mention every currently configured role. Entries with a
    /// zero count or zero bond remove that role; the rest insert or replace.
    /// Rejected while any operator is bonded.
    pub fn reconfigure(&mut self, params: &[AgentParams]) -> Result<(), LedgerError> {
        self.ensure_unbonded()?;
        if let Some(missing) = self
            .slots
            .keys()
            .find(|id| !params.iter().any(|p| p.agent_id == **id))
        {
            return Err(LedgerError::IncompleteAgentUpdate { agent_id: *missing });
        }

        let mut slots = BTreeMap::new();
        for p in params.iter().filter(|p| !p.is_removal()) {
            slots.insert(
                p.agent_id,
                AgentSlot {
                    required: p.num_instances,
                    bond: p.bond,
                    instances: Vec::new(),
                },
            );
        }
        if slots.is_empty() {
            return Err(svcreg_core::ValidationError::NoAgents.into());
        }
        self.slots = slots;
        Ok(())
    }

    /// Fails with `BondsStillOutstanding` unless no operator is bonded.
    pub fn ensure_unbonded(&self) -> Result<(), LedgerError> {
        if self.total_bonded > 0 || !self.operators.is_empty() {
            return Err(LedgerError::BondsStillOutstanding {
                total_bonded: self.total_bonded,
                operators: self.operators.len(),
            });
        }
        Ok(())
    }

    /// Sum of per-instance bonds for a batch of registrations.
    pub fn required_bond(&self, agent_ids: &[AgentId]) -> Result<Balance, LedgerError> {
        agent_ids.iter().try_fold(0u128, |acc, id| {
            let slot = self
                .slots
                .get(id)
                .ok_or(LedgerError::UnknownAgent { agent_id: *id })?;
            acc.checked_add(slot.bond).ok_or(LedgerError::Overflow)
        })
    }

    /// Check that `instance` could be registered for `agent_id` now.
    pub fn check_credit(&self, agent_id: AgentId, instance: &AccountId) -> Result<(), LedgerError> {
        let slot = self
            .slots
            .get(&agent_id)
            .ok_or(LedgerError::UnknownAgent { agent_id })?;
        if slot.open_slots() == 0 {
            return Err(LedgerError::SlotsExhausted {
                agent_id,
                capacity: slot.required,
            });
        }
        if self.holds_instance(instance) {
            return Err(LedgerError::DuplicateInstance {
                instance: instance.clone(),
            });
        }
        Ok(())
    }

    /// Record one instance registration and its bond.
    pub fn credit(
        &mut self,
        operator: &AccountId,
        agent_id: AgentId,
        instance: &AccountId,
        amount: Balance,
    ) -> Result<(), LedgerError> {
        self.check_credit(agent_id, instance)?;
        let bond = self.slots.get(&agent_id).map(|s| s.bond).unwrap_or_default();
        if amount != bond {
            return Err(LedgerError::DepositMismatch {
                expected: bond,
                attached: amount,
            });
        }
        let total_bonded = self
            .total_bonded
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        if let Some(slot) = self.slots.get_mut(&agent_id) {
            slot.instances.push(instance.clone());
        }
        let entry = self.operators.entry(operator.clone()).or_default();
        entry.balance = entry.balance.saturating_add(amount);
        entry.instances.insert(instance.clone(), agent_id);
        self.total_bonded = total_bonded;
        Ok(())
    }

    /// Remove the operator and return everything it had bonded.
    pub fn debit_all(&mut self, operator: &AccountId) -> Result<Unbonded, LedgerError> {
        let bond = self
            .operators
            .remove(operator)
            .ok_or_else(|| LedgerError::UnknownOperator {
                operator: operator.clone(),
            })?;
        for slot in self.slots.values_mut() {
            slot.instances.retain(|i| !bond.instances.contains_key(i));
        }
        self.total_bonded = self.total_bonded.saturating_sub(bond.balance);
        Ok(Unbonded {
            amount: bond.balance,
            instances: bond.instances.into_keys().collect(),
        })
    }

    /// Reduce the bond behind `instance` by up to `amount`.
    ///
    /// Returns the owning operator and the amount actually slashed, which is
    /// capped at the operator's balance.
    pub fn slash(
        &mut self,
        instance: &AccountId,
        amount: Balance,
    ) -> Result<(AccountId, Balance), LedgerError> {
        let (operator, bond) = self
            .operators
            .iter_mut()
            .find(|(_, b)| b.instances.contains_key(instance))
            .ok_or_else(|| LedgerError::UnknownInstance {
                instance: instance.clone(),
            })?;
        let slashed = amount.min(bond.balance);
        bond.balance -= slashed;
        self.total_bonded = self.total_bonded.saturating_sub(slashed);
        Ok((operator.clone(), slashed))
    }

    /// Empty every role's instance list; operator bonds stay until unbond.
    pub fn release_slots(&mut self) {
        for slot in self.slots.values_mut() {
            slot.instances.clear();
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Aggregate bonded balance.
    pub fn aggregate(&self) -> Balance {
        self.total_bonded
    }

    /// Whether any operator is still bonded.
    pub fn has_operators(&self) -> bool {
        !self.operators.is_empty()
    }

    /// Every role has all its instances.
    pub fn all_slots_filled(&self) -> bool {
        self.slots.values().all(|s| s.open_slots() == 0)
    }

    /// Configured role ids in ascending order.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.slots.keys().copied().collect()
    }

    /// Slot record of one role.
    pub fn slot(&self, agent_id: AgentId) -> Option<&AgentSlot> {
        self.slots.get(&agent_id)
    }

    /// Instance counts, ordered like [`Self::agent_ids`].
    pub fn num_instances(&self) -> Vec<u32> {
        self.slots.values().map(|s| s.required).collect()
    }

    /// Per-instance bonds, ordered like [`Self::agent_ids`].
    pub fn bonds(&self) -> Vec<Balance> {
        self.slots.values().map(|s| s.bond).collect()
    }

    /// Role configuration as [`AgentParams`].
    pub fn params(&self) -> Vec<AgentParams> {
        self.slots
            .iter()
            .map(|(id, s)| AgentParams {
                agent_id: *id,
                num_instances: s.required,
                bond: s.bond,
            })
            .collect()
    }

    /// Sum of configured instance counts.
    pub fn max_instances(&self) -> Result<u32, LedgerError> {
        Ok(total_instances(&self.params())?)
    }

    /// Activation stake: the largest per-instance bond.
    pub fn security_deposit(&self) -> Balance {
        security_deposit(&self.params())
    }

    /// Registered instances, by role then registration order.
    pub fn instances(&self) -> Vec<AgentInstance> {
        self.slots
            .iter()
            .flat_map(|(id, s)| {
                s.instances.iter().map(move |i| AgentInstance {
                    instance: i.clone(),
                    agent_id: *id,
                })
            })
            .collect()
    }

    /// Number of registered instances.
    pub fn registered_instances(&self) -> usize {
        self.slots.values().map(|s| s.instances.len()).sum()
    }

    /// Bond record of one operator.
    pub fn operator(&self, operator: &AccountId) -> Option<&OperatorBond> {
        self.operators.get(operator)
    }

    /// Bonded operators in account order.
    pub fn operators(&self) -> impl Iterator<Item = (&AccountId, &OperatorBond)> {
        self.operators.iter()
    }

    /// Whether some operator holds `instance`.
    pub fn holds_instance(&self, instance: &AccountId) -> bool {
        self.operators
            .values()
            .any(|b| b.instances.contains_key(instance))
    }

    /// `sum(operator balances) == aggregate()`.
    pub fn is_consistent(&self) -> bool {
        self.operators.values().map(|b| b.balance).sum::<Balance>() == self.total_bonded
    }
}
