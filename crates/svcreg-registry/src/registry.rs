//! # Service Registry
//!
//! [`ServiceRegistry`] composes the service store, the per-service bond books
//! and the token gateway behind the lifecycle operations.
//!
//! ## Atomicity
//!
//! Every public mutating call runs through [`ServiceRegistry::atomically`]:
//! the registry is snapshotted before the call and restored if the call
//! returns an error, so a rejected call leaves no partial effects. The one
//! exception is a failed token transfer reported to `resolve_transfer`,
//! whose compensating credit is committed before the failure is returned.
//!
//! ## Events
//!
//! Events are not part of the persisted registry. Calls stage them while they
//! run; on commit they are traced and appended to a bounded in-memory buffer
//! that callers empty with [`ServiceRegistry::take_events`]. Events staged by
//! a rejected call are discarded with the rest of its effects.
//!
//! Settlement, administration and views live in sibling modules as further
//! `impl ServiceRegistry` blocks.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use svcreg_core::{security_deposit, AccountId, AgentId, Balance, Currency, RegistryMetadata, ServiceId, TokenMetadata};
use svcreg_ledger::{BondBook, Payout, TokenGateway};
use svcreg_state::{ConfigHistory, Operation, ServiceState};

use crate::context::CallContext;
use crate::deployment::{MultisigFactory, MultisigMember};
use crate::error::RegistryError;
use crate::events::{EventRecord, RegistryEvent};
use crate::service::{check_threshold, Service, ServiceConfig};
use crate::store::ServiceStore;

/// The service registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistry {
    /// The registry's own account; callbacks must come from it.
    pub(crate) account: AccountId,
    pub(crate) owner: AccountId,
    pub(crate) multisig_factory: AccountId,
    pub(crate) metadata: RegistryMetadata,
    pub(crate) store: ServiceStore,
    pub(crate) gateway: TokenGateway,
    /// Instance -> operator, across all services.
    pub(crate) instance_operators: BTreeMap<AccountId, AccountId>,
    pub(crate) paused: bool,
    /// Committed events not yet taken, oldest first.
    #[serde(skip)]
    pub(crate) events: VecDeque<EventRecord>,
}

/// Committed events kept in memory before the oldest are dropped.
pub const EVENT_BUFFER_CAPACITY: usize = 1024;

impl ServiceRegistry {
    /// Initialize an empty registry.
    pub fn new(
        account: AccountId,
        owner: AccountId,
        multisig_factory: AccountId,
        metadata: RegistryMetadata,
    ) -> Result<Self, RegistryError> {
        metadata.validate()?;
        tracing::info!(%account, %owner, %multisig_factory, "registry initialized");
        Ok(Self {
            account,
            owner,
            multisig_factory,
            metadata,
            store: ServiceStore::new(),
            gateway: TokenGateway::new(),
            instance_operators: BTreeMap::new(),
            paused: false,
            events: VecDeque::new(),
        })
    }

    /// Run `f` against the registry; restore the prior state if it fails.
    ///
    /// The committed event buffer is set aside for the duration of the call,
    /// so the snapshot holds only registry state and `f` stages its events
    /// into an empty buffer.
    pub(crate) fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let committed = std::mem::take(&mut self.events);
        let snapshot = self.clone();
        let result = f(self);
        if let Err(err) = &result {
            *self = snapshot;
            tracing::debug!(error = %err, "call rejected; state restored");
        }
        let staged = std::mem::replace(&mut self.events, committed);
        if result.is_ok() {
            for record in staged {
                record.trace();
                self.events.push_back(record);
            }
            let excess = self.events.len().saturating_sub(EVENT_BUFFER_CAPACITY);
            self.events.drain(..excess);
        }
        result
    }

    pub(crate) fn emit(&mut self, event: RegistryEvent) {
        self.events.push_back(EventRecord::new(event));
    }

    /// Remove and return the buffered events, oldest first.
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        self.events.drain(..).collect()
    }

    pub(crate) fn require_registry_owner(&self, caller: &AccountId) -> Result<(), RegistryError> {
        if &self.owner != caller {
            return Err(RegistryError::Unauthorized {
                caller: caller.clone(),
                required: "registry owner",
            });
        }
        Ok(())
    }

    pub(crate) fn require_unpaused(&self) -> Result<(), RegistryError> {
        if self.paused {
            return Err(RegistryError::Paused);
        }
        Ok(())
    }

    // ── create / update ────────────────────────────────────────────────

    /// Define a new service owned by `owner` and mint its token.
    ///
    /// Any account may create a service on behalf of `owner`. The new service
    /// starts in PreRegistration.
    pub fn create(
        &mut self,
        ctx: &CallContext,
        owner: AccountId,
        metadata: TokenMetadata,
        currency: Currency,
        config: ServiceConfig,
    ) -> Result<ServiceId, RegistryError> {
        self.atomically(|reg| {
            reg.require_unpaused()?;
            metadata.validate()?;
            let params = config.agent_params()?;
            let bonds = BondBook::new(&params)?;
            check_threshold(&params, config.threshold)?;

            let id = reg.store.next_id()?;
            if let Currency::Token(token) = &currency {
                reg.gateway.register(token, &owner);
            }
            let service = Service {
                id,
                owner: owner.clone(),
                currency,
                config: ConfigHistory::new(config.config_hash),
                threshold: config.threshold,
                security_deposit: security_deposit(&params),
                stake_held: 0,
                state: ServiceState::PreRegistration,
                multisig: None,
                bonds,
                operators_check: false,
                whitelisted_operators: BTreeSet::new(),
                transition_log: Vec::new(),
            };
            reg.store.insert(service, metadata)?;
            tracing::info!(service_id = %id, %owner, caller = %ctx.predecessor, "service created");
            reg.emit(RegistryEvent::CreateService {
                service_id: id,
                config_hash: config.config_hash,
            });
            Ok(id)
        })
    }

    /// Replace the configuration of an unbonded service in PreRegistration.
    ///
    /// The previous configuration hash is appended to the history on every
    /// call. Roles given zero instances or a zero bond are removed; every
    /// configured role must be mentioned.
    pub fn update(
        &mut self,
        ctx: &CallContext,
        service_id: ServiceId,
        config: ServiceConfig,
    ) -> Result<(), RegistryError> {
        self.atomically(|reg| {
            let service = reg.store.get_mut(service_id)?;
            service.require_owner(&ctx.predecessor)?;
            service.bonds.ensure_unbonded()?;
            service.precheck(Operation::Update)?;

            let params = config.agent_params()?;
            service.bonds.reconfigure(&params)?;
            check_threshold(&params, config.threshold)?;

            service.config.supersede(config.config_hash);
            service.threshold = config.threshold;
            service.security_deposit = service.bonds.security_deposit();
            service.transition(Operation::Update)?;

            tracing::info!(%service_id, config_hash = %config.config_hash, "service updated");
            reg.emit(RegistryEvent::UpdateService {
                service_id,
                config_hash: config.config_hash,
            });
            Ok(())
        })
    }

    // ── activation and registration ────────────────────────────────────

    /// Pay the activation stake and open registration.
    ///
    /// Native services attach exactly the stake. Token services must have
    /// deposited it beforehand through a transfer notification.
    pub fn activate_registration(
        &mut self,
        ctx: &CallContext,
        service_id: ServiceId,
    ) -> Result<(), RegistryError> {
        self.atomically(|reg| {
            let service = reg.store.get(service_id)?;
            service.require_owner(&ctx.predecessor)?;
            service.precheck(Operation::ActivateRegistration)?;
            let stake = service.security_deposit;
            let currency = service.currency.clone();

            reg.gateway
                .collect(&currency, &ctx.predecessor, service_id, ctx.attached_deposit, stake)?;

            let service = reg.store.get_mut(service_id)?;
            service.stake_held = stake;
            service.transition(Operation::ActivateRegistration)?;

            tracing::info!(%service_id, stake, %currency, "registration activated");
            reg.emit(RegistryEvent::ActivateRegistration { service_id, stake });
            Ok(())
        })
    }

    /// Register agent instances for the calling operator and bond them.
    ///
    /// `instances[i]` fills a slot of role `agent_ids[i]`. Payment must equal
    /// the sum of the roles' bonds. Filling the last slot finishes
    /// registration.
    pub fn register_agents(
        &mut self,
        ctx: &CallContext,
        service_id: ServiceId,
        instances: &[AccountId],
        agent_ids: &[u32],
    ) -> Result<ServiceState, RegistryError> {
        self.atomically(|reg| {
            reg.require_unpaused()?;
            let operator = ctx.predecessor.clone();
            if instances.len() != agent_ids.len() {
                return Err(RegistryError::ArrayLengthMismatch {
                    what: "agent instances and agent ids",
                    left: instances.len(),
                    right: agent_ids.len(),
                });
            }
            let roles = agent_ids
                .iter()
                .map(|id| AgentId::new(*id))
                .collect::<Result<Vec<_>, _>>()?;

            let service = reg.store.get(service_id)?;
            service.precheck(Operation::RegisterAgents {
                all_slots_filled: false,
            })?;
            if service.operators_check && !service.whitelisted_operators.contains(&operator) {
                return Err(RegistryError::OperatorNotWhitelisted {
                    service_id,
                    operator,
                });
            }
            let currency = service.currency.clone();
            let required = service.bonds.required_bond(&roles)?;

            for instance in instances {
                if instance == &operator {
                    return Err(RegistryError::OperatorIsInstance { operator });
                }
                if reg.instance_operators.contains_key(instance) {
                    return Err(RegistryError::DuplicateInstance {
                        instance: instance.clone(),
                    });
                }
            }

            let service = reg.store.get_mut(service_id)?;
            for (instance, agent_id) in instances.iter().zip(&roles) {
                let bond = service
                    .bonds
                    .slot(*agent_id)
                    .map(|s| s.bond)
                    .unwrap_or_default();
                service.bonds.credit(&operator, *agent_id, instance, bond)?;
            }
            let all_slots_filled = service.bonds.all_slots_filled();
            let state = service.transition(Operation::RegisterAgents { all_slots_filled })?;

            reg.gateway
                .collect(&currency, &operator, service_id, ctx.attached_deposit, required)?;

            for (instance, agent_id) in instances.iter().zip(&roles) {
                reg.instance_operators
                    .insert(instance.clone(), operator.clone());
                reg.emit(RegistryEvent::RegisterInstance {
                    operator: operator.clone(),
                    service_id,
                    instance: instance.clone(),
                    agent_id: *agent_id,
                });
            }
            tracing::info!(%service_id, %operator, instances = instances.len(), bonded = required, %state, "agents registered");
            reg.emit(RegistryEvent::Deposit {
                sender: operator,
                amount: required,
            });
            Ok(state)
        })
    }

    // ── deployment ─────────────────────────────────────────────────────

    /// Put the service multisig in place and move to Deployed.
    ///
    /// A bare `name` asks `factory` to create `name.<factory>` with the
    /// registered instances as members. A `name` that is already a
    /// sub-account of the factory re-attaches that wallet, provided its
    /// members are exactly the registered instances in order.
    pub fn deploy(
        &mut self,
        ctx: &CallContext,
        service_id: ServiceId,
        name: &AccountId,
        factory: &mut dyn MultisigFactory,
    ) -> Result<AccountId, RegistryError> {
        self.atomically(|reg| {
            let service = reg.store.get(service_id)?;
            service.require_owner(&ctx.predecessor)?;
            service.precheck(Operation::Deploy)?;
            if factory.account() != &reg.multisig_factory {
                return Err(crate::deployment::DeploymentError::Rejected(format!(
                    "factory {} is not the configured factory {}",
                    factory.account(),
                    reg.multisig_factory
                ))
                .into());
            }

            let members: Vec<MultisigMember> = service
                .bonds
                .instances()
                .into_iter()
                .map(|i| MultisigMember::account(i.instance))
                .collect();

            let reused = name.is_sub_account_of(&reg.multisig_factory);
            let multisig = if reused {
                let existing = factory.members(name)?;
                if existing != members {
                    return Err(RegistryError::MultisigMismatch {
                        multisig: name.clone(),
                    });
                }
                name.clone()
            } else {
                if name.parent().is_some() {
                    return Err(RegistryError::InvalidMultisigName {
                        name: name.clone(),
                        factory: reg.multisig_factory.clone(),
                    });
                }
                factory.create(name, &members, service.threshold)?
            };

            let service = reg.store.get_mut(service_id)?;
            service.multisig = Some(multisig.clone());
            service.transition(Operation::Deploy)?;

            tracing::info!(%service_id, %multisig, reused, "service deployed");
            reg.emit(RegistryEvent::DeployService {
                service_id,
                multisig: multisig.clone(),
                reused,
            });
            Ok(multisig)
        })
    }

    // ── termination ────────────────────────────────────────────────────

    /// Terminate the service and return the activation stake to the owner.
    ///
    /// Role slots are released. Operator bonds stay held until each operator
    /// unbonds; without bonded operators the service goes straight back to
    /// PreRegistration. Returns the stake refund, if any was held.
    pub fn terminate(
        &mut self,
        ctx: &CallContext,
        service_id: ServiceId,
    ) -> Result<Option<Payout>, RegistryError> {
        self.atomically(|reg| {
            let service = reg.store.get_mut(service_id)?;
            service.require_owner(&ctx.predecessor)?;
            service.precheck(Operation::Terminate { bonds_held: false })?;

            let stake = std::mem::take(&mut service.stake_held);
            let owner = service.owner.clone();
            let currency = service.currency.clone();
            service.bonds.release_slots();
            let bonds_held = service.bonds.has_operators();
            let state = service.transition(Operation::Terminate { bonds_held })?;

            let refund = if stake > 0 {
                Some(reg.gateway.refund(&currency, &owner, service_id, stake)?)
            } else {
                None
            };

            tracing::info!(%service_id, %state, stake, "service terminated");
            reg.emit(RegistryEvent::TerminateService { service_id });
            if stake > 0 {
                reg.emit(RegistryEvent::Refund {
                    receiver: owner,
                    amount: stake,
                });
            }
            Ok(refund)
        })
    }

    /// Return the calling operator's bonds after termination.
    ///
    /// Native bonds are paid out immediately. Token bonds become a pending
    /// transfer to resolve with `resolve_transfer`. The last operator to
    /// unbond returns the service to PreRegistration.
    pub fn unbond(&mut self, ctx: &CallContext, service_id: ServiceId) -> Result<Payout, RegistryError> {
        self.atomically(|reg| {
            let operator = ctx.predecessor.clone();
            let service = reg.store.get_mut(service_id)?;
            service.precheck(Operation::Unbond {
                bonds_remaining: false,
            })?;

            let released = service.bonds.debit_all(&operator)?;
            let currency = service.currency.clone();
            let bonds_remaining = service.bonds.has_operators();
            let state = service.transition(Operation::Unbond { bonds_remaining })?;

            for instance in &released.instances {
                reg.instance_operators.remove(instance);
            }
            let payout = if released.amount > 0 {
                reg.gateway
                    .pay_out(&currency, &operator, service_id, released.amount)?
            } else {
                Payout::Settled {
                    receiver: operator.clone(),
                    amount: 0,
                }
            };

            tracing::info!(%service_id, %operator, amount = released.amount, %state, "operator unbonded");
            reg.emit(RegistryEvent::OperatorUnbond {
                operator: operator.clone(),
                service_id,
            });
            if released.amount > 0 {
                reg.emit(RegistryEvent::Refund {
                    receiver: operator,
                    amount: released.amount,
                });
            }
            Ok(payout)
        })
    }

    /// Reduce the bonds behind `instances` by `amounts`, capped at each
    /// operator's balance. Only the service multisig may slash, and only
    /// while Deployed. Returns the total slashed.
    pub fn slash(
        &mut self,
        ctx: &CallContext,
        service_id: ServiceId,
        instances: &[AccountId],
        amounts: &[Balance],
    ) -> Result<Balance, RegistryError> {
        self.atomically(|reg| {
            if instances.len() != amounts.len() {
                return Err(RegistryError::ArrayLengthMismatch {
                    what: "agent instances and amounts",
                    left: instances.len(),
                    right: amounts.len(),
                });
            }
            let service = reg.store.get_mut(service_id)?;
            if service.state != ServiceState::Deployed {
                return Err(RegistryError::InvalidState {
                    service_id,
                    operation: "slash",
                    state: service.state,
                });
            }
            if service.multisig.as_ref() != Some(&ctx.predecessor) {
                return Err(RegistryError::Unauthorized {
                    caller: ctx.predecessor.clone(),
                    required: "service multisig",
                });
            }
            let currency = service.currency.clone();

            let mut slashed = Vec::with_capacity(instances.len());
            for (instance, amount) in instances.iter().zip(amounts) {
                slashed.push(service.bonds.slash(instance, *amount)?);
            }

            let mut total: Balance = 0;
            for (operator, amount) in slashed {
                total = total.saturating_add(amount);
                reg.gateway.record_slash(&currency, amount);
                reg.emit(RegistryEvent::OperatorSlashed {
                    amount,
                    operator,
                    service_id,
                });
            }
            tracing::info!(%service_id, total, "operators slashed");
            Ok(total)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::{DeploymentError, LocalMultisigFactory};
    use svcreg_core::{ConfigHash, ValidationError};

    use crate::service::TRANSITION_LOG_CAPACITY;

    const BOND: Balance = 1000;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn hash(b: u8) -> ConfigHash {
        ConfigHash::new([b; 32]).unwrap()
    }

    fn owner() -> CallContext {
        CallContext::new(acct("owner.near"))
    }

    fn operator() -> CallContext {
        CallContext::new(acct("operator.near"))
    }

    fn registry() -> ServiceRegistry {
        ServiceRegistry::new(
            acct("registry.near"),
            acct("admin.near"),
            acct("factory.near"),
            RegistryMetadata::new("Service Registry", "SR"),
        )
        .unwrap()
    }

    fn single_role(num: u32, threshold: u32) -> ServiceConfig {
        ServiceConfig {
            config_hash: hash(5),
            agent_ids: vec![1],
            agent_num_instances: vec![num],
            agent_bonds: vec![BOND],
            threshold,
        }
    }

    fn create(reg: &mut ServiceRegistry, config: ServiceConfig) -> ServiceId {
        reg.create(
            &owner(),
            acct("owner.near"),
            TokenMetadata::titled("svc"),
            Currency::Native,
            config,
        )
        .unwrap()
    }

    fn active(reg: &mut ServiceRegistry, num: u32) -> ServiceId {
        let id = create(reg, single_role(num, num));
        reg.activate_registration(&owner().with_deposit(BOND), id)
            .unwrap();
        id
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let mut reg = registry();
        let a = create(&mut reg, single_role(1, 1));
        let b = create(&mut reg, single_role(1, 1));
        assert_eq!((a.as_u32(), b.as_u32()), (1, 2));
        assert_eq!(reg.store.total_supply(), 2);
        assert_eq!(reg.store.get(a).unwrap().state, ServiceState::PreRegistration);
    }

    #[test]
    fn create_validates_threshold() {
        let mut reg = registry();
        let err = reg
            .create(&owner(), acct("owner.near"), TokenMetadata::titled("svc"), Currency::Native, single_role(2, 3))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::ThresholdExceedsInstances {
                threshold: 3,
                max_instances: 2
            }
        );
        let err = reg
            .create(&owner(), acct("owner.near"), TokenMetadata::titled("svc"), Currency::Native, single_role(4, 2))
            .unwrap_err();
        assert_eq!(err, RegistryError::ThresholdBelowQuorum { threshold: 2, minimum: 3 });
        assert_eq!(reg.store.total_supply(), 0);
    }

    #[test]
    fn create_rejects_instance_counts_that_overflow() {
        let mut reg = registry();
        let config = ServiceConfig {
            config_hash: hash(5),
            agent_ids: vec![1, 2],
            agent_num_instances: vec![u32::MAX, 2],
            agent_bonds: vec![10, 10],
            threshold: 1,
        };
        let err = reg
            .create(&owner(), acct("owner.near"), TokenMetadata::titled("svc"), Currency::Native, config)
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Validation(ValidationError::TooManyInstances { max: u32::MAX })
        );
        assert_eq!(reg.store.total_supply(), 0);

        let id = create(&mut reg, single_role(1, 1));
        let config = ServiceConfig {
            config_hash: hash(6),
            agent_ids: vec![1, 2],
            agent_num_instances: vec![u32::MAX, 1],
            agent_bonds: vec![BOND, BOND],
            threshold: u32::MAX,
        };
        let err = reg.update(&owner(), id, config).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(ValidationError::TooManyInstances { .. })), "got: {err:?}");
        assert_eq!(reg.get_service_config_hash(id).unwrap(), hash(5));
    }

    #[test]
    fn create_fails_once_ids_are_exhausted() {
        let mut reg = registry();
        let last = create(&mut reg, single_role(1, 1));
        reg.store.last_id = u32::MAX;
        let before = reg.clone();
        let err = reg
            .create(&owner(), acct("owner.near"), TokenMetadata::titled("svc"), Currency::Native, single_role(1, 1))
            .unwrap_err();
        assert_eq!(err, RegistryError::ServiceIdsExhausted { last_id: u32::MAX });
        assert_eq!(reg, before);
        assert_eq!(reg.get_service(last).unwrap().id, last);
    }

    #[test]
    fn transition_log_keeps_most_recent_records() {
        let mut reg = registry();
        let id = create(&mut reg, single_role(1, 1));
        for _ in 0..TRANSITION_LOG_CAPACITY {
            reg.activate_registration(&owner().with_deposit(BOND), id)
                .unwrap();
            reg.terminate(&owner(), id).unwrap();
        }
        let log = &reg.get_service(id).unwrap().transition_log;
        assert_eq!(log.len(), TRANSITION_LOG_CAPACITY);
        let last = log.last().unwrap();
        assert_eq!(
            (last.from_state, last.to_state),
            (ServiceState::ActiveRegistration, ServiceState::PreRegistration)
        );
    }

    #[test]
    fn create_rejects_bad_metadata_and_params() {
        let mut reg = registry();
        let mut meta = TokenMetadata::titled("svc");
        meta.copies = Some(3);
        let err = reg
            .create(&owner(), acct("owner.near"), meta, Currency::Native, single_role(1, 1))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)), "got: {err:?}");

        let mut config = single_role(1, 1);
        config.agent_bonds = vec![0];
        assert!(reg
            .create(&owner(), acct("owner.near"), TokenMetadata::titled("svc"), Currency::Native, config)
            .is_err());
    }

    #[test]
    fn update_appends_history() {
        let mut reg = registry();
        let id = create(&mut reg, single_role(1, 1));
        let mut config = single_role(1, 1);
        config.config_hash = hash(9);
        reg.update(&owner(), id, config).unwrap();
        let service = reg.store.get(id).unwrap();
        assert_eq!(service.config_hash(), hash(9));
        assert_eq!(service.config.previous(), &[hash(5)]);
    }

    #[test]
    fn update_requires_owner() {
        let mut reg = registry();
        let id = create(&mut reg, single_role(1, 1));
        let err = reg.update(&operator(), id, single_role(1, 1)).unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }), "got: {err:?}");
        assert!(reg.store.get(id).unwrap().config.previous().is_empty());
    }

    #[test]
    fn update_with_bonds_reports_outstanding_bonds() {
        let mut reg = registry();
        let id = active(&mut reg, 2);
        reg.register_agents(&operator().with_deposit(BOND), id, &[acct("i1.near")], &[1])
            .unwrap();
        let err = reg.update(&owner(), id, single_role(2, 2)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::BondsStillOutstanding {
                total_bonded: BOND,
                operators: 1
            }
        );
    }

    #[test]
    fn update_in_active_registration_is_invalid_state() {
        let mut reg = registry();
        let id = active(&mut reg, 1);
        let err = reg.update(&owner(), id, single_role(1, 1)).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidState { .. }), "got: {err:?}");
    }

    #[test]
    fn activation_requires_exact_stake() {
        let mut reg = registry();
        let id = create(&mut reg, single_role(1, 1));
        let err = reg
            .activate_registration(&owner().with_deposit(BOND - 1), id)
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DepositMismatch {
                expected: BOND,
                attached: BOND - 1
            }
        );
        assert_eq!(reg.gateway.native_balance(), 0);
        reg.activate_registration(&owner().with_deposit(BOND), id)
            .unwrap();
        assert_eq!(reg.gateway.native_balance(), BOND);
        assert_eq!(reg.store.get(id).unwrap().state, ServiceState::ActiveRegistration);
    }

    #[test]
    fn register_fills_slots_and_finishes() {
        let mut reg = registry();
        let id = active(&mut reg, 2);
        let state = reg
            .register_agents(&operator().with_deposit(BOND), id, &[acct("i1.near")], &[1])
            .unwrap();
        assert_eq!(state, ServiceState::ActiveRegistration);
        let state = reg
            .register_agents(&operator().with_deposit(BOND), id, &[acct("i2.near")], &[1])
            .unwrap();
        assert_eq!(state, ServiceState::FinishedRegistration);
        assert_eq!(reg.gateway.native_balance(), 3 * BOND);
    }

    #[test]
    fn register_beyond_capacity_is_rejected() {
        let mut reg = registry();
        let id = active(&mut reg, 1);
        let err = reg
            .register_agents(
                &operator().with_deposit(2 * BOND),
                id,
                &[acct("i1.near"), acct("i2.near")],
                &[1, 1],
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::SlotsExhausted { .. }), "got: {err:?}");
        let service = reg.store.get(id).unwrap();
        assert_eq!(service.bonds.aggregate(), 0);
        assert_eq!(service.state, ServiceState::ActiveRegistration);
        assert!(reg.instance_operators.is_empty());
    }

    #[test]
    fn register_rejects_wrong_payment_without_side_effects() {
        let mut reg = registry();
        let id = active(&mut reg, 1);
        let before = reg.clone();
        let err = reg
            .register_agents(&operator().with_deposit(BOND + 1), id, &[acct("i1.near")], &[1])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DepositMismatch { .. }), "got: {err:?}");
        assert_eq!(reg, before);
    }

    #[test]
    fn register_rejects_operator_as_instance_and_duplicates() {
        let mut reg = registry();
        let id = active(&mut reg, 2);
        let err = reg
            .register_agents(&operator().with_deposit(BOND), id, &[acct("operator.near")], &[1])
            .unwrap_err();
        assert!(matches!(err, RegistryError::OperatorIsInstance { .. }), "got: {err:?}");

        reg.register_agents(&operator().with_deposit(BOND), id, &[acct("i1.near")], &[1])
            .unwrap();
        let err = reg
            .register_agents(&operator().with_deposit(BOND), id, &[acct("i1.near")], &[1])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateInstance { .. }), "got: {err:?}");
    }

    #[test]
    fn instances_are_unique_across_services() {
        let mut reg = registry();
        let a = active(&mut reg, 1);
        let b = active(&mut reg, 1);
        reg.register_agents(&operator().with_deposit(BOND), a, &[acct("i1.near")], &[1])
            .unwrap();
        let err = reg
            .register_agents(&operator().with_deposit(BOND), b, &[acct("i1.near")], &[1])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateInstance { .. }), "got: {err:?}");
    }

    #[test]
    fn paused_registry_rejects_create_and_register() {
        let mut reg = registry();
        let id = active(&mut reg, 1);
        reg.paused = true;
        let err = reg
            .register_agents(&operator().with_deposit(BOND), id, &[acct("i1.near")], &[1])
            .unwrap_err();
        assert_eq!(err, RegistryError::Paused);
        let err = reg
            .create(&owner(), acct("owner.near"), TokenMetadata::titled("svc"), Currency::Native, single_role(1, 1))
            .unwrap_err();
        assert_eq!(err, RegistryError::Paused);
    }

    #[test]
    fn full_native_lifecycle_balances() {
        let mut reg = registry();
        let id = active(&mut reg, 1);
        assert_eq!(reg.gateway.native_balance(), BOND);

        reg.register_agents(&operator().with_deposit(BOND), id, &[acct("i1.near")], &[1])
            .unwrap();
        assert_eq!(reg.gateway.native_balance(), 2 * BOND);

        let refund = reg.terminate(&owner(), id).unwrap();
        assert_eq!(
            refund,
            Some(Payout::Settled {
                receiver: acct("owner.near"),
                amount: BOND
            })
        );
        assert_eq!(reg.store.get(id).unwrap().state, ServiceState::TerminatedBonded);
        assert_eq!(reg.gateway.native_balance(), BOND);

        let payout = reg.unbond(&operator(), id).unwrap();
        assert_eq!(payout.amount(), BOND);
        assert_eq!(reg.gateway.native_balance(), 0);
        assert_eq!(reg.store.get(id).unwrap().state, ServiceState::PreRegistration);
        assert!(reg.instance_operators.is_empty());
    }

    #[test]
    fn terminate_without_operators_returns_to_pre_registration() {
        let mut reg = registry();
        let id = active(&mut reg, 1);
        reg.terminate(&owner(), id).unwrap();
        assert_eq!(reg.store.get(id).unwrap().state, ServiceState::PreRegistration);
        assert_eq!(reg.gateway.native_balance(), 0);
        let err = reg.terminate(&owner(), id).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidState { .. }), "got: {err:?}");
    }

    #[test]
    fn unbond_by_stranger_is_rejected() {
        let mut reg = registry();
        let id = active(&mut reg, 1);
        reg.register_agents(&operator().with_deposit(BOND), id, &[acct("i1.near")], &[1])
            .unwrap();
        reg.terminate(&owner(), id).unwrap();
        let err = reg
            .unbond(&CallContext::new(acct("stranger.near")), id)
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownOperator { .. }), "got: {err:?}");
    }

    #[test]
    fn deploy_creates_multisig() {
        let mut reg = registry();
        let mut factory = LocalMultisigFactory::new(acct("factory.near"));
        let id = active(&mut reg, 1);
        reg.register_agents(&operator().with_deposit(BOND), id, &[acct("i1.near")], &[1])
            .unwrap();
        let multisig = reg
            .deploy(&owner(), id, &acct("wallet"), &mut factory)
            .unwrap();
        assert_eq!(multisig, acct("wallet.factory.near"));
        let service = reg.store.get(id).unwrap();
        assert_eq!(service.state, ServiceState::Deployed);
        assert_eq!(service.multisig, Some(multisig));
    }

    #[test]
    fn deploy_failure_leaves_state() {
        let mut reg = registry();
        let mut factory = LocalMultisigFactory::new(acct("factory.near"));
        factory
            .create(&acct("wallet"), &[MultisigMember::account(acct("x1.near"))], 1)
            .unwrap();
        let id = active(&mut reg, 1);
        reg.register_agents(&operator().with_deposit(BOND), id, &[acct("i1.near")], &[1])
            .unwrap();
        let err = reg
            .deploy(&owner(), id, &acct("wallet"), &mut factory)
            .unwrap_err();
        assert!(
            matches!(err, RegistryError::DeploymentFailed(DeploymentError::AlreadyExists { .. })),
            "got: {err:?}"
        );
        assert_eq!(reg.store.get(id).unwrap().state, ServiceState::FinishedRegistration);

        let err = reg
            .deploy(&owner(), id, &acct("wallet.factory.near"), &mut factory)
            .unwrap_err();
        assert!(matches!(err, RegistryError::MultisigMismatch { .. }), "got: {err:?}");

        let err = reg
            .deploy(&owner(), id, &acct("wallet.other.near"), &mut factory)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidMultisigName { .. }), "got: {err:?}");
    }

    #[test]
    fn slash_requires_multisig_caller() {
        let mut reg = registry();
        let mut factory = LocalMultisigFactory::new(acct("factory.near"));
        let id = active(&mut reg, 1);
        reg.register_agents(&operator().with_deposit(BOND), id, &[acct("i1.near")], &[1])
            .unwrap();
        let multisig = reg
            .deploy(&owner(), id, &acct("wallet"), &mut factory)
            .unwrap();

        let err = reg
            .slash(&owner(), id, &[acct("i1.near")], &[10])
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }), "got: {err:?}");

        let total = reg
            .slash(&CallContext::new(multisig), id, &[acct("i1.near")], &[10 * BOND])
            .unwrap();
        assert_eq!(total, BOND);
        assert_eq!(reg.gateway.slashed(&Currency::Native), BOND);
        assert_eq!(reg.store.get(id).unwrap().bonds.aggregate(), 0);
    }
}
