//! Read-only queries.

use svcreg_core::{AccountId, AgentId, Balance, ConfigHash, Currency, RegistryMetadata, ServiceId, TokenMetadata};
use svcreg_ledger::{AgentInstance, PendingTransfer};
use svcreg_state::ServiceState;

use crate::error::RegistryError;
use crate::events::EventRecord;
use crate::registry::ServiceRegistry;
use crate::service::Service;

impl ServiceRegistry {
    /// Number of services ever created.
    pub fn total_supply(&self) -> u32 {
        self.store.total_supply()
    }

    /// Full service record.
    pub fn get_service(&self, service_id: ServiceId) -> Result<&Service, RegistryError> {
        self.store.get(service_id)
    }

    /// Lifecycle state.
    pub fn get_service_state(&self, service_id: ServiceId) -> Result<ServiceState, RegistryError> {
        Ok(self.store.get(service_id)?.state)
    }

    /// Multisig address, once deployed.
    pub fn get_service_multisig(&self, service_id: ServiceId) -> Result<Option<AccountId>, RegistryError> {
        Ok(self.store.get(service_id)?.multisig.clone())
    }

    /// Current configuration hash.
    pub fn get_service_config_hash(&self, service_id: ServiceId) -> Result<ConfigHash, RegistryError> {
        Ok(self.store.get(service_id)?.config_hash())
    }

    /// Superseded configuration hashes, oldest first.
    pub fn get_service_previous_config_hashes(
        &self,
        service_id: ServiceId,
    ) -> Result<Vec<ConfigHash>, RegistryError> {
        Ok(self.store.get(service_id)?.config.previous().to_vec())
    }

    /// Configured role ids, ascending.
    pub fn get_agent_ids(&self, service_id: ServiceId) -> Result<Vec<AgentId>, RegistryError> {
        Ok(self.store.get(service_id)?.bonds.agent_ids())
    }

    /// Instance counts, ordered like [`Self::get_agent_ids`].
    pub fn get_service_agent_params_num_instances(
        &self,
        service_id: ServiceId,
    ) -> Result<Vec<u32>, RegistryError> {
        Ok(self.store.get(service_id)?.bonds.num_instances())
    }

    /// Per-instance bonds, ordered like [`Self::get_agent_ids`].
    pub fn get_service_agent_params_bonds(&self, service_id: ServiceId) -> Result<Vec<Balance>, RegistryError> {
        Ok(self.store.get(service_id)?.bonds.bonds())
    }

    /// Registered instances with their roles.
    pub fn get_service_agent_instances(
        &self,
        service_id: ServiceId,
    ) -> Result<Vec<AgentInstance>, RegistryError> {
        Ok(self.store.get(service_id)?.bonds.instances())
    }

    /// Instances registered for one role.
    pub fn get_instances_for_agent_id(
        &self,
        service_id: ServiceId,
        agent_id: AgentId,
    ) -> Result<Vec<AccountId>, RegistryError> {
        let service = self.store.get(service_id)?;
        let slot = service
            .bonds
            .slot(agent_id)
            .ok_or(RegistryError::UnknownAgent { agent_id })?;
        Ok(slot.instances.clone())
    }

    /// Bond held by `operator` in a service; zero when it holds none.
    pub fn get_operator_balance(&self, operator: &AccountId, service_id: ServiceId) -> Result<Balance, RegistryError> {
        Ok(self
            .store
            .get(service_id)?
            .bonds
            .operator(operator)
            .map_or(0, |b| b.balance))
    }

    /// Instances `operator` registered in a service.
    pub fn get_operator_service_agent_instances(
        &self,
        operator: &AccountId,
        service_id: ServiceId,
    ) -> Result<Vec<AgentInstance>, RegistryError> {
        Ok(self
            .store
            .get(service_id)?
            .bonds
            .operator(operator)
            .map(|b| {
                b.instances
                    .iter()
                    .map(|(instance, agent_id)| AgentInstance {
                        instance: instance.clone(),
                        agent_id: *agent_id,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Native currency held by the registry.
    pub fn get_registry_balance(&self) -> Balance {
        self.gateway.native_balance()
    }

    /// Locked token holdings of the registry.
    pub fn get_registry_token_balance(&self, token: &AccountId) -> Balance {
        self.gateway.token_holdings(token)
    }

    /// Slashed funds awaiting drain.
    pub fn get_registry_slashed_funds(&self, currency: &Currency) -> Balance {
        self.gateway.slashed(currency)
    }

    /// Deposit balance of `account` in `token`, `None` when not registered.
    pub fn get_token_balance(&self, token: &AccountId, account: &AccountId) -> Option<Balance> {
        self.gateway.balance_of(token, account)
    }

    /// Whether creation and registration are paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether `operator` is on the service whitelist.
    pub fn is_operator_whitelisted(&self, service_id: ServiceId, operator: &AccountId) -> Result<bool, RegistryError> {
        Ok(self
            .store
            .get(service_id)?
            .whitelisted_operators
            .contains(operator))
    }

    /// Size in bytes of the serialized registry. Buffered events are not
    /// persisted and do not count.
    pub fn get_storage_usage(&self) -> Result<usize, RegistryError> {
        serde_json::to_vec(self)
            .map(|bytes| bytes.len())
            .map_err(|e| RegistryError::Serialization(e.to_string()))
    }

    /// Registry-level token metadata.
    pub fn nft_metadata(&self) -> &RegistryMetadata {
        &self.metadata
    }

    /// Token metadata of one service.
    pub fn get_token_metadata(&self, service_id: ServiceId) -> Result<&TokenMetadata, RegistryError> {
        self.store
            .token_metadata(service_id)
            .ok_or(RegistryError::UnknownService { service_id })
    }

    /// Crate version.
    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Registry owner.
    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Configured multisig factory.
    pub fn multisig_factory(&self) -> &AccountId {
        &self.multisig_factory
    }

    /// The registry's own account.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Buffered events not yet taken, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &EventRecord> {
        self.events.iter()
    }

    /// Unresolved outbound token transfers.
    pub fn pending_transfers(&self) -> Vec<&PendingTransfer> {
        self.gateway.pending().collect()
    }

    /// All services in id order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.store.iter()
    }

    /// Services whose token `owner` holds, in id order.
    pub fn services_owned_by<'a>(&'a self, owner: &'a AccountId) -> impl Iterator<Item = &'a Service> {
        self.store.owned_by(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CallContext;
    use crate::service::ServiceConfig;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn registry_with_service() -> (ServiceRegistry, ServiceId) {
        let mut reg = ServiceRegistry::new(
            acct("registry.near"),
            acct("admin.near"),
            acct("factory.near"),
            RegistryMetadata::new("Service Registry", "SR"),
        )
        .unwrap();
        let id = reg
            .create(
                &CallContext::new(acct("owner.near")),
                acct("owner.near"),
                TokenMetadata::titled("svc"),
                Currency::Native,
                ServiceConfig {
                    config_hash: ConfigHash::new([3; 32]).unwrap(),
                    agent_ids: vec![2, 1],
                    agent_num_instances: vec![1, 2],
                    agent_bonds: vec![50, 20],
                    threshold: 3,
                },
            )
            .unwrap();
        (reg, id)
    }

    #[test]
    fn role_views_are_ordered_by_agent_id() {
        let (reg, id) = registry_with_service();
        let ids: Vec<u32> = reg.get_agent_ids(id).unwrap().iter().map(AgentId::as_u32).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(reg.get_service_agent_params_num_instances(id).unwrap(), vec![2, 1]);
        assert_eq!(reg.get_service_agent_params_bonds(id).unwrap(), vec![20, 50]);
        assert_eq!(reg.get_service(id).unwrap().security_deposit, 50);
    }

    #[test]
    fn operator_views_after_registration() {
        let (mut reg, id) = registry_with_service();
        reg.activate_registration(&CallContext::new(acct("owner.near")).with_deposit(50), id)
            .unwrap();
        let op = acct("op.near");
        reg.register_agents(
            &CallContext::new(op.clone()).with_deposit(70),
            id,
            &[acct("b.near"), acct("a.near")],
            &[2, 1],
        )
        .unwrap();
        assert_eq!(reg.get_operator_balance(&op, id).unwrap(), 70);
        assert_eq!(reg.get_operator_balance(&acct("x.near"), id).unwrap(), 0);
        assert_eq!(reg.get_operator_service_agent_instances(&op, id).unwrap().len(), 2);
        let instances: Vec<String> = reg
            .get_service_agent_instances(id)
            .unwrap()
            .into_iter()
            .map(|i| i.instance.to_string())
            .collect();
        assert_eq!(instances, vec!["a.near", "b.near"]);
        assert_eq!(
            reg.get_instances_for_agent_id(id, AgentId::new(2).unwrap()).unwrap(),
            vec![acct("b.near")]
        );
        assert_eq!(reg.get_registry_balance(), 120);
    }

    #[test]
    fn services_are_listed_by_owner() {
        let (mut reg, first) = registry_with_service();
        let second = reg
            .create(
                &CallContext::new(acct("other.near")),
                acct("other.near"),
                TokenMetadata::titled("other"),
                Currency::Native,
                ServiceConfig {
                    config_hash: ConfigHash::new([4; 32]).unwrap(),
                    agent_ids: vec![1],
                    agent_num_instances: vec![1],
                    agent_bonds: vec![5],
                    threshold: 1,
                },
            )
            .unwrap();
        let owner = acct("owner.near");
        let other = acct("other.near");
        let owned: Vec<ServiceId> = reg.services_owned_by(&owner).map(|s| s.id).collect();
        assert_eq!(owned, vec![first]);
        let owned: Vec<ServiceId> = reg.services_owned_by(&other).map(|s| s.id).collect();
        assert_eq!(owned, vec![second]);
        assert_eq!(reg.services_owned_by(&acct("nobody.near")).count(), 0);
    }

    #[test]
    fn unknown_service_views_fail() {
        let (reg, _) = registry_with_service();
        let missing = ServiceId::new(9).unwrap();
        assert!(matches!(
            reg.get_service_state(missing),
            Err(RegistryError::UnknownService { .. })
        ));
        assert!(reg.get_token_metadata(missing).is_err());
    }

    #[test]
    fn storage_usage_grows_with_services() {
        let (mut reg, _) = registry_with_service();
        let before = reg.get_storage_usage().unwrap();
        reg.create(
            &CallContext::new(acct("owner.near")),
            acct("owner.near"),
            TokenMetadata::titled("svc2"),
            Currency::Native,
            ServiceConfig {
                config_hash: ConfigHash::new([4; 32]).unwrap(),
                agent_ids: vec![1],
                agent_num_instances: vec![1],
                agent_bonds: vec![1],
                threshold: 1,
            },
        )
        .unwrap();
        assert!(reg.get_storage_usage().unwrap() > before);
        assert_eq!(reg.total_supply(), 2);
        assert!(!reg.version().is_empty());
    }
}
