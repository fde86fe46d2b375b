//! Registry and per-service administration.

use svcreg_core::{AccountId, ServiceId};

use crate::context::CallContext;
use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::registry::ServiceRegistry;

impl ServiceRegistry {
    /// Hand registry ownership to `new_owner`.
    pub fn change_owner(&mut self, ctx: &CallContext, new_owner: AccountId) -> Result<(), RegistryError> {
        self.atomically(|reg| {
            reg.require_registry_owner(&ctx.predecessor)?;
            tracing::info!(from = %reg.owner, to = %new_owner, "registry owner changed");
            reg.owner = new_owner.clone();
            reg.emit(RegistryEvent::OwnerUpdated { owner: new_owner });
            Ok(())
        })
    }

    /// Pause or resume service creation and agent registration.
    pub fn set_paused(&mut self, ctx: &CallContext, paused: bool) -> Result<(), RegistryError> {
        self.atomically(|reg| {
            reg.require_registry_owner(&ctx.predecessor)?;
            reg.paused = paused;
            tracing::info!(paused, "registry pause flag set");
            reg.emit(RegistryEvent::PausedUpdated { paused });
            Ok(())
        })
    }

    /// Require operators of a service to be whitelisted before registering.
    pub fn set_operators_check(
        &mut self,
        ctx: &CallContext,
        service_id: ServiceId,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        self.atomically(|reg| {
            let service = reg.store.get_mut(service_id)?;
            service.require_owner(&ctx.predecessor)?;
            service.operators_check = enabled;
            reg.emit(RegistryEvent::OperatorsCheckUpdated {
                service_id,
                enabled,
            });
            Ok(())
        })
    }

    /// Add (`true`) or remove (`false`) operators from a service whitelist.
    pub fn set_operators_statuses(
        &mut self,
        ctx: &CallContext,
        service_id: ServiceId,
        operators: &[AccountId],
        statuses: &[bool],
    ) -> Result<(), RegistryError> {
        self.atomically(|reg| {
            if operators.len() != statuses.len() {
                return Err(RegistryError::ArrayLengthMismatch {
                    what: "operators and statuses",
                    left: operators.len(),
                    right: statuses.len(),
                });
            }
            let service = reg.store.get_mut(service_id)?;
            service.require_owner(&ctx.predecessor)?;
            for (operator, allowed) in operators.iter().zip(statuses) {
                if *allowed {
                    service.whitelisted_operators.insert(operator.clone());
                } else {
                    service.whitelisted_operators.remove(operator);
                }
            }
            reg.emit(RegistryEvent::OperatorsWhitelistUpdated {
                service_id,
                statuses: operators.iter().cloned().zip(statuses.iter().copied()).collect(),
            });
            Ok(())
        })
    }
}
