//! # All-or-Nothing Calls and Ledger Invariants
//!
//! A rejected call must leave the registry byte-for-byte unchanged. Random
//! operation sequences must keep every bond book consistent and the native
//! balance equal to the stakes, bonds and slashed funds it backs.

use proptest::prelude::*;

use svcreg_core::{AccountId, AgentId, Balance, ConfigHash, Currency, ServiceId, TokenMetadata};
use svcreg_registry::{
    CallContext, LocalMultisigFactory, RegistryError, ServiceConfig, ServiceRegistry,
};
use svcreg_state::ServiceState;

fn acct(s: &str) -> AccountId {
    AccountId::new(s).unwrap()
}

fn call(s: &str) -> CallContext {
    CallContext::new(acct(s))
}

fn registry() -> ServiceRegistry {
    ServiceRegistry::new(
        acct("registry.near"),
        acct("admin.near"),
        acct("factory.near"),
        svcreg_core::RegistryMetadata::new("Service Registry", "SR"),
    )
    .unwrap()
}

fn config(hash: u8, nums: [u32; 2], bonds: [Balance; 2]) -> ServiceConfig {
    ServiceConfig {
        config_hash: ConfigHash::new([hash; 32]).unwrap(),
        agent_ids: vec![1, 2],
        agent_num_instances: nums.to_vec(),
        agent_bonds: bonds.to_vec(),
        threshold: nums[0] + nums[1],
    }
}

fn snapshot(reg: &ServiceRegistry) -> String {
    serde_json::to_string(reg).unwrap()
}

/// Assert that `result` is an error and the registry did not change.
fn assert_rejected_cleanly<T: std::fmt::Debug>(
    reg: &ServiceRegistry,
    before: &str,
    result: Result<T, RegistryError>,
) -> RegistryError {
    let err = result.expect_err("call should have been rejected");
    assert_eq!(snapshot(reg), before, "state changed after {err:?}");
    err
}

fn active_service(reg: &mut ServiceRegistry) -> ServiceId {
    let id = reg
        .create(
            &call("owner.near"),
            acct("owner.near"),
            TokenMetadata::titled("svc"),
            Currency::Native,
            config(1, [2, 1], [100, 300]),
        )
        .unwrap();
    reg.activate_registration(&call("owner.near").with_deposit(300), id)
        .unwrap();
    id
}

// =========================================================================
// Rejected calls leave no trace
// =========================================================================

#[test]
fn failure_after_first_credit_is_rolled_back() {
    let mut reg = registry();
    let id = active_service(&mut reg);
    let before = snapshot(&reg);

    // The second instance repeats the first; the first credit must vanish.
    let result = reg.register_agents(
        &call("op.near").with_deposit(200),
        id,
        &[acct("i1.near"), acct("i1.near")],
        &[1, 1],
    );
    let err = assert_rejected_cleanly(&reg, &before, result);
    assert!(matches!(err, RegistryError::DuplicateInstance { .. }), "got: {err:?}");
    assert_eq!(reg.get_operator_balance(&acct("op.near"), id).unwrap(), 0);
    assert!(reg.get_service_agent_instances(id).unwrap().is_empty());
}

#[test]
fn payment_mismatch_after_transition_is_rolled_back() {
    let mut reg = registry();
    let id = active_service(&mut reg);
    reg.register_agents(&call("op.near").with_deposit(100), id, &[acct("i1.near")], &[1])
        .unwrap();
    let before = snapshot(&reg);

    // Filling the last slots would finish registration; wrong payment undoes it.
    let result = reg.register_agents(
        &call("op2.near").with_deposit(399),
        id,
        &[acct("i2.near"), acct("i3.near")],
        &[1, 2],
    );
    let err = assert_rejected_cleanly(&reg, &before, result);
    assert_eq!(
        err,
        RegistryError::DepositMismatch {
            expected: 400,
            attached: 399
        }
    );
    assert_eq!(reg.get_service_state(id).unwrap(), ServiceState::ActiveRegistration);
}

#[test]
fn rejected_calls_across_the_surface_leave_state_untouched() {
    let mut reg = registry();
    let id = active_service(&mut reg);
    let mut factory = LocalMultisigFactory::new(acct("factory.near"));
    let before = snapshot(&reg);

    let result = reg.update(&call("owner.near"), id, config(2, [1, 1], [1, 1]));
    assert_rejected_cleanly(&reg, &before, result);
    let result = reg.terminate(&call("stranger.near"), id);
    assert_rejected_cleanly(&reg, &before, result);
    let result = reg.deploy(&call("owner.near"), id, &acct("svc"), &mut factory);
    assert_rejected_cleanly(&reg, &before, result);
    let result = reg.unbond(&call("op.near"), id);
    assert_rejected_cleanly(&reg, &before, result);
    let result = reg.slash(&call("owner.near"), id, &[acct("i1.near")], &[1]);
    assert_rejected_cleanly(&reg, &before, result);
    let result = reg.drain(&call("admin.near"), &Currency::Native);
    assert_rejected_cleanly(&reg, &before, result);
    let result = reg.set_paused(&call("owner.near"), true);
    assert_rejected_cleanly(&reg, &before, result);
    let result = reg.register_agents(
        &call("op.near").with_deposit(100),
        id,
        &[acct("i1.near")],
        &[7],
    );
    assert_rejected_cleanly(&reg, &before, result);
    let result = reg.create(
        &call("owner.near"),
        acct("owner.near"),
        TokenMetadata::titled("svc"),
        Currency::Native,
        ServiceConfig {
            threshold: 5,
            ..config(3, [1, 1], [1, 1])
        },
    );
    assert_rejected_cleanly(&reg, &before, result);
}

// =========================================================================
// Random operation sequences
// =========================================================================

#[derive(Debug, Clone)]
enum Op {
    Create { nums: [u32; 2] },
    Update { service: u32, nums: [u32; 2] },
    Activate { service: u32, exact: bool },
    Register { service: u32, operator: u8, instance: u8, agent: u32 },
    Deploy { service: u32 },
    Terminate { service: u32 },
    Unbond { service: u32, operator: u8 },
    Slash { service: u32, instance: u8, amount: Balance },
    Pause { paused: bool },
}

fn arb_op() -> impl Strategy<Value = Op> {
    let nums = prop::array::uniform2(1u32..=2);
    prop_oneof![
        nums.clone().prop_map(|nums| Op::Create { nums }),
        (1u32..=3, nums).prop_map(|(service, nums)| Op::Update { service, nums }),
        (1u32..=3, any::<bool>()).prop_map(|(service, exact)| Op::Activate { service, exact }),
        (1u32..=3, 0u8..3, 0u8..6, 1u32..=3).prop_map(|(service, operator, instance, agent)| {
            Op::Register {
                service,
                operator,
                instance,
                agent,
            }
        }),
        (1u32..=3).prop_map(|service| Op::Deploy { service }),
        (1u32..=3).prop_map(|service| Op::Terminate { service }),
        (1u32..=3, 0u8..3).prop_map(|(service, operator)| Op::Unbond { service, operator }),
        (1u32..=3, 0u8..6, 0u128..400).prop_map(|(service, instance, amount)| Op::Slash {
            service,
            instance,
            amount
        }),
        any::<bool>().prop_map(|paused| Op::Pause { paused }),
    ]
}

const BONDS: [Balance; 2] = [100, 300];

fn operator(i: u8) -> AccountId {
    acct(&format!("op{i}.near"))
}

fn instance(i: u8) -> AccountId {
    acct(&format!("inst{i}.near"))
}

fn sid(n: u32) -> ServiceId {
    ServiceId::new(n).unwrap()
}

fn apply(
    reg: &mut ServiceRegistry,
    factory: &mut LocalMultisigFactory,
    step: usize,
    op: &Op,
) -> Result<(), RegistryError> {
    let owner = call("owner.near");
    let hash = u8::try_from(step % 250 + 1).unwrap_or(1);
    match op {
        Op::Create { nums } => reg
            .create(
                &owner,
                acct("owner.near"),
                TokenMetadata::titled("svc"),
                Currency::Native,
                config(hash, *nums, BONDS),
            )
            .map(drop),
        Op::Update { service, nums } => reg.update(&owner, sid(*service), config(hash, *nums, BONDS)),
        Op::Activate { service, exact } => {
            let stake = reg
                .get_service(sid(*service))
                .map(|s| s.security_deposit)
                .unwrap_or(0);
            let attached = if *exact { stake } else { stake + 1 };
            reg.activate_registration(&owner.clone().with_deposit(attached), sid(*service))
        }
        Op::Register {
            service,
            operator: op_index,
            instance: inst,
            agent,
        } => {
            let bond = reg
                .get_service(sid(*service))
                .ok()
                .and_then(|s| AgentId::new(*agent).ok().and_then(|a| s.bonds.slot(a)).map(|slot| slot.bond))
                .unwrap_or(0);
            reg.register_agents(
                &CallContext::new(operator(*op_index)).with_deposit(bond),
                sid(*service),
                &[instance(*inst)],
                &[*agent],
            )
            .map(drop)
        }
        Op::Deploy { service } => reg
            .deploy(&owner, sid(*service), &acct(&format!("w{step}")), factory)
            .map(drop),
        Op::Terminate { service } => reg.terminate(&owner, sid(*service)).map(drop),
        Op::Unbond {
            service,
            operator: op_index,
        } => reg
            .unbond(&CallContext::new(operator(*op_index)), sid(*service))
            .map(drop),
        Op::Slash {
            service,
            instance: inst,
            amount,
        } => {
            let multisig = reg
                .get_service_multisig(sid(*service))
                .ok()
                .flatten()
                .unwrap_or_else(|| acct("nobody.near"));
            reg.slash(
                &CallContext::new(multisig),
                sid(*service),
                &[instance(*inst)],
                &[*amount],
            )
            .map(drop)
        }
        Op::Pause { paused } => reg.set_paused(&call("admin.near"), *paused),
    }
}

fn check_invariants(reg: &ServiceRegistry) -> Result<(), TestCaseError> {
    let mut backed: Balance = 0;
    for service in reg.services() {
        prop_assert!(
            service.bonds.is_consistent(),
            "service {} bond book inconsistent",
            service.id
        );
        if service.currency == Currency::Native {
            backed += service.stake_held + service.bonds.aggregate();
        }
        let expected_stake = match service.state {
            ServiceState::PreRegistration | ServiceState::TerminatedBonded => 0,
            _ => service.security_deposit,
        };
        prop_assert_eq!(service.stake_held, expected_stake);
        if service.state == ServiceState::PreRegistration {
            prop_assert_eq!(service.bonds.aggregate(), 0);
        }
    }
    backed += reg.get_registry_slashed_funds(&Currency::Native);
    prop_assert_eq!(reg.get_registry_balance(), backed);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_sequences_keep_ledger_invariants(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut reg = registry();
        let mut factory = LocalMultisigFactory::new(acct("factory.near"));
        for (step, op) in ops.iter().enumerate() {
            let before = snapshot(&reg);
            if let Err(err) = apply(&mut reg, &mut factory, step, op) {
                prop_assert_eq!(snapshot(&reg), before, "{:?} rejected with {:?} but changed state", op, err);
            }
            check_invariants(&reg)?;
        }
    }
}
