//! # Inspection Subcommands
//!
//! Read-only views over the workspace: `status`, `list` and `operator`.
//! None of them need `--caller` except `operator` without `--operator`.

use anyhow::Result;
use clap::Args;

use svcreg_core::{AccountId, ServiceId};

use crate::workspace::Session;

/// Arguments for `svcreg status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Service id; omit for a registry summary.
    pub service_id: Option<ServiceId>,

    /// Print the service record as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `svcreg status`.
pub fn run_status(args: &StatusArgs, session: &Session) -> Result<u8> {
    let ws = session.load()?;
    let registry = &ws.registry;

    let Some(service_id) = args.service_id else {
        println!("Registry: {} v{}", registry.account(), registry.version());
        println!("  Owner: {}", registry.owner());
        println!("  Multisig factory: {}", registry.multisig_factory());
        println!("  Paused: {}", registry.is_paused());
        println!("  Services: {}", registry.total_supply());
        println!("  Native balance: {}", registry.get_registry_balance());
        println!("  Storage usage: {} bytes", registry.get_storage_usage()?);
        let pending = registry.pending_transfers();
        println!("  Pending transfers: {}", pending.len());
        for t in pending {
            println!("    {} {} {} -> {}", t.id, t.amount, t.token, t.receiver);
        }
        return Ok(0);
    };

    let service = registry.get_service(service_id)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(service)?);
        return Ok(0);
    }

    println!("Service: {service_id}");
    println!("  Owner: {}", service.owner);
    println!("  State: {}", service.state);
    println!("  Currency: {}", service.currency);
    println!("  Config hash: {}", service.config_hash());
    println!("  Previous hashes: {}", service.config.previous().len());
    println!("  Threshold: {} of {}", service.threshold, service.bonds.max_instances()?);
    println!("  Security deposit: {}", service.security_deposit);
    println!("  Total bonded: {}", service.bonds.aggregate());
    if let Some(multisig) = &service.multisig {
        println!("  Multisig: {multisig}");
    }
    for params in service.bonds.params() {
        let filled = service
            .bonds
            .slot(params.agent_id)
            .map_or(0, |s| s.instances.len());
        println!(
            "  Agent {}: {filled}/{} instances, bond {}",
            params.agent_id, params.num_instances, params.bond
        );
    }
    println!("  Transitions: {}", service.transition_log.len());
    for (i, t) in service.transition_log.iter().enumerate() {
        println!(
            "    [{i}] {} → {} via {} at {}",
            t.from_state,
            t.to_state,
            t.operation.name(),
            t.timestamp
        );
    }
    Ok(0)
}

/// Arguments for `svcreg list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only services owned by this account.
    #[arg(long)]
    pub owner: Option<AccountId>,
}

/// Execute `svcreg list`.
pub fn run_list(args: &ListArgs, session: &Session) -> Result<u8> {
    let ws = session.load()?;
    let services: Vec<_> = match &args.owner {
        Some(owner) => ws.registry.services_owned_by(owner).collect(),
        None => ws.registry.services().collect(),
    };

    if services.is_empty() {
        println!("No services found.");
        return Ok(0);
    }
    println!("Services ({}):", services.len());
    for s in services {
        println!("  {}: {} (owner {}, {})", s.id, s.state, s.owner, s.currency);
    }
    Ok(0)
}

/// Arguments for `svcreg operator`.
#[derive(Args, Debug)]
pub struct OperatorArgs {
    /// Service id.
    pub service_id: ServiceId,

    /// Operator to show; defaults to the caller.
    #[arg(long)]
    pub operator: Option<AccountId>,
}

/// Execute `svcreg operator`.
pub fn run_operator(args: &OperatorArgs, session: &Session) -> Result<u8> {
    let operator = match &args.operator {
        Some(operator) => operator.clone(),
        None => session.caller()?,
    };
    let ws = session.load()?;
    let balance = ws.registry.get_operator_balance(&operator, args.service_id)?;
    let instances = ws
        .registry
        .get_operator_service_agent_instances(&operator, args.service_id)?;

    println!("Operator {operator} in service {}", args.service_id);
    println!("  Bond: {balance}");
    println!(
        "  Whitelisted: {}",
        ws.registry.is_operator_whitelisted(args.service_id, &operator)?
    );
    for i in instances {
        println!("  {} (agent {})", i.instance, i.agent_id);
    }
    Ok(0)
}
