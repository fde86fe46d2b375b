//! # Service Lifecycle Subcommands
//!
//! One subcommand per lifecycle operation. Each loads the workspace, issues
//! the call as `--caller` with `--deposit` attached, and saves on success.
//!
//! ```text
//! svcreg --caller owner.near create --config-hash <hex> --agent-ids 1 --num-instances 4 --bonds 1000 --threshold 3
//! svcreg --caller owner.near --deposit 1000 activate 1
//! svcreg --caller op.near --deposit 1000 register 1 --instances i1.near --agent-ids 1
//! svcreg --caller owner.near deploy 1 --name wallet
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use svcreg_core::{AccountId, Balance, ConfigHash, Currency, ServiceId, TokenMetadata};
use svcreg_registry::ServiceConfig;

use crate::workspace::{describe_payout, Session};

// ── Shared configuration flags ─────────────────────────────────────────

/// Service configuration flags shared by `create` and `update`.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration hash as 64 hex characters.
    #[arg(long, conflicts_with = "config_file")]
    pub config_hash: Option<ConfigHash>,

    /// Configuration document; its SHA-256 becomes the configuration hash.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Agent role ids, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub agent_ids: Vec<u32>,

    /// Instances per role, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub num_instances: Vec<u32>,

    /// Bond per instance per role, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub bonds: Vec<Balance>,

    /// Multisig confirmation threshold.
    #[arg(long)]
    pub threshold: u32,
}

impl ConfigArgs {
    /// Build the registry-level configuration.
    pub fn to_config(&self) -> Result<ServiceConfig> {
        let config_hash = match (&self.config_hash, &self.config_file) {
            (Some(hash), _) => *hash,
            (None, Some(path)) => {
                let document = std::fs::read(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                ConfigHash::of_document(&document)
                    .with_context(|| format!("cannot derive a hash from {}", path.display()))?
            }
            (None, None) => bail!("one of --config-hash or --config-file is required"),
        };
        Ok(ServiceConfig {
            config_hash,
            agent_ids: self.agent_ids.clone(),
            agent_num_instances: self.num_instances.clone(),
            agent_bonds: self.bonds.clone(),
            threshold: self.threshold,
        })
    }
}

// ── create / update ────────────────────────────────────────────────────

/// Arguments for `svcreg create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Service owner; defaults to the caller.
    #[arg(long)]
    pub owner: Option<AccountId>,

    /// Token title.
    #[arg(long, default_value = "service")]
    pub title: String,

    /// Token description.
    #[arg(long)]
    pub description: Option<String>,

    /// Settle in this fungible token instead of the native currency.
    #[arg(long)]
    pub token: Option<AccountId>,

    /// Service configuration.
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Execute `svcreg create`.
pub fn run_create(args: &CreateArgs, session: &Session) -> Result<u8> {
    let config = args.config.to_config()?;
    let owner = match &args.owner {
        Some(owner) => owner.clone(),
        None => session.caller()?,
    };
    let mut metadata = TokenMetadata::titled(&args.title);
    metadata.description = args.description.clone();
    let currency = Currency::from(args.token.clone());

    let id = session.mutate(|ws, ctx| {
        ws.registry
            .create(ctx, owner.clone(), metadata, currency.clone(), config)
    })?;
    println!("OK: created service {id} owned by {owner} (currency {currency})");
    Ok(0)
}

/// Arguments for `svcreg update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Service id.
    pub service_id: ServiceId,

    /// New service configuration.
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Execute `svcreg update`.
pub fn run_update(args: &UpdateArgs, session: &Session) -> Result<u8> {
    let config = args.config.to_config()?;
    let hash = config.config_hash;
    session.mutate(|ws, ctx| ws.registry.update(ctx, args.service_id, config))?;
    println!("OK: service {} now at configuration {hash}", args.service_id);
    Ok(0)
}

// ── activation, registration, deployment ───────────────────────────────

/// Arguments for subcommands that only name a service.
#[derive(Args, Debug)]
pub struct ServiceArgs {
    /// Service id.
    pub service_id: ServiceId,
}

/// Execute `svcreg activate`.
pub fn run_activate(args: &ServiceArgs, session: &Session) -> Result<u8> {
    session.mutate(|ws, ctx| ws.registry.activate_registration(ctx, args.service_id))?;
    println!("OK: service {} open for registration", args.service_id);
    Ok(0)
}

/// Arguments for `svcreg register`.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Service id.
    pub service_id: ServiceId,

    /// Agent instance accounts, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub instances: Vec<AccountId>,

    /// Role of each instance, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub agent_ids: Vec<u32>,
}

/// Execute `svcreg register`.
pub fn run_register(args: &RegisterArgs, session: &Session) -> Result<u8> {
    let state = session.mutate(|ws, ctx| {
        ws.registry
            .register_agents(ctx, args.service_id, &args.instances, &args.agent_ids)
    })?;
    println!(
        "OK: registered {} instance(s) in service {}; state {state}",
        args.instances.len(),
        args.service_id
    );
    Ok(0)
}

/// Arguments for `svcreg deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Service id.
    pub service_id: ServiceId,

    /// Wallet name to create, or an existing wallet of the factory to reuse.
    #[arg(long)]
    pub name: AccountId,
}

/// Execute `svcreg deploy`.
pub fn run_deploy(args: &DeployArgs, session: &Session) -> Result<u8> {
    let multisig = session.mutate(|ws, ctx| {
        ws.registry
            .deploy(ctx, args.service_id, &args.name, &mut ws.factory)
    })?;
    println!("OK: service {} deployed with multisig {multisig}", args.service_id);
    Ok(0)
}

// ── termination ────────────────────────────────────────────────────────

/// Execute `svcreg terminate`.
pub fn run_terminate(args: &ServiceArgs, session: &Session) -> Result<u8> {
    let refund = session.mutate(|ws, ctx| ws.registry.terminate(ctx, args.service_id))?;
    match refund {
        Some(payout) => println!(
            "OK: service {} terminated; stake {}",
            args.service_id,
            describe_payout(&payout)
        ),
        None => println!("OK: service {} terminated", args.service_id),
    }
    Ok(0)
}

/// Execute `svcreg unbond`.
pub fn run_unbond(args: &ServiceArgs, session: &Session) -> Result<u8> {
    let payout = session.mutate(|ws, ctx| ws.registry.unbond(ctx, args.service_id))?;
    println!(
        "OK: unbonded from service {}; {}",
        args.service_id,
        describe_payout(&payout)
    );
    Ok(0)
}

/// Arguments for `svcreg slash`.
#[derive(Args, Debug)]
pub struct SlashArgs {
    /// Service id.
    pub service_id: ServiceId,

    /// Misbehaving instances, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub instances: Vec<AccountId>,

    /// Amount to slash per instance, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub amounts: Vec<Balance>,
}

/// Execute `svcreg slash`.
pub fn run_slash(args: &SlashArgs, session: &Session) -> Result<u8> {
    let total = session.mutate(|ws, ctx| {
        ws.registry
            .slash(ctx, args.service_id, &args.instances, &args.amounts)
    })?;
    println!("OK: slashed {total} in service {}", args.service_id);
    Ok(0)
}
