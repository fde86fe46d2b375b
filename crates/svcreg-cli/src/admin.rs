//! # Registry Administration
//!
//! - `init`: create a workspace file from a YAML config and/or flags.
//! - `pause`: pause or resume creation and registration.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use svcreg_core::{AccountId, RegistryMetadata};
use svcreg_registry::{LocalMultisigFactory, RegistryConfig};

use crate::workspace::{Session, Workspace};

/// Arguments for `svcreg init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// YAML registry config. Flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// The registry's own account.
    #[arg(long)]
    pub account: Option<AccountId>,

    /// Registry owner.
    #[arg(long)]
    pub owner: Option<AccountId>,

    /// Multisig factory account.
    #[arg(long)]
    pub multisig_factory: Option<AccountId>,

    /// Registry token name, used without a config file.
    #[arg(long, default_value = "Service Registry")]
    pub name: String,

    /// Registry token symbol, used without a config file.
    #[arg(long, default_value = "SR")]
    pub symbol: String,

    /// Overwrite an existing workspace file.
    #[arg(long)]
    pub force: bool,
}

/// Execute `svcreg init`.
pub fn run_init(args: &InitArgs, session: &Session) -> Result<u8> {
    if session.state.exists() && !args.force {
        bail!(
            "workspace already exists: {} (use --force to overwrite)",
            session.state.display()
        );
    }

    let mut config = match &args.config {
        Some(path) => RegistryConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            let (Some(account), Some(owner), Some(multisig_factory)) = (
                args.account.clone(),
                args.owner.clone(),
                args.multisig_factory.clone(),
            ) else {
                bail!("without --config, --account, --owner and --multisig-factory are required");
            };
            RegistryConfig {
                account,
                owner,
                multisig_factory,
                metadata: RegistryMetadata::new(&args.name, &args.symbol),
            }
        }
    };
    config = config.apply_env()?;
    if let Some(account) = &args.account {
        config.account = account.clone();
    }
    if let Some(owner) = &args.owner {
        config.owner = owner.clone();
    }
    if let Some(factory) = &args.multisig_factory {
        config.multisig_factory = factory.clone();
    }

    let factory = LocalMultisigFactory::new(config.multisig_factory.clone());
    let registry = config.into_registry()?;
    let summary = format!(
        "registry {} owned by {} (factory {})",
        registry.account(),
        registry.owner(),
        registry.multisig_factory()
    );
    Workspace { registry, factory }.save(&session.state)?;

    println!("OK: initialized {summary} at {}", session.state.display());
    Ok(0)
}

/// Arguments for `svcreg pause`.
#[derive(Args, Debug)]
pub struct PauseArgs {
    /// Resume instead of pausing.
    #[arg(long)]
    pub resume: bool,
}

/// Execute `svcreg pause`.
pub fn run_pause(args: &PauseArgs, session: &Session) -> Result<u8> {
    let paused = !args.resume;
    session.mutate(|ws, ctx| ws.registry.set_paused(ctx, paused))?;
    if paused {
        println!("OK: registry paused");
    } else {
        println!("OK: registry resumed");
    }
    Ok(0)
}
