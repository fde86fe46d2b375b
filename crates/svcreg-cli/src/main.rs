//! # svcreg CLI entry point
//!
//! Parses global flags, initializes tracing and dispatches to the
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use svcreg_cli::admin::{run_init, run_pause, InitArgs, PauseArgs};
use svcreg_cli::inspect::{run_list, run_operator, run_status, ListArgs, OperatorArgs, StatusArgs};
use svcreg_cli::lifecycle::{
    run_activate, run_create, run_deploy, run_register, run_slash, run_terminate, run_unbond,
    run_update, CreateArgs, DeployArgs, RegisterArgs, ServiceArgs, SlashArgs, UpdateArgs,
};
use svcreg_cli::token::{
    run_drain, run_ft_notify, run_resolve, run_storage_deposit, run_storage_withdraw,
    run_withdraw, DrainArgs, FtNotifyArgs, ResolveArgs, StorageDepositArgs, TokenArgs,
};
use svcreg_cli::workspace::{Session, DEFAULT_STATE_FILE};
use svcreg_core::{AccountId, Balance};

/// Service registry CLI.
///
/// Creates services, registers and bonds agent instances, deploys service
/// multisigs and settles bonds in native currency or fungible tokens.
#[derive(Parser, Debug)]
#[command(name = "svcreg", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Workspace file holding the registry state.
    #[arg(long, global = true, default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Account issuing the call.
    #[arg(long, global = true)]
    caller: Option<AccountId>,

    /// Native amount attached to the call.
    #[arg(long, global = true, default_value_t = 0)]
    deposit: Balance,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a registry workspace.
    Init(InitArgs),
    /// Pause or resume the registry.
    Pause(PauseArgs),
    /// Create a service.
    Create(CreateArgs),
    /// Replace a service configuration (PreRegistration, no bonds).
    Update(UpdateArgs),
    /// Pay the activation stake and open registration.
    Activate(ServiceArgs),
    /// Register and bond agent instances as the caller.
    Register(RegisterArgs),
    /// Create or attach the service multisig.
    Deploy(DeployArgs),
    /// Terminate a service and refund its stake.
    Terminate(ServiceArgs),
    /// Withdraw the caller's bonds from a terminated service.
    Unbond(ServiceArgs),
    /// Slash bonds of misbehaving instances (service multisig only).
    Slash(SlashArgs),
    /// Register an account for token deposits.
    StorageDeposit(StorageDepositArgs),
    /// Unregister the caller from token deposits.
    StorageWithdraw(TokenArgs),
    /// Deliver a token transfer notification (caller is the token).
    FtNotify(FtNotifyArgs),
    /// Resolve a pending token transfer (caller is the registry).
    Resolve(ResolveArgs),
    /// Withdraw the caller's token deposit balance.
    Withdraw(TokenArgs),
    /// Send slashed funds to the registry owner.
    Drain(DrainArgs),
    /// Show the registry or one service.
    Status(StatusArgs),
    /// List services.
    List(ListArgs),
    /// Show an operator's bonds and instances.
    Operator(OperatorArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!(state = %cli.state.display(), "svcreg starting");

    let session = Session {
        state: cli.state,
        caller: cli.caller,
        deposit: cli.deposit,
    };

    let result = match cli.command {
        Commands::Init(args) => run_init(&args, &session),
        Commands::Pause(args) => run_pause(&args, &session),
        Commands::Create(args) => run_create(&args, &session),
        Commands::Update(args) => run_update(&args, &session),
        Commands::Activate(args) => run_activate(&args, &session),
        Commands::Register(args) => run_register(&args, &session),
        Commands::Deploy(args) => run_deploy(&args, &session),
        Commands::Terminate(args) => run_terminate(&args, &session),
        Commands::Unbond(args) => run_unbond(&args, &session),
        Commands::Slash(args) => run_slash(&args, &session),
        Commands::StorageDeposit(args) => run_storage_deposit(&args, &session),
        Commands::StorageWithdraw(args) => run_storage_withdraw(&args, &session),
        Commands::FtNotify(args) => run_ft_notify(&args, &session),
        Commands::Resolve(args) => run_resolve(&args, &session),
        Commands::Withdraw(args) => run_withdraw(&args, &session),
        Commands::Drain(args) => run_drain(&args, &session),
        Commands::Status(args) => run_status(&args, &session),
        Commands::List(args) => run_list(&args, &session),
        Commands::Operator(args) => run_operator(&args, &session),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
