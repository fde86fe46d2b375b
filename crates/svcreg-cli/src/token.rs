//! # Token Settlement Subcommands
//!
//! Storage registration, transfer notifications, withdrawals, drains and
//! transfer resolution. `ft-notify` and `resolve` stand in for the token
//! contract and the registry host respectively, so `--caller` must be the
//! token contract or the registry account.

use anyhow::Result;
use clap::{Args, ValueEnum};

use svcreg_core::{AccountId, Balance, Currency};
use svcreg_ledger::{TransferId, TransferOutcome};

use crate::workspace::{describe_payout, Session};

/// Arguments for `svcreg storage-deposit`.
#[derive(Args, Debug)]
pub struct StorageDepositArgs {
    /// Token contract.
    #[arg(long)]
    pub token: AccountId,

    /// Account to register; defaults to the caller.
    #[arg(long)]
    pub account: Option<AccountId>,
}

/// Execute `svcreg storage-deposit`.
pub fn run_storage_deposit(args: &StorageDepositArgs, session: &Session) -> Result<u8> {
    let added = session.mutate(|ws, ctx| {
        ws.registry
            .storage_deposit(ctx, args.account.clone(), &args.token)
    })?;
    if added {
        println!("OK: registered for token {}", args.token);
    } else {
        println!("OK: already registered for token {}", args.token);
    }
    Ok(0)
}

/// Arguments for subcommands that name a token.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Token contract.
    #[arg(long)]
    pub token: AccountId,
}

/// Execute `svcreg storage-withdraw`.
pub fn run_storage_withdraw(args: &TokenArgs, session: &Session) -> Result<u8> {
    session.mutate(|ws, ctx| ws.registry.storage_withdraw(ctx, &args.token))?;
    println!("OK: unregistered from token {}", args.token);
    Ok(0)
}

/// Execute `svcreg withdraw`.
pub fn run_withdraw(args: &TokenArgs, session: &Session) -> Result<u8> {
    let payout = session.mutate(|ws, ctx| ws.registry.withdraw(ctx, &args.token))?;
    println!("OK: withdrew {} {}; {}", payout.amount(), args.token, describe_payout(&payout));
    Ok(0)
}

/// Arguments for `svcreg ft-notify`.
#[derive(Args, Debug)]
pub struct FtNotifyArgs {
    /// Account that sent the tokens.
    #[arg(long)]
    pub sender: AccountId,

    /// Amount transferred.
    #[arg(long)]
    pub amount: Balance,

    /// Transfer memo: empty, or `{"service_id": N}`.
    #[arg(long, default_value = "")]
    pub msg: String,
}

/// Execute `svcreg ft-notify`.
pub fn run_ft_notify(args: &FtNotifyArgs, session: &Session) -> Result<u8> {
    let unused = session.mutate(|ws, ctx| {
        ws.registry
            .ft_on_transfer(ctx, &args.sender, args.amount, &args.msg)
    })?;
    let accepted = args.amount - unused;
    println!("OK: accepted {accepted} from {}, returned {unused}", args.sender);
    Ok(0)
}

/// Transfer outcome as given on the command line.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutcomeArg {
    /// The tokens arrived.
    Succeeded,
    /// The token contract rejected the transfer.
    Failed,
}

impl From<OutcomeArg> for TransferOutcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Succeeded => TransferOutcome::Succeeded,
            OutcomeArg::Failed => TransferOutcome::Failed,
        }
    }
}

/// Arguments for `svcreg resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Transfer number, as shown by `status` or the payout message.
    pub transfer: u64,

    /// What the token contract reported.
    #[arg(long, value_enum)]
    pub outcome: OutcomeArg,
}

/// Execute `svcreg resolve`.
pub fn run_resolve(args: &ResolveArgs, session: &Session) -> Result<u8> {
    let id = TransferId::new(args.transfer);
    session.mutate(|ws, ctx| ws.registry.resolve_transfer(ctx, id, args.outcome.into()))?;
    println!("OK: {id} settled");
    Ok(0)
}

/// Arguments for `svcreg drain`.
#[derive(Args, Debug)]
pub struct DrainArgs {
    /// Drain slashed funds of this token instead of the native currency.
    #[arg(long)]
    pub token: Option<AccountId>,
}

/// Execute `svcreg drain`.
pub fn run_drain(args: &DrainArgs, session: &Session) -> Result<u8> {
    let currency = Currency::from(args.token.clone());
    let payout = session.mutate(|ws, ctx| ws.registry.drain(ctx, &currency))?;
    println!("OK: drained {currency}; {}", describe_payout(&payout));
    Ok(0)
}
