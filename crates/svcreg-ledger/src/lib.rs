#![deny(missing_docs)]

//! # svcreg-ledger — Bonds and Settlement
//!
//! Two bookkeeping components the registry composes inside every call:
//!
//! - [`BondBook`]: one per service. Role slots, per-operator bonds and the
//!   aggregate bonded amount. Knows nothing about currencies.
//! - [`TokenGateway`]: one per registry. Where the value physically sits:
//!   native balance, token holdings, per-account token deposits, slashed
//!   funds and outbound token transfers awaiting confirmation.
//!
//! Neither component authorizes callers or checks lifecycle state; that is
//! the registry's job.

pub mod bond_book;
pub mod error;
pub mod gateway;

pub use bond_book::{AgentInstance, AgentSlot, BondBook, OperatorBond, Unbonded};
pub use error::LedgerError;
pub use gateway::{
    DepositMemo, PendingTransfer, Payout, TokenAccount, TokenGateway, TransferId, TransferOutcome,
    TransferPurpose,
};
