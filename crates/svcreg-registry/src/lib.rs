#![deny(missing_docs)]

//! # svcreg-registry — Service Registry
//!
//! The registry owns every service record, mints one token per service and
//! drives each service through its lifecycle:
//!
//! ```text
//! create ─▶ PreRegistration ─activate─▶ ActiveRegistration ─register (last slot)─▶ FinishedRegistration
//!               ▲                                                                       │ deploy
//!               │ unbond (last operator)                                                ▼
//!           TerminatedBonded ◀──────────────── terminate ─────────────────────────── Deployed
//! ```
//!
//! ## Design Principles
//!
//! 1. **All or nothing.** Every mutating call runs against a snapshot and is
//!    rolled back on error. A failed call never leaves partial effects and
//!    its events are never emitted.
//!
//! 2. **Explicit caller.** Every mutating call takes a [`CallContext`] naming
//!    the predecessor account and the attached native deposit. Authorization
//!    is checked against it, never against ambient state.
//!
//! 3. **Composition over inheritance.** Lifecycle rules come from
//!    `svcreg-state`, bond bookkeeping and settlement from `svcreg-ledger`.
//!    This crate sequences them and owns nothing they already model.
//!
//! 4. **Pluggable deployment.** Multisig creation goes through the
//!    [`MultisigFactory`] trait; [`LocalMultisigFactory`] keeps wallets in
//!    process.

mod admin;
pub mod config;
pub mod context;
pub mod deployment;
pub mod error;
pub mod events;
pub mod registry;
pub mod service;
mod settlement;
pub mod store;
mod views;

pub use config::{ConfigError, RegistryConfig};
pub use context::CallContext;
pub use deployment::{DeploymentError, LocalMultisigFactory, LocalWallet, MultisigFactory, MultisigMember};
pub use error::RegistryError;
pub use events::{EventRecord, RegistryEvent};
pub use registry::{ServiceRegistry, EVENT_BUFFER_CAPACITY};
pub use service::{Service, ServiceConfig, TRANSITION_LOG_CAPACITY};
pub use store::ServiceStore;
