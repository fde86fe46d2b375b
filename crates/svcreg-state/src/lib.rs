#![deny(missing_docs)]

//! # svcreg-state — Service Lifecycle State Machine
//!
//! A service cycles through five states:
//!
//! ```text
//! PreRegistration ──activate──▶ ActiveRegistration ──register (last slot)──▶ FinishedRegistration
//!        ▲  │ update                  │ register                                 │ deploy
//!        │  ▼                         ▼                                          ▼
//!        │  PreRegistration      ActiveRegistration                           Deployed
//!        │                                                                       │
//!        └──── terminate (no bonds) / last unbond ◀── TerminatedBonded ◀── terminate
//! ```
//!
//! [`lifecycle::next_state`] is the single pure transition function. It sees
//! only the current state and an [`Operation`] carrying the guard facts the
//! caller computed (whether slots are filled, whether bonds remain). Ledger
//! checks live in `svcreg-ledger`; authorization lives in `svcreg-registry`.
//!
//! [`ConfigHistory`] is the append-only record of superseded configuration
//! hashes.

pub mod config_history;
pub mod lifecycle;

pub use config_history::ConfigHistory;
pub use lifecycle::{next_state, Operation, ServiceState, TransitionError, TransitionRecord};
