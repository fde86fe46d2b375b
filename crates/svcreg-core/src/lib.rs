#![deny(missing_docs)]

//! # svcreg-core — Foundational Types for the Service Registry
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies; only `serde`, `thiserror`, `sha2` and `hex` from
//! the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** An [`AccountId`] is not a
//!    `String`, a [`ServiceId`] is not an [`AgentId`]. Constructors validate.
//!
//! 2. **[`ConfigHash`] is never zero.** The all-zero fingerprint is rejected at
//!    construction, so every stored hash is meaningful.
//!
//! 3. **[`Currency`] is fixed per service.** Amounts are plain [`Balance`]
//!    integers; the currency travels alongside them.
//!
//! 4. **[`ValidationError`]** carries the offending value for every rejected
//!    primitive. No `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod agents;
pub mod config_hash;
pub mod currency;
pub mod error;
pub mod identity;
pub mod metadata;

pub use agents::{quorum_floor, security_deposit, total_instances, AgentParams};
pub use config_hash::ConfigHash;
pub use currency::{Balance, Currency};
pub use error::ValidationError;
pub use identity::{AccountId, AgentId, ServiceId};
pub use metadata::{RegistryMetadata, TokenMetadata, NFT_METADATA_SPEC};
