//! # svcreg-cli — Service Registry Command-Line Interface
//!
//! Drives a registry kept in a local JSON workspace file. Every mutating
//! subcommand is one registry call issued as `--caller` with `--deposit`
//! attached.
//!
//! ## Subcommands
//!
//! - `init`, `pause`: registry administration
//! - `create`, `update`, `activate`, `register`, `deploy`, `terminate`,
//!   `unbond`, `slash`: service lifecycle
//! - `storage-deposit`, `storage-withdraw`, `ft-notify`, `resolve`,
//!   `withdraw`, `drain`: token settlement
//! - `status`, `list`, `operator`: inspection
//!
//! ## Crate Policy
//!
//! - Argument parsing lives next to its handler; `main.rs` only dispatches.
//! - Handlers delegate to `svcreg-registry`; no business rules here.
//! - Handlers return an exit code and print one `OK:` line on success.

pub mod admin;
pub mod inspect;
pub mod lifecycle;
pub mod token;
pub mod workspace;
