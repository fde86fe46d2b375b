//! # Registry Workspace
//!
//! The CLI keeps the registry and a local multisig factory together in one
//! JSON file (default `.svcreg/registry.json`). Every mutating subcommand
//! loads the file, runs one registry call and writes the file back only when
//! the call committed.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use svcreg_core::{AccountId, Balance};
use svcreg_ledger::Payout;
use svcreg_registry::{CallContext, LocalMultisigFactory, RegistryError, ServiceRegistry};

/// Default location of the workspace file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".svcreg/registry.json";

/// Persisted CLI state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    /// The registry.
    pub registry: ServiceRegistry,
    /// Wallets created by `deploy`.
    pub factory: LocalMultisigFactory,
}

impl Workspace {
    /// Read a workspace file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "registry not initialized: {} (run `svcreg init` first)",
                path.display()
            );
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse workspace file {}", path.display()))
    }

    /// Write the workspace file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "workspace saved");
        Ok(())
    }
}

/// Global flags shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Session {
    /// Workspace file.
    pub state: PathBuf,
    /// Account issuing the call.
    pub caller: Option<AccountId>,
    /// Native deposit attached to the call.
    pub deposit: Balance,
}

impl Session {
    /// The `--caller` account; mutating subcommands require it.
    pub fn caller(&self) -> Result<AccountId> {
        match &self.caller {
            Some(caller) => Ok(caller.clone()),
            None => bail!("--caller is required for this command"),
        }
    }

    /// Call context for the registry.
    pub fn context(&self) -> Result<CallContext> {
        Ok(CallContext::new(self.caller()?).with_deposit(self.deposit))
    }

    /// Load the workspace.
    pub fn load(&self) -> Result<Workspace> {
        Workspace::load(&self.state)
    }

    /// Run one registry call and persist the workspace if it committed.
    ///
    /// A failed token transfer is persisted too: its compensating credit is
    /// part of the committed state even though the call reports an error.
    pub fn mutate<T>(
        &self,
        call: impl FnOnce(&mut Workspace, &CallContext) -> Result<T, RegistryError>,
    ) -> Result<T> {
        let ctx = self.context()?;
        let mut workspace = self.load()?;
        match call(&mut workspace, &ctx) {
            Ok(value) => {
                workspace.save(&self.state)?;
                Ok(value)
            }
            Err(err @ RegistryError::TokenTransferFailed { .. }) => {
                workspace.save(&self.state)?;
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Human-readable description of a payout.
pub fn describe_payout(payout: &Payout) -> String {
    match payout {
        Payout::Settled { receiver, amount } => format!("sent {amount} to {receiver}"),
        Payout::Pending { id, amount } => format!("{id} pending for {amount}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svcreg_core::RegistryMetadata;
    use svcreg_ledger::TransferId;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn workspace() -> Workspace {
        Workspace {
            registry: ServiceRegistry::new(
                acct("registry.near"),
                acct("admin.near"),
                acct("factory.near"),
                RegistryMetadata::new("Service Registry", "SR"),
            )
            .unwrap(),
            factory: LocalMultisigFactory::new(acct("factory.near")),
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("registry.json");
        workspace().save(&path).unwrap();
        let loaded = Workspace::load(&path).unwrap();
        assert_eq!(loaded.registry, workspace().registry);
    }

    #[test]
    fn load_missing_workspace_mentions_init() {
        let dir = tempfile::tempdir().unwrap();
        let err = Workspace::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("svcreg init"), "got: {err}");
    }

    #[test]
    fn mutate_requires_caller() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session {
            state: dir.path().join("registry.json"),
            caller: None,
            deposit: 0,
        };
        let err = session.mutate(|_, _| Ok(())).unwrap_err();
        assert!(err.to_string().contains("--caller"), "got: {err}");
    }

    #[test]
    fn failed_call_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        workspace().save(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        let session = Session {
            state: path.clone(),
            caller: Some(acct("stranger.near")),
            deposit: 0,
        };
        assert!(session
            .mutate(|ws, ctx| ws.registry.set_paused(ctx, true))
            .is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn payout_descriptions() {
        let settled = Payout::Settled {
            receiver: acct("op.near"),
            amount: 5,
        };
        assert_eq!(describe_payout(&settled), "sent 5 to op.near");
        let pending = Payout::Pending {
            id: TransferId::new(3),
            amount: 5,
        };
        assert_eq!(describe_payout(&pending), "transfer:3 pending for 5");
    }
}
