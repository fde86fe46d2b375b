//! # Multisig Deployment
//!
//! Defines the [`MultisigFactory`] trait the registry calls when a service
//! with all slots filled is deployed. The factory either creates a new wallet
//! owned by the registered agent instances, or reports the members of a
//! wallet it created earlier so the registry can re-attach it.
//!
//! ## Implementations
//!
//! | Factory | Description |
//! |---------|-------------|
//! | [`LocalMultisigFactory`] | In-process wallet book, persisted with the CLI state |
//!
//! Methods are synchronous. The registry treats a factory error as a failed
//! deployment and leaves the service in FinishedRegistration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use svcreg_core::AccountId;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors reported by a multisig factory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeploymentError {
    /// A wallet with this address already exists.
    #[error("multisig {address} already exists")]
    AlreadyExists {
        /// The address.
        address: AccountId,
    },

    /// No wallet at this address.
    #[error("multisig {address} not found")]
    NotFound {
        /// The address.
        address: AccountId,
    },

    /// Threshold is zero or exceeds the member count.
    #[error("threshold {threshold} invalid for {members} members")]
    InvalidThreshold {
        /// Requested threshold.
        threshold: u32,
        /// Number of members.
        members: usize,
    },

    /// The factory refused for another reason.
    #[error("factory rejected the request: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A member of a multisig wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MultisigMember {
    /// An account allowed to confirm requests.
    Account {
        /// The member account.
        account_id: AccountId,
    },
}

impl MultisigMember {
    /// Member for an account.
    pub fn account(account_id: AccountId) -> Self {
        Self::Account { account_id }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Creates multisig wallets and reports their members.
pub trait MultisigFactory: Send + Sync {
    /// The factory's own account. Wallets it creates are sub-accounts.
    fn account(&self) -> &AccountId;

    /// Create wallet `name` (a bare name) and return its full address.
    fn create(
        &mut self,
        name: &AccountId,
        members: &[MultisigMember],
        threshold: u32,
    ) -> Result<AccountId, DeploymentError>;

    /// Members of an existing wallet, in wallet order.
    fn members(&self, multisig: &AccountId) -> Result<Vec<MultisigMember>, DeploymentError>;
}

// ---------------------------------------------------------------------------
// Local factory
// ---------------------------------------------------------------------------

/// One wallet in a [`LocalMultisigFactory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalWallet {
    /// Members in creation order.
    pub members: Vec<MultisigMember>,
    /// Confirmations required.
    pub threshold: u32,
}

/// In-process factory that records wallets in a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalMultisigFactory {
    account: AccountId,
    wallets: BTreeMap<AccountId, LocalWallet>,
}

impl LocalMultisigFactory {
    /// Empty factory at `account`.
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            wallets: BTreeMap::new(),
        }
    }

    /// A wallet created by this factory.
    pub fn wallet(&self, address: &AccountId) -> Option<&LocalWallet> {
        self.wallets.get(address)
    }

    /// Replace the members of an existing wallet.
    pub fn set_members(
        &mut self,
        address: &AccountId,
        members: Vec<MultisigMember>,
    ) -> Result<(), DeploymentError> {
        let wallet = self
            .wallets
            .get_mut(address)
            .ok_or_else(|| DeploymentError::NotFound {
                address: address.clone(),
            })?;
        wallet.members = members;
        Ok(())
    }
}

impl MultisigFactory for LocalMultisigFactory {
    fn account(&self) -> &AccountId {
        &self.account
    }

    fn create(
        &mut self,
        name: &AccountId,
        members: &[MultisigMember],
        threshold: u32,
    ) -> Result<AccountId, DeploymentError> {
        let address = self
            .account
            .sub_account(name.as_str())
            .map_err(|e| DeploymentError::Rejected(e.to_string()))?;
        if self.wallets.contains_key(&address) {
            return Err(DeploymentError::AlreadyExists { address });
        }
        if threshold == 0 || threshold as usize > members.len() {
            return Err(DeploymentError::InvalidThreshold {
                threshold,
                members: members.len(),
            });
        }
        self.wallets.insert(
            address.clone(),
            LocalWallet {
                members: members.to_vec(),
                threshold,
            },
        );
        tracing::debug!(%address, threshold, members = members.len(), "multisig created");
        Ok(address)
    }

    fn members(&self, multisig: &AccountId) -> Result<Vec<MultisigMember>, DeploymentError> {
        self.wallets
            .get(multisig)
            .map(|w| w.members.clone())
            .ok_or_else(|| DeploymentError::NotFound {
                address: multisig.clone(),
            })
    }
}
