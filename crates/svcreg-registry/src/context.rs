//! Call context supplied by the host for every mutating call.

use serde::{Deserialize, Serialize};

use svcreg_core::{AccountId, Balance};

/// Who is calling and how much native currency they attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The immediate caller.
    pub predecessor: AccountId,
    /// Native amount attached to the call.
    pub attached_deposit: Balance,
}

impl CallContext {
    /// A call with nothing attached.
    pub fn new(predecessor: AccountId) -> Self {
        Self {
            predecessor,
            attached_deposit: 0,
        }
    }

    /// Attach a native deposit.
    pub fn with_deposit(mut self, amount: Balance) -> Self {
        self.attached_deposit = amount;
        self
    }
}
