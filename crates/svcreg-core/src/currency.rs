//! # Currencies
//!
//! A service bonds either in the ledger's native currency, paid as a deposit
//! attached to the call, or in a fungible token whose transfers arrive
//! asynchronously through the token contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::AccountId;

/// Amount in the smallest unit of a currency.
pub type Balance = u128;

/// The currency a service settles bonds in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// Native currency attached to the call.
    Native,
    /// Fungible token identified by its contract account.
    Token(AccountId),
}

impl Currency {
    /// Whether this is the native currency.
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// The token contract, when this is a token currency.
    pub fn token(&self) -> Option<&AccountId> {
        match self {
            Self::Native => None,
            Self::Token(contract) => Some(contract),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Token(contract) => write!(f, "token:{contract}"),
        }
    }
}

impl From<Option<AccountId>> for Currency {
    fn from(token: Option<AccountId>) -> Self {
        token.map_or(Self::Native, Self::Token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_from_optional_token() {
        assert_eq!(Currency::from(None), Currency::Native);
        let usdc = AccountId::new("usdc.near").unwrap();
        let c = Currency::from(Some(usdc.clone()));
        assert_eq!(c.token(), Some(&usdc));
        assert!(!c.is_native());
        assert_eq!(c.to_string(), "token:usdc.near");
    }

    #[test]
    fn currency_serde_shape() {
        assert_eq!(serde_json::to_string(&Currency::Native).unwrap(), "\"native\"");
        let c = Currency::Token(AccountId::new("usdc.near").unwrap());
        assert_eq!(serde_json::to_string(&c).unwrap(), "{\"token\":\"usdc.near\"}");
    }
}
