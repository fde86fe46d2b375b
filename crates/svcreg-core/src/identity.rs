//! # Identifiers
//!
//! Newtype identifiers for accounts, services and agent roles.
//!
//! [`AccountId`] follows the host ledger's naming rules: 2 to 64 characters
//! drawn from lowercase ASCII letters, digits and the separators `-`, `_`, `.`,
//! where separators never lead, trail or repeat. A dotted name is a
//! sub-account of the name after its first dot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

// ── AccountId ──────────────────────────────────────────────────────────

/// Minimum account id length.
pub const MIN_ACCOUNT_ID_LEN: usize = 2;
/// Maximum account id length.
pub const MAX_ACCOUNT_ID_LEN: usize = 64;

/// A validated ledger account identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Validate and wrap an account name.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let reject = |reason| ValidationError::InvalidAccountId {
            value: value.clone(),
            reason,
        };

        if value.len() < MIN_ACCOUNT_ID_LEN {
            return Err(reject("too short"));
        }
        if value.len() > MAX_ACCOUNT_ID_LEN {
            return Err(reject("too long"));
        }

        let mut last_was_separator = true;
        for c in value.chars() {
            match c {
                'a'..='z' | '0'..='9' => last_was_separator = false,
                '-' | '_' | '.' => {
                    if last_was_separator {
                        return Err(reject("separator at start or repeated"));
                    }
                    last_was_separator = true;
                }
                _ => return Err(reject("only lowercase letters, digits, '-', '_' and '.' are allowed")),
            }
        }
        if last_was_separator {
            return Err(reject("separator at end"));
        }

        Ok(Self(value))
    }

    /// The account name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this account is a direct or nested sub-account of `parent`.
    ///
    /// `wallet.factory.near` is a sub-account of `factory.near`.
    pub fn is_sub_account_of(&self, parent: &AccountId) -> bool {
        self.0
            .strip_suffix(parent.as_str())
            .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
    }

    /// The parent account, if this is a dotted name.
    pub fn parent(&self) -> Option<AccountId> {
        self.0
            .split_once('.')
            .map(|(_, rest)| AccountId(rest.to_string()))
    }

    /// Build `{prefix}.{self}`.
    pub fn sub_account(&self, prefix: &str) -> Result<AccountId, ValidationError> {
        AccountId::new(format!("{prefix}.{}", self.0))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        AccountId::new(raw).map_err(serde::de::Error::custom)
    }
}

// ── ServiceId ──────────────────────────────────────────────────────────

/// Sequential service identifier. Also the id of the service's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ServiceId(u32);

impl ServiceId {
    /// The first id ever assigned.
    pub const FIRST: ServiceId = ServiceId(1);

    /// Wrap a positive id.
    pub fn new(id: u32) -> Result<Self, ValidationError> {
        if id == 0 {
            return Err(ValidationError::ZeroServiceId);
        }
        Ok(Self(id))
    }

    /// The raw integer.
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// The id following this one, or `None` at `u32::MAX`.
    pub fn next(&self) -> Option<ServiceId> {
        self.0.checked_add(1).map(ServiceId)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ServiceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u32 = s.parse().map_err(|_| ValidationError::ZeroServiceId)?;
        Self::new(raw)
    }
}

impl<'de> Deserialize<'de> for ServiceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u32::deserialize(deserializer)?;
        ServiceId::new(raw).map_err(serde::de::Error::custom)
    }
}

// ── AgentId ────────────────────────────────────────────────────────────

/// Identifier of an agent role within a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AgentId(u32);

impl AgentId {
    /// Wrap a non-zero role id.
    pub fn new(id: u32) -> Result<Self, ValidationError> {
        if id == 0 {
            return Err(ValidationError::ZeroAgentId);
        }
        Ok(Self(id))
    }

    /// The raw integer.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for AgentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u32::deserialize(deserializer)?;
        AgentId::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    #[test]
    fn accepts_typical_names() {
        for name in ["alice.near", "bob", "token-1.test", "a_b.c-d.near", "00"] {
            assert!(AccountId::new(name).is_ok(), "expected {name} to be valid");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for name in ["a", "", "Alice.near", ".near", "near.", "a..b", "a-.b", "has space", "a@b"] {
            let err = AccountId::new(name).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidAccountId { .. }),
                "expected InvalidAccountId for {name:?}, got: {err:?}"
            );
        }
        assert!(AccountId::new("a".repeat(65)).is_err());
        assert!(AccountId::new("a".repeat(64)).is_ok());
    }

    #[test]
    fn sub_account_relationship() {
        let factory = acct("multisignature2.testnet");
        assert!(acct("wallet.multisignature2.testnet").is_sub_account_of(&factory));
        assert!(acct("a.b.multisignature2.testnet").is_sub_account_of(&factory));
        assert!(!acct("multisignature2.testnet").is_sub_account_of(&factory));
        assert!(!acct("xmultisignature2.testnet").is_sub_account_of(&factory));
        assert!(!acct("wallet").is_sub_account_of(&factory));
    }

    #[test]
    fn parent_and_sub_account() {
        assert_eq!(acct("wallet.factory.near").parent(), Some(acct("factory.near")));
        assert_eq!(acct("wallet").parent(), None);
        assert_eq!(
            acct("factory.near").sub_account("wallet").unwrap(),
            acct("wallet.factory.near")
        );
    }

    #[test]
    fn account_id_deserialization_validates() {
        let ok: AccountId = serde_json::from_str("\"alice.near\"").unwrap();
        assert_eq!(ok.as_str(), "alice.near");
        assert!(serde_json::from_str::<AccountId>("\"ALICE\"").is_err());
    }

    #[test]
    fn service_id_rejects_zero() {
        assert_eq!(ServiceId::new(0), Err(ValidationError::ZeroServiceId));
        assert_eq!(ServiceId::FIRST.next().map(|id| id.as_u32()), Some(2));
        assert_eq!(ServiceId::new(u32::MAX).unwrap().next(), None);
        assert_eq!("7".parse::<ServiceId>().unwrap().as_u32(), 7);
        assert!(serde_json::from_str::<ServiceId>("0").is_err());
        assert_eq!(serde_json::from_str::<ServiceId>("4").unwrap().as_u32(), 4);
    }

    #[test]
    fn agent_id_rejects_zero() {
        assert_eq!(AgentId::new(0), Err(ValidationError::ZeroAgentId));
        assert_eq!(AgentId::new(3).unwrap().to_string(), "3");
    }
}
