//! # Configuration Hashes
//!
//! A [`ConfigHash`] is the 32-byte fingerprint of a service's off-ledger
//! configuration. The registry treats it as opaque; it only requires that the
//! hash is non-zero. Hashes render and serialize as lowercase hex.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// Byte length of a configuration hash.
pub const CONFIG_HASH_LEN: usize = 32;

/// Non-zero 32-byte configuration fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigHash([u8; CONFIG_HASH_LEN]);

impl ConfigHash {
    /// Wrap raw bytes, rejecting the all-zero hash.
    pub fn new(bytes: [u8; CONFIG_HASH_LEN]) -> Result<Self, ValidationError> {
        if bytes.iter().all(|b| *b == 0) {
            return Err(ValidationError::ZeroConfigHash);
        }
        Ok(Self(bytes))
    }

    /// Parse 64 hex characters, with or without a `0x` prefix.
    pub fn from_hex(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.strip_prefix("0x").unwrap_or(value);
        let mut bytes = [0u8; CONFIG_HASH_LEN];
        hex::decode_to_slice(trimmed, &mut bytes).map_err(|_| ValidationError::InvalidConfigHash {
            value: value.to_string(),
        })?;
        Self::new(bytes)
    }

    /// SHA-256 of a configuration document.
    ///
    /// A SHA-256 digest is all-zero with negligible probability; should it
    /// happen the document is rejected like any other zero hash.
    pub fn of_document(document: &[u8]) -> Result<Self, ValidationError> {
        let digest = Sha256::digest(document);
        let mut bytes = [0u8; CONFIG_HASH_LEN];
        bytes.copy_from_slice(&digest);
        Self::new(bytes)
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; CONFIG_HASH_LEN] {
        &self.0
    }

    /// Lowercase hex, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigHash({})", self.to_hex())
    }
}

impl FromStr for ConfigHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ConfigHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ConfigHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ConfigHash::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}
