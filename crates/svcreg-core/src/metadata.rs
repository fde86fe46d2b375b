//! # Token Metadata
//!
//! Each service is represented by exactly one non-transferable token. The
//! registry stores contract-level metadata ([`RegistryMetadata`]) once, and
//! per-token metadata ([`TokenMetadata`]) for every minted service.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Metadata standard version string the registry advertises.
pub const NFT_METADATA_SPEC: &str = "nft-1.0.0";

/// Contract-level metadata returned by `nft_metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    /// Metadata standard version, normally [`NFT_METADATA_SPEC`].
    pub spec: String,
    /// Human-readable registry name.
    pub name: String,
    /// Short ticker-style symbol.
    pub symbol: String,
    /// Optional data-URL icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Base URI for token media and references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
    /// Link to a JSON file with more information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Base64 hash of the `reference` document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_hash: Option<String>,
}

impl RegistryMetadata {
    /// Minimal metadata carrying the standard version string.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            spec: NFT_METADATA_SPEC.to_string(),
            name: name.into(),
            symbol: symbol.into(),
            icon: None,
            base_uri: None,
            reference: None,
            reference_hash: None,
        }
    }

    /// Check required fields are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.spec.trim().is_empty() {
            return Err(ValidationError::EmptyMetadataField { field: "spec" });
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyMetadataField { field: "name" });
        }
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::EmptyMetadataField { field: "symbol" });
        }
        if self.reference.is_some() != self.reference_hash.is_some() {
            return Err(ValidationError::EmptyMetadataField {
                field: "reference_hash",
            });
        }
        Ok(())
    }
}

/// Per-service token metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Service title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Media URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    /// Number of copies; must be exactly one.
    #[serde(default)]
    pub copies: Option<u64>,
    /// Arbitrary extra data, usually JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    /// Link to an off-ledger description document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl TokenMetadata {
    /// Metadata for a single-copy token with a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            copies: Some(1),
            ..Self::default()
        }
    }

    /// A service token is unique: `copies` must be `Some(1)`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.copies != Some(1) {
            return Err(ValidationError::InvalidCopies {
                copies: self.copies,
            });
        }
        Ok(())
    }
}
