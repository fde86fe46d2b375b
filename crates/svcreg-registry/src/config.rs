//! Registry configuration.
//!
//! Loaded from a YAML file. Accounts may be overridden from the environment:
//!
//! - `SVCREG_REGISTRY_ACCOUNT`: the registry's own account
//! - `SVCREG_OWNER`: registry owner
//! - `SVCREG_MULTISIG_FACTORY`: multisig factory account
//!
//! ```yaml
//! account: registry.near
//! owner: admin.near
//! multisig_factory: factory.near
//! metadata:
//!   spec: nft-1.0.0
//!   name: Service Registry
//!   symbol: SR
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use svcreg_core::{AccountId, RegistryMetadata, ValidationError};

use crate::error::RegistryError;
use crate::registry::ServiceRegistry;

/// Environment variable overriding [`RegistryConfig::account`].
pub const ENV_REGISTRY_ACCOUNT: &str = "SVCREG_REGISTRY_ACCOUNT";
/// Environment variable overriding [`RegistryConfig::owner`].
pub const ENV_OWNER: &str = "SVCREG_OWNER";
/// Environment variable overriding [`RegistryConfig::multisig_factory`].
pub const ENV_MULTISIG_FACTORY: &str = "SVCREG_MULTISIG_FACTORY";

/// Everything needed to initialize a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// The registry's own account.
    pub account: AccountId,
    /// Registry owner.
    pub owner: AccountId,
    /// Multisig factory account.
    pub multisig_factory: AccountId,
    /// Registry-level token metadata.
    pub metadata: RegistryMetadata,
}

impl RegistryConfig {
    /// Parse YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Apply the `SVCREG_*` environment overrides.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let parse = |var: &'static str| -> Result<Option<AccountId>, ConfigError> {
            lookup(var)
                .map(|raw| {
                    AccountId::new(raw).map_err(|source| ConfigError::InvalidAccount { var, source })
                })
                .transpose()
        };
        if let Some(account) = parse(ENV_REGISTRY_ACCOUNT)? {
            self.account = account;
        }
        if let Some(owner) = parse(ENV_OWNER)? {
            self.owner = owner;
        }
        if let Some(factory) = parse(ENV_MULTISIG_FACTORY)? {
            self.multisig_factory = factory;
        }
        Ok(self)
    }

    /// Build an empty registry from this configuration.
    pub fn into_registry(self) -> Result<ServiceRegistry, RegistryError> {
        ServiceRegistry::new(self.account, self.owner, self.multisig_factory, self.metadata)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The YAML is malformed or has the wrong shape.
    #[error("invalid registry config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An environment override is not a valid account id.
    #[error("{var} is not a valid account id: {source}")]
    InvalidAccount {
        /// Variable name.
        var: &'static str,
        /// Validation failure.
        source: ValidationError,
    },
}
