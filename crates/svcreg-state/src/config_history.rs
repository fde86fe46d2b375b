//! # Configuration History
//!
//! The current configuration hash of a service plus every hash it replaced,
//! oldest first. Entries are only ever appended; one per update, including
//! updates that keep the same hash.

use serde::{Deserialize, Serialize};

use svcreg_core::ConfigHash;

/// Current hash and append-only list of superseded hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigHistory {
    current: ConfigHash,
    previous: Vec<ConfigHash>,
}

impl ConfigHistory {
    /// Start a history at the creation-time hash.
    pub fn new(initial: ConfigHash) -> Self {
        Self {
            current: initial,
            previous: Vec::new(),
        }
    }

    /// The hash in force.
    pub fn current(&self) -> ConfigHash {
        self.current
    }

    /// Superseded hashes, oldest first.
    pub fn previous(&self) -> &[ConfigHash] {
        &self.previous
    }

    /// Number of updates applied since creation.
    pub fn revisions(&self) -> usize {
        self.previous.len()
    }

    /// Append the current hash to the history and install `next`.
    pub fn supersede(&mut self, next: ConfigHash) {
        self.previous.push(self.current);
        self.current = next;
    }
}
