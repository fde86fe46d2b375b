//! # Service Store
//!
//! Services by id, the per-token metadata index and the id counter. Ids are
//! assigned sequentially from 1 and never reused; records are never removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use svcreg_core::{AccountId, ServiceId, TokenMetadata};

use crate::error::RegistryError;
use crate::service::Service;

/// Canonical service records and the token index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStore {
    services: BTreeMap<ServiceId, Service>,
    token_metadata: BTreeMap<ServiceId, TokenMetadata>,
    pub(crate) last_id: u32,
}

impl ServiceStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next `insert` will use.
    pub fn next_id(&self) -> Result<ServiceId, RegistryError> {
        match ServiceId::new(self.last_id) {
            Ok(last) => last.next().ok_or(RegistryError::ServiceIdsExhausted {
                last_id: self.last_id,
            }),
            Err(_) => Ok(ServiceId::FIRST),
        }
    }

    /// Mint the token for `service` under [`Self::next_id`], which replaces
    /// whatever id the record carried.
    pub(crate) fn insert(&mut self, mut service: Service, metadata: TokenMetadata) -> Result<ServiceId, RegistryError> {
        let id = self.next_id()?;
        service.id = id;
        self.last_id = id.as_u32();
        self.token_metadata.insert(id, metadata);
        self.services.insert(id, service);
        Ok(id)
    }

    /// Look up a service.
    pub fn get(&self, service_id: ServiceId) -> Result<&Service, RegistryError> {
        self.services
            .get(&service_id)
            .ok_or(RegistryError::UnknownService { service_id })
    }

    pub(crate) fn get_mut(&mut self, service_id: ServiceId) -> Result<&mut Service, RegistryError> {
        self.services
            .get_mut(&service_id)
            .ok_or(RegistryError::UnknownService { service_id })
    }

    /// Number of minted service tokens.
    pub fn total_supply(&self) -> u32 {
        self.last_id
    }

    /// Token metadata of a service.
    pub fn token_metadata(&self, service_id: ServiceId) -> Option<&TokenMetadata> {
        self.token_metadata.get(&service_id)
    }

    /// All services in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    /// Services owned by `owner`, in id order.
    pub fn owned_by<'a>(&'a self, owner: &'a AccountId) -> impl Iterator<Item = &'a Service> {
        self.services.values().filter(move |s| &s.owner == owner)
    }
}
