use crate::sources::ProviderPayload;

use super::buyers::Buyer;
use super::domain::{Lead, LeadEvent, LeadId};

/// Storage abstraction for leads, their provider payloads, and inbound events.
pub trait LeadRepository: Send + Sync {
    fn insert(&self, lead: Lead) -> Result<Lead, RepositoryError>;
    fn fetch(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError>;
    fn update(&self, lead: Lead) -> Result<(), RepositoryError>;
    /// Newest first.
    fn list(&self) -> Result<Vec<Lead>, RepositoryError>;
    fn delete(&self, id: LeadId) -> Result<(), RepositoryError>;
    fn latest_by_phone(&self, phone: &str) -> Result<Option<Lead>, RepositoryError>;

    fn store_payload(&self, lead: LeadId, payload: ProviderPayload) -> Result<(), RepositoryError>;
    fn payloads(&self, lead: LeadId) -> Result<Vec<ProviderPayload>, RepositoryError>;

    fn append_event(&self, event: LeadEvent) -> Result<(), RepositoryError>;
}

pub trait BuyerRepository: Send + Sync {
    fn insert(&self, buyer: Buyer) -> Result<Buyer, RepositoryError>;
    fn fetch(&self, id: u64) -> Result<Option<Buyer>, RepositoryError>;
    /// Newest first.
    fn list(&self) -> Result<Vec<Buyer>, RepositoryError>;
    fn delete(&self, id: u64) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
