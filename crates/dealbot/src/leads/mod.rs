//! Seller lead intake, buyer directory, and provider payload ingestion.

pub mod buyers;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use buyers::{Buyer, BuyerCsvImporter, BuyerImportError, BuyerSubmission};
pub use domain::{
    Lead, LeadEvent, LeadId, LeadQuery, LeadStatus, LeadStatusUpdate, LeadSubmission,
    LeadValidationError,
};
pub use repository::{BuyerRepository, LeadRepository, RepositoryError};
pub use router::{lead_router, LeadApi};
pub use service::{LeadService, LeadServiceError};
