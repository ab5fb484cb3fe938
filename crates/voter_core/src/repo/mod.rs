//! Repository layer: storage contract and its backends.
//!
//! # Responsibility
//! - Define the voter storage contract shared by every backend.
//! - Keep file and document-store details out of the service layer.
//!
//! # Invariants
//! - Both backends return the same success/error outcome for the same input.
//! - Repository APIs return semantic errors (`VoterNotFound`, conflicts) apart
//!   from storage failures.

pub mod document_repo;
pub mod document_store;
pub mod snapshot_repo;
pub mod voter_repo;
