//! Voter persistence core.
//! This crate owns the voter/poll-history invariants and the storage contract
//! shared by the snapshot-file and document-store backends.

pub mod clock;
pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SteppingClock, SystemClock};
pub use config::{
    normalize_redis_url, open_repository, restore_snapshot, ConfigError, StorageBackend,
    StorageConfig,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::voter::{is_unset_timestamp, HistoryMap, PollId, PollRecord, Voter, VoterId};
pub use repo::document_repo::{voter_key, DocumentVoterRepository, VOTER_KEY_PREFIX};
pub use repo::document_store::{
    DocumentStore, InMemoryDocumentStore, RedisDocumentStore, StoreError, StoreResult,
};
pub use repo::snapshot_repo::JsonFileVoterRepository;
pub use repo::voter_repo::{
    ErrorCategory, PollRecordInput, RepoError, RepoResult, StorageError, VoterInput,
    VoterRepository,
};
pub use service::validation::{validate_history, validate_id, validate_voter, ValidationError};
pub use service::voter_service::{ServiceResult, VoterService, VoterServiceError};

/// Minimal health-check API for callers wiring the core.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
