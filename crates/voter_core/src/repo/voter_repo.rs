//! Voter repository contract, DTOs, and error taxonomy.
//!
//! # Responsibility
//! - Define the one operation set every storage backend satisfies.
//! - Separate caller-supplied write DTOs from full persisted read records.
//!
//! # Invariants
//! - `created` is stamped exactly once, by the matching create call.
//! - Every successful mutation stamps a fresh `modified` on the voter and,
//!   for history mutations, on the affected poll record.
//! - Domain absence/conflict errors are never reported as storage failures.

use crate::model::voter::{PollId, PollRecord, Voter, VoterId};
use crate::repo::document_store::StoreError;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepoError>;

/// Caller-supplied voter fields for create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterInput {
    pub id: VoterId,
    pub name: String,
    pub email: String,
}

impl VoterInput {
    pub fn new(id: VoterId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Caller-supplied poll record fields for create/update.
///
/// The `poll_id` argument of a history operation decides where the record is
/// stored; the field here only mirrors it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRecordInput {
    pub poll_id: PollId,
    pub vote_id: i64,
    pub vote_date: DateTime<Utc>,
}

impl PollRecordInput {
    pub fn new(poll_id: PollId, vote_id: i64, vote_date: DateTime<Utc>) -> Self {
        Self {
            poll_id,
            vote_id,
            vote_date,
        }
    }
}

/// Coarse error kind used by callers to pick a handling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request rejected before any storage access.
    Validation,
    /// Domain-level absence of a voter, poll record, or history.
    NotFound,
    /// Create targeted a key that already exists.
    Conflict,
    /// Infrastructure failure; the caller decides whether to retry.
    Storage,
}

/// Infrastructure failure behind a load or save.
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Store(StoreError),
    LockPoisoned,
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::LockPoisoned => write!(f, "repository lock poisoned"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::LockPoisoned => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<StoreError> for StorageError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Error returned by every repository operation.
#[derive(Debug)]
pub enum RepoError {
    VoterNotFound(VoterId),
    VoterAlreadyExists(VoterId),
    NoHistory(VoterId),
    HistoryNotFound { voter_id: VoterId, poll_id: PollId },
    HistoryAlreadyExists { voter_id: VoterId, poll_id: PollId },
    LoadFailed(StorageError),
    SaveFailed(StorageError),
}

impl RepoError {
    pub fn load(err: impl Into<StorageError>) -> Self {
        Self::LoadFailed(err.into())
    }

    pub fn save(err: impl Into<StorageError>) -> Self {
        Self::SaveFailed(err.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::VoterNotFound(_) | Self::NoHistory(_) | Self::HistoryNotFound { .. } => {
                ErrorCategory::NotFound
            }
            Self::VoterAlreadyExists(_) | Self::HistoryAlreadyExists { .. } => {
                ErrorCategory::Conflict
            }
            Self::LoadFailed(_) | Self::SaveFailed(_) => ErrorCategory::Storage,
        }
    }

    pub fn is_storage_failure(&self) -> bool {
        self.category() == ErrorCategory::Storage
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VoterNotFound(id) => write!(f, "voter not found: {id}"),
            Self::VoterAlreadyExists(id) => write!(f, "voter already exists: {id}"),
            Self::NoHistory(id) => write!(f, "no history recorded for voter {id}"),
            Self::HistoryNotFound { voter_id, poll_id } => {
                write!(f, "poll {poll_id} not found for voter {voter_id}")
            }
            Self::HistoryAlreadyExists { voter_id, poll_id } => {
                write!(f, "poll {poll_id} already recorded for voter {voter_id}")
            }
            Self::LoadFailed(err) => write!(f, "failed to load voter data: {err}"),
            Self::SaveFailed(err) => write!(f, "failed to save voter data: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LoadFailed(err) | Self::SaveFailed(err) => Some(err),
            _ => None,
        }
    }
}

/// Storage contract shared by the snapshot-file and document-store backends.
pub trait VoterRepository {
    /// Creates a voter with empty history; `created == modified`.
    fn create_voter(&self, voter: &VoterInput) -> RepoResult<()>;
    /// Replaces name/email, preserving history and `created`.
    fn update_voter_info(&self, voter: &VoterInput) -> RepoResult<()>;
    /// Removes a voter together with its whole history.
    fn delete_single_voter(&self, id: VoterId) -> RepoResult<()>;
    /// Adds one poll record under an existing voter.
    fn create_voter_history(
        &self,
        voter_id: VoterId,
        poll_id: PollId,
        history: &PollRecordInput,
    ) -> RepoResult<()>;
    /// Replaces vote id/date of an existing poll record, preserving `created`.
    fn update_voter_history_info(
        &self,
        voter_id: VoterId,
        poll_id: PollId,
        history: &PollRecordInput,
    ) -> RepoResult<()>;
    /// Removes one poll record; the voter itself stays.
    fn delete_single_voter_poll(&self, voter_id: VoterId, poll_id: PollId) -> RepoResult<()>;
    /// Returns every voter in ascending id order.
    fn get_all_voters(&self) -> RepoResult<Vec<Voter>>;
    fn get_single_voter(&self, id: VoterId) -> RepoResult<Voter>;
    /// Returns poll records in ascending poll id order, or `NoHistory`.
    fn get_voter_history(&self, voter_id: VoterId) -> RepoResult<Vec<PollRecord>>;
    fn get_single_event(&self, voter_id: VoterId, poll_id: PollId) -> RepoResult<PollRecord>;
    /// Removes every voter and returns how many were removed.
    fn delete_all_voters(&self) -> RepoResult<usize>;
}

macro_rules! forward_voter_repository {
    ($wrapper:ident) => {
        impl<R: VoterRepository + ?Sized> VoterRepository for $wrapper<R> {
            fn create_voter(&self, voter: &VoterInput) -> RepoResult<()> {
                (**self).create_voter(voter)
            }

            fn update_voter_info(&self, voter: &VoterInput) -> RepoResult<()> {
                (**self).update_voter_info(voter)
            }

            fn delete_single_voter(&self, id: VoterId) -> RepoResult<()> {
                (**self).delete_single_voter(id)
            }

            fn create_voter_history(
                &self,
                voter_id: VoterId,
                poll_id: PollId,
                history: &PollRecordInput,
            ) -> RepoResult<()> {
                (**self).create_voter_history(voter_id, poll_id, history)
            }

            fn update_voter_history_info(
                &self,
                voter_id: VoterId,
                poll_id: PollId,
                history: &PollRecordInput,
            ) -> RepoResult<()> {
                (**self).update_voter_history_info(voter_id, poll_id, history)
            }

            fn delete_single_voter_poll(
                &self,
                voter_id: VoterId,
                poll_id: PollId,
            ) -> RepoResult<()> {
                (**self).delete_single_voter_poll(voter_id, poll_id)
            }

            fn get_all_voters(&self) -> RepoResult<Vec<Voter>> {
                (**self).get_all_voters()
            }

            fn get_single_voter(&self, id: VoterId) -> RepoResult<Voter> {
                (**self).get_single_voter(id)
            }

            fn get_voter_history(&self, voter_id: VoterId) -> RepoResult<Vec<PollRecord>> {
                (**self).get_voter_history(voter_id)
            }

            fn get_single_event(
                &self,
                voter_id: VoterId,
                poll_id: PollId,
            ) -> RepoResult<PollRecord> {
                (**self).get_single_event(voter_id, poll_id)
            }

            fn delete_all_voters(&self) -> RepoResult<usize> {
                (**self).delete_all_voters()
            }
        }
    };
}

forward_voter_repository!(Box);
forward_voter_repository!(Arc);

#[cfg(test)]
mod tests {
    use super::{ErrorCategory, RepoError, StorageError};
    use std::error::Error;

    #[test]
    fn categories_separate_domain_from_storage() {
        assert_eq!(
            RepoError::VoterNotFound(1).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            RepoError::HistoryAlreadyExists {
                voter_id: 1,
                poll_id: 2
            }
            .category(),
            ErrorCategory::Conflict
        );
        let failed = RepoError::LoadFailed(StorageError::LockPoisoned);
        assert!(failed.is_storage_failure());
        assert!(failed.source().is_some());
        assert!(RepoError::NoHistory(4).source().is_none());
    }
}
