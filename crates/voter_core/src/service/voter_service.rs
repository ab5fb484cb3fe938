//! Voter use-case service.
//!
//! # Responsibility
//! - Validate caller input, then delegate to one repository operation.
//! - Keep routing callers independent of the configured backend.
//!
//! # Invariants
//! - Validation always runs before storage is touched.
//! - Repository errors are passed through unchanged inside `Repo`.

use crate::model::voter::{PollId, PollRecord, Voter, VoterId};
use crate::repo::voter_repo::{
    ErrorCategory, PollRecordInput, RepoError, VoterInput, VoterRepository,
};
use crate::service::validation::{validate_history, validate_id, validate_voter, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, VoterServiceError>;

/// Service error for voter use-cases.
#[derive(Debug)]
pub enum VoterServiceError {
    /// Input rejected before any storage access.
    Validation(ValidationError),
    /// Repository outcome (domain absence, conflict, or storage failure).
    Repo(RepoError),
}

impl VoterServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Repo(err) => err.category(),
        }
    }
}

impl Display for VoterServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VoterServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for VoterServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for VoterServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Validating facade over a voter repository.
pub struct VoterService<R: VoterRepository> {
    repo: R,
}

impl<R: VoterRepository> VoterService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the wrapped repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn create_voter(&self, voter: &VoterInput) -> ServiceResult<()> {
        validate_voter(voter)?;
        Ok(self.repo.create_voter(voter)?)
    }

    pub fn update_voter_info(&self, voter: &VoterInput) -> ServiceResult<()> {
        validate_voter(voter)?;
        Ok(self.repo.update_voter_info(voter)?)
    }

    pub fn delete_single_voter(&self, id: VoterId) -> ServiceResult<()> {
        validate_id(id)?;
        Ok(self.repo.delete_single_voter(id)?)
    }

    pub fn create_voter_history(
        &self,
        voter_id: VoterId,
        poll_id: PollId,
        history: &PollRecordInput,
    ) -> ServiceResult<()> {
        validate_history(voter_id, poll_id, history)?;
        Ok(self.repo.create_voter_history(voter_id, poll_id, history)?)
    }

    pub fn update_voter_history_info(
        &self,
        voter_id: VoterId,
        poll_id: PollId,
        history: &PollRecordInput,
    ) -> ServiceResult<()> {
        validate_history(voter_id, poll_id, history)?;
        Ok(self
            .repo
            .update_voter_history_info(voter_id, poll_id, history)?)
    }

    pub fn delete_single_voter_poll(&self, voter_id: VoterId, poll_id: PollId) -> ServiceResult<()> {
        validate_id(voter_id)?;
        validate_id(poll_id)?;
        Ok(self.repo.delete_single_voter_poll(voter_id, poll_id)?)
    }

    pub fn get_all_voters(&self) -> ServiceResult<Vec<Voter>> {
        Ok(self.repo.get_all_voters()?)
    }

    pub fn get_single_voter(&self, id: VoterId) -> ServiceResult<Voter> {
        validate_id(id)?;
        Ok(self.repo.get_single_voter(id)?)
    }

    pub fn get_voter_history(&self, voter_id: VoterId) -> ServiceResult<Vec<PollRecord>> {
        validate_id(voter_id)?;
        Ok(self.repo.get_voter_history(voter_id)?)
    }

    pub fn get_single_event(&self, voter_id: VoterId, poll_id: PollId) -> ServiceResult<PollRecord> {
        validate_id(voter_id)?;
        validate_id(poll_id)?;
        Ok(self.repo.get_single_event(voter_id, poll_id)?)
    }

    pub fn delete_all_voters(&self) -> ServiceResult<usize> {
        Ok(self.repo.delete_all_voters()?)
    }
}
