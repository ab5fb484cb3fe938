//! Field-level validation for voter and poll record requests.
//!
//! # Invariants
//! - Pure functions: no storage access, no side effects.
//! - Check order is fixed so the reported error is deterministic:
//!   id, then name, then email for voters; voter id, then poll id, then
//!   vote date for history.

use crate::model::voter::{is_unset_timestamp, PollId, VoterId};
use crate::repo::voter_repo::{PollRecordInput, VoterInput};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Request rejected before reaching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidId,
    InvalidName,
    InvalidEmail,
    InvalidDate,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId => write!(f, "id must be a positive non-zero integer"),
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::InvalidEmail => write!(f, "email must be in the form <address>@<domain>.<tld>"),
            Self::InvalidDate => write!(f, "vote date must be set"),
        }
    }
}

impl Error for ValidationError {}

/// Rejects non-positive ids.
pub fn validate_id(id: i64) -> Result<(), ValidationError> {
    if id < 1 {
        return Err(ValidationError::InvalidId);
    }
    Ok(())
}

/// Validates a voter write request.
pub fn validate_voter(voter: &VoterInput) -> Result<(), ValidationError> {
    validate_id(voter.id)?;
    if voter.name.trim().is_empty() {
        return Err(ValidationError::InvalidName);
    }
    if !is_valid_email(&voter.email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Validates a poll record write request addressed by `voter_id`/`poll_id`.
pub fn validate_history(
    voter_id: VoterId,
    poll_id: PollId,
    history: &PollRecordInput,
) -> Result<(), ValidationError> {
    validate_id(voter_id)?;
    validate_id(poll_id)?;
    if is_unset_timestamp(&history.vote_date) {
        return Err(ValidationError::InvalidDate);
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
