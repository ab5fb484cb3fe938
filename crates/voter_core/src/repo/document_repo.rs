//! Document-store voter repository.
//!
//! # Responsibility
//! - Persist one JSON document per voter under `voter:<id>`.
//! - Translate store misses into domain `NotFound` errors and keep transport
//!   failures in the storage category.
//!
//! # Invariants
//! - Create/update/delete consult `DocumentStore::exists` first.
//! - History mutations rewrite the whole voter document.
//! - `vote_id` and `poll_id` are independent fields on every path.
//!
//! # Concurrency
//! - Mutations on different voters never touch the same document.
//! - Two concurrent history mutations on one voter race: both read the same
//!   document and the later write wins. No version check guards this.

use crate::clock::{Clock, SystemClock};
use crate::model::voter::{PollId, PollRecord, Voter, VoterId};
use crate::repo::document_store::DocumentStore;
use crate::repo::voter_repo::{PollRecordInput, RepoError, RepoResult, VoterInput, VoterRepository};
use log::{error, info, warn};
use std::sync::Arc;

/// Key prefix shared by every voter document.
pub const VOTER_KEY_PREFIX: &str = "voter:";

/// Returns the document key for one voter.
pub fn voter_key(id: VoterId) -> String {
    format!("{VOTER_KEY_PREFIX}{id}")
}

fn voter_key_pattern() -> String {
    format!("{VOTER_KEY_PREFIX}*")
}

/// Voter repository storing one document per voter.
pub struct DocumentVoterRepository<S: DocumentStore> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore> DocumentVoterRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the underlying document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn exists(&self, id: VoterId) -> RepoResult<bool> {
        self.store.exists(&voter_key(id)).map_err(|err| {
            error!("event=store_exists module=repo backend=document status=error voter_id={id} error={err}");
            RepoError::load(err)
        })
    }

    fn fetch_key(&self, key: &str) -> RepoResult<Option<Voter>> {
        let json = self.store.get_json(key).map_err(|err| {
            error!("event=store_get module=repo backend=document status=error key={key} error={err}");
            RepoError::load(err)
        })?;

        match json {
            Some(json) => serde_json::from_str(&json).map(Some).map_err(|err| {
                error!("event=store_decode module=repo backend=document status=error key={key} error={err}");
                RepoError::load(err)
            }),
            None => Ok(None),
        }
    }

    fn require(&self, id: VoterId) -> RepoResult<Voter> {
        self.fetch_key(&voter_key(id))?
            .ok_or(RepoError::VoterNotFound(id))
    }

    fn put(&self, voter: &Voter) -> RepoResult<()> {
        let json = serde_json::to_string(voter).map_err(RepoError::save)?;
        self.store.set_json(&voter_key(voter.id), &json).map_err(|err| {
            error!(
                "event=store_set module=repo backend=document status=error voter_id={} error={}",
                voter.id, err
            );
            RepoError::save(err)
        })
    }
}

impl<S: DocumentStore> VoterRepository for DocumentVoterRepository<S> {
    fn create_voter(&self, voter: &VoterInput) -> RepoResult<()> {
        if self.exists(voter.id)? {
            warn!("event=voter_create module=repo backend=document status=rejected reason=exists voter_id={}", voter.id);
            return Err(RepoError::VoterAlreadyExists(voter.id));
        }

        let now = self.clock.now();
        self.put(&Voter::new(voter.id, voter.name.as_str(), voter.email.as_str(), now))?;
        info!("event=voter_create module=repo backend=document status=ok voter_id={}", voter.id);
        Ok(())
    }

    fn update_voter_info(&self, voter: &VoterInput) -> RepoResult<()> {
        if !self.exists(voter.id)? {
            return Err(RepoError::VoterNotFound(voter.id));
        }

        let mut existing = self.require(voter.id)?;
        existing.name = voter.name.clone();
        existing.email = voter.email.clone();
        existing.touch(self.clock.now());
        self.put(&existing)?;
        info!("event=voter_update module=repo backend=document status=ok voter_id={}", voter.id);
        Ok(())
    }

    fn delete_single_voter(&self, id: VoterId) -> RepoResult<()> {
        if !self.exists(id)? {
            return Err(RepoError::VoterNotFound(id));
        }

        let removed = self.store.delete(&voter_key(id)).map_err(|err| {
            error!("event=voter_delete module=repo backend=document status=error voter_id={id} error={err}");
            RepoError::save(err)
        })?;
        if !removed {
            return Err(RepoError::VoterNotFound(id));
        }
        info!("event=voter_delete module=repo backend=document status=ok voter_id={id}");
        Ok(())
    }

    fn create_voter_history(
        &self,
        voter_id: VoterId,
        poll_id: PollId,
        history: &PollRecordInput,
    ) -> RepoResult<()> {
        let mut voter = self.require(voter_id)?;
        if voter.history.contains_key(&poll_id) {
            return Err(RepoError::HistoryAlreadyExists { voter_id, poll_id });
        }

        let now = self.clock.now();
        voter.history.insert(
            poll_id,
            PollRecord::new(poll_id, history.vote_id, history.vote_date, now),
        );
        voter.touch(now);
        self.put(&voter)?;
        info!("event=history_create module=repo backend=document status=ok voter_id={voter_id} poll_id={poll_id}");
        Ok(())
    }

    fn update_voter_history_info(
        &self,
        voter_id: VoterId,
        poll_id: PollId,
        history: &PollRecordInput,
    ) -> RepoResult<()> {
        let mut voter = self.require(voter_id)?;
        let now = self.clock.now();
        let record = voter
            .history
            .get_mut(&poll_id)
            .ok_or(RepoError::HistoryNotFound { voter_id, poll_id })?;
        record.revise(history.vote_id, history.vote_date, now);
        voter.touch(now);
        self.put(&voter)?;
        info!("event=history_update module=repo backend=document status=ok voter_id={voter_id} poll_id={poll_id}");
        Ok(())
    }

    fn delete_single_voter_poll(&self, voter_id: VoterId, poll_id: PollId) -> RepoResult<()> {
        let mut voter = self.require(voter_id)?;
        if voter.history.remove(&poll_id).is_none() {
            return Err(RepoError::HistoryNotFound { voter_id, poll_id });
        }

        voter.touch(self.clock.now());
        self.put(&voter)?;
        info!("event=history_delete module=repo backend=document status=ok voter_id={voter_id} poll_id={poll_id}");
        Ok(())
    }

    fn get_all_voters(&self) -> RepoResult<Vec<Voter>> {
        let keys = self.store.keys(&voter_key_pattern()).map_err(|err| {
            error!("event=store_keys module=repo backend=document status=error error={err}");
            RepoError::load(err)
        })?;

        let mut voters = Vec::with_capacity(keys.len());
        for key in keys {
            // A key listed by the scan may be deleted before it is fetched.
            if let Some(voter) = self.fetch_key(&key)? {
                voters.push(voter);
            }
        }
        // SCAN may report the same key more than once.
        voters.sort_by_key(|voter| voter.id);
        voters.dedup_by_key(|voter| voter.id);
        Ok(voters)
    }

    fn get_single_voter(&self, id: VoterId) -> RepoResult<Voter> {
        self.require(id)
    }

    fn get_voter_history(&self, voter_id: VoterId) -> RepoResult<Vec<PollRecord>> {
        let voter = self.require(voter_id)?;
        if !voter.has_history() {
            return Err(RepoError::NoHistory(voter_id));
        }
        Ok(voter.polls())
    }

    fn get_single_event(&self, voter_id: VoterId, poll_id: PollId) -> RepoResult<PollRecord> {
        let voter = self.require(voter_id)?;
        voter
            .poll(poll_id)
            .cloned()
            .ok_or(RepoError::HistoryNotFound { voter_id, poll_id })
    }

    fn delete_all_voters(&self) -> RepoResult<usize> {
        let keys = self
            .store
            .keys(&voter_key_pattern())
            .map_err(RepoError::load)?;

        let mut removed = 0;
        for key in &keys {
            if self.store.delete(key).map_err(RepoError::save)? {
                removed += 1;
            }
        }
        info!("event=voter_delete_all module=repo backend=document status=ok removed={removed}");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::{voter_key, voter_key_pattern};

    #[test]
    fn keys_use_voter_prefix() {
        assert_eq!(voter_key(42), "voter:42");
        assert_eq!(voter_key_pattern(), "voter:*");
    }
}
