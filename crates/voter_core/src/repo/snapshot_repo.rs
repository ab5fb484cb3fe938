//! Snapshot-file voter repository.
//!
//! # Responsibility
//! - Persist the whole voter collection as one JSON array in one file.
//! - Reload the file before every operation; rewrite it after every mutation.
//!
//! # Invariants
//! - The file is the single source of truth: the in-memory map is replaced,
//!   never merged, on every load.
//! - A missing or zero-length file is seeded with `[]` before it is read.
//! - Nothing is durable until the save succeeds; a failed save surfaces as
//!   `SaveFailed` even though the in-memory map was already mutated.
//!
//! # Concurrency
//! - Calls on one repository value are serialized by an internal mutex.
//! - Other processes writing the same file are not coordinated with; their
//!   read-modify-write cycles can overwrite each other (last write wins).

use crate::clock::{Clock, SystemClock};
use crate::model::voter::{PollId, PollRecord, Voter, VoterId};
use crate::repo::voter_repo::{
    PollRecordInput, RepoError, RepoResult, StorageError, VoterInput, VoterRepository,
};
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

const EMPTY_SNAPSHOT: &[u8] = b"[]";

type VoterMap = BTreeMap<VoterId, Voter>;

/// Voter repository backed by a single JSON snapshot file.
pub struct JsonFileVoterRepository {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    voters: Mutex<VoterMap>,
}

impl JsonFileVoterRepository {
    /// Opens (and seeds when needed) the snapshot file at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Opens the snapshot file with an explicit time source.
    ///
    /// # Errors
    /// - `LoadFailed` when the file cannot be inspected or seeded.
    pub fn open_with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> RepoResult<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_seeded(&path).map_err(|err| {
            error!(
                "event=snapshot_open module=repo backend=snapshot status=error path={} error={}",
                path.display(),
                err
            );
            RepoError::load(err)
        })?;
        info!(
            "event=snapshot_open module=repo backend=snapshot status=ok path={}",
            path.display()
        );

        Ok(Self {
            path,
            clock,
            voters: Mutex::new(VoterMap::new()),
        })
    }

    /// Returns the live snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the live snapshot file byte-for-byte with `backup_path`.
    ///
    /// Returns the number of bytes copied.
    ///
    /// # Errors
    /// - `LoadFailed` when the backup cannot be read.
    /// - `SaveFailed` when the live file cannot be written.
    pub fn restore_from(&self, backup_path: impl AsRef<Path>) -> RepoResult<u64> {
        let backup_path = backup_path.as_ref();
        let _voters = self.lock()?;

        let bytes = fs::read(backup_path).map_err(|err| {
            error!(
                "event=snapshot_restore module=repo backend=snapshot status=error stage=read backup={} error={}",
                backup_path.display(),
                err
            );
            RepoError::load(err)
        })?;
        fs::write(&self.path, &bytes).map_err(|err| {
            error!(
                "event=snapshot_restore module=repo backend=snapshot status=error stage=write path={} error={}",
                self.path.display(),
                err
            );
            RepoError::save(err)
        })?;

        info!(
            "event=snapshot_restore module=repo backend=snapshot status=ok backup={} path={} bytes={}",
            backup_path.display(),
            self.path.display(),
            bytes.len()
        );
        Ok(bytes.len() as u64)
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, VoterMap>> {
        self.voters
            .lock()
            .map_err(|_| RepoError::LoadFailed(StorageError::LockPoisoned))
    }

    /// Runs a read-only operation against a freshly loaded snapshot.
    fn read<T>(&self, op: impl FnOnce(&VoterMap) -> RepoResult<T>) -> RepoResult<T> {
        let mut voters = self.lock()?;
        self.load_into(&mut voters)?;
        op(&*voters)
    }

    /// Runs a mutation against a freshly loaded snapshot and persists it.
    fn mutate<T>(
        &self,
        event: &'static str,
        op: impl FnOnce(&mut VoterMap, DateTime<Utc>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let mut voters = self.lock()?;
        self.load_into(&mut voters)?;
        let value = op(&mut *voters, self.clock.now()).map_err(|err| {
            info!("event={event} module=repo backend=snapshot status=rejected reason={err}");
            err
        })?;
        self.save(&voters)?;
        info!("event={event} module=repo backend=snapshot status=ok");
        Ok(value)
    }

    fn load_into(&self, voters: &mut VoterMap) -> RepoResult<()> {
        let started_at = Instant::now();
        let loaded = read_snapshot(&self.path).map_err(|err| {
            error!(
                "event=snapshot_load module=repo backend=snapshot status=error path={} error={}",
                self.path.display(),
                err
            );
            RepoError::LoadFailed(err)
        })?;

        voters.clear();
        voters.extend(loaded.into_iter().map(|voter| (voter.id, voter)));
        debug!(
            "event=snapshot_load module=repo backend=snapshot status=ok voters={} duration_ms={}",
            voters.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn save(&self, voters: &VoterMap) -> RepoResult<()> {
        let started_at = Instant::now();
        let list: Vec<&Voter> = voters.values().collect();
        let result = serde_json::to_vec_pretty(&list)
            .map_err(StorageError::from)
            .and_then(|data| fs::write(&self.path, data).map_err(StorageError::from));

        match result {
            Ok(()) => {
                debug!(
                    "event=snapshot_save module=repo backend=snapshot status=ok voters={} duration_ms={}",
                    voters.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=snapshot_save module=repo backend=snapshot status=error path={} error={}",
                    self.path.display(),
                    err
                );
                Err(RepoError::SaveFailed(err))
            }
        }
    }
}

impl VoterRepository for JsonFileVoterRepository {
    fn create_voter(&self, voter: &VoterInput) -> RepoResult<()> {
        self.mutate("voter_create", |voters, now| {
            if voters.contains_key(&voter.id) {
                return Err(RepoError::VoterAlreadyExists(voter.id));
            }
            voters.insert(
                voter.id,
                Voter::new(voter.id, voter.name.as_str(), voter.email.as_str(), now),
            );
            Ok(())
        })
    }

    fn update_voter_info(&self, voter: &VoterInput) -> RepoResult<()> {
        self.mutate("voter_update", |voters, now| {
            let existing = voters
                .get_mut(&voter.id)
                .ok_or(RepoError::VoterNotFound(voter.id))?;
            existing.name = voter.name.clone();
            existing.email = voter.email.clone();
            existing.touch(now);
            Ok(())
        })
    }

    fn delete_single_voter(&self, id: VoterId) -> RepoResult<()> {
        self.mutate("voter_delete", |voters, _now| {
            voters
                .remove(&id)
                .map(|_| ())
                .ok_or(RepoError::VoterNotFound(id))
        })
    }

    fn create_voter_history(
        &self,
        voter_id: VoterId,
        poll_id: PollId,
        history: &PollRecordInput,
    ) -> RepoResult<()> {
        self.mutate("history_create", |voters, now| {
            let voter = voters
                .get_mut(&voter_id)
                .ok_or(RepoError::VoterNotFound(voter_id))?;
            if voter.history.contains_key(&poll_id) {
                return Err(RepoError::HistoryAlreadyExists { voter_id, poll_id });
            }
            voter.history.insert(
                poll_id,
                PollRecord::new(poll_id, history.vote_id, history.vote_date, now),
            );
            voter.touch(now);
            Ok(())
        })
    }

    fn update_voter_history_info(
        &self,
        voter_id: VoterId,
        poll_id: PollId,
        history: &PollRecordInput,
    ) -> RepoResult<()> {
        self.mutate("history_update", |voters, now| {
            let voter = voters
                .get_mut(&voter_id)
                .ok_or(RepoError::VoterNotFound(voter_id))?;
            let record = voter
                .history
                .get_mut(&poll_id)
                .ok_or(RepoError::HistoryNotFound { voter_id, poll_id })?;
            record.revise(history.vote_id, history.vote_date, now);
            voter.touch(now);
            Ok(())
        })
    }

    fn delete_single_voter_poll(&self, voter_id: VoterId, poll_id: PollId) -> RepoResult<()> {
        self.mutate("history_delete", |voters, now| {
            let voter = voters
                .get_mut(&voter_id)
                .ok_or(RepoError::VoterNotFound(voter_id))?;
            if voter.history.remove(&poll_id).is_none() {
                return Err(RepoError::HistoryNotFound { voter_id, poll_id });
            }
            voter.touch(now);
            Ok(())
        })
    }

    fn get_all_voters(&self) -> RepoResult<Vec<Voter>> {
        self.read(|voters| Ok(voters.values().cloned().collect()))
    }

    fn get_single_voter(&self, id: VoterId) -> RepoResult<Voter> {
        self.read(|voters| voters.get(&id).cloned().ok_or(RepoError::VoterNotFound(id)))
    }

    fn get_voter_history(&self, voter_id: VoterId) -> RepoResult<Vec<PollRecord>> {
        self.read(|voters| {
            let voter = voters
                .get(&voter_id)
                .ok_or(RepoError::VoterNotFound(voter_id))?;
            if !voter.has_history() {
                return Err(RepoError::NoHistory(voter_id));
            }
            Ok(voter.polls())
        })
    }

    fn get_single_event(&self, voter_id: VoterId, poll_id: PollId) -> RepoResult<PollRecord> {
        self.read(|voters| {
            let voter = voters
                .get(&voter_id)
                .ok_or(RepoError::VoterNotFound(voter_id))?;
            voter
                .poll(poll_id)
                .cloned()
                .ok_or(RepoError::HistoryNotFound { voter_id, poll_id })
        })
    }

    fn delete_all_voters(&self) -> RepoResult<usize> {
        self.mutate("voter_delete_all", |voters, _now| {
            let removed = voters.len();
            voters.clear();
            Ok(removed)
        })
    }
}

fn ensure_seeded(path: &Path) -> std::io::Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => fs::write(path, EMPTY_SNAPSHOT),
        Err(err) if err.kind() == ErrorKind::NotFound => fs::write(path, EMPTY_SNAPSHOT),
        Err(err) => Err(err),
    }
}

fn read_snapshot(path: &Path) -> Result<Vec<Voter>, StorageError> {
    ensure_seeded(path)?;
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

#[cfg(test)]
mod tests {
    use super::{ensure_seeded, read_snapshot};
    use std::fs;

    #[test]
    fn seeding_fills_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        ensure_seeded(&missing).unwrap();
        assert_eq!(fs::read(&missing).unwrap(), b"[]");

        let empty = dir.path().join("empty.json");
        fs::write(&empty, b"").unwrap();
        assert!(read_snapshot(&empty).unwrap().is_empty());
        assert_eq!(fs::read(&empty).unwrap(), b"[]");
    }

    #[test]
    fn seeding_leaves_existing_content_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, b"not json").unwrap();
        ensure_seeded(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"not json");
        assert!(read_snapshot(&path).is_err());
    }
}
