//! Voter and poll record domain model.
//!
//! # Responsibility
//! - Define the canonical voter record and its embedded poll history.
//! - Own the JSON wire shape shared by the snapshot file and document store.
//!
//! # Invariants
//! - `id` never changes after creation.
//! - `created` is stamped once; `modified` moves on every mutation of the
//!   voter or any of its poll records.
//! - An empty history is serialized as `null` and `null`/absent decodes to an
//!   empty history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Externally supplied voter identity.
pub type VoterId = i64;

/// Poll identity, unique only within one voter's history.
pub type PollId = i64;

/// Per-voter poll history keyed by poll id.
pub type HistoryMap = BTreeMap<PollId, PollRecord>;

/// Unix seconds of `0001-01-01T00:00:00Z`, the zero instant written by other
/// producers of the snapshot format.
const ZERO_INSTANT_UNIX_SECS: i64 = -62_135_596_800;

/// Returns whether `value` carries no real point in time.
///
/// Both the Rust default (`1970-01-01T00:00:00Z`) and the year-one zero
/// instant count as unset.
pub fn is_unset_timestamp(value: &DateTime<Utc>) -> bool {
    *value == DateTime::<Utc>::default()
        || (value.timestamp() == ZERO_INSTANT_UNIX_SECS && value.timestamp_subsec_nanos() == 0)
}

/// One voting event recorded for a voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRecord {
    pub poll_id: PollId,
    pub vote_id: i64,
    pub vote_date: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl PollRecord {
    /// Creates a record whose `created` and `modified` are both `now`.
    pub fn new(poll_id: PollId, vote_id: i64, vote_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            poll_id,
            vote_id,
            vote_date,
            created: now,
            modified: now,
        }
    }

    /// Replaces the vote payload, keeping `created`.
    pub fn revise(&mut self, vote_id: i64, vote_date: DateTime<Utc>, now: DateTime<Utc>) {
        self.vote_id = vote_id;
        self.vote_date = vote_date;
        self.modified = now;
    }
}

/// Canonical voter record, as persisted and as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub id: VoterId,
    pub name: String,
    pub email: String,
    #[serde(default, with = "nullable_history")]
    pub history: HistoryMap,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Voter {
    /// Creates a voter with no history, stamped at `now`.
    pub fn new(
        id: VoterId,
        name: impl Into<String>,
        email: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            history: HistoryMap::new(),
            created: now,
            modified: now,
        }
    }

    /// Returns whether at least one poll record exists.
    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    /// Returns one poll record by id.
    pub fn poll(&self, poll_id: PollId) -> Option<&PollRecord> {
        self.history.get(&poll_id)
    }

    /// Returns poll records in ascending poll id order.
    pub fn polls(&self) -> Vec<PollRecord> {
        self.history.values().cloned().collect()
    }

    /// Marks the voter as modified at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.modified = now;
    }
}

mod nullable_history {
    use super::HistoryMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(history: &HistoryMap, serializer: S) -> Result<S::Ok, S::Error> {
        if history.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(history)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HistoryMap, D::Error> {
        Option::<HistoryMap>::deserialize(deserializer).map(Option::unwrap_or_default)
    }
}

#[cfg(test)]
mod tests {
    use super::{is_unset_timestamp, PollRecord, Voter};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn unset_timestamp_covers_default_and_year_one() {
        assert!(is_unset_timestamp(&DateTime::<Utc>::default()));
        let year_one: DateTime<Utc> = "0001-01-01T00:00:00Z".parse().unwrap();
        assert!(is_unset_timestamp(&year_one));
        assert!(!is_unset_timestamp(&at(1_709_713_555)));
    }

    #[test]
    fn revise_keeps_created() {
        let mut record = PollRecord::new(3, 7, at(100), at(1_000));
        record.revise(8, at(200), at(2_000));
        assert_eq!(record.created, at(1_000));
        assert_eq!(record.modified, at(2_000));
        assert_eq!(record.vote_id, 8);
        assert_eq!(record.poll_id, 3);
    }

    #[test]
    fn empty_history_serializes_as_null() {
        let voter = Voter::new(1, "Sam", "sam@example.com", at(1_000));
        let json = serde_json::to_value(&voter).unwrap();
        assert!(json["history"].is_null());
    }
}
