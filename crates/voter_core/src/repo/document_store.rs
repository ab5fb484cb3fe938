//! Key-value JSON document store seam.
//!
//! # Responsibility
//! - Expose the handful of document operations the document backend needs.
//! - Provide a Redis (JSON module) implementation and an in-process one.
//!
//! # Invariants
//! - `get_json` returns `Ok(None)` for a missing key; transport problems are
//!   always `Err`.
//! - Documents are stored and returned as whole JSON texts under path `.`.

use log::{error, info};
use redis::Commands;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub type StoreResult<T> = Result<T, StoreError>;

/// Transport-level failure talking to a document store.
#[derive(Debug)]
pub enum StoreError {
    Redis(redis::RedisError),
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis(err) => write!(f, "redis error: {err}"),
            Self::LockPoisoned => write!(f, "document store lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Redis(err) => Some(err),
            Self::LockPoisoned => None,
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(value: redis::RedisError) -> Self {
        Self::Redis(value)
    }
}

/// Minimal document-store interface used by `DocumentVoterRepository`.
pub trait DocumentStore {
    /// Dedicated existence query; never fetches the document.
    fn exists(&self, key: &str) -> StoreResult<bool>;
    fn get_json(&self, key: &str) -> StoreResult<Option<String>>;
    /// Writes the whole document, creating or replacing it.
    fn set_json(&self, key: &str, json: &str) -> StoreResult<()>;
    /// Returns whether a document was removed.
    fn delete(&self, key: &str) -> StoreResult<bool>;
    /// Lists keys matching a glob pattern such as `voter:*`.
    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;
}

/// Redis-backed store using the RedisJSON `JSON.GET`/`JSON.SET` commands.
pub struct RedisDocumentStore {
    conn: Mutex<redis::Connection>,
}

impl RedisDocumentStore {
    /// Opens a connection to `url` and verifies it with `PING`.
    pub fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url).map_err(|err| {
            error!("event=store_connect module=store status=error error={err}");
            StoreError::from(err)
        })?;
        let mut conn = client.get_connection()?;
        if let Err(err) = redis::cmd("PING").query::<String>(&mut conn) {
            error!("event=store_connect module=store status=error error={err}");
            return Err(err.into());
        }
        info!("event=store_connect module=store status=ok");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, redis::Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl DocumentStore for RedisDocumentStore {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let found: bool = conn.exists(key)?;
        Ok(found)
    }

    fn get_json(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn()?;
        let json: Option<String> = redis::cmd("JSON.GET")
            .arg(key)
            .arg(".")
            .query(&mut *conn)?;
        Ok(json)
    }

    fn set_json(&self, key: &str, json: &str) -> StoreResult<()> {
        let mut conn = self.conn()?;
        redis::cmd("JSON.SET")
            .arg(key)
            .arg(".")
            .arg(json)
            .query::<()>(&mut *conn)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let removed: i64 = conn.del(key)?;
        Ok(removed > 0)
    }

    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn()?;
        let keys: Vec<String> = conn.scan_match::<_, String>(pattern)?.collect();
        Ok(keys)
    }
}

/// Process-local store with the same semantics as the Redis one.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<BTreeMap<String, String>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn documents(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.documents.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.documents()?.contains_key(key))
    }

    fn get_json(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.documents()?.get(key).cloned())
    }

    fn set_json(&self, key: &str, json: &str) -> StoreResult<()> {
        self.documents()?.insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.documents()?.remove(key).is_some())
    }

    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let documents = self.documents()?;
        Ok(documents
            .keys()
            .filter(|key| matches_pattern(pattern, key))
            .cloned()
            .collect())
    }
}

// Only trailing `*` wildcards are understood; anything else is an exact match.
fn matches_pattern(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::{matches_pattern, DocumentStore, InMemoryDocumentStore};

    #[test]
    fn pattern_matching_supports_prefix_globs() {
        assert!(matches_pattern("voter:*", "voter:12"));
        assert!(!matches_pattern("voter:*", "poll:12"));
        assert!(matches_pattern("voter:1", "voter:1"));
        assert!(!matches_pattern("voter:1", "voter:12"));
    }

    #[test]
    fn in_memory_store_roundtrip() {
        let store = InMemoryDocumentStore::new();
        assert!(!store.exists("voter:1").unwrap());
        assert_eq!(store.get_json("voter:1").unwrap(), None);

        store.set_json("voter:1", "{}").unwrap();
        assert!(store.exists("voter:1").unwrap());
        assert_eq!(store.keys("voter:*").unwrap(), vec!["voter:1".to_string()]);

        assert!(store.delete("voter:1").unwrap());
        assert!(!store.delete("voter:1").unwrap());
        assert!(store.is_empty());
    }
}
