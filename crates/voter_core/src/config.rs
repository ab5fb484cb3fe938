//! Storage backend selection.
//!
//! # Responsibility
//! - Resolve which backend to use and where it lives from environment-style
//!   key/value lookups.
//! - Construct the configured repository behind the shared contract.
//!
//! # Invariants
//! - Unset variables fall back to documented defaults.
//! - An unknown backend name is an error, never a silent default.

use crate::repo::document_repo::DocumentVoterRepository;
use crate::repo::document_store::RedisDocumentStore;
use crate::repo::snapshot_repo::JsonFileVoterRepository;
use crate::repo::voter_repo::{RepoError, RepoResult, VoterRepository};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const STORE_ENV: &str = "VOTER_STORE";
pub const DB_PATH_ENV: &str = "VOTER_DB_PATH";
pub const BACKUP_PATH_ENV: &str = "VOTER_BACKUP_PATH";
pub const REDIS_URL_ENV: &str = "REDIS_URL";

pub const DEFAULT_DB_PATH: &str = "./Data";
pub const DEFAULT_BACKUP_PATH: &str = "./Data.Bak";
pub const DEFAULT_REDIS_URL: &str = "redis://0.0.0.0:6379";

/// Storage engine behind the voter repository contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Whole collection in one JSON file.
    Snapshot,
    /// One JSON document per voter in Redis.
    Document,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "snapshot" | "file" => Ok(Self::Snapshot),
            "redis" | "document" => Ok(Self::Document),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Document => "document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownBackend(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(value) => write!(
                f,
                "unsupported storage backend `{value}`; expected json|redis"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved storage settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub snapshot_path: PathBuf,
    pub backup_path: PathBuf,
    pub redis_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Snapshot,
            snapshot_path: PathBuf::from(DEFAULT_DB_PATH),
            backup_path: PathBuf::from(DEFAULT_BACKUP_PATH),
            redis_url: DEFAULT_REDIS_URL.to_string(),
        }
    }
}

impl StorageConfig {
    /// Reads settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let backend = match value(STORE_ENV) {
            Some(raw) => StorageBackend::parse(&raw)?,
            None => defaults.backend,
        };

        Ok(Self {
            backend,
            snapshot_path: value(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            backup_path: value(BACKUP_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.backup_path),
            redis_url: value(REDIS_URL_ENV)
                .map(|raw| normalize_redis_url(&raw))
                .unwrap_or(defaults.redis_url),
        })
    }
}

/// Adds the `redis://` scheme to bare `host:port` locations.
pub fn normalize_redis_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("redis://{trimmed}")
    }
}

/// Opens the repository selected by `config`.
///
/// # Errors
/// - `LoadFailed` when the snapshot file cannot be seeded or the document
///   store cannot be reached.
pub fn open_repository(config: &StorageConfig) -> RepoResult<Box<dyn VoterRepository + Send + Sync>> {
    info!(
        "event=repo_open module=config status=start backend={}",
        config.backend.as_str()
    );
    let repo: Box<dyn VoterRepository + Send + Sync> = match config.backend {
        StorageBackend::Snapshot => Box::new(JsonFileVoterRepository::open(&config.snapshot_path)?),
        StorageBackend::Document => {
            let store = RedisDocumentStore::connect(&config.redis_url).map_err(RepoError::load)?;
            Box::new(DocumentVoterRepository::new(store))
        }
    };
    info!(
        "event=repo_open module=config status=ok backend={}",
        config.backend.as_str()
    );
    Ok(repo)
}

/// Replaces the configured snapshot file with the configured backup.
///
/// Returns the number of bytes restored. Restore always targets the snapshot
/// file, whichever backend `config` selects for serving.
pub fn restore_snapshot(config: &StorageConfig) -> RepoResult<u64> {
    let repo = JsonFileVoterRepository::open(&config.snapshot_path)?;
    repo.restore_from(&config.backup_path)
}
