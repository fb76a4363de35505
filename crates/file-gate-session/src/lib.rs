#![warn(missing_docs)]
//! # file-gate-session
//!
//! ## Purpose
//! Persists the session lock and decides which scene a freshly loaded portal
//! resumes into.
//!
//! ## Responsibilities
//! - Define a storage capability trait ([`KeyValueStore`]) with in-memory and
//!   directory-backed implementations.
//! - Read, write, and clear the single [`LockRecord`] through [`LockStore`],
//!   falling back to memory-only coordination when storage fails.
//! - Resolve the startup scene from the stored lock ([`resolve_session`]).
//!
//! ## Data flow
//! Portal startup -> [`resolve_session`] reads the lock -> stale or finished
//! locks are cleared -> a [`SessionResolution`] names the initial scene.
//!
//! ## Ownership and lifetimes
//! Backends are shared as `Arc<dyn KeyValueStore>` so several portals (the
//! analogue of browser tabs) can coordinate through one store. Each
//! [`LockStore`] owns its private memory fallback.
//!
//! ## Error model
//! Backend failures surface as [`StoreError`]. The lock store logs them and
//! degrades rather than aborting; corrupt records read as absent.
//!
//! ## Concurrency notes
//! There is no atomicity beyond what a backend provides natively. Two portals
//! sharing a store can race and the last write wins.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use file_gate_core::{LockRecord, LockStatus, Scene};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Minimal string key-value capability backing the lock.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backend rejects the removal.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store used for tests and as the degraded fallback.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Durable store keeping one JSON file per key inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written record.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) a store rooted at `dir`.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] when the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the stored files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StoreError::Io(error)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StoreError::Io(error)),
        }
    }
}

/// Reads and writes the single lock record under a fixed key.
///
/// The first backend failure switches this store to memory-only coordination
/// for the rest of its life; other portals no longer see its writes.
pub struct LockStore {
    key: String,
    backend: Arc<dyn KeyValueStore>,
    fallback: MemoryStore,
    degraded: bool,
}

impl LockStore {
    /// Creates a lock store over `backend` using `key`.
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            backend,
            fallback: MemoryStore::new(),
            degraded: false,
        }
    }

    /// Returns `true` once storage failed and only memory is in use.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Writes `{timestamp: now_ms, status}`.
    ///
    /// # Errors
    /// Returns the backend [`StoreError`] when the durable write failed. The
    /// record is still held in the memory fallback, so callers may proceed.
    pub fn set_lock(&mut self, status: LockStatus, now_ms: u64) -> Result<LockRecord, StoreError> {
        let record = LockRecord::new(status, now_ms);
        let raw = record.to_json().map_err(|error| StoreError::Codec(error.to_string()))?;

        if !self.degraded {
            match self.backend.set(&self.key, &raw) {
                Ok(()) => {
                    debug!(status = %status, timestamp = now_ms, "session lock written");
                    return Ok(record);
                }
                Err(error) => {
                    warn!(status = %status, %error, "could not set session lock");
                    self.degrade();
                    self.fallback.set(&self.key, &raw)?;
                    return Err(error);
                }
            }
        }

        self.fallback.set(&self.key, &raw)?;
        Ok(record)
    }

    /// Removes the lock record.
    ///
    /// # Errors
    /// Returns the backend [`StoreError`] when the durable removal failed. The
    /// memory fallback is cleared regardless.
    pub fn clear_lock(&mut self) -> Result<(), StoreError> {
        self.fallback.remove(&self.key)?;
        if self.degraded {
            return Ok(());
        }

        match self.backend.remove(&self.key) {
            Ok(()) => {
                debug!("session lock cleared");
                Ok(())
            }
            Err(error) => {
                warn!(%error, "could not clear session lock");
                self.degrade();
                Err(error)
            }
        }
    }

    /// Returns the stored record, or `None` when absent, corrupt, or unreadable.
    pub fn read_lock(&mut self) -> Option<LockRecord> {
        let raw = if self.degraded {
            self.fallback.get(&self.key).ok().flatten()
        } else {
            match self.backend.get(&self.key) {
                Ok(raw) => raw,
                Err(error) => {
                    warn!(%error, "error reading session lock");
                    self.degrade();
                    self.fallback.get(&self.key).ok().flatten()
                }
            }
        }?;

        let record = LockRecord::decode(&raw);
        if record.is_none() {
            warn!("stored session lock is corrupt; treating as absent");
        }
        record
    }

    fn degrade(&mut self) {
        if !self.degraded {
            info!("session lock storage unavailable; continuing with memory-only coordination");
            self.degraded = true;
        }
    }
}

/// Why the resolver picked its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeReason {
    /// No (readable) lock was stored.
    NoLock,
    /// The lock was older than the stale threshold and was cleared.
    StaleLock,
    /// Another session is counting down right now.
    ActiveElsewhere,
    /// A prior session reached the download and never cleared its lock.
    FinishedSession,
}

/// Startup decision returned by [`resolve_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResolution {
    /// Scene to show first.
    pub scene: Scene,
    /// Branch of the policy that produced `scene`.
    pub reason: ResumeReason,
    /// Lock observed at startup, before any clearing.
    pub observed: Option<LockRecord>,
}

/// Inspects the lock once at startup and picks the initial scene.
///
/// Policy, in order:
/// 1. no lock -> `Login`;
/// 2. older than `stale_threshold_ms` -> clear, `Login`;
/// 3. `waiting` -> `Busy`, lock left untouched;
/// 4. `ready` -> clear, `Login`.
///
/// A `ready` lock is evicted even if its own portal has not clicked the
/// download yet; that portal's download control stays usable.
pub fn resolve_session(
    locks: &mut LockStore,
    now_ms: u64,
    stale_threshold_ms: u64,
) -> SessionResolution {
    let Some(record) = locks.read_lock() else {
        return SessionResolution {
            scene: Scene::Login,
            reason: ResumeReason::NoLock,
            observed: None,
        };
    };

    if record.is_stale(now_ms, stale_threshold_ms) {
        info!(age_ms = record.age_ms(now_ms), "detected and cleared stale lock");
        let _ = locks.clear_lock();
        return SessionResolution {
            scene: Scene::Login,
            reason: ResumeReason::StaleLock,
            observed: Some(record),
        };
    }

    match record.status {
        LockStatus::Waiting => {
            info!(age_ms = record.age_ms(now_ms), "another session is counting down");
            SessionResolution {
                scene: Scene::Busy,
                reason: ResumeReason::ActiveElsewhere,
                observed: Some(record),
            }
        }
        LockStatus::Ready => {
            info!("previous session finished; clearing its ready lock");
            let _ = locks.clear_lock();
            SessionResolution {
                scene: Scene::Login,
                reason: ResumeReason::FinishedSession,
                observed: Some(record),
            }
        }
    }
}

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend refused the operation (quota, disabled storage, poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// Filesystem failure in the durable backend.
    #[error("storage io failure: {0}")]
    Io(#[from] io::Error),
    /// Record could not be encoded.
    #[error("lock record codec failure: {0}")]
    Codec(String),
}
