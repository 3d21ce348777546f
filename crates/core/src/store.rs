use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::model::{Collection, NewUser, Snapshot, UserRecord};

/// File-backed cache of the six content collections. The disk copy is the
/// source of truth: every persist re-reads it, and the watcher replaces the
/// in-memory snapshot whenever the backing files change underneath us.
pub struct DocumentStore {
    primary_path: PathBuf,
    fallback_path: PathBuf,
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    snapshot: Snapshot,
    last_loaded: DateTime<Utc>,
}

impl DocumentStore {
    pub fn open(primary_path: impl Into<PathBuf>, fallback_path: impl Into<PathBuf>) -> Self {
        let store = Self {
            primary_path: primary_path.into(),
            fallback_path: fallback_path.into(),
            inner: Mutex::new(StoreInner {
                snapshot: Snapshot::default(),
                last_loaded: Utc::now(),
            }),
        };
        store.load();
        store
    }

    /// Re-reads the authoritative backing file and replaces the in-memory
    /// snapshot wholesale. Read or parse failures yield a fully-defaulted
    /// empty snapshot, never an error.
    pub fn load(&self) -> Snapshot {
        let mut inner = self.lock();
        self.reload_locked(&mut inner);
        inner.snapshot.clone()
    }

    /// Writes the in-memory snapshot to the authoritative file, then
    /// immediately re-loads so memory mirrors disk exactly.
    pub fn persist(&self) -> Result<()> {
        let mut inner = self.lock();
        self.persist_locked(&mut inner)
    }

    /// Appends a record to the named collection and persists. Runs entirely
    /// under the store lock: concurrent writers serialize here.
    pub fn append(&self, which: Collection, record: Value) -> Result<()> {
        let mut inner = self.lock();
        inner.snapshot.collection_mut(which).push(record);
        self.persist_locked(&mut inner)?;
        info!(collection = which.as_str(), "record appended");
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot.clone()
    }

    pub fn last_loaded(&self) -> DateTime<Utc> {
        self.lock().last_loaded
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary_path
    }

    pub fn fallback_path(&self) -> &Path {
        &self.fallback_path
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // A poisoned lock is recoverable here: the snapshot is rebuilt from
        // disk on the next load.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist_locked(&self, inner: &mut StoreInner) -> Result<()> {
        // Precedence is re-evaluated on every persist, never cached.
        let target = if self.primary_path.exists() {
            &self.primary_path
        } else {
            &self.fallback_path
        };
        let body = serde_json::to_string_pretty(&inner.snapshot)?;
        fs::write(target, body)?;
        self.reload_locked(inner);
        Ok(())
    }

    fn reload_locked(&self, inner: &mut StoreInner) {
        inner.snapshot = self.read_snapshot();
        inner.last_loaded = Utc::now();
    }

    fn read_snapshot(&self) -> Snapshot {
        if self.primary_path.exists() {
            match read_snapshot_file(&self.primary_path) {
                Ok(snapshot) => return snapshot,
                Err(err) => warn!(
                    path = %self.primary_path.display(),
                    error = %err,
                    "primary data file unreadable, falling back"
                ),
            }
        }
        match read_snapshot_file(&self.fallback_path) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(
                    path = %self.fallback_path.display(),
                    error = %err,
                    "failed to read database, serving empty snapshot"
                );
                Snapshot::default()
            }
        }
    }
}

fn read_snapshot_file(path: &Path) -> Result<Snapshot> {
    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    Ok(Snapshot::from_value(value)?)
}

/// Registered users, kept in their own file with their own lock so user
/// writes never contend with content writes.
pub struct UserRegistry {
    path: PathBuf,
    users: Mutex<Vec<UserRecord>>,
}

impl UserRegistry {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let registry = Self {
            path: path.into(),
            users: Mutex::new(Vec::new()),
        };
        registry.load();
        registry
    }

    pub fn load(&self) -> Vec<UserRecord> {
        let mut users = self.lock();
        *users = self.read_users();
        users.clone()
    }

    /// Validates the input, assigns id and createdAt, appends and persists.
    /// The whole sequence holds the registry lock.
    pub fn create(&self, input: NewUser) -> Result<UserRecord> {
        let record = UserRecord::from_input(input)?;
        let mut users = self.lock();
        users.push(record.clone());
        let body = serde_json::to_string_pretty(&*users)?;
        fs::write(&self.path, body)?;
        *users = self.read_users();
        Ok(record)
    }

    pub fn users(&self) -> Vec<UserRecord> {
        self.lock().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UserRecord>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_users(&self) -> Vec<UserRecord> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(path = %self.path.display(), error = %err, "users file unreadable, serving empty registry");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        }
    }
}
