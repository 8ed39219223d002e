// src/client.rs
// Store client - connect/ping and handles down to collections

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::collection::Collection;
use crate::error::{Result, VinylBaseError};
use crate::storage::{Backend, FileStorage, MemoryStorage, Storage};
use crate::{log_info, log_warn};

/// Run-wide operation deadline
///
/// Created once at connect time and shared by every handle derived from
/// the client. Once it elapses, in-flight and subsequent operations fail;
/// nothing is retried.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    /// Deadline expiring `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Deadline {
            expires_at: Instant::now() + timeout,
        }
    }

    /// Time left, or `None` once elapsed
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at.checked_duration_since(Instant::now())
    }

    /// Fail with `DeadlineExceeded` once the deadline has elapsed
    pub fn check(&self) -> Result<()> {
        if Instant::now() >= self.expires_at {
            Err(VinylBaseError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

/// Parsed connection target
#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreTarget {
    Memory,
    File(PathBuf),
}

impl StoreTarget {
    /// Parse a store URI: `mem://...` or `file://<path>`
    fn parse(uri: &str) -> Result<StoreTarget> {
        if let Some(rest) = uri.strip_prefix("file://") {
            if rest.is_empty() {
                return Err(VinylBaseError::InvalidUri(format!(
                    "{} (missing file path)",
                    uri
                )));
            }
            return Ok(StoreTarget::File(PathBuf::from(rest)));
        }
        if uri.strip_prefix("mem://").is_some() || uri == "mem:" {
            return Ok(StoreTarget::Memory);
        }
        Err(VinylBaseError::InvalidUri(format!(
            "{} (expected mem:// or file://)",
            uri
        )))
    }
}

/// Handle to an open store
///
/// Generic over the storage backend: production code connects to a
/// `StoreClient<Backend>` via URI, tests can run directly on
/// `MemoryStorage`. The handle is an explicit value owned by the caller;
/// dropping it flushes the store.
pub struct StoreClient<S: Storage> {
    storage: Arc<RwLock<S>>,
    deadline: Deadline,
    uri: String,
}

impl StoreClient<Backend> {
    /// Connect to a store within a bounded deadline
    ///
    /// The deadline covers the whole client run, not just the connect. An
    /// unknown scheme, an unreadable file or an already-elapsed deadline
    /// surface as connection-class errors; nothing is retried.
    pub fn connect(uri: &str, timeout: Duration) -> Result<StoreClient<Backend>> {
        let deadline = Deadline::after(timeout);
        let backend = match StoreTarget::parse(uri)? {
            StoreTarget::Memory => Backend::Memory(MemoryStorage::new()),
            StoreTarget::File(path) => Backend::File(
                FileStorage::open(&path)
                    .map_err(|e| VinylBaseError::Connection(format!("{}: {}", uri, e)))?,
            ),
        };
        deadline
            .check()
            .map_err(|_| VinylBaseError::Connection(format!("{}: timed out while opening", uri)))?;

        log_info!("connected to {}", uri);
        Ok(StoreClient {
            storage: Arc::new(RwLock::new(backend)),
            deadline,
            uri: uri.to_string(),
        })
    }
}

impl<S: Storage> StoreClient<S> {
    /// Wrap an already-open storage backend (tests, embedding)
    pub fn with_storage(storage: S, timeout: Duration) -> StoreClient<S> {
        StoreClient {
            storage: Arc::new(RwLock::new(storage)),
            deadline: Deadline::after(timeout),
            uri: "(embedded)".to_string(),
        }
    }

    /// Liveness check of the backing store
    pub fn ping(&self) -> Result<()> {
        self.deadline.check()?;
        self.storage.read().ping()
    }

    /// Handle to a named database
    pub fn database(&self, name: &str) -> DatabaseHandle<S> {
        DatabaseHandle {
            name: name.to_string(),
            storage: Arc::clone(&self.storage),
            deadline: self.deadline,
        }
    }

    /// Connection URI this client was opened with
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The run-wide deadline
    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Flush pending writes to persistent storage
    pub fn flush(&self) -> Result<()> {
        self.storage.write().flush()
    }
}

impl<S: Storage> Drop for StoreClient<S> {
    fn drop(&mut self) {
        if let Err(e) = self.storage.write().flush() {
            log_warn!("flush on close failed for {}: {}", self.uri, e);
        }
    }
}

/// Handle to a named database within a store
///
/// Collections are addressed by the database-name + collection-name pair;
/// the pair forms the storage namespace `db.collection`.
pub struct DatabaseHandle<S: Storage> {
    name: String,
    storage: Arc<RwLock<S>>,
    deadline: Deadline,
}

impl<S: Storage> DatabaseHandle<S> {
    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Typed handle to a collection of this database
    pub fn collection<T>(&self, name: &str) -> Collection<T, S>
    where
        T: Serialize + DeserializeOwned,
    {
        Collection::new(
            format!("{}.{}", self.name, name),
            Arc::clone(&self.storage),
            self.deadline,
        )
    }

    /// Names of this database's collections
    pub fn collection_names(&self) -> Vec<String> {
        let prefix = format!("{}.", self.name);
        self.storage
            .read()
            .list_collections()
            .into_iter()
            .filter_map(|ns| ns.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}
