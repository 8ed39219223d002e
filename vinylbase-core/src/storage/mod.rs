// src/storage/mod.rs
//! Storage abstraction for VinylBase
//!
//! This module defines the storage interface the collection layer runs on.
//! This enables:
//! - Dependency injection
//! - Fast tests with MemoryStorage
//! - Runtime backend selection from the connection URI
//!
//! # Architecture
//!
//! ```text
//! Storage trait (unified interface)
//!   ├── MemoryStorage (ephemeral, mem:// and tests)
//!   ├── FileStorage (persistent JSON-lines journal, file://)
//!   └── Backend (runtime enum over the two)
//! ```

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::record::RecordId;

/// Per-collection metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub name: String,
    /// Live record count
    pub document_count: u64,
    /// High-water mark for auto-increment ids
    pub last_id: u64,
    pub created_at: DateTime<Utc>,
}

impl CollectionMeta {
    pub fn new(name: &str) -> Self {
        CollectionMeta {
            name: name.to_string(),
            document_count: 0,
            last_id: 0,
            created_at: Utc::now(),
        }
    }
}

/// Core storage abstraction
///
/// All backends store one live JSON object per record id, keep records in
/// insertion order, and track per-collection metadata.
pub trait Storage: Send {
    // ========================================================================
    // COLLECTION MANAGEMENT
    // ========================================================================

    /// Create a new collection; fails if it already exists
    fn create_collection(&mut self, name: &str) -> Result<()>;

    /// Drop a collection and every record in it; fails if it doesn't exist
    fn drop_collection(&mut self, name: &str) -> Result<()>;

    /// List all collection names
    fn list_collections(&self) -> Vec<String>;

    // ========================================================================
    // METADATA ACCESS
    // ========================================================================

    fn get_collection_meta(&self, name: &str) -> Option<&CollectionMeta>;

    fn get_collection_meta_mut(&mut self, name: &str) -> Option<&mut CollectionMeta>;

    // ========================================================================
    // RECORD OPERATIONS
    // ========================================================================

    /// Insert a record under an explicit id; fails on a duplicate id
    fn insert_document(&mut self, collection: &str, id: &RecordId, doc: &Value) -> Result<()>;

    /// Read a record by id; `None` if absent (including absent collection)
    fn read_document(&self, collection: &str, id: &RecordId) -> Result<Option<Value>>;

    /// Replace the record stored under `id`, keeping its scan position.
    /// Returns whether a record was there to replace.
    fn replace_document(&mut self, collection: &str, id: &RecordId, doc: &Value) -> Result<bool>;

    /// Remove the record stored under `id`; returns whether one was removed
    fn remove_document(&mut self, collection: &str, id: &RecordId) -> Result<bool>;

    /// All records of a collection in insertion order.
    /// An absent collection scans as empty.
    fn scan_documents(&self, collection: &str) -> Result<Vec<(RecordId, Value)>>;

    // ========================================================================
    // LIVENESS & PERSISTENCE
    // ========================================================================

    /// Cheap liveness check of the backing store
    fn ping(&self) -> Result<()>;

    /// Flush any pending writes to persistent storage
    fn flush(&mut self) -> Result<()>;
}

/// Runtime-selected storage backend
///
/// `StoreClient::connect` picks the variant from the URI scheme; everything
/// above this type stays generic over `S: Storage`.
pub enum Backend {
    Memory(MemoryStorage),
    File(FileStorage),
}

impl Storage for Backend {
    fn create_collection(&mut self, name: &str) -> Result<()> {
        match self {
            Backend::Memory(s) => s.create_collection(name),
            Backend::File(s) => s.create_collection(name),
        }
    }

    fn drop_collection(&mut self, name: &str) -> Result<()> {
        match self {
            Backend::Memory(s) => s.drop_collection(name),
            Backend::File(s) => s.drop_collection(name),
        }
    }

    fn list_collections(&self) -> Vec<String> {
        match self {
            Backend::Memory(s) => s.list_collections(),
            Backend::File(s) => s.list_collections(),
        }
    }

    fn get_collection_meta(&self, name: &str) -> Option<&CollectionMeta> {
        match self {
            Backend::Memory(s) => s.get_collection_meta(name),
            Backend::File(s) => s.get_collection_meta(name),
        }
    }

    fn get_collection_meta_mut(&mut self, name: &str) -> Option<&mut CollectionMeta> {
        match self {
            Backend::Memory(s) => s.get_collection_meta_mut(name),
            Backend::File(s) => s.get_collection_meta_mut(name),
        }
    }

    fn insert_document(&mut self, collection: &str, id: &RecordId, doc: &Value) -> Result<()> {
        match self {
            Backend::Memory(s) => s.insert_document(collection, id, doc),
            Backend::File(s) => s.insert_document(collection, id, doc),
        }
    }

    fn read_document(&self, collection: &str, id: &RecordId) -> Result<Option<Value>> {
        match self {
            Backend::Memory(s) => s.read_document(collection, id),
            Backend::File(s) => s.read_document(collection, id),
        }
    }

    fn replace_document(&mut self, collection: &str, id: &RecordId, doc: &Value) -> Result<bool> {
        match self {
            Backend::Memory(s) => s.replace_document(collection, id, doc),
            Backend::File(s) => s.replace_document(collection, id, doc),
        }
    }

    fn remove_document(&mut self, collection: &str, id: &RecordId) -> Result<bool> {
        match self {
            Backend::Memory(s) => s.remove_document(collection, id),
            Backend::File(s) => s.remove_document(collection, id),
        }
    }

    fn scan_documents(&self, collection: &str) -> Result<Vec<(RecordId, Value)>> {
        match self {
            Backend::Memory(s) => s.scan_documents(collection),
            Backend::File(s) => s.scan_documents(collection),
        }
    }

    fn ping(&self) -> Result<()> {
        match self {
            Backend::Memory(s) => s.ping(),
            Backend::File(s) => s.ping(),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            Backend::Memory(s) => s.flush(),
            Backend::File(s) => s.flush(),
        }
    }
}
