// storage/memory.rs
//! Pure in-memory storage backend
//!
//! Backs `mem://` connections and fast unit tests. Records live in a Vec
//! per collection so scans preserve insertion order; data is lost when the
//! storage is dropped.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Result, VinylBaseError};
use crate::record::RecordId;
use crate::storage::{CollectionMeta, Storage};

struct CollectionData {
    meta: CollectionMeta,
    /// Records in insertion order, one live version per id
    records: Vec<(RecordId, Value)>,
}

/// In-memory storage backend (ephemeral)
pub struct MemoryStorage {
    collections: HashMap<String, CollectionData>,
}

impl MemoryStorage {
    /// Create a new empty in-memory storage
    pub fn new() -> Self {
        MemoryStorage {
            collections: HashMap::new(),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn create_collection(&mut self, name: &str) -> Result<()> {
        if self.collections.contains_key(name) {
            return Err(VinylBaseError::CollectionExists(name.to_string()));
        }

        self.collections.insert(
            name.to_string(),
            CollectionData {
                meta: CollectionMeta::new(name),
                records: Vec::new(),
            },
        );

        Ok(())
    }

    fn drop_collection(&mut self, name: &str) -> Result<()> {
        if self.collections.remove(name).is_none() {
            return Err(VinylBaseError::CollectionNotFound(name.to_string()));
        }
        Ok(())
    }

    fn list_collections(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    fn get_collection_meta(&self, name: &str) -> Option<&CollectionMeta> {
        self.collections.get(name).map(|c| &c.meta)
    }

    fn get_collection_meta_mut(&mut self, name: &str) -> Option<&mut CollectionMeta> {
        self.collections.get_mut(name).map(|c| &mut c.meta)
    }

    fn insert_document(&mut self, collection: &str, id: &RecordId, doc: &Value) -> Result<()> {
        let data = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| VinylBaseError::CollectionNotFound(collection.to_string()))?;

        if data.records.iter().any(|(existing, _)| existing == id) {
            return Err(VinylBaseError::DuplicateId(id.to_string()));
        }

        data.records.push((id.clone(), doc.clone()));
        data.meta.document_count += 1;

        // Keep the auto-increment high-water mark ahead of explicit int ids
        if let RecordId::Int(i) = id {
            if *i > data.meta.last_id as i64 {
                data.meta.last_id = *i as u64;
            }
        }

        Ok(())
    }

    fn read_document(&self, collection: &str, id: &RecordId) -> Result<Option<Value>> {
        let Some(data) = self.collections.get(collection) else {
            return Ok(None);
        };

        Ok(data
            .records
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, doc)| doc.clone()))
    }

    fn replace_document(&mut self, collection: &str, id: &RecordId, doc: &Value) -> Result<bool> {
        let Some(data) = self.collections.get_mut(collection) else {
            return Ok(false);
        };

        for (existing, stored) in data.records.iter_mut() {
            if existing == id {
                *stored = doc.clone();
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn remove_document(&mut self, collection: &str, id: &RecordId) -> Result<bool> {
        let Some(data) = self.collections.get_mut(collection) else {
            return Ok(false);
        };

        let before = data.records.len();
        data.records.retain(|(existing, _)| existing != id);
        let removed = data.records.len() != before;

        if removed {
            data.meta.document_count -= 1;
        }

        Ok(removed)
    }

    fn scan_documents(&self, collection: &str) -> Result<Vec<(RecordId, Value)>> {
        match self.collections.get(collection) {
            Some(data) => Ok(data.records.clone()),
            None => Ok(Vec::new()),
        }
    }

    fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // No-op for memory storage (nothing to flush)
        Ok(())
    }
}
