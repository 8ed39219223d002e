// src/collection.rs
// Typed collection handle - CRUD operations over one collection
//
// One typed path: records go in and come out as `T` via serde; the raw
// JSON object is internal to this module and the storage layer.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::Deadline;
use crate::delta::Delta;
use crate::error::{Result, VinylBaseError};
use crate::filter::Filter;
use crate::record::RecordId;
use crate::storage::Storage;
use crate::{log_debug, log_info};

/// Result of insert_many
#[derive(Debug, Clone)]
pub struct InsertManyResult {
    /// Assigned identifiers, in input order
    pub inserted_ids: Vec<RecordId>,
    pub inserted_count: usize,
}

/// Typed handle to one collection
///
/// Obtained from [`DatabaseHandle::collection`](crate::DatabaseHandle::collection).
/// Generic over the record type and the storage backend; every operation
/// checks the run-wide deadline first and returns a distinguishable error
/// on failure. Absence is `None`/`0`, never an error.
pub struct Collection<T, S: Storage> {
    namespace: String,
    storage: Arc<RwLock<S>>,
    deadline: Deadline,
    _record: PhantomData<fn() -> T>,
}

impl<T, S: Storage> Collection<T, S> {
    pub(crate) fn new(namespace: String, storage: Arc<RwLock<S>>, deadline: Deadline) -> Self {
        Collection {
            namespace,
            storage,
            deadline,
            _record: PhantomData,
        }
    }

    /// Storage namespace of this collection (`db.collection`)
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn ensure_collection(&self, storage: &mut S) -> Result<()> {
        if storage.get_collection_meta(&self.namespace).is_none() {
            storage.create_collection(&self.namespace)?;
        }
        Ok(())
    }
}

impl<T, S> Collection<T, S>
where
    T: Serialize + DeserializeOwned,
    S: Storage,
{
    fn encode(&self, record: &T) -> Result<Map<String, Value>> {
        let value = serde_json::to_value(record)
            .map_err(|e| VinylBaseError::Write(format!("record does not serialize: {}", e)))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(VinylBaseError::Write(
                "record must serialize to a JSON object".to_string(),
            )),
        }
    }

    fn decode(&self, doc: Value) -> Result<T> {
        serde_json::from_value(doc)
            .map_err(|e| VinylBaseError::Read(format!("record does not decode: {}", e)))
    }

    /// Pick the identifier for a record about to be persisted: honor a
    /// caller-provided `_id`, otherwise auto-increment.
    fn assign_id(&self, storage: &S, doc: &Map<String, Value>) -> Result<RecordId> {
        match doc.get("_id") {
            None | Some(Value::Null) => {
                let last_id = storage
                    .get_collection_meta(&self.namespace)
                    .map(|meta| meta.last_id)
                    .unwrap_or(0);
                Ok(RecordId::new_auto(last_id))
            }
            Some(value) => RecordId::from_value(value).ok_or_else(|| {
                VinylBaseError::Write(format!("invalid _id in record: {}", value))
            }),
        }
    }

    /// Persist one record, returning its assigned identifier
    pub fn insert_one(&self, record: &T) -> Result<RecordId> {
        self.deadline.check()?;
        let mut doc = self.encode(record)?;

        let mut storage = self.storage.write();
        self.ensure_collection(&mut storage)?;

        let id = self.assign_id(&storage, &doc)?;
        doc.insert("_id".to_string(), id.to_value());
        storage.insert_document(&self.namespace, &id, &Value::Object(doc))?;

        log_debug!("{}: inserted record {}", self.namespace, id);
        Ok(id)
    }

    /// Persist a batch of records, identifiers returned in input order
    ///
    /// The batch is serialized up front, so a malformed record fails the
    /// call before anything is written. Writes are per-item; there is no
    /// cross-item transaction guarantee.
    pub fn insert_many(&self, records: &[T]) -> Result<InsertManyResult> {
        self.deadline.check()?;

        let mut docs = Vec::with_capacity(records.len());
        for record in records {
            docs.push(self.encode(record)?);
        }

        let mut storage = self.storage.write();
        self.ensure_collection(&mut storage)?;

        let mut inserted_ids = Vec::with_capacity(docs.len());
        for mut doc in docs {
            let id = self.assign_id(&storage, &doc)?;
            doc.insert("_id".to_string(), id.to_value());
            storage.insert_document(&self.namespace, &id, &Value::Object(doc))?;
            inserted_ids.push(id);
        }

        log_debug!("{}: inserted {} records", self.namespace, inserted_ids.len());
        Ok(InsertManyResult {
            inserted_count: inserted_ids.len(),
            inserted_ids,
        })
    }

    /// Lazy, finite, one-shot cursor over records matching the filter
    ///
    /// Matching ids are snapshotted here; records are read and decoded one
    /// by one as the cursor is advanced. The empty filter matches all
    /// records, an absent collection yields an empty cursor.
    pub fn find(&self, filter: &Filter) -> Result<FindCursor<'_, T, S>> {
        self.deadline.check()?;

        let storage = self.storage.read();
        let ids: Vec<RecordId> = storage
            .scan_documents(&self.namespace)?
            .into_iter()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(id, _)| id)
            .collect();

        log_debug!("{}: find matched {} records", self.namespace, ids.len());
        Ok(FindCursor {
            collection: self,
            ids,
            position: 0,
        })
    }

    /// First record matching the filter, in scan order
    pub fn find_one(&self, filter: &Filter) -> Result<Option<T>> {
        self.deadline.check()?;

        let storage = self.storage.read();
        for (_, doc) in storage.scan_documents(&self.namespace)? {
            if filter.matches(&doc) {
                return self.decode(doc).map(Some);
            }
        }
        Ok(None)
    }

    /// Apply a delta to the record with the given identifier
    ///
    /// Returns the count of records actually changed (0 or 1). A missing
    /// record or a delta that changes nothing both count 0. The identifier
    /// itself is immutable.
    pub fn update_by_id(&self, id: &RecordId, delta: &Delta) -> Result<u64> {
        self.deadline.check()?;

        let mut storage = self.storage.write();
        let Some(mut doc) = storage.read_document(&self.namespace, id)? else {
            return Ok(0);
        };

        if !delta.apply(&mut doc) {
            return Ok(0);
        }
        if let Value::Object(ref mut map) = doc {
            map.insert("_id".to_string(), id.to_value());
        }
        storage.replace_document(&self.namespace, id, &doc)?;

        log_debug!("{}: updated record {}", self.namespace, id);
        Ok(1)
    }

    /// Delete every record matching the filter, returning the count
    pub fn delete_many(&self, filter: &Filter) -> Result<u64> {
        self.deadline.check()?;

        let mut storage = self.storage.write();
        let matching: Vec<RecordId> = storage
            .scan_documents(&self.namespace)?
            .into_iter()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(id, _)| id)
            .collect();

        let mut deleted = 0u64;
        for id in matching {
            if storage.remove_document(&self.namespace, &id)? {
                deleted += 1;
            }
        }

        log_debug!("{}: deleted {} records", self.namespace, deleted);
        Ok(deleted)
    }

    /// Count records matching the filter
    pub fn count(&self, filter: &Filter) -> Result<u64> {
        self.deadline.check()?;

        let storage = self.storage.read();
        if matches!(filter, Filter::All) {
            return Ok(storage
                .get_collection_meta(&self.namespace)
                .map(|meta| meta.document_count)
                .unwrap_or(0));
        }

        let count = storage
            .scan_documents(&self.namespace)?
            .iter()
            .filter(|(_, doc)| filter.matches(doc))
            .count();
        Ok(count as u64)
    }

    /// Destroy the collection and every record in it; irreversible
    ///
    /// Dropping an absent collection succeeds. A later insert recreates
    /// the collection.
    pub fn drop(&self) -> Result<()> {
        self.deadline.check()?;

        let mut storage = self.storage.write();
        match storage.drop_collection(&self.namespace) {
            Ok(()) => {
                log_info!("{}: collection dropped", self.namespace);
                Ok(())
            }
            Err(VinylBaseError::CollectionNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// One-shot streaming cursor over a find result
///
/// Ids are snapshotted when the cursor is created; each `next` reads and
/// decodes one record. Records removed after the snapshot are skipped.
pub struct FindCursor<'a, T, S: Storage> {
    collection: &'a Collection<T, S>,
    ids: Vec<RecordId>,
    position: usize,
}

impl<T, S: Storage> FindCursor<'_, T, S> {
    /// Number of ids left to visit
    pub fn remaining(&self) -> usize {
        self.ids.len() - self.position
    }
}

impl<T, S> Iterator for FindCursor<'_, T, S>
where
    T: Serialize + DeserializeOwned,
    S: Storage,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position < self.ids.len() {
            if let Err(e) = self.collection.deadline.check() {
                self.position = self.ids.len();
                return Some(Err(e));
            }

            let id = &self.ids[self.position];
            self.position += 1;

            let read = self
                .collection
                .storage
                .read()
                .read_document(&self.collection.namespace, id);
            match read {
                Ok(Some(doc)) => return Some(self.collection.decode(doc)),
                // Removed since the snapshot
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
