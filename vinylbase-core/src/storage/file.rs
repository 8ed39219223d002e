// storage/file.rs
//! Persistent file storage backend
//!
//! Backs `file://` connections. Every mutation is appended to a JSON-lines
//! journal; opening replays the journal to rebuild the in-memory state.
//! A truncated or corrupt trailing line (interrupted write) stops the
//! replay with a warning instead of failing the open.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::log_warn;
use crate::record::RecordId;
use crate::storage::{CollectionMeta, MemoryStorage, Storage};

/// One journal line
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum JournalEntry {
    Create {
        collection: String,
        meta: CollectionMeta,
    },
    Insert {
        collection: String,
        id: RecordId,
        doc: Value,
    },
    Replace {
        collection: String,
        id: RecordId,
        doc: Value,
    },
    Remove {
        collection: String,
        id: RecordId,
    },
    Drop {
        collection: String,
    },
}

/// File-backed storage: in-memory state plus an append-only journal
pub struct FileStorage {
    path: PathBuf,
    state: MemoryStorage,
    writer: BufWriter<File>,
}

impl FileStorage {
    /// Open or create a store file, replaying any existing journal
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut state = MemoryStorage::new();

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<JournalEntry>(&line) {
                    Ok(entry) => Self::replay(&mut state, entry),
                    Err(e) => {
                        log_warn!(
                            "journal {} corrupt at line {}, ignoring the tail: {}",
                            path.display(),
                            line_no + 1,
                            e
                        );
                        break;
                    }
                }
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(FileStorage {
            path,
            state,
            writer: BufWriter::new(file),
        })
    }

    /// Store file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replay(state: &mut MemoryStorage, entry: JournalEntry) {
        match entry {
            JournalEntry::Create { collection, meta } => {
                if state.create_collection(&collection).is_ok() {
                    if let Some(m) = state.get_collection_meta_mut(&collection) {
                        m.created_at = meta.created_at;
                    }
                }
            }
            JournalEntry::Insert { collection, id, doc } => {
                if let Err(e) = state.insert_document(&collection, &id, &doc) {
                    log_warn!("journal insert skipped for {}/{}: {}", collection, id, e);
                }
            }
            JournalEntry::Replace { collection, id, doc } => {
                let _ = state.replace_document(&collection, &id, &doc);
            }
            JournalEntry::Remove { collection, id } => {
                let _ = state.remove_document(&collection, &id);
            }
            JournalEntry::Drop { collection } => {
                let _ = state.drop_collection(&collection);
            }
        }
    }

    fn append(&mut self, entry: &JournalEntry) -> Result<()> {
        let line = serde_json::to_string(entry)?;
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn create_collection(&mut self, name: &str) -> Result<()> {
        self.state.create_collection(name)?;
        let meta = self
            .state
            .get_collection_meta(name)
            .cloned()
            .unwrap_or_else(|| CollectionMeta::new(name));
        self.append(&JournalEntry::Create {
            collection: name.to_string(),
            meta,
        })
    }

    fn drop_collection(&mut self, name: &str) -> Result<()> {
        self.state.drop_collection(name)?;
        self.append(&JournalEntry::Drop {
            collection: name.to_string(),
        })
    }

    fn list_collections(&self) -> Vec<String> {
        self.state.list_collections()
    }

    fn get_collection_meta(&self, name: &str) -> Option<&CollectionMeta> {
        self.state.get_collection_meta(name)
    }

    fn get_collection_meta_mut(&mut self, name: &str) -> Option<&mut CollectionMeta> {
        self.state.get_collection_meta_mut(name)
    }

    fn insert_document(&mut self, collection: &str, id: &RecordId, doc: &Value) -> Result<()> {
        self.state.insert_document(collection, id, doc)?;
        self.append(&JournalEntry::Insert {
            collection: collection.to_string(),
            id: id.clone(),
            doc: doc.clone(),
        })
    }

    fn read_document(&self, collection: &str, id: &RecordId) -> Result<Option<Value>> {
        self.state.read_document(collection, id)
    }

    fn replace_document(&mut self, collection: &str, id: &RecordId, doc: &Value) -> Result<bool> {
        if !self.state.replace_document(collection, id, doc)? {
            return Ok(false);
        }
        self.append(&JournalEntry::Replace {
            collection: collection.to_string(),
            id: id.clone(),
            doc: doc.clone(),
        })?;
        Ok(true)
    }

    fn remove_document(&mut self, collection: &str, id: &RecordId) -> Result<bool> {
        if !self.state.remove_document(collection, id)? {
            return Ok(false);
        }
        self.append(&JournalEntry::Remove {
            collection: collection.to_string(),
            id: id.clone(),
        })?;
        Ok(true)
    }

    fn scan_documents(&self, collection: &str) -> Result<Vec<(RecordId, Value)>> {
        self.state.scan_documents(collection)
    }

    fn ping(&self) -> Result<()> {
        // Liveness: the underlying file handle must still answer a stat
        self.writer.get_ref().metadata()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("test.vlite")
    }

    #[test]
    fn test_open_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        let storage = FileStorage::open(&path).unwrap();
        assert!(path.exists());
        assert!(storage.list_collections().is_empty());
    }

    #[test]
    fn test_insert_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        {
            let mut storage = FileStorage::open(&path).unwrap();
            storage.create_collection("albums").unwrap();
            storage
                .insert_document(
                    "albums",
                    &RecordId::Int(1),
                    &json!({"_id": 1, "artist": "Queen", "year": 1976}),
                )
                .unwrap();
            storage.flush().unwrap();
        }

        let storage = FileStorage::open(&path).unwrap();
        let read = storage
            .read_document("albums", &RecordId::Int(1))
            .unwrap()
            .unwrap();
        assert_eq!(read["artist"], "Queen");
        assert_eq!(storage.get_collection_meta("albums").unwrap().last_id, 1);
    }

    #[test]
    fn test_replace_and_remove_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        {
            let mut storage = FileStorage::open(&path).unwrap();
            storage.create_collection("albums").unwrap();
            for i in 1..=2 {
                storage
                    .insert_document("albums", &RecordId::Int(i), &json!({"n": i}))
                    .unwrap();
            }
            storage
                .replace_document("albums", &RecordId::Int(1), &json!({"n": 10}))
                .unwrap();
            storage.remove_document("albums", &RecordId::Int(2)).unwrap();
            storage.flush().unwrap();
        }

        let storage = FileStorage::open(&path).unwrap();
        let scan = storage.scan_documents("albums").unwrap();
        assert_eq!(scan.len(), 1);
        assert_eq!(scan[0].1, json!({"n": 10}));
    }

    #[test]
    fn test_drop_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        {
            let mut storage = FileStorage::open(&path).unwrap();
            storage.create_collection("albums").unwrap();
            storage
                .insert_document("albums", &RecordId::Int(1), &json!({"n": 1}))
                .unwrap();
            storage.drop_collection("albums").unwrap();
            storage.flush().unwrap();
        }

        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.list_collections().is_empty());
        assert!(storage.scan_documents("albums").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_tail_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        {
            let mut storage = FileStorage::open(&path).unwrap();
            storage.create_collection("albums").unwrap();
            storage
                .insert_document("albums", &RecordId::Int(1), &json!({"n": 1}))
                .unwrap();
            storage.flush().unwrap();
        }

        // Simulate an interrupted write
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"{\"op\":\"insert\",\"colle").unwrap();
        }

        let storage = FileStorage::open(&path).unwrap();
        let scan = storage.scan_documents("albums").unwrap();
        assert_eq!(scan.len(), 1);
    }

    #[test]
    fn test_created_at_preserved_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        let created_at = {
            let mut storage = FileStorage::open(&path).unwrap();
            storage.create_collection("albums").unwrap();
            storage.flush().unwrap();
            storage.get_collection_meta("albums").unwrap().created_at
        };

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(
            storage.get_collection_meta("albums").unwrap().created_at,
            created_at
        );
    }

    #[test]
    fn test_ping() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(store_path(&dir)).unwrap();
        assert!(storage.ping().is_ok());
    }
}
