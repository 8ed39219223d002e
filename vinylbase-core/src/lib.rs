// vinylbase-core/src/lib.rs
// Pure Rust document-store client - no network, no FFI

pub mod client;
pub mod collection;
pub mod delta;
pub mod error;
pub mod filter;
pub mod logging;
pub mod record;
pub mod storage;

// Public exports
pub use client::{DatabaseHandle, Deadline, StoreClient};
pub use collection::{Collection, FindCursor, InsertManyResult};
pub use delta::Delta;
pub use error::{Result, VinylBaseError};
pub use filter::{Cmp, Filter};
pub use logging::{get_log_level, set_log_level, LogLevel};
pub use record::RecordId;
pub use storage::{Backend, CollectionMeta, FileStorage, MemoryStorage, Storage};
