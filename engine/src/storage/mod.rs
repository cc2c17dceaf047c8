//! Key-value storage the persistence layer writes its blob into.
//!
//! The engine only needs `get`/`set`/`remove` on string keys. Each call is
//! atomic on its own; there are no multi-key transactions.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Key holding the current versioned state blob
pub const PERSISTED_STATE_KEY: &str = "@clarus/state";
/// Raw copy of a loaded blob some of whose records could not be decoded
pub const RECOVERY_KEY: &str = "@clarus/state-recovery";
/// Pre-versioning key holding a bare array of reports
pub const LEGACY_REPORTS_KEY: &str = "@my-finances/reports";
/// Pre-versioning key holding a bare array of snapshots
pub const LEGACY_SNAPSHOTS_KEY: &str = "@my-finances/snapshots";

/// Errors that can occur when talking to a storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String-keyed blob store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    async fn remove(&self, key: &str) -> StorageResult<()>;
}
