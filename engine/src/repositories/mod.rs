pub mod persistence_store;

// Re-export for convenient access
pub use persistence_store::{ImportSummary, PersistenceStore};
