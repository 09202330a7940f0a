pub mod db;
pub mod error;
pub mod progress;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{FallbackStore, MemoryRecordStore, RecordStore, SqliteRecordStore, StoreMode};
