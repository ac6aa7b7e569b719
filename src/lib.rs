// VitalStore - Latest-first log of vital-sign readings with write-through persistence

pub mod backend;
pub mod codec;
pub mod config;
pub mod record;
pub mod store;

// Re-export main types for convenience
pub use backend::{Backend, FileBackend, MemoryBackend, SqliteBackend};
pub use config::{BackendKind, Config};
pub use record::Entry;
pub use store::{DEFAULT_KEY, RecordStore};
