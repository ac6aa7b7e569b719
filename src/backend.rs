// Key-value backing stores

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable key-value byte store that a [`RecordStore`](crate::RecordStore) persists into
pub trait Backend {
    /// Read the value stored under `key`, or `None` if nothing was ever written
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Validate a storage key
///
/// Keys double as file names for [`FileBackend`], so they are restricted to
/// alphanumerics, `_` and `-`.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Storage key cannot be empty"));
    }
    if key.chars().count() > 64 {
        return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid storage key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

// ============================================================================
// In-memory
// ============================================================================

/// Non-durable backend; cloning takes a snapshot
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: HashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.values.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

// ============================================================================
// Files
// ============================================================================

/// One file per key: `{dir}/{key}.json`
///
/// Writers take an exclusive lock on `{dir}/.{key}.lock`, write a temporary
/// file, sync it and rename it over the target before releasing the lock, so
/// readers see either the old or the new value.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open a file backend rooted at `dir`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create data directory")?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Backend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp_path = self.dir.join(format!(".{}.json.tmp", key));
        let lock_path = self.dir.join(format!(".{}.lock", key));

        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .context("Failed to open lock file")?;

        // Held until the new value has been renamed into place
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .context("Failed to open temporary file for writing")?;

        file.write_all(value)?;
        file.sync_all()?;

        // Windows refuses to rename an open file
        drop(file);

        fs::rename(&tmp_path, &path).with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!(file = ?path, bytes = value.len(), "Wrote value");
        // Lock is released when `lock` is dropped
        Ok(())
    }
}

// ============================================================================
// SQLite
// ============================================================================

/// Values kept in a single SQLite `kv` table
pub struct SqliteBackend {
    db: Connection,
}

impl SqliteBackend {
    /// Open or create a database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Connection::open(path.as_ref()).context("Failed to open SQLite database")?;
        Self::with_connection(db)
    }

    /// Database that lives only as long as this backend
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open SQLite database")?;
        Self::with_connection(db)
    }

    fn with_connection(db: Connection) -> Result<Self> {
        let backend = Self { db };
        backend.create_schema()?;
        Ok(backend)
    }

    /// Get a reference to the SQLite database connection
    pub fn db(&self) -> &Connection {
        &self.db
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl Backend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get::<_, Vec<u8>>(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.db
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![key, value, chrono::Utc::now().timestamp_millis()],
            )
            .context("Failed to write value")?;
        Ok(())
    }
}
