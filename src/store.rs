// Latest-first entry store with write-through persistence

use crate::backend::Backend;
use crate::codec;
use crate::record::Entry;
use eyre::{Context, Result};
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

/// Key the entry sequence is stored under unless another one is configured
pub const DEFAULT_KEY: &str = "vital_signs";

/// Ordered collection of entries, synchronized with a backing store
///
/// Entries are kept latest-first: the most recently inserted entry is always
/// at position 0. Every mutation re-encodes the whole sequence and writes it
/// to the backend under a single key before returning.
pub struct RecordStore<B: Backend> {
    backend: B,
    key: String,
    entries: Vec<Entry>,
    load_error: Option<String>,
    persist_error: Option<String>,
}

impl<B: Backend> RecordStore<B> {
    /// Open a store on `backend` under [`DEFAULT_KEY`]
    pub fn open(backend: B) -> Self {
        Self::open_with_key(backend, DEFAULT_KEY)
    }

    /// Open a store on `backend`, loading whatever is stored under `key`
    ///
    /// Never fails. A missing value is a first run and starts empty. A value
    /// that cannot be read or decoded also starts empty; the failure is logged
    /// and kept in [`load_error`](Self::load_error).
    pub fn open_with_key(backend: B, key: impl Into<String>) -> Self {
        let key = key.into();

        let (entries, load_error) = match Self::load(&backend, &key) {
            Ok(Some(entries)) => {
                info!(key = %key, count = entries.len(), "Loaded entries");
                (entries, None)
            }
            Ok(None) => {
                info!(key = %key, "No stored entries, starting empty");
                (Vec::new(), None)
            }
            Err(e) => {
                warn!(key = %key, error = ?e, "Failed to load stored entries, starting empty");
                (Vec::new(), Some(format!("{:#}", e)))
            }
        };

        Self {
            backend,
            key,
            entries,
            load_error,
            persist_error: None,
        }
    }

    fn load(backend: &B, key: &str) -> Result<Option<Vec<Entry>>> {
        let Some(bytes) = backend.get(key).context("Failed to read from backend")? else {
            return Ok(None);
        };
        codec::decode(&bytes).map(Some)
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// Current entries, latest first
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&Entry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key the sequence is persisted under
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Give the backend back, e.g. to reopen a store on it
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Why the stored value was discarded when this store was opened
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Message of the last failed write, cleared by the next successful one
    pub fn last_persist_error(&self) -> Option<&str> {
        self.persist_error.as_deref()
    }

    /// True when the in-memory entries have not reached the backend
    pub fn is_dirty(&self) -> bool {
        self.persist_error.is_some()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Record a new set of readings at position 0
    ///
    /// The readings are stored verbatim; validating them is up to the caller.
    pub fn insert(
        &mut self,
        temperature: impl Into<String>,
        blood_pressure: impl Into<String>,
        heart_rate: impl Into<String>,
    ) {
        let entry = Entry::new(temperature, blood_pressure, heart_rate);
        debug!(id = %entry.id(), "Inserting entry");

        self.entries.insert(0, entry);
        self.persist();
    }

    /// Remove the entries at `positions`
    ///
    /// Positions refer to the sequence as it was before this call, so
    /// removing `[0, 2]` drops the original first and third entries.
    /// Duplicates are removed once. Positions past the end are ignored.
    /// The sequence is persisted even if nothing was removed.
    pub fn remove_at<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = usize>,
    {
        let len = self.entries.len();
        let (valid, invalid): (BTreeSet<usize>, BTreeSet<usize>) =
            positions.into_iter().partition(|&position| position < len);

        if !invalid.is_empty() {
            warn!(positions = ?invalid, len, "Ignoring out-of-range positions");
        }

        let mut position = 0;
        self.entries.retain(|_| {
            let keep = !valid.contains(&position);
            position += 1;
            keep
        });

        debug!(removed = valid.len(), remaining = self.entries.len(), "Removed entries");
        self.persist();
    }

    /// Write the current entries to the backend, reporting any failure
    ///
    /// Mutations already do this; call it to retry after a failed write.
    pub fn flush(&mut self) -> Result<()> {
        let result = self.write_through();
        self.persist_error = result.as_ref().err().map(|e| format!("{:#}", e));
        result
    }

    fn persist(&mut self) {
        if let Err(e) = self.flush() {
            error!(key = %self.key, error = ?e, "Failed to persist entries, in-memory state kept");
        }
    }

    fn write_through(&mut self) -> Result<()> {
        let bytes = codec::encode(&self.entries)?;
        self.backend
            .set(&self.key, &bytes)
            .with_context(|| format!("Failed to write entries under key {}", self.key))?;
        debug!(key = %self.key, count = self.entries.len(), bytes = bytes.len(), "Persisted entries");
        Ok(())
    }
}
