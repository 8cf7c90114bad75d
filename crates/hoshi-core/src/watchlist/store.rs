use std::cell::{Cell, RefCell};

use crate::diagnostics::{record, DiagnosticEvent, SharedEventLog};
use crate::storage::{check_writable, KeyValueStore, StorageError};

/// The persisted watchlist: an ordered set of anime identifiers.
///
/// Nothing is cached in memory. Every query re-reads storage so another tab
/// (or a reload) is always reflected, and every mutation rewrites the whole
/// sequence. When the backend fails the store becomes inert: `get` returns an
/// empty list and `toggle` does nothing.
pub struct Watchlist<S> {
    backend: RefCell<Option<S>>,
    key: String,
    log: SharedEventLog,
    corrupt_reported: Cell<bool>,
}

impl<S: KeyValueStore> Watchlist<S> {
    /// Open the watchlist on `backend`, degrading if it rejects a test write.
    pub fn open(backend: S, key: impl Into<String>, log: SharedEventLog) -> Self {
        let store = Self {
            backend: RefCell::new(Some(backend)),
            key: key.into(),
            log,
            corrupt_reported: Cell::new(false),
        };
        let writable = store.backend.borrow().as_ref().map(check_writable);
        if let Some(Err(e)) = writable {
            store.degrade(&e);
        }
        store
    }

    /// A store with no backend at all.
    pub fn inert(key: impl Into<String>, log: SharedEventLog) -> Self {
        Self {
            backend: RefCell::new(None),
            key: key.into(),
            log,
            corrupt_reported: Cell::new(false),
        }
    }

    /// Whether mutations are still being persisted.
    pub fn is_persistent(&self) -> bool {
        self.backend.borrow().is_some()
    }

    /// Current watchlist, oldest first.
    pub fn get(&self) -> Vec<String> {
        let loaded = {
            let backend = self.backend.borrow();
            let Some(backend) = backend.as_ref() else {
                return Vec::new();
            };
            backend.load::<Vec<String>>(&self.key)
        };

        match loaded {
            Ok(entries) => entries.unwrap_or_default(),
            Err(StorageError::Json(e)) => {
                self.report_corrupt(&e);
                Vec::new()
            }
            Err(e) => {
                self.degrade(&e);
                Vec::new()
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get().iter().any(|entry| entry == id)
    }

    /// Remove every occurrence of `id` if present, append it otherwise.
    ///
    /// Returns whether `id` is in the watchlist afterwards.
    pub fn toggle(&self, id: &str) -> bool {
        if !self.is_persistent() {
            tracing::debug!(anime_id = id, "watchlist inert, toggle ignored");
            return false;
        }

        let mut entries = self.get();
        if !self.is_persistent() {
            // The read above just failed and degraded the store.
            return false;
        }
        let present = entries.iter().any(|entry| entry == id);
        if present {
            entries.retain(|entry| entry != id);
        } else {
            entries.push(id.to_string());
        }

        match self.write(&entries) {
            Ok(()) => {
                tracing::debug!(anime_id = id, added = !present, "watchlist updated");
                !present
            }
            Err(e) => {
                self.degrade(&e);
                false
            }
        }
    }

    fn write(&self, entries: &[String]) -> Result<(), StorageError> {
        let backend = self.backend.borrow();
        match backend.as_ref() {
            Some(backend) => backend.save(&self.key, &entries)?,
            None => return Err(StorageError::Unavailable("no backend".into())),
        }
        self.corrupt_reported.set(false);
        Ok(())
    }

    fn report_corrupt(&self, e: &serde_json::Error) {
        if self.corrupt_reported.replace(true) {
            return;
        }
        tracing::warn!(error = %e, "corrupt watchlist payload, treating as empty");
        record(
            &self.log,
            DiagnosticEvent::CorruptWatchlist {
                message: e.to_string(),
            },
        );
    }

    fn degrade(&self, e: &StorageError) {
        tracing::warn!(error = %e, "watchlist storage failed, continuing without persistence");
        record(
            &self.log,
            DiagnosticEvent::StorageDegraded {
                reason: e.to_string(),
            },
        );
        self.backend.borrow_mut().take();
    }
}
