//! Persistent key-value storage seam.
//!
//! Values are stored as JSON text under string keys, the same contract as
//! `gloo-storage`'s `LocalStorage`. In the browser this is
//! `window.localStorage`; tests and native callers use [`MemoryStore`]. Every
//! method may fail (storage disabled, quota exceeded), and callers are
//! expected to degrade rather than propagate.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded: {0}")]
    Quota(String),

    /// The stored text is not the JSON shape asked for.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A synchronous JSON key-value store with interior mutability.
pub trait KeyValueStore {
    /// Decode the value under `key`, `None` if nothing is stored there.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;
    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Key written and removed to check that a backend accepts writes.
const WRITE_CHECK_KEY: &str = "__hoshi_write_check__";

/// Check that `store` accepts a write and a removal.
pub fn check_writable(store: &impl KeyValueStore) -> Result<(), StorageError> {
    store.save(WRITE_CHECK_KEY, &1)?;
    store.delete(WRITE_CHECK_KEY)
}

/// In-memory store holding JSON text, optionally failing every call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails, like a disabled `localStorage`.
    pub fn failing() -> Self {
        Self {
            items: RefCell::default(),
            failing: true,
        }
    }

    /// Seed `key` with raw text, bypassing failure injection.
    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Raw stored text, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing {
            Err(StorageError::Unavailable("storage disabled".into()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.check()?;
        match self.items.borrow().get(key) {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.check()?;
        let text = serde_json::to_string(value)?;
        self.items.borrow_mut().insert(key.to_string(), text);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore> KeyValueStore for std::rc::Rc<S> {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        (**self).load(key)
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        (**self).save(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}
