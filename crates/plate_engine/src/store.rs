use std::collections::BTreeMap;

use thiserror::Error;

use crate::{PersistError, StoredSession};

pub const USER_ID_KEY: &str = "USER_ID";
pub const EVENT_ID_KEY: &str = "EVENT_ID";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode store contents: {0}")]
    Encode(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Persistent string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store, used by tests and as a fallback.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed access to the user and analysis job identifiers.
#[derive(Debug)]
pub struct IdentityStore<S> {
    inner: S,
}

impl<S: KeyValueStore> IdentityStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner.get(USER_ID_KEY).filter(|id| !id.is_empty())
    }

    pub fn set_user_id(&mut self, user_id: &str) -> Result<(), StoreError> {
        self.inner.set(USER_ID_KEY, user_id)
    }

    pub fn event_id(&self) -> Option<String> {
        self.inner.get(EVENT_ID_KEY).filter(|id| !id.is_empty())
    }

    /// Overwrites any previous job; the last submission wins.
    pub fn set_event_id(&mut self, event_id: &str) -> Result<(), StoreError> {
        self.inner.set(EVENT_ID_KEY, event_id)
    }

    pub fn session(&self) -> StoredSession {
        StoredSession {
            user_id: self.user_id(),
            event_id: self.event_id(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}
