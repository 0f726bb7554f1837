//! Process-wide default session.
//!
//! Callers that do not want to thread a store handle through their code can
//! register one here once; prompt builders fall back to it only when no
//! explicit store was given.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::RowStore;

static DEFAULT_SESSION: RwLock<Option<Session>> = RwLock::new(None);

/// A store handle paired with the keyspace it should be queried in.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn RowStore>,
    keyspace: Option<String>,
}

impl Session {
    pub fn new(store: Arc<dyn RowStore>, keyspace: Option<String>) -> Self {
        Self { store, keyspace }
    }

    pub fn store(&self) -> Arc<dyn RowStore> {
        Arc::clone(&self.store)
    }

    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("store", &"<dyn RowStore>")
            .field("keyspace", &self.keyspace)
            .finish()
    }
}

/// Register `store` (and optionally a keyspace) as the default session,
/// replacing any previous registration.
pub fn init_default_session(store: Arc<dyn RowStore>, keyspace: Option<&str>) {
    let session = Session::new(store, keyspace.map(str::to_string));
    *DEFAULT_SESSION
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(session);
}

pub fn default_session() -> Option<Session> {
    DEFAULT_SESSION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn clear_default_session() {
    *DEFAULT_SESSION
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}
