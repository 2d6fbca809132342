//! Enumeration session state, keyed by the OS-assigned enumeration id.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::ProjectionError;
use crate::info::DirectoryEntry;
use crate::provider::EntryCursor;

/// Cursor state for one open directory enumeration.
///
/// Created on start-enumeration with no cursor; the cursor is initialized on
/// the first get-entries call (or reinitialized on restart-scan) and dropped
/// when the session is removed.
pub struct EnumerationSession {
    relative_path: String,
    cursor: Option<EntryCursor>,
    pending: Option<DirectoryEntry>,
}

impl EnumerationSession {
    fn new(relative_path: String) -> Self {
        Self {
            relative_path,
            cursor: None,
            pending: None,
        }
    }

    /// Path captured at session start; immutable for the session's life.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Whether a cursor has been established for this session.
    pub fn has_cursor(&self) -> bool {
        self.cursor.is_some()
    }

    /// Install a fresh cursor, dropping (releasing) any previous one, and
    /// pre-fetch the first entry.
    pub fn reset_cursor(&mut self, mut cursor: EntryCursor) {
        self.pending = cursor.next();
        self.cursor = Some(cursor);
    }

    /// The entry fetched but not yet written, if any.
    pub fn pending(&self) -> Option<&DirectoryEntry> {
        self.pending.as_ref()
    }

    /// Mark the pending entry as written and fetch the next one.
    pub fn advance(&mut self) {
        self.pending = self.cursor.as_mut().and_then(|c| c.next());
    }
}

/// Concurrency-safe mapping from enumeration id to session state.
///
/// The table lock covers only lookup, insert and remove; each session is
/// behind its own mutex so that slow provider calls for one enumeration
/// never serialize unrelated ids behind the table.
#[derive(Default)]
pub struct SessionTable {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<EnumerationSession>>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for a new enumeration id.
    ///
    /// The OS guarantees id uniqueness; a collision is a protocol violation
    /// and is reported rather than silently replacing the session.
    pub fn insert(&self, id: Uuid, relative_path: String) -> Result<(), ProjectionError> {
        let mut table = self.inner.lock();
        if table.contains_key(&id) {
            return Err(ProjectionError::DuplicateEnumeration(id));
        }
        table.insert(id, Arc::new(Mutex::new(EnumerationSession::new(relative_path))));
        Ok(())
    }

    /// Look up an active session.
    pub fn get(&self, id: Uuid) -> Option<Arc<Mutex<EnumerationSession>>> {
        self.inner.lock().get(&id).cloned()
    }

    /// Remove a session, dropping its cursor once the last reference goes.
    pub fn remove(&self, id: Uuid) -> Option<Arc<Mutex<EnumerationSession>>> {
        self.inner.lock().remove(&id)
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no enumeration is active.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
