//! In-memory session store.
//!
//! One `Arc<Session>` per subject behind an `RwLock`. Writers hold the lock
//! only to swap a map entry; scoring and signing happen before `put` is
//! called. Readers clone the `Arc` and release the lock immediately.

use resonance_core::{ResonanceError, ResonanceResult, Session, SessionStore, SubjectId, Timestamp};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type SessionMap = HashMap<SubjectId, Arc<Session>>;

pub struct InMemorySessionStore {
    sessions: RwLock<SessionMap>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> ResonanceResult<RwLockReadGuard<'_, SessionMap>> {
        self.sessions
            .read()
            .map_err(|e| ResonanceError::Storage(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> ResonanceResult<RwLockWriteGuard<'_, SessionMap>> {
        self.sessions
            .write()
            .map_err(|e| ResonanceError::Storage(format!("lock poisoned: {}", e)))
    }

    /// Total entries, expired ones included.
    pub fn len(&self) -> usize {
        self.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(&self, session: Session) -> ResonanceResult<Option<Arc<Session>>> {
        let subject_id = session.subject_id().clone();
        let mut sessions = self.write()?;
        Ok(sessions.insert(subject_id, Arc::new(session)))
    }

    fn get(&self, subject_id: &SubjectId) -> ResonanceResult<Option<Arc<Session>>> {
        let found = self.read()?.get(subject_id).cloned();
        match found {
            Some(session) if session.is_expired_at(Timestamp::now()) => {
                let mut sessions = self.write()?;
                // A fresh session may have replaced the stale one meanwhile.
                let unchanged = sessions
                    .get(subject_id)
                    .is_some_and(|current| Arc::ptr_eq(current, &session));
                if unchanged {
                    sessions.remove(subject_id);
                    debug!(subject_id = %subject_id, "evicted expired session");
                }
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn remove(&self, subject_id: &SubjectId) -> ResonanceResult<bool> {
        Ok(self.write()?.remove(subject_id).is_some())
    }

    fn active_count(&self) -> ResonanceResult<usize> {
        let now = Timestamp::now();
        Ok(self
            .read()?
            .values()
            .filter(|s| !s.is_expired_at(now))
            .count())
    }

    fn evict_expired(&self) -> ResonanceResult<usize> {
        let now = Timestamp::now();
        let mut sessions = self.write()?;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        Ok(before - sessions.len())
    }
}
