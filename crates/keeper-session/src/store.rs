//! Identifier to record mapping.
//!
//! The store itself does no locking; the manager wraps it in a single
//! `RwLock` and is the only way to reach it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::id::SessionId;
use crate::record::SessionRecord;

#[derive(Debug, Default)]
pub(crate) struct SessionStore {
    records: HashMap<SessionId, Arc<SessionRecord>>,
}

impl SessionStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, id: &SessionId) -> Option<&Arc<SessionRecord>> {
        self.records.get(id)
    }

    /// Record for `id` if present and not expired at `now`.
    pub(crate) fn get_live(&self, id: &SessionId, now: i64) -> Option<&Arc<SessionRecord>> {
        self.records
            .get(id)
            .filter(|record| !record.is_expired_at(now))
    }

    pub(crate) fn contains(&self, id: &SessionId) -> bool {
        self.records.contains_key(id)
    }

    /// Insert `record`, replacing whatever was stored under the same id.
    pub(crate) fn insert(&mut self, id: SessionId, record: Arc<SessionRecord>) {
        self.records.insert(id, record);
    }

    pub(crate) fn remove(&mut self, id: &SessionId) -> Option<Arc<SessionRecord>> {
        self.records.remove(id)
    }

    /// Remove `id` only if it still maps to exactly `record`.
    pub(crate) fn remove_if_same(&mut self, id: &SessionId, record: &Arc<SessionRecord>) -> bool {
        match self.records.get(id) {
            Some(current) if Arc::ptr_eq(current, record) => {
                self.records.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of every record expired at `now`.
    pub(crate) fn expired(&self, now: i64) -> Vec<(SessionId, Arc<SessionRecord>)> {
        self.records
            .iter()
            .filter(|(_, record)| record.is_expired_at(now))
            .map(|(id, record)| (*id, Arc::clone(record)))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
