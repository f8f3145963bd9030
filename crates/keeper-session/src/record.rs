//! Session records and the handle callers work with.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use crate::id::SessionId;

/// Value stored under a session key.
///
/// Values are opaque to the store. Recovering a concrete type is up to the
/// caller, see [`Session::get_as`].
pub type SessionValue = serde_json::Value;

/// Stored state for a single session.
#[derive(Debug)]
pub(crate) struct SessionRecord {
    id: SessionId,
    created_at: i64,
    /// `None` when the manager runs without expiry.
    expires_at: Option<i64>,
    values: RwLock<HashMap<String, SessionValue>>,
}

impl SessionRecord {
    pub(crate) fn new(id: SessionId, now: i64, lifetime_secs: u64) -> Self {
        let expires_at = match lifetime_secs {
            0 => None,
            secs => Some(now.saturating_add_unsigned(secs)),
        };
        Self {
            id,
            created_at: now,
            expires_at,
            values: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Handle to a live session.
///
/// Handles are cheap to clone and share the underlying record. Reading and
/// writing keys only locks this session, never the whole store.
#[derive(Debug, Clone)]
pub struct Session {
    record: Arc<SessionRecord>,
}

impl Session {
    pub(crate) fn from_record(record: Arc<SessionRecord>) -> Self {
        Self { record }
    }

    /// The session identifier.
    pub fn id(&self) -> SessionId {
        self.record.id
    }

    /// Creation time in seconds since the epoch.
    pub fn created_at(&self) -> i64 {
        self.record.created_at
    }

    /// Absolute expiry in seconds since the epoch, if the session expires.
    pub fn expires_at(&self) -> Option<i64> {
        self.record.expires_at
    }

    /// Whether the session counts as expired at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.record.is_expired_at(now)
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<SessionValue> {
        self.record.values.read().get(key).cloned()
    }

    /// Get the value under `key` decoded as `T`.
    ///
    /// Returns `None` when the key is missing or holds a value of another
    /// shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        serde_json::from_value(value).ok()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<SessionValue>) {
        self.record.values.write().insert(key.into(), value.into());
    }

    /// Remove `key`. Does nothing if it is not set.
    pub fn delete(&self, key: &str) {
        self.record.values.write().remove(key);
    }

    /// All keys currently set, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.record.values.read().keys().cloned().collect()
    }

    /// Number of keys set.
    pub fn len(&self) -> usize {
        self.record.values.read().len()
    }

    /// Whether no keys are set.
    pub fn is_empty(&self) -> bool {
        self.record.values.read().is_empty()
    }

    /// Whether both handles point at the same stored record.
    ///
    /// Two handles can share an identifier without sharing a record when the
    /// session was destroyed or expired and then re-initialised.
    pub fn ptr_eq(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }

    pub(crate) fn record(&self) -> &Arc<SessionRecord> {
        &self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn session(lifetime_secs: u64) -> Session {
        let id = SessionId::from_uuid(Uuid::nil());
        Session::from_record(Arc::new(SessionRecord::new(id, 1_000, lifetime_secs)))
    }

    #[test]
    fn test_set_then_get() {
        let s = session(5);
        s.set("a", 1);

        assert_eq!(s.get("a"), Some(json!(1)));
        assert_eq!(s.get_as::<i64>("a"), Some(1));
    }

    #[test]
    fn test_set_overwrites() {
        let s = session(5);
        s.set("a", "first");
        s.set("a", "second");

        assert_eq!(s.get("a"), Some(json!("second")));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_delete() {
        let s = session(5);
        s.set("b", 2);
        s.delete("b");

        assert_eq!(s.get("b"), None);
        assert!(s.is_empty());

        // Missing key is a no-op
        s.delete("b");
        assert!(s.is_empty());
    }

    #[test]
    fn test_get_as_wrong_shape() {
        let s = session(5);
        s.set("name", "alice");

        assert_eq!(s.get_as::<String>("name"), Some("alice".to_string()));
        assert_eq!(s.get_as::<u32>("name"), None);
        assert_eq!(s.get_as::<u32>("missing"), None);
    }

    #[test]
    fn test_expiry() {
        let s = session(5);

        assert_eq!(s.created_at(), 1_000);
        assert_eq!(s.expires_at(), Some(1_005));
        assert!(!s.is_expired_at(1_004));
        assert!(s.is_expired_at(1_005));
    }

    #[test]
    fn test_zero_lifetime_never_expires() {
        let s = session(0);

        assert_eq!(s.expires_at(), None);
        assert!(!s.is_expired_at(i64::MAX));
    }

    #[test]
    fn test_clones_share_values() {
        let s = session(5);
        let other = s.clone();
        other.set("shared", true);

        assert_eq!(s.get("shared"), Some(json!(true)));
        assert!(s.ptr_eq(&other));
    }

    #[test]
    fn test_keys() {
        let s = session(5);
        s.set("x", 1);
        s.set("y", 2);

        let mut keys = s.keys();
        keys.sort();
        assert_eq!(keys, vec!["x", "y"]);
    }
}
