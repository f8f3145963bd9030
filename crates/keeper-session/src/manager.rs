//! Session manager: the only entry point into the session store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::id::{IdentifierSource, OsIdentifierSource, SessionId};
use crate::record::{Session, SessionRecord};
use crate::store::SessionStore;

/// Creates, reads, destroys and garbage-collects sessions.
///
/// All access to the store goes through a single `RwLock`:
/// - lookups of live sessions take the shared lock
/// - anything that inserts or removes an entry takes the exclusive lock
/// - key reads and writes on a [`Session`] only lock that session
///
/// Sweeps are serialised among themselves and at most one GC task runs per
/// manager.
///
/// Build one per process (or per test) and share it behind an `Arc`.
pub struct SessionManager {
    store: RwLock<SessionStore>,
    lifetime_secs: u64,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdentifierSource>,
    sweep_lock: Mutex<()>,
    gc_running: AtomicBool,
}

impl SessionManager {
    /// Create a manager using the system clock and the OS random source.
    ///
    /// The configured lifetime is capped to [`MAX_LIFETIME_SECS`].
    ///
    /// [`MAX_LIFETIME_SECS`]: crate::config::MAX_LIFETIME_SECS
    pub fn new(config: SessionConfig) -> Self {
        let lifetime_secs = config.effective_lifetime_secs();
        if lifetime_secs != config.lifetime_secs {
            debug!(
                requested = config.lifetime_secs,
                lifetime_secs, "Session lifetime capped"
            );
        }

        Self {
            store: RwLock::new(SessionStore::new()),
            lifetime_secs,
            clock: Arc::new(SystemClock),
            ids: Arc::new(OsIdentifierSource),
            sweep_lock: Mutex::new(()),
            gc_running: AtomicBool::new(false),
        }
    }

    /// Replace the clock used for expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the identifier source.
    pub fn with_identifier_source(mut self, ids: Arc<dyn IdentifierSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Effective session lifetime in seconds. Zero means sessions never expire.
    pub fn lifetime_secs(&self) -> u64 {
        self.lifetime_secs
    }

    /// Current time according to the manager's clock.
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Start a new session under a freshly generated identifier.
    ///
    /// Fails if the identifier source fails, or if it hands out an identifier
    /// that is already stored. Neither case is retried and nothing is
    /// inserted.
    pub fn start(&self) -> Result<Session> {
        let id = self.ids.generate()?;

        let mut store = self.store.write();
        if store.contains(&id) {
            warn!(session_id = %id, "Generated session id collides with a stored session");
            return Err(SessionError::IdentifierCollision(id));
        }

        let record = Arc::new(SessionRecord::new(id, self.clock.now(), self.lifetime_secs));
        store.insert(id, Arc::clone(&record));

        trace!(session_id = %id, store_size = store.len(), "Session started");

        Ok(Session::from_record(record))
    }

    /// Get the session for `id`, creating an empty one if it is missing or
    /// expired.
    ///
    /// This never fails. An unknown or stale identifier comes back as a new,
    /// empty session under the same identifier with a fresh expiry.
    pub fn read(&self, id: SessionId) -> Session {
        if let Some(record) = self.store.read().get_live(&id, self.clock.now()) {
            trace!(session_id = %id, "Session found");
            return Session::from_record(Arc::clone(record));
        }

        let mut store = self.store.write();
        let now = self.clock.now();

        // Another caller may have re-initialised it between the two locks
        if let Some(record) = store.get_live(&id, now) {
            trace!(session_id = %id, "Session re-initialised concurrently");
            return Session::from_record(Arc::clone(record));
        }

        let record = Arc::new(SessionRecord::new(id, now, self.lifetime_secs));
        store.insert(id, Arc::clone(&record));

        debug!(session_id = %id, "Session missing or expired, re-initialised");

        Session::from_record(record)
    }

    /// Remove the session for `id`.
    ///
    /// Returns `true` if a session was stored. Unknown identifiers are a no-op.
    pub fn destroy(&self, id: SessionId) -> bool {
        let removed = self.store.write().remove(&id).is_some();
        if removed {
            debug!(session_id = %id, "Session destroyed");
        }
        removed
    }

    /// Whether a live, unexpired session exists for `id`.
    ///
    /// Unlike [`read`](Self::read) this never creates anything.
    pub fn contains(&self, id: SessionId) -> bool {
        self.store.read().get_live(&id, self.clock.now()).is_some()
    }

    /// Remove every expired session and return how many were removed.
    ///
    /// Expired entries are collected under the shared lock, then each one is
    /// removed with its own exclusive lock. An entry that was re-initialised
    /// in the meantime is left alone. Concurrent sweeps run one after the
    /// other; `start` and `read` are never blocked by the sweep as a whole.
    pub fn sweep(&self) -> usize {
        if self.lifetime_secs == 0 {
            return 0;
        }

        let _sweeping = self.sweep_lock.lock();

        let now = self.clock.now();
        let expired = self.store.read().expired(now);

        let mut removed = 0;
        for (id, record) in expired {
            if self.store.write().remove_if_same(&id, &record) {
                trace!(session_id = %id, "Expired session removed");
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(count = removed, "Swept expired sessions");
        }

        removed
    }

    /// Number of stored sessions, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Whether the store holds no sessions at all.
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Snapshot of store occupancy.
    pub fn stats(&self) -> SessionStats {
        let store = self.store.read();
        SessionStats {
            total: store.len(),
            expired: store.expired(self.clock.now()).len(),
        }
    }

    /// Whether the stored record for `id` is exactly the one behind `session`.
    pub fn is_current(&self, session: &Session) -> bool {
        self.store
            .read()
            .get(&session.id())
            .is_some_and(|record| Arc::ptr_eq(record, session.record()))
    }

    /// Mark the GC task as running. Returns `false` if one already is.
    pub(crate) fn claim_gc(&self) -> bool {
        !self.gc_running.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn release_gc(&self) {
        self.gc_running.store(false, Ordering::Release);
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Store occupancy statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Stored sessions, expired or not.
    pub total: usize,

    /// Stored sessions whose expiry has passed.
    pub expired: usize,
}
