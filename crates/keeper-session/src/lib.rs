//! In-process session store with lazy re-initialisation and timed expiry.
//!
//! This crate provides:
//! - Unguessable 128-bit session identifiers
//! - A key/value bag per session, values stored as JSON
//! - Lazy re-init: reading an unknown or expired id yields a fresh empty session
//! - A cancelable GC task sweeping expired sessions every lifetime period
//! - A login helper that verifies a token through an [`Authenticator`] first
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keeper_session::{SessionConfig, SessionManager};
//!
//! let manager = Arc::new(SessionManager::new(SessionConfig::new().with_lifetime_secs(5)));
//! let gc = manager.spawn_gc();
//!
//! let session = manager.start()?;
//! session.set("user", "alice");
//!
//! let same = manager.read(session.id());
//! assert_eq!(same.get_as::<String>("user").as_deref(), Some("alice"));
//!
//! gc.shutdown().await;
//! ```

mod auth;
mod clock;
mod config;
mod error;
mod gc;
mod id;
mod manager;
mod record;
mod store;

pub use auth::{Authenticator, LoginRequest, PLATFORM_ID_KEY, PLATFORM_TYPE_KEY, login};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DEFAULT_LIFETIME_SECS, LIFETIME_ENV_VAR, MAX_LIFETIME_SECS, SessionConfig};
pub use error::{BoxError, Result, SessionError};
pub use gc::GcHandle;
pub use id::{IdentifierSource, OsIdentifierSource, SessionId};
pub use manager::{SessionManager, SessionStats};
pub use record::{Session, SessionValue};
