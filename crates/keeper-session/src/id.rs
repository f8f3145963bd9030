//! Session identifiers and the sources that generate them.

use std::fmt;
use std::str::FromStr;

use rand::TryRngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SessionError};

/// Opaque 128-bit session identifier.
///
/// Rendered as the canonical lowercase hyphenated UUID string, which is the
/// form handed to cookies and headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| SessionError::InvalidIdentifier(format!("{s:?}: {e}")))
    }
}

/// Source of fresh session identifiers.
///
/// Implementations must be statistically indistinguishable from uniform
/// random over the identifier space. A failure is reported once and is
/// never retried by the manager.
pub trait IdentifierSource: Send + Sync {
    /// Produce a new identifier.
    fn generate(&self) -> Result<SessionId>;
}

/// Identifier source backed by the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsIdentifierSource;

impl IdentifierSource for OsIdentifierSource {
    fn generate(&self) -> Result<SessionId> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SessionError::IdentifierGenerationFailed(e.to_string()))?;
        Ok(SessionId(uuid::Builder::from_random_bytes(bytes).into_uuid()))
    }
}
