//! Error types for session operations.

use crate::id::SessionId;

/// Boxed error returned by external collaborators such as an [`Authenticator`].
///
/// [`Authenticator`]: crate::auth::Authenticator
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for session operations.
///
/// There is deliberately no "not found" variant: reading an unknown or
/// expired identifier re-initialises the session instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The authentication collaborator rejected the caller.
    ///
    /// The collaborator's error is kept as-is and is reachable through
    /// [`std::error::Error::source`].
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(#[source] BoxError),

    /// The random source could not produce an identifier.
    #[error("Identifier generation failed: {0}")]
    IdentifierGenerationFailed(String),

    /// A freshly generated identifier matched a live session.
    #[error("Identifier collision: {0}")]
    IdentifierCollision(SessionId),

    /// A transport string could not be parsed as a session identifier.
    #[error("Invalid session identifier: {0}")]
    InvalidIdentifier(String),

    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
