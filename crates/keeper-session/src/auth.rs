//! Login flow: verify an identity token, then start a session.
//!
//! Token verification is delegated to an [`Authenticator`]. This crate never
//! inspects tokens itself.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BoxError, Result, SessionError};
use crate::manager::SessionManager;
use crate::record::Session;

/// Session key holding the platform the caller authenticated with.
pub const PLATFORM_TYPE_KEY: &str = "platform_type";

/// Session key holding the caller's id on that platform.
pub const PLATFORM_ID_KEY: &str = "platform_id";

/// Verifies platform-issued identity tokens.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Check `identity_token` against the platform named by `platform_type`.
    async fn verify(
        &self,
        platform_type: &str,
        identity_token: &str,
    ) -> std::result::Result<(), BoxError>;
}

/// Credentials presented at login.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub platform_type: String,
    pub platform_id: String,
    pub identity_token: String,
}

impl LoginRequest {
    pub fn new(
        platform_type: impl Into<String>,
        platform_id: impl Into<String>,
        identity_token: impl Into<String>,
    ) -> Self {
        Self {
            platform_type: platform_type.into(),
            platform_id: platform_id.into(),
            identity_token: identity_token.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("platform_type", &self.platform_type)
            .field("platform_id", &self.platform_id)
            .field("identity_token", &"<redacted>")
            .finish()
    }
}

/// Verify `request` and start a session for it.
///
/// On success the session carries [`PLATFORM_TYPE_KEY`] and
/// [`PLATFORM_ID_KEY`]. If verification fails no session is created and the
/// authenticator's error is returned inside
/// [`SessionError::AuthenticationFailed`].
pub async fn login<A>(
    manager: &SessionManager,
    authenticator: &A,
    request: &LoginRequest,
) -> Result<Session>
where
    A: Authenticator + ?Sized,
{
    if let Err(e) = authenticator
        .verify(&request.platform_type, &request.identity_token)
        .await
    {
        debug!(platform_type = %request.platform_type, error = %e, "Identity verification failed");
        return Err(SessionError::AuthenticationFailed(e));
    }

    let session = manager.start()?;
    session.set(PLATFORM_TYPE_KEY, request.platform_type.as_str());
    session.set(PLATFORM_ID_KEY, request.platform_id.as_str());

    debug!(
        session_id = %session.id(),
        platform_type = %request.platform_type,
        "Login session started"
    );

    Ok(session)
}
