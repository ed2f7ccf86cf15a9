//! Error types for the session layer.

use std::time::Duration;

use tourney_crypto::CryptoError;
use tourney_store::StoreError;

/// Errors that can occur while registering the device or obtaining a
/// session.
///
/// `Clone` because one registration or authentication outcome is handed
/// to every caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `POST /players/register` failed or returned something unusable.
    #[error("device registration failed: {0}")]
    RegistrationFailed(String),

    /// `POST /players/auth` failed or returned something unusable.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Registration and authentication together took longer than
    /// [`SessionConfig::auth_timeout`](crate::SessionConfig::auth_timeout).
    #[error("session round trip timed out after {0:?}")]
    TimedOut(Duration),

    /// Key generation, parsing, or a cipher operation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Persisted identity or session data couldn't be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session actor has shut down.
    #[error("session manager is not running")]
    Unavailable,
}
