//! Unified error type for the Tourney client.

use tourney_crypto::CryptoError;
use tourney_protocol::ProtocolError;
use tourney_session::SessionError;
use tourney_store::StoreError;
use tourney_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` attributes let `?` lift a layer error into this one.
/// Every workflow operation fails with exactly one of these; none of them
/// is ever swallowed.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Key generation, parsing, or a cipher operation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The request never got an answer. Recoverable; the caller may retry.
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// The answer was a non-success status or an unusable body.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Registration or authentication failed; nothing can be sent until
    /// a session is obtained.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The flow's scope was dropped or the client was shut down.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller passed something unusable (e.g. an access key that is
    /// empty once sanitized).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The tournament doesn't accept new entries from this player.
    #[error("tournament {0} cannot be entered")]
    NotEnterable(String),
}

impl ClientError {
    /// Whether retrying the same call later might succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Protocol(e) => e.status().is_none_or(|code| code >= 500),
            Self::Session(SessionError::TimedOut(_) | SessionError::AuthFailed(_)) => true,
            _ => false,
        }
    }
}
