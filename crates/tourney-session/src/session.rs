//! Session types: configuration, the session value, and its state.

use std::fmt;
use std::time::Duration;

use tourney_crypto::DEFAULT_KEY_BITS;
use tourney_protocol::DEFAULT_BASE_URL;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Where the tournament service lives and how the game identifies itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL including the version prefix.
    pub base_url: String,
    /// The game's API key, sent as `X-Api-Key` on every request.
    pub api_key: String,
    /// The game's RSA public key (base64 SPKI DER). Registration payloads
    /// are encrypted under it, so it must be at least 2048 bits.
    pub game_public_key: String,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("game_public_key", &self.game_public_key)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            game_public_key: String::new(),
        }
    }
}

/// Tunables for registration and authentication.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sent as `appBuildType` on authentication.
    pub app_build_type: String,
    /// Sent as `deviceOSType` on authentication.
    pub device_os_type: String,
    /// Upper bound on one registration + authentication round trip.
    /// Every waiter receives [`SessionError::TimedOut`](crate::SessionError::TimedOut)
    /// when it elapses.
    pub auth_timeout: Duration,
    /// RSA modulus size for a freshly generated device key.
    pub key_bits: usize,
    /// Display name used when neither the store nor the caller has one.
    pub default_player_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_build_type: "release".into(),
            device_os_type: "Android".into(),
            auth_timeout: Duration::from_secs(30),
            key_bits: DEFAULT_KEY_BITS,
            default_player_name: "coward player".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionTicket
// ---------------------------------------------------------------------------

/// An authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionTicket {
    pub session_id: String,
    /// Epoch milliseconds (UTC). The session is valid up to and including
    /// this instant.
    pub expires_at: i64,
}

impl SessionTicket {
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        is_expired_at(self.expires_at, now_millis)
    }
}

impl fmt::Debug for SessionTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTicket")
            .field("session_id", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Whether a session expiring at `expires_at` is expired at `now`.
///
/// Strictly greater-than: at `now == expires_at` the session is still
/// valid.
pub fn is_expired_at(expires_at: i64, now: i64) -> bool {
    now > expires_at
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session manager is in its lifecycle.
///
/// ```text
///   Unset ──→ Registering ──→ Authenticating ──→ Valid
///                                   ↑              │ (clock passes expires_at)
///                                   └── Expired ←──┘
/// ```
///
/// The session id is carried only by the states in which it means
/// something.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No device token yet; registration hasn't happened.
    Unset,
    /// Registration is in flight.
    Registering,
    /// A session is in hand and not yet expired.
    Valid(SessionTicket),
    /// The device is registered but there's no usable session: either
    /// none was ever obtained or the last one ran out.
    Expired { last: Option<SessionTicket> },
    /// Authentication is in flight.
    Authenticating,
}

impl SessionState {
    /// Returns `true` for [`SessionState::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Returns `true` while a network round trip is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Registering | Self::Authenticating)
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "Unset"),
            Self::Registering => write!(f, "Registering"),
            Self::Valid(t) => write!(f, "Valid(expires_at={})", t.expires_at),
            Self::Expired { last: Some(t) } => write!(f, "Expired(expired_at={})", t.expires_at),
            Self::Expired { last: None } => write!(f, "Expired(never authenticated)"),
            Self::Authenticating => write!(f, "Authenticating"),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::Registering => write!(f, "registering"),
            Self::Valid(_) => write!(f, "valid"),
            Self::Expired { .. } => write!(f, "expired"),
            Self::Authenticating => write!(f, "authenticating"),
        }
    }
}
