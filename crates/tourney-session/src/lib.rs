//! Device identity and session lifecycle for Tourney.
//!
//! Before a client can call anything on the tournament service it needs
//! two things:
//!
//! 1. **A registered device**: a one-time exchange in which the device
//!    proves it holds an RSA keypair and receives a long-lived player
//!    token ([`DeviceIdentity`], registration).
//! 2. **A live session**: a short-lived id obtained by presenting that
//!    token, renewed whenever it expires (authentication).
//!
//! [`SessionManager`] owns both. It runs as a single actor task, so every
//! caller sees one consistent session and concurrent renewals collapse
//! into a single network round trip.
//!
//! # State machine
//!
//! ```text
//! Unset ──→ Registering ──→ Authenticating ──→ Valid ⇄ Expired
//!                                  ↑                      │
//!                                  └──────────────────────┘
//! ```
//!
//! # How it fits in the stack
//!
//! ```text
//! Client / pipeline (above)  ← asks for a valid session before each call
//!     ↕
//! Session layer (this crate) ← owns keys, device token, session id
//!     ↕
//! Protocol + transport (below)
//! ```

mod clock;
mod device;
mod error;
mod identity;
mod manager;
mod session;
#[cfg(any(test, feature = "test-utils"))]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use identity::{DeviceIdentity, resolve_player_name};
pub use manager::{SessionManager, SessionManagerBuilder};
pub use session::{ServiceConfig, SessionConfig, SessionState, SessionTicket, is_expired_at};
#[cfg(any(test, feature = "test-utils"))]
pub use testing::FakeIdentityService;
