//! # Tourney
//!
//! Client for a hosted tournament service: device registration, session
//! handling, tournaments, matches, leaderboards and prize claims.
//!
//! A game builds one [`TournamentClient`] and calls workflow operations on
//! it. Underneath, every request passes through the [`RequestPipeline`],
//! which asks the session manager for a valid session first. An expired
//! session triggers exactly one reauthentication no matter how many
//! requests are waiting on it.
//!
//! ```text
//! TournamentClient (workflow)
//!   └─ RequestPipeline ── SessionManager (actor) ── DeviceIdentity (RSA)
//!        └─ HttpTransport (reqwest)          └─ KeyValueStore
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tourney::prelude::*;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let client = TournamentClient::builder()
//!     .config(ClientConfig::from_env())
//!     .build()
//!     .await?;
//!
//! let listing = client.list_tournaments().await?;
//! if let Some(tournament) = listing.developer.iter().find(|t| t.can_enter) {
//!     let entered = client.join_tournament(tournament, None).await?;
//!     println!("play level {}", entered.level);
//!     client
//!         .submit_score(&entered.match_id, Score::ElapsedMillis(42_000), 3)
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod level;
mod matches;
mod pipeline;
mod prizes;
mod sanitize;
mod tournaments;

pub use client::{FlowScope, TournamentClient, TournamentClientBuilder};
pub use config::{
    ClientConfig, ENV_API_KEY, ENV_BASE_URL, ENV_GAME_PUBLIC_KEY, ENV_PLAYER_NAME,
};
pub use error::ClientError;
pub use level::{DERIVED_LEVEL_COUNT, FIRST_DERIVED_LEVEL, Level, derive_level};
pub use matches::LeaderboardView;
pub use pipeline::{PendingOperation, RequestPipeline};
pub use prizes::{ClaimOutcome, PrizeOffer, UnclaimedPrize};
pub use sanitize::sanitize_code;
pub use tournaments::{EnteredMatch, TournamentListing, TournamentView};

/// Re-exports of the layer crates.
pub use tourney_crypto as crypto;
pub use tourney_protocol as protocol;
pub use tourney_session as session;
pub use tourney_store as store;
pub use tourney_transport as transport;

/// Everything a game usually needs.
pub mod prelude {
    pub use crate::{
        ClaimOutcome, ClientConfig, ClientError, EnteredMatch, FlowScope, LeaderboardView,
        Level, PendingOperation, PrizeOffer, TournamentClient, TournamentListing,
        TournamentView, UnclaimedPrize,
    };
    pub use tourney_protocol::{MatchDetails, Score, Tournament};
    pub use tourney_store::{JsonFileStore, KeyValueStore, MemoryStore};
}
