//! Wire protocol for the Tourney tournament service.
//!
//! This crate defines what travels between the client and the service:
//!
//! - **Types** ([`Tournament`], [`MatchDetails`], [`ClaimPrizeResponse`],
//!   etc.): serde structs for every request and response body.
//! - **Endpoints** ([`Endpoint`]): the verb and path of every call.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how bodies are turned
//!   into bytes and back.
//! - **Errors** ([`ProtocolError`]): undecodable bodies and non-success
//!   statuses.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw HTTP) and session
//! (who is asking). It knows nothing about keys or sessions; it only
//! knows the shape of each message.
//!
//! ```text
//! Transport (HttpRequest) → Protocol (typed bodies) → Session / Client
//! ```

mod codec;
mod endpoints;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use endpoints::{
    API_KEY_HEADER, CONTENT_TYPE_HEADER, DEFAULT_BASE_URL, Endpoint, JSON_CONTENT_TYPE,
    SESSION_ID_HEADER, join_url,
};
pub use error::ProtocolError;
pub use types::{
    AuthPlayerRequest, AuthPlayerResponse, AwardedPrize, ClaimPrizeRequest,
    ClaimPrizeResponse, ClaimedPrize, EnterMatchRequest, EnterMatchResponse,
    EnterTournamentRequest, EnterTournamentResponse, LeaderboardEntry,
    LeaderboardResponse, LinkAccountRequest, MatchDetails, MatchList,
    MatchSummary, PHYSICAL_PRIZE_TYPE, PrizeBundle, PrizeDetails, PrizeStatus,
    RegisterRequest, RegisterResponse, Score, Stat, SubmitScoreRequest,
    Tournament, TournamentDetails, TournamentList,
};
