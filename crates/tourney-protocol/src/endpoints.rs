//! Every call the client makes, as a verb plus a path.
//!
//! Paths are relative to the service base URL (see [`join_url`]). Query
//! strings are already percent-encoded.

use std::fmt;

use tourney_transport::Method;

/// Production base URL, version prefix included.
pub const DEFAULT_BASE_URL: &str = "https://api.amazongameon.com/v1";

/// Header carrying the game's API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";
/// Header carrying the current session id.
pub const SESSION_ID_HEADER: &str = "Session-Id";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// One service endpoint.
///
/// Borrowed ids keep building an endpoint allocation-free until
/// [`path`](Self::path) renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `POST /players/register`
    Register,
    /// `POST /players/auth`
    Authenticate,
    /// `PUT /players/streaming-platform-account-linking-code`
    LinkAccount,
    /// `GET /tournaments` with the lives-stat player attribute.
    DeveloperTournaments,
    /// `GET /player-tournaments` for Twitch-linked tournaments.
    PlayerTournaments,
    Tournament(&'a str),
    EnterTournament(&'a str),
    /// `GET /matches?filterBy=live`
    LiveMatches,
    /// `GET /matches?filterBy=unclaimed-prizes`
    UnclaimedPrizeMatches,
    Match(&'a str),
    EnterMatch(&'a str),
    SubmitScore(&'a str),
    /// `GET /matches/{id}/leaderboard`, optionally scoped to the
    /// current player's neighbours.
    Leaderboard { match_id: &'a str, neighbors: bool },
    Prize(&'a str),
    ClaimPrizes,
    FulfillPrizes,
}

impl Endpoint<'_> {
    /// The HTTP verb this endpoint expects.
    pub fn method(&self) -> Method {
        match self {
            Self::Register
            | Self::Authenticate
            | Self::EnterTournament(_)
            | Self::EnterMatch(_)
            | Self::ClaimPrizes
            | Self::FulfillPrizes => Method::Post,
            Self::LinkAccount | Self::SubmitScore(_) => Method::Put,
            Self::DeveloperTournaments
            | Self::PlayerTournaments
            | Self::Tournament(_)
            | Self::LiveMatches
            | Self::UnclaimedPrizeMatches
            | Self::Match(_)
            | Self::Leaderboard { .. }
            | Self::Prize(_) => Method::Get,
        }
    }

    /// The path (and query), starting with `/`.
    pub fn path(&self) -> String {
        match self {
            Self::Register => "/players/register".into(),
            Self::Authenticate => "/players/auth".into(),
            Self::LinkAccount => "/players/streaming-platform-account-linking-code".into(),
            // playerAttributes={"stats":"lives"}
            Self::DeveloperTournaments => {
                "/tournaments?playerAttributes=%7B%22stats%22%3A%22lives%22%7D".into()
            }
            Self::PlayerTournaments => {
                "/player-tournaments?queryBy=GAME&streamingPlatform=TWITCH".into()
            }
            Self::Tournament(id) => format!("/tournaments/{id}"),
            Self::EnterTournament(id) => format!("/tournaments/{id}/enter"),
            Self::LiveMatches => "/matches?filterBy=live".into(),
            Self::UnclaimedPrizeMatches => "/matches?filterBy=unclaimed-prizes".into(),
            Self::Match(id) => format!("/matches/{id}"),
            Self::EnterMatch(id) => format!("/matches/{id}/enter"),
            Self::SubmitScore(id) => format!("/matches/{id}/score"),
            Self::Leaderboard {
                match_id,
                neighbors: false,
            } => format!("/matches/{match_id}/leaderboard"),
            Self::Leaderboard {
                match_id,
                neighbors: true,
            } => format!("/matches/{match_id}/leaderboard?currentPlayerNeighbors=1"),
            Self::Prize(id) => format!("/prizes/{id}"),
            Self::ClaimPrizes => "/prizes/claim".into(),
            Self::FulfillPrizes => "/prizes/fulfill".into(),
        }
    }

    /// The absolute URL under `base`.
    pub fn url(&self, base: &str) -> String {
        join_url(base, &self.path())
    }
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// Joins a base URL and a `/`-prefixed path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_handles_trailing_slash() {
        assert_eq!(join_url("https://h/v1/", "/prizes/claim"), "https://h/v1/prizes/claim");
        assert_eq!(join_url("https://h/v1", "/prizes/claim"), "https://h/v1/prizes/claim");
    }

    #[test]
    fn test_endpoint_methods_match_service() {
        assert_eq!(Endpoint::Register.method(), Method::Post);
        assert_eq!(Endpoint::SubmitScore("m").method(), Method::Put);
        assert_eq!(Endpoint::LinkAccount.method(), Method::Put);
        assert_eq!(Endpoint::EnterMatch("m").method(), Method::Post);
        assert_eq!(Endpoint::Prize("p").method(), Method::Get);
    }

    #[test]
    fn test_leaderboard_path_neighbors_query() {
        let top = Endpoint::Leaderboard {
            match_id: "m1",
            neighbors: false,
        };
        let near = Endpoint::Leaderboard {
            match_id: "m1",
            neighbors: true,
        };
        assert_eq!(top.path(), "/matches/m1/leaderboard");
        assert_eq!(near.path(), "/matches/m1/leaderboard?currentPlayerNeighbors=1");
    }

    #[test]
    fn test_developer_tournaments_query_is_encoded() {
        let path = Endpoint::DeveloperTournaments.path();
        assert!(!path.contains('"'));
        assert!(!path.contains(' '));
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(
            Endpoint::EnterTournament("t-9").to_string(),
            "POST /tournaments/t-9/enter"
        );
    }
}
