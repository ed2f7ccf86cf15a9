//! Request and response bodies for every tournament-service endpoint.
//!
//! Field names follow the service's camelCase JSON. Response structs are
//! lenient: anything the service may omit is an `Option` or defaults to
//! empty, so a sparse answer decodes and the workflow decides whether
//! the missing piece matters.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, de};

/// Prize info type whose payload is a URL to open rather than something
/// to fulfil through the API.
pub const PHYSICAL_PRIZE_TYPE: &str = "AMAZON_PHYSICAL";

// ---------------------------------------------------------------------------
// Device registration and authentication
// ---------------------------------------------------------------------------

/// `POST /players/register`: the device public key, encrypted under the
/// game's public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub encrypted_payload: String,
}

/// The player token, encrypted under the device public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub encrypted_player_token: String,
}

/// `POST /players/auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPlayerRequest {
    pub app_build_type: String,
    #[serde(rename = "deviceOSType")]
    pub device_os_type: String,
    /// The persisted device app token.
    pub encrypted_payload: String,
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPlayerResponse {
    pub session_id: String,
    /// Epoch milliseconds (UTC).
    pub session_expiration_date: i64,
}

/// `PUT /players/streaming-platform-account-linking-code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAccountRequest {
    pub code: String,
}

// ---------------------------------------------------------------------------
// Tournaments
// ---------------------------------------------------------------------------

/// A tournament, developer-defined or created by a streamer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    #[serde(rename = "tournamentId")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub win_type: Option<String>,
    #[serde(default)]
    pub player_attempts_per_match: Option<u32>,
    #[serde(default)]
    pub can_enter: bool,
    /// Developer tournaments send a JSON boolean, player tournaments send
    /// `"true"` / `"false"`. Both decode here.
    #[serde(default, deserialize_with = "bool_or_string")]
    pub has_access_key: bool,
    /// Developer tournaments put the level name here.
    #[serde(default)]
    pub metadata: Option<String>,
    /// Set only on streaming-platform tournaments.
    #[serde(default)]
    pub streaming_platform: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Tournament {
    /// Whether this tournament was created through a streaming platform.
    pub fn is_player_tournament(&self) -> bool {
        self.streaming_platform.is_some()
    }
}

/// `GET /tournaments` and `GET /player-tournaments`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TournamentList {
    #[serde(default)]
    pub tournaments: Vec<Tournament>,
}

/// `POST /tournaments/{id}/enter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterTournamentRequest {
    pub player_attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
}

impl EnterTournamentRequest {
    /// Marks the player active; attaches the (already sanitized) access
    /// key when the tournament requires one.
    pub fn new(access_key: Option<String>) -> Self {
        Self {
            player_attributes: active_player(),
            access_key,
        }
    }
}

/// What entering a tournament produced.
///
/// `match_id` is absent when the service didn't pre-assign a match; the
/// client then looks one up among live matches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterTournamentResponse {
    #[serde(default)]
    pub tournament_id: Option<String>,
    #[serde(default)]
    pub match_id: Option<String>,
    #[serde(default)]
    pub attempts_remaining: Option<u32>,
    #[serde(default)]
    pub metadata: Option<String>,
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// `GET /matches?filterBy=...`: developer and player matches arrive in
/// separate arrays.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchList {
    #[serde(default)]
    pub matches: Vec<MatchSummary>,
    #[serde(default)]
    pub player_matches: Vec<MatchSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: String,
    #[serde(default)]
    pub tournament_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub prize_bundles: Vec<PrizeBundle>,
}

/// A named group of prize ids awarded together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeBundle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub prize_ids: Vec<String>,
}

/// `POST /matches/{id}/enter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterMatchRequest {
    pub player_attributes: BTreeMap<String, String>,
}

impl Default for EnterMatchRequest {
    fn default() -> Self {
        Self {
            player_attributes: active_player(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterMatchResponse {
    pub match_id: String,
    #[serde(default)]
    pub tournament_id: Option<String>,
    #[serde(default)]
    pub attempts_remaining: Option<u32>,
    #[serde(default)]
    pub metadata: Option<String>,
}

/// `GET /matches/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    pub match_id: String,
    /// Raw score. Its unit depends on the tournament; use
    /// [`score`](Self::score) instead.
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub attempts_remaining: Option<u32>,
    #[serde(default)]
    pub can_enter: bool,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub tournament_details: TournamentDetails,
    #[serde(default)]
    pub awarded_prizes: Vec<AwardedPrize>,
}

impl MatchDetails {
    /// The score with its unit made explicit.
    pub fn score(&self) -> Option<Score> {
        self.score
            .map(|raw| self.score_from(raw))
    }

    /// Gives `raw` the unit this match's tournament ranks by.
    pub fn score_from(&self, raw: i64) -> Score {
        Score::from_raw(raw, self.tournament_details.leaderboard_stat.as_deref())
    }

    /// Whether the match belongs to a streamer-created tournament.
    pub fn is_player_tournament(&self) -> bool {
        self.tournament_details
            .creator_player_name
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentDetails {
    #[serde(default)]
    pub tournament_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Present (e.g. `"lives"`) when the leaderboard ranks by a stat
    /// instead of elapsed time.
    #[serde(default)]
    pub leaderboard_stat: Option<String>,
    #[serde(default)]
    pub creator_player_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardedPrize {
    pub awarded_prize_id: String,
    #[serde(default)]
    pub prize_id: Option<String>,
    #[serde(default)]
    pub status: Option<PrizeStatus>,
}

/// `PUT /matches/{id}/score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitScoreRequest {
    pub score: i64,
    #[serde(default)]
    pub stats: Vec<Stat>,
}

impl SubmitScoreRequest {
    /// A submission of `score`, with `lives` sent as the lives stat.
    pub fn new(score: Score, lives: i64) -> Self {
        Self::with_lives(score.raw(), lives)
    }

    /// Same as [`new`](Self::new) for an already-raw score.
    pub fn with_lives(score: i64, lives: i64) -> Self {
        Self {
            score,
            stats: vec![Stat {
                name: "lives".into(),
                value: lives,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub name: String,
    pub value: i64,
}

/// A score with its unit.
///
/// The service sends one numeric `score` field for both tournament
/// families; a tournament whose details carry a `leaderboardStat` ranks by
/// lives used, every other tournament by elapsed milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    ElapsedMillis(i64),
    LivesUsed(i64),
}

impl Score {
    /// Interprets a raw score given the tournament's `leaderboardStat`.
    /// An empty stat counts as absent.
    pub fn from_raw(raw: i64, leaderboard_stat: Option<&str>) -> Self {
        match leaderboard_stat {
            Some(stat) if !stat.is_empty() => Self::LivesUsed(raw),
            _ => Self::ElapsedMillis(raw),
        }
    }

    /// The number as the service sends it.
    pub fn raw(&self) -> i64 {
        match self {
            Self::ElapsedMillis(v) | Self::LivesUsed(v) => *v,
        }
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// `GET /matches/{id}/leaderboard`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub current_player: Option<LeaderboardEntry>,
    #[serde(default)]
    pub leaderboard_stat: Option<String>,
}

impl LeaderboardResponse {
    /// The requesting player's entry, if the service ranked them.
    ///
    /// The service sends a `currentPlayer` object with a null
    /// `externalPlayerId` when the player isn't in this page.
    pub fn ranked_current_player(&self) -> Option<&LeaderboardEntry> {
        self.current_player
            .as_ref()
            .filter(|p| p.external_player_id.is_some())
    }

    /// Interprets an entry's score for this leaderboard.
    pub fn score_of(&self, entry: &LeaderboardEntry) -> Option<Score> {
        entry
            .score
            .map(|raw| Score::from_raw(raw, self.leaderboard_stat.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub external_player_id: Option<String>,
    #[serde(default)]
    pub rank: Option<u64>,
    #[serde(default)]
    pub score: Option<i64>,
}

// ---------------------------------------------------------------------------
// Prizes
// ---------------------------------------------------------------------------

/// `GET /prizes/{id}`: display data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeDetails {
    #[serde(default)]
    pub prize_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body of both `POST /prizes/claim` and `POST /prizes/fulfill`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPrizeRequest {
    pub awarded_prize_ids: Vec<String>,
}

impl ClaimPrizeRequest {
    pub fn single(awarded_prize_id: impl Into<String>) -> Self {
        Self {
            awarded_prize_ids: vec![awarded_prize_id.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClaimPrizeResponse {
    #[serde(default)]
    pub prizes: Vec<ClaimedPrize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedPrize {
    #[serde(default)]
    pub awarded_prize_id: Option<String>,
    #[serde(default)]
    pub status: PrizeStatus,
    #[serde(default)]
    pub prize_info_type: Option<String>,
    /// Plaintext prize info, when the service sends it unencrypted.
    #[serde(default)]
    pub prize_info: Option<String>,
    /// Legacy encrypted prize info.
    #[serde(default)]
    pub encrypted_prize_info: Option<String>,
    #[serde(default, rename = "encryptedPrizeInfoV2")]
    pub encrypted_prize_info_v2: Option<String>,
}

impl ClaimedPrize {
    /// Whether the payload is a URL to open (physical Amazon prize).
    pub fn is_physical(&self) -> bool {
        self.prize_info_type.as_deref() == Some(PHYSICAL_PRIZE_TYPE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrizeStatus {
    #[default]
    Pending,
    Fulfilled,
    /// Any status this client doesn't know about. Treated like pending.
    #[serde(other)]
    Other,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn active_player() -> BTreeMap<String, String> {
    BTreeMap::from([("isActive".to_string(), "true".to_string())])
}

fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Bool(bool),
        Text(String),
    }

    match Option::<Flexible>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Flexible::Bool(b)) => Ok(b),
        Some(Flexible::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(de::Error::custom(format!(
                "expected a boolean or \"true\"/\"false\", got {other:?}"
            ))),
        },
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;

    fn decode<T: serde::de::DeserializeOwned>(json: &str) -> T {
        serde_json::from_str(json).unwrap()
    }

    // =========================================================================
    // Tournaments
    // =========================================================================

    #[test]
    fn test_tournament_has_access_key_accepts_bool() {
        let t: Tournament = decode(r#"{"tournamentId":"t1","title":"Cup","hasAccessKey":true}"#);
        assert!(t.has_access_key);
        assert_eq!(t.id, "t1");
    }

    #[test]
    fn test_tournament_has_access_key_accepts_string() {
        let t: Tournament = decode(r#"{"tournamentId":"t2","hasAccessKey":"false","streamingPlatform":"TWITCH"}"#);
        assert!(!t.has_access_key);
        assert!(t.is_player_tournament());

        let t: Tournament = decode(r#"{"tournamentId":"t3","hasAccessKey":"True"}"#);
        assert!(t.has_access_key);
    }

    #[test]
    fn test_tournament_has_access_key_missing_or_null_is_false() {
        let t: Tournament = decode(r#"{"tournamentId":"t1"}"#);
        assert!(!t.has_access_key);
        let t: Tournament = decode(r#"{"tournamentId":"t1","hasAccessKey":null}"#);
        assert!(!t.has_access_key);
    }

    #[test]
    fn test_tournament_has_access_key_rejects_garbage() {
        let result: Result<Tournament, _> =
            serde_json::from_str(r#"{"tournamentId":"t1","hasAccessKey":"maybe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_enter_tournament_request_shape() {
        let with_key = serde_json::to_value(EnterTournamentRequest::new(Some("ab:1".into()))).unwrap();
        assert_eq!(
            with_key,
            serde_json::json!({"playerAttributes":{"isActive":"true"},"accessKey":"ab:1"})
        );

        let without = serde_json::to_value(EnterTournamentRequest::new(None)).unwrap();
        assert_eq!(without, serde_json::json!({"playerAttributes":{"isActive":"true"}}));
    }

    // =========================================================================
    // Matches and scores
    // =========================================================================

    #[test]
    fn test_submit_score_request_shape() {
        let body = serde_json::to_value(SubmitScoreRequest::with_lives(12_500, 3)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"score":12500,"stats":[{"name":"lives","value":3}]})
        );
    }

    #[test]
    fn test_match_details_score_unit_follows_leaderboard_stat() {
        let timed: MatchDetails = decode(r#"{"matchId":"m1","score":4200,"tournamentDetails":{}}"#);
        assert_eq!(timed.score(), Some(Score::ElapsedMillis(4200)));

        let lives: MatchDetails =
            decode(r#"{"matchId":"m1","score":2,"tournamentDetails":{"leaderboardStat":"lives"}}"#);
        assert_eq!(lives.score(), Some(Score::LivesUsed(2)));
    }

    #[test]
    fn test_match_details_score_from_uses_match_unit() {
        let lives: MatchDetails =
            decode(r#"{"matchId":"m1","tournamentDetails":{"leaderboardStat":"lives"}}"#);
        assert_eq!(lives.score_from(3), Score::LivesUsed(3));
        assert_eq!(MatchDetails::default().score_from(61_000), Score::ElapsedMillis(61_000));
    }

    #[test]
    fn test_submit_score_request_new_sends_raw_value() {
        let timed = SubmitScoreRequest::new(Score::ElapsedMillis(12_500), 3);
        let lives = SubmitScoreRequest::new(Score::LivesUsed(2), 1);
        assert_eq!(timed, SubmitScoreRequest::with_lives(12_500, 3));
        assert_eq!(lives.score, 2);
    }

    #[test]
    fn test_score_from_raw_empty_stat_is_elapsed() {
        assert_eq!(Score::from_raw(7, Some("")), Score::ElapsedMillis(7));
        assert_eq!(Score::from_raw(7, None).raw(), 7);
    }

    #[test]
    fn test_match_details_player_tournament_from_creator() {
        let dev: MatchDetails = decode(r#"{"matchId":"m1","tournamentDetails":{"creatorPlayerName":""}}"#);
        assert!(!dev.is_player_tournament());

        let streamer: MatchDetails =
            decode(r#"{"matchId":"m1","tournamentDetails":{"creatorPlayerName":"streamer42"}}"#);
        assert!(streamer.is_player_tournament());
    }

    // =========================================================================
    // Leaderboard
    // =========================================================================

    #[test]
    fn test_leaderboard_unranked_current_player() {
        let lb: LeaderboardResponse = decode(
            r#"{"leaderboard":[{"playerName":"ada","score":900,"rank":1}],
                "currentPlayer":{"externalPlayerId":null}}"#,
        );
        assert!(lb.ranked_current_player().is_none());
        assert_eq!(lb.score_of(&lb.leaderboard[0]), Some(Score::ElapsedMillis(900)));
    }

    #[test]
    fn test_leaderboard_ranked_current_player() {
        let lb: LeaderboardResponse = decode(
            r#"{"leaderboard":[],"leaderboardStat":"lives",
                "currentPlayer":{"externalPlayerId":"p-7","rank":12,"score":1}}"#,
        );
        let me = lb.ranked_current_player().unwrap();
        assert_eq!(me.rank, Some(12));
        assert_eq!(lb.score_of(me), Some(Score::LivesUsed(1)));
    }

    // =========================================================================
    // Prizes
    // =========================================================================

    #[test]
    fn test_claimed_prize_status_decoding() {
        let resp: ClaimPrizeResponse = decode(
            r#"{"prizes":[
                {"status":"FULFILLED"},
                {"status":"PENDING","prizeInfoType":"AMAZON_PHYSICAL","encryptedPrizeInfoV2":"xyz"},
                {"status":"SOMETHING_NEW"}
            ]}"#,
        );
        assert_eq!(resp.prizes[0].status, PrizeStatus::Fulfilled);
        assert_eq!(resp.prizes[1].status, PrizeStatus::Pending);
        assert!(resp.prizes[1].is_physical());
        assert_eq!(resp.prizes[1].encrypted_prize_info_v2.as_deref(), Some("xyz"));
        assert_eq!(resp.prizes[2].status, PrizeStatus::Other);
    }

    #[test]
    fn test_claim_request_shape() {
        let body = serde_json::to_value(ClaimPrizeRequest::single("ap-1")).unwrap();
        assert_eq!(body, serde_json::json!({"awardedPrizeIds":["ap-1"]}));
    }

    #[test]
    fn test_auth_request_shape() {
        let body = serde_json::to_value(AuthPlayerRequest {
            app_build_type: "release".into(),
            device_os_type: "Android".into(),
            encrypted_payload: "tok".into(),
            player_name: "ada".into(),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "appBuildType":"release",
                "deviceOSType":"Android",
                "encryptedPayload":"tok",
                "playerName":"ada"
            })
        );
    }
}
