//! Entering matches, submitting scores and reading leaderboards.

use tourney_protocol::{
    Endpoint, EnterMatchRequest, EnterMatchResponse, LeaderboardEntry, LeaderboardResponse,
    MatchDetails, MatchList, MatchSummary, Score, SubmitScoreRequest,
};
use tourney_store::StoreKey;
use tourney_transport::HttpTransport;

use crate::{ClientError, EnteredMatch, Level, TournamentClient};

/// A leaderboard page plus the current player's position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardView {
    /// The page as first fetched.
    pub board: LeaderboardResponse,
    /// The player's own ranked entry, from the first page or from the
    /// neighbour query.
    pub current_player: Option<LeaderboardEntry>,
}

impl LeaderboardView {
    /// The leading entry.
    pub fn top(&self) -> Option<&LeaderboardEntry> {
        self.board.leaderboard.first()
    }

    pub fn top_score(&self) -> Option<Score> {
        self.top().and_then(|e| self.board.score_of(e))
    }

    pub fn current_score(&self) -> Option<Score> {
        self.current_player
            .as_ref()
            .and_then(|e| self.board.score_of(e))
    }
}

impl<T: HttpTransport> TournamentClient<T> {
    /// Looks for a live match of `tournament_id`, streamer matches first.
    pub async fn find_live_match(
        &self,
        tournament_id: &str,
    ) -> Result<Option<MatchSummary>, ClientError> {
        self.guarded(async {
            let list: MatchList = self.pipeline().fetch(Endpoint::LiveMatches).await?;
            Ok(list
                .player_matches
                .into_iter()
                .chain(list.matches)
                .find(|m| m.tournament_id.as_deref() == Some(tournament_id)))
        })
        .await
    }

    /// `POST /matches/{id}/enter` and picks the level.
    pub async fn enter_match(
        &self,
        match_id: &str,
        player_tournament: bool,
    ) -> Result<EnteredMatch, ClientError> {
        self.guarded(async {
            let response: EnterMatchResponse = self
                .pipeline()
                .submit(Endpoint::EnterMatch(match_id), &EnterMatchRequest::default())
                .await?;
            tracing::info!(match_id = %response.match_id, "entered match");

            let entered = EnteredMatch {
                level: Level::select(
                    response.metadata.as_deref(),
                    &response.match_id,
                    player_tournament,
                ),
                tournament_id: response.tournament_id,
                match_id: response.match_id,
                attempts_remaining: response.attempts_remaining,
                player_tournament,
            };
            self.remember_match(&entered)?;
            Ok(entered)
        })
        .await
    }

    /// Plays a match again. The level comes out the same as the first
    /// time for derived levels.
    pub async fn replay(&self, details: &MatchDetails) -> Result<EnteredMatch, ClientError> {
        self.enter_match(&details.match_id, details.is_player_tournament())
            .await
    }

    /// `GET /matches/{id}`.
    pub async fn match_details(&self, match_id: &str) -> Result<MatchDetails, ClientError> {
        self.guarded(self.pipeline().fetch(Endpoint::Match(match_id)))
            .await
    }

    /// `PUT /matches/{id}/score`, then fetches the updated details.
    ///
    /// [`MatchDetails::score_from`] gives a raw number the unit the
    /// tournament ranks by. `lives` always travels as the `lives` stat.
    pub async fn submit_score(
        &self,
        match_id: &str,
        score: Score,
        lives: i64,
    ) -> Result<MatchDetails, ClientError> {
        self.guarded(async {
            self.pipeline()
                .submit_raw(
                    Endpoint::SubmitScore(match_id),
                    &SubmitScoreRequest::new(score, lives),
                )
                .await?;
            tracing::info!(match_id, score = score.raw(), lives, "score submitted");
            self.pipeline().fetch(Endpoint::Match(match_id)).await
        })
        .await
    }

    /// Fetches the leaderboard, then the player's neighbourhood if the
    /// first page didn't rank them. The second query happens at most once.
    pub async fn leaderboard(&self, match_id: &str) -> Result<LeaderboardView, ClientError> {
        self.guarded(async {
            let board: LeaderboardResponse = self
                .pipeline()
                .fetch(Endpoint::Leaderboard {
                    match_id,
                    neighbors: false,
                })
                .await?;

            let current_player = match board.ranked_current_player() {
                Some(entry) => Some(entry.clone()),
                None => {
                    let around: LeaderboardResponse = self
                        .pipeline()
                        .fetch(Endpoint::Leaderboard {
                            match_id,
                            neighbors: true,
                        })
                        .await?;
                    around.ranked_current_player().cloned()
                }
            };

            Ok(LeaderboardView {
                board,
                current_player,
            })
        })
        .await
    }

    /// Stores `tournament → match` so the match can be resumed later.
    pub(crate) fn remember_match(&self, entered: &EnteredMatch) -> Result<(), ClientError> {
        if let Some(tournament_id) = &entered.tournament_id {
            self.store()
                .set(&StoreKey::ResumeMatch(tournament_id.clone()), &entered.match_id)?;
        }
        Ok(())
    }
}
