//! Listing, opening and joining tournaments.

use tourney_protocol::{
    Endpoint, EnterTournamentRequest, EnterTournamentResponse, LinkAccountRequest, MatchDetails,
    ProtocolError, Tournament, TournamentList,
};
use tourney_store::StoreKey;
use tourney_transport::HttpTransport;

use crate::{ClientError, Level, TournamentClient, sanitize_code};

/// Streaming platform the player-tournament list is scoped to.
const PLAYER_TOURNAMENT_PLATFORM: &str = "TWITCH";

/// The two tournament families, kept apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TournamentListing {
    /// Tournaments defined by the game's developer.
    pub developer: Vec<Tournament>,
    /// Tournaments created by streamers.
    pub player: Vec<Tournament>,
}

/// What opening a tournament found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TournamentView {
    /// The player can enter.
    Joinable {
        tournament: Tournament,
        /// An access key must be passed to
        /// [`join_tournament`](TournamentClient::join_tournament).
        access_key_required: bool,
        /// A streamer tournament and no linking code is stored yet.
        needs_linking_code: bool,
    },
    /// The player already joined. `resume` holds the match they were last
    /// playing, when this device remembers it.
    AlreadyJoined {
        tournament: Tournament,
        resume: Option<MatchDetails>,
    },
}

impl TournamentView {
    pub fn tournament(&self) -> &Tournament {
        match self {
            Self::Joinable { tournament, .. } | Self::AlreadyJoined { tournament, .. } => tournament,
        }
    }
}

/// A match the player has just entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnteredMatch {
    pub tournament_id: Option<String>,
    pub match_id: String,
    /// The level to load.
    pub level: Level,
    pub attempts_remaining: Option<u32>,
    /// Whether the match belongs to a streamer tournament.
    pub player_tournament: bool,
}

impl<T: HttpTransport> TournamentClient<T> {
    /// `GET /tournaments`: the developer-defined tournaments.
    pub async fn developer_tournaments(&self) -> Result<Vec<Tournament>, ClientError> {
        self.guarded(async {
            let list: TournamentList = self.pipeline().fetch(Endpoint::DeveloperTournaments).await?;
            Ok(list.tournaments)
        })
        .await
    }

    /// `GET /player-tournaments`: tournaments created by streamers.
    pub async fn player_tournaments(&self) -> Result<Vec<Tournament>, ClientError> {
        self.guarded(async {
            let list: TournamentList = self.pipeline().fetch(Endpoint::PlayerTournaments).await?;
            Ok(list
                .tournaments
                .into_iter()
                .map(|mut t| {
                    t.streaming_platform
                        .get_or_insert_with(|| PLAYER_TOURNAMENT_PLATFORM.to_string());
                    t
                })
                .collect())
        })
        .await
    }

    /// Fetches both lists concurrently. Either failing fails the whole
    /// listing.
    pub async fn list_tournaments(&self) -> Result<TournamentListing, ClientError> {
        let (developer, player) =
            tokio::try_join!(self.developer_tournaments(), self.player_tournaments())?;
        tracing::debug!(
            developer = developer.len(),
            player = player.len(),
            "listed tournaments"
        );
        Ok(TournamentListing { developer, player })
    }

    /// `GET /tournaments/{id}`, plus the resume match when the player
    /// already joined.
    pub async fn open_tournament(&self, tournament_id: &str) -> Result<TournamentView, ClientError> {
        self.guarded(async {
            let tournament: Tournament =
                self.pipeline().fetch(Endpoint::Tournament(tournament_id)).await?;

            if tournament.can_enter {
                let needs_linking_code = tournament.is_player_tournament()
                    && self.store().get_non_empty(&StoreKey::LinkingCode)?.is_none();
                return Ok(TournamentView::Joinable {
                    access_key_required: tournament.has_access_key,
                    needs_linking_code,
                    tournament,
                });
            }

            let pointer = StoreKey::ResumeMatch(tournament.id.clone());
            let resume = match self.store().get_non_empty(&pointer)? {
                Some(match_id) => Some(self.match_details(&match_id).await?),
                None => None,
            };
            Ok(TournamentView::AlreadyJoined { tournament, resume })
        })
        .await
    }

    /// Enters a tournament and returns the match to play.
    ///
    /// `access_key` is sanitized before it is sent and is required when
    /// the tournament has one. Streamer tournaments go through
    /// [`enter_player_tournament`](Self::enter_player_tournament) with the
    /// stored linking code.
    ///
    /// # Errors
    /// - [`ClientError::NotEnterable`] if the tournament is closed to this
    ///   player
    /// - [`ClientError::InvalidInput`] for a missing or empty access key,
    ///   or a streamer tournament with no stored linking code
    pub async fn join_tournament(
        &self,
        tournament: &Tournament,
        access_key: Option<&str>,
    ) -> Result<EnteredMatch, ClientError> {
        if tournament.is_player_tournament() {
            return self
                .enter_player_tournament(tournament, None, access_key)
                .await;
        }
        self.guarded(self.enter_tournament(tournament, access_key))
            .await
    }

    /// Enters a streamer tournament, linking the streaming account first
    /// if this device hasn't yet.
    ///
    /// With a stored linking code `linking_code` is ignored. Otherwise it
    /// is linked via [`link_account`](Self::link_account) before entering.
    pub async fn enter_player_tournament(
        &self,
        tournament: &Tournament,
        linking_code: Option<&str>,
        access_key: Option<&str>,
    ) -> Result<EnteredMatch, ClientError> {
        if !tournament.can_enter {
            return Err(ClientError::NotEnterable(tournament.id.clone()));
        }
        self.guarded(async {
            if self.store().get_non_empty(&StoreKey::LinkingCode)?.is_none() {
                let code = linking_code.ok_or_else(|| {
                    ClientError::InvalidInput("a linking code is required".into())
                })?;
                self.link(code).await?;
            }
            self.enter_tournament(tournament, access_key).await
        })
        .await
    }

    /// `PUT /players/streaming-platform-account-linking-code`.
    ///
    /// The sanitized code is stored only once the service accepts it.
    pub async fn link_account(&self, code: &str) -> Result<(), ClientError> {
        self.guarded(self.link(code)).await
    }

    async fn link(&self, code: &str) -> Result<(), ClientError> {
        let code = sanitize_code(code);
        if code.is_empty() {
            return Err(ClientError::InvalidInput("linking code is empty".into()));
        }
        self.pipeline()
            .submit_raw(Endpoint::LinkAccount, &LinkAccountRequest { code: code.clone() })
            .await?;
        self.store().set(&StoreKey::LinkingCode, &code)?;
        tracing::info!("streaming account linked");
        Ok(())
    }

    async fn enter_tournament(
        &self,
        tournament: &Tournament,
        access_key: Option<&str>,
    ) -> Result<EnteredMatch, ClientError> {
        if !tournament.can_enter {
            return Err(ClientError::NotEnterable(tournament.id.clone()));
        }

        let access_key = if tournament.has_access_key {
            let key = access_key.map(sanitize_code).unwrap_or_default();
            if key.is_empty() {
                return Err(ClientError::InvalidInput(format!(
                    "tournament {} requires an access key",
                    tournament.id
                )));
            }
            Some(key)
        } else {
            None
        };

        let player_tournament = tournament.is_player_tournament();
        let response: EnterTournamentResponse = self
            .pipeline()
            .submit(
                Endpoint::EnterTournament(&tournament.id),
                &EnterTournamentRequest::new(access_key),
            )
            .await?;
        tracing::info!(tournament_id = %tournament.id, "entered tournament");

        let Some(match_id) = response.match_id else {
            // No pre-assigned match: pick up the live one.
            let live = self.find_live_match(&tournament.id).await?.ok_or_else(|| {
                ProtocolError::InvalidMessage(format!(
                    "no live match for tournament {}",
                    tournament.id
                ))
            })?;
            let mut entered = self.enter_match(&live.match_id, player_tournament).await?;
            if entered.tournament_id.is_none() {
                entered.tournament_id = Some(tournament.id.clone());
                self.remember_match(&entered)?;
            }
            return Ok(entered);
        };

        let entered = EnteredMatch {
            tournament_id: Some(tournament.id.clone()),
            level: Level::select(response.metadata.as_deref(), &match_id, player_tournament),
            match_id,
            attempts_remaining: response.attempts_remaining,
            player_tournament,
        };
        self.remember_match(&entered)?;
        Ok(entered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tournament_view_exposes_tournament() {
        let tournament = Tournament {
            id: "t-1".into(),
            ..Tournament::default()
        };
        let view = TournamentView::AlreadyJoined {
            tournament: tournament.clone(),
            resume: None,
        };
        assert_eq!(view.tournament(), &tournament);
    }

    #[test]
    fn test_listing_default_is_empty() {
        let listing = TournamentListing::default();
        assert!(listing.developer.is_empty());
        assert!(listing.player.is_empty());
    }
}
