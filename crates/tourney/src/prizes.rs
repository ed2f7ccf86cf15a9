//! Finding and claiming prizes.
//!
//! ```text
//! unclaimed_prizes ─pick─→ prize_offer ─→ claim_prize
//!                                            ├─ FULFILLED        → AlreadyFulfilled
//!                                            ├─ AMAZON_PHYSICAL  → OpenUrl(info)
//!                                            └─ other            → POST /prizes/fulfill → Fulfilled
//! ```

use tourney_protocol::{
    ClaimPrizeRequest, ClaimPrizeResponse, ClaimedPrize, Endpoint, MatchList, MatchSummary,
    PrizeDetails, PrizeStatus, ProtocolError,
};
use tourney_session::DeviceIdentity;
use tourney_transport::HttpTransport;

use crate::{ClientError, TournamentClient};

/// A prize waiting to be claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnclaimedPrize {
    pub match_id: String,
    /// The prize bundle's title.
    pub title: String,
    pub prize_id: String,
    pub player_tournament: bool,
}

/// A prize ready to claim, with display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeOffer {
    /// The id to pass to [`claim_prize`](TournamentClient::claim_prize).
    pub awarded_prize_id: String,
    pub details: PrizeDetails,
}

/// How a claim ended.
#[derive(Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The prize was fulfilled earlier. Nothing else to do.
    AlreadyFulfilled,
    /// A physical prize: open this URL to redeem it.
    OpenUrl(String),
    /// A digital prize, now fulfilled. `prize_info` is whatever the
    /// service attached (typically a code).
    Fulfilled {
        prize_info_type: Option<String>,
        prize_info: String,
    },
}

impl std::fmt::Debug for ClaimOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyFulfilled => f.write_str("AlreadyFulfilled"),
            Self::OpenUrl(_) => f.debug_tuple("OpenUrl").field(&"[REDACTED]").finish(),
            Self::Fulfilled {
                prize_info_type, ..
            } => f
                .debug_struct("Fulfilled")
                .field("prize_info_type", prize_info_type)
                .field("prize_info", &"[REDACTED]")
                .finish(),
        }
    }
}

impl<T: HttpTransport> TournamentClient<T> {
    /// Prizes won but not yet claimed, one per match.
    ///
    /// Uses each match's first bundle and its first prize. Matches
    /// without one are skipped.
    pub async fn unclaimed_prizes(&self) -> Result<Vec<UnclaimedPrize>, ClientError> {
        self.guarded(async {
            let list: MatchList = self.pipeline().fetch(Endpoint::UnclaimedPrizeMatches).await?;
            let developer = list.matches.into_iter().map(|m| (m, false));
            let player = list.player_matches.into_iter().map(|m| (m, true));
            Ok(developer
                .chain(player)
                .filter_map(|(m, player_tournament)| unclaimed(m, player_tournament))
                .collect())
        })
        .await
    }

    /// Looks up the awarded prize for `match_id` and the display data for
    /// `prize_id`.
    pub async fn prize_offer(
        &self,
        match_id: &str,
        prize_id: &str,
    ) -> Result<PrizeOffer, ClientError> {
        self.guarded(async {
            let details = self.match_details(match_id).await?;
            let awarded = details.awarded_prizes.into_iter().next().ok_or_else(|| {
                ProtocolError::InvalidMessage(format!("match {match_id} has no awarded prize"))
            })?;
            let prize: PrizeDetails = self.pipeline().fetch(Endpoint::Prize(prize_id)).await?;
            Ok(PrizeOffer {
                awarded_prize_id: awarded.awarded_prize_id,
                details: prize,
            })
        })
        .await
    }

    /// `POST /prizes/claim`, then redeems the prize.
    ///
    /// A `FULFILLED` answer ends the claim with no decryption and no
    /// further calls.
    ///
    /// # Errors
    /// - [`ClientError::Protocol`] if the answer lists no prize or the
    ///   prize has no info
    /// - [`ClientError::Crypto`] if the encrypted info doesn't decrypt
    ///   with this device's key
    pub async fn claim_prize(&self, awarded_prize_id: &str) -> Result<ClaimOutcome, ClientError> {
        self.guarded(async {
            let request = ClaimPrizeRequest::single(awarded_prize_id);
            let response: ClaimPrizeResponse =
                self.pipeline().submit(Endpoint::ClaimPrizes, &request).await?;
            let prize = response.prizes.into_iter().next().ok_or_else(|| {
                ProtocolError::InvalidMessage("claim response lists no prizes".into())
            })?;

            if prize.status == PrizeStatus::Fulfilled {
                tracing::info!(awarded_prize_id, "prize already fulfilled");
                return Ok(ClaimOutcome::AlreadyFulfilled);
            }

            let info = prize_info(&prize, self.session().identity())?;
            if prize.is_physical() {
                tracing::info!(awarded_prize_id, "physical prize claimed");
                return Ok(ClaimOutcome::OpenUrl(info));
            }

            self.pipeline()
                .submit_raw(Endpoint::FulfillPrizes, &request)
                .await?;
            tracing::info!(awarded_prize_id, "prize fulfilled");
            Ok(ClaimOutcome::Fulfilled {
                prize_info_type: prize.prize_info_type,
                prize_info: info,
            })
        })
        .await
    }
}

fn unclaimed(summary: MatchSummary, player_tournament: bool) -> Option<UnclaimedPrize> {
    let bundle = summary.prize_bundles.into_iter().next()?;
    let prize_id = bundle.prize_ids.into_iter().next()?;
    Some(UnclaimedPrize {
        match_id: summary.match_id,
        title: bundle.title,
        prize_id,
        player_tournament,
    })
}

/// Plaintext info wins, then the v2 ciphertext, then the legacy one.
fn prize_info(prize: &ClaimedPrize, identity: &DeviceIdentity) -> Result<String, ClientError> {
    let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(plain) = present(&prize.prize_info) {
        return Ok(plain);
    }
    match present(&prize.encrypted_prize_info_v2).or_else(|| present(&prize.encrypted_prize_info)) {
        Some(ciphertext) => Ok(identity.decrypt(&ciphertext)?),
        None => Err(ProtocolError::InvalidMessage("claimed prize carries no prize info".into()).into()),
    }
}

#[cfg(test)]
mod tests {
    use tourney_crypto::{encrypt, generate_keypair};
    use tourney_protocol::PrizeBundle;

    use super::*;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::from_keys(generate_keypair(1024).unwrap())
    }

    fn summary(match_id: &str, bundles: Vec<PrizeBundle>) -> MatchSummary {
        MatchSummary {
            match_id: match_id.into(),
            tournament_id: None,
            title: None,
            prize_bundles: bundles,
        }
    }

    #[test]
    fn test_unclaimed_uses_first_bundle_first_prize() {
        let m = summary(
            "m-1",
            vec![
                PrizeBundle {
                    title: "Gold".into(),
                    prize_ids: vec!["p-1".into(), "p-2".into()],
                },
                PrizeBundle {
                    title: "Silver".into(),
                    prize_ids: vec!["p-3".into()],
                },
            ],
        );

        let prize = unclaimed(m, true).unwrap();

        assert_eq!(prize.prize_id, "p-1");
        assert_eq!(prize.title, "Gold");
        assert!(prize.player_tournament);
    }

    #[test]
    fn test_unclaimed_skips_match_without_bundles() {
        assert_eq!(unclaimed(summary("m-1", vec![]), false), None);
    }

    #[test]
    fn test_unclaimed_skips_empty_bundle() {
        let m = summary("m-1", vec![PrizeBundle::default()]);
        assert_eq!(unclaimed(m, false), None);
    }

    #[test]
    fn test_prize_info_prefers_plaintext() {
        let prize = ClaimedPrize {
            prize_info: Some("CODE-1".into()),
            encrypted_prize_info_v2: Some("not even base64".into()),
            ..ClaimedPrize::default()
        };
        assert_eq!(prize_info(&prize, &identity()).unwrap(), "CODE-1");
    }

    #[test]
    fn test_prize_info_prefers_v2_over_legacy() {
        let device = identity();
        let prize = ClaimedPrize {
            encrypted_prize_info_v2: Some(encrypt(&device.public_base64(), "v2").unwrap()),
            encrypted_prize_info: Some(encrypt(&device.public_base64(), "legacy").unwrap()),
            ..ClaimedPrize::default()
        };
        assert_eq!(prize_info(&prize, &device).unwrap(), "v2");
    }

    #[test]
    fn test_prize_info_falls_back_to_legacy() {
        let device = identity();
        let prize = ClaimedPrize {
            encrypted_prize_info_v2: Some(String::new()),
            encrypted_prize_info: Some(encrypt(&device.public_base64(), "legacy").unwrap()),
            ..ClaimedPrize::default()
        };
        assert_eq!(prize_info(&prize, &device).unwrap(), "legacy");
    }

    #[test]
    fn test_prize_info_missing_is_protocol_error() {
        let result = prize_info(&ClaimedPrize::default(), &identity());
        assert!(matches!(result, Err(ClientError::Protocol(_))));
    }

    #[test]
    fn test_prize_info_wrong_key_is_crypto_error() {
        let prize = ClaimedPrize {
            encrypted_prize_info_v2: Some(encrypt(&identity().public_base64(), "x").unwrap()),
            ..ClaimedPrize::default()
        };
        let result = prize_info(&prize, &identity());
        assert!(matches!(result, Err(ClientError::Crypto(_))));
    }

    #[test]
    fn test_claim_outcome_debug_redacts_info() {
        let outcome = ClaimOutcome::Fulfilled {
            prize_info_type: Some("CODE".into()),
            prize_info: "SECRET-CODE".into(),
        };
        assert!(!format!("{outcome:?}").contains("SECRET"));
    }
}
