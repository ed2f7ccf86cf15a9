//! The schema of every key the client persists.

use std::borrow::Cow;
use std::fmt;

/// A persisted key.
///
/// | Variant | Stored name | Value |
/// |---|---|---|
/// | `PublicKey` | `encryptedPublicKey` | device public key, base64 SPKI DER |
/// | `PrivateKey` | `encryptedPrivateKey` | device private key, base64 PKCS#8 DER |
/// | `DeviceAppToken` | `deviceAppTokenKey` | player token re-encrypted under the game key |
/// | `SessionId` | `sessionId` | last session id |
/// | `SessionExpiration` | `sessionExpirationDate` | epoch millis, decimal |
/// | `PlayerName` | `playerName` | display name |
/// | `LinkingCode` | `twitchCode` | sanitized streaming-platform linking code |
/// | `ResumeMatch(t)` | `resumeMatch:{t}` | match id last entered in tournament `t` |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    PublicKey,
    PrivateKey,
    DeviceAppToken,
    SessionId,
    SessionExpiration,
    PlayerName,
    LinkingCode,
    /// Resume pointer for one tournament, keyed by tournament id.
    ResumeMatch(String),
}

impl StoreKey {
    /// The string under which this key is stored.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::PublicKey => Cow::Borrowed("encryptedPublicKey"),
            Self::PrivateKey => Cow::Borrowed("encryptedPrivateKey"),
            Self::DeviceAppToken => Cow::Borrowed("deviceAppTokenKey"),
            Self::SessionId => Cow::Borrowed("sessionId"),
            Self::SessionExpiration => Cow::Borrowed("sessionExpirationDate"),
            Self::PlayerName => Cow::Borrowed("playerName"),
            Self::LinkingCode => Cow::Borrowed("twitchCode"),
            Self::ResumeMatch(tournament_id) => {
                Cow::Owned(format!("resumeMatch:{tournament_id}"))
            }
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_key_names() {
        assert_eq!(StoreKey::PublicKey.name(), "encryptedPublicKey");
        assert_eq!(StoreKey::PrivateKey.name(), "encryptedPrivateKey");
        assert_eq!(StoreKey::DeviceAppToken.name(), "deviceAppTokenKey");
        assert_eq!(StoreKey::SessionId.name(), "sessionId");
        assert_eq!(StoreKey::SessionExpiration.name(), "sessionExpirationDate");
        assert_eq!(StoreKey::PlayerName.name(), "playerName");
        assert_eq!(StoreKey::LinkingCode.name(), "twitchCode");
    }

    #[test]
    fn test_resume_key_is_namespaced_by_tournament() {
        let a = StoreKey::ResumeMatch("t-1".into());
        let b = StoreKey::ResumeMatch("t-2".into());
        assert_eq!(a.to_string(), "resumeMatch:t-1");
        assert_ne!(a.name(), b.name());
    }

    #[test]
    fn test_resume_key_cannot_shadow_fixed_keys() {
        // A tournament that happens to be called "sessionId" must not
        // overwrite the session.
        let resume = StoreKey::ResumeMatch("sessionId".into());
        assert_ne!(resume.name(), StoreKey::SessionId.name());
    }
}
