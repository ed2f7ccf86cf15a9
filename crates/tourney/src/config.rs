//! Client configuration.

use std::fmt;
use std::time::Duration;

use tourney_protocol::DEFAULT_BASE_URL;
use tourney_session::{ServiceConfig, SessionConfig};

/// Environment variable overriding [`ClientConfig::base_url`].
pub const ENV_BASE_URL: &str = "TOURNEY_BASE_URL";
/// Environment variable for [`ClientConfig::api_key`].
pub const ENV_API_KEY: &str = "TOURNEY_API_KEY";
/// Environment variable for [`ClientConfig::game_public_key`].
pub const ENV_GAME_PUBLIC_KEY: &str = "TOURNEY_GAME_PUBLIC_KEY";
/// Environment variable for [`ClientConfig::player_name`].
pub const ENV_PLAYER_NAME: &str = "TOURNEY_PLAYER_NAME";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything a [`TournamentClient`](crate::TournamentClient) needs to
/// reach the service.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL including the version prefix.
    pub base_url: String,
    /// Sent as `X-Api-Key` on every request.
    pub api_key: String,
    /// The game's RSA public key, base64 SPKI DER.
    pub game_public_key: String,
    /// Display name to use if the store doesn't have one yet.
    pub player_name: Option<String>,
    /// Per-request timeout for the HTTP transport.
    pub request_timeout: Duration,
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            game_public_key: String::new(),
            player_name: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session: SessionConfig::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("player_name", &self.player_name)
            .field("request_timeout", &self.request_timeout)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Defaults overlaid with whichever `TOURNEY_*` variables are set.
    /// Empty variables are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(url) = var(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(key) = var(ENV_API_KEY) {
            config.api_key = key;
        }
        if let Some(key) = var(ENV_GAME_PUBLIC_KEY) {
            config.game_public_key = key;
        }
        config.player_name = var(ENV_PLAYER_NAME);
        config
    }

    /// The subset the session layer needs.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            game_public_key: self.game_public_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.api_key.is_empty());
        assert_eq!(config.player_name, None);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.session.default_player_name, "coward player");
    }

    #[test]
    fn test_from_lookup_overrides_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://localhost:9000/v1"),
            (ENV_API_KEY, "key-1"),
            (ENV_GAME_PUBLIC_KEY, "MIIB"),
            (ENV_PLAYER_NAME, "ada"),
        ]));

        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.api_key, "key-1");
        assert_eq!(config.game_public_key, "MIIB");
        assert_eq!(config.player_name.as_deref(), Some("ada"));
    }

    #[test]
    fn test_from_lookup_ignores_blank_values() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_BASE_URL, "  "), (ENV_PLAYER_NAME, "")]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.player_name, None);
    }

    #[test]
    fn test_service_config_copies_fields() {
        let config = ClientConfig {
            api_key: "k".into(),
            game_public_key: "g".into(),
            ..ClientConfig::default()
        };
        let service = config.service_config();
        assert_eq!(service.api_key, "k");
        assert_eq!(service.game_public_key, "g");
        assert_eq!(service.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig {
            api_key: "super-secret".into(),
            ..ClientConfig::default()
        };
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
