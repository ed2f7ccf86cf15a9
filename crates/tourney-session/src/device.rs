//! The two network exchanges that establish a session.
//!
//! ```text
//! register:     device pub key ──enc(game key)──→ service
//!               service ──enc(device key)──→ player token
//!               player token ──enc(game key)──→ device app token (persisted)
//!
//! authenticate: device app token + build/OS/name ──→ service
//!               service ──→ session id + expiration
//! ```

use std::sync::Arc;

use tourney_protocol::{
    API_KEY_HEADER, AuthPlayerRequest, AuthPlayerResponse, CONTENT_TYPE_HEADER, Codec, Endpoint,
    JSON_CONTENT_TYPE, JsonCodec, RegisterRequest, RegisterResponse, SESSION_ID_HEADER,
};
use tourney_transport::{HttpRequest, HttpTransport};

use crate::{DeviceIdentity, ServiceConfig, SessionConfig, SessionError, SessionTicket};

/// Performs registration and authentication against the service.
pub(crate) struct DeviceService<T> {
    transport: Arc<T>,
    service: ServiceConfig,
    app_build_type: String,
    device_os_type: String,
}

impl<T: HttpTransport> DeviceService<T> {
    pub(crate) fn new(transport: Arc<T>, service: ServiceConfig, config: &SessionConfig) -> Self {
        Self {
            transport,
            service,
            app_build_type: config.app_build_type.clone(),
            device_os_type: config.device_os_type.clone(),
        }
    }

    /// Registers the device and returns the device app token to persist.
    ///
    /// Nothing is persisted here; the caller stores the token only once
    /// this whole exchange has succeeded.
    pub(crate) async fn register(
        &self,
        identity: &DeviceIdentity,
        session_id: Option<&str>,
    ) -> Result<String, SessionError> {
        let encrypted_payload = identity.encrypted_public_key(&self.service.game_public_key)?;
        let body = RegisterRequest { encrypted_payload };

        let response: RegisterResponse = self
            .post(Endpoint::Register, &body, session_id)
            .await
            .map_err(SessionError::RegistrationFailed)?;

        let player_token = identity.decrypt(&response.encrypted_player_token)?;
        let device_app_token = tourney_crypto::encrypt(&self.service.game_public_key, &player_token)?;
        Ok(device_app_token)
    }

    /// Exchanges the device app token for a session.
    pub(crate) async fn authenticate(
        &self,
        device_app_token: &str,
        player_name: &str,
        session_id: Option<&str>,
    ) -> Result<SessionTicket, SessionError> {
        let body = AuthPlayerRequest {
            app_build_type: self.app_build_type.clone(),
            device_os_type: self.device_os_type.clone(),
            encrypted_payload: device_app_token.to_string(),
            player_name: player_name.to_string(),
        };

        let response: AuthPlayerResponse = self
            .post(Endpoint::Authenticate, &body, session_id)
            .await
            .map_err(SessionError::AuthFailed)?;

        if response.session_id.is_empty() {
            return Err(SessionError::AuthFailed("service returned an empty session id".into()));
        }
        Ok(SessionTicket {
            session_id: response.session_id,
            expires_at: response.session_expiration_date,
        })
    }

    /// POSTs `body` and decodes the reply. Failures come back as a
    /// description for the caller to wrap in the right variant.
    async fn post<B, R>(
        &self,
        endpoint: Endpoint<'_>,
        body: &B,
        session_id: Option<&str>,
    ) -> Result<R, String>
    where
        B: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let bytes = JsonCodec.encode(body).map_err(|e| e.to_string())?;
        let mut request = HttpRequest::new(endpoint.method(), endpoint.url(&self.service.base_url))
            .header(API_KEY_HEADER, self.service.api_key.as_str())
            .header(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE)
            .body(bytes);
        if let Some(id) = session_id {
            request.set_header(SESSION_ID_HEADER, id);
        }

        tracing::debug!(id = %request.id, %endpoint, "session request");
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_success() {
            return Err(format!(
                "{endpoint} returned status {}: {}",
                response.status,
                String::from_utf8_lossy(&response.body)
            ));
        }
        JsonCodec.decode(&response.body).map_err(|e| e.to_string())
    }
}
