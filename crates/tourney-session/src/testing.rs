//! An in-process stand-in for the service's registration and
//! authentication endpoints.
//!
//! [`FakeIdentityService`] installs `POST /players/register` and
//! `POST /players/auth` on a [`MockTransport`] and answers them the way
//! the real service does, with real RSA: it decrypts the device key,
//! hands back an encrypted player token, and accepts only that token
//! (re-encrypted under the game key) at authentication.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tourney_crypto::{CryptoError, KeyPair, generate_keypair};
use tourney_protocol::{
    AuthPlayerRequest, AuthPlayerResponse, Codec, JsonCodec, RegisterRequest, RegisterResponse,
};
use tourney_transport::{HttpRequest, HttpResponse, Method, MockTransport};

use crate::Clock;

const DEFAULT_TTL_MILLIS: i64 = 60 * 60 * 1000;

/// The 2048-bit game keypair, generated once per test binary.
fn shared_game_keys() -> Result<KeyPair, CryptoError> {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    if let Some(keys) = KEYS.get() {
        return Ok(keys.clone());
    }
    let keys = generate_keypair(2048)?;
    Ok(KEYS.get_or_init(|| keys).clone())
}

/// Fake registration and authentication backend.
pub struct FakeIdentityService {
    game_keys: KeyPair,
    player_token: String,
    clock: Arc<dyn Clock>,
    session_ttl_millis: i64,
    register_calls: AtomicUsize,
    auth_calls: AtomicUsize,
    fail_auth: AtomicBool,
    last_player_name: Mutex<Option<String>>,
}

impl FakeIdentityService {
    /// Sessions last one hour of `clock` time.
    pub fn new(clock: impl Clock) -> Result<Arc<Self>, CryptoError> {
        Self::with_ttl(clock, DEFAULT_TTL_MILLIS)
    }

    pub fn with_ttl(clock: impl Clock, session_ttl_millis: i64) -> Result<Arc<Self>, CryptoError> {
        Ok(Arc::new(Self {
            game_keys: shared_game_keys()?,
            player_token: "player-token-0001".into(),
            clock: Arc::new(clock),
            session_ttl_millis,
            register_calls: AtomicUsize::new(0),
            auth_calls: AtomicUsize::new(0),
            fail_auth: AtomicBool::new(false),
            last_player_name: Mutex::new(None),
        }))
    }

    /// The game public key clients must be configured with.
    pub fn game_public_key(&self) -> String {
        self.game_keys.public_base64()
    }

    /// A device app token this service accepts, as if registration had
    /// already happened.
    pub fn device_app_token(&self) -> Result<String, CryptoError> {
        tourney_crypto::encrypt(&self.game_public_key(), &self.player_token)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    /// Makes every following authentication answer `500`.
    pub fn set_fail_auth(&self, fail: bool) {
        self.fail_auth.store(fail, Ordering::SeqCst);
    }

    /// The `playerName` of the most recent authentication.
    pub fn last_player_name(&self) -> Option<String> {
        self.last_player_name
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Routes both endpoints on `mock` to this service.
    pub fn install(self: &Arc<Self>, mock: &MockTransport) {
        let service = Arc::clone(self);
        mock.route(Method::Post, "/players/register", move |req| {
            Ok(service.handle_register(req))
        });
        let service = Arc::clone(self);
        mock.route(Method::Post, "/players/auth", move |req| {
            Ok(service.handle_auth(req))
        });
    }

    fn handle_register(&self, request: &HttpRequest) -> HttpResponse {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        let body: RegisterRequest = match decode_body(request) {
            Ok(body) => body,
            Err(response) => return response,
        };
        let device_public = match tourney_crypto::decrypt(
            &self.game_keys.private_base64(),
            &body.encrypted_payload,
        ) {
            Ok(key) => key,
            Err(e) => return HttpResponse::new(400, e.to_string()),
        };
        match tourney_crypto::encrypt(&device_public, &self.player_token) {
            Ok(encrypted_player_token) => json(&RegisterResponse {
                encrypted_player_token,
            }),
            Err(e) => HttpResponse::new(400, e.to_string()),
        }
    }

    fn handle_auth(&self, request: &HttpRequest) -> HttpResponse {
        let n = self.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_auth.load(Ordering::SeqCst) {
            return HttpResponse::new(500, "auth unavailable");
        }
        let body: AuthPlayerRequest = match decode_body(request) {
            Ok(body) => body,
            Err(response) => return response,
        };
        let token = tourney_crypto::decrypt(&self.game_keys.private_base64(), &body.encrypted_payload);
        if token.as_deref() != Ok(self.player_token.as_str()) {
            return HttpResponse::new(401, "unknown device");
        }
        *self
            .last_player_name
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(body.player_name);

        json(&AuthPlayerResponse {
            session_id: format!("session-{n}"),
            session_expiration_date: self.clock.now_millis() + self.session_ttl_millis,
        })
    }
}

fn decode_body<T: serde::de::DeserializeOwned>(request: &HttpRequest) -> Result<T, HttpResponse> {
    let bytes = request.body.as_deref().unwrap_or_default();
    JsonCodec
        .decode(bytes)
        .map_err(|e| HttpResponse::new(400, e.to_string()))
}

fn json<T: serde::Serialize>(value: &T) -> HttpResponse {
    match JsonCodec.encode(value) {
        Ok(body) => HttpResponse::ok(body),
        Err(e) => HttpResponse::new(500, e.to_string()),
    }
}
