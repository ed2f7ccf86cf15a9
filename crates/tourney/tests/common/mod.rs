//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use tourney::TournamentClient;
use tourney::session::{FakeIdentityService, ManualClock};
use tourney::store::MemoryStore;
use tourney::transport::{HttpRequest, HttpResponse, Method, MockTransport};

pub const BASE_URL: &str = "https://svc.test/v1";
pub const API_KEY: &str = "api-key";
/// 2023-11-14T22:13:20Z
pub const T0: i64 = 1_700_000_000_000;

/// A mock service with real registration and authentication behind it.
pub struct Harness {
    pub mock: Arc<MockTransport>,
    pub fake: Arc<FakeIdentityService>,
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        let clock = ManualClock::new(T0);
        let mock = Arc::new(MockTransport::new());
        let fake = FakeIdentityService::new(clock.clone()).unwrap();
        fake.install(&mock);
        Self {
            mock,
            fake,
            store: Arc::new(MemoryStore::new()),
            clock,
        }
    }

    pub async fn client(&self) -> TournamentClient<MockTransport> {
        TournamentClient::builder()
            .base_url(BASE_URL)
            .api_key(API_KEY)
            .game_public_key(self.fake.game_public_key())
            .store(self.store.clone())
            .clock(Arc::new(self.clock.clone()))
            .build_with_transport(Arc::clone(&self.mock))
            .await
            .unwrap()
    }

    /// Answers `method path` with `value` as JSON.
    pub fn json(&self, method: Method, path: &str, value: Value) {
        self.mock.respond(method, path, value.to_string());
    }

    /// Answers `method path` with a bare status.
    pub fn status(&self, method: Method, path: &str, status: u16) {
        self.mock
            .route(method, path, move |_| Ok(HttpResponse::new(status, "rejected")));
    }
}

/// The JSON body a request carried.
pub fn body(request: &HttpRequest) -> Value {
    serde_json::from_str(request.body_str().unwrap()).unwrap()
}
