//! The tournament client and its builder.
//!
//! A [`TournamentClient`] owns the request pipeline, the session manager
//! and the store. Workflow operations live in the `tournaments`,
//! `matches` and `prizes` modules as further `impl` blocks.
//!
//! # Cancellation
//!
//! Every client carries a [`CancellationToken`]. [`TournamentClient::scope`]
//! hands out a view of the client bound to a child token; dropping that
//! [`FlowScope`] cancels whatever it started. Cancelled operations
//! resolve to [`ClientError::Cancelled`].

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tourney_session::{Clock, SessionConfig, SessionError, SessionManager};
use tourney_store::{KeyValueStore, MemoryStore};
use tourney_transport::HttpTransport;

use crate::pipeline::{PendingOperation, RequestPipeline};
use crate::{ClientConfig, ClientError};

// ---------------------------------------------------------------------------
// TournamentClient
// ---------------------------------------------------------------------------

struct Inner<T> {
    pipeline: RequestPipeline<T>,
    store: Arc<dyn KeyValueStore>,
}

/// Entry point for every tournament, match and prize flow.
///
/// Cheap to clone; clones share the session and the cancellation token.
pub struct TournamentClient<T> {
    inner: Arc<Inner<T>>,
    token: CancellationToken,
}

impl<T> Clone for TournamentClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            token: self.token.clone(),
        }
    }
}

impl<T: HttpTransport> std::fmt::Debug for TournamentClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TournamentClient")
            .field("session", self.inner.pipeline.session())
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl TournamentClient<()> {
    /// Starts configuring a client.
    pub fn builder() -> TournamentClientBuilder {
        TournamentClientBuilder::new()
    }
}

impl<T: HttpTransport> TournamentClient<T> {
    pub fn pipeline(&self) -> &RequestPipeline<T> {
        &self.inner.pipeline
    }

    pub fn session(&self) -> &SessionManager {
        self.inner.pipeline.session()
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.inner.store.as_ref()
    }

    /// The display name sent on authentication.
    pub fn player_name(&self) -> &str {
        self.session().player_name()
    }

    /// Registers the device now instead of on the first request.
    pub async fn ensure_device_registered(&self) -> Result<(), ClientError> {
        self.guarded(async { Ok(self.session().ensure_device_registered().await?) })
            .await
    }

    /// A view of this client whose flows are cancelled when the view is
    /// dropped.
    pub fn scope(&self) -> FlowScope<T> {
        let token = self.token.child_token();
        FlowScope {
            client: Self {
                inner: Arc::clone(&self.inner),
                token: token.clone(),
            },
            _guard: token.drop_guard(),
        }
    }

    /// Whether this client (or the scope it belongs to) was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs a callback-style operation, cancelled along with this client.
    pub fn dispatch(&self, operation: PendingOperation) -> JoinHandle<()> {
        self.inner
            .pipeline
            .dispatch(operation.cancel_on(self.token.clone()))
    }

    /// Cancels every flow started from this client or its scopes and
    /// stops the session actor.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.token.cancel();
        match self.session().shutdown().await {
            Ok(()) | Err(SessionError::Unavailable) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Races `work` against cancellation.
    pub(crate) async fn guarded<R>(
        &self,
        work: impl Future<Output = Result<R, ClientError>>,
    ) -> Result<R, ClientError> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(ClientError::Cancelled),
            result = work => result,
        }
    }
}

// ---------------------------------------------------------------------------
// FlowScope
// ---------------------------------------------------------------------------

/// A [`TournamentClient`] tied to one owner's lifetime (a screen, a
/// request handler).
///
/// Dereferences to the client, so every workflow operation is available.
/// Dropping the scope cancels its flows; the parent client is unaffected.
pub struct FlowScope<T> {
    client: TournamentClient<T>,
    _guard: DropGuard,
}

impl<T> FlowScope<T> {
    /// Cancels the scope's flows without dropping it.
    pub fn cancel(&self) {
        self.client.token.cancel();
    }

    /// A client handle that outlives the scope but is cancelled with it.
    pub fn client(&self) -> TournamentClient<T> {
        self.client.clone()
    }
}

impl<T> Deref for FlowScope<T> {
    type Target = TournamentClient<T>;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl<T> std::fmt::Debug for FlowScope<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowScope")
            .field("cancelled", &self.client.token.is_cancelled())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TournamentClientBuilder
// ---------------------------------------------------------------------------

/// Builder for [`TournamentClient`].
///
/// ```rust,no_run
/// # async fn run() -> Result<(), tourney::ClientError> {
/// let client = tourney::TournamentClient::builder()
///     .api_key("my-api-key")
///     .game_public_key("MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA...")
///     .player_name("ada")
///     .build()
///     .await?;
///
/// let listing = client.list_tournaments().await?;
/// println!("{} open tournaments", listing.developer.len());
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct TournamentClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for TournamentClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TournamentClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            store: None,
            clock: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// The game's RSA public key, base64 SPKI DER. Must be at least 2048
    /// bits for device registration to fit.
    pub fn game_public_key(mut self, key: impl Into<String>) -> Self {
        self.config.game_public_key = key.into();
        self
    }

    pub fn player_name(mut self, name: impl Into<String>) -> Self {
        self.config.player_name = Some(name.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn session_config(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    /// Where keys, the session and resume pointers persist. Defaults to
    /// an in-memory store.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds a client that talks HTTPS through `reqwest`.
    #[cfg(feature = "reqwest")]
    pub async fn build(
        self,
    ) -> Result<TournamentClient<tourney_transport::ReqwestTransport>, ClientError> {
        let transport = tourney_transport::ReqwestTransport::new(self.config.request_timeout)?;
        self.build_with_transport(Arc::new(transport)).await
    }

    /// Builds a client on an existing transport.
    ///
    /// Loads or generates the device keys and restores any persisted
    /// session; nothing is sent until the first request.
    ///
    /// # Errors
    /// - [`ClientError::InvalidInput`] without an API key
    /// - [`ClientError::Crypto`] if the game public key doesn't parse
    /// - [`ClientError::Session`] / [`ClientError::Store`] if the stored
    ///   identity can't be loaded
    pub async fn build_with_transport<T: HttpTransport>(
        self,
        transport: Arc<T>,
    ) -> Result<TournamentClient<T>, ClientError> {
        let config = self.config;
        if config.api_key.trim().is_empty() {
            return Err(ClientError::InvalidInput("an API key is required".into()));
        }
        let max = tourney_crypto::max_plaintext_len(&config.game_public_key)?;
        tracing::debug!(max_payload = max, "game public key accepted");

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));

        let mut sessions = SessionManager::builder(Arc::clone(&transport), config.service_config())
            .config(config.session.clone())
            .store(Arc::clone(&store));
        if let Some(clock) = self.clock {
            sessions = sessions.clock(clock);
        }
        if let Some(name) = config.player_name.clone() {
            sessions = sessions.player_name(name);
        }
        let session = sessions.start().await?;

        tracing::info!(
            base_url = %config.base_url,
            player = session.player_name(),
            "tournament client ready"
        );

        let pipeline = RequestPipeline::new(
            transport,
            session,
            config.base_url.as_str(),
            config.api_key.as_str(),
        );

        Ok(TournamentClient {
            inner: Arc::new(Inner { pipeline, store }),
            token: CancellationToken::new(),
        })
    }
}
