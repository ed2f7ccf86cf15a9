//! The session manager: a single actor that owns the device token and
//! the current session.
//!
//! Every read and write of session state happens inside one Tokio task.
//! Callers hold a cheap [`SessionManager`] handle and talk to the actor
//! over a channel, the same way a room handle talks to its room.
//!
//! # Single flight
//!
//! At most one registration/authentication job runs at a time. Callers
//! that need a session while a job is in flight are parked as waiters and
//! all receive the job's result, so N concurrent callers with an expired
//! session cause exactly one `POST /players/auth`.
//!
//! ```text
//! caller A ─┐
//! caller B ─┼─→ [actor] ──one job──→ register? → authenticate
//! caller C ─┘        ↑                                │
//!                    └──── same ticket to A, B, C ←───┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tourney_crypto::CryptoError;
use tourney_store::{KeyValueStore, MemoryStore, StoreKey};
use tourney_transport::HttpTransport;

use crate::device::DeviceService;
use crate::{
    Clock, DeviceIdentity, ServiceConfig, SessionConfig, SessionError, SessionState,
    SessionTicket, SystemClock, resolve_player_name,
};

/// Bounded so a flood of callers applies backpressure instead of
/// growing memory.
const COMMAND_CHANNEL_SIZE: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Commands sent to the session actor.
pub(crate) enum SessionCommand {
    EnsureRegistered { reply: Reply<()> },
    /// Authenticate even if the current session is still valid.
    Authenticate { reply: Reply<SessionTicket> },
    /// Return the current session, authenticating first if needed.
    EnsureValid { reply: Reply<SessionTicket> },
    IsExpired { reply: oneshot::Sender<bool> },
    CurrentSessionId { reply: oneshot::Sender<Option<String>> },
    State { reply: oneshot::Sender<SessionState> },
    Shutdown,
}

// ---------------------------------------------------------------------------
// SessionManager (handle)
// ---------------------------------------------------------------------------

/// Handle to the running session actor.
///
/// Cheap to clone. The actor stops when [`shutdown`](Self::shutdown) is
/// called or the last handle is dropped; calls after that return
/// [`SessionError::Unavailable`].
#[derive(Clone)]
pub struct SessionManager {
    sender: mpsc::Sender<SessionCommand>,
    identity: Arc<DeviceIdentity>,
    player_name: Arc<str>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("player_name", &self.player_name)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Starts configuring a session manager that talks to `service`
    /// through `transport`.
    pub fn builder<T: HttpTransport>(
        transport: Arc<T>,
        service: ServiceConfig,
    ) -> SessionManagerBuilder<T> {
        SessionManagerBuilder {
            transport,
            service,
            config: SessionConfig::default(),
            store: None,
            clock: None,
            player_name: None,
        }
    }

    /// The device keypair. Fixed for the manager's lifetime.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// The display name sent on authentication.
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Returns `false` once the actor has stopped.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Registers the device unless a device token is already stored.
    ///
    /// On failure nothing is persisted and the state stays
    /// [`SessionState::Unset`].
    pub async fn ensure_device_registered(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::EnsureRegistered { reply })
            .await?
    }

    /// Obtains a fresh session, registering first if needed.
    ///
    /// Joins an authentication already in flight rather than starting
    /// another.
    pub async fn authenticate(&self) -> Result<SessionTicket, SessionError> {
        self.request(|reply| SessionCommand::Authenticate { reply })
            .await?
    }

    /// Returns a session that is valid right now, authenticating only if
    /// the current one is missing or expired.
    pub async fn ensure_valid(&self) -> Result<SessionTicket, SessionError> {
        self.request(|reply| SessionCommand::EnsureValid { reply })
            .await?
    }

    /// Whether the stored session is expired at the current time. A
    /// manager that never authenticated is expired.
    pub async fn is_expired(&self) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::IsExpired { reply })
            .await
    }

    /// The current session id. `None` before the first authentication
    /// and while one is in flight.
    pub async fn current_session_id(&self) -> Result<Option<String>, SessionError> {
        self.request(|reply| SessionCommand::CurrentSessionId { reply })
            .await
    }

    pub async fn state(&self) -> Result<SessionState, SessionError> {
        self.request(|reply| SessionCommand::State { reply }).await
    }

    /// Stops the actor. Waiters still parked receive
    /// [`SessionError::Unavailable`].
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Unavailable)
    }

    async fn request<R>(
        &self,
        command: impl FnOnce(oneshot::Sender<R>) -> SessionCommand,
    ) -> Result<R, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::Unavailable)?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// SessionManagerBuilder
// ---------------------------------------------------------------------------

/// Builder for [`SessionManager`].
///
/// ```rust,ignore
/// let sessions = SessionManager::builder(transport, service_config)
///     .store(Arc::new(JsonFileStore::open("tourney.json")?))
///     .player_name("ada")
///     .start()
///     .await?;
/// ```
pub struct SessionManagerBuilder<T> {
    transport: Arc<T>,
    service: ServiceConfig,
    config: SessionConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
    player_name: Option<String>,
}

impl<T: HttpTransport> SessionManagerBuilder<T> {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Where keys, the device token, and the session persist. Defaults to
    /// an in-memory store.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Name to use (and persist) if the store doesn't have one yet.
    pub fn player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = Some(name.into());
        self
    }

    /// Loads (or generates) the device identity, restores any persisted
    /// session, and spawns the actor.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start(self) -> Result<SessionManager, SessionError> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let bits = self.config.key_bits;
        let identity = {
            let store = Arc::clone(&store);
            tokio::task::spawn_blocking(move || {
                DeviceIdentity::load_or_generate(store.as_ref(), bits)
            })
            .await
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))??
        };

        let player_name: Arc<str> = resolve_player_name(
            store.as_ref(),
            self.player_name.as_deref(),
            &self.config.default_player_name,
        )?
        .into();
        let device_token = store.get_non_empty(&StoreKey::DeviceAppToken)?;
        let ticket = load_ticket(store.as_ref())?;

        tracing::info!(
            registered = device_token.is_some(),
            has_session = ticket.is_some(),
            "session manager starting"
        );

        let identity = Arc::new(identity);
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let actor = SessionActor {
            service: Arc::new(DeviceService::new(self.transport, self.service, &self.config)),
            identity: Arc::clone(&identity),
            store,
            clock,
            player_name: Arc::clone(&player_name),
            auth_timeout: self.config.auth_timeout,
            device_token,
            ticket,
            job: None,
            registration_waiters: Vec::new(),
            auth_waiters: Vec::new(),
            receiver: rx,
        };
        tokio::spawn(actor.run());

        Ok(SessionManager {
            sender: tx,
            identity,
            player_name,
        })
    }
}

/// Reads the persisted session. A missing or unparsable expiration counts
/// as `0`, i.e. long expired.
fn load_ticket(store: &dyn KeyValueStore) -> Result<Option<SessionTicket>, SessionError> {
    let Some(session_id) = store.get_non_empty(&StoreKey::SessionId)? else {
        return Ok(None);
    };
    let expires_at = store
        .get(&StoreKey::SessionExpiration)?
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0);
    Ok(Some(SessionTicket {
        session_id,
        expires_at,
    }))
}

// ---------------------------------------------------------------------------
// SessionActor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct JobPlan {
    register: bool,
    authenticate: bool,
}

#[derive(Default)]
struct JobOutcome {
    /// The new device app token, if registration was attempted.
    registration: Option<Result<String, SessionError>>,
    authentication: Option<Result<SessionTicket, SessionError>>,
}

impl JobOutcome {
    fn timed_out(plan: JobPlan, limit: Duration) -> Self {
        let err = SessionError::TimedOut(limit);
        Self {
            registration: plan.register.then(|| Err(err.clone())),
            authentication: plan.authenticate.then(|| Err(err)),
        }
    }
}

struct Job {
    plan: JobPlan,
    future: BoxFuture<'static, JobOutcome>,
}

enum Event {
    Command(Option<SessionCommand>),
    JobDone(JobOutcome),
}

struct SessionActor<T> {
    service: Arc<DeviceService<T>>,
    identity: Arc<DeviceIdentity>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    player_name: Arc<str>,
    auth_timeout: Duration,
    device_token: Option<String>,
    ticket: Option<SessionTicket>,
    job: Option<Job>,
    registration_waiters: Vec<Reply<()>>,
    auth_waiters: Vec<Reply<SessionTicket>>,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl<T: HttpTransport> SessionActor<T> {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::debug!(state = %self.state(), "session actor started");

        loop {
            let event = tokio::select! {
                cmd = self.receiver.recv() => Event::Command(cmd),
                outcome = next_outcome(&mut self.job) => Event::JobDone(outcome),
            };

            match event {
                Event::Command(None) => break,
                Event::Command(Some(cmd)) => match cmd {
                    SessionCommand::EnsureRegistered { reply } => {
                        if self.device_token.is_some() {
                            let _ = reply.send(Ok(()));
                        } else {
                            self.registration_waiters.push(reply);
                        }
                    }
                    SessionCommand::Authenticate { reply } => {
                        self.auth_waiters.push(reply);
                    }
                    SessionCommand::EnsureValid { reply } => {
                        match self.valid_ticket() {
                            Some(ticket) if !self.authenticating() => {
                                let _ = reply.send(Ok(ticket));
                            }
                            _ => self.auth_waiters.push(reply),
                        }
                    }
                    SessionCommand::IsExpired { reply } => {
                        let _ = reply.send(self.is_expired());
                    }
                    SessionCommand::CurrentSessionId { reply } => {
                        let id = if self.authenticating() {
                            None
                        } else {
                            self.ticket.as_ref().map(|t| t.session_id.clone())
                        };
                        let _ = reply.send(id);
                    }
                    SessionCommand::State { reply } => {
                        let _ = reply.send(self.state());
                    }
                    SessionCommand::Shutdown => {
                        tracing::info!("session manager shutting down");
                        break;
                    }
                },
                Event::JobDone(outcome) => {
                    if let Some(job) = self.job.take() {
                        self.finish_job(job.plan, outcome);
                    }
                }
            }

            self.maybe_start_job();
        }

        tracing::debug!("session actor stopped");
    }

    fn is_expired(&self) -> bool {
        let now = self.clock.now_millis();
        self.ticket.as_ref().is_none_or(|t| t.is_expired_at(now))
    }

    fn valid_ticket(&self) -> Option<SessionTicket> {
        let now = self.clock.now_millis();
        self.ticket
            .as_ref()
            .filter(|t| !t.is_expired_at(now))
            .cloned()
    }

    fn authenticating(&self) -> bool {
        self.job.as_ref().is_some_and(|j| j.plan.authenticate)
    }

    fn state(&self) -> SessionState {
        match &self.job {
            Some(job) if job.plan.register => SessionState::Registering,
            Some(_) => SessionState::Authenticating,
            None if self.device_token.is_none() => SessionState::Unset,
            None => match self.valid_ticket() {
                Some(ticket) => SessionState::Valid(ticket),
                None => SessionState::Expired {
                    last: self.ticket.clone(),
                },
            },
        }
    }

    /// Starts a job if someone is waiting and nothing is in flight.
    fn maybe_start_job(&mut self) {
        if self.job.is_some() {
            return;
        }
        let authenticate = !self.auth_waiters.is_empty();
        let register = self.device_token.is_none()
            && (authenticate || !self.registration_waiters.is_empty());
        if !register && !authenticate {
            return;
        }

        let plan = JobPlan {
            register,
            authenticate,
        };
        let service = Arc::clone(&self.service);
        let identity = Arc::clone(&self.identity);
        let player_name = Arc::clone(&self.player_name);
        let known_token = self.device_token.clone();
        let session_id = self.ticket.as_ref().map(|t| t.session_id.clone());
        let limit = self.auth_timeout;

        let work = async move {
            let mut outcome = JobOutcome::default();
            let token = match known_token {
                Some(token) => token,
                None => {
                    let result = service.register(&identity, session_id.as_deref()).await;
                    let token = result.as_ref().ok().cloned();
                    outcome.registration = Some(result);
                    match token {
                        Some(token) => token,
                        None => return outcome,
                    }
                }
            };
            if plan.authenticate {
                let result = service
                    .authenticate(&token, &player_name, session_id.as_deref())
                    .await;
                outcome.authentication = Some(result);
            }
            outcome
        };

        tracing::debug!(register, authenticate, "starting session job");
        self.job = Some(Job {
            plan,
            future: Box::pin(async move {
                match tokio::time::timeout(limit, work).await {
                    Ok(outcome) => outcome,
                    Err(_) => JobOutcome::timed_out(plan, limit),
                }
            }),
        });
    }

    /// Applies a finished job and answers every waiter it covers.
    fn finish_job(&mut self, plan: JobPlan, outcome: JobOutcome) {
        if let Some(result) = outcome.registration {
            let persisted = result.and_then(|token| {
                self.store.set(&StoreKey::DeviceAppToken, &token)?;
                Ok(token)
            });
            match persisted {
                Ok(token) => {
                    self.device_token = Some(token);
                    tracing::info!(
                        waiters = self.registration_waiters.len(),
                        "device registered"
                    );
                    for waiter in self.registration_waiters.drain(..) {
                        let _ = waiter.send(Ok(()));
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "device registration failed");
                    for waiter in self.registration_waiters.drain(..) {
                        let _ = waiter.send(Err(e.clone()));
                    }
                    // Authentication can't proceed without a device token.
                    for waiter in self.auth_waiters.drain(..) {
                        let _ = waiter.send(Err(e.clone()));
                    }
                    return;
                }
            }
        }

        let Some(result) = outcome.authentication else {
            return;
        };
        debug_assert!(plan.authenticate);
        match result {
            Ok(ticket) => {
                self.persist_ticket(&ticket);
                self.ticket = Some(ticket.clone());
                tracing::info!(
                    expires_at = ticket.expires_at,
                    waiters = self.auth_waiters.len(),
                    "authenticated"
                );
                for waiter in self.auth_waiters.drain(..) {
                    let _ = waiter.send(Ok(ticket.clone()));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, waiters = self.auth_waiters.len(), "authentication failed");
                for waiter in self.auth_waiters.drain(..) {
                    let _ = waiter.send(Err(e.clone()));
                }
            }
        }
    }

    /// A session that fails to persist is still used for this run.
    fn persist_ticket(&self, ticket: &SessionTicket) {
        let result = self
            .store
            .set(&StoreKey::SessionId, &ticket.session_id)
            .and_then(|()| {
                self.store
                    .set(&StoreKey::SessionExpiration, &ticket.expires_at.to_string())
            });
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist session");
        }
    }
}

/// Resolves when the in-flight job finishes; never resolves if there
/// isn't one.
async fn next_outcome(job: &mut Option<Job>) -> JobOutcome {
    match job {
        Some(job) => (&mut job.future).await,
        None => std::future::pending().await,
    }
}
