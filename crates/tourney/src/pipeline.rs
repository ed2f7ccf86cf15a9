//! The request pipeline: every authenticated call goes through here.
//!
//! ```text
//! issue(verb, path, body)
//!   ├─ attach X-Api-Key + Content-Type
//!   ├─ session.ensure_valid()   ← parks here while (re)authentication runs
//!   ├─ attach Session-Id
//!   ├─ transport.send()
//!   └─ 2xx → body text │ anything else → ClientError
//! ```
//!
//! The pipeline never interprets a successful body; the workflow decodes
//! it. There is no retry beyond the reauthentication wait.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tourney_protocol::{
    API_KEY_HEADER, CONTENT_TYPE_HEADER, Codec, Endpoint, JSON_CONTENT_TYPE, JsonCodec,
    ProtocolError, SESSION_ID_HEADER, join_url,
};
use tourney_session::SessionManager;
use tourney_transport::{HttpRequest, HttpTransport, Method};

use crate::ClientError;

type SuccessFn = Box<dyn FnOnce(String) + Send + 'static>;
type FailureFn = Box<dyn FnOnce(ClientError) + Send + 'static>;

// ---------------------------------------------------------------------------
// RequestPipeline
// ---------------------------------------------------------------------------

/// Issues authenticated requests against the tournament service.
pub struct RequestPipeline<T> {
    transport: Arc<T>,
    session: SessionManager,
    base_url: Arc<str>,
    api_key: Arc<str>,
    codec: JsonCodec,
}

impl<T> Clone for RequestPipeline<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            session: self.session.clone(),
            base_url: Arc::clone(&self.base_url),
            api_key: Arc::clone(&self.api_key),
            codec: self.codec,
        }
    }
}

impl<T: HttpTransport> RequestPipeline<T> {
    pub fn new(
        transport: Arc<T>,
        session: SessionManager,
        base_url: impl Into<Arc<str>>,
        api_key: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            transport,
            session,
            base_url: base_url.into(),
            api_key: api_key.into(),
            codec: JsonCodec,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Sends one request and returns the response body as text.
    ///
    /// # Errors
    /// - [`ClientError::Session`] if no valid session could be obtained
    /// - [`ClientError::Network`] if the request got no answer
    /// - [`ClientError::Protocol`] for a non-2xx status or a body that
    ///   isn't UTF-8
    pub async fn issue(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<String, ClientError> {
        let mut request = HttpRequest::new(method, join_url(&self.base_url, path))
            .header(API_KEY_HEADER, self.api_key.as_ref())
            .header(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE);
        if let Some(body) = body {
            request = request.body(body);
        }

        let ticket = self.session.ensure_valid().await?;
        request.set_header(SESSION_ID_HEADER, ticket.session_id);

        let id = request.id;
        tracing::debug!(request_id = %id, %method, path, "issuing request");

        let response = self.transport.send(request).await.inspect_err(|e| {
            tracing::warn!(request_id = %id, %method, path, error = %e, "request failed");
        })?;

        if !response.is_success() {
            tracing::warn!(request_id = %id, %method, path, status = response.status, "request rejected");
            return Err(ProtocolError::Status {
                code: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }
            .into());
        }

        String::from_utf8(response.body).map_err(|e| {
            ProtocolError::InvalidMessage(format!("response body is not UTF-8: {e}")).into()
        })
    }

    /// `GET`s an endpoint and decodes the answer.
    pub async fn fetch<R: DeserializeOwned>(&self, endpoint: Endpoint<'_>) -> Result<R, ClientError> {
        let body = self.issue(endpoint.method(), &endpoint.path(), None).await?;
        Ok(self.codec.decode(body.as_bytes())?)
    }

    /// Sends `payload` to an endpoint and decodes the answer.
    pub async fn submit<B, R>(&self, endpoint: Endpoint<'_>, payload: &B) -> Result<R, ClientError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let body = self.submit_raw(endpoint, payload).await?;
        Ok(self.codec.decode(body.as_bytes())?)
    }

    /// Sends `payload` to an endpoint whose answer carries nothing the
    /// caller needs.
    pub async fn submit_raw<B: Serialize>(
        &self,
        endpoint: Endpoint<'_>,
        payload: &B,
    ) -> Result<String, ClientError> {
        let bytes = self.codec.encode(payload)?;
        self.issue(endpoint.method(), &endpoint.path(), Some(bytes)).await
    }

    /// Runs `operation` on the runtime and calls exactly one of its
    /// callbacks when it finishes.
    ///
    /// A cancelled operation (see [`PendingOperation::cancel_on`]) reports
    /// [`ClientError::Cancelled`] through `on_failure`.
    pub fn dispatch(&self, operation: PendingOperation) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            let PendingOperation {
                method,
                path,
                body,
                on_success,
                on_failure,
                cancel,
            } = operation;

            let work = pipeline.issue(method, &path, body);
            let result = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    () = token.cancelled() => Err(ClientError::Cancelled),
                    result = work => result,
                },
                None => work.await,
            };

            match result {
                Ok(body) => on_success(body),
                Err(e) => on_failure(e),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// PendingOperation
// ---------------------------------------------------------------------------

/// A request plus its two continuations, for callers that prefer
/// callbacks to `.await`.
///
/// Both handlers are required by construction.
pub struct PendingOperation {
    method: Method,
    path: String,
    body: Option<Vec<u8>>,
    on_success: SuccessFn,
    on_failure: FailureFn,
    cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for PendingOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingOperation")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("has_body", &self.body.is_some())
            .finish_non_exhaustive()
    }
}

impl PendingOperation {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        on_success: impl FnOnce(String) + Send + 'static,
        on_failure: impl FnOnce(ClientError) + Send + 'static,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            on_success: Box::new(on_success),
            on_failure: Box::new(on_failure),
            cancel: None,
        }
    }

    /// Targets a typed endpoint.
    pub fn for_endpoint(
        endpoint: Endpoint<'_>,
        on_success: impl FnOnce(String) + Send + 'static,
        on_failure: impl FnOnce(ClientError) + Send + 'static,
    ) -> Self {
        Self::new(endpoint.method(), endpoint.path(), on_success, on_failure)
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Resolves to [`ClientError::Cancelled`] once `token` fires.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
