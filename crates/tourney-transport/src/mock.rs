//! A scripted, in-process [`HttpTransport`] for tests.
//!
//! Routes match on method plus the trailing path segments of the URL, so
//! `"/players/auth"` matches `https://any.host/v1/players/auth`. A `*`
//! segment matches any single segment. The most recently added matching
//! route wins, which lets a test override a default it installed earlier.
//! Unmatched requests get a `404`.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};

type Handler =
    Arc<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

struct Route {
    method: Method,
    segments: Vec<String>,
    handler: Handler,
}

impl Route {
    fn matches(&self, request: &HttpRequest) -> bool {
        if request.method != self.method {
            return false;
        }
        let path: Vec<&str> = request.path().split('/').filter(|s| !s.is_empty()).collect();
        if path.len() < self.segments.len() {
            return false;
        }
        let tail = &path[path.len() - self.segments.len()..];
        self.segments
            .iter()
            .zip(tail)
            .all(|(want, got)| want == "*" || want == got)
    }
}

/// Scripted transport with a request log.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    log: Mutex<Vec<HttpRequest>>,
    latency: Mutex<Option<Duration>>,
}

impl MockTransport {
    /// Creates a transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `method path` with whatever `handler` returns.
    pub fn route<F>(&self, method: Method, path: &str, handler: F)
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Route {
                method,
                segments,
                handler: Arc::new(handler),
            });
    }

    /// Answers `method path` with a fixed `200` JSON body.
    pub fn respond(&self, method: Method, path: &str, body: impl Into<String>) {
        let body = body.into();
        self.route(method, path, move |_| Ok(HttpResponse::ok(body.clone())));
    }

    /// Delays every response by `latency` (simulated with `tokio::time::sleep`).
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = Some(latency);
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Requests sent so far whose method and path tail match.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<HttpRequest> {
        let wanted = Route {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            handler: Arc::new(|_| Ok(HttpResponse::ok(""))),
        };
        self.requests()
            .into_iter()
            .filter(|r| wanted.matches(r))
            .collect()
    }

    /// How many requests matched `method path`.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }
}

impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let handler = {
            let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            routes
                .iter()
                .rev()
                .find(|r| r.matches(&request))
                .map(|r| Arc::clone(&r.handler))
        };

        match handler {
            Some(handler) => handler(&request),
            None => Ok(HttpResponse::new(404, "no route")),
        }
    }
}
