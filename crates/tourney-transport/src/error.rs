/// Errors that can occur in the transport layer.
///
/// These are "the request never got a proper answer" failures. A response
/// that arrived with a non-success status is NOT a transport error; that
/// is the protocol layer's business.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The host couldn't be reached (DNS, refused, TLS handshake).
    #[error("connect failed: {0}")]
    Connect(String),

    /// No response within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The request couldn't be built or sent.
    #[error("request failed: {0}")]
    Request(String),

    /// The response body couldn't be read.
    #[error("reading response body failed: {0}")]
    Body(String),
}
