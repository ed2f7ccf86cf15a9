//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// A response that arrived but can't be used ends up here: the status
/// wasn't 2xx, the body didn't decode, or a field the workflow needs was
/// absent.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of a request body failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A response body didn't match the expected shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The service answered with a non-success status.
    ///
    /// `body` is the response text, kept for diagnostics.
    #[error("service returned status {code}: {body}")]
    Status { code: u16, body: String },

    /// The body decoded but lacks something the caller needs
    /// (e.g. a claim response with no prize entries).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Returns the HTTP status for [`ProtocolError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}
