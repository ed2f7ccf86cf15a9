//! Error types for the storage layer.

/// Errors from reading or writing persisted values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing file couldn't be read or written.
    #[error("store I/O failed: {0}")]
    Io(String),

    /// The backing file exists but isn't a JSON object of strings.
    #[error("store is corrupt: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
