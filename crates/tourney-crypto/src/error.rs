//! Error types for the crypto layer.

/// Errors from key handling and payload encryption.
///
/// All variants carry plain strings so the error is `Clone`: a failed
/// reauthentication is reported to every task waiting on it, and the
/// session layer needs to hand each of them its own copy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// The requested modulus size is not one we generate.
    #[error("unsupported key size: {0} bits")]
    UnsupportedKeySize(usize),

    /// The RSA primitive failed while generating a key.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// A key could not be parsed (bad base64, bad DER, wrong key type).
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// The plaintext does not fit in one PKCS#1 v1.5 block for this key.
    #[error("payload of {len} bytes exceeds the {max}-byte limit for this key")]
    PayloadTooLarge { len: usize, max: usize },

    /// Encryption failed inside the RSA primitive.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed: wrong key, corrupted ciphertext, or bad padding.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Ciphertext or plaintext was not valid base64 / UTF-8.
    #[error("encoding error: {0}")]
    Encoding(String),
}
