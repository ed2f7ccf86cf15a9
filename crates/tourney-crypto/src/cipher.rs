//! RSA PKCS#1 v1.5 payload encryption.
//!
//! Both directions speak base64: [`encrypt`] returns base64 ciphertext and
//! [`decrypt`] expects it. Plaintext is always UTF-8 text because every
//! payload the tournament service exchanges (keys, player tokens, prize
//! info) is a string.

use base64::prelude::*;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

use crate::CryptoError;
use crate::keys::{parse_private, parse_public};

/// Bytes of each block consumed by PKCS#1 v1.5 padding.
pub const PKCS1_V15_OVERHEAD: usize = 11;

/// Largest plaintext, in bytes, that fits under `public_b64`.
pub fn max_plaintext_len(public_b64: &str) -> Result<usize, CryptoError> {
    let key = parse_public(public_b64)?;
    Ok(block_limit(&key))
}

fn block_limit(key: &RsaPublicKey) -> usize {
    key.size().saturating_sub(PKCS1_V15_OVERHEAD)
}

/// Encrypts `plaintext` for the holder of `recipient_public_b64`.
///
/// # Errors
/// - [`CryptoError::MalformedKey`] if the key doesn't parse
/// - [`CryptoError::PayloadTooLarge`] if the UTF-8 bytes exceed
///   [`max_plaintext_len`] for this key
pub fn encrypt(recipient_public_b64: &str, plaintext: &str) -> Result<String, CryptoError> {
    let key = parse_public(recipient_public_b64)?;
    let data = plaintext.as_bytes();

    let max = block_limit(&key);
    if data.len() > max {
        return Err(CryptoError::PayloadTooLarge {
            len: data.len(),
            max,
        });
    }

    let ciphertext = key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, data)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    Ok(BASE64_STANDARD.encode(ciphertext))
}

/// Decrypts base64 `ciphertext_b64` with the device's own private key.
///
/// # Errors
/// - [`CryptoError::MalformedKey`] if the key doesn't parse
/// - [`CryptoError::Encoding`] if the ciphertext isn't base64 or the
///   plaintext isn't UTF-8
/// - [`CryptoError::Decryption`] on padding or key mismatch
pub fn decrypt(own_private_b64: &str, ciphertext_b64: &str) -> Result<String, CryptoError> {
    let key = parse_private(own_private_b64)?;
    let ciphertext = BASE64_STANDARD
        .decode(ciphertext_b64.trim())
        .map_err(|e| CryptoError::Encoding(format!("ciphertext is not base64: {e}")))?;

    let plaintext = key
        .decrypt(Pkcs1v15Encrypt, &ciphertext)
        .map_err(|e| CryptoError::Decryption(e.to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::Encoding(format!("plaintext is not UTF-8: {e}")))
}
