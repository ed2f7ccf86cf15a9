//! RSA keypair generation and encoding.
//!
//! Keys travel and persist as base64 strings of their DER encodings:
//! SubjectPublicKeyInfo for the public half, PKCS#8 for the private half.
//! That is the same shape the tournament service hands out for the game's
//! own public key, so one parser handles both.

use std::fmt;

use base64::prelude::*;
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::CryptoError;

/// Key size used when the caller doesn't ask for one.
pub const DEFAULT_KEY_BITS: usize = 1024;

/// Modulus sizes [`generate_keypair`] accepts.
pub const SUPPORTED_KEY_BITS: [usize; 4] = [1024, 2048, 3072, 4096];

// ---------------------------------------------------------------------------
// KeyPair
// ---------------------------------------------------------------------------

/// A device's RSA keypair, held as DER bytes.
///
/// `Debug` never prints the private half.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// SubjectPublicKeyInfo DER.
    public: Vec<u8>,
    /// PKCS#8 DER.
    private: Vec<u8>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_base64())
            .field("private", &"[REDACTED]")
            .finish()
    }
}

impl KeyPair {
    /// Rebuilds a keypair from its persisted base64 halves.
    ///
    /// Both halves are parsed so a corrupted store entry fails here rather
    /// than at the first decryption.
    pub fn from_base64(public: &str, private: &str) -> Result<Self, CryptoError> {
        let public = decode_b64(public)?;
        let private = decode_b64(private)?;
        RsaPublicKey::from_public_key_der(&public)
            .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
        RsaPrivateKey::from_pkcs8_der(&private)
            .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
        Ok(Self { public, private })
    }

    /// The public key as raw SubjectPublicKeyInfo DER.
    pub fn public_der(&self) -> &[u8] {
        &self.public
    }

    /// The private key as raw PKCS#8 DER.
    pub fn private_der(&self) -> &[u8] {
        &self.private
    }

    /// The public key as base64 DER.
    pub fn public_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.public)
    }

    /// The private key as base64 DER.
    pub fn private_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.private)
    }
}

/// Generates a fresh RSA keypair of `bits` bits from the OS random source.
///
/// # Errors
/// [`CryptoError::UnsupportedKeySize`] when `bits` is not one of
/// [`SUPPORTED_KEY_BITS`].
pub fn generate_keypair(bits: usize) -> Result<KeyPair, CryptoError> {
    if !SUPPORTED_KEY_BITS.contains(&bits) {
        return Err(CryptoError::UnsupportedKeySize(bits));
    }

    let private = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let public = RsaPublicKey::from(&private);

    let public_der = public
        .to_public_key_der()
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let private_der = private
        .to_pkcs8_der()
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

    tracing::debug!(bits, "generated device keypair");

    Ok(KeyPair {
        public: public_der.as_bytes().to_vec(),
        private: private_der.as_bytes().to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Parsing helpers shared with the cipher module
// ---------------------------------------------------------------------------

pub(crate) fn decode_b64(value: &str) -> Result<Vec<u8>, CryptoError> {
    BASE64_STANDARD
        .decode(value.trim())
        .map_err(|e| CryptoError::MalformedKey(format!("invalid base64: {e}")))
}

pub(crate) fn parse_public(public_b64: &str) -> Result<RsaPublicKey, CryptoError> {
    let der = decode_b64(public_b64)?;
    RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| CryptoError::MalformedKey(e.to_string()))
}

pub(crate) fn parse_private(private_b64: &str) -> Result<RsaPrivateKey, CryptoError> {
    let der = decode_b64(private_b64)?;
    RsaPrivateKey::from_pkcs8_der(&der)
        .map_err(|e| CryptoError::MalformedKey(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keypair_unsupported_size_returns_error() {
        assert_eq!(generate_keypair(1000), Err(CryptoError::UnsupportedKeySize(1000)));
        assert_eq!(generate_keypair(0), Err(CryptoError::UnsupportedKeySize(0)));
    }

    #[test]
    fn test_generate_keypair_halves_parse_back() {
        let pair = generate_keypair(DEFAULT_KEY_BITS).unwrap();

        let restored = KeyPair::from_base64(&pair.public_base64(), &pair.private_base64())
            .unwrap();

        assert_eq!(restored, pair);
    }

    #[test]
    fn test_generate_keypair_produces_distinct_material() {
        // Deterministic in size only, never in key material.
        let a = generate_keypair(DEFAULT_KEY_BITS).unwrap();
        let b = generate_keypair(DEFAULT_KEY_BITS).unwrap();
        assert_ne!(a.public_der(), b.public_der());
    }

    #[test]
    fn test_from_base64_rejects_garbage() {
        let result = KeyPair::from_base64("not base64!!", "also not");
        assert!(matches!(result, Err(CryptoError::MalformedKey(_))));
    }

    #[test]
    fn test_from_base64_rejects_swapped_halves() {
        let pair = generate_keypair(DEFAULT_KEY_BITS).unwrap();

        let result = KeyPair::from_base64(&pair.private_base64(), &pair.public_base64());

        assert!(matches!(result, Err(CryptoError::MalformedKey(_))));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let pair = generate_keypair(DEFAULT_KEY_BITS).unwrap();
        let printed = format!("{pair:?}");
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains(&pair.private_base64()));
    }
}
