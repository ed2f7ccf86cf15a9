//! Cryptographic identity for Tourney devices.
//!
//! Every device owns one RSA keypair. The tournament service never sees
//! the private half; it talks to the device by encrypting payloads under
//! the device's public key, and the device answers by encrypting under
//! the game's public key.
//!
//! - **Keys** ([`KeyPair`], [`generate_keypair`]): generation and the
//!   base64 DER encoding used for persistence and on the wire.
//! - **Cipher** ([`encrypt`], [`decrypt`]): RSA with PKCS#1 v1.5
//!   padding, base64 in and out.
//! - **Errors** ([`CryptoError`]): everything that can go wrong above.
//!
//! # Payload bound
//!
//! PKCS#1 v1.5 padding eats 11 bytes of the modulus, so a `k`-byte key
//! can carry at most `k - 11` bytes of plaintext: 117 bytes for a
//! 1024-bit key, 245 for 2048. Longer payloads are rejected with
//! [`CryptoError::PayloadTooLarge`]; nothing is truncated.

mod cipher;
mod error;
mod keys;

pub use cipher::{PKCS1_V15_OVERHEAD, decrypt, encrypt, max_plaintext_len};
pub use error::CryptoError;
pub use keys::{DEFAULT_KEY_BITS, KeyPair, SUPPORTED_KEY_BITS, generate_keypair};
