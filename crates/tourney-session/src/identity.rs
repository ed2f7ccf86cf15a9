//! The device's persistent identity: its RSA keypair and display name.

use tourney_crypto::{CryptoError, KeyPair, generate_keypair};
use tourney_store::{KeyValueStore, StoreError, StoreKey};

/// The device keypair, loaded from the store or generated on first use.
///
/// `Debug` is inherited from [`KeyPair`], which redacts the private half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    keys: KeyPair,
}

impl DeviceIdentity {
    /// Returns the persisted keypair, or generates a `bits`-bit pair,
    /// persists both halves, and returns it.
    ///
    /// A store holding only one half is treated as empty. A store holding
    /// both halves that don't parse is an error rather than a silent
    /// regeneration: the service already knows this device by its key.
    ///
    /// Generation is CPU-bound; async callers should run this on a
    /// blocking thread.
    pub fn load_or_generate(
        store: &dyn KeyValueStore,
        bits: usize,
    ) -> Result<Self, crate::SessionError> {
        let public = store.get_non_empty(&StoreKey::PublicKey)?;
        let private = store.get_non_empty(&StoreKey::PrivateKey)?;

        if let (Some(public), Some(private)) = (&public, &private) {
            let keys = KeyPair::from_base64(public, private)?;
            tracing::debug!("loaded device keypair");
            return Ok(Self { keys });
        }
        if public.is_some() || private.is_some() {
            tracing::warn!("found half a device keypair, generating a new one");
        }

        let keys = generate_keypair(bits)?;
        store.set(&StoreKey::PublicKey, &keys.public_base64())?;
        store.set(&StoreKey::PrivateKey, &keys.private_base64())?;
        tracing::info!(bits, "generated and stored device keypair");
        Ok(Self { keys })
    }

    /// Wraps an existing keypair without touching any store.
    pub fn from_keys(keys: KeyPair) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyPair {
        &self.keys
    }

    /// The device public key, base64 SPKI DER.
    pub fn public_base64(&self) -> String {
        self.keys.public_base64()
    }

    /// The device public key encrypted under the game's public key: the
    /// registration payload.
    pub fn encrypted_public_key(&self, game_public_key: &str) -> Result<String, CryptoError> {
        tourney_crypto::encrypt(game_public_key, &self.keys.public_base64())
    }

    /// Decrypts something the service encrypted under this device's key.
    pub fn decrypt(&self, ciphertext_b64: &str) -> Result<String, CryptoError> {
        tourney_crypto::decrypt(&self.keys.private_base64(), ciphertext_b64)
    }
}

/// Picks the player's display name.
///
/// A stored name always wins. Otherwise a non-blank `supplied` name is
/// persisted and used. Otherwise `default` is used and nothing is stored,
/// so a real name can still be picked later.
pub fn resolve_player_name(
    store: &dyn KeyValueStore,
    supplied: Option<&str>,
    default: &str,
) -> Result<String, StoreError> {
    if let Some(stored) = store.get_non_empty(&StoreKey::PlayerName)? {
        return Ok(stored);
    }
    match supplied.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => {
            store.set(&StoreKey::PlayerName, name)?;
            Ok(name.to_string())
        }
        None => Ok(default.to_string()),
    }
}
