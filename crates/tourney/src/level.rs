//! Which level a match is played on.
//!
//! Developer tournaments name their level in the enter response's
//! metadata. When the response has none (and always for streamer
//! tournaments) the level number is
//! derived from the match id so every attempt at a match plays the same
//! level:
//!
//! ```text
//! match id ─sha256─→ hex digest ─fnv1a-64─→ h ─→ 8 + h % 5   (8..=12)
//! ```
//!
//! Both hashes are fully specified, so the mapping is stable across
//! runs, platforms, and implementations.

use std::fmt;

use sha2::{Digest, Sha256};

/// Smallest derived level number.
pub const FIRST_DERIVED_LEVEL: u8 = 8;
/// How many derived levels exist.
pub const DERIVED_LEVEL_COUNT: u8 = 5;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// The level to load for a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    /// Level named by the tournament's metadata.
    Named(String),
    /// Level number derived from the match id.
    Derived(u8),
}

impl Level {
    /// Picks the level for a match.
    ///
    /// Streamer tournaments ignore metadata. Blank metadata counts as
    /// absent.
    pub fn select(metadata: Option<&str>, match_id: &str, player_tournament: bool) -> Self {
        match metadata.map(str::trim) {
            Some(name) if !player_tournament && !name.is_empty() => Self::Named(name.to_string()),
            _ => Self::Derived(derive_level(match_id)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Derived(n) => write!(f, "{n}"),
        }
    }
}

/// Maps a match id to a level number in `8..=12`.
pub fn derive_level(match_id: &str) -> u8 {
    let digest = hex::encode(Sha256::digest(match_id.as_bytes()));
    let hash = fnv1a_64(digest.as_bytes());
    // `% 5` fits in a u8.
    FIRST_DERIVED_LEVEL + (hash % u64::from(DERIVED_LEVEL_COUNT)) as u8
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}
