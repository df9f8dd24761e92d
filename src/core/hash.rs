//! State Fingerprints
//!
//! Deterministic SHA-256 fingerprints of game snapshots for:
//! - Integrity checks between the live session and transmitted snapshots
//! - Replay validation
//! - Compact identification in logs

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for game state.
///
/// Wraps SHA-256 with a domain separator so fingerprints of different
/// record kinds never collide. Order of updates is significant.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for game state snapshots.
    pub fn for_game_state() -> Self {
        Self::new(b"DUEL_ROOM_STATE_V1")
    }

    /// Create hasher for recorded move logs.
    pub fn for_move_log() -> Self {
        Self::new(b"DUEL_ROOM_MOVES_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Short hex prefix of a fingerprint, for log lines.
pub fn short_hex(hash: &StateHash) -> String {
    hex::encode(&hash[..6])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_determinism() {
        let hash = |turn: u32| {
            let mut hasher = StateHasher::for_game_state();
            hasher.update_u32(turn);
            hasher.update_bytes(b"board");
            hasher.finalize()
        };
        assert_eq!(hash(7), hash(7));
        assert_ne!(hash(7), hash(8));
    }

    #[test]
    fn test_domain_separation() {
        let mut a = StateHasher::for_game_state();
        a.update_bytes(b"same payload");
        let mut b = StateHasher::for_move_log();
        b.update_bytes(b"same payload");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_short_hex() {
        let hash = [0xab; 32];
        assert_eq!(short_hex(&hash), "abababababab");
    }
}
