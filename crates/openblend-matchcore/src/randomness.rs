//! Randomness reduction and nonce derivation.
//!
//! The randomness provider delivers 32 opaque bytes per request. They are
//! consumed as big-endian `u64` words; once all four words are used the
//! buffer is replaced by its own SHA-256 digest, so any number of draws can
//! be taken from one delivery. The same bytes always yield the same draws.

use openblend_types::{Nonce, TxId, constants};
use sha2::{Digest, Sha256};

/// Deterministic stream of `u64` draws seeded by a delivered random value.
#[derive(Debug, Clone)]
pub struct RandomnessProvider {
    raw: [u8; 32],
    offset: usize,
}

impl RandomnessProvider {
    /// Start reading words from `seed`.
    #[must_use]
    pub fn new(seed: [u8; 32]) -> Self {
        tracing::debug!(seed = hex::encode(seed), "Randomness provider seeded");
        Self { raw: seed, offset: 0 }
    }

    /// Next 64-bit draw.
    pub fn next_u64(&mut self) -> u64 {
        if self.offset + 8 > self.raw.len() {
            self.regenerate();
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.raw[self.offset..self.offset + 8]);
        self.offset += 8;
        u64::from_be_bytes(word)
    }

    /// Draw in `[0, max)`. `max == 0` yields 0.
    pub fn get_rand(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        self.next_u64() % max
    }

    fn regenerate(&mut self) {
        let digest = Sha256::digest(self.raw);
        self.raw.copy_from_slice(&digest);
        self.offset = 0;
    }
}

/// Starting nonce for a deferred request, derived from the transaction id.
///
/// The coordinator walks upward from this value until it finds a nonce
/// neither it nor the provider has seen.
#[must_use]
pub fn derive_nonce(tx_id: &TxId) -> Nonce {
    let mut hasher = Sha256::new();
    hasher.update(constants::NONCE_DOMAIN);
    hasher.update(tx_id.as_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    Nonce(u64::from_be_bytes(head))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_are_big_endian_words() {
        let mut seed = [0u8; 32];
        seed[7] = 70;
        seed[15] = 10;
        let mut p = RandomnessProvider::new(seed);
        assert_eq!(p.next_u64(), 70);
        assert_eq!(p.next_u64(), 10);
    }

    #[test]
    fn same_seed_same_stream() {
        let seed = [0x5A; 32];
        let mut a = RandomnessProvider::new(seed);
        let mut b = RandomnessProvider::new(seed);
        for _ in 0..12 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn regenerates_after_four_draws() {
        let seed = [0u8; 32];
        let mut p = RandomnessProvider::new(seed);
        for _ in 0..4 {
            assert_eq!(p.next_u64(), 0);
        }
        let digest = Sha256::digest(seed);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        assert_eq!(p.next_u64(), u64::from_be_bytes(head));
    }

    #[test]
    fn get_rand_in_range() {
        let mut p = RandomnessProvider::new([0xFF; 32]);
        for _ in 0..20 {
            assert!(p.get_rand(100) < 100);
        }
        assert_eq!(p.get_rand(0), 0);
    }

    #[test]
    fn nonce_is_deterministic_per_tx() {
        let tx = TxId::from_bytes([9; 16]);
        assert_eq!(derive_nonce(&tx), derive_nonce(&tx));
        assert_ne!(derive_nonce(&tx), derive_nonce(&TxId::from_bytes([8; 16])));
    }
}
