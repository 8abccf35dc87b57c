//! Seedable Random Number Generator
//!
//! Xorshift128+ behind a single 64-bit seed. Given the same seed the
//! generator produces the identical sequence of crash points on any
//! platform, which is what makes a round series auditable after the
//! fact: log the seed once at startup, replay the draws offline.

use sha2::{Digest, Sha256};

/// Seedable PRNG using the Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use crash_game::core::rng::SeededRng;
///
/// let mut rng = SeededRng::new(12345);
/// let value = rng.next_u64();
/// assert_eq!(value, 6233086606872742541); // Always the same!
/// ```
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: [u64; 2],
}

impl Default for SeededRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SeededRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a uniform `f64` in `[0, 1)`.
    ///
    /// Uses the top 53 bits so every representable value is equally
    /// likely; this is the primitive behind each round's crash draw.
    #[inline]
    pub fn next_unit(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
        (self.next_u64() >> 11) as f64 * SCALE
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a round-series seed from raw process entropy.
///
/// Hashing rather than truncating means weak entropy (a coarse clock,
/// a short hostname) still spreads over the full 64-bit seed space.
pub fn derive_round_seed(entropy: &[u8]) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"CRASH_ROUND_SEED_V1");
    hasher.update(entropy);

    let hash = hasher.finalize();

    // Take first 8 bytes as seed
    u64::from_le_bytes(hash[0..8].try_into().unwrap())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        // Same seed must produce same sequence
        let mut rng1 = SeededRng::new(12345);
        let mut rng2 = SeededRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        // Different seeds produce different sequences
        let mut rng1 = SeededRng::new(12345);
        let mut rng2 = SeededRng::new(54321);

        // Very unlikely to match
        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_rng_known_values() {
        // Verify specific output for regression testing
        let mut rng = SeededRng::new(42);
        let val1 = rng.next_u64();
        let val2 = rng.next_u64();
        let val3 = rng.next_u64();

        // These values must never change!
        // If they do, logged seeds stop being replayable.
        assert_eq!(val1, 16629283624882167704);
        assert_eq!(val2, 1420492921613871959);
        assert_eq!(val3, 9768315062676884790);
    }

    #[test]
    fn test_next_unit_range() {
        let mut rng = SeededRng::new(1234);

        for _ in 0..10_000 {
            let h = rng.next_unit();
            assert!((0.0..1.0).contains(&h));
        }
    }

    #[test]
    fn test_next_unit_determinism() {
        let mut rng1 = SeededRng::new(777);
        let mut rng2 = SeededRng::new(777);

        for _ in 0..100 {
            assert_eq!(rng1.next_unit().to_bits(), rng2.next_unit().to_bits());
        }
    }

    #[test]
    fn test_derive_round_seed() {
        let seed1 = derive_round_seed(b"entropy-a");
        let seed2 = derive_round_seed(b"entropy-a");

        // Same inputs = same seed
        assert_eq!(seed1, seed2);

        // Different input = different seed
        let seed3 = derive_round_seed(b"entropy-b");
        assert_ne!(seed1, seed3);
    }
}
