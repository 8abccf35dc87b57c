//! Core seedable primitives.
//!
//! The round engine draws all of its randomness from a single seeded
//! PRNG so that an entire process run is reproducible from one logged
//! 64-bit seed.

pub mod rng;

// Re-export core types
pub use rng::{derive_round_seed, SeededRng};
