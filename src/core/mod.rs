//! Core deterministic primitives.
//!
//! Everything in this module is reproducible from a seed; the battle
//! engine builds on it and never reaches for ambient randomness.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{DeterministicRng, DEFAULT_SEED};
pub use hash::{compute_state_hash, HashDomain, HexDigest, StateHash, StateHasher};
