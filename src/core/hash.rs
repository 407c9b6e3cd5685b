//! Domain-separated SHA-256 digests.
//!
//! Used to derive generator seeds from text and to fingerprint snapshots so
//! a replay can be checked with a single comparison.

use std::fmt;

use sha2::{Digest as _, Sha256};

/// 32-byte SHA-256 output.
pub type StateHash = [u8; 32];

/// What a digest is for. Each domain prefixes its own tag, so a seed digest
/// can never collide with a snapshot digest over the same bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashDomain {
    /// Textual seed to generator state
    Seed,
    /// Encoded battle snapshot
    Snapshot,
}

impl HashDomain {
    /// Prefix fed to the hasher before any data.
    pub fn tag(self) -> &'static [u8] {
        match self {
            HashDomain::Seed => b"BATTLE_SIM_SEED_V1",
            HashDomain::Snapshot => b"BATTLE_SIM_SNAPSHOT_V1",
        }
    }
}

/// Incremental hasher. Field order is part of the digest.
pub struct StateHasher {
    inner: Sha256,
}

impl StateHasher {
    /// Start a digest in `domain`.
    pub fn new(domain: HashDomain) -> Self {
        let mut inner = Sha256::new();
        inner.update(domain.tag());
        Self { inner }
    }

    /// Feed raw bytes.
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.inner.update(bytes);
        self
    }

    /// Feed a little-endian `u32`.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    /// Feed a string, prefixed with its byte length so adjacent strings
    /// cannot run together.
    #[inline]
    pub fn write_str(&mut self, value: &str) -> &mut Self {
        self.write(&(value.len() as u64).to_le_bytes());
        self.write(value.as_bytes())
    }

    /// Consume the hasher.
    pub fn finish(self) -> StateHash {
        self.inner.finalize().into()
    }
}

/// One-shot digest of `data` in `domain`.
pub fn hash_with_domain(domain: HashDomain, data: &[u8]) -> StateHash {
    let mut hasher = StateHasher::new(domain);
    hasher.write(data);
    hasher.finish()
}

/// Snapshot digest: round, then seed, then the encoded snapshot.
pub fn compute_state_hash(round: u32, seed: &str, encoded: &[u8]) -> StateHash {
    let mut hasher = StateHasher::new(HashDomain::Snapshot);
    hasher.write_u32(round).write_str(seed).write(encoded);
    hasher.finish()
}

/// Lowercase hex rendering of a digest.
pub struct HexDigest<'a>(pub &'a StateHash);

impl fmt::Display for HexDigest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
