//! Chain hash type linking vote records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte digest in the vote chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainHash([u8; 32]);

impl Default for ChainHash {
    fn default() -> Self {
        Self::GENESIS
    }
}

impl ChainHash {
    /// The `prev_hash` of the first record in the chain.
    pub const GENESIS: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_genesis(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Full lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_genesis() {
            return write!(f, "ChainHash(GENESIS)");
        }
        write!(f, "ChainHash({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
