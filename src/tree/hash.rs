//! # Hash Values
//!
//! Fixed-width SHA-256 digests used for both leaves and internal nodes.
//! Hashes are plain values: copying is cheap and equality is byte-wise.

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::TreeError;

/// Width of a digest in bytes.
pub const HASH_LEN: usize = 32;

/// A 32-byte SHA-256 digest with a lowercase hex encoding.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    /// The all-zero hash, used as the default identity leaf.
    pub const ZERO: Hash = Hash([0u8; HASH_LEN]);

    pub const fn new(bytes: [u8; HASH_LEN]) -> Self {
        Hash(bytes)
    }

    /// Digest arbitrary bytes into a leaf hash.
    pub fn digest(data: impl AsRef<[u8]>) -> Self {
        Hash(Sha256::digest(data.as_ref()).into())
    }

    /// Combine two child hashes into their parent's hash.
    ///
    /// This is `SHA-256(left || right)` over the raw bytes, so the operand
    /// order matters: `compress(a, b) != compress(b, a)` in general.
    pub fn compress(left: &Hash, right: &Hash) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(left.0);
        hasher.update(right.0);
        Hash(hasher.finalize().into())
    }

    /// Parse a 64-digit hex string. Upper and lower case are both accepted.
    pub fn from_hex(input: &str) -> Result<Self, TreeError> {
        let invalid = |reason: String| TreeError::InvalidHash {
            input: input.to_string(),
            reason,
        };
        if input.len() != HASH_LEN * 2 {
            return Err(invalid(format!(
                "expected {} hex digits, got {}",
                HASH_LEN * 2,
                input.len()
            )));
        }
        let mut bytes = [0u8; HASH_LEN];
        hex::decode_to_slice(input, &mut bytes).map_err(|e| invalid(e.to_string()))?;
        Ok(Hash(bytes))
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl From<[u8; HASH_LEN]> for Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Hash(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Hash {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::LowerHex for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}
