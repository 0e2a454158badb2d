use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length of a [`Digest`] in bytes (128 bits).
pub const DIGEST_LEN: usize = 16;

/// Fixed-size content digest of a UTF-8 string.
///
/// The inner bytes are kept in squeeze order, which is also the big-endian
/// reading of the digest as a `u128`. Account layouts store digests as
/// little-endian integers, so anything that writes a digest into a record or
/// builds a scan prefix must go through [`Digest::to_le_bytes`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wrap a pre-computed hash output.
    pub const fn from_hash(hash: [u8; DIGEST_LEN]) -> Self {
        Self(hash)
    }

    /// The zero digest. Used for unused filter slots.
    pub const fn zero() -> Self {
        Self([0u8; DIGEST_LEN])
    }

    /// Returns `true` if this is the zero digest.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; DIGEST_LEN]
    }

    /// Canonical (squeeze order / big-endian) bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// The digest read as a big-endian integer.
    pub fn as_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Build a digest from its integer value.
    pub fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// Little-endian bytes, the form stored in account data.
    pub fn to_le_bytes(&self) -> [u8; DIGEST_LEN] {
        self.as_u128().to_le_bytes()
    }

    /// Read a digest from its little-endian stored form.
    pub fn from_le_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self::from_u128(u128::from_le_bytes(bytes))
    }

    /// Hex-encoded canonical bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from 32 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; DIGEST_LEN] = bytes.try_into().map_err(|b: Vec<u8>| TypeError::InvalidLength {
            expected: DIGEST_LEN,
            actual: b.len(),
        })?;
        Ok(Self(arr))
    }

    /// Base58 form of the canonical bytes.
    pub fn to_bs58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Parse from base58 text.
    pub fn from_bs58(s: &str) -> Result<Self, TypeError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TypeError::InvalidBase58(e.to_string()))?;
        let arr: [u8; DIGEST_LEN] = bytes.try_into().map_err(|b: Vec<u8>| TypeError::InvalidLength {
            expected: DIGEST_LEN,
            actual: b.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}
