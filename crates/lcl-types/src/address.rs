use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Length of an [`Address`] in bytes.
pub const ADDRESS_LEN: usize = 32;

/// Location of an account in the store, or a 32-byte public identity.
///
/// Listing, catalog, and URL-entry addresses are derived from semantic seeds
/// and are never valid curve points. Owners and authorities are raw Ed25519
/// public keys and share the same representation. Addresses render as
/// base58 text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// The all-zero address.
    pub const fn zero() -> Self {
        Self([0u8; ADDRESS_LEN])
    }

    /// Create a random address for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Returns `true` for the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Base58 text form.
    pub fn to_bs58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Parse from base58 text.
    pub fn from_bs58(s: &str) -> Result<Self, TypeError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TypeError::InvalidBase58(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Create from a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            expected: ADDRESS_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Short identifier (first 8 base58 characters).
    pub fn short_id(&self) -> String {
        let full = self.to_bs58();
        full.chars().take(8).collect()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_bs58())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bs58())
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bs58(s)
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; ADDRESS_LEN] {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_bs58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_bs58(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bs58_roundtrip() {
        let addr = Address::new([42u8; 32]);
        let text = addr.to_bs58();
        assert_eq!(Address::from_bs58(&text).unwrap(), addr);
        assert_eq!(text.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn zero_address_is_ones_in_bs58() {
        // base58 encodes each leading zero byte as '1'
        assert_eq!(Address::zero().to_bs58(), "1".repeat(32));
    }

    #[test]
    fn from_slice_checks_length() {
        let err = Address::from_slice(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 32, actual: 3 });
    }

    #[test]
    fn invalid_bs58_rejected() {
        assert!(matches!(
            Address::from_bs58("0OIl"),
            Err(TypeError::InvalidBase58(_))
        ));
    }

    #[test]
    fn ephemeral_addresses_are_unique() {
        assert_ne!(Address::ephemeral(), Address::ephemeral());
    }

    #[test]
    fn serde_uses_bs58_string() {
        let addr = Address::new([9u8; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_bs58()));
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn short_id_is_prefix() {
        let addr = Address::new([200u8; 32]);
        assert!(addr.to_bs58().starts_with(&addr.short_id()));
        assert_eq!(addr.short_id().len(), 8);
    }

    #[test]
    fn ordering_is_consistent() {
        assert!(Address::new([0; 32]) < Address::new([1; 32]));
    }
}
