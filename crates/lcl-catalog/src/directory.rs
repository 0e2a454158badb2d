use std::collections::{BTreeMap, HashMap};

use lcl_crypto::ContentAddresser;
use lcl_types::Digest;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// A known URI and its human label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriEntry {
    pub uri: String,
    pub label: String,
}

/// Reverse lookup from category and locality digests to the URIs they
/// were computed from.
///
/// The JSON form is an object keyed by base58 digest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UriDirectory {
    entries: HashMap<Digest, UriEntry>,
}

impl UriDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, U, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, L)>,
        U: Into<String>,
        L: Into<String>,
    {
        let mut dir = Self::new();
        for (uri, label) in pairs {
            dir.insert(uri, label);
        }
        dir
    }

    /// Add a URI; returns its digest.
    pub fn insert(&mut self, uri: impl Into<String>, label: impl Into<String>) -> Digest {
        let uri = uri.into();
        let digest = ContentAddresser::digest_str(&uri);
        self.entries.insert(
            digest,
            UriEntry {
                uri,
                label: label.into(),
            },
        );
        digest
    }

    pub fn lookup(&self, digest: &Digest) -> Option<&UriEntry> {
        self.entries.get(digest)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let keyed: BTreeMap<String, &UriEntry> = self
            .entries
            .iter()
            .map(|(digest, entry)| (digest.to_bs58(), entry))
            .collect();
        serde_json::json!(keyed)
    }

    /// Parse the keyed JSON form. Keys must match their entry's digest.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CodecError> {
        let keyed: BTreeMap<String, UriEntry> = serde_json::from_value(value.clone())
            .map_err(|e| CodecError::InvalidText(e.to_string()))?;
        let mut entries = HashMap::with_capacity(keyed.len());
        for (key, entry) in keyed {
            let digest = Digest::from_bs58(&key)?;
            if digest != ContentAddresser::digest_str(&entry.uri) {
                return Err(CodecError::InvalidText(format!(
                    "directory key {key} does not match digest of {}",
                    entry.uri
                )));
            }
            entries.insert(digest, entry);
        }
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UriDirectory {
        UriDirectory::from_pairs([
            ("https://schema.org/Store", "Store"),
            ("http://www.geonames.org/6252001/", "United States"),
        ])
    }

    #[test]
    fn lookup_by_digest() {
        let dir = sample();
        let digest = ContentAddresser::digest_str("https://schema.org/Store");
        assert_eq!(dir.lookup(&digest).unwrap().label, "Store");
        assert!(dir.lookup(&Digest::zero()).is_none());
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn json_roundtrip() {
        let dir = sample();
        let json = dir.to_json();
        let key = ContentAddresser::digest_str("https://schema.org/Store").to_bs58();
        assert_eq!(json[&key]["label"], "Store");
        assert_eq!(UriDirectory::from_json(&json).unwrap(), dir);
    }

    #[test]
    fn mismatched_key_rejected() {
        let json = serde_json::json!({
            (Digest::from_u128(1).to_bs58()): { "uri": "https://schema.org/Store", "label": "Store" }
        });
        assert!(UriDirectory::from_json(&json).is_err());
    }
}
