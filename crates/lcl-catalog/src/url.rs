//! Interned text: URLs, labels, and detail blobs.
//!
//! Each distinct `(mode, digest(content))` pair lives once in the store at
//! a derived address. Entries are written once and never mutated or
//! removed, including after every listing that referenced them is gone.

use std::sync::Arc;

use lcl_crypto::{url_entry_seeds, AddressDeriver, ContentAddresser, DerivedAddress};
use lcl_store::{find_or_create, AccountStore, FoundOrCreated};
use lcl_types::{Address, Digest, ExpandMode, ListingId};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult, CodecError};
use crate::layout::{expect_magic, ByteReader, ByteWriter};

pub const URL_ENTRY_MAGIC: [u8; 4] = *b"URLE";
pub const URL_ENTRY_VERSION: u8 = 1;
/// Magic, version, mode, two reserved bytes, u32 content length.
pub const URL_ENTRY_HEADER_LEN: usize = 12;

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_uri_component(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

/// Inverse of [`encode_uri_component`]. Every `%` must start a two-digit
/// hex escape and the decoded bytes must be UTF-8.
pub fn decode_uri_component(text: &str) -> Result<String, CodecError> {
    let bytes = text.as_bytes();
    if let Some(pos) = bytes.iter().enumerate().position(|(i, b)| {
        *b == b'%'
            && !bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    }) {
        return Err(CodecError::InvalidText(format!("malformed escape at byte {pos}")));
    }
    percent_decode_str(text)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| CodecError::InvalidText(e.to_string()))
}

/// Text destined for a URL entry: stored content plus how to expand it.
///
/// On the wire this is a `[content, mode]` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, ExpandMode)", into = "(String, ExpandMode)")]
pub struct TextRef {
    pub content: String,
    pub mode: ExpandMode,
}

impl TextRef {
    pub fn new(content: impl Into<String>, mode: ExpandMode) -> Self {
        Self {
            content: content.into(),
            mode,
        }
    }

    /// Returned verbatim.
    pub fn plain(content: impl Into<String>) -> Self {
        Self::new(content, ExpandMode::None)
    }

    /// A base URL the listing uuid is appended to.
    pub fn listing_base(content: impl Into<String>) -> Self {
        Self::new(content, ExpandMode::AppendUuid)
    }

    /// Arbitrary text, stored percent-encoded.
    pub fn encoded(text: &str) -> Self {
        Self::new(encode_uri_component(text), ExpandMode::Utf8UriEncoded)
    }

    pub fn digest(&self) -> Digest {
        ContentAddresser::digest_str(&self.content)
    }

    pub fn seeds(&self) -> [Vec<u8>; 2] {
        url_entry_seeds(self.mode, &self.digest())
    }

    pub fn to_entry(&self) -> UrlEntry {
        UrlEntry {
            mode: self.mode,
            content: self.content.clone(),
        }
    }
}

impl From<(String, ExpandMode)> for TextRef {
    fn from((content, mode): (String, ExpandMode)) -> Self {
        Self { content, mode }
    }
}

impl From<TextRef> for (String, ExpandMode) {
    fn from(text: TextRef) -> Self {
        (text.content, text.mode)
    }
}

/// A stored URL entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlEntry {
    pub mode: ExpandMode,
    pub content: String,
}

impl UrlEntry {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(URL_ENTRY_HEADER_LEN + self.content.len());
        w.bytes(&URL_ENTRY_MAGIC)
            .u8(URL_ENTRY_VERSION)
            .u8(self.mode.as_u8())
            .bytes(&[0, 0])
            .u32(self.content.len() as u32)
            .bytes(self.content.as_bytes());
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < URL_ENTRY_HEADER_LEN {
            return Err(CodecError::WrongLength {
                kind: "url entry",
                expected: URL_ENTRY_HEADER_LEN,
                actual: data.len(),
            });
        }
        expect_magic("url entry", data, &URL_ENTRY_MAGIC)?;
        let mut r = ByteReader::new(data);
        r.skip(4);
        let version = r.u8();
        if version != URL_ENTRY_VERSION {
            return Err(CodecError::UnsupportedVersion {
                kind: "url entry",
                version,
            });
        }
        let raw_mode = r.u8();
        let mode = ExpandMode::try_from(raw_mode).map_err(|_| CodecError::UnknownExpandMode(raw_mode))?;
        r.skip(2);
        let len = r.u32() as usize;
        let content = r.remaining();
        if content.len() != len {
            return Err(CodecError::WrongLength {
                kind: "url entry",
                expected: URL_ENTRY_HEADER_LEN + len,
                actual: data.len(),
            });
        }
        let content = std::str::from_utf8(content)
            .map_err(|e| CodecError::InvalidText(e.to_string()))?
            .to_string();
        Ok(Self { mode, content })
    }

    /// Reconstruct the text as seen by readers of `owner`'s listing.
    pub fn expand(&self, owner: &ListingId) -> Result<String, CodecError> {
        match self.mode {
            ExpandMode::None => Ok(self.content.clone()),
            ExpandMode::AppendUuid => Ok(format!("{}{}", self.content, owner.to_canonical_string())),
            ExpandMode::Utf8UriEncoded => decode_uri_component(&self.content),
        }
    }
}

/// Find-or-create access to URL entries.
pub struct UrlEntryStore<S: AccountStore> {
    store: Arc<S>,
    deriver: AddressDeriver,
    max_text_len: usize,
}

impl<S: AccountStore> UrlEntryStore<S> {
    pub fn new(store: Arc<S>, config: &CatalogConfig) -> Self {
        Self {
            store,
            deriver: config.deriver(),
            max_text_len: config.max_text_len,
        }
    }

    /// Where `text` is (or would be) interned. Never touches the store.
    pub fn address_of(&self, text: &TextRef) -> CatalogResult<DerivedAddress> {
        Ok(self.deriver.derive(&text.seeds())?)
    }

    /// Intern `text`, creating its entry only if absent.
    pub fn intern(&self, text: &TextRef) -> CatalogResult<FoundOrCreated> {
        self.check_len(text)?;
        let found = find_or_create(self.store.as_ref(), &self.deriver, &text.seeds(), || {
            text.to_entry().encode()
        })?;
        if found.created {
            tracing::info!(address = %found.address, mode = %text.mode, "interned url entry");
        }
        Ok(found)
    }

    pub fn check_len(&self, text: &TextRef) -> Result<(), CodecError> {
        if text.content.len() > self.max_text_len {
            return Err(CodecError::TextTooLong {
                len: text.content.len(),
                max: self.max_text_len,
            });
        }
        Ok(())
    }

    pub fn exists(&self, address: &Address) -> CatalogResult<bool> {
        Ok(self.store.exists(address)?)
    }

    pub fn load(&self, address: &Address) -> CatalogResult<UrlEntry> {
        let data = self.store.get(address)?.ok_or(CatalogError::RecordNotFound {
            kind: "url entry",
            address: *address,
        })?;
        Ok(UrlEntry::decode(&data)?)
    }

    /// Load and expand the entry at `address` for `owner`'s listing.
    pub fn resolve(&self, address: &Address, owner: &ListingId) -> CatalogResult<String> {
        Ok(self.load(address)?.expand(owner)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcl_store::InMemoryAccountStore;

    fn urls() -> UrlEntryStore<InMemoryAccountStore> {
        UrlEntryStore::new(Arc::new(InMemoryAccountStore::new()), &CatalogConfig::default())
    }

    #[test]
    fn interning_twice_returns_same_address() {
        let urls = urls();
        let text = TextRef::plain("http://example.com/x");
        let first = urls.intern(&text).unwrap();
        let second = urls.intern(&text).unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.address, second.address);
        assert_eq!(urls.store.len(), 1);
        assert_eq!(urls.address_of(&text).unwrap().address, first.address);
    }

    #[test]
    fn address_seeds_use_digest_of_content() {
        let urls = urls();
        let text = TextRef::plain("http://example.com/x");
        let expected = AddressDeriver::default()
            .url_entry(ExpandMode::None, &ContentAddresser::digest_str("http://example.com/x"))
            .unwrap();
        assert_eq!(urls.address_of(&text).unwrap(), expected);
    }

    #[test]
    fn same_content_different_mode_is_distinct() {
        let urls = urls();
        let a = urls.intern(&TextRef::plain("https://a.example/")).unwrap();
        let b = urls.intern(&TextRef::listing_base("https://a.example/")).unwrap();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn resolve_applies_expand_mode() {
        let urls = urls();
        let owner: ListingId = "3c57b887-96c3-4263-b437-39420c7ea541".parse().unwrap();

        let plain = urls.intern(&TextRef::plain("https://a.example/x")).unwrap();
        assert_eq!(urls.resolve(&plain.address, &owner).unwrap(), "https://a.example/x");

        let base = urls.intern(&TextRef::listing_base("https://a.example/l/")).unwrap();
        assert_eq!(
            urls.resolve(&base.address, &owner).unwrap(),
            "https://a.example/l/3c57b887-96c3-4263-b437-39420c7ea541"
        );

        let label = urls.intern(&TextRef::encoded("Café & Bar")).unwrap();
        assert_eq!(urls.resolve(&label.address, &owner).unwrap(), "Café & Bar");
    }

    #[test]
    fn encoding_matches_uri_component_rules() {
        assert_eq!(encode_uri_component("a b&c/d"), "a%20b%26c%2Fd");
        assert_eq!(encode_uri_component("-_.!~*'()"), "-_.!~*'()");
        assert_eq!(encode_uri_component("é"), "%C3%A9");
        assert_eq!(decode_uri_component("%C3%A9").unwrap(), "é");
    }

    #[test]
    fn invalid_utf8_after_decoding_is_rejected() {
        let entry = UrlEntry {
            mode: ExpandMode::Utf8UriEncoded,
            content: "%FF%FE".into(),
        };
        assert!(matches!(
            entry.expand(&ListingId::from_u128(1)),
            Err(CodecError::InvalidText(_))
        ));
    }

    #[test]
    fn malformed_escapes_are_rejected() {
        for bad in ["%zz", "abc%", "%4", "a%g1b"] {
            assert!(
                matches!(decode_uri_component(bad), Err(CodecError::InvalidText(_))),
                "{bad:?} should not decode"
            );
        }
        assert_eq!(decode_uri_component("100%25").unwrap(), "100%");
        assert_eq!(decode_uri_component("%e2%82%ac").unwrap(), "€");
    }

    #[test]
    fn oversized_text_rejected() {
        let config = CatalogConfig {
            max_text_len: 4,
            ..CatalogConfig::default()
        };
        let urls = UrlEntryStore::new(Arc::new(InMemoryAccountStore::new()), &config);
        let err = urls.intern(&TextRef::plain("too long")).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Codec(CodecError::TextTooLong { len: 8, max: 4 })
        ));
    }

    #[test]
    fn missing_entry_is_record_not_found() {
        let urls = urls();
        assert!(matches!(
            urls.load(&Address::new([5; 32])),
            Err(CatalogError::RecordNotFound { kind: "url entry", .. })
        ));
    }

    #[test]
    fn entry_codec_roundtrip_and_layout() {
        let entry = UrlEntry {
            mode: ExpandMode::AppendUuid,
            content: "https://x/".into(),
        };
        let bytes = entry.encode();
        assert_eq!(&bytes[..4], b"URLE");
        assert_eq!(bytes[5], 1);
        assert_eq!(&bytes[8..12], &10u32.to_le_bytes());
        assert_eq!(UrlEntry::decode(&bytes).unwrap(), entry);
    }

    #[test]
    fn truncated_entry_rejected() {
        let bytes = TextRef::plain("https://x/").to_entry().encode();
        assert!(matches!(
            UrlEntry::decode(&bytes[..bytes.len() - 1]),
            Err(CodecError::WrongLength { .. })
        ));
        assert!(UrlEntry::decode(&bytes[..6]).is_err());
    }

    #[test]
    fn unknown_mode_rejected() {
        let mut bytes = TextRef::plain("x").to_entry().encode();
        bytes[5] = 9;
        assert_eq!(UrlEntry::decode(&bytes), Err(CodecError::UnknownExpandMode(9)));
    }

    #[test]
    fn text_ref_is_a_pair_on_the_wire() {
        let text = TextRef::listing_base("https://x/");
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, r#"["https://x/",1]"#);
        assert_eq!(serde_json::from_str::<TextRef>(&json).unwrap(), text);
    }

    #[test]
    fn concurrent_interning_creates_once() {
        let urls = Arc::new(urls());
        let text = TextRef::plain("http://example.com/race");
        let addresses: Vec<Address> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| urls.intern(&text).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap().address).collect()
        });
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(urls.store.len(), 1);
    }
}
