//! Wire types exchanged with the signer service.
//!
//! A [`ListingRequest`] carries every field destined for the record, with
//! texts as `(content, mode)` pairs rather than digests, so the signer
//! recomputes each digest and URL-entry address itself.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use lcl_catalog::{
    AttestedListing, AttributeSet, AttributeTable, Attributes, CodecError, Coordinates,
    ListingFields, TextRef, COORDINATE_UNSET,
};
use lcl_catalog::query::MAX_FILTERS;
use lcl_crypto::{AddressDeriver, ContentAddresser, DeriveError, Signature, VerifyingKey};
use lcl_types::{Address, CatalogId, Digest, ListingId};
use serde::{Deserialize, Serialize};

use crate::error::{AttestError, AttestResult};

pub const RESULT_OK: &str = "ok";

/// A listing as its author describes it, before anything is signed.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingDraft {
    pub catalog: String,
    pub category: String,
    /// Locality URIs, at most three.
    pub filter_by: Vec<String>,
    pub attributes: AttributeSet,
    pub coordinates: Option<Coordinates>,
    pub owner: Address,
    /// Base URL; the listing uuid is appended on read.
    pub listing_url: String,
    pub label: String,
    /// Free-form detail text, usually JSON.
    pub detail: String,
    pub fee_account: Address,
}

impl ListingDraft {
    pub fn new(catalog: impl Into<String>, category: impl Into<String>, owner: Address) -> Self {
        Self {
            catalog: catalog.into(),
            category: category.into(),
            filter_by: Vec::new(),
            attributes: AttributeSet::new(),
            coordinates: None,
            owner,
            listing_url: String::new(),
            label: String::new(),
            detail: String::new(),
            fee_account: owner,
        }
    }

    /// The three URL-entry texts in record order: listing, label, detail.
    pub fn texts(&self) -> [TextRef; 3] {
        [
            TextRef::listing_base(self.listing_url.as_str()),
            TextRef::encoded(&self.label),
            TextRef::encoded(&self.detail),
        ]
    }

    pub fn to_request(&self) -> Result<ListingRequest, CodecError> {
        if self.filter_by.len() > MAX_FILTERS {
            return Err(CodecError::TooManyFilters(self.filter_by.len()));
        }
        let mut filters = self.filter_by.iter().cloned();
        let attributes = AttributeTable::CURRENT.pack(&self.attributes)?;
        let (latitude, longitude) = self
            .coordinates
            .map(|c| c.to_fixed())
            .unwrap_or((COORDINATE_UNSET, COORDINATE_UNSET));
        let [listing_url, label_url, detail_url] = self.texts();
        Ok(ListingRequest {
            catalog: self.catalog.clone(),
            category: self.category.clone(),
            filter_by_1: filters.next().unwrap_or_default(),
            filter_by_2: filters.next().unwrap_or_default(),
            filter_by_3: filters.next().unwrap_or_default(),
            attributes: attributes.bits,
            attribute_version: attributes.version,
            latitude,
            longitude,
            owner: self.owner,
            listing_url,
            label_url,
            detail_url,
            fee_account: self.fee_account,
        })
    }
}

/// Body of `POST /api/catalog/listing`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRequest {
    /// Catalog name, resolved by the signer.
    pub catalog: String,
    pub category: String,
    /// Locality URIs; empty means no filter.
    #[serde(default)]
    pub filter_by_1: String,
    #[serde(default)]
    pub filter_by_2: String,
    #[serde(default)]
    pub filter_by_3: String,
    pub attributes: u8,
    pub attribute_version: u8,
    pub latitude: i32,
    pub longitude: i32,
    pub owner: Address,
    pub listing_url: TextRef,
    pub label_url: TextRef,
    pub detail_url: TextRef,
    pub fee_account: Address,
}

impl ListingRequest {
    pub fn texts(&self) -> [&TextRef; 3] {
        [&self.listing_url, &self.label_url, &self.detail_url]
    }

    pub fn filter_digests(&self) -> [Digest; 3] {
        [&self.filter_by_1, &self.filter_by_2, &self.filter_by_3].map(|uri| {
            if uri.is_empty() {
                Digest::zero()
            } else {
                ContentAddresser::digest_str(uri)
            }
        })
    }

    /// Where the three texts are interned.
    pub fn url_addresses(&self, deriver: &AddressDeriver) -> Result<[Address; 3], DeriveError> {
        let [listing, label, detail] = self.texts();
        Ok([
            deriver.derive(&listing.seeds())?.address,
            deriver.derive(&label.seeds())?.address,
            deriver.derive(&detail.seeds())?.address,
        ])
    }

    /// Record fields for this request under an assigned uuid and catalog.
    pub fn fields(
        &self,
        uuid: ListingId,
        catalog_id: CatalogId,
        urls: [Address; 3],
    ) -> Result<ListingFields, CodecError> {
        AttributeTable::for_version(self.attribute_version)?;
        let [listing_url, label_url, detail_url] = urls;
        Ok(ListingFields {
            uuid,
            catalog_id,
            category: ContentAddresser::digest_str(&self.category),
            filter_by: self.filter_digests(),
            attributes: Attributes {
                version: self.attribute_version,
                bits: self.attributes,
            },
            latitude: self.latitude,
            longitude: self.longitude,
            owner: self.owner,
            listing_url,
            label_url,
            detail_url,
        })
    }
}

/// The signer's answer: a signed canonical message plus the identity it
/// assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedListing {
    pub result: String,
    pub uuid: String,
    /// Decimal catalog id.
    pub catalog: String,
    /// Base58 signer public key.
    pub pubkey: String,
    /// Base58 signature.
    pub sig: String,
    /// Base64 canonical message bytes.
    pub message: String,
    pub fee_account: String,
}

impl SignedListing {
    pub fn new(attested: &AttestedListing, fields: &ListingFields, fee_account: &Address) -> Self {
        Self {
            result: RESULT_OK.to_string(),
            uuid: fields.uuid.to_string(),
            catalog: fields.catalog_id.to_string(),
            pubkey: attested.signer.to_bs58(),
            sig: attested.signature.to_bs58(),
            message: BASE64.encode(&attested.message),
            fee_account: fee_account.to_bs58(),
        }
    }

    pub fn listing_id(&self) -> AttestResult<ListingId> {
        self.uuid
            .parse()
            .map_err(|_| malformed(format!("uuid {:?}", self.uuid)))
    }

    pub fn catalog_id(&self) -> AttestResult<CatalogId> {
        self.catalog
            .parse::<u64>()
            .map(CatalogId)
            .map_err(|_| malformed(format!("catalog {:?}", self.catalog)))
    }

    /// Decode the signature, key and message bytes.
    pub fn into_attested(self) -> AttestResult<AttestedListing> {
        if self.result != RESULT_OK {
            return Err(AttestError::SignerRejected(format!("result {:?}", self.result)));
        }
        let signer = VerifyingKey::from_bs58(&self.pubkey)
            .map_err(|_| malformed(format!("pubkey {:?}", self.pubkey)))?;
        let signature = Signature::from_bs58(&self.sig)
            .map_err(|_| malformed(format!("sig {:?}", self.sig)))?;
        let message = BASE64
            .decode(self.message.as_bytes())
            .map_err(|e| malformed(format!("message: {e}")))?;
        Ok(AttestedListing {
            message,
            signature,
            signer,
        })
    }
}

fn malformed(what: String) -> AttestError {
    AttestError::unavailable(format!("malformed signer response: {what}"), true)
}
