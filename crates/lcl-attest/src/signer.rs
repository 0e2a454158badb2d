use std::collections::BTreeMap;

use async_trait::async_trait;
use lcl_catalog::{AttestedListing, ListingMessage};
use lcl_crypto::{AddressDeriver, SigningKey, VerifyingKey};
use lcl_types::{CatalogId, ListingId};

use crate::error::{AttestError, AttestResult};
use crate::request::{ListingRequest, SignedListing};

/// Produces signed canonical messages for listing requests.
///
/// Signing never touches the record store, so a request may be reissued
/// freely after a timeout.
#[async_trait]
pub trait ListingSigner: Send + Sync {
    async fn sign(&self, request: &ListingRequest) -> AttestResult<SignedListing>;
}

/// A catalog this signer can vouch for.
#[derive(Clone, Debug)]
pub struct CatalogKey {
    pub id: CatalogId,
    pub key: SigningKey,
}

/// In-process signer holding the catalogs' signing keys.
///
/// Assigns a fresh v4 uuid to every request and recomputes every digest
/// and URL-entry address from the request's texts.
#[derive(Clone, Debug)]
pub struct LocalSigner {
    deriver: AddressDeriver,
    catalogs: BTreeMap<String, CatalogKey>,
}

impl LocalSigner {
    pub fn new(deriver: AddressDeriver) -> Self {
        Self {
            deriver,
            catalogs: BTreeMap::new(),
        }
    }

    pub fn with_catalog(mut self, name: impl Into<String>, id: CatalogId, key: SigningKey) -> Self {
        self.add_catalog(name, id, key);
        self
    }

    pub fn add_catalog(&mut self, name: impl Into<String>, id: CatalogId, key: SigningKey) {
        self.catalogs.insert(name.into(), CatalogKey { id, key });
    }

    /// `(name, id, public key)` for every configured catalog.
    pub fn catalogs(&self) -> impl Iterator<Item = (&str, CatalogId, VerifyingKey)> + '_ {
        self.catalogs
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.id, entry.key.verifying_key()))
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    pub fn sign_request(&self, request: &ListingRequest) -> AttestResult<SignedListing> {
        self.sign_with_uuid(request, ListingId::new_v4())
    }

    /// Sign with a caller-chosen uuid.
    pub fn sign_with_uuid(&self, request: &ListingRequest, uuid: ListingId) -> AttestResult<SignedListing> {
        let entry = self.catalogs.get(&request.catalog).ok_or_else(|| {
            tracing::warn!(catalog = %request.catalog, "signing refused for unknown catalog");
            AttestError::SignerRejected(format!("unknown catalog {:?}", request.catalog))
        })?;
        let urls = request
            .url_addresses(&self.deriver)
            .map_err(|e| AttestError::SignerRejected(e.to_string()))?;
        let fields = request
            .fields(uuid, entry.id, urls)
            .map_err(|e| AttestError::SignerRejected(e.to_string()))?;
        let message = ListingMessage {
            fields,
            fee_account: request.fee_account,
            fee_tokens: 0,
        };
        let attested = AttestedListing::sign(&entry.key, &message);
        tracing::debug!(
            catalog = entry.id.0,
            uuid = %uuid,
            owner = %request.owner,
            "signed listing message"
        );
        Ok(SignedListing::new(&attested, &message.fields, &request.fee_account))
    }
}

#[async_trait]
impl ListingSigner for LocalSigner {
    async fn sign(&self, request: &ListingRequest) -> AttestResult<SignedListing> {
        self.sign_request(request)
    }
}
