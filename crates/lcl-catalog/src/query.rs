//! Prefix-scan reads.
//!
//! A query is turned into raw bytes placed at a fixed record offset; the
//! store returns every account holding exactly those bytes there. There is
//! no secondary index, so a scan costs one pass over the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lcl_crypto::ContentAddresser;
use lcl_store::AccountStore;
use lcl_types::{Address, CatalogId, Digest, ListingId};
use serde::Serialize;

use crate::attributes::AttributeSet;
use crate::config::CatalogConfig;
use crate::coords::Coordinates;
use crate::directory::{UriDirectory, UriEntry};
use crate::error::{CatalogError, CatalogResult, CodecError};
use crate::record::{ListingRecord, CATALOG_OFFSET, CATEGORY_OFFSET};
use crate::tombstone::Tombstone;
use crate::url::UrlEntryStore;

/// Most locality filters a record carries.
pub const MAX_FILTERS: usize = 3;

/// Category plus optional locality filters and catalog scope.
///
/// Filters must be given in the same slot order writers used; a query
/// with filters `[a, b]` matches records whose first two slots are `a, b`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingQuery {
    catalog: Option<CatalogId>,
    category: Digest,
    filters: Vec<Digest>,
}

impl ListingQuery {
    pub fn category(uri: &str) -> Self {
        Self::category_digest(ContentAddresser::digest_str(uri))
    }

    pub fn category_digest(category: Digest) -> Self {
        Self {
            catalog: None,
            category,
            filters: Vec::new(),
        }
    }

    pub fn filter(self, uri: &str) -> Self {
        self.filter_digest(ContentAddresser::digest_str(uri))
    }

    pub fn filter_digest(mut self, filter: Digest) -> Self {
        self.filters.push(filter);
        self
    }

    /// Narrow to one catalog. `catalog_id` directly precedes `category` in
    /// the layout, so this just moves the prefix start back.
    pub fn in_catalog(mut self, catalog: CatalogId) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn to_prefix(&self) -> Result<ScanPrefix, CodecError> {
        if self.filters.len() > MAX_FILTERS {
            return Err(CodecError::TooManyFilters(self.filters.len()));
        }
        let mut bytes = Vec::with_capacity(8 + 16 * (1 + self.filters.len()));
        let offset = match self.catalog {
            Some(catalog) => {
                bytes.extend_from_slice(&catalog.to_le_bytes());
                CATALOG_OFFSET
            }
            None => CATEGORY_OFFSET,
        };
        bytes.extend_from_slice(&self.category.to_le_bytes());
        for filter in &self.filters {
            bytes.extend_from_slice(&filter.to_le_bytes());
        }
        Ok(ScanPrefix { offset, bytes })
    }
}

/// Raw bytes to match at a record offset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScanPrefix {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl ScanPrefix {
    /// Base58 form, as accepted by account-filter RPCs.
    pub fn to_bs58(&self) -> String {
        bs58::encode(&self.bytes).into_string()
    }
}

/// A listing with its URL entries and labels resolved.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListingView {
    pub address: Address,
    pub uuid: ListingId,
    pub catalog_id: CatalogId,
    pub url: String,
    pub label: String,
    pub detail: String,
    /// Present when the reader's directory knows the category.
    pub category: Option<UriEntry>,
    /// Known locality filters in slot order.
    pub locality: Vec<UriEntry>,
    pub coordinates: Option<Coordinates>,
    pub attributes: AttributeSet,
    pub owner: Address,
    pub update_count: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ListingView {
    /// The detail text parsed as JSON, when it is JSON.
    pub fn detail_json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.detail).ok()
    }
}

/// Read side of the catalog.
pub struct ListingReader<S: AccountStore> {
    store: Arc<S>,
    urls: UrlEntryStore<S>,
    directory: UriDirectory,
}

impl<S: AccountStore> ListingReader<S> {
    pub fn new(store: Arc<S>, config: &CatalogConfig) -> Self {
        Self {
            urls: UrlEntryStore::new(Arc::clone(&store), config),
            store,
            directory: UriDirectory::new(),
        }
    }

    pub fn with_directory(mut self, directory: UriDirectory) -> Self {
        self.directory = directory;
        self
    }

    /// All listing records matching `query`, ordered by address.
    ///
    /// Accounts of other kinds that happen to match the prefix are skipped,
    /// as are listing accounts that fail to decode.
    pub fn scan(&self, query: &ListingQuery) -> CatalogResult<Vec<(Address, ListingRecord)>> {
        let prefix = query.to_prefix()?;
        let hits = self.store.scan_by_prefix(prefix.offset, &prefix.bytes)?;
        tracing::debug!(offset = prefix.offset, hits = hits.len(), "prefix scan");
        let mut records = Vec::with_capacity(hits.len());
        for (address, data) in hits {
            if !ListingRecord::is_listing(&data) {
                continue;
            }
            match ListingRecord::decode(&data) {
                Ok(record) => records.push((address, record)),
                Err(e) => tracing::warn!(%address, error = %e, "skipping undecodable listing"),
            }
        }
        Ok(records)
    }

    pub fn get(&self, address: &Address) -> CatalogResult<ListingRecord> {
        let data = self.store.get(address)?.ok_or(CatalogError::RecordNotFound {
            kind: "listing",
            address: *address,
        })?;
        if Tombstone::is_tombstone(&data) {
            return Err(CatalogError::ListingRemoved {
                address: *address,
                uuid: Tombstone::decode(&data)?.uuid,
            });
        }
        Ok(ListingRecord::decode(&data)?)
    }

    /// Resolve a record's references into readable text.
    pub fn view(&self, address: &Address, record: &ListingRecord) -> CatalogResult<ListingView> {
        let f = &record.fields;
        Ok(ListingView {
            address: *address,
            uuid: f.uuid,
            catalog_id: f.catalog_id,
            url: self.urls.resolve(&f.listing_url, &f.uuid)?,
            label: self.urls.resolve(&f.label_url, &f.uuid)?,
            detail: self.urls.resolve(&f.detail_url, &f.uuid)?,
            category: self.directory.lookup(&f.category).cloned(),
            locality: f
                .filters()
                .filter_map(|d| self.directory.lookup(d).cloned())
                .collect(),
            coordinates: f.coordinates(),
            attributes: f.attributes.to_set().map_err(CodecError::from)?,
            owner: f.owner,
            update_count: record.update_count,
            updated_at: DateTime::from_timestamp(record.update_ts, 0),
        })
    }

    /// Scan and resolve in one step.
    ///
    /// A listing whose references cannot be resolved is skipped; store
    /// failures still end the search.
    pub fn search(&self, query: &ListingQuery) -> CatalogResult<Vec<ListingView>> {
        let mut views = Vec::new();
        for (address, record) in self.scan(query)? {
            match self.view(&address, &record) {
                Ok(view) => views.push(view),
                Err(CatalogError::Store(e)) => return Err(e.into()),
                Err(e) => tracing::warn!(%address, error = %e, "skipping unresolvable listing"),
            }
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::Fixture;
    use crate::message::RemovalInstruction;
    use crate::traits::CatalogWriter;
    use crate::record::FILTER_OFFSETS;
    use lcl_store::InMemoryAccountStore;
    use std::collections::BTreeSet;

    const STORE: &str = "https://schema.org/Store";
    const BAKERY: &str = "https://schema.org/Bakery";
    const EVENT: &str = "https://schema.org/Event";
    const USA: &str = "http://www.geonames.org/6252001/";
    const CANADA: &str = "http://www.geonames.org/6251999/";

    fn reader(fx: &Fixture) -> ListingReader<InMemoryAccountStore> {
        ListingReader::new(Arc::clone(fx.ledger.store()), &CatalogConfig::default())
    }

    fn uuids(hits: &[(Address, ListingRecord)]) -> BTreeSet<u128> {
        hits.iter().map(|(_, r)| r.fields.uuid.as_u128()).collect()
    }

    #[test]
    fn category_prefix_sits_at_category_offset() {
        let prefix = ListingQuery::category(STORE).to_prefix().unwrap();
        assert_eq!(prefix.offset, CATEGORY_OFFSET);
        assert_eq!(prefix.bytes, ContentAddresser::digest_str(STORE).to_le_bytes().to_vec());

        let prefix = ListingQuery::category(STORE).filter(USA).to_prefix().unwrap();
        assert_eq!(prefix.bytes.len(), 32);
        assert_eq!(prefix.offset + 16, FILTER_OFFSETS[0]);
    }

    #[test]
    fn catalog_scope_moves_prefix_back() {
        let prefix = ListingQuery::category(STORE)
            .in_catalog(CatalogId(3))
            .to_prefix()
            .unwrap();
        assert_eq!(prefix.offset, CATALOG_OFFSET);
        assert_eq!(&prefix.bytes[..8], &3u64.to_le_bytes());
    }

    #[test]
    fn more_than_three_filters_rejected() {
        let query = ListingQuery::category(STORE)
            .filter("a")
            .filter("b")
            .filter("c")
            .filter("d");
        assert_eq!(query.to_prefix(), Err(CodecError::TooManyFilters(4)));
    }

    #[test]
    fn scan_returns_exactly_one_category() {
        let fx = Fixture::new();
        for (uuid, category) in [(1, STORE), (2, BAKERY), (3, STORE), (4, EVENT), (5, BAKERY)] {
            fx.commit(&fx.message(uuid, category)).unwrap();
        }
        let reader = reader(&fx);
        assert_eq!(uuids(&reader.scan(&ListingQuery::category(STORE)).unwrap()), BTreeSet::from([1, 3]));
        assert_eq!(uuids(&reader.scan(&ListingQuery::category(BAKERY)).unwrap()), BTreeSet::from([2, 5]));
        assert_eq!(uuids(&reader.scan(&ListingQuery::category(EVENT)).unwrap()), BTreeSet::from([4]));
        assert!(reader.scan(&ListingQuery::category("https://schema.org/Park")).unwrap().is_empty());
    }

    #[test]
    fn filters_narrow_scan() {
        let fx = Fixture::new();
        fx.commit(&fx.message(1, STORE)).unwrap();
        let mut canadian = fx.message(2, STORE);
        canadian.fields.filter_by[0] = ContentAddresser::digest_str(CANADA);
        fx.commit(&canadian).unwrap();

        let reader = reader(&fx);
        let usa = reader.scan(&ListingQuery::category(STORE).filter(USA)).unwrap();
        assert_eq!(uuids(&usa), BTreeSet::from([1]));
        let ca = reader.scan(&ListingQuery::category(STORE).filter(CANADA)).unwrap();
        assert_eq!(uuids(&ca), BTreeSet::from([2]));
    }

    #[test]
    fn catalog_scoped_scan() {
        let fx = Fixture::new();
        fx.ledger
            .create_catalog(
                CatalogId(1),
                fx.signer.verifying_key().to_address(),
                fx.manager.verifying_key().to_address(),
            )
            .unwrap();
        fx.commit(&fx.message(1, STORE)).unwrap();
        let mut other = fx.message(2, STORE);
        other.fields.catalog_id = CatalogId(1);
        fx.commit(&other).unwrap();

        let reader = reader(&fx);
        assert_eq!(reader.scan(&ListingQuery::category(STORE)).unwrap().len(), 2);
        let scoped = reader
            .scan(&ListingQuery::category(STORE).in_catalog(CatalogId(1)))
            .unwrap();
        assert_eq!(uuids(&scoped), BTreeSet::from([2]));
    }

    #[test]
    fn non_listing_accounts_are_skipped() {
        let fx = Fixture::new();
        fx.commit(&fx.message(1, STORE)).unwrap();
        let mut foreign = vec![0u8; CATEGORY_OFFSET];
        foreign.extend_from_slice(&ContentAddresser::digest_str(STORE).to_le_bytes());
        fx.ledger.store().put(&Address::new([6; 32]), foreign).unwrap();

        let prefix = ListingQuery::category(STORE).to_prefix().unwrap();
        let raw = fx.ledger.store().scan_by_prefix(prefix.offset, &prefix.bytes).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(reader(&fx).scan(&ListingQuery::category(STORE)).unwrap().len(), 1);
    }

    #[test]
    fn view_resolves_text_and_labels() {
        let fx = Fixture::new();
        let committed = fx.commit(&fx.message(1, STORE)).unwrap();
        let reader = reader(&fx).with_directory(UriDirectory::from_pairs([
            (STORE, "Store"),
            (USA, "United States"),
        ]));
        let record = reader.get(&committed.address).unwrap();
        let view = reader.view(&committed.address, &record).unwrap();

        assert_eq!(view.url, "https://shop.example/l/00000000-0000-0000-0000-000000000001");
        assert_eq!(view.label, "Corner Shop");
        assert_eq!(view.detail_json().unwrap()["open"], "9-5");
        assert_eq!(view.category.unwrap().label, "Store");
        assert_eq!(view.locality.len(), 1);
        assert_eq!(view.locality[0].label, "United States");
        let coords = view.coordinates.unwrap();
        assert!((coords.latitude - 40.7128).abs() < 1e-6);
        assert!(view.attributes.contains(&crate::attributes::Attribute::InPerson));
        assert_eq!(view.update_count, 1);
        assert_eq!(view.updated_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn far_out_latitude_reads_as_unset() {
        let fx = Fixture::new();
        let mut message = fx.message(1, STORE);
        message.fields.latitude = 2_100_000_000;
        let committed = fx.commit(&message).unwrap();
        let reader = reader(&fx);
        let record = reader.get(&committed.address).unwrap();
        assert!(reader.view(&committed.address, &record).unwrap().coordinates.is_none());
    }

    #[test]
    fn get_missing_is_record_not_found() {
        let fx = Fixture::new();
        assert!(matches!(
            reader(&fx).get(&Address::new([8; 32])),
            Err(CatalogError::RecordNotFound { kind: "listing", .. })
        ));
    }

    #[test]
    fn search_combines_scan_and_view() {
        let fx = Fixture::new();
        fx.commit(&fx.message(1, STORE)).unwrap();
        fx.commit(&fx.message(2, EVENT)).unwrap();
        let views = reader(&fx).search(&ListingQuery::category(EVENT)).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].uuid, ListingId::from_u128(2));
        assert!(views[0].category.is_none());
    }

    #[test]
    fn search_skips_listing_with_foreign_url_account() {
        let fx = Fixture::new();
        fx.commit(&fx.message(1, STORE)).unwrap();

        // Written around the ledger, which refuses such a record.
        let mut fields = fx.message(2, STORE).fields;
        fields.detail_url = fx.ledger.deriver().catalog(CatalogId(0)).unwrap().address;
        let record = ListingRecord {
            fields,
            update_count: 1,
            update_ts: 0,
        };
        fx.ledger.store().put(&Address::new([7; 32]), record.encode()).unwrap();

        let reader = reader(&fx);
        assert_eq!(reader.scan(&ListingQuery::category(STORE)).unwrap().len(), 2);
        let views = reader.search(&ListingQuery::category(STORE)).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].uuid, ListingId::from_u128(1));
    }

    #[test]
    fn removed_listing_leaves_scans_and_reports_removed() {
        let fx = Fixture::new();
        let committed = fx.commit(&fx.message(1, STORE)).unwrap();
        fx.commit(&fx.message(2, STORE)).unwrap();
        fx.ledger
            .remove_listing(&RemovalInstruction::sign(&fx.manager, committed.address))
            .unwrap();

        let reader = reader(&fx);
        assert_eq!(uuids(&reader.scan(&ListingQuery::category(STORE)).unwrap()), BTreeSet::from([2]));
        assert!(matches!(
            reader.get(&committed.address),
            Err(CatalogError::ListingRemoved { .. })
        ));
    }
}
