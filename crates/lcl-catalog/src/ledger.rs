use std::sync::{Arc, Mutex};

use lcl_crypto::{catalog_seeds, AddressDeriver, SigningKey};
use lcl_store::{find_or_create, AccountStore, FoundOrCreated};
use lcl_types::{Address, CatalogId, ListingId};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::clock::{Clock, SystemClock};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::message::{AttestedListing, ListingMessage, RemovalInstruction};
use crate::record::{ListingFields, ListingRecord};
use crate::tombstone::Tombstone;
use crate::traits::CatalogWriter;
use crate::url::{TextRef, UrlEntry, UrlEntryStore};

/// What a commit did to the stored record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    Created,
    Updated,
    /// The stored record already held exactly these fields.
    Unchanged,
}

/// Result of a successful commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Committed {
    pub address: Address,
    pub uuid: ListingId,
    pub catalog_id: CatalogId,
    pub outcome: CommitOutcome,
    pub update_count: u64,
}

/// The on-path verifier and writer.
///
/// Every mutation runs under one write lock, so the checks a commit makes
/// and the write it performs are a single atomic unit with respect to
/// other commits and removals through this ledger.
pub struct CatalogLedger<S: AccountStore> {
    store: Arc<S>,
    deriver: AddressDeriver,
    urls: UrlEntryStore<S>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl<S: AccountStore> CatalogLedger<S> {
    pub fn new(store: Arc<S>, config: &CatalogConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, config: &CatalogConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            urls: UrlEntryStore::new(Arc::clone(&store), config),
            deriver: config.deriver(),
            store,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    pub fn urls(&self) -> &UrlEntryStore<S> {
        &self.urls
    }

    /// Create a catalog account. Each id can be created once.
    pub fn create_catalog(
        &self,
        catalog_id: CatalogId,
        signer_authority: Address,
        manager_authority: Address,
    ) -> CatalogResult<Address> {
        let catalog = Catalog {
            catalog_id,
            signer_authority,
            manager_authority,
        };
        let found = find_or_create(
            self.store.as_ref(),
            &self.deriver,
            &catalog_seeds(catalog_id),
            || catalog.encode(),
        )?;
        if !found.created {
            return Err(CatalogError::CatalogExists {
                catalog: catalog_id,
                address: found.address,
            });
        }
        tracing::info!(catalog = %catalog_id, address = %found.address, signer = %signer_authority, "created catalog");
        Ok(found.address)
    }

    pub fn catalog(&self, catalog_id: CatalogId) -> CatalogResult<Catalog> {
        let address = self.deriver.catalog(catalog_id)?.address;
        let data = self.store.get(&address)?.ok_or(CatalogError::RecordNotFound {
            kind: "catalog",
            address,
        })?;
        Ok(Catalog::decode(&data)?)
    }

    pub fn listing_address(&self, catalog_id: CatalogId, uuid: &ListingId) -> CatalogResult<Address> {
        Ok(self.deriver.listing(catalog_id, uuid)?.address)
    }

    /// The record at `address`. A removed listing reports `ListingRemoved`.
    pub fn listing(&self, address: &Address) -> CatalogResult<ListingRecord> {
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

    /// Trusted-writer path: sign `message` locally, then commit it through
    /// the same verification as any attested listing.
    pub fn write_listing(
        &self,
        signer: &SigningKey,
        submitter: &Address,
        message: &ListingMessage,
    ) -> CatalogResult<Committed> {
        self.commit_attested(submitter, &AttestedListing::sign(signer, message))
    }

    fn lock(&self) -> CatalogResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| CatalogError::LockPoisoned)
    }

    fn commit_locked(
        &self,
        submitter: &Address,
        attested: &AttestedListing,
        texts: Option<[&TextRef; 3]>,
    ) -> CatalogResult<Committed> {
        let signer = attested.signer.to_address();
        attested
            .verify()
            .map_err(|_| CatalogError::InvalidSignature { signer })?;

        let message = ListingMessage::decode(&attested.message)?;
        let fields = message.fields;
        let uuid = fields.uuid;
        let catalog_id = fields.catalog_id;
        let address = self.listing_address(catalog_id, &uuid)?;

        let catalog = self.catalog(catalog_id)?;
        if signer != catalog.signer_authority {
            return Err(CatalogError::UnauthorizedSigner {
                catalog: catalog_id,
                signer,
                address,
                uuid,
            });
        }
        if *submitter != fields.owner {
            return Err(CatalogError::OwnerMismatch {
                address,
                uuid,
                owner: fields.owner,
                submitter: *submitter,
            });
        }
        let existing = self.store.get(&address)?;
        if let Some(data) = existing.as_deref() {
            self.existing_record(&address, data, &fields)?;
        }
        if let Some(texts) = texts {
            self.intern_texts(&fields, texts, address)?;
        }
        for (field, url) in url_fields(&fields) {
            self.check_url_entry(field, url, address, uuid)?;
        }

        let now = self.clock.now();
        let (outcome, update_count) = match existing {
            Some(existing) => self.overwrite(&address, &existing, &fields, now)?,
            None => {
                let record = ListingRecord {
                    fields: fields.clone(),
                    update_count: 1,
                    update_ts: now,
                };
                if self.store.create_if_absent(&address, record.encode())? {
                    (CommitOutcome::Created, 1)
                } else {
                    // Created outside this ledger between the probe and the create.
                    let existing = self.store.get(&address)?.ok_or(CatalogError::RecordNotFound {
                        kind: "listing",
                        address,
                    })?;
                    self.overwrite(&address, &existing, &fields, now)?
                }
            }
        };

        Ok(Committed {
            address,
            uuid,
            catalog_id,
            outcome,
            update_count,
        })
    }

    /// Intern the texts behind the message's URL fields. Every text must
    /// derive to the address the message names before anything is written.
    fn intern_texts(&self, fields: &ListingFields, texts: [&TextRef; 3], address: Address) -> CatalogResult<()> {
        for ((field, url), text) in url_fields(fields).into_iter().zip(texts) {
            self.urls.check_len(text)?;
            let derived = self.urls.address_of(text)?.address;
            if derived != url {
                return Err(CatalogError::InvalidUrlEntry {
                    field,
                    url,
                    address,
                    uuid: fields.uuid,
                    reason: format!("submitted text derives to {derived}"),
                });
            }
        }
        for text in texts {
            self.urls.intern(text)?;
        }
        Ok(())
    }

    /// The account at `url` must be a URL entry that expands for `uuid`.
    fn check_url_entry(&self, field: &'static str, url: Address, address: Address, uuid: ListingId) -> CatalogResult<()> {
        let data = self.store.get(&url)?.ok_or(CatalogError::MissingUrlEntry {
            field,
            url,
            address,
            uuid,
        })?;
        UrlEntry::decode(&data)
            .and_then(|entry| entry.expand(&uuid))
            .map(drop)
            .map_err(|e| CatalogError::InvalidUrlEntry {
                field,
                url,
                address,
                uuid,
                reason: e.to_string(),
            })
    }

    /// The record already at `address`, provided `fields` may replace it.
    fn existing_record(&self, address: &Address, data: &[u8], fields: &ListingFields) -> CatalogResult<ListingRecord> {
        if Tombstone::is_tombstone(data) {
            return Err(CatalogError::ListingRemoved {
                address: *address,
                uuid: fields.uuid,
            });
        }
        let existing = ListingRecord::decode(data)?;
        if existing.fields.owner != fields.owner {
            return Err(CatalogError::OwnerMismatch {
                address: *address,
                uuid: fields.uuid,
                owner: existing.fields.owner,
                submitter: fields.owner,
            });
        }
        Ok(existing)
    }

    fn overwrite(
        &self,
        address: &Address,
        existing: &[u8],
        fields: &ListingFields,
        now: i64,
    ) -> CatalogResult<(CommitOutcome, u64)> {
        let existing = self.existing_record(address, existing, fields)?;
        if existing.fields == *fields {
            return Ok((CommitOutcome::Unchanged, existing.update_count));
        }
        let update_count = existing.update_count.saturating_add(1);
        let record = ListingRecord {
            fields: fields.clone(),
            update_count,
            update_ts: now,
        };
        self.store.put(address, record.encode())?;
        Ok((CommitOutcome::Updated, update_count))
    }

    fn remove_locked(&self, instruction: &RemovalInstruction) -> CatalogResult<ListingRecord> {
        let manager = instruction.manager.to_address();
        instruction
            .verify()
            .map_err(|_| CatalogError::InvalidSignature { signer: manager })?;

        let address = instruction.listing;
        let record = self.listing(&address)?;
        let catalog_id = record.fields.catalog_id;
        let catalog = self.catalog(catalog_id)?;
        if manager != catalog.manager_authority {
            return Err(CatalogError::UnauthorizedManager {
                catalog: catalog_id,
                manager,
                address,
            });
        }
        let tombstone = Tombstone {
            uuid: record.fields.uuid,
            catalog_id,
            removed_by: manager,
            removed_ts: self.clock.now(),
        };
        self.store.put(&address, tombstone.encode())?;
        Ok(record)
    }

    fn commit_logged(
        &self,
        submitter: &Address,
        attested: &AttestedListing,
        texts: Option<[&TextRef; 3]>,
    ) -> CatalogResult<Committed> {
        let _guard = self.lock()?;
        match self.commit_locked(submitter, attested, texts) {
            Ok(committed) => {
                tracing::info!(
                    address = %committed.address,
                    uuid = %committed.uuid,
                    catalog = %committed.catalog_id,
                    outcome = ?committed.outcome,
                    update_count = committed.update_count,
                    "committed listing"
                );
                Ok(committed)
            }
            Err(e) => {
                tracing::warn!(
                    address = ?e.address(),
                    uuid = ?e.uuid(),
                    error = %e,
                    "rejected listing commit"
                );
                Err(e)
            }
        }
    }
}

fn url_fields(fields: &ListingFields) -> [(&'static str, Address); 3] {
    [
        ("listing_url", fields.listing_url),
        ("label_url", fields.label_url),
        ("detail_url", fields.detail_url),
    ]
}

impl<S: AccountStore> CatalogWriter for CatalogLedger<S> {
    fn intern(&self, text: &TextRef) -> CatalogResult<FoundOrCreated> {
        self.urls.intern(text)
    }

    fn commit_attested(&self, submitter: &Address, attested: &AttestedListing) -> CatalogResult<Committed> {
        self.commit_logged(submitter, attested, None)
    }

    fn commit_with_texts(
        &self,
        submitter: &Address,
        attested: &AttestedListing,
        texts: [&TextRef; 3],
    ) -> CatalogResult<Committed> {
        self.commit_logged(submitter, attested, Some(texts))
    }

    fn remove_listing(&self, instruction: &RemovalInstruction) -> CatalogResult<ListingRecord> {
        let _guard = self.lock()?;
        let record = self.remove_locked(instruction).inspect_err(|e| {
            tracing::warn!(address = %instruction.listing, error = %e, "rejected listing removal");
        })?;
        // URL entries are shared and never reference-counted, so they stay.
        tracing::info!(
            address = %instruction.listing,
            uuid = %record.fields.uuid,
            retained_url_entries = 3,
            "removed listing"
        );
        Ok(record)
    }
}
