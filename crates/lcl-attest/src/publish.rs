//! The client side of attestation.
//!
//! `Draft → Signed → Verified → Committed`, or `Rejected` from any state.
//! Signing is retried on transient failures only. Once a message is
//! signed, the client checks it describes exactly the listing it asked
//! for before submitting it, and commits are retried a bounded number of
//! times. Authorization and integrity failures end the flow at once.
//!
//! Nothing reaches the store before the commit: URL entries are interned
//! by the writer in the same unit as the record.

use std::sync::Arc;

use lcl_catalog::{
    AttestedListing, CatalogConfig, CatalogError, CatalogWriter, Committed, ListingFields, ListingMessage,
    TextRef,
};
use lcl_crypto::AddressDeriver;
use lcl_types::{Address, CatalogId, ListingId};

use crate::config::AttestConfig;
use crate::error::{AttestError, AttestResult, PublishError, PublishState};
use crate::request::{ListingDraft, ListingRequest, SignedListing};
use crate::signer::ListingSigner;

/// A listing that reached the `Committed` state.
#[derive(Clone, Debug)]
pub struct Published {
    /// Always [`PublishState::Committed`].
    pub state: PublishState,
    pub committed: Committed,
    pub attested: AttestedListing,
    pub sign_attempts: u32,
    pub commit_attempts: u32,
}

/// Drives drafts through signing and the verified write path.
pub struct ListingPublisher<W: CatalogWriter, G: ListingSigner> {
    writer: Arc<W>,
    signer: G,
    deriver: AddressDeriver,
    config: AttestConfig,
}

impl<W: CatalogWriter, G: ListingSigner> ListingPublisher<W, G> {
    pub fn new(writer: Arc<W>, signer: G, catalog: &CatalogConfig, config: AttestConfig) -> Self {
        Self {
            writer,
            signer,
            deriver: catalog.deriver(),
            config,
        }
    }

    pub fn config(&self) -> &AttestConfig {
        &self.config
    }

    pub fn signer(&self) -> &G {
        &self.signer
    }

    /// Publish `draft` on behalf of `submitter`, who must be its owner.
    pub async fn publish(&self, submitter: &Address, draft: &ListingDraft) -> Result<Published, PublishError> {
        let request = draft
            .to_request()
            .map_err(|e| self.rejected(PublishState::Draft, e))?;

        let urls = request
            .url_addresses(&self.deriver)
            .map_err(|e| self.rejected(PublishState::Draft, CatalogError::from(e)))?;

        let (signed, sign_attempts) = self
            .request_signature(&request)
            .await
            .map_err(|e| self.rejected(PublishState::Draft, e))?;
        transition(PublishState::Draft, PublishState::Signed);
        let uuid = signed
            .listing_id()
            .map_err(|e| self.rejected(PublishState::Signed, e))?;
        let catalog_id = self.claimed_catalog(&signed, uuid)?;
        let address = self.deriver.listing(catalog_id, &uuid).ok().map(|d| d.address);

        let attested = self
            .check_signed(&request, signed, uuid, urls)
            .map_err(|e| {
                self.rejected(PublishState::Signed, e)
                    .with_listing(address, Some(uuid))
            })?;
        transition(PublishState::Signed, PublishState::Verified);

        let (committed, commit_attempts) = self
            .commit(submitter, &attested, request.texts())
            .await
            .map_err(|e| {
                self.rejected(PublishState::Verified, e)
                    .with_listing(address, Some(uuid))
            })?;
        transition(PublishState::Verified, PublishState::Committed);

        tracing::info!(
            address = %committed.address,
            uuid = %committed.uuid,
            outcome = ?committed.outcome,
            sign_attempts,
            commit_attempts,
            "listing published"
        );
        Ok(Published {
            state: PublishState::Committed,
            committed,
            attested,
            sign_attempts,
            commit_attempts,
        })
    }

    fn claimed_catalog(&self, signed: &SignedListing, uuid: ListingId) -> Result<CatalogId, PublishError> {
        signed.catalog_id().map_err(|e| {
            self.rejected(PublishState::Signed, e)
                .with_listing(None, Some(uuid))
        })
    }

    async fn request_signature(&self, request: &ListingRequest) -> AttestResult<(SignedListing, u32)> {
        let max = self.config.max_sign_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.signer.sign(request).await {
                Ok(signed) => return Ok((signed, attempt)),
                Err(e) if e.is_retryable() && attempt < max => {
                    tracing::warn!(attempt, max, error = %e, "signing failed, retrying");
                    tokio::time::sleep(self.config.backoff_for(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Decode the signed message and require it to match the request.
    fn check_signed(
        &self,
        request: &ListingRequest,
        signed: SignedListing,
        uuid: ListingId,
        urls: [Address; 3],
    ) -> AttestResult<AttestedListing> {
        let catalog_id = signed.catalog_id()?;
        let attested = signed.into_attested()?;
        let message = ListingMessage::decode(&attested.message)
            .map_err(|e| AttestError::MessageMismatch(format!("undecodable message: {e}")))?;

        if message.fields.uuid != uuid {
            return Err(AttestError::MessageMismatch(format!(
                "message uuid {} differs from response uuid {uuid}",
                message.fields.uuid
            )));
        }
        if message.fields.catalog_id != catalog_id {
            return Err(AttestError::MessageMismatch(format!(
                "message catalog {} differs from response catalog {catalog_id}",
                message.fields.catalog_id
            )));
        }
        let expected = request.fields(uuid, catalog_id, urls)?;
        if let Some(field) = first_difference(&expected, &message.fields) {
            return Err(AttestError::MessageMismatch(format!("field {field} differs")));
        }
        if message.fee_account != request.fee_account {
            return Err(AttestError::MessageMismatch("field fee_account differs".into()));
        }
        Ok(attested)
    }

    async fn commit(
        &self,
        submitter: &Address,
        attested: &AttestedListing,
        texts: [&TextRef; 3],
    ) -> AttestResult<(Committed, u32)> {
        let max = self.config.max_commit_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.writer.commit_with_texts(submitter, attested, texts) {
                Ok(committed) => return Ok((committed, attempt)),
                Err(e) if e.is_retryable() && attempt < max => {
                    tracing::warn!(attempt, max, error = %e, "commit failed, retrying");
                    tokio::time::sleep(self.config.backoff_for(attempt)).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "commit rejected");
                    return Err(e.into());
                }
            }
        }
    }

    fn rejected(&self, state: PublishState, source: impl Into<AttestError>) -> PublishError {
        let err = PublishError::new(state, source);
        tracing::warn!(
            from = %err.state,
            to = %PublishState::Rejected,
            error = %err.source,
            "listing rejected"
        );
        err
    }
}

fn transition(from: PublishState, to: PublishState) {
    tracing::debug!(%from, %to, "publish state");
}

fn first_difference(expected: &ListingFields, actual: &ListingFields) -> Option<&'static str> {
    let checks = [
        ("uuid", expected.uuid == actual.uuid),
        ("catalog_id", expected.catalog_id == actual.catalog_id),
        ("category", expected.category == actual.category),
        ("filter_by", expected.filter_by == actual.filter_by),
        ("attributes", expected.attributes == actual.attributes),
        ("latitude", expected.latitude == actual.latitude),
        ("longitude", expected.longitude == actual.longitude),
        ("owner", expected.owner == actual.owner),
        ("listing_url", expected.listing_url == actual.listing_url),
        ("label_url", expected.label_url == actual.label_url),
        ("detail_url", expected.detail_url == actual.detail_url),
    ];
    checks.into_iter().find(|(_, same)| !same).map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use lcl_catalog::{CatalogError, CatalogLedger, CommitOutcome};
    use lcl_crypto::SigningKey;
    use lcl_store::InMemoryAccountStore;

    use super::*;
    use crate::request::tests::draft;
    use crate::signer::LocalSigner;

    type Ledger = CatalogLedger<InMemoryAccountStore>;

    struct Setup {
        ledger: Arc<Ledger>,
        signer_key: SigningKey,
        owner: Address,
    }

    impl Setup {
        fn new() -> Self {
            let config = CatalogConfig::default();
            let ledger = Arc::new(CatalogLedger::new(Arc::new(InMemoryAccountStore::new()), &config));
            let signer_key = SigningKey::generate();
            ledger
                .create_catalog(
                    CatalogId(7),
                    signer_key.verifying_key().to_address(),
                    SigningKey::generate().verifying_key().to_address(),
                )
                .unwrap();
            Self {
                ledger,
                signer_key,
                owner: draft().owner,
            }
        }

        fn local(&self) -> LocalSigner {
            LocalSigner::new(AddressDeriver::default()).with_catalog("main", CatalogId(7), self.signer_key.clone())
        }

        fn publisher<G: ListingSigner>(&self, signer: G) -> ListingPublisher<Ledger, G> {
            let config = AttestConfig {
                backoff: Duration::from_millis(1),
                ..Default::default()
            };
            ListingPublisher::new(Arc::clone(&self.ledger), signer, &CatalogConfig::default(), config)
        }
    }

    /// Fails with a retryable error a fixed number of times.
    struct Flaky<G> {
        inner: G,
        failures: AtomicU32,
        calls: AtomicU32,
    }

    impl<G> Flaky<G> {
        fn new(inner: G, failures: u32) -> Self {
            Self {
                inner,
                failures: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl<G: ListingSigner> ListingSigner for Flaky<G> {
        async fn sign(&self, request: &ListingRequest) -> AttestResult<SignedListing> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(AttestError::unavailable("connection reset", true));
            }
            self.inner.sign(request).await
        }
    }

    /// Signs a request other than the one it was given.
    struct Tampering {
        inner: LocalSigner,
        tamper: fn(&mut ListingRequest),
    }

    #[async_trait]
    impl ListingSigner for Tampering {
        async fn sign(&self, request: &ListingRequest) -> AttestResult<SignedListing> {
            let mut altered = request.clone();
            (self.tamper)(&mut altered);
            self.inner.sign(&altered).await
        }
    }

    #[tokio::test]
    async fn publishes_and_commits() {
        let setup = Setup::new();
        let publisher = setup.publisher(setup.local());
        let published = publisher.publish(&setup.owner, &draft()).await.unwrap();

        assert_eq!(published.state, PublishState::Committed);
        assert_eq!(published.committed.outcome, CommitOutcome::Created);
        assert_eq!(published.committed.catalog_id, CatalogId(7));
        assert_eq!(published.sign_attempts, 1);
        assert_eq!(published.commit_attempts, 1);

        let record = setup.ledger.listing(&published.committed.address).unwrap();
        assert_eq!(record.fields.owner, setup.owner);
        assert_eq!(record.update_count, 1);
    }

    #[tokio::test]
    async fn retries_transient_signer_failures() {
        let setup = Setup::new();
        let publisher = setup.publisher(Flaky::new(setup.local(), 2));
        let published = publisher.publish(&setup.owner, &draft()).await.unwrap();
        assert_eq!(published.sign_attempts, 3);
        assert_eq!(publisher.signer().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_sign_attempts() {
        let setup = Setup::new();
        let publisher = setup.publisher(Flaky::new(setup.local(), 10));
        let err = publisher.publish(&setup.owner, &draft()).await.unwrap_err();
        assert_eq!(err.state, PublishState::Draft);
        assert!(err.is_retryable());
        assert_eq!(publisher.signer().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn signer_rejection_is_not_retried() {
        let setup = Setup::new();
        let mut d = draft();
        d.catalog = "unknown".into();
        let publisher = setup.publisher(Flaky::new(setup.local(), 0));
        let err = publisher.publish(&setup.owner, &d).await.unwrap_err();
        assert!(matches!(err.source, AttestError::SignerRejected(_)));
        assert_eq!(publisher.signer().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_signing_leaves_store_untouched() {
        let setup = Setup::new();
        let before = setup.ledger.store().len();

        let mut d = draft();
        d.catalog = "unknown".into();
        let err = setup.publisher(setup.local()).publish(&setup.owner, &d).await.unwrap_err();
        assert!(matches!(err.source, AttestError::SignerRejected(_)));
        assert_eq!(setup.ledger.store().len(), before);

        let err = setup
            .publisher(Flaky::new(setup.local(), 10))
            .publish(&setup.owner, &draft())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(setup.ledger.store().len(), before);
    }

    #[tokio::test]
    async fn tampered_message_is_refused_before_commit() {
        let setup = Setup::new();
        let publisher = setup.publisher(Tampering {
            inner: setup.local(),
            tamper: |r| r.category = "https://schema.org/Casino".into(),
        });
        let err = publisher.publish(&setup.owner, &draft()).await.unwrap_err();

        assert_eq!(err.state, PublishState::Signed);
        assert!(err.uuid.is_some());
        assert!(err.address.is_some());
        match &err.source {
            AttestError::MessageMismatch(reason) => assert!(reason.contains("category")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(setup.ledger.store().len(), 1, "only the catalog exists");
    }

    #[tokio::test]
    async fn unregistered_signer_fails_closed() {
        let setup = Setup::new();
        let rogue = LocalSigner::new(AddressDeriver::default()).with_catalog("main", CatalogId(7), SigningKey::generate());
        let publisher = setup.publisher(rogue);
        let err = publisher.publish(&setup.owner, &draft()).await.unwrap_err();

        assert_eq!(err.state, PublishState::Verified);
        assert!(matches!(
            err.source,
            AttestError::Catalog(CatalogError::UnauthorizedSigner { .. })
        ));
        assert!(!err.is_retryable());
        let address = err.address.unwrap();
        assert!(setup.ledger.listing(&address).is_err());
        assert_eq!(setup.ledger.store().len(), 1, "no url entries were interned");
    }

    #[tokio::test]
    async fn submitter_must_own_listing() {
        let setup = Setup::new();
        let publisher = setup.publisher(setup.local());
        let err = publisher
            .publish(&Address::new([8; 32]), &draft())
            .await
            .unwrap_err();
        assert!(matches!(
            err.source,
            AttestError::Catalog(CatalogError::OwnerMismatch { .. })
        ));
        assert_eq!(err.state, PublishState::Verified);
    }

    #[tokio::test]
    async fn invalid_draft_rejected_in_draft_state() {
        let setup = Setup::new();
        let mut d = draft();
        d.filter_by = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        let err = setup.publisher(setup.local()).publish(&setup.owner, &d).await.unwrap_err();
        assert_eq!(err.state, PublishState::Draft);
        assert!(matches!(err.source, AttestError::Invalid(_)));
    }

    #[test]
    fn first_difference_names_field() {
        let request = draft().to_request().unwrap();
        let urls = request.url_addresses(&AddressDeriver::default()).unwrap();
        let a = request.fields(ListingId::from_u128(1), CatalogId(7), urls).unwrap();
        let mut b = a.clone();
        assert_eq!(first_difference(&a, &b), None);
        b.longitude += 1;
        assert_eq!(first_difference(&a, &b), Some("longitude"));
    }
}
