use std::fmt;

use lcl_catalog::{CatalogError, CodecError};
use lcl_types::{Address, ListingId};

/// Errors from signing and publishing listings.
#[derive(Debug, thiserror::Error)]
pub enum AttestError {
    /// The signer could not be reached or answered with something other
    /// than a signed listing.
    #[error("signer unavailable: {message}")]
    SignerUnavailable { message: String, retryable: bool },

    /// The signer refused the request.
    #[error("signer rejected listing: {0}")]
    SignerRejected(String),

    /// The signed message does not describe the listing that was asked for.
    #[error("signed message does not match request: {0}")]
    MessageMismatch(String),

    #[error("invalid listing: {0}")]
    Invalid(#[from] CodecError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AttestError {
    pub fn unavailable(message: impl Into<String>, retryable: bool) -> Self {
        Self::SignerUnavailable {
            message: message.into(),
            retryable,
        }
    }

    /// Whether the same request may succeed if reissued.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SignerUnavailable { retryable, .. } => *retryable,
            Self::Catalog(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type AttestResult<T> = Result<T, AttestError>;

/// Where a publish attempt stood.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishState {
    Draft,
    Signed,
    Verified,
    Committed,
    Rejected,
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Draft => "draft",
            Self::Signed => "signed",
            Self::Verified => "verified",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// A failed publish: the last state reached, the listing's address and
/// uuid once known, and the cause.
#[derive(Debug, thiserror::Error)]
#[error("publish failed in {state} state{}: {source}", listing_context(.address, .uuid))]
pub struct PublishError {
    pub state: PublishState,
    pub address: Option<Address>,
    pub uuid: Option<ListingId>,
    #[source]
    pub source: AttestError,
}

impl PublishError {
    pub fn new(state: PublishState, source: impl Into<AttestError>) -> Self {
        let source = source.into();
        let (address, uuid) = match &source {
            AttestError::Catalog(e) => (e.address(), e.uuid()),
            _ => (None, None),
        };
        Self {
            state,
            address,
            uuid,
            source,
        }
    }

    pub fn with_listing(mut self, address: Option<Address>, uuid: Option<ListingId>) -> Self {
        self.address = self.address.or(address);
        self.uuid = self.uuid.or(uuid);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }
}

fn listing_context(address: &Option<Address>, uuid: &Option<ListingId>) -> String {
    match (address, uuid) {
        (Some(address), Some(uuid)) => format!(" (listing {uuid} at {address})"),
        (Some(address), None) => format!(" (listing at {address})"),
        (None, Some(uuid)) => format!(" (listing {uuid})"),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcl_types::CatalogId;

    #[test]
    fn retryability() {
        assert!(AttestError::unavailable("timeout", true).is_retryable());
        assert!(!AttestError::unavailable("404", false).is_retryable());
        assert!(!AttestError::SignerRejected("unknown catalog".into()).is_retryable());
        assert!(!AttestError::MessageMismatch("owner".into()).is_retryable());
    }

    #[test]
    fn publish_error_carries_listing_identity() {
        let address = Address::new([3; 32]);
        let uuid = ListingId::from_u128(77);
        let cause = CatalogError::UnauthorizedSigner {
            catalog: CatalogId(1),
            signer: Address::new([4; 32]),
            address,
            uuid,
        };
        let err = PublishError::new(PublishState::Verified, cause);
        assert_eq!(err.address, Some(address));
        assert_eq!(err.uuid, Some(uuid));
        assert!(!err.is_retryable());
        let text = err.to_string();
        assert!(text.contains("verified"));
        assert!(text.contains(&address.to_string()));
        assert!(text.contains(&uuid.to_string()));
    }

    #[test]
    fn context_is_filled_without_overwriting() {
        let err = PublishError::new(PublishState::Signed, AttestError::MessageMismatch("owner".into()))
            .with_listing(None, Some(ListingId::from_u128(5)));
        assert_eq!(err.uuid, Some(ListingId::from_u128(5)));
        assert!(err.address.is_none());
    }
}
