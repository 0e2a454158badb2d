use lcl_crypto::DeriveError;
use lcl_store::StoreError;
use lcl_types::{Address, CatalogId, ListingId, TypeError};

use crate::attributes::AttributeError;

/// Failures decoding or encoding fixed-layout account data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("{kind}: expected {expected} bytes, found {actual}")]
    WrongLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{kind}: bad magic {found:02x?}")]
    BadMagic { kind: &'static str, found: [u8; 4] },

    #[error("{kind}: unsupported schema version {version}")]
    UnsupportedVersion { kind: &'static str, version: u8 },

    #[error(transparent)]
    Attributes(#[from] AttributeError),

    #[error("unknown expand mode {0}")]
    UnknownExpandMode(u8),

    #[error("invalid text: {0}")]
    InvalidText(String),

    #[error("text of {len} bytes exceeds limit of {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("invalid coordinate {value}: must be within ±{limit} degrees")]
    InvalidCoordinate { value: f64, limit: f64 },

    #[error("at most 3 locality filters are supported, got {0}")]
    TooManyFilters(usize),

    #[error("invalid field: {0}")]
    InvalidField(#[from] TypeError),
}

/// Errors produced by catalog ledger operations.
///
/// Variants that concern a single listing carry its derived address and
/// uuid so a failure can be diagnosed without re-deriving anything.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("address derivation failed: {0}")]
    Derivation(#[from] DeriveError),

    #[error("{kind} not found at {address}")]
    RecordNotFound { kind: &'static str, address: Address },

    #[error("catalog {catalog} already exists at {address}")]
    CatalogExists { catalog: CatalogId, address: Address },

    #[error("signature by {signer} does not verify")]
    InvalidSignature { signer: Address },

    #[error("{signer} is not the signer authority of catalog {catalog} (listing {uuid} at {address})")]
    UnauthorizedSigner {
        catalog: CatalogId,
        signer: Address,
        address: Address,
        uuid: ListingId,
    },

    #[error("{manager} is not the manager authority of catalog {catalog} (listing at {address})")]
    UnauthorizedManager {
        catalog: CatalogId,
        manager: Address,
        address: Address,
    },

    #[error("listing {uuid} at {address} is owned by {owner}, not {submitter}")]
    OwnerMismatch {
        address: Address,
        uuid: ListingId,
        owner: Address,
        submitter: Address,
    },

    #[error("{field} entry {url} is missing (listing {uuid} at {address})")]
    MissingUrlEntry {
        field: &'static str,
        url: Address,
        address: Address,
        uuid: ListingId,
    },

    #[error("{field} account {url} is not a usable url entry: {reason} (listing {uuid} at {address})")]
    InvalidUrlEntry {
        field: &'static str,
        url: Address,
        address: Address,
        uuid: ListingId,
        reason: String,
    },

    #[error("listing {uuid} at {address} was removed by its catalog manager")]
    ListingRemoved { address: Address, uuid: ListingId },

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl CatalogError {
    /// Whether retrying the same call could succeed.
    ///
    /// Only transient store failures qualify. Authorization and integrity
    /// failures are final for the given inputs.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            _ => false,
        }
    }

    /// The listing address this error refers to, when known.
    pub fn address(&self) -> Option<Address> {
        match self {
            Self::RecordNotFound { address, .. }
            | Self::CatalogExists { address, .. }
            | Self::UnauthorizedSigner { address, .. }
            | Self::UnauthorizedManager { address, .. }
            | Self::OwnerMismatch { address, .. }
            | Self::MissingUrlEntry { address, .. }
            | Self::InvalidUrlEntry { address, .. }
            | Self::ListingRemoved { address, .. } => Some(*address),
            _ => None,
        }
    }

    /// The listing uuid this error refers to, when known.
    pub fn uuid(&self) -> Option<ListingId> {
        match self {
            Self::UnauthorizedSigner { uuid, .. }
            | Self::OwnerMismatch { uuid, .. }
            | Self::MissingUrlEntry { uuid, .. }
            | Self::InvalidUrlEntry { uuid, .. }
            | Self::ListingRemoved { uuid, .. } => Some(*uuid),
            _ => None,
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
