use lcl_crypto::DeriveError;
use lcl_types::Address;

/// Errors from account store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested account was not found.
    #[error("account not found: {0}")]
    NotFound(Address),

    /// Address derivation failed while locating an account.
    #[error("address derivation failed: {0}")]
    Derivation(#[from] DeriveError),

    /// Account data was rejected by the backend.
    #[error("invalid data for {address}: {reason}")]
    InvalidData { address: Address, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend is read-only or otherwise unavailable.
    #[error("store is read-only")]
    ReadOnly,
}

impl StoreError {
    /// Whether the same operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
