//! Address-keyed account storage for the Listing Catalog Ledger.
//!
//! The store stands in for the ledger's account space: every catalog,
//! listing, and URL entry lives at a deterministic [`Address`] and holds raw
//! bytes the store never interprets.
//!
//! # Storage Backends
//!
//! All backends implement the [`AccountStore`] trait:
//!
//! - [`InMemoryAccountStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Every call is atomic; there is no partially written account.
//! 2. Creation races are settled by `create_with`, never by callers.
//! 3. Prefix scans compare raw bytes at a fixed offset; there is no index.
//! 4. Scans are snapshots: no isolation across calls is promised.
//! 5. All I/O errors are propagated, never silently ignored.
//!
//! [`Address`]: lcl_types::Address

pub mod error;
pub mod find;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use find::{find_or_create, FoundOrCreated};
pub use memory::InMemoryAccountStore;
pub use traits::{matches_at, AccountInit, AccountStore};
