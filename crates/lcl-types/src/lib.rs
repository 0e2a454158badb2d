//! Foundation types for the Listing Catalog Ledger (LCL).
//!
//! Every other LCL crate depends on `lcl-types`.
//!
//! # Key Types
//!
//! - [`Digest`] — 128-bit content digest, used as filter key and address seed
//! - [`Address`] — 32-byte store location or public identity
//! - [`ListingId`] — UUID of a listing within its catalog
//! - [`CatalogId`] — 64-bit catalog (tenant) identifier
//! - [`ExpandMode`] — how a URL entry's stored text is turned back into text

pub mod address;
pub mod digest;
pub mod error;
pub mod expand;
pub mod listing;

pub use address::{Address, ADDRESS_LEN};
pub use digest::{Digest, DIGEST_LEN};
pub use error::TypeError;
pub use expand::ExpandMode;
pub use listing::{CatalogId, ListingId};
