//! Listing records and the verified write path for the Listing Catalog
//! Ledger (LCL).
//!
//! This crate is the heart of LCL. It provides:
//! - Versioned attribute bitsets and the fixed-width listing record layout
//! - Interned URL entries with find-or-create semantics
//! - The canonical signed listing message and removal instruction
//! - `CatalogLedger`, which verifies attested listings and writes records
//! - `ListingReader`, which finds records by raw prefix scans
//! - `UriDirectory` for turning category/locality digests back into labels

pub mod attributes;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod coords;
pub mod directory;
pub mod error;
mod layout;
pub mod ledger;
pub mod message;
pub mod query;
pub mod record;
pub mod tombstone;
pub mod traits;
pub mod url;

pub use attributes::{Attribute, AttributeError, AttributeSet, AttributeTable, Attributes};
pub use catalog::Catalog;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::CatalogConfig;
pub use coords::{Coordinates, COORDINATE_UNSET};
pub use directory::{UriDirectory, UriEntry};
pub use error::{CatalogError, CatalogResult, CodecError};
pub use ledger::{CatalogLedger, CommitOutcome, Committed};
pub use message::{AttestedListing, ListingMessage, RemovalInstruction};
pub use query::{ListingQuery, ListingReader, ListingView, ScanPrefix};
pub use record::{ListingFields, ListingRecord, RECORD_LEN};
pub use tombstone::Tombstone;
pub use traits::CatalogWriter;
pub use url::{TextRef, UrlEntry, UrlEntryStore};
