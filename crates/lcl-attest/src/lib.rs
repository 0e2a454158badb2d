//! Off-path attestation for the Listing Catalog Ledger.
//!
//! Listings reach the ledger in two steps. A signer service, which holds
//! a catalog's signing key, turns a [`ListingRequest`] into a signed
//! canonical message. The ledger then verifies that message and writes
//! the record. This crate provides the signer side ([`LocalSigner`],
//! [`HttpSigner`]) and the client state machine ([`ListingPublisher`]).

pub mod config;
pub mod error;
pub mod http;
pub mod publish;
pub mod request;
pub mod signer;

pub use config::AttestConfig;
pub use error::{AttestError, AttestResult, PublishError, PublishState};
pub use http::HttpSigner;
pub use publish::{ListingPublisher, Published};
pub use request::{ListingDraft, ListingRequest, SignedListing};
pub use signer::{CatalogKey, ListingSigner, LocalSigner};
