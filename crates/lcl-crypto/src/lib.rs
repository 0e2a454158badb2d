//! Cryptographic primitives for the Listing Catalog Ledger.
//!
//! Provides the SHAKE128 content addresser, program-address style address
//! derivation, and Ed25519 signing/verification.
//!
//! All crypto operations wrap established libraries — no custom cryptography.

pub mod derive;
pub mod hasher;
pub mod signer;

pub use derive::{
    catalog_seeds, listing_seeds, url_entry_seeds, AddressDeriver, DeriveError, DerivedAddress,
    MAX_SEEDS, MAX_SEED_LEN,
};
pub use hasher::ContentAddresser;
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey, SIGNATURE_LEN};
