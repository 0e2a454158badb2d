//! Signer service for the Listing Catalog Ledger.
//!
//! Holds catalog signing keys and turns listing requests into signed
//! canonical messages. It never writes to the ledger; clients submit the
//! signed message themselves.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{CatalogSecret, SignerServiceConfig};
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::SignerServer;
