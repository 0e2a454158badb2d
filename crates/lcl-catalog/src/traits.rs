use lcl_store::FoundOrCreated;
use lcl_types::Address;

use crate::error::CatalogResult;
use crate::ledger::Committed;
use crate::message::{AttestedListing, RemovalInstruction};
use crate::record::ListingRecord;
use crate::url::TextRef;

/// Write boundary of the catalog: the operations a client submits.
pub trait CatalogWriter: Send + Sync {
    /// Find-or-create the URL entry for `text`.
    fn intern(&self, text: &TextRef) -> CatalogResult<FoundOrCreated>;

    /// Verify an attested listing message and write its record.
    fn commit_attested(&self, submitter: &Address, attested: &AttestedListing) -> CatalogResult<Committed>;

    /// Intern `texts` (listing, label, detail) and commit as one unit.
    ///
    /// Nothing is written unless the message passes every authorization
    /// check and each text derives to the URL address the message names.
    fn commit_with_texts(
        &self,
        submitter: &Address,
        attested: &AttestedListing,
        texts: [&TextRef; 3],
    ) -> CatalogResult<Committed>;

    /// Remove a listing on a manager's signed instruction.
    fn remove_listing(&self, instruction: &RemovalInstruction) -> CatalogResult<ListingRecord>;
}
