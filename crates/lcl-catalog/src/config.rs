use lcl_crypto::AddressDeriver;
use lcl_types::Address;
use serde::{Deserialize, Serialize};

/// Default bound on interned text, in bytes.
pub const DEFAULT_MAX_TEXT_LEN: usize = 8192;

/// Settings shared by every catalog component.
///
/// Passed to constructors explicitly; nothing reads process-wide state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Namespace all addresses are derived in.
    pub program_id: Address,
    /// Largest URL-entry content accepted by `intern`.
    pub max_text_len: usize,
}

impl CatalogConfig {
    pub fn deriver(&self) -> AddressDeriver {
        AddressDeriver::new(self.program_id)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            program_id: AddressDeriver::default_program_id(),
            max_text_len: DEFAULT_MAX_TEXT_LEN,
        }
    }
}
