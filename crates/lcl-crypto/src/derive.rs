use curve25519_dalek::edwards::CompressedEdwardsY;
use lcl_types::{Address, CatalogId, Digest, ExpandMode, ListingId};
use sha2::{Digest as _, Sha256};

/// Maximum number of seeds accepted by [`AddressDeriver::derive`].
pub const MAX_SEEDS: usize = 16;
/// Maximum length of a single seed in bytes.
pub const MAX_SEED_LEN: usize = 32;

const DERIVATION_MARKER: &[u8] = b"ProgramDerivedAddress";
const DEFAULT_PROGRAM_LABEL: &[u8] = b"lcl-catalog-program-v1";

/// An address together with the variant index (bump) that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: Address,
    pub bump: u8,
}

/// Deterministic seed-to-address mapping inside one program namespace.
///
/// Candidates are `SHA-256(seeds ‖ [bump] ‖ program_id ‖ marker)` for bump
/// 255 down to 0. A candidate that decompresses to an Ed25519 point is
/// skipped, so a derived address can never be a key someone holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: Address,
}

impl AddressDeriver {
    pub fn new(program_id: Address) -> Self {
        Self { program_id }
    }

    /// The program id used when none is configured.
    pub fn default_program_id() -> Address {
        Address::new(Sha256::digest(DEFAULT_PROGRAM_LABEL).into())
    }

    pub fn program_id(&self) -> &Address {
        &self.program_id
    }

    /// Derive the address for `seeds`, searching bumps from 255 downwards.
    pub fn derive<S: AsRef<[u8]>>(&self, seeds: &[S]) -> Result<DerivedAddress, DeriveError> {
        check_seeds(seeds)?;
        for bump in (0..=u8::MAX).rev() {
            let candidate = self.candidate(seeds, bump);
            if !is_on_curve(&candidate) {
                tracing::trace!(bump, address = %Address::new(candidate), "derived address");
                return Ok(DerivedAddress {
                    address: Address::new(candidate),
                    bump,
                });
            }
        }
        Err(DeriveError::Exhausted { seeds: seeds.len() })
    }

    /// Recompute the address for a known bump, rejecting on-curve results.
    pub fn with_bump<S: AsRef<[u8]>>(&self, seeds: &[S], bump: u8) -> Result<Address, DeriveError> {
        check_seeds(seeds)?;
        let candidate = self.candidate(seeds, bump);
        if is_on_curve(&candidate) {
            return Err(DeriveError::OnCurve { bump });
        }
        Ok(Address::new(candidate))
    }

    /// Address of a listing record.
    pub fn listing(&self, catalog: CatalogId, id: &ListingId) -> Result<DerivedAddress, DeriveError> {
        self.derive(&listing_seeds(catalog, id))
    }

    /// Address of an interned URL entry.
    pub fn url_entry(&self, mode: ExpandMode, digest: &Digest) -> Result<DerivedAddress, DeriveError> {
        self.derive(&url_entry_seeds(mode, digest))
    }

    /// Address of a catalog account.
    pub fn catalog(&self, catalog: CatalogId) -> Result<DerivedAddress, DeriveError> {
        self.derive(&catalog_seeds(catalog))
    }

    fn candidate<S: AsRef<[u8]>>(&self, seeds: &[S], bump: u8) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed.as_ref());
        }
        hasher.update([bump]);
        hasher.update(self.program_id.as_bytes());
        hasher.update(DERIVATION_MARKER);
        hasher.finalize().into()
    }
}

impl Default for AddressDeriver {
    fn default() -> Self {
        Self::new(Self::default_program_id())
    }
}

/// Seeds of a listing: catalog id (big-endian) then UUID bytes.
pub fn listing_seeds(catalog: CatalogId, id: &ListingId) -> [Vec<u8>; 2] {
    [catalog.to_be_bytes().to_vec(), id.as_bytes().to_vec()]
}

/// Seeds of a URL entry: expand mode byte then canonical digest bytes.
pub fn url_entry_seeds(mode: ExpandMode, digest: &Digest) -> [Vec<u8>; 2] {
    [vec![mode.as_u8()], digest.as_bytes().to_vec()]
}

/// Seeds of a catalog account.
pub fn catalog_seeds(catalog: CatalogId) -> [Vec<u8>; 2] {
    [b"catalog".to_vec(), catalog.to_be_bytes().to_vec()]
}

fn check_seeds<S: AsRef<[u8]>>(seeds: &[S]) -> Result<(), DeriveError> {
    if seeds.len() > MAX_SEEDS {
        return Err(DeriveError::InvalidSeeds(format!(
            "{} seeds exceeds maximum of {MAX_SEEDS}",
            seeds.len()
        )));
    }
    if let Some((index, seed)) = seeds
        .iter()
        .enumerate()
        .find(|(_, s)| s.as_ref().len() > MAX_SEED_LEN)
    {
        return Err(DeriveError::InvalidSeeds(format!(
            "seed {index} is {} bytes, maximum is {MAX_SEED_LEN}",
            seed.as_ref().len()
        )));
    }
    Ok(())
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

/// Errors from address derivation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeriveError {
    #[error("invalid seeds: {0}")]
    InvalidSeeds(String),

    /// No bump produced an off-curve address. Treated as fatal.
    #[error("address derivation exhausted all variants for {seeds} seeds")]
    Exhausted { seeds: usize },

    #[error("bump {bump} yields an on-curve address")]
    OnCurve { bump: u8 },
}
