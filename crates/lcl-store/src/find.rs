use lcl_crypto::AddressDeriver;
use lcl_types::Address;

use crate::error::StoreResult;
use crate::traits::AccountStore;

/// Outcome of [`find_or_create`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoundOrCreated {
    pub address: Address,
    pub bump: u8,
    /// `true` only for the caller whose factory populated the account.
    pub created: bool,
}

/// Idempotent creation at a derived address.
///
/// Derives the address for `seeds`, returns it immediately if the account
/// already exists, and otherwise creates it with `factory` through the
/// store's atomic create primitive. A caller that loses a creation race
/// observes the winner's account; its factory is never invoked.
pub fn find_or_create<S, Seed, F>(
    store: &S,
    deriver: &AddressDeriver,
    seeds: &[Seed],
    factory: F,
) -> StoreResult<FoundOrCreated>
where
    S: AccountStore + ?Sized,
    Seed: AsRef<[u8]>,
    F: FnOnce() -> Vec<u8>,
{
    let derived = deriver.derive(seeds)?;
    if store.exists(&derived.address)? {
        tracing::debug!(address = %derived.address, "found existing account");
        return Ok(FoundOrCreated {
            address: derived.address,
            bump: derived.bump,
            created: false,
        });
    }

    let created = store.create_with(&derived.address, Box::new(factory))?;
    if created {
        tracing::info!(address = %derived.address, bump = derived.bump, "created account");
    } else {
        tracing::debug!(address = %derived.address, "lost creation race, using existing account");
    }
    Ok(FoundOrCreated {
        address: derived.address,
        bump: derived.bump,
        created,
    })
}
