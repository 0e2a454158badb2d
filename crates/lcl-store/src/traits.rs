use lcl_types::Address;

use crate::error::StoreResult;

/// Deferred account initializer, invoked at most once by the store.
pub type AccountInit<'a> = Box<dyn FnOnce() -> Vec<u8> + 'a>;

/// Address-keyed account store.
///
/// All implementations must satisfy these invariants:
/// - Every call is atomic: it either fully applies or fully fails, and
///   readers never observe a partially written account.
/// - `create_with` is the only creation primitive that races may rely on:
///   exactly one of several concurrent creators of an address succeeds,
///   and the initializer of every losing creator is never invoked.
/// - The store never interprets account contents; scans compare raw bytes.
pub trait AccountStore: Send + Sync {
    /// Read an account's data. Returns `Ok(None)` if it does not exist.
    fn get(&self, address: &Address) -> StoreResult<Option<Vec<u8>>>;

    /// Create an account only if the address is free.
    ///
    /// `init` runs inside the store's critical section and only when the
    /// address is free. Returns `true` if this call created the account.
    fn create_with(&self, address: &Address, init: AccountInit<'_>) -> StoreResult<bool>;

    /// Create or replace an account's data.
    ///
    /// Callers are responsible for authorizing the write.
    fn put(&self, address: &Address, data: Vec<u8>) -> StoreResult<()>;

    /// Remove an account. Returns `true` if it existed.
    fn remove(&self, address: &Address) -> StoreResult<bool>;

    /// All accounts whose data holds `prefix` starting at byte `offset`.
    ///
    /// Exact byte match only; accounts shorter than `offset + prefix.len()`
    /// never match. Results are ordered by address.
    fn scan_by_prefix(&self, offset: usize, prefix: &[u8]) -> StoreResult<Vec<(Address, Vec<u8>)>>;

    /// Create an account with ready-made data if the address is free.
    fn create_if_absent(&self, address: &Address, data: Vec<u8>) -> StoreResult<bool> {
        self.create_with(address, Box::new(move || data))
    }

    /// Check whether an account exists.
    fn exists(&self, address: &Address) -> StoreResult<bool> {
        Ok(self.get(address)?.is_some())
    }
}

/// Returns `true` if `data` holds `prefix` at `offset`.
pub fn matches_at(data: &[u8], offset: usize, prefix: &[u8]) -> bool {
    data.get(offset..offset.saturating_add(prefix.len()))
        .is_some_and(|window| window == prefix)
}
