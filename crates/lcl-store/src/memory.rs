use std::collections::BTreeMap;
use std::sync::RwLock;

use lcl_types::Address;

use crate::error::StoreResult;
use crate::traits::{matches_at, AccountInit, AccountStore};

/// In-memory, `BTreeMap`-based account store.
///
/// Intended for tests and embedding. Accounts are held behind a `RwLock`;
/// creation runs its initializer under the write lock, which is what gives
/// concurrent `create_with` callers their at-most-once guarantee.
pub struct InMemoryAccountStore {
    accounts: RwLock<BTreeMap<Address, Vec<u8>>>,
}

impl InMemoryAccountStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of accounts currently stored.
    pub fn len(&self) -> usize {
        self.accounts.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.accounts.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored accounts.
    pub fn total_bytes(&self) -> u64 {
        self.accounts
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Sorted list of all addresses in the store.
    pub fn addresses(&self) -> Vec<Address> {
        self.accounts
            .read()
            .expect("lock poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Remove all accounts from the store.
    pub fn clear(&self) {
        self.accounts.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get(&self, address: &Address) -> StoreResult<Option<Vec<u8>>> {
        let map = self.accounts.read().expect("lock poisoned");
        Ok(map.get(address).cloned())
    }

    fn create_with(&self, address: &Address, init: AccountInit<'_>) -> StoreResult<bool> {
        let mut map = self.accounts.write().expect("lock poisoned");
        if map.contains_key(address) {
            return Ok(false);
        }
        map.insert(*address, init());
        Ok(true)
    }

    fn put(&self, address: &Address, data: Vec<u8>) -> StoreResult<()> {
        let mut map = self.accounts.write().expect("lock poisoned");
        map.insert(*address, data);
        Ok(())
    }

    fn remove(&self, address: &Address) -> StoreResult<bool> {
        let mut map = self.accounts.write().expect("lock poisoned");
        Ok(map.remove(address).is_some())
    }

    fn scan_by_prefix(&self, offset: usize, prefix: &[u8]) -> StoreResult<Vec<(Address, Vec<u8>)>> {
        let map = self.accounts.read().expect("lock poisoned");
        Ok(map
            .iter()
            .filter(|(_, data)| matches_at(data, offset, prefix))
            .map(|(address, data)| (*address, data.clone()))
            .collect())
    }
}

impl std::fmt::Debug for InMemoryAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAccountStore")
            .field("account_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn addr(n: u8) -> Address {
        Address::new([n; 32])
    }

    #[test]
    fn new_store_is_empty() {
        let store = InMemoryAccountStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.total_bytes(), 0);
    }

    #[test]
    fn get_missing_returns_none() {
        let store = InMemoryAccountStore::new();
        assert!(store.get(&addr(1)).unwrap().is_none());
        assert!(!store.exists(&addr(1)).unwrap());
    }

    #[test]
    fn create_if_absent_only_once() {
        let store = InMemoryAccountStore::new();
        assert!(store.create_if_absent(&addr(1), vec![1, 2, 3]).unwrap());
        assert!(!store.create_if_absent(&addr(1), vec![9, 9, 9]).unwrap());
        assert_eq!(store.get(&addr(1)).unwrap().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn create_with_skips_init_when_present() {
        let store = InMemoryAccountStore::new();
        store.put(&addr(1), vec![0]).unwrap();
        let created = store
            .create_with(&addr(1), Box::new(|| -> Vec<u8> { panic!("initializer must not run") }))
            .unwrap();
        assert!(!created);
    }

    #[test]
    fn put_replaces_data() {
        let store = InMemoryAccountStore::new();
        store.put(&addr(1), vec![1]).unwrap();
        store.put(&addr(1), vec![2, 2]).unwrap();
        assert_eq!(store.get(&addr(1)).unwrap().unwrap(), vec![2, 2]);
        assert_eq!(store.total_bytes(), 2);
    }

    #[test]
    fn remove_reports_existence() {
        let store = InMemoryAccountStore::new();
        store.put(&addr(1), vec![1]).unwrap();
        assert!(store.remove(&addr(1)).unwrap());
        assert!(!store.remove(&addr(1)).unwrap());
    }

    #[test]
    fn scan_matches_exact_bytes_at_offset() {
        let store = InMemoryAccountStore::new();
        store.put(&addr(1), vec![0, 0, 7, 8, 9]).unwrap();
        store.put(&addr(2), vec![0, 0, 7, 8, 1]).unwrap();
        store.put(&addr(3), vec![7, 8, 0, 0, 0]).unwrap();
        store.put(&addr(4), vec![0, 0, 7]).unwrap();

        let hits = store.scan_by_prefix(2, &[7, 8]).unwrap();
        let found: Vec<Address> = hits.into_iter().map(|(a, _)| a).collect();
        assert_eq!(found, vec![addr(1), addr(2)]);
    }

    #[test]
    fn scan_with_empty_prefix_returns_long_enough_accounts() {
        let store = InMemoryAccountStore::new();
        store.put(&addr(1), vec![1, 2, 3]).unwrap();
        store.put(&addr(2), vec![1]).unwrap();
        assert_eq!(store.scan_by_prefix(2, &[]).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_creators_run_init_once() {
        let store = Arc::new(InMemoryAccountStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let created = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|scope| {
            for _ in 0..16 {
                let store = Arc::clone(&store);
                let calls = Arc::clone(&calls);
                let created = Arc::clone(&created);
                scope.spawn(move || {
                    let did_create = store
                        .create_with(
                            &addr(5),
                            Box::new(|| {
                                calls.fetch_add(1, Ordering::SeqCst);
                                vec![5]
                            }),
                        )
                        .unwrap();
                    if did_create {
                        created.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn addresses_are_sorted() {
        let store = InMemoryAccountStore::new();
        store.put(&addr(3), vec![]).unwrap();
        store.put(&addr(1), vec![]).unwrap();
        assert_eq!(store.addresses(), vec![addr(1), addr(3)]);
    }

    #[test]
    fn debug_shows_count() {
        let store = InMemoryAccountStore::new();
        store.put(&addr(1), vec![]).unwrap();
        assert!(format!("{store:?}").contains("account_count: 1"));
    }
}
