//! Owned cache of the connected wallet session.

use alloy_primitives::Address;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A connected signer and the contract handle bound to it.
///
/// Valid until the wallet reports an account or chain change.
#[derive(Debug)]
pub struct Session<T> {
    pub account: Address,
    pub chain_id: u64,
    pub contract: T,
}

/// Holds at most one [`Session`].
#[derive(Debug)]
pub struct SessionCache<T> {
    slot: Mutex<Option<Arc<Session<T>>>>,
}

impl<T> Default for SessionCache<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> SessionCache<T> {
    fn slot(&self) -> MutexGuard<'_, Option<Arc<Session<T>>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self) -> Option<Arc<Session<T>>> {
        self.slot().clone()
    }

    pub fn account(&self) -> Option<Address> {
        self.slot().as_ref().map(|session| session.account)
    }

    /// Replace the cached session.
    pub fn store(&self, session: Session<T>) -> Arc<Session<T>> {
        let session = Arc::new(session);
        *self.slot() = Some(Arc::clone(&session));
        session
    }

    /// Drop the cached session. Returns whether one was present.
    pub fn invalidate(&self) -> bool {
        self.slot().take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_store_and_invalidate() {
        let cache = SessionCache::default();
        assert!(cache.get().is_none());

        let account = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        cache.store(Session {
            account,
            chain_id: 31337,
            contract: (),
        });
        assert_eq!(cache.account(), Some(account));

        assert!(cache.invalidate());
        assert!(!cache.invalidate());
        assert_eq!(cache.account(), None);
    }
}
