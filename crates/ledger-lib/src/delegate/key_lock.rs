use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use super::types::DelegationKey;

/// Serializes operations on the same delegation key while letting different
/// keys proceed in parallel.
#[derive(Default)]
pub(crate) struct KeyLocks {
    locks: Mutex<HashMap<DelegationKey, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub(crate) fn with_key<R>(&self, key: &DelegationKey, f: impl FnOnce() -> R) -> R {
        let key_lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(*key)
            .or_default()
            .clone();
        let result = {
            let _guard = key_lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        // Clones are only handed out under the map lock, so a count of two (map
        // plus ours) means nobody else is waiting on this key.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&key_lock) == 2 {
            locks.remove(key);
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
