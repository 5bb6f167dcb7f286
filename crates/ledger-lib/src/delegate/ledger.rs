//! Per-delegator credit bookkeeping.

use std::sync::{Mutex, PoisonError};

use num_bigint::BigInt;
use tracing::trace;

use super::{store::AccountStore, types::Account};
use crate::{store::StoreError, types::Address};

/// Keeps `Account::required_credit` in line with the delegations of each
/// address.
///
/// All read-modify-write cycles go through a single lock, so updates of
/// unrelated addresses are serialized too. Update volume is low enough for
/// that.
pub struct AccountLedger<S> {
    store: S,
    lock: Mutex<()>,
}

impl<S: AccountStore> AccountLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Returns the account of `address`, a zero account if none was created yet.
    pub fn get_account(&self, address: &Address) -> Result<Account, StoreError> {
        Ok(self
            .store
            .get_account(address)?
            .unwrap_or_else(|| Account::new(*address)))
    }

    /// Adds `delta` to the required credit of `address` and persists the account.
    pub fn apply_delta(&self, address: &Address, delta: &BigInt) -> Result<Account, StoreError> {
        self.apply_delta_with(address, delta, |account| self.store.insert_account(account))
    }

    /// Like `apply_delta`, but hands the updated account to `persist` instead of
    /// writing it directly. The lock is held until `persist` returns, so callers
    /// can write the account in the same batch as the record the delta belongs
    /// to.
    pub fn apply_delta_with<F, E>(
        &self,
        address: &Address,
        delta: &BigInt,
        persist: F,
    ) -> Result<Account, E>
    where
        F: FnOnce(&Account) -> Result<(), E>,
        E: From<StoreError>,
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut account = self.get_account(address)?;
        account.required_credit += delta;
        trace!(
            "Applying credit delta {} to {}, required credit is now {}",
            delta,
            address,
            account.required_credit
        );
        persist(&account)?;
        Ok(account)
    }
}
