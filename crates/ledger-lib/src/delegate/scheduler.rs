use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    error::{DelegateError, DelegateResult},
    store::{BlockNumberStore, MonitorStore},
    types::DelegationKey,
};
use crate::store::StoreError;

/// When the chain reaches `block_number`, the delegation under `key` has to be
/// re-evaluated for on-chain action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTrigger {
    pub block_number: u64,
    pub key: DelegationKey,
}

/// Registers the block numbers at which delegations become actionable.
///
/// Triggers are never removed. A delegation that is already terminal when its
/// trigger fires is simply skipped by the consumer.
///
/// A trigger registered at or below the highest scanned block would never be
/// visited, so its height is moved to the next block to scan. Registration and
/// scanning share one lock: a trigger is either persisted before a scan reads
/// its range or lands above it.
pub struct MonitorScheduler<S> {
    store: S,
    reveal_timeout: u64,
    scanned: Mutex<u64>,
}

impl<S: MonitorStore + BlockNumberStore> MonitorScheduler<S> {
    pub fn new(store: S, reveal_timeout: u64) -> Self {
        Self {
            store,
            reveal_timeout,
            scanned: Mutex::new(0),
        }
    }

    pub fn reveal_timeout(&self) -> u64 {
        self.reveal_timeout
    }

    /// The two triggers of a closed channel: the settle block number itself and
    /// the last block at which fraud evidence can still be submitted.
    pub fn settlement_triggers(
        &self,
        settle_block_number: u64,
        key: DelegationKey,
    ) -> [MonitorTrigger; 2] {
        [
            MonitorTrigger {
                block_number: settle_block_number,
                key,
            },
            MonitorTrigger {
                block_number: settle_block_number.saturating_sub(self.reveal_timeout),
                key,
            },
        ]
    }

    pub fn register_trigger(&self, block_number: u64, key: DelegationKey) -> Result<(), StoreError> {
        self.register_with(&[MonitorTrigger { block_number, key }], |triggers| {
            for trigger in triggers {
                self.store.insert_monitor_trigger(*trigger)?;
            }
            Ok(())
        })
    }

    /// Moves `triggers` above the scanned height and hands them to `persist`.
    /// The scan lock is held until `persist` returns.
    pub fn register_with<F, E>(&self, triggers: &[MonitorTrigger], persist: F) -> Result<(), E>
    where
        F: FnOnce(&[MonitorTrigger]) -> Result<(), E>,
        E: From<StoreError>,
    {
        if triggers.is_empty() {
            return persist(triggers);
        }
        let scanned = self.scanned.lock().unwrap_or_else(PoisonError::into_inner);
        let floor = (*scanned).max(self.store.get_latest_block_number()?);
        let triggers: Vec<MonitorTrigger> = triggers
            .iter()
            .map(|trigger| {
                let block_number = trigger.block_number.max(floor.saturating_add(1));
                if block_number != trigger.block_number {
                    info!(
                        "Trigger at block {} for {} already passed, moving it to {}",
                        trigger.block_number, trigger.key, block_number
                    );
                } else {
                    debug!(
                        "Registering monitor trigger at block {} for {}",
                        block_number, trigger.key
                    );
                }
                MonitorTrigger {
                    block_number,
                    key: trigger.key,
                }
            })
            .collect();
        persist(&triggers)
    }

    pub fn triggers_at(&self, block_number: u64) -> Result<Vec<DelegationKey>, StoreError> {
        self.store.get_monitor_triggers(block_number)
    }

    /// Triggers crossed when the chain moves from `after` to `up_to`.
    pub fn due_triggers(&self, after: u64, up_to: u64) -> Result<Vec<MonitorTrigger>, StoreError> {
        if up_to <= after {
            return Ok(vec![]);
        }
        self.store.get_monitor_triggers_in_range(after, up_to)
    }

    /// Like `due_triggers`, and marks everything up to `up_to` as scanned so
    /// later registrations land above it.
    pub fn take_due_triggers(
        &self,
        after: u64,
        up_to: u64,
    ) -> Result<Vec<MonitorTrigger>, StoreError> {
        let mut scanned = self.scanned.lock().unwrap_or_else(PoisonError::into_inner);
        let due = self.due_triggers(after, up_to)?;
        *scanned = (*scanned).max(up_to);
        Ok(due)
    }

    /// Persists `block_number` as the latest processed chain height. The height
    /// never moves backwards.
    pub fn advance_chain_height(&self, block_number: u64) -> DelegateResult<u64> {
        let _scanned = self.scanned.lock().unwrap_or_else(PoisonError::into_inner);
        let latest = self.store.get_latest_block_number()?;
        if block_number < latest {
            return Err(DelegateError::BlockNumberRegression {
                latest,
                requested: block_number,
            });
        }
        self.store.set_latest_block_number(block_number)?;
        Ok(block_number)
    }
}
