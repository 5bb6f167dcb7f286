use super::{
    scheduler::MonitorTrigger,
    types::{Account, ArchivedDelegation, Delegation, DelegationKey},
};
use crate::{
    store::StoreError,
    types::{Address, Hash256},
};

pub trait DelegateStore {
    /// Gets a delegation, `None` if nothing is stored under the key.
    fn get_delegation(&self, key: &DelegationKey) -> Result<Option<Delegation>, StoreError>;

    /// Lists the delegations of all participants of a channel.
    fn get_delegations_by_channel(&self, channel_id: &Hash256)
        -> Result<Vec<Delegation>, StoreError>;

    /// Writes the delegation, the account carrying its cost delta and the new
    /// monitor triggers in one atomic batch.
    fn save_delegation(
        &self,
        delegation: &Delegation,
        account: Option<&Account>,
        triggers: &[MonitorTrigger],
    ) -> Result<(), StoreError>;

    /// Removes the delegation from the active table and stores the snapshot, in
    /// one atomic batch together with the optional account update.
    fn archive_delegation(
        &self,
        archived: &ArchivedDelegation,
        account: Option<&Account>,
    ) -> Result<(), StoreError>;

    /// Lists the archived delegations of a channel, over all its generations.
    fn get_archived_delegations(
        &self,
        channel_id: &Hash256,
    ) -> Result<Vec<ArchivedDelegation>, StoreError>;
}

pub trait AccountStore {
    fn get_account(&self, address: &Address) -> Result<Option<Account>, StoreError>;

    fn insert_account(&self, account: &Account) -> Result<(), StoreError>;
}

pub trait MonitorStore {
    /// Registers `trigger.key` at `trigger.block_number`. Each (height, key)
    /// pair is stored once, inserting it again is a no-op.
    fn insert_monitor_trigger(&self, trigger: MonitorTrigger) -> Result<(), StoreError>;

    /// Keys registered at `block_number`, ordered by key.
    fn get_monitor_triggers(&self, block_number: u64) -> Result<Vec<DelegationKey>, StoreError>;

    /// Triggers with `after < block_number <= up_to`, ordered by block number
    /// then by key.
    fn get_monitor_triggers_in_range(
        &self,
        after: u64,
        up_to: u64,
    ) -> Result<Vec<MonitorTrigger>, StoreError>;
}

/// Persists the chain height processed by the watchtower.
pub trait BlockNumberStore {
    /// Zero when no block was processed yet.
    fn get_latest_block_number(&self) -> Result<u64, StoreError>;

    fn set_latest_block_number(&self, block_number: u64) -> Result<(), StoreError>;
}
