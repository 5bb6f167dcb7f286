//! Delegations the watchtower holds on behalf of offline channel participants,
//! and the credit each participant must keep reserved for them.

mod actor;
mod cost;
mod error;
mod execution;
mod key_lock;
mod ledger;
mod manager;
mod merge;
mod scheduler;
mod store;
mod types;

pub use actor::{DelegateMonitorActor, DelegateMonitorMessage, DelegateMonitorState};
pub use cost::{ActionCost, CostModel};
pub use error::{DelegateError, DelegateResult, StoreError};
pub use execution::{DelegationExecutor, ExecutionReport};
pub use ledger::AccountLedger;
pub use manager::{DelegateConfig, DelegateManager, DEFAULT_REVEAL_TIMEOUT};
pub use merge::{merge_announce_disposed, merge_punishes};
pub use scheduler::{MonitorScheduler, MonitorTrigger};
pub use store::{AccountStore, BlockNumberStore, DelegateStore, MonitorStore};
pub use types::{
    Account, AnnounceDisposed, ArchivedDelegation, ChannelActionSet, DelegateStatus, Delegation,
    DelegationKey, Lock, Punish, TxRecord, TxStatus, Unlock, UpdateTransfer,
};

#[cfg(test)]
mod tests;
