//! The delegate lifecycle state machine.

use num_bigint::{BigInt, BigUint};
use tracing::{debug, info, warn};

use super::{
    cost::CostModel,
    error::{DelegateError, DelegateResult},
    execution::ExecutionReport,
    key_lock::KeyLocks,
    ledger::AccountLedger,
    merge::{merge_announce_disposed, merge_punishes},
    scheduler::{MonitorScheduler, MonitorTrigger},
    store::{AccountStore, BlockNumberStore, DelegateStore, MonitorStore},
    types::{
        Account, ArchivedDelegation, ChannelActionSet, DelegateStatus, Delegation, DelegationKey,
    },
};
use crate::{
    now_timestamp_as_millis_u64,
    types::{Address, Hash256},
};

pub const DEFAULT_REVEAL_TIMEOUT: u64 = 30;

#[derive(Debug, Clone)]
pub struct DelegateConfig {
    pub cost_model: CostModel,
    /// Blocks before the settle block number after which fraud evidence can no
    /// longer be usefully submitted.
    pub reveal_timeout: u64,
    /// Accept balance proofs with a lower nonce than the stored one. Only meant
    /// for test networks where participants may wipe their local state.
    pub allow_nonce_regression: bool,
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            cost_model: CostModel::default(),
            reveal_timeout: DEFAULT_REVEAL_TIMEOUT,
            allow_nonce_regression: false,
        }
    }
}

pub struct DelegateManager<S> {
    store: S,
    ledger: AccountLedger<S>,
    scheduler: MonitorScheduler<S>,
    cost_model: CostModel,
    allow_nonce_regression: bool,
    key_locks: KeyLocks,
}

impl<S> DelegateManager<S>
where
    S: DelegateStore + AccountStore + MonitorStore + BlockNumberStore + Clone,
{
    pub fn new(store: S, config: DelegateConfig) -> Self {
        Self {
            ledger: AccountLedger::new(store.clone()),
            scheduler: MonitorScheduler::new(store.clone(), config.reveal_timeout),
            store,
            cost_model: config.cost_model,
            allow_nonce_regression: config.allow_nonce_regression,
            key_locks: KeyLocks::default(),
        }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    pub fn scheduler(&self) -> &MonitorScheduler<S> {
        &self.scheduler
    }

    pub fn get_account(&self, address: &Address) -> DelegateResult<Account> {
        Ok(self.ledger.get_account(address)?)
    }

    pub fn get_delegation(
        &self,
        channel_id: Hash256,
        address: Address,
    ) -> DelegateResult<Option<Delegation>> {
        self.get_delegation_by_key(&DelegationKey::new(channel_id, address))
    }

    pub fn get_delegation_by_key(&self, key: &DelegationKey) -> DelegateResult<Option<Delegation>> {
        Ok(self.store.get_delegation(key)?)
    }

    pub fn list_by_channel(&self, channel_id: &Hash256) -> DelegateResult<Vec<Delegation>> {
        Ok(self.store.get_delegations_by_channel(channel_id)?)
    }

    /// Accepts a new delegation, or merges it into the stored one.
    ///
    /// Returns the delegation as persisted.
    pub fn submit(
        &self,
        candidate: ChannelActionSet,
        address: Address,
    ) -> DelegateResult<Delegation> {
        let key = DelegationKey::new(candidate.channel_id, address);
        self.key_locks
            .with_key(&key, || self.submit_locked(key, candidate))
    }

    fn submit_locked(
        &self,
        key: DelegationKey,
        candidate: ChannelActionSet,
    ) -> DelegateResult<Delegation> {
        let mut delegation = self
            .store
            .get_delegation(&key)?
            .unwrap_or_else(|| Delegation::empty(key));

        // Equal nonces are accepted, the same balance proof is resubmitted
        // whenever new evidence is added.
        if let (Some(stored), Some(submitted)) = (delegation.content.nonce(), candidate.nonce()) {
            if delegation.status == DelegateStatus::Init && stored > submitted {
                if !self.allow_nonce_regression {
                    return Err(DelegateError::StaleNonce { stored, submitted });
                }
                warn!(
                    "Accepting nonce regression for {}: stored {}, submitted {}",
                    key, stored, submitted
                );
            }
        }
        // TODO: post-Init resubmissions with a lower nonce are trusted as is, decide
        // whether they need the nonce check as well.
        if delegation.content.open_block_number > 0 && delegation.status != DelegateStatus::Init {
            warn!(
                "Delegation {} in status {} will be updated, was the channel settled and re-opened?",
                key, delegation.status
            );
        }

        let old_cost = self.charged_cost(&delegation);

        merge_punishes(&mut delegation.content.punishes, &candidate.punishes);
        merge_announce_disposed(
            &mut delegation.content.announce_disposed,
            &candidate.announce_disposed,
        );

        if delegation.status == DelegateStatus::Running {
            // The balance proof is already being submitted, only evidence may change.
            debug!("Delegation {} is running, keeping its balance proof and unlocks", key);
        } else {
            let content = &mut delegation.content;
            content.channel_id = candidate.channel_id;
            content.open_block_number = candidate.open_block_number;
            content.token_address = candidate.token_address;
            content.partner_address = candidate.partner_address;
            if candidate.settle_block_number > 0 {
                content.settle_block_number = candidate.settle_block_number;
            }
            if candidate.update_transfer.is_some() {
                content.update_transfer = candidate.update_transfer;
                content.unlocks = candidate.unlocks;
            }
        }

        delegation.submitted_at = now_timestamp_as_millis_u64();
        delegation.key = key;
        delegation.address = key.address;
        delegation.channel_id = key.channel_id;
        delegation.open_block_number = candidate.open_block_number;
        delegation.token_address = candidate.token_address;
        delegation.partner_address = candidate.partner_address;

        let mut triggers: Vec<MonitorTrigger> = vec![];
        if delegation.settle_block_number == 0 && candidate.settle_block_number > 0 {
            delegation.settle_block_number = candidate.settle_block_number;
            delegation.min_block_number = delegation
                .settle_block_number
                .saturating_sub(self.scheduler.reveal_timeout());
            delegation.max_block_number = delegation.settle_block_number;
            triggers.extend(
                self.scheduler
                    .settlement_triggers(delegation.settle_block_number, key),
            );
            info!(
                "First delegation of {} after channel close, settle block number {}",
                key, delegation.settle_block_number
            );
        }

        let new_cost = self.charged_cost(&delegation);
        debug!(
            "Delegation {} cost: old {}, new {}",
            key, old_cost, new_cost
        );
        self.commit(&delegation, &old_cost, &new_cost, &triggers)?;
        Ok(delegation)
    }

    /// Freezes the balance proof and unlocks of a delegation before the
    /// watchtower starts executing it.
    pub fn mark_running(
        &self,
        channel_id: Hash256,
        address: Address,
    ) -> DelegateResult<Delegation> {
        let key = DelegationKey::new(channel_id, address);
        self.key_locks.with_key(&key, || {
            let mut delegation = self
                .store
                .get_delegation(&key)?
                .ok_or(DelegateError::DelegationNotFound(key))?;
            let old_cost = self.charged_cost(&delegation);
            delegation.status = DelegateStatus::Running;
            let new_cost = self.charged_cost(&delegation);
            self.commit(&delegation, &old_cost, &new_cost, &[])?;
            Ok(delegation)
        })
    }

    /// Updates the status of a delegation. Only the status of the stored record
    /// changes, the rest of `delegation` is only used to locate it.
    pub fn set_status(
        &self,
        status: DelegateStatus,
        delegation: &mut Delegation,
    ) -> DelegateResult<()> {
        let key = delegation.key;
        self.key_locks.with_key(&key, || {
            let mut stored = self
                .store
                .get_delegation(&key)?
                .ok_or(DelegateError::DelegationNotFound(key))?;
            let old_cost = self.charged_cost(&stored);
            stored.status = status;
            let new_cost = self.charged_cost(&stored);
            self.commit(&stored, &old_cost, &new_cost, &[])
        })?;
        delegation.status = status;
        Ok(())
    }

    /// Records the outcome of an execution started by `mark_running`.
    ///
    /// Evidence merged while the execution was in flight is kept; punish
    /// results are matched by lock hash.
    pub fn finish_execution(
        &self,
        executed: &Delegation,
        report: ExecutionReport,
        block_number: u64,
    ) -> DelegateResult<Delegation> {
        let key = executed.key;
        self.key_locks.with_key(&key, || {
            let mut stored = self
                .store
                .get_delegation(&key)?
                .ok_or(DelegateError::DelegationNotFound(key))?;
            let old_cost = self.charged_cost(&stored);

            let status = report.resolve_status();
            let content = &mut stored.content;
            if let (Some(update), Some(record)) =
                (content.update_transfer.as_mut(), report.update_transfer)
            {
                update.tx = record;
            }
            for (unlock, record) in content.unlocks.iter_mut().zip(report.unlocks) {
                unlock.tx = record;
            }
            for (lock_hash, record) in report.punishes {
                if let Some(punish) = content.punishes.iter_mut().find(|p| p.lock_hash == lock_hash)
                {
                    punish.tx = record;
                }
            }
            stored.tx_block_number = block_number;
            stored.executed_at = now_timestamp_as_millis_u64();
            stored.error = report.error;
            stored.status = status;

            let new_cost = self.charged_cost(&stored);
            self.commit(&stored, &old_cost, &new_cost, &[])?;
            info!("Delegation {} finished with status {}", key, status);
            Ok(stored)
        })
    }

    /// Moves the delegation out of the active table. Called once its channel is
    /// settled or withdrawn.
    pub fn archive(&self, delegation: &Delegation) -> DelegateResult<ArchivedDelegation> {
        let key = delegation.key;
        self.key_locks.with_key(&key, || {
            let stored = self
                .store
                .get_delegation(&key)?
                .ok_or(DelegateError::DelegationNotFound(key))?;
            let cost = self.charged_cost(&stored);
            let archived = ArchivedDelegation {
                delegation: stored,
                archived_at: now_timestamp_as_millis_u64(),
            };
            if cost == BigUint::default() {
                self.store.archive_delegation(&archived, None)?;
            } else {
                warn!("Archiving delegation {} which is still charged {}", key, cost);
                let delta = -BigInt::from(cost);
                self.ledger.apply_delta_with(&key.address, &delta, |account| {
                    self.store.archive_delegation(&archived, Some(account))
                })?;
            }
            Ok(archived)
        })
    }

    /// Credit held for a delegation, terminal delegations hold nothing.
    fn charged_cost(&self, delegation: &Delegation) -> BigUint {
        if delegation.status.is_terminal() {
            BigUint::default()
        } else {
            self.cost_model.cost(&delegation.content)
        }
    }

    fn commit(
        &self,
        delegation: &Delegation,
        old_cost: &BigUint,
        new_cost: &BigUint,
        triggers: &[MonitorTrigger],
    ) -> DelegateResult<()> {
        if old_cost == new_cost {
            self.scheduler.register_with(triggers, |triggers| {
                self.store.save_delegation(delegation, None, triggers)
            })?;
            return Ok(());
        }
        let delta = BigInt::from(new_cost.clone()) - BigInt::from(old_cost.clone());
        self.ledger
            .apply_delta_with(&delegation.address, &delta, |account| {
                self.scheduler.register_with(triggers, |triggers| {
                    self.store.save_delegation(delegation, Some(account), triggers)
                })
            })?;
        Ok(())
    }
}
