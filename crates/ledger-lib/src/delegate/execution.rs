use super::{
    cost::ActionCost,
    types::{DelegateStatus, Delegation, TxRecord, TxStatus},
};
use crate::types::Hash256;

/// Sends the on-chain transactions of a delegation.
///
/// The delegation handed over is already `Running`, its balance proof and
/// unlocks won't change while the executor works on it.
#[async_trait::async_trait]
pub trait DelegationExecutor: Send + Sync + 'static {
    async fn execute(&self, delegation: Delegation, cost: ActionCost) -> ExecutionReport;
}

/// What the executor did with each delegated action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// `None` if the balance proof was not submitted.
    pub update_transfer: Option<TxRecord>,
    /// Results in the order of the delegated unlocks.
    pub unlocks: Vec<TxRecord>,
    /// Results keyed by punish lock hash.
    pub punishes: Vec<(Hash256, TxRecord)>,
    /// The counterparty or another watchtower already did the work.
    pub finished_by_other: bool,
    pub error: Option<String>,
}

impl ExecutionReport {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn finished_by_other() -> Self {
        Self {
            finished_by_other: true,
            ..Default::default()
        }
    }

    fn records(&self) -> impl Iterator<Item = &TxRecord> {
        self.update_transfer
            .iter()
            .chain(self.unlocks.iter())
            .chain(self.punishes.iter().map(|(_, record)| record))
            .filter(|record| record.status != TxStatus::NotExecuted)
    }

    /// The terminal status this report moves a delegation to.
    pub fn resolve_status(&self) -> DelegateStatus {
        if self.finished_by_other {
            return DelegateStatus::SuccessFinishedByOther;
        }
        let (succeeded, failed) =
            self.records()
                .fold((0usize, 0usize), |(ok, err), record| match record.status {
                    TxStatus::Succeeded => (ok + 1, err),
                    _ => (ok, err + 1),
                });
        match (succeeded, failed) {
            (0, 0) if self.error.is_some() => DelegateStatus::Failed,
            (_, 0) => DelegateStatus::SuccessFinished,
            (0, _) => DelegateStatus::Failed,
            _ => DelegateStatus::PartialSuccess,
        }
    }
}
