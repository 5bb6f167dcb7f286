use std::sync::Arc;

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use strum::AsRefStr;
use tracing::{debug, error, info, warn};

use super::{
    error::DelegateResult,
    execution::DelegationExecutor,
    manager::DelegateManager,
    scheduler::MonitorTrigger,
    store::{AccountStore, BlockNumberStore, DelegateStore, MonitorStore},
    types::DelegateStatus,
};
use crate::types::Hash256;

/// Drives delegations from chain height: evaluates them when their monitor
/// triggers are crossed and archives them when their channel is settled.
pub struct DelegateMonitorActor<S, E> {
    store: S,
    manager: Arc<DelegateManager<S>>,
    executor: E,
}

impl<S, E> DelegateMonitorActor<S, E> {
    pub fn new(store: S, manager: Arc<DelegateManager<S>>, executor: E) -> Self {
        Self {
            store,
            manager,
            executor,
        }
    }
}

#[derive(Debug, AsRefStr)]
pub enum DelegateMonitorMessage {
    /// The chain-height tracker observed a new block.
    NewBlock(u64),
    /// The channel is settled; every delegation on it gets the given terminal
    /// status (unless already terminal) and is archived.
    ChannelSettled(Hash256, DelegateStatus),
    GetLatestBlockNumber(RpcReplyPort<u64>),
}

pub struct DelegateMonitorState {
    latest_block_number: u64,
}

#[async_trait::async_trait]
impl<S, E> Actor for DelegateMonitorActor<S, E>
where
    S: DelegateStore + AccountStore + MonitorStore + BlockNumberStore + Clone + Send + Sync + 'static,
    E: DelegationExecutor,
{
    type Msg = DelegateMonitorMessage;
    type State = DelegateMonitorState;
    type Arguments = ();

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        _args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let latest_block_number = self.store.get_latest_block_number()?;
        info!(
            "Delegate monitor starting from block number {}",
            latest_block_number
        );
        Ok(DelegateMonitorState {
            latest_block_number,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        debug!("Delegate monitor handling {}", message.as_ref());
        match message {
            DelegateMonitorMessage::NewBlock(block_number) => {
                self.on_new_block(state, block_number).await
            }
            DelegateMonitorMessage::ChannelSettled(channel_id, status) => {
                self.on_channel_settled(channel_id, status)
            }
            DelegateMonitorMessage::GetLatestBlockNumber(reply) => {
                let _ = reply.send(state.latest_block_number);
                Ok(())
            }
        }
    }
}

impl<S, E> DelegateMonitorActor<S, E>
where
    S: DelegateStore + AccountStore + MonitorStore + BlockNumberStore + Clone + Send + Sync + 'static,
    E: DelegationExecutor,
{
    async fn on_new_block(
        &self,
        state: &mut DelegateMonitorState,
        block_number: u64,
    ) -> Result<(), ActorProcessingErr> {
        if block_number <= state.latest_block_number {
            debug!(
                "Ignoring block number {}, already at {}",
                block_number, state.latest_block_number
            );
            return Ok(());
        }
        let triggers = self
            .manager
            .scheduler()
            .take_due_triggers(state.latest_block_number, block_number)?;
        for trigger in triggers {
            let result = self.evaluate(trigger).await;
            check_result(result, "evaluate delegation")?;
        }
        self.store.set_latest_block_number(block_number)?;
        state.latest_block_number = block_number;
        Ok(())
    }

    async fn evaluate(&self, trigger: MonitorTrigger) -> DelegateResult<()> {
        let key = trigger.key;
        let Some(delegation) = self.manager.get_delegation_by_key(&key)? else {
            debug!("Delegation {} is archived, skipping trigger at {}", key, trigger.block_number);
            return Ok(());
        };
        if delegation.status != DelegateStatus::Init {
            debug!(
                "Delegation {} is {}, skipping trigger at {}",
                key, delegation.status, trigger.block_number
            );
            return Ok(());
        }

        let delegation = self.manager.mark_running(key.channel_id, key.address)?;
        let cost = self.manager.cost_model().breakdown(&delegation.content);
        info!(
            "Executing delegation {} at block {}, cost {}",
            key,
            trigger.block_number,
            cost.total()
        );
        let report = self.executor.execute(delegation.clone(), cost).await;
        self.manager
            .finish_execution(&delegation, report, trigger.block_number)?;
        Ok(())
    }

    fn on_channel_settled(
        &self,
        channel_id: Hash256,
        status: DelegateStatus,
    ) -> Result<(), ActorProcessingErr> {
        if !status.is_terminal() {
            error!(
                "Channel {} settled with non-terminal status {}, ignoring",
                channel_id, status
            );
            return Ok(());
        }
        let delegations =
            check_result(self.manager.list_by_channel(&channel_id), "list delegations")?
                .unwrap_or_default();
        for mut delegation in delegations {
            if !delegation.status.is_terminal() {
                if delegation.status == DelegateStatus::Running {
                    warn!(
                        "Delegation {} is still running while channel {} settled",
                        delegation.key, channel_id
                    );
                }
                let result = self.manager.set_status(status, &mut delegation);
                if check_result(result, "set delegation status")?.is_none() {
                    continue;
                }
            }
            check_result(self.manager.archive(&delegation), "archive delegation")?;
        }
        Ok(())
    }
}

/// Stops the actor on fatal errors, logs and swallows the others.
fn check_result<T>(
    result: DelegateResult<T>,
    action: &str,
) -> Result<Option<T>, ActorProcessingErr> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_fatal() => {
            error!("Failed to {}, stopping delegate monitor: {}", action, err);
            Err(err.into())
        }
        Err(err) => {
            warn!("Failed to {}: {}", action, err);
            Ok(None)
        }
    }
}
