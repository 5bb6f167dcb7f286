use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use strum::{AsRefStr, Display};

use crate::{
    serde_utils::SliceHex,
    types::{Address, Hash256},
};

/// The status of a delegation, will update as the watchtower acts on it.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Eq, PartialEq, Default, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
pub enum DelegateStatus {
    /// Submitted, waiting for a monitor trigger.
    #[default]
    Init = 0,
    /// The watchtower started to execute the delegated actions on chain, the
    /// balance proof and unlocks are frozen from now on.
    Running = 1,
    /// All delegated actions succeeded.
    SuccessFinished = 2,
    /// Some actions succeeded while others failed.
    PartialSuccess = 3,
    /// Another party already performed the action on chain.
    SuccessFinishedByOther = 4,
    /// Execution was attempted and failed, e.g. not enough credit.
    Failed = 5,
    /// The channel was settled cooperatively.
    CooperativeSettled = 6,
    /// The channel was withdrawn, no watchtower action is needed.
    Withdrawn = 7,
}

impl DelegateStatus {
    /// Terminal delegations never become actionable again and are not charged.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DelegateStatus::Init | DelegateStatus::Running)
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    #[default]
    NotExecuted = 0,
    Succeeded = 1,
    Failed = 2,
}

/// Execution result of a single delegated on-chain action.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct TxRecord {
    pub status: TxStatus,
    pub error: Option<String>,
    pub tx_hash: Option<Hash256>,
}

impl TxRecord {
    pub fn succeeded(tx_hash: Hash256) -> Self {
        Self {
            status: TxStatus::Succeeded,
            error: None,
            tx_hash: Some(tx_hash),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TxStatus::Failed,
            error: Some(error.into()),
            tx_hash: None,
        }
    }
}

/// Arguments of the balance proof update call.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct UpdateTransfer {
    pub nonce: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub transfer_amount: BigUint,
    pub locksroot: Hash256,
    pub extra_hash: Hash256,
    #[serde_as(as = "SliceHex")]
    pub closing_signature: Vec<u8>,
    #[serde_as(as = "SliceHex")]
    pub non_closing_signature: Vec<u8>,
    #[serde(default)]
    pub tx: TxRecord,
}

/// A pending transfer lock.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct Lock {
    pub expiration: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: BigUint,
    pub lock_secret_hash: Hash256,
}

/// Arguments of an unlock call for one pending transfer.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct Unlock {
    pub lock: Lock,
    #[serde_as(as = "SliceHex")]
    pub merkle_proof: Vec<u8>,
    #[serde_as(as = "SliceHex")]
    pub signature: Vec<u8>,
    #[serde(default)]
    pub tx: TxRecord,
}

/// Fraud proof against the counterparty, keyed by the hash of the whole lock
/// (not the lock secret hash).
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct Punish {
    pub lock_hash: Hash256,
    pub additional_hash: Hash256,
    #[serde_as(as = "SliceHex")]
    pub signature: Vec<u8>,
    #[serde(default)]
    pub tx: TxRecord,
}

/// Marks a lock as resolved off chain. Carries no on-chain action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct AnnounceDisposed {
    pub lock_secret_hash: Hash256,
}

/// Everything a participant delegates to the watchtower for one channel.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct ChannelActionSet {
    pub channel_id: Hash256,
    pub open_block_number: u64,
    pub token_address: Address,
    pub partner_address: Address,
    /// `close block number + settle timeout`, zero while the channel is open.
    #[serde(default)]
    pub settle_block_number: u64,
    /// Absent for evidence-only submissions that just add punishes or
    /// disposed-lock announcements.
    pub update_transfer: Option<UpdateTransfer>,
    #[serde(default)]
    pub unlocks: Vec<Unlock>,
    #[serde(default)]
    pub punishes: Vec<Punish>,
    #[serde(default)]
    pub announce_disposed: Vec<AnnounceDisposed>,
}

impl ChannelActionSet {
    pub fn nonce(&self) -> Option<u64> {
        self.update_transfer.as_ref().map(|u| u.nonce)
    }
}

/// Primary key of a delegation: channel id followed by the delegator address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct DelegationKey {
    pub channel_id: Hash256,
    pub address: Address,
}

impl DelegationKey {
    pub const LEN: usize = Hash256::LEN + Address::LEN;

    pub fn new(channel_id: Hash256, address: Address) -> Self {
        Self {
            channel_id,
            address,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        bytes[..Hash256::LEN].copy_from_slice(self.channel_id.as_ref());
        bytes[Hash256::LEN..].copy_from_slice(self.address.as_ref());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        if bytes.len() != Self::LEN {
            return Err(anyhow::anyhow!(
                "Invalid delegation key length: {}",
                bytes.len()
            ));
        }
        Ok(Self {
            channel_id: Hash256::try_from(&bytes[..Hash256::LEN])?,
            address: Address::try_from(&bytes[Hash256::LEN..])?,
        })
    }
}

impl std::fmt::Display for DelegationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.address)
    }
}

/// A delegation request from a channel participant together with the result of
/// the watchtower acting on it.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct Delegation {
    pub key: DelegationKey,
    /// The delegator.
    pub address: Address,
    pub partner_address: Address,
    pub channel_id: Hash256,
    pub open_block_number: u64,
    pub settle_block_number: u64,
    pub token_address: Address,
    /// Milliseconds since epoch of the last accepted submission.
    pub submitted_at: u64,
    /// Milliseconds since epoch when the execution finished.
    pub executed_at: u64,
    /// Block number at which execution started.
    pub tx_block_number: u64,
    /// Earliest block number at which the watchtower tx may execute.
    pub min_block_number: u64,
    /// Latest block number at which the watchtower tx may execute.
    pub max_block_number: u64,
    pub status: DelegateStatus,
    pub error: Option<String>,
    pub content: ChannelActionSet,
}

impl Delegation {
    /// The zero valued delegation used when nothing is stored for `key` yet.
    pub fn empty(key: DelegationKey) -> Self {
        Self {
            key,
            address: key.address,
            channel_id: key.channel_id,
            ..Default::default()
        }
    }
}

/// Snapshot of a delegation moved out of the active table.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ArchivedDelegation {
    pub delegation: Delegation,
    /// Milliseconds since epoch.
    pub archived_at: u64,
}

impl ArchivedDelegation {
    /// Channel ids are reused after a channel is settled and re-opened, the
    /// open block number tells the generations apart.
    pub fn key(&self) -> Vec<u8> {
        [
            self.delegation.key.to_bytes().as_slice(),
            &self.delegation.open_block_number.to_be_bytes(),
        ]
        .concat()
    }
}

/// Aggregated credit a delegator must keep reserved for all its outstanding
/// delegations.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
pub struct Account {
    pub address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub required_credit: BigInt,
}

impl Account {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            required_credit: BigInt::default(),
        }
    }
}
