use thiserror::Error;

use super::types::DelegationKey;
pub use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum DelegateError {
    #[error("Only a newer nonce can be delegated: stored nonce {stored}, submitted nonce {submitted}")]
    StaleNonce { stored: u64, submitted: u64 },

    #[error("Block number {requested} is below the latest processed block number {latest}")]
    BlockNumberRegression { latest: u64, requested: u64 },

    #[error("Delegation not found: {0}")]
    DelegationNotFound(DelegationKey),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DelegateError {
    /// Store errors leave the ledger in an unknown state; the caller must stop
    /// processing and let the process be restarted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DelegateError::Store(_))
    }
}

pub type DelegateResult<T> = std::result::Result<T, DelegateError>;
