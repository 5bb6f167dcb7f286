//! Credit needed for the watchtower to execute a delegated action set.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::types::ChannelActionSet;

/// Unit prices of the on-chain actions, in credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostModel {
    pub update_transfer: BigUint,
    pub unlock: BigUint,
    pub punish: BigUint,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            update_transfer: BigUint::from(1u8),
            unlock: BigUint::from(1u8),
            punish: BigUint::from(1u8),
        }
    }
}

/// Credit needed per kind of action.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionCost {
    #[serde_as(as = "DisplayFromStr")]
    pub update_transfer: BigUint,
    #[serde_as(as = "DisplayFromStr")]
    pub unlock: BigUint,
    #[serde_as(as = "DisplayFromStr")]
    pub punish: BigUint,
}

impl ActionCost {
    pub fn total(&self) -> BigUint {
        &self.update_transfer + &self.unlock + &self.punish
    }
}

impl CostModel {
    pub fn new(update_transfer: BigUint, unlock: BigUint, punish: BigUint) -> Self {
        Self {
            update_transfer,
            unlock,
            punish,
        }
    }

    pub fn cost(&self, actions: &ChannelActionSet) -> BigUint {
        self.breakdown(actions).total()
    }

    pub fn breakdown(&self, actions: &ChannelActionSet) -> ActionCost {
        ActionCost {
            update_transfer: self.cost_update(actions),
            unlock: self.cost_unlock(actions),
            punish: self.cost_punish(actions),
        }
    }

    pub fn cost_update(&self, actions: &ChannelActionSet) -> BigUint {
        if actions.update_transfer.is_some() {
            self.update_transfer.clone()
        } else {
            BigUint::default()
        }
    }

    pub fn cost_unlock(&self, actions: &ChannelActionSet) -> BigUint {
        &self.unlock * BigUint::from(actions.unlocks.len())
    }

    /// A single successful punish is enough, so punishes are charged once no
    /// matter how many fraud proofs are held.
    pub fn cost_punish(&self, actions: &ChannelActionSet) -> BigUint {
        if actions.punishes.is_empty() {
            BigUint::default()
        } else {
            self.punish.clone()
        }
    }
}
