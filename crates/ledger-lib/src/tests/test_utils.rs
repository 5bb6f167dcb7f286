use std::{
    env,
    ffi::OsStr,
    mem::ManuallyDrop,
    path::Path,
};

use num_bigint::BigUint;
use rand::Rng;
use tempfile::TempDir as OldTempDir;
use tracing::warn;

use crate::{
    delegate::{
        AnnounceDisposed, ChannelActionSet, Lock, Punish, TxRecord, Unlock, UpdateTransfer,
    },
    store::Store,
    types::{Address, Hash256},
};

static RETAIN_VAR: &str = "TEST_TEMP_RETAIN";

pub struct TempDir(ManuallyDrop<OldTempDir>);

impl TempDir {
    pub fn new<S: AsRef<OsStr>>(prefix: S) -> Self {
        Self(ManuallyDrop::new(
            OldTempDir::with_prefix(prefix).expect("create temp directory"),
        ))
    }
}

impl AsRef<Path> for TempDir {
    fn as_ref(&self) -> &Path {
        self.0.path()
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if env::var(RETAIN_VAR).is_ok() {
            warn!(
                "Keeping temp directory {:?}, as environment variable {RETAIN_VAR} set",
                self.as_ref()
            );
        } else {
            unsafe {
                ManuallyDrop::drop(&mut self.0);
            }
        }
    }
}

pub fn init_tracing() {
    use std::sync::Once;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .pretty()
            .init();
    });
}

pub fn generate_store() -> (Store, TempDir) {
    let temp_dir = TempDir::new("test-wtledger");
    let store = Store::new(temp_dir.as_ref());
    (store.expect("create store"), temp_dir)
}

pub fn gen_rand_sha256_hash() -> Hash256 {
    let mut rng = rand::thread_rng();
    let mut result = [0u8; 32];
    rng.fill(&mut result[..]);
    result.into()
}

pub fn gen_rand_address() -> Address {
    let mut rng = rand::thread_rng();
    let mut result = [0u8; 20];
    rng.fill(&mut result[..]);
    result.into()
}

pub fn gen_update_transfer(nonce: u64) -> UpdateTransfer {
    UpdateTransfer {
        nonce,
        transfer_amount: BigUint::from(nonce * 100),
        locksroot: gen_rand_sha256_hash(),
        extra_hash: gen_rand_sha256_hash(),
        closing_signature: vec![1; 65],
        non_closing_signature: vec![2; 65],
        tx: TxRecord::default(),
    }
}

pub fn gen_unlock() -> Unlock {
    Unlock {
        lock: Lock {
            expiration: 1000,
            amount: BigUint::from(10u8),
            lock_secret_hash: gen_rand_sha256_hash(),
        },
        merkle_proof: vec![3; 32],
        signature: vec![4; 65],
        tx: TxRecord::default(),
    }
}

pub fn gen_punish() -> Punish {
    Punish {
        lock_hash: gen_rand_sha256_hash(),
        additional_hash: gen_rand_sha256_hash(),
        signature: vec![5; 65],
        tx: TxRecord::default(),
    }
}

pub fn gen_announce_disposed() -> AnnounceDisposed {
    AnnounceDisposed {
        lock_secret_hash: gen_rand_sha256_hash(),
    }
}

/// An action set for an open channel, carrying a balance proof with `nonce`
/// and `unlocks` pending transfers.
pub fn gen_action_set(channel_id: Hash256, nonce: u64, unlocks: usize) -> ChannelActionSet {
    ChannelActionSet {
        channel_id,
        open_block_number: 10,
        token_address: Address::from([7u8; 20]),
        partner_address: Address::from([8u8; 20]),
        settle_block_number: 0,
        update_transfer: Some(gen_update_transfer(nonce)),
        unlocks: (0..unlocks).map(|_| gen_unlock()).collect(),
        punishes: vec![],
        announce_disposed: vec![],
    }
}

/// An action set that only carries fraud evidence.
pub fn gen_evidence_only(channel_id: Hash256, punishes: Vec<Punish>) -> ChannelActionSet {
    ChannelActionSet {
        channel_id,
        open_block_number: 10,
        token_address: Address::from([7u8; 20]),
        partner_address: Address::from([8u8; 20]),
        update_transfer: None,
        punishes,
        ..Default::default()
    }
}
