mod native;
pub use native::{Batch, DbDirection, IteratorMode, Store};

use std::collections::HashSet;
use std::path::Path;

use super::db_migrate::DbMigrate;
use super::schema::*;
use super::StoreError;
use crate::delegate::{
    Account, AccountStore, ArchivedDelegation, BlockNumberStore, DelegateStore, Delegation,
    DelegationKey, MonitorStore, MonitorTrigger,
};
use crate::types::{Address, Hash256};

use serde::Serialize;
use tracing::info;

pub(crate) fn serialize_to_vec<T: ?Sized + Serialize>(value: &T, field_name: &str) -> Vec<u8> {
    bincode::serialize(value)
        .unwrap_or_else(|e| panic!("serialization of {} failed: {}", field_name, e))
}

pub(crate) fn deserialize_from<'a, T>(slice: &'a [u8], field_name: &'static str) -> Result<T, StoreError>
where
    T: serde::Deserialize<'a>,
{
    bincode::deserialize(slice).map_err(|e| StoreError::Corrupted {
        record: field_name,
        reason: e.to_string(),
    })
}

fn monitor_trigger_height_prefix(block_number: u64) -> Vec<u8> {
    [&[MONITOR_TRIGGER_PREFIX], block_number.to_be_bytes().as_slice()].concat()
}

impl Store {
    pub fn check_validate<P: AsRef<Path>>(path: P) -> Result<(), String> {
        let db = Self::open_db(path.as_ref())?;
        let mut errors = HashSet::new();

        fn check_deserialization<T: serde::de::DeserializeOwned>(
            value: &[u8],
            prefix_name: &'static str,
            errors: &mut HashSet<String>,
        ) {
            if let Err(e) = deserialize_from::<T>(value, prefix_name) {
                errors.insert(format!("Failed to deserialize {}: {}", prefix_name, e));
            }
        }

        for (key, value) in db.prefix_iterator_with_skip_while_and_start(
            &[],
            IteratorMode::Start,
            Box::new(|_| false),
        ) {
            if key.is_empty() {
                errors.insert("Encountered empty key".to_string());
                continue;
            }

            match key[0] {
                DELEGATION_PREFIX => {
                    check_deserialization::<Delegation>(&value, "DELEGATION_PREFIX", &mut errors);
                }
                ARCHIVED_DELEGATION_PREFIX => {
                    check_deserialization::<ArchivedDelegation>(
                        &value,
                        "ARCHIVED_DELEGATION_PREFIX",
                        &mut errors,
                    );
                }
                ACCOUNT_PREFIX => {
                    check_deserialization::<Account>(&value, "ACCOUNT_PREFIX", &mut errors);
                }
                MONITOR_TRIGGER_PREFIX => {
                    check_deserialization::<MonitorTrigger>(
                        &value,
                        "MONITOR_TRIGGER_PREFIX",
                        &mut errors,
                    );
                }
                LATEST_BLOCK_NUMBER_PREFIX => {
                    check_deserialization::<u64>(&value, "LATEST_BLOCK_NUMBER_PREFIX", &mut errors);
                }
                _ => {}
            }
        }

        let mut errors: Vec<String> = errors.into_iter().collect();
        if let Err(version_err) = check_migrate(path, db) {
            errors.push(version_err);
        }
        if errors.is_empty() {
            info!("All keys and values in the store are valid.");
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

pub enum KeyValue {
    Delegation(DelegationKey, Delegation),
    ArchivedDelegation(ArchivedDelegation),
    Account(Address, Account),
    MonitorTrigger(MonitorTrigger),
    LatestBlockNumber(u64),
}

pub trait StoreKeyValue {
    fn key(&self) -> Vec<u8>;
    fn value(&self) -> Vec<u8>;
}

impl StoreKeyValue for KeyValue {
    fn key(&self) -> Vec<u8> {
        match self {
            KeyValue::Delegation(key, _) => {
                [&[DELEGATION_PREFIX], key.to_bytes().as_slice()].concat()
            }
            KeyValue::ArchivedDelegation(archived) => {
                [&[ARCHIVED_DELEGATION_PREFIX], archived.key().as_slice()].concat()
            }
            KeyValue::Account(address, _) => [&[ACCOUNT_PREFIX], address.as_ref()].concat(),
            KeyValue::MonitorTrigger(trigger) => [
                monitor_trigger_height_prefix(trigger.block_number).as_slice(),
                trigger.key.to_bytes().as_slice(),
            ]
            .concat(),
            KeyValue::LatestBlockNumber(_) => vec![LATEST_BLOCK_NUMBER_PREFIX],
        }
    }

    fn value(&self) -> Vec<u8> {
        match self {
            KeyValue::Delegation(_, delegation) => serialize_to_vec(delegation, "Delegation"),
            KeyValue::ArchivedDelegation(archived) => {
                serialize_to_vec(archived, "ArchivedDelegation")
            }
            KeyValue::Account(_, account) => serialize_to_vec(account, "Account"),
            KeyValue::MonitorTrigger(trigger) => serialize_to_vec(trigger, "MonitorTrigger"),
            KeyValue::LatestBlockNumber(block_number) => {
                serialize_to_vec(block_number, "LatestBlockNumber")
            }
        }
    }
}

impl DelegateStore for Store {
    fn get_delegation(&self, key: &DelegationKey) -> Result<Option<Delegation>, StoreError> {
        let key = [&[DELEGATION_PREFIX], key.to_bytes().as_slice()].concat();
        self.get(key)?
            .map(|v| deserialize_from(v.as_ref(), "Delegation"))
            .transpose()
    }

    fn get_delegations_by_channel(
        &self,
        channel_id: &Hash256,
    ) -> Result<Vec<Delegation>, StoreError> {
        let prefix = [&[DELEGATION_PREFIX], channel_id.as_ref()].concat();
        self.prefix_iterator(&prefix)
            .map(|(_key, value)| deserialize_from(value.as_ref(), "Delegation"))
            .collect()
    }

    fn save_delegation(
        &self,
        delegation: &Delegation,
        account: Option<&Account>,
        triggers: &[MonitorTrigger],
    ) -> Result<(), StoreError> {
        let mut batch = self.batch();
        for trigger in triggers {
            batch.put_kv(KeyValue::MonitorTrigger(*trigger))?;
        }
        if let Some(account) = account {
            batch.put_kv(KeyValue::Account(account.address, account.clone()))?;
        }
        batch.put_kv(KeyValue::Delegation(delegation.key, delegation.clone()))?;
        batch.commit()
    }

    fn archive_delegation(
        &self,
        archived: &ArchivedDelegation,
        account: Option<&Account>,
    ) -> Result<(), StoreError> {
        let mut batch = self.batch();
        batch.delete(
            [
                &[DELEGATION_PREFIX],
                archived.delegation.key.to_bytes().as_slice(),
            ]
            .concat(),
        )?;
        if let Some(account) = account {
            batch.put_kv(KeyValue::Account(account.address, account.clone()))?;
        }
        batch.put_kv(KeyValue::ArchivedDelegation(archived.clone()))?;
        batch.commit()
    }

    fn get_archived_delegations(
        &self,
        channel_id: &Hash256,
    ) -> Result<Vec<ArchivedDelegation>, StoreError> {
        let prefix = [&[ARCHIVED_DELEGATION_PREFIX], channel_id.as_ref()].concat();
        self.prefix_iterator(&prefix)
            .map(|(_key, value)| deserialize_from(value.as_ref(), "ArchivedDelegation"))
            .collect()
    }
}

impl AccountStore for Store {
    fn get_account(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        let key = [&[ACCOUNT_PREFIX], address.as_ref()].concat();
        self.get(key)?
            .map(|v| deserialize_from(v.as_ref(), "Account"))
            .transpose()
    }

    fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut batch = self.batch();
        batch.put_kv(KeyValue::Account(account.address, account.clone()))?;
        batch.commit()
    }
}

impl MonitorStore for Store {
    fn insert_monitor_trigger(&self, trigger: MonitorTrigger) -> Result<(), StoreError> {
        let mut batch = self.batch();
        batch.put_kv(KeyValue::MonitorTrigger(trigger))?;
        batch.commit()
    }

    fn get_monitor_triggers(&self, block_number: u64) -> Result<Vec<DelegationKey>, StoreError> {
        let prefix = monitor_trigger_height_prefix(block_number);
        self.prefix_iterator(&prefix)
            .map(|(_key, value)| {
                deserialize_from::<MonitorTrigger>(value.as_ref(), "MonitorTrigger")
                    .map(|trigger| trigger.key)
            })
            .collect()
    }

    fn get_monitor_triggers_in_range(
        &self,
        after: u64,
        up_to: u64,
    ) -> Result<Vec<MonitorTrigger>, StoreError> {
        let Some(from) = after.checked_add(1) else {
            return Ok(vec![]);
        };
        let prefix = [MONITOR_TRIGGER_PREFIX];
        let start = monitor_trigger_height_prefix(from);
        let end = monitor_trigger_height_prefix(up_to);
        self.prefix_iterator_with_skip_while_and_start(
            &prefix,
            IteratorMode::From(&start, DbDirection::Forward),
            Box::new(|_| false),
        )
        .take_while(|(key, _)| {
            key.get(..end.len())
                .is_some_and(|height| height <= end.as_slice())
        })
        .map(|(_key, value)| deserialize_from(value.as_ref(), "MonitorTrigger"))
        .collect()
    }
}

impl BlockNumberStore for Store {
    fn get_latest_block_number(&self) -> Result<u64, StoreError> {
        Ok(self
            .get([LATEST_BLOCK_NUMBER_PREFIX])?
            .map(|v| deserialize_from(v.as_ref(), "LatestBlockNumber"))
            .transpose()?
            .unwrap_or_default())
    }

    fn set_latest_block_number(&self, block_number: u64) -> Result<(), StoreError> {
        let mut batch = self.batch();
        batch.put_kv(KeyValue::LatestBlockNumber(block_number))?;
        batch.commit()
    }
}

/// Check if the database needs to be migrated
pub fn check_migrate<P: AsRef<Path>>(path: P, db: Store) -> Result<Store, String> {
    let migrate = DbMigrate::new(&db);
    migrate.init_or_check(path)?;
    Ok(db)
}
