use crate::delegate::{
    BlockNumberStore, DelegateError, DelegationKey, MonitorScheduler, MonitorTrigger,
};
use crate::tests::test_utils::*;

#[test]
fn test_settlement_triggers() {
    let (store, _dir) = generate_store();
    let scheduler = MonitorScheduler::new(store, 30);
    let key = DelegationKey::new(gen_rand_sha256_hash(), gen_rand_address());

    assert_eq!(
        scheduler.settlement_triggers(100, key),
        [
            MonitorTrigger {
                block_number: 100,
                key
            },
            MonitorTrigger {
                block_number: 70,
                key
            },
        ]
    );
    // Saturates instead of wrapping for settle block numbers below the timeout.
    assert_eq!(scheduler.settlement_triggers(20, key)[1].block_number, 0);
}

#[test]
fn test_register_and_query_triggers() {
    let (store, _dir) = generate_store();
    let scheduler = MonitorScheduler::new(store, 30);
    let mut keys = [
        DelegationKey::new(gen_rand_sha256_hash(), gen_rand_address()),
        DelegationKey::new(gen_rand_sha256_hash(), gen_rand_address()),
    ];
    keys.sort();
    let [first, second] = keys;

    scheduler.register_trigger(100, second).unwrap();
    scheduler.register_trigger(100, first).unwrap();
    scheduler.register_trigger(130, first).unwrap();
    scheduler.register_trigger(130, first).unwrap();

    assert_eq!(scheduler.triggers_at(100).unwrap(), vec![first, second]);
    assert!(scheduler.triggers_at(99).unwrap().is_empty());

    let due = scheduler.due_triggers(99, 130).unwrap();
    assert_eq!(
        due.iter().map(|t| (t.block_number, t.key)).collect::<Vec<_>>(),
        vec![(100, first), (100, second), (130, first)]
    );
    assert!(scheduler.due_triggers(100, 129).unwrap().is_empty());
    assert!(scheduler.due_triggers(130, 130).unwrap().is_empty());
    assert!(scheduler.due_triggers(200, 100).unwrap().is_empty());
}

#[test]
fn test_triggers_below_scanned_height_are_moved_up() {
    let (store, _dir) = generate_store();
    let scheduler = MonitorScheduler::new(store, 30);
    let key = DelegationKey::new(gen_rand_sha256_hash(), gen_rand_address());

    assert!(scheduler.take_due_triggers(0, 80).unwrap().is_empty());
    scheduler.register_trigger(70, key).unwrap();
    scheduler.register_trigger(100, key).unwrap();

    assert!(scheduler.triggers_at(70).unwrap().is_empty());
    assert_eq!(scheduler.triggers_at(81).unwrap(), vec![key]);
    assert_eq!(scheduler.triggers_at(100).unwrap(), vec![key]);

    let due = scheduler.take_due_triggers(80, 81).unwrap();
    assert_eq!(
        due,
        vec![MonitorTrigger {
            block_number: 81,
            key
        }]
    );
}

#[test]
fn test_triggers_below_persisted_height_are_moved_up() {
    let (store, _dir) = generate_store();
    store.set_latest_block_number(150).unwrap();
    let scheduler = MonitorScheduler::new(store, 30);
    let key = DelegationKey::new(gen_rand_sha256_hash(), gen_rand_address());

    let mut persisted = vec![];
    scheduler
        .register_with(&scheduler.settlement_triggers(100, key), |triggers| {
            persisted.extend_from_slice(triggers);
            Ok::<_, crate::store::StoreError>(())
        })
        .unwrap();

    assert_eq!(persisted.len(), 2);
    assert!(persisted.iter().all(|t| t.block_number == 151 && t.key == key));
}

#[test]
fn test_chain_height_never_decreases() {
    let (store, _dir) = generate_store();
    let scheduler = MonitorScheduler::new(store.clone(), 30);

    assert_eq!(scheduler.advance_chain_height(120).unwrap(), 120);
    assert_eq!(scheduler.advance_chain_height(120).unwrap(), 120);
    let err = scheduler.advance_chain_height(119).unwrap_err();
    assert!(matches!(
        err,
        DelegateError::BlockNumberRegression {
            latest: 120,
            requested: 119
        }
    ));
    assert!(!err.is_fatal());
    assert_eq!(store.get_latest_block_number().unwrap(), 120);
}
