use crate::delegate::{DelegateStatus, ExecutionReport, TxRecord};
use crate::tests::test_utils::gen_rand_sha256_hash;

fn ok() -> TxRecord {
    TxRecord::succeeded(gen_rand_sha256_hash())
}

fn err() -> TxRecord {
    TxRecord::failed("reverted")
}

#[test]
fn test_resolve_status() {
    assert_eq!(
        ExecutionReport::finished_by_other().resolve_status(),
        DelegateStatus::SuccessFinishedByOther
    );
    assert_eq!(
        ExecutionReport::default().resolve_status(),
        DelegateStatus::SuccessFinished
    );
    assert_eq!(
        ExecutionReport::failed("not enough credit").resolve_status(),
        DelegateStatus::Failed
    );

    let report = ExecutionReport {
        update_transfer: Some(ok()),
        unlocks: vec![ok(), TxRecord::default()],
        ..Default::default()
    };
    assert_eq!(report.resolve_status(), DelegateStatus::SuccessFinished);

    let report = ExecutionReport {
        update_transfer: Some(err()),
        punishes: vec![(gen_rand_sha256_hash(), err())],
        ..Default::default()
    };
    assert_eq!(report.resolve_status(), DelegateStatus::Failed);

    let report = ExecutionReport {
        update_transfer: Some(ok()),
        unlocks: vec![err()],
        ..Default::default()
    };
    assert_eq!(report.resolve_status(), DelegateStatus::PartialSuccess);
}

#[test]
fn test_finished_by_other_wins() {
    let report = ExecutionReport {
        update_transfer: Some(err()),
        finished_by_other: true,
        ..Default::default()
    };
    assert_eq!(report.resolve_status(), DelegateStatus::SuccessFinishedByOther);
}
