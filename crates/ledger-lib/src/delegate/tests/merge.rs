use crate::delegate::{merge_announce_disposed, merge_punishes, TxRecord};
use crate::tests::test_utils::*;

#[test]
fn test_merge_punishes_appends_unknown() {
    let (a, b, c) = (gen_punish(), gen_punish(), gen_punish());
    let mut stored = vec![a.clone()];
    merge_punishes(&mut stored, &[b.clone(), a.clone(), c.clone()]);
    assert_eq!(stored, vec![a, b, c]);
}

#[test]
fn test_merge_punishes_keeps_stored_entry() {
    let mut stored = vec![gen_punish()];
    let mut executed = stored[0].clone();
    executed.tx = TxRecord::failed("reverted");
    let mut replacement = stored[0].clone();
    replacement.signature = vec![9; 65];

    stored[0] = executed.clone();
    merge_punishes(&mut stored, &[replacement]);
    assert_eq!(stored, vec![executed]);
}

#[test]
fn test_merge_is_idempotent() {
    let incoming = vec![gen_punish(), gen_punish()];
    let mut once = vec![gen_punish()];
    merge_punishes(&mut once, &incoming);
    let mut twice = once.clone();
    merge_punishes(&mut twice, &incoming);
    assert_eq!(once, twice);

    let announcements = vec![gen_announce_disposed(), gen_announce_disposed()];
    let mut once = vec![];
    merge_announce_disposed(&mut once, &announcements);
    let mut twice = once.clone();
    merge_announce_disposed(&mut twice, &announcements);
    assert_eq!(once, twice);
    assert_eq!(once, announcements);
}

#[test]
fn test_merge_deduplicates_incoming() {
    let announcement = gen_announce_disposed();
    let mut stored = vec![];
    merge_announce_disposed(&mut stored, &[announcement, announcement]);
    assert_eq!(stored, vec![announcement]);
}
