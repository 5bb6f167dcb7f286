use num_bigint::BigUint;

use crate::delegate::{ActionCost, CostModel};
use crate::tests::test_utils::*;

fn model() -> CostModel {
    CostModel::new(
        BigUint::from(10u8),
        BigUint::from(3u8),
        BigUint::from(7u8),
    )
}

#[test]
fn test_cost_of_empty_action_set() {
    let actions = gen_evidence_only(gen_rand_sha256_hash(), vec![]);
    assert_eq!(model().cost(&actions), BigUint::default());
}

#[test]
fn test_cost_is_update_plus_unlocks_plus_single_punish() {
    let mut actions = gen_action_set(gen_rand_sha256_hash(), 1, 3);
    actions.punishes = vec![gen_punish(), gen_punish()];

    let breakdown = model().breakdown(&actions);
    assert_eq!(
        breakdown,
        ActionCost {
            update_transfer: BigUint::from(10u8),
            unlock: BigUint::from(9u8),
            punish: BigUint::from(7u8),
        }
    );
    assert_eq!(model().cost(&actions), BigUint::from(10u8 + 3 * 3 + 7));
}

#[test]
fn test_disposed_announcements_are_free() {
    let mut actions = gen_evidence_only(gen_rand_sha256_hash(), vec![]);
    actions.announce_disposed = vec![gen_announce_disposed(), gen_announce_disposed()];
    assert_eq!(model().cost(&actions), BigUint::default());
}

#[test]
fn test_default_unit_costs() {
    let actions = gen_action_set(gen_rand_sha256_hash(), 1, 2);
    assert_eq!(CostModel::default().cost(&actions), BigUint::from(3u8));
}

#[test]
fn test_action_cost_json() {
    let cost = ActionCost {
        update_transfer: BigUint::from(1u8),
        unlock: BigUint::parse_bytes(b"340282366920938463463374607431768211456", 10).unwrap(),
        punish: BigUint::default(),
    };
    let json = serde_json::to_value(&cost).unwrap();
    assert_eq!(json["unlock"], "340282366920938463463374607431768211456");
    assert_eq!(serde_json::from_value::<ActionCost>(json).unwrap(), cost);
}
