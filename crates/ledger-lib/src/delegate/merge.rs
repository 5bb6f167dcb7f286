//! Accretion of fraud evidence and disposed-lock announcements.
//!
//! Both collections are sets keyed by their hash. Entries already stored are
//! never replaced or removed, which makes merging idempotent.

use std::collections::HashSet;

use super::types::{AnnounceDisposed, Punish};

/// Appends every punish in `incoming` whose lock hash is not in `stored` yet.
pub fn merge_punishes(stored: &mut Vec<Punish>, incoming: &[Punish]) {
    let mut known: HashSet<_> = stored.iter().map(|p| p.lock_hash).collect();
    for punish in incoming {
        if known.insert(punish.lock_hash) {
            stored.push(punish.clone());
        }
    }
}

/// Appends every announcement in `incoming` whose lock secret hash is not in
/// `stored` yet.
pub fn merge_announce_disposed(stored: &mut Vec<AnnounceDisposed>, incoming: &[AnnounceDisposed]) {
    let mut known: HashSet<_> = stored.iter().map(|a| a.lock_secret_hash).collect();
    for announce in incoming {
        if known.insert(announce.lock_secret_hash) {
            stored.push(*announce);
        }
    }
}
