//! Beam pruner: after a bucket receives updates, keep only the top-K
//! states, preferring states that already cover every mandatory name.

use std::collections::HashMap;

use super::state::{Node, StateKey};

/// Retain the best `beam_width` entries of a bucket.
///
/// Ranking is lexicographic: full mandatory coverage first (only meaningful
/// when `required_mask` is non-zero), then score descending, then key order
/// so equal-score boundaries cut deterministically. Deleted entries are
/// irrecoverable; this only ever runs on buckets the outer loop has not
/// processed yet, so no surviving state's ancestry is touched.
pub(super) fn prune(
    bucket: &mut HashMap<StateKey, Node>,
    beam_width: usize,
    required_mask: u64,
) {
    if bucket.len() <= beam_width {
        return;
    }

    let mut ranked: Vec<(bool, i64, StateKey)> = bucket
        .iter()
        .map(|(key, node)| {
            let covered = required_mask != 0 && node.mask == required_mask;
            (covered, node.score, key.clone())
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(b.1.cmp(&a.1))
            .then(a.2.cmp(&b.2))
    });

    for (_, _, key) in ranked.drain(beam_width..) {
        bucket.remove(&key);
    }
}
