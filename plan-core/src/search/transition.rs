//! Transition engine: for a live state and a variant, produce the successor
//! state one size bucket down, or nothing when a feasibility filter rejects.
//! Rejection here is silent filtering, never an error.

use crate::types::WorkerKind;

use super::SearchContext;
use super::estimate;
use super::state::{Node, StateKey};

/// Residual-residents key component clamp. The component only diversifies
/// keys, so the exact ceiling is not load-bearing.
const RESIDUAL_RESIDENTS_CAP: u32 = 10_000;

/// Minimum house-to-business capacity ratio a new business slot must keep,
/// as an exact integer comparison: reject when H/B' < 9/10.
fn staffing_ratio_too_low(house_capacity: u32, business_capacity: u64) -> bool {
    u64::from(house_capacity) * 10 < business_capacity * 9
}

/// Apply variant `vi` to `node` (living at size `w` under `parent_key`).
/// Returns the destination bucket, the successor's key, and the successor.
pub(super) fn successor(
    ctx: &SearchContext<'_>,
    w: u32,
    parent_key: &StateKey,
    node: &Node,
    vi: usize,
) -> Option<(u32, StateKey, Node)> {
    let v = &ctx.variants[vi];

    let dest = w + v.size;
    if dest > ctx.size_limit {
        return None;
    }

    // Storage variants pay no cost; everything else must be affordable.
    if !v.is_storage() && !node.resources.covers(&v.costs) {
        return None;
    }

    // Staffing prefeasibility: a non-mandatory business slot must keep the
    // block staffable, and some placed residents must be willing to work it.
    if v.worker_kind == WorkerKind::Employees && !ctx.effective_mandatory[vi] {
        let b = ctx.business_of[vi].expect("employees variant has a business index") as usize;
        let widened: u64 = node
            .business_capacity
            .iter()
            .map(|&c| u64::from(c))
            .sum::<u64>()
            + u64::from(v.capacity);
        if staffing_ratio_too_low(node.total_house_capacity, widened) {
            return None;
        }
        if node.preference_capacity[b] < node.business_capacity[b] + v.capacity {
            return None;
        }
    }

    let mut next = node.clone();
    next.prev = Some((w, parent_key.clone()));
    next.variant_index = Some(vi as u32);

    if let Some(bit) = ctx.mandatory_bit_of[vi] {
        next.mask |= 1u64 << bit;
    }

    // Only true storage variants (unstaffed, per-resource storage) add
    // their contribution; everything else pays its costs, including
    // workered buildings that happen to declare a storage field.
    next.resources = if v.is_storage() {
        let contribution = v
            .storage_resources()
            .expect("storage variant has per-resource storage");
        node.resources.saturating_add(contribution)
    } else {
        node.resources.saturating_sub(&v.costs)
    }
    .clamp_to(&ctx.bounds);

    match v.worker_kind {
        WorkerKind::Employees => {
            let b = ctx.business_of[vi].expect("employees variant has a business index") as usize;
            next.counts[b] = next.counts[b].saturating_add(1);
            next.business_income_base[b] += v.income;
            next.business_capacity[b] += v.capacity;
        }
        WorkerKind::Residents => {
            next.house_base_income += v.income;
            next.total_house_capacity += v.capacity;
            for &b in ctx.preference_targets[vi].iter() {
                next.preference_capacity[b as usize] += v.capacity;
            }
        }
        WorkerKind::None => {
            next.income_neutral += v.income;
        }
    }

    let est = estimate::evaluate(&next, ctx.size_limit, dest);
    next.score = est.score;

    let residual = next
        .total_house_capacity
        .saturating_sub(est.allocated)
        .min(RESIDUAL_RESIDENTS_CAP) as u16;
    let key = next.key(residual);

    Some((dest, key, next))
}
