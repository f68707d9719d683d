//! Heuristic estimator: converts a candidate state's aggregates into the
//! scalar score used to rank states inside a size bucket.
//!
//! The estimate staffs businesses greedily from a shared pool of resident
//! capacity, highest income-per-worker first, then charges an opportunity
//! cost for every slot left unstaffed. It only ranks states; the Forward
//! Simulator computes the authoritative income after the search.

use crate::simulate::{duplicate_factor, house_efficiency};

use super::state::Node;

// === CONSTANTS ===

/// Opportunity cost per unstaffed slot when no business income exists yet.
const FALLBACK_INCOME_PER_WORKER: f64 = 15.0;
/// Tie-breaker credit per unused size unit.
const SPACE_BONUS_PER_UNIT: f64 = 0.1;

// === ESTIMATE ===

#[derive(Debug, Clone, Copy)]
pub(crate) struct Estimate {
    pub score: i64,
    /// Residents the greedy pass managed to place into business slots.
    pub allocated: u32,
}

/// Score a state's aggregates at `used_size` out of `size_limit`.
pub(crate) fn evaluate(node: &Node, size_limit: u32, used_size: u32) -> Estimate {
    let businesses = node.business_capacity.len();

    // Rank staffable businesses by discounted income per worker.
    let mut items: Vec<(usize, f64, u32)> = Vec::with_capacity(businesses);
    for b in 0..businesses {
        let capacity = node.business_capacity[b];
        let preference = node.preference_capacity[b];
        if capacity == 0 || preference == 0 {
            continue;
        }
        let income_per_worker = node.business_income_base[b] as f64 / f64::from(capacity)
            * duplicate_factor(u32::from(node.counts[b]));
        let effective_staffing = capacity.min(preference);
        items.push((b, income_per_worker, effective_staffing));
    }
    items.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    // Greedy draw from the shared resident pool.
    let mut used = vec![0u32; businesses];
    let mut remaining = node.total_house_capacity;
    let mut allocated = 0u32;
    let mut business_income_estimate = 0.0;
    for (b, income_per_worker, effective_staffing) in items {
        let take = remaining.min(effective_staffing);
        if take == 0 {
            continue;
        }
        used[b] = take;
        allocated += take;
        remaining -= take;
        business_income_estimate += f64::from(take) * income_per_worker;
    }

    // Opportunity cost of slots nobody can fill.
    let total_capacity: u64 = node.business_capacity.iter().map(|&c| u64::from(c)).sum();
    let total_unstaffed: u64 = (0..businesses)
        .map(|b| u64::from(node.business_capacity[b].saturating_sub(used[b])))
        .sum();
    let avg_income_per_worker = if total_capacity > 0 {
        node.business_income_base.iter().sum::<i64>() as f64 / total_capacity as f64
    } else {
        FALLBACK_INCOME_PER_WORKER
    };
    let penalty = total_unstaffed as f64 * avg_income_per_worker;

    let house_eff = house_efficiency(node.total_house_capacity, total_capacity, allocated);
    let scaled_house_income = node.house_base_income as f64 * house_eff;

    let space_bonus = f64::from(size_limit - used_size) * SPACE_BONUS_PER_UNIT;

    let score = (business_income_estimate + scaled_house_income + node.income_neutral as f64
        - penalty
        + space_bonus)
        .round() as i64;

    Estimate { score, allocated }
}
