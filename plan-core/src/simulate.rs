//! Forward simulator: replays a placement sequence to compute the
//! authoritative income, exact per-business allocations, and per-type
//! staffing efficiency, honoring residents' preference sets.
//!
//! Residents are pooled by their canonical preference key (sorted business
//! names, or a wildcard for houses with no preference); businesses then
//! draw from the pools in placement order, pools in insertion order.

use std::collections::BTreeMap;

use crate::catalog::Variant;
use crate::types::{Income, Storage, WorkerKind};

// === SHARED INCOME RULES ===

/// Income penalty per duplicate past the second instance of a business.
pub(crate) const DUP_PENALTY_STEP: f64 = 0.1;
/// Instances of one business that carry no duplicate penalty.
pub(crate) const DUP_FREE_COUNT: u32 = 2;

/// Multiplicative income factor for a business placed `count` times:
/// 1.0 up to two instances, then 0.1 off per extra, floored at zero.
pub(crate) fn duplicate_factor(count: u32) -> f64 {
    (1.0 - DUP_PENALTY_STEP * f64::from(count.saturating_sub(DUP_FREE_COUNT))).max(0.0)
}

/// Residential staffing efficiency. Full efficiency when there are no
/// houses, or when no business slots exist to employ anyone.
pub(crate) fn house_efficiency(house_capacity: u32, business_capacity: u64, allocated: u32) -> f64 {
    if house_capacity == 0 || business_capacity == 0 {
        1.0
    } else {
        f64::from(allocated) / f64::from(house_capacity)
    }
}

// === PREFERENCE POOLS ===

/// Canonical identity of a resident pool: the sorted preference set, or
/// the wildcard for houses whose residents staff anything.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PoolKey {
    Any,
    Named(Vec<String>),
}

impl PoolKey {
    fn of(prefers: &[String]) -> Self {
        if prefers.is_empty() {
            return PoolKey::Any;
        }
        let mut names: Vec<String> = prefers.to_vec();
        names.sort();
        names.dedup();
        PoolKey::Named(names)
    }

    fn permits(&self, business: &str) -> bool {
        match self {
            PoolKey::Any => true,
            PoolKey::Named(names) => names.iter().any(|n| n == business),
        }
    }
}

#[derive(Debug)]
struct Pool {
    key: PoolKey,
    remaining: u32,
}

// === REPORT ===

/// Exact accounting for one replayed placement sequence.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// round(business + scaled house + neutral); the plan's income.
    pub total_income: Income,
    pub business_income: f64,
    pub scaled_house_income: f64,
    pub neutral_income: Income,
    pub house_efficiency: f64,
    pub total_house_capacity: u32,
    pub total_allocated_employees: u32,
    pub business_allocated: BTreeMap<String, u32>,
    pub business_capacity: BTreeMap<String, u32>,
    /// Rendered staffing efficiency per building name ("NN%" or "N/A").
    pub efficiency_by_type: BTreeMap<String, String>,
}

/// Replay `placements` (indices into `variants`, in placement order).
pub fn simulate(variants: &[Variant], placements: &[usize]) -> SimulationReport {
    // Pass 1: inventory.
    let mut pools: Vec<Pool> = Vec::new();
    let mut total_house_capacity = 0u32;
    let mut house_base_income: Income = 0;
    let mut neutral_income: Income = 0;
    let mut business_capacity: BTreeMap<String, u32> = BTreeMap::new();
    let mut placement_counts: BTreeMap<&str, u32> = BTreeMap::new();

    for &vi in placements {
        let v = &variants[vi];
        match v.worker_kind {
            WorkerKind::Residents => {
                total_house_capacity += v.capacity;
                house_base_income += v.income;
                let key = PoolKey::of(&v.prefers);
                match pools.iter_mut().find(|p| p.key == key) {
                    Some(pool) => pool.remaining += v.capacity,
                    None => pools.push(Pool {
                        key,
                        remaining: v.capacity,
                    }),
                }
            }
            WorkerKind::Employees => {
                *business_capacity.entry(v.name.clone()).or_insert(0) += v.capacity;
                *placement_counts.entry(v.name.as_str()).or_insert(0) += 1;
            }
            WorkerKind::None => {
                neutral_income += v.income;
            }
        }
    }

    // Pass 2: staffing, in placement order.
    let mut business_income = 0.0;
    let mut business_allocated: BTreeMap<String, u32> = BTreeMap::new();
    let mut total_allocated = 0u32;

    for &vi in placements {
        let v = &variants[vi];
        if v.worker_kind != WorkerKind::Employees {
            continue;
        }
        let mut allocated = 0u32;
        for pool in pools.iter_mut() {
            if allocated == v.capacity {
                break;
            }
            if !pool.key.permits(&v.name) {
                continue;
            }
            let draw = pool.remaining.min(v.capacity - allocated);
            pool.remaining -= draw;
            allocated += draw;
        }
        total_allocated += allocated;
        *business_allocated.entry(v.name.clone()).or_insert(0) += allocated;

        let efficiency = if v.capacity == 0 {
            1.0
        } else {
            f64::from(allocated) / f64::from(v.capacity)
        };
        let count = placement_counts.get(v.name.as_str()).copied().unwrap_or(0);
        business_income += v.income as f64 * efficiency * duplicate_factor(count);
    }

    let total_business_capacity: u64 = business_capacity.values().map(|&c| u64::from(c)).sum();
    let house_eff = house_efficiency(total_house_capacity, total_business_capacity, total_allocated);
    let scaled_house_income = house_base_income as f64 * house_eff;

    let total_income =
        (business_income + scaled_house_income + neutral_income as f64).round() as Income;

    let efficiency_by_type = render_efficiencies(
        variants,
        placements,
        &business_allocated,
        &business_capacity,
        &placement_counts,
        house_eff,
    );

    SimulationReport {
        total_income,
        business_income,
        scaled_house_income,
        neutral_income,
        house_efficiency: house_eff,
        total_house_capacity,
        total_allocated_employees: total_allocated,
        business_allocated,
        business_capacity,
        efficiency_by_type,
    }
}

/// Per-name staffing efficiency, rendered. Businesses report allocation
/// rate minus the duplicate penalty; houses report the global residential
/// rate; unstaffed buildings report "100%" unless they are per-resource
/// storage, which has no meaningful rate.
fn render_efficiencies(
    variants: &[Variant],
    placements: &[usize],
    business_allocated: &BTreeMap<String, u32>,
    business_capacity: &BTreeMap<String, u32>,
    placement_counts: &BTreeMap<&str, u32>,
    house_eff: f64,
) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for &vi in placements {
        let v = &variants[vi];
        if out.contains_key(&v.name) {
            continue;
        }
        let rendered = match v.worker_kind {
            WorkerKind::Employees => {
                let allocated = business_allocated.get(&v.name).copied().unwrap_or(0);
                let capacity = business_capacity.get(&v.name).copied().unwrap_or(0);
                let rate = if capacity == 0 {
                    1.0
                } else {
                    f64::from(allocated) / f64::from(capacity)
                };
                let count = placement_counts.get(v.name.as_str()).copied().unwrap_or(0);
                let penalty =
                    DUP_PENALTY_STEP * f64::from(count.saturating_sub(DUP_FREE_COUNT));
                percent((rate - penalty).max(0.0))
            }
            WorkerKind::Residents => percent(house_eff),
            WorkerKind::None => match v.storage {
                Some(Storage::Resources(_)) => "N/A".to_string(),
                _ => "100%".to_string(),
            },
        };
        out.insert(v.name.clone(), rendered);
    }
    out
}

fn percent(rate: f64) -> String {
    format!("{}%", (rate * 100.0).round() as i64)
}
