//! Public result types: the packaged outcome of a single-block solve and
//! of the multi-block driver, shaped for JSON consumers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Variant;
use crate::simulate::SimulationReport;
use crate::types::{Income, ResourceCost, Storage, WorkerKind};

// === SINGLE BLOCK ===

/// One grouped line of a block layout: a (name, level) with its placement
/// count and per-building figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinationEntry {
    pub name: String,
    pub level: u32,
    pub count: u32,
    pub size: u32,
    pub income_per_building: Income,
    pub capacity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_capacity: Option<Storage>,
    pub worker_type: WorkerKind,
    #[serde(rename = "type")]
    pub building_type: String,
    pub total_income: Income,
    pub total_size: u32,
}

/// Post-hoc search report. Informational only; produced when the debug
/// option is set and never consulted by the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    /// Live DP states per size bucket at the end of the solve.
    pub dp_state_counts: Vec<usize>,
    pub duration_ms: u64,
}

/// The optimized layout of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPlan {
    pub combination: Vec<CombinationEntry>,
    pub total_income: Income,
    /// Rendered staffing efficiency per building name ("NN%" or "N/A").
    pub average_efficiency_by_type: BTreeMap<String, String>,
    pub total_size: u32,
    /// Sum of scalar (warehouse-number) storage over the combination.
    /// Per-resource storage is reported on the multi-block results instead.
    pub total_storage: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

// === MULTI BLOCK ===

/// One block of a multi-block solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockOutcome {
    /// 1-based position in the solve order.
    pub block_number: u32,
    pub combination: Vec<CombinationEntry>,
    pub total_income: Income,
    pub average_efficiency_by_type: BTreeMap<String, String>,
    pub total_size: u32,
    /// This block's per-resource storage contribution.
    pub block_storage: ResourceCost,
}

/// The aggregated outcome of a multi-block solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictPlan {
    pub blocks: Vec<BlockOutcome>,
    pub aggregate_total_income: Income,
    /// Base resources plus every block's storage contribution, per axis.
    pub aggregate_total_storage: ResourceCost,
    pub base_storage: ResourceCost,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<Vec<DebugInfo>>,
}

// === PACKAGING ===

/// Group a placement sequence into combination entries, preserving first
/// placement order.
pub(crate) fn combination_of(variants: &[Variant], placements: &[usize]) -> Vec<CombinationEntry> {
    let mut order: Vec<usize> = Vec::new();
    let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
    for &vi in placements {
        if !counts.contains_key(&vi) {
            order.push(vi);
        }
        *counts.entry(vi).or_insert(0) += 1;
    }

    order
        .into_iter()
        .map(|vi| entry_for(&variants[vi], counts[&vi]))
        .collect()
}

pub(crate) fn entry_for(v: &Variant, count: u32) -> CombinationEntry {
    CombinationEntry {
        name: v.name.clone(),
        level: v.level,
        count,
        size: v.size,
        income_per_building: v.income,
        capacity: v.capacity,
        storage_capacity: v.storage,
        worker_type: v.worker_kind,
        building_type: v.building_type.clone(),
        total_income: v.income * i64::from(count),
        total_size: v.size * count,
    }
}

/// Per-resource storage contributed by a combination (object-shaped
/// storage only, times placement counts).
pub(crate) fn storage_contribution(combination: &[CombinationEntry]) -> ResourceCost {
    let mut total = ResourceCost::ZERO;
    for entry in combination {
        if let Some(Storage::Resources(per_building)) = entry.storage_capacity {
            for _ in 0..entry.count {
                total = total.saturating_add(&per_building);
            }
        }
    }
    total
}

fn scalar_storage(combination: &[CombinationEntry]) -> u64 {
    combination
        .iter()
        .filter_map(|entry| {
            entry
                .storage_capacity
                .and_then(|s| s.as_scalar())
                .map(|n| u64::from(n) * u64::from(entry.count))
        })
        .sum()
}

pub(crate) fn build_block_plan(
    variants: &[Variant],
    placements: &[usize],
    report: &SimulationReport,
    debug_info: Option<DebugInfo>,
) -> BlockPlan {
    let combination = combination_of(variants, placements);
    let total_size = combination.iter().map(|e| e.total_size).sum();
    let total_storage = scalar_storage(&combination);
    BlockPlan {
        combination,
        total_income: report.total_income,
        average_efficiency_by_type: report.efficiency_by_type.clone(),
        total_size,
        total_storage,
        debug_info,
    }
}
