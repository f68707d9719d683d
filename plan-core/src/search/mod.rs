//! Single-block optimizer: a beam-pruned dynamic-programming search over
//! (size used, residual resources, per-business counts, mandatory coverage)
//! followed by back-reconstruction of the winning placement order.
//!
//! The search ranks states with a heuristic estimate; the returned plan's
//! income always comes from the [`crate::simulate`] replay of the
//! reconstructed sequence, never from estimator values.

mod beam;
mod estimate;
mod state;
mod transition;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, MISC_TYPE, Variant, expand};
use crate::error::PlanError;
use crate::plan::{self, BlockPlan, DebugInfo};
use crate::simulate;
use crate::types::{RESOURCE_CEILING, ResourceCost, WorkerKind};

use state::{Node, StateKey, StateTable};

// === OPTIONS ===

/// Optimizer options. Defaults match the documented interface:
/// beam width 400, starting resources {1000, 100, 100, 100}.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Emit progress traces and attach the post-hoc `DebugInfo` report.
    /// Never alters decisions.
    pub debug: bool,
    /// States retained per size bucket after pruning. Must be at least 1.
    pub beam_width: usize,
    pub starting_resources: ResourceCost,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug: false,
            beam_width: 400,
            starting_resources: ResourceCost::new(1000, 100, 100, 100),
        }
    }
}

/// How the solve treats mandatory flags on misc-type variants. The
/// multi-block driver overrides them off for every block except the last
/// instead of cloning the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MandatoryPolicy {
    Honor,
    IgnoreMisc,
}

// === SEARCH CONTEXT ===

/// Immutable per-solve indexes derived from the expanded variants.
pub(crate) struct SearchContext<'a> {
    pub variants: &'a [Variant],
    pub size_limit: u32,
    /// Distinct business names in canonical order; vector positions are the
    /// business indices used throughout the node aggregates.
    pub businesses: Vec<String>,
    pub business_of: Vec<Option<u16>>,
    /// Business indices each residents variant is willing to staff
    /// (every business when the variant declares no preference).
    pub preference_targets: Vec<Box<[u16]>>,
    pub mandatory_bit_of: Vec<Option<u8>>,
    /// Mandatory flag per variant after applying the policy override.
    pub effective_mandatory: Vec<bool>,
    pub required_mask: u64,
    /// Per-axis upper clamps for resource balances.
    pub bounds: ResourceCost,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        variants: &'a [Variant],
        size_limit: u32,
        starting_resources: ResourceCost,
        policy: MandatoryPolicy,
    ) -> Result<Self, PlanError> {
        let businesses: Vec<String> = variants
            .iter()
            .filter(|v| v.worker_kind == WorkerKind::Employees)
            .map(|v| v.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let business_index: BTreeMap<&str, u16> = businesses
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i as u16))
            .collect();

        let business_of: Vec<Option<u16>> = variants
            .iter()
            .map(|v| match v.worker_kind {
                WorkerKind::Employees => business_index.get(v.name.as_str()).copied(),
                _ => None,
            })
            .collect();

        let all_businesses: Box<[u16]> = (0..businesses.len() as u16).collect();
        let preference_targets: Vec<Box<[u16]>> = variants
            .iter()
            .map(|v| {
                if v.worker_kind != WorkerKind::Residents {
                    return Box::default();
                }
                if v.prefers.is_empty() {
                    return all_businesses.clone();
                }
                v.prefers
                    .iter()
                    .filter_map(|name| business_index.get(name.as_str()).copied())
                    .collect()
            })
            .collect();

        let effective_mandatory: Vec<bool> = variants
            .iter()
            .map(|v| {
                v.mandatory && !(policy == MandatoryPolicy::IgnoreMisc && v.building_type == MISC_TYPE)
            })
            .collect();

        let mandatory_names: Vec<&str> = variants
            .iter()
            .zip(&effective_mandatory)
            .filter(|(v, m)| **m && v.building_type == MISC_TYPE)
            .map(|(v, _)| v.name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if mandatory_names.len() > 64 {
            return Err(PlanError::InvalidCatalog(format!(
                "{} mandatory misc names exceed the coverage mask width of 64",
                mandatory_names.len()
            )));
        }
        let mandatory_bit: BTreeMap<&str, u8> = mandatory_names
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, i as u8))
            .collect();
        let mandatory_bit_of: Vec<Option<u8>> = variants
            .iter()
            .map(|v| {
                if v.building_type == MISC_TYPE {
                    mandatory_bit.get(v.name.as_str()).copied()
                } else {
                    None
                }
            })
            .collect();
        let required_mask = if mandatory_names.is_empty() {
            0
        } else {
            u64::MAX >> (64 - mandatory_names.len())
        };

        let bounds = resource_bounds(variants, size_limit, starting_resources);

        Ok(Self {
            variants,
            size_limit,
            businesses,
            business_of,
            preference_targets,
            mandatory_bit_of,
            effective_mandatory,
            required_mask,
            bounds,
        })
    }
}

/// Upper clamp per axis: starting balance plus what the block could gain by
/// filling every size unit with the densest storage variant, hard-capped.
fn resource_bounds(
    variants: &[Variant],
    size_limit: u32,
    starting_resources: ResourceCost,
) -> ResourceCost {
    let mut per_unit = [0u32; 4];
    for v in variants {
        if !v.is_storage() {
            continue;
        }
        let contribution = v
            .storage_resources()
            .expect("storage variant has per-resource storage");
        for (slot, axis) in per_unit.iter_mut().zip(contribution.axes()) {
            *slot = (*slot).max(axis.div_ceil(v.size.max(1)));
        }
    }
    let base = starting_resources.axes();
    let mut upper = [0u32; 4];
    for i in 0..4 {
        upper[i] = base[i]
            .saturating_add(per_unit[i].saturating_mul(size_limit))
            .min(RESOURCE_CEILING);
    }
    ResourceCost::from_axes(upper)
}

// === SOLVE ===

pub(crate) struct SolvedBlock {
    /// Variant indices in placement order.
    pub placements: Vec<usize>,
    pub debug: Option<DebugInfo>,
}

/// Run the DP search and reconstruct the best placement sequence.
pub(crate) fn solve(
    variants: &[Variant],
    size_limit: u32,
    opts: &Options,
    starting_resources: ResourceCost,
    policy: MandatoryPolicy,
) -> Result<SolvedBlock, PlanError> {
    if opts.beam_width < 1 {
        return Err(PlanError::InvalidArgument(
            "beamWidth must be at least 1".to_string(),
        ));
    }

    let ctx = SearchContext::new(variants, size_limit, starting_resources, policy)?;
    let started = Instant::now();
    let mut table = StateTable::new(size_limit);

    let mut root = Node::root(
        starting_resources.clamp_to(&ctx.bounds),
        ctx.businesses.len(),
    );
    root.score = estimate::evaluate(&root, size_limit, 0).score;
    let root_key = root.key(0);
    table.upsert(0, root_key, root);

    for w in 0..=size_limit {
        let frontier = table.frontier(w);
        if frontier.is_empty() {
            continue;
        }
        if opts.debug {
            tracing::debug!(target: "search", size = w, states = frontier.len());
        }

        let mut touched: BTreeSet<u32> = BTreeSet::new();
        for (key, node) in &frontier {
            for vi in 0..variants.len() {
                if let Some((dest, next_key, next)) = transition::successor(&ctx, w, key, node, vi)
                    && table.upsert(dest, next_key, next)
                {
                    touched.insert(dest);
                }
            }
        }
        for dest in touched {
            beam::prune(table.bucket_mut(dest), opts.beam_width, ctx.required_mask);
        }
    }

    let Some((best_size, best_key)) = select_terminal(&table, size_limit, ctx.required_mask) else {
        return Err(PlanError::NoSolution);
    };
    let placements = reconstruct(&table, best_size, best_key);

    let debug = opts.debug.then(|| DebugInfo {
        dp_state_counts: table.state_counts(),
        duration_ms: started.elapsed().as_millis() as u64,
    });

    Ok(SolvedBlock { placements, debug })
}

/// Best terminal across every bucket; restricted to full mandatory coverage
/// when any coverage is required.
fn select_terminal(
    table: &StateTable,
    size_limit: u32,
    required_mask: u64,
) -> Option<(u32, StateKey)> {
    let mut best: Option<(i64, u32, StateKey)> = None;
    for w in 0..=size_limit {
        for (key, node) in table.frontier(w) {
            if required_mask != 0 && node.mask != required_mask {
                continue;
            }
            if best.as_ref().is_none_or(|(score, _, _)| node.score > *score) {
                best = Some((node.score, w, key));
            }
        }
    }
    best.map(|(_, w, key)| (w, key))
}

/// Walk parent pointers from the selected terminal back to the root and
/// return the placements in placement order.
fn reconstruct(table: &StateTable, size: u32, key: StateKey) -> Vec<usize> {
    let mut placements = Vec::new();
    let mut cursor = Some((size, key));
    while let Some((w, key)) = cursor {
        let Some(node) = table.get(w, &key) else {
            break;
        };
        if let Some(vi) = node.variant_index {
            placements.push(vi as usize);
        }
        cursor = node.prev.clone();
    }
    placements.reverse();
    placements
}

// === PUBLIC ENTRY POINT ===

/// Optimize a single block: expand the catalog, search, replay the winning
/// sequence through the forward simulator, and package the plan.
pub fn optimize(
    catalog: &Catalog,
    size_limit: u32,
    opts: &Options,
) -> Result<BlockPlan, PlanError> {
    let variants = expand(catalog)?;
    let solved = solve(
        &variants,
        size_limit,
        opts,
        opts.starting_resources,
        MandatoryPolicy::Honor,
    )?;
    let report = simulate::simulate(&variants, &solved.placements);
    if opts.debug {
        tracing::debug!(
            target: "optimize",
            placements = solved.placements.len(),
            income = report.total_income,
        );
    }
    Ok(plan::build_block_plan(
        &variants,
        &solved.placements,
        &report,
        solved.debug,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuildingDef;

    fn neutral_catalog() -> Catalog {
        let mut catalog = Catalog::default();
        catalog
            .building_types
            .entry("decor".to_string())
            .or_default()
            .insert(
                "Fountain".to_string(),
                BuildingDef {
                    base_income: 5,
                    ..Default::default()
                },
            );
        catalog
    }

    #[test]
    fn zero_beam_width_is_rejected_before_any_search() {
        let opts = Options {
            beam_width: 0,
            ..Options::default()
        };
        let err = optimize(&neutral_catalog(), 4, &opts).unwrap_err();
        assert!(matches!(err, PlanError::InvalidArgument(_)));
    }

    #[test]
    fn solve_fills_the_block_with_the_best_neutral() {
        let variants = expand(&neutral_catalog()).unwrap();
        let solved = solve(
            &variants,
            3,
            &Options::default(),
            Options::default().starting_resources,
            MandatoryPolicy::Honor,
        )
        .unwrap();
        assert_eq!(solved.placements, vec![0, 0, 0]);
    }

    #[test]
    fn bounds_ignore_storage_fields_on_workered_buildings() {
        let mut catalog = Catalog::default();
        catalog
            .building_types
            .entry("business".to_string())
            .or_default()
            .insert(
                "Granary".to_string(),
                BuildingDef {
                    base_income: 10,
                    employees: Some(4),
                    storage_capacity: Some(crate::catalog::StorageSpec::PerResource(
                        crate::catalog::CostSpec {
                            wood: Some(50),
                            ..Default::default()
                        },
                    )),
                    ..Default::default()
                },
            );
        let variants = expand(&catalog).unwrap();
        let starting = ResourceCost::new(1000, 100, 100, 100);
        let bounds = resource_bounds(&variants, 8, starting);
        assert_eq!(bounds, starting, "only storage variants widen the clamp");
    }

    #[test]
    fn ignore_misc_policy_clears_the_required_mask() {
        let mut catalog = Catalog::default();
        catalog
            .building_types
            .entry("misc".to_string())
            .or_default()
            .insert(
                "Well".to_string(),
                BuildingDef {
                    mandatory: true,
                    size: Some(2),
                    ..Default::default()
                },
            );
        let variants = expand(&catalog).unwrap();
        let honor = SearchContext::new(
            &variants,
            4,
            ResourceCost::ZERO,
            MandatoryPolicy::Honor,
        )
        .unwrap();
        let ignore = SearchContext::new(
            &variants,
            4,
            ResourceCost::ZERO,
            MandatoryPolicy::IgnoreMisc,
        )
        .unwrap();
        assert_eq!(honor.required_mask, 0b1);
        assert_eq!(ignore.required_mask, 0);
    }
}
