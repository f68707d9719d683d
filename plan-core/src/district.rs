//! Multi-block driver: sequences single-block solves, threads storage
//! carry-over between blocks, and defers mandatory misc buildings to the
//! last block by reserving their footprint up front.

use std::collections::BTreeMap;

use crate::catalog::{Catalog, MISC_TYPE, Variant, expand};
use crate::error::PlanError;
use crate::plan::{self, BlockOutcome, DistrictPlan};
use crate::search::{self, MandatoryPolicy, Options};
use crate::simulate;
use crate::types::Income;

/// Optimize `block_count` blocks of `size_limit` each.
///
/// With a single block this is exactly the single-block optimizer. With
/// more, every block is solved with misc mandatory flags overridden off and
/// the highest-level mandatory variant of each mandatory misc name is
/// injected into the last block, whose size budget shrinks by the reserved
/// footprint. Storage contributions carry over: block `i` starts from the
/// base resources plus everything blocks `1..i` contributed.
///
/// Any sub-solve without a feasible layout aborts the whole run with
/// [`PlanError::NoSolution`].
pub fn optimize_blocks(
    catalog: &Catalog,
    block_count: u32,
    size_limit: u32,
    opts: &Options,
) -> Result<DistrictPlan, PlanError> {
    if block_count < 1 {
        return Err(PlanError::InvalidArgument(
            "block count must be at least 1".to_string(),
        ));
    }

    let base = opts.starting_resources;

    if block_count == 1 {
        let block = search::optimize(catalog, size_limit, opts)?;
        let block_storage = plan::storage_contribution(&block.combination);
        return Ok(DistrictPlan {
            aggregate_total_income: block.total_income,
            aggregate_total_storage: base.saturating_add(&block_storage),
            base_storage: base,
            debug_info: block.debug_info.clone().map(|d| vec![d]),
            blocks: vec![BlockOutcome {
                block_number: 1,
                combination: block.combination,
                total_income: block.total_income,
                average_efficiency_by_type: block.average_efficiency_by_type,
                total_size: block.total_size,
                block_storage,
            }],
        });
    }

    let variants = expand(catalog)?;
    let reserved = reserved_variants(&variants);
    let reserved_size: u32 = reserved.iter().map(|&vi| variants[vi].size).sum();
    let reserved_income: Income = reserved.iter().map(|&vi| variants[vi].income).sum();
    let Some(last_limit) = size_limit.checked_sub(reserved_size) else {
        return Err(PlanError::NoSolution);
    };

    let mut cumulative = base;
    let mut blocks = Vec::with_capacity(block_count as usize);
    let mut debug_infos = Vec::new();
    let mut aggregate_income: Income = 0;

    for block_number in 1..=block_count {
        let last = block_number == block_count;
        let limit = if last { last_limit } else { size_limit };

        let solved = search::solve(
            &variants,
            limit,
            opts,
            cumulative,
            MandatoryPolicy::IgnoreMisc,
        )?;
        let report = simulate::simulate(&variants, &solved.placements);
        let mut block = plan::build_block_plan(&variants, &solved.placements, &report, None);
        if let Some(debug) = solved.debug {
            debug_infos.push(debug);
        }

        if last {
            // Injected as-is: the reserved footprint was budgeted, but the
            // block's terminal resources are not re-checked against the
            // reserved variants' costs.
            if opts.debug && !reserved.is_empty() {
                tracing::debug!(
                    target: "district",
                    reserved = reserved.len(),
                    reserved_size,
                    "injecting reserved mandatory variants into the last block"
                );
            }
            for &vi in &reserved {
                let v = &variants[vi];
                block.combination.push(plan::entry_for(v, 1));
                block.total_size += v.size;
                block
                    .average_efficiency_by_type
                    .entry(v.name.clone())
                    .or_insert_with(|| default_efficiency(v));
            }
            block.total_income += reserved_income;
        }

        let block_storage = plan::storage_contribution(&block.combination);
        aggregate_income += block.total_income;
        cumulative = cumulative.saturating_add(&block_storage);

        blocks.push(BlockOutcome {
            block_number,
            combination: block.combination,
            total_income: block.total_income,
            average_efficiency_by_type: block.average_efficiency_by_type,
            total_size: block.total_size,
            block_storage,
        });
    }

    Ok(DistrictPlan {
        blocks,
        aggregate_total_income: aggregate_income,
        aggregate_total_storage: cumulative,
        base_storage: base,
        debug_info: opts.debug.then_some(debug_infos),
    })
}

/// The reservation set: for each misc name with any mandatory level, the
/// highest mandatory level of that name.
fn reserved_variants(variants: &[Variant]) -> Vec<usize> {
    let mut best: BTreeMap<&str, usize> = BTreeMap::new();
    for (vi, v) in variants.iter().enumerate() {
        if v.building_type != MISC_TYPE || !v.mandatory {
            continue;
        }
        match best.get(v.name.as_str()) {
            Some(&held) if variants[held].level >= v.level => {}
            _ => {
                best.insert(v.name.as_str(), vi);
            }
        }
    }
    best.into_values().collect()
}

/// Efficiency entry for an injected variant the simulator never saw.
fn default_efficiency(v: &Variant) -> String {
    if v.is_storage() {
        "N/A".to_string()
    } else {
        "100%".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuildingDef, UpgradeDef};

    fn misc(mandatory: bool, size: i64) -> BuildingDef {
        BuildingDef {
            mandatory,
            size: Some(size),
            ..Default::default()
        }
    }

    fn catalog_with_misc(entries: &[(&str, BuildingDef)]) -> Catalog {
        let mut catalog = Catalog::default();
        let misc_types = catalog
            .building_types
            .entry(MISC_TYPE.to_string())
            .or_default();
        for (name, def) in entries {
            misc_types.insert(name.to_string(), def.clone());
        }
        catalog
    }

    #[test]
    fn reservation_picks_the_highest_mandatory_level() {
        let mut def = misc(true, 2);
        def.upgrades = vec![
            UpgradeDef {
                level: 2,
                ..Default::default()
            },
            UpgradeDef {
                level: 3,
                ..Default::default()
            },
        ];
        let catalog = catalog_with_misc(&[("Well", def)]);
        let variants = expand(&catalog).unwrap();
        let reserved = reserved_variants(&variants);
        assert_eq!(reserved.len(), 1);
        assert_eq!(variants[reserved[0]].level, 3, "base mandatory propagates to upgrades");
    }

    #[test]
    fn non_mandatory_misc_is_not_reserved() {
        let catalog = catalog_with_misc(&[("Bench", misc(false, 1))]);
        let variants = expand(&catalog).unwrap();
        assert!(reserved_variants(&variants).is_empty());
    }

    #[test]
    fn zero_blocks_is_an_invalid_argument() {
        let err = optimize_blocks(&Catalog::default(), 0, 4, &Options::default()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidArgument(_)));
    }

    #[test]
    fn oversized_reservation_has_no_solution() {
        let catalog = catalog_with_misc(&[("Vault", misc(true, 10))]);
        let err = optimize_blocks(&catalog, 2, 4, &Options::default()).unwrap_err();
        assert_eq!(err, PlanError::NoSolution);
    }
}
