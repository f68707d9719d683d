//! End-to-end scenarios exercising the optimizer through its public
//! surface, from catalog to packaged plan.

use plan_core::{
    BuildingDef, Catalog, CostSpec, MISC_TYPE, Options, PlanError, StorageSpec, UpgradeDef,
    optimize, optimize_blocks,
};

// === FIXTURES ===

fn catalog(entries: &[(&str, &str, BuildingDef)]) -> Catalog {
    let mut catalog = Catalog::default();
    for (type_name, name, def) in entries {
        catalog
            .building_types
            .entry(type_name.to_string())
            .or_default()
            .insert(name.to_string(), def.clone());
    }
    catalog
}

fn neutral(size: i64, income: i64) -> BuildingDef {
    BuildingDef {
        base_income: income,
        size: Some(size),
        ..Default::default()
    }
}

fn house(size: i64, capacity: i64, income: i64) -> BuildingDef {
    BuildingDef {
        base_income: income,
        size: Some(size),
        people_capacity: Some(capacity),
        ..Default::default()
    }
}

fn business(size: i64, capacity: i64, income: i64) -> BuildingDef {
    BuildingDef {
        base_income: income,
        size: Some(size),
        employees: Some(capacity),
        ..Default::default()
    }
}

fn mandatory_misc(size: i64) -> BuildingDef {
    BuildingDef {
        size: Some(size),
        mandatory: true,
        ..Default::default()
    }
}

// === SCENARIOS ===

#[test]
fn empty_catalog_yields_an_empty_block() {
    let plan = optimize(&Catalog::default(), 16, &Options::default()).unwrap();
    assert!(plan.combination.is_empty());
    assert_eq!(plan.total_income, 0);
    assert_eq!(plan.total_size, 0);
}

#[test]
fn single_neutral_fills_the_block() {
    let plan = optimize(
        &catalog(&[("decor", "Fountain", neutral(1, 5))]),
        3,
        &Options::default(),
    )
    .unwrap();

    assert_eq!(plan.combination.len(), 1);
    assert_eq!(plan.combination[0].count, 3);
    assert_eq!(plan.total_income, 15);
    assert_eq!(plan.average_efficiency_by_type["Fountain"], "100%");
}

#[test]
fn house_and_business_pair_staffs_fully() {
    let plan = optimize(
        &catalog(&[
            ("house", "Cottage", house(2, 4, 2)),
            ("business", "Mill", business(2, 4, 10)),
        ]),
        4,
        &Options::default(),
    )
    .unwrap();

    assert_eq!(plan.total_income, 12);
    assert_eq!(plan.total_size, 4);
    let counts: Vec<(&str, u32)> = plan
        .combination
        .iter()
        .map(|e| (e.name.as_str(), e.count))
        .collect();
    assert!(counts.contains(&("Cottage", 1)));
    assert!(counts.contains(&("Mill", 1)));
    assert_eq!(plan.average_efficiency_by_type["Mill"], "100%");
    assert_eq!(plan.average_efficiency_by_type["Cottage"], "100%");
}

#[test]
fn mismatched_preferences_keep_the_business_out() {
    let mut picky_house = house(2, 4, 2);
    picky_house.prefers = Some(vec!["OtherBiz".to_string()]);
    let entries = [
        ("house", "Cottage", picky_house),
        ("business", "Mill", business(2, 4, 10)),
    ];

    // With room for exactly one building the block holds a single house.
    let plan = optimize(&catalog(&entries), 2, &Options::default()).unwrap();
    assert_eq!(plan.total_income, 2);
    assert_eq!(plan.combination.len(), 1);
    assert_eq!(plan.combination[0].name, "Cottage");

    // With more room the business still never appears; unstaffable slots
    // are filtered at transition time.
    let plan = optimize(&catalog(&entries), 4, &Options::default()).unwrap();
    assert!(plan.combination.iter().all(|e| e.name != "Mill"));
    assert_eq!(plan.total_income, 4, "two houses at full base income");
}

#[test]
fn uncoverable_mandatory_pair_has_no_solution() {
    let err = optimize(
        &catalog(&[
            (MISC_TYPE, "Shrine", mandatory_misc(2)),
            (MISC_TYPE, "Well", mandatory_misc(2)),
        ]),
        3,
        &Options::default(),
    )
    .unwrap_err();
    assert_eq!(err, PlanError::NoSolution);
}

#[test]
fn coverable_mandatory_pair_is_placed() {
    let plan = optimize(
        &catalog(&[
            (MISC_TYPE, "Shrine", mandatory_misc(2)),
            (MISC_TYPE, "Well", mandatory_misc(2)),
            ("decor", "Fountain", neutral(1, 5)),
        ]),
        5,
        &Options::default(),
    )
    .unwrap();

    for name in ["Shrine", "Well"] {
        assert!(
            plan.combination.iter().any(|e| e.name == name && e.count >= 1),
            "{name} must be covered"
        );
    }
    // The leftover unit still earns.
    assert_eq!(plan.total_income, 5);
}

#[test]
fn reserved_mandatory_lands_only_in_the_last_block() {
    let mut shrine = mandatory_misc(2);
    shrine.storage_capacity = Some(StorageSpec::PerResource(CostSpec {
        wood: Some(30),
        ..Default::default()
    }));
    let plan = optimize_blocks(
        &catalog(&[
            (MISC_TYPE, "Shrine", shrine),
            ("decor", "Fountain", neutral(1, 5)),
        ]),
        3,
        4,
        &Options::default(),
    )
    .unwrap();

    assert_eq!(plan.blocks.len(), 3);
    for block in &plan.blocks[..2] {
        assert!(
            block.combination.iter().all(|e| e.name != "Shrine"),
            "early blocks must not hold the reserved building"
        );
        assert_eq!(block.total_size, 4);
        assert_eq!(block.total_income, 20);
    }

    let last = &plan.blocks[2];
    assert!(last.combination.iter().any(|e| e.name == "Shrine" && e.count == 1));
    assert!(last.total_size <= 4);
    // Two fountains fit beside the reserved footprint.
    assert_eq!(last.total_income, 10);
    assert_eq!(last.average_efficiency_by_type["Shrine"], "N/A");

    // Storage aggregation: only the last block contributes, onto the base.
    assert_eq!(last.block_storage.wood, 30);
    assert_eq!(plan.base_storage.wood, 100);
    assert_eq!(plan.aggregate_total_storage.wood, 130);
    assert_eq!(plan.aggregate_total_income, 50);
}

// === BOUNDARIES ===

#[test]
fn zero_capacity_block_is_empty_unless_coverage_is_required() {
    let decor_only = catalog(&[("decor", "Fountain", neutral(1, 5))]);
    let plan = optimize(&decor_only, 0, &Options::default()).unwrap();
    assert!(plan.combination.is_empty());
    assert_eq!(plan.total_income, 0);

    let with_mandatory = catalog(&[(MISC_TYPE, "Well", mandatory_misc(1))]);
    let err = optimize(&with_mandatory, 0, &Options::default()).unwrap_err();
    assert_eq!(err, PlanError::NoSolution);
}

#[test]
fn catalog_without_businesses_earns_full_house_income() {
    let plan = optimize(
        &catalog(&[
            ("house", "Cottage", house(1, 4, 3)),
            ("decor", "Fountain", neutral(1, 5)),
        ]),
        4,
        &Options::default(),
    )
    .unwrap();

    // Every placement earns at full efficiency, whatever the mix.
    let expected: i64 = plan
        .combination
        .iter()
        .map(|e| e.income_per_building * i64::from(e.count))
        .sum();
    assert_eq!(plan.total_income, expected);
    for entry in &plan.combination {
        assert_eq!(plan.average_efficiency_by_type[&entry.name], "100%");
    }
}

#[test]
fn single_block_district_matches_the_single_block_solve() {
    let entries = [
        ("house", "Cottage", house(2, 4, 2)),
        ("business", "Mill", business(2, 4, 10)),
        ("decor", "Fountain", neutral(1, 5)),
    ];
    let single = optimize(&catalog(&entries), 6, &Options::default()).unwrap();
    let district = optimize_blocks(&catalog(&entries), 1, 6, &Options::default()).unwrap();

    assert_eq!(district.blocks.len(), 1);
    let block = &district.blocks[0];
    assert_eq!(block.total_income, single.total_income);
    assert_eq!(block.combination, single.combination);
    assert_eq!(
        block.average_efficiency_by_type,
        single.average_efficiency_by_type
    );
    assert_eq!(district.aggregate_total_income, single.total_income);
}

#[test]
fn storage_carry_over_unlocks_later_purchases() {
    // A vault is free, earns a little, and banks 100 money per block unit.
    let mut vault = neutral(1, 6);
    vault.storage_capacity = Some(StorageSpec::PerResource(CostSpec {
        money: Some(100),
        ..Default::default()
    }));
    // The monument out-earns everything but costs more than the base budget.
    let monument = BuildingDef {
        base_income: 50,
        size: Some(1),
        base_cost: Some(CostSpec {
            money: Some(1200),
            ..Default::default()
        }),
        ..Default::default()
    };

    let plan = optimize_blocks(
        &catalog(&[
            (MISC_TYPE, "Vault", vault),
            ("decor", "Monument", monument),
        ]),
        2,
        4,
        &Options::default(),
    )
    .unwrap();

    let first = &plan.blocks[0];
    assert!(
        first.combination.iter().all(|e| e.name != "Monument"),
        "the first block cannot afford the monument"
    );
    assert_eq!(first.block_storage.money, 400);

    let second = &plan.blocks[1];
    assert!(
        second.combination.iter().any(|e| e.name == "Monument"),
        "banked storage funds the monument in the second block"
    );
}

// === UPGRADES END TO END ===

#[test]
fn the_best_level_of_an_upgraded_building_wins() {
    let fountain = BuildingDef {
        base_income: 5,
        upgrades: vec![
            UpgradeDef {
                level: 2,
                additional_income: Some(3),
                ..Default::default()
            },
            UpgradeDef {
                level: 3,
                income: Some(20),
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    let plan = optimize(
        &catalog(&[("decor", "Fountain", fountain)]),
        2,
        &Options::default(),
    )
    .unwrap();

    assert_eq!(plan.combination.len(), 1);
    assert_eq!(plan.combination[0].level, 3);
    assert_eq!(plan.combination[0].count, 2);
    assert_eq!(plan.total_income, 40);
}

// === ERRORS ===

#[test]
fn malformed_catalog_fails_before_search() {
    let bad = catalog(&[("decor", "Pit", neutral(1, -5))]);
    let err = optimize(&bad, 4, &Options::default()).unwrap_err();
    assert!(matches!(err, PlanError::InvalidCatalog(_)));
}
