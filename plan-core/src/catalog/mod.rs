//! Catalog input model.
//!
//! Mirrors the logical JSON shape accepted at the boundary:
//! `{ buildingTypes: { typeName -> { buildingName -> definition } } }`.
//! Numeric fields stay signed here so that malformed (negative) inputs
//! survive deserialization and are rejected by the expander as
//! [`InvalidCatalog`](crate::PlanError::InvalidCatalog) rather than as an
//! opaque parse error. Unknown fields are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod expand;

pub use expand::{Variant, expand};

/// The building type family whose mandatory entries must all be covered by
/// an accepted block layout.
pub const MISC_TYPE: &str = "misc";

/// Top-level catalog: building definitions grouped by type family.
///
/// `BTreeMap` keeps type and building names in a canonical order, which in
/// turn fixes variant order, mandatory bit assignment, and business
/// indices across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub building_types: BTreeMap<String, BTreeMap<String, BuildingDef>>,
}

/// One building definition: the level-1 shape plus optional upgrades.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildingDef {
    pub base_income: i64,
    /// Footprint in block size units. Defaults to 1.
    pub size: Option<i64>,
    /// Worker slots; presence marks the building as a business.
    pub employees: Option<i64>,
    /// Resident slots; presence marks the building as a house.
    pub people_capacity: Option<i64>,
    pub storage_capacity: Option<StorageSpec>,
    /// Alias for `storage_capacity` used by parts of the catalog format.
    pub capacity: Option<StorageSpec>,
    pub base_cost: Option<CostSpec>,
    pub mandatory: bool,
    /// Business names the residents of this house are willing to staff.
    /// Absent or empty means any business.
    pub prefers: Option<Vec<String>>,
    pub upgrades: Vec<UpgradeDef>,
}

/// One upgrade level of a building definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpgradeDef {
    pub level: i64,
    /// Absolute income at this level; overrides incremental accumulation.
    pub income: Option<i64>,
    /// Incremental income added on top of the previous level.
    pub additional_income: Option<i64>,
    pub employees: Option<i64>,
    pub people_capacity: Option<i64>,
    pub storage_capacity: Option<StorageSpec>,
    pub capacity: Option<StorageSpec>,
    pub cost: Option<CostSpec>,
    pub mandatory: bool,
    pub prefers: Option<Vec<String>>,
}

/// Storage declared either as a plain number or as a per-resource object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StorageSpec {
    Scalar(i64),
    PerResource(CostSpec),
}

/// A resource bundle with every axis optional. Missing axes read as 0;
/// a `CostSpec` with no axis present at all counts as "not declared" for
/// cost-inheritance purposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostSpec {
    pub money: Option<i64>,
    pub wood: Option<i64>,
    pub cement: Option<i64>,
    pub steel: Option<i64>,
}

impl CostSpec {
    /// True when at least one axis was declared.
    pub fn has_any(&self) -> bool {
        self.money.is_some() || self.wood.is_some() || self.cement.is_some() || self.steel.is_some()
    }

    /// Axis values with missing axes as 0, in canonical order.
    pub fn amounts(&self) -> [i64; 4] {
        [
            self.money.unwrap_or(0),
            self.wood.unwrap_or(0),
            self.cement.unwrap_or(0),
            self.steel.unwrap_or(0),
        ]
    }
}
