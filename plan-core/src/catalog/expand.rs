//! Catalog expansion: one immutable [`Variant`] per building and level.
//!
//! Upgrades accumulate onto the level-1 definition in ascending level order:
//! absolute `income` overrides, `additionalIncome` accumulates, worker slots
//! and storage are retained until redeclared, costs inherit from the base
//! unless the upgrade declares any cost axis.

use crate::PlanError;
use crate::catalog::{BuildingDef, Catalog, CostSpec, StorageSpec, UpgradeDef};
use crate::types::{Capacity, Income, ResourceCost, Storage, WorkerKind};

// === VARIANT ===

/// One (building name, level) from the expanded catalog. Built once,
/// immutable thereafter, shared by reference across solves.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub name: String,
    pub building_type: String,
    pub level: u32,
    pub size: u32,
    pub income: Income,
    pub capacity: Capacity,
    pub worker_kind: WorkerKind,
    pub costs: ResourceCost,
    pub storage: Option<Storage>,
    pub mandatory: bool,
    /// Business names this house's residents will staff; empty = any.
    pub prefers: Vec<String>,
}

impl Variant {
    /// Storage variants occupy space and pay nothing, contributing their
    /// per-resource storage to the block's balances instead.
    pub fn is_storage(&self) -> bool {
        self.worker_kind == WorkerKind::None
            && matches!(self.storage, Some(Storage::Resources(_)))
    }

    pub fn storage_resources(&self) -> Option<&ResourceCost> {
        self.storage.as_ref().and_then(Storage::as_resources)
    }
}

// === EXPANSION ===

/// Flatten a catalog into variants, validating as we go.
///
/// Variant order follows the catalog's canonical (sorted) type and building
/// name order, with each building's levels ascending; everything downstream
/// that iterates variants inherits this determinism.
pub fn expand(catalog: &Catalog) -> Result<Vec<Variant>, PlanError> {
    let mut variants = Vec::new();

    for (type_name, buildings) in &catalog.building_types {
        for (name, def) in buildings {
            expand_building(type_name, name, def, &mut variants)?;
        }
    }

    Ok(variants)
}

fn expand_building(
    type_name: &str,
    name: &str,
    def: &BuildingDef,
    out: &mut Vec<Variant>,
) -> Result<(), PlanError> {
    let size = match def.size {
        None => 1,
        Some(s) if s >= 1 => s as u32,
        Some(s) => {
            return Err(PlanError::InvalidCatalog(format!(
                "building {name:?} has non-positive size {s}"
            )));
        }
    };

    let mut income = check_income(name, "baseIncome", def.base_income)?;
    let (mut worker_kind, mut capacity) =
        worker_slots(name, def.employees, def.people_capacity)?.unwrap_or((WorkerKind::None, 0));
    let mut storage = storage_of(name, def.storage_capacity.as_ref().or(def.capacity.as_ref()))?;
    let base_costs = costs_of(name, def.base_cost.as_ref())?.unwrap_or(ResourceCost::ZERO);
    let base_prefers = def.prefers.clone().unwrap_or_default();

    out.push(Variant {
        name: name.to_string(),
        building_type: type_name.to_string(),
        level: 1,
        size,
        income,
        capacity,
        worker_kind,
        costs: base_costs,
        storage,
        mandatory: def.mandatory,
        prefers: base_prefers.clone(),
    });

    let mut upgrades: Vec<&UpgradeDef> = def.upgrades.iter().collect();
    upgrades.sort_by_key(|u| u.level);

    for up in upgrades {
        if up.level < 1 {
            return Err(PlanError::InvalidCatalog(format!(
                "building {name:?} has upgrade with non-positive level {}",
                up.level
            )));
        }

        income = match up.income {
            Some(abs) => check_income(name, "income", abs)?,
            None => income + check_income(name, "additionalIncome", up.additional_income.unwrap_or(0))?,
        };

        if let Some((kind, cap)) = worker_slots(name, up.employees, up.people_capacity)? {
            worker_kind = kind;
            capacity = cap;
        }

        if let Some(spec) = up.storage_capacity.as_ref().or(up.capacity.as_ref()) {
            storage = storage_of(name, Some(spec))?;
        }

        let costs = match costs_of(name, up.cost.as_ref())? {
            Some(declared) => declared,
            None => base_costs,
        };

        out.push(Variant {
            name: name.to_string(),
            building_type: type_name.to_string(),
            level: up.level as u32,
            size,
            income,
            capacity,
            worker_kind,
            costs,
            storage,
            mandatory: def.mandatory || up.mandatory,
            prefers: up.prefers.clone().unwrap_or_else(|| base_prefers.clone()),
        });
    }

    Ok(())
}

// === FIELD VALIDATION ===

fn check_income(name: &str, field: &str, value: i64) -> Result<Income, PlanError> {
    if value < 0 {
        return Err(PlanError::InvalidCatalog(format!(
            "building {name:?} has negative {field} {value}"
        )));
    }
    Ok(value)
}

/// Worker slots declared on a definition or upgrade, if any. Employees win
/// over residents when both are present.
fn worker_slots(
    name: &str,
    employees: Option<i64>,
    people_capacity: Option<i64>,
) -> Result<Option<(WorkerKind, Capacity)>, PlanError> {
    let (kind, slots) = match (employees, people_capacity) {
        (Some(e), _) => (WorkerKind::Employees, e),
        (None, Some(p)) => (WorkerKind::Residents, p),
        (None, None) => return Ok(None),
    };
    if slots < 0 {
        return Err(PlanError::InvalidCatalog(format!(
            "building {name:?} has negative worker capacity {slots}"
        )));
    }
    Ok(Some((kind, slots as Capacity)))
}

fn storage_of(name: &str, spec: Option<&StorageSpec>) -> Result<Option<Storage>, PlanError> {
    match spec {
        None => Ok(None),
        Some(StorageSpec::Scalar(n)) => {
            if *n < 0 {
                return Err(PlanError::InvalidCatalog(format!(
                    "building {name:?} has negative storage capacity {n}"
                )));
            }
            Ok(Some(Storage::Scalar(*n as u32)))
        }
        Some(StorageSpec::PerResource(spec)) => {
            Ok(Some(Storage::Resources(resource_bundle(name, spec)?)))
        }
    }
}

fn costs_of(name: &str, spec: Option<&CostSpec>) -> Result<Option<ResourceCost>, PlanError> {
    match spec {
        Some(spec) if spec.has_any() => Ok(Some(resource_bundle(name, spec)?)),
        _ => Ok(None),
    }
}

fn resource_bundle(name: &str, spec: &CostSpec) -> Result<ResourceCost, PlanError> {
    let amounts = spec.amounts();
    if amounts.iter().any(|&a| a < 0) {
        return Err(PlanError::InvalidCatalog(format!(
            "building {name:?} has a negative resource amount"
        )));
    }
    Ok(ResourceCost::new(
        amounts[0] as u32,
        amounts[1] as u32,
        amounts[2] as u32,
        amounts[3] as u32,
    ))
}
