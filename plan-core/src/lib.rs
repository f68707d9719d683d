//! Block layout optimization library
//!
//! This crate assigns buildings from a leveled catalog into one or more
//! fixed-size city blocks so that the block's aggregate income is as high
//! as the search can make it, under a size budget and multi-resource
//! economic constraints.
//!
//! ## Catalog and variants
//!
//! The input catalog groups building definitions by type family; each
//! definition carries a level-1 shape plus upgrades. Expansion flattens
//! this into immutable **variants**, one per (building, level), resolving
//! incremental vs. absolute upgrade income, inherited costs, worker kind
//! (business employees, house residents, or unstaffed), and storage shape.
//!
//! ## The single-block search
//!
//! A beam-pruned dynamic program walks size budgets 0..=C. Each state packs
//! the remaining resource budget, per-business placement counts, mandatory
//! misc coverage, and a residual-residents component; transitions place one
//! variant and are filtered for affordability and staffing prefeasibility.
//! States inside a bucket are ranked by a heuristic estimate: a greedy
//! preference-aware staffing pass minus an under-staffing opportunity cost
//! plus a small space bonus. After the walk, the best terminal is traced
//! back through parent pointers into a placement order.
//!
//! The search score is only a ranking device. The **forward simulator**
//! replays the reconstructed sequence (pooling residents by preference
//! set, staffing businesses in placement order, applying the duplicate
//! business penalty), and its income figure is the one reported.
//!
//! ## Multiple blocks
//!
//! The multi-block driver runs the single-block solve per block, carrying
//! each block's per-resource storage contribution into the next block's
//! starting budget. Mandatory misc buildings are kept out of early blocks
//! and injected into the last one, whose size budget is reduced by the
//! reserved footprint.
//!
//! ## Module Structure
//!
//! - `types`    Core value types (resources, worker kinds, storage shapes)
//! - `error`    Library error enum
//! - `catalog`  Catalog input model and expansion into variants
//! - `search`   Single-block DP search, estimator, beam pruning
//! - `simulate` Forward simulator computing authoritative income
//! - `plan`     Result types for one block and for a district
//! - `district` Multi-block driver with storage carry-over

pub mod catalog;
pub mod district;
pub mod error;
pub mod plan;
pub mod search;
pub mod simulate;
pub mod types;

// Re-export commonly used types at the crate root

// Errors
pub use error::PlanError;

// Core types
pub use types::{Capacity, Income, RESOURCE_CEILING, ResourceCost, Storage, WorkerKind};

// Catalog
pub use catalog::{
    BuildingDef, Catalog, CostSpec, MISC_TYPE, StorageSpec, UpgradeDef, Variant, expand,
};

// Single-block optimizer
pub use search::{Options, optimize};

// Forward simulator
pub use simulate::{SimulationReport, simulate};

// Results
pub use plan::{BlockOutcome, BlockPlan, CombinationEntry, DebugInfo, DistrictPlan};

// Multi-block driver
pub use district::optimize_blocks;
