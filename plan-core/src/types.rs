use serde::{Deserialize, Serialize};

// ============================================================================
// Core value types shared across the catalog, the search, and the results
// ============================================================================

/// Income values (per tick, whole currency units).
pub type Income = i64;

/// Worker / resident head counts and building sizes.
pub type Capacity = u32;

/// Hard ceiling for any single resource axis. Carry-over storage across many
/// blocks cannot push a balance past this.
pub const RESOURCE_CEILING: u32 = 100_000;

// === RESOURCES ===

/// A bundle of the four block-economy resources. Used both for costs
/// (what a building deducts) and for storage contributions (what a storage
/// building adds per axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResourceCost {
    #[serde(default)]
    pub money: u32,
    #[serde(default)]
    pub wood: u32,
    #[serde(default)]
    pub cement: u32,
    #[serde(default)]
    pub steel: u32,
}

impl ResourceCost {
    pub const ZERO: ResourceCost = ResourceCost {
        money: 0,
        wood: 0,
        cement: 0,
        steel: 0,
    };

    pub fn new(money: u32, wood: u32, cement: u32, steel: u32) -> Self {
        Self {
            money,
            wood,
            cement,
            steel,
        }
    }

    /// Axis values in canonical order (money, wood, cement, steel).
    pub fn axes(&self) -> [u32; 4] {
        [self.money, self.wood, self.cement, self.steel]
    }

    pub fn from_axes(axes: [u32; 4]) -> Self {
        Self {
            money: axes[0],
            wood: axes[1],
            cement: axes[2],
            steel: axes[3],
        }
    }

    /// True when every axis of `self` is at least the matching axis of `cost`.
    pub fn covers(&self, cost: &ResourceCost) -> bool {
        self.money >= cost.money
            && self.wood >= cost.wood
            && self.cement >= cost.cement
            && self.steel >= cost.steel
    }

    pub fn saturating_add(&self, other: &ResourceCost) -> Self {
        Self {
            money: self.money.saturating_add(other.money),
            wood: self.wood.saturating_add(other.wood),
            cement: self.cement.saturating_add(other.cement),
            steel: self.steel.saturating_add(other.steel),
        }
    }

    pub fn saturating_sub(&self, other: &ResourceCost) -> Self {
        Self {
            money: self.money.saturating_sub(other.money),
            wood: self.wood.saturating_sub(other.wood),
            cement: self.cement.saturating_sub(other.cement),
            steel: self.steel.saturating_sub(other.steel),
        }
    }

    /// Clamp every axis to the matching axis of `upper`.
    pub fn clamp_to(&self, upper: &ResourceCost) -> Self {
        Self {
            money: self.money.min(upper.money),
            wood: self.wood.min(upper.wood),
            cement: self.cement.min(upper.cement),
            steel: self.steel.min(upper.steel),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

// === WORKER KIND ===

/// Who occupies a building: businesses employ, houses host residents,
/// everything else (decor, storage, misc) is unstaffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
    Employees,
    Residents,
    None,
}

// === STORAGE ===

/// Storage shape of a variant. Scalar storage is a plain warehouse number;
/// per-resource storage raises the block's resource balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Storage {
    Scalar(u32),
    Resources(ResourceCost),
}

impl Storage {
    pub fn as_resources(&self) -> Option<&ResourceCost> {
        match self {
            Storage::Resources(rc) => Some(rc),
            Storage::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<u32> {
        match self {
            Storage::Scalar(n) => Some(*n),
            Storage::Resources(_) => None,
        }
    }
}
