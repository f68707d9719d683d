//! DP state table: per-size buckets of aggregated nodes keyed by packed
//! state identity.

use std::collections::HashMap;

use crate::types::{Income, ResourceCost};

// === STATE KEY ===

/// Canonical identity of a DP state inside a size bucket.
///
/// Two transitions landing on the same key coalesce to the higher-score
/// node. The derived `Ord` gives every place that iterates states a
/// deterministic order independent of hash seeding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct StateKey {
    pub residual_residents: u16,
    /// Remaining resources in axis order (money, wood, cement, steel).
    pub resources: [u32; 4],
    /// Mandatory-name coverage bits.
    pub mask: u64,
    /// Per-business placement counts.
    pub counts: Box<[u16]>,
}

// === NODE ===

/// Aggregated DP value for one state, doubling as a back pointer.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub resources: ResourceCost,
    pub mask: u64,
    pub counts: Box<[u16]>,

    /// Income from placed worker-kind=none variants.
    pub income_neutral: Income,
    pub house_base_income: Income,
    pub total_house_capacity: u32,
    /// Per-business sums over placed variants.
    pub business_income_base: Box<[Income]>,
    pub business_capacity: Box<[u32]>,
    /// Resident capacity from placed houses willing to staff each business.
    pub preference_capacity: Box<[u32]>,

    /// Heuristic score at this state.
    pub score: i64,

    /// Back pointer: (size bucket, key) of the predecessor. Root has none.
    pub prev: Option<(u32, StateKey)>,
    /// Variant placed by the transition that created this node.
    pub variant_index: Option<u32>,
}

impl Node {
    /// The empty root state holding the starting resources.
    pub fn root(resources: ResourceCost, business_count: usize) -> Self {
        Self {
            resources,
            mask: 0,
            counts: vec![0; business_count].into_boxed_slice(),
            income_neutral: 0,
            house_base_income: 0,
            total_house_capacity: 0,
            business_income_base: vec![0; business_count].into_boxed_slice(),
            business_capacity: vec![0; business_count].into_boxed_slice(),
            preference_capacity: vec![0; business_count].into_boxed_slice(),
            score: 0,
            prev: None,
            variant_index: None,
        }
    }

    /// Key this node under the given residual-residents component.
    pub fn key(&self, residual_residents: u16) -> StateKey {
        StateKey {
            residual_residents,
            resources: self.resources.axes(),
            mask: self.mask,
            counts: self.counts.clone(),
        }
    }
}

// === STATE TABLE ===

/// One bucket per size level 0..=C. Buckets live for the duration of a
/// single-block solve so back pointers stay valid past pruning.
pub(crate) struct StateTable {
    buckets: Vec<HashMap<StateKey, Node>>,
}

impl StateTable {
    pub fn new(size_limit: u32) -> Self {
        Self {
            buckets: (0..=size_limit).map(|_| HashMap::new()).collect(),
        }
    }

    pub fn get(&self, size: u32, key: &StateKey) -> Option<&Node> {
        self.buckets[size as usize].get(key)
    }

    pub fn bucket_mut(&mut self, size: u32) -> &mut HashMap<StateKey, Node> {
        &mut self.buckets[size as usize]
    }

    /// Snapshot of a bucket in deterministic key order. Taken before the
    /// bucket is expanded so transitions into later buckets cannot disturb
    /// the iteration.
    pub fn frontier(&self, size: u32) -> Vec<(StateKey, Node)> {
        let mut entries: Vec<(StateKey, Node)> = self.buckets[size as usize]
            .iter()
            .map(|(k, n)| (k.clone(), n.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Insert, or replace an existing entry only on strictly greater score.
    /// Returns true when the bucket changed.
    pub fn upsert(&mut self, size: u32, key: StateKey, node: Node) -> bool {
        use std::collections::hash_map::Entry;
        match self.buckets[size as usize].entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
            Entry::Occupied(mut slot) => {
                if node.score > slot.get().score {
                    slot.insert(node);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Live state count per bucket, for the debug report.
    pub fn state_counts(&self) -> Vec<usize> {
        self.buckets.iter().map(HashMap::len).collect()
    }
}
