//! Subtree sums over the unit hierarchy.
//!
//! Every aggregator maps raw per-unit values to values where each unit holds
//! its own raw value plus the raw values of all its descendants. Running an
//! aggregator over its own output counts every descendant twice.

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashMap;

use crate::hierarchy::{Hierarchy, UnitValues};

/// Turns raw per-unit values into rolled-up values.
///
/// Implemented by [`LevelRollup`], [`TopologicalRollup`] and by any
/// `Fn(&Hierarchy, &UnitValues) -> UnitValues`.
pub trait Aggregator: Send + Sync {
    /// The output holds exactly one entry per hierarchy unit. Input ids that
    /// are not in the hierarchy are ignored; missing units count as 0.
    fn aggregate(&self, hierarchy: &Hierarchy, raw: &UnitValues) -> UnitValues;
}

impl<F> Aggregator for F
where
    F: Fn(&Hierarchy, &UnitValues) -> UnitValues + Send + Sync,
{
    fn aggregate(&self, hierarchy: &Hierarchy, raw: &UnitValues) -> UnitValues {
        self(hierarchy, raw)
    }
}

/// Walks the distinct levels from the leaves (lowest) to the roots. At each
/// level the running values are summed per super-id, and only then added to
/// the supers, so a level never sees its own partial sums.
///
/// Correct when every unit's level is below its super's level: a unit is
/// complete by the time its level is folded upward. Contributions to unknown
/// super-ids are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelRollup;

impl Aggregator for LevelRollup {
    fn aggregate(&self, hierarchy: &Hierarchy, raw: &UnitValues) -> UnitValues {
        let mut running = hierarchy.to_dense(raw);

        let mut by_level: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (i, unit) in hierarchy.iter().enumerate() {
            by_level.entry(unit.level).or_default().push(i);
        }

        let mut partial: FxHashMap<usize, f64> = FxHashMap::default();
        for members in by_level.values() {
            partial.clear();
            for &i in members {
                if let Some(parent) = hierarchy.parent_index(i) {
                    *partial.entry(parent).or_insert(0.0) += running[i];
                }
            }
            for (&parent, &sum) in &partial {
                running[parent] += sum;
            }
        }

        hierarchy.from_dense(&running)
    }
}

/// Follows super-id pointers instead of levels: a unit is folded into its
/// super once all of its own children have been folded into it.
///
/// Level numbers are ignored. Units on a super-id cycle are never folded
/// further up and keep the sum of their acyclic subtree.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologicalRollup;

impl Aggregator for TopologicalRollup {
    fn aggregate(&self, hierarchy: &Hierarchy, raw: &UnitValues) -> UnitValues {
        let n = hierarchy.len();
        let mut running = hierarchy.to_dense(raw);
        let parents: Vec<Option<usize>> = (0..n).map(|i| hierarchy.parent_index(i)).collect();

        let mut pending = vec![0usize; n];
        for parent in parents.iter().flatten() {
            pending[*parent] += 1;
        }

        let mut ready: VecDeque<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
        while let Some(i) = ready.pop_front() {
            let Some(parent) = parents[i] else { continue };
            running[parent] += running[i];
            pending[parent] -= 1;
            if pending[parent] == 0 {
                ready.push_back(parent);
            }
        }

        #[cfg(feature = "tracing")]
        {
            let stuck = pending.iter().filter(|&&p| p > 0).count();
            if stuck > 0 {
                tracing::warn!(units = stuck, "super-id cycle: units not rolled up further");
            }
        }

        hierarchy.from_dense(&running)
    }
}
