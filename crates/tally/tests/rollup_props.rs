//! Property tests for the rollup aggregators over random forests.

use proptest::prelude::*;
use tally::{Aggregator, Hierarchy, LevelRollup, TopologicalRollup, Unit, UnitValues};

#[derive(Debug)]
struct Forest {
    hierarchy: Hierarchy,
    parents: Vec<Option<usize>>,
    ids: Vec<String>,
    raw: UnitValues,
}

/// Random forests whose levels respect the parent/child ordering. Levels may
/// skip numbers and units may be listed leaves-first or roots-first.
fn arb_forest() -> impl Strategy<Value = Forest> {
    let node = (
        prop::option::weighted(0.8, any::<usize>()),
        prop::option::of(-1000i32..1000),
    );
    (prop::collection::vec(node, 1..40), 1u32..4, any::<bool>()).prop_map(
        |(nodes, gap, reverse)| {
            let n = nodes.len();
            let parents: Vec<Option<usize>> = nodes
                .iter()
                .enumerate()
                .map(|(i, (choice, _))| match choice {
                    Some(c) if i > 0 => Some(c % i),
                    _ => None,
                })
                .collect();

            let mut depth = vec![0u32; n];
            for i in 0..n {
                if let Some(p) = parents[i] {
                    depth[i] = depth[p] + 1;
                }
            }
            let max_depth = depth.iter().copied().max().unwrap_or(0);

            let ids: Vec<String> = (0..n).map(|i| format!("U{i}")).collect();
            let mut units: Vec<Unit> = (0..n)
                .map(|i| {
                    Unit::new(
                        ids[i].clone(),
                        (max_depth - depth[i]) * gap,
                        parents[i].map(|p| ids[p].as_str()),
                        1.0,
                    )
                })
                .collect();
            if reverse {
                units.reverse();
            }

            let raw = nodes
                .iter()
                .enumerate()
                .filter_map(|(i, (_, v))| v.map(|v| (ids[i].clone(), f64::from(v))))
                .collect();

            Forest {
                hierarchy: Hierarchy::new(units).unwrap(),
                parents,
                ids,
                raw,
            }
        },
    )
}

/// Sum of raw values over each unit's subtree, by walking every unit's
/// ancestor chain.
fn subtree_sums(forest: &Forest) -> UnitValues {
    let mut sums: UnitValues = forest.ids.iter().map(|id| (id.clone(), 0.0)).collect();
    for (i, id) in forest.ids.iter().enumerate() {
        let v = forest.raw.get(id).copied().unwrap_or(0.0);
        let mut cur = Some(i);
        while let Some(u) = cur {
            *sums.get_mut(&forest.ids[u]).unwrap() += v;
            cur = forest.parents[u];
        }
    }
    sums
}

proptest! {
    /// Every unit ends up with its own value plus all of its descendants'.
    #[test]
    fn level_rollup_sums_subtrees(forest in arb_forest()) {
        prop_assert!(forest.hierarchy.check().is_empty());
        let out = LevelRollup.aggregate(&forest.hierarchy, &forest.raw);
        prop_assert_eq!(out, subtree_sums(&forest));
    }

    /// Integer-valued inputs keep float sums exact, so both traversals must
    /// agree to the bit.
    #[test]
    fn aggregators_agree(forest in arb_forest()) {
        let level = LevelRollup.aggregate(&forest.hierarchy, &forest.raw);
        let topo = TopologicalRollup.aggregate(&forest.hierarchy, &forest.raw);
        prop_assert_eq!(level, topo);
    }

    /// A second pass changes a unit exactly when one of its strict
    /// descendants carried a non-zero rolled-up value.
    #[test]
    fn rollup_is_not_idempotent(forest in arb_forest()) {
        let once = LevelRollup.aggregate(&forest.hierarchy, &forest.raw);
        let twice = LevelRollup.aggregate(&forest.hierarchy, &once);

        let mut extra: UnitValues = forest.ids.iter().map(|id| (id.clone(), 0.0)).collect();
        for (i, id) in forest.ids.iter().enumerate() {
            let mut cur = forest.parents[i];
            while let Some(u) = cur {
                *extra.get_mut(&forest.ids[u]).unwrap() += once[id];
                cur = forest.parents[u];
            }
        }
        for id in &forest.ids {
            prop_assert_eq!(twice[id], once[id] + extra[id], "unit {}", id);
        }
    }

    /// Raw values for ids outside the hierarchy never show up.
    #[test]
    fn foreign_ids_are_ignored(forest in arb_forest(), stray in -1000i32..1000) {
        let mut raw = forest.raw.clone();
        raw.insert("not-a-unit".to_string(), f64::from(stray));
        let out = LevelRollup.aggregate(&forest.hierarchy, &raw);
        prop_assert_eq!(out.len(), forest.ids.len());
        prop_assert_eq!(out, LevelRollup.aggregate(&forest.hierarchy, &forest.raw));
    }
}
