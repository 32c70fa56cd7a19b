//! Period deltas between two snapshots, net of manual adjustments.

use chrono::NaiveDate;
use tally_common::DateKey;

use crate::adjust::Adjustments;
use crate::error::{ReportError, Result};
use crate::hierarchy::{Hierarchy, UnitValues};
use crate::snapshot::SnapshotStore;

/// Activity during `[start, end)` per unit:
/// `adjustments in [start, end) + snapshot(end - 1) - snapshot(start - 1)`.
///
/// Both snapshots must exist; the start snapshot is checked first and a miss
/// is reported as [`ReportError::NotFound`] with its `YYYYMMDD` key.
/// Adjustments are taken per unit as entered, without rollup.
pub fn stat(
    hierarchy: &Hierarchy,
    store: &SnapshotStore,
    adjustments: &Adjustments,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<UnitValues> {
    let before = snapshot(store, DateKey::from(start).previous()?)?;
    let after = snapshot(store, DateKey::from(end).previous()?)?;
    let adjusted = adjustments.sum_between(start, end);

    Ok(hierarchy
        .iter()
        .zip(before.iter().zip(after))
        .map(|(unit, (b, a))| {
            let adj = adjusted.get(&unit.id).copied().unwrap_or(0.0);
            (unit.id.clone(), adj + a - b)
        })
        .collect())
}

fn snapshot(store: &SnapshotStore, key: DateKey) -> Result<&[f64]> {
    store.column(key).ok_or_else(|| ReportError::NotFound {
        key: key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjust::Adjustment;
    use crate::hierarchy::Unit;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (Hierarchy, SnapshotStore) {
        let h = Hierarchy::new(vec![
            Unit::new("R", 1, None, 100.0),
            Unit::new("A", 0, Some("R"), 60.0),
        ])
        .unwrap();
        let mut store = SnapshotStore::new(&h);
        store.insert(ymd(2023, 12, 31).into(), vec![10.0, 4.0]);
        store.insert(ymd(2024, 1, 9).into(), vec![25.0, 15.0]);
        (h, store)
    }

    #[test]
    fn delta_plus_adjustments() {
        let (h, store) = setup();
        let adj = Adjustments::new(vec![
            Adjustment {
                date: ymd(2024, 1, 3),
                id: "A".into(),
                name: None,
                value: 2.0,
            },
            Adjustment {
                date: ymd(2024, 1, 10),
                id: "A".into(),
                name: None,
                value: 100.0,
            },
            Adjustment {
                date: ymd(2024, 1, 3),
                id: "nobody".into(),
                name: None,
                value: 100.0,
            },
        ]);
        let out = stat(&h, &store, &adj, ymd(2024, 1, 1), ymd(2024, 1, 10)).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out["R"], 15.0);
        assert_eq!(out["A"], 13.0);
    }

    #[test]
    fn same_day_is_zero() {
        let (h, store) = setup();
        let out = stat(
            &h,
            &store,
            &Adjustments::default(),
            ymd(2024, 1, 10),
            ymd(2024, 1, 10),
        )
        .unwrap();
        assert!(out.values().all(|v| *v == 0.0));
    }

    #[test]
    fn missing_snapshot_names_start_key_first() {
        let (h, store) = setup();
        let err = stat(
            &h,
            &store,
            &Adjustments::default(),
            ymd(2024, 2, 1),
            ymd(2024, 3, 1),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::NotFound { key } if key == "20240131"));

        let err = stat(
            &h,
            &store,
            &Adjustments::default(),
            ymd(2024, 1, 1),
            ymd(2024, 3, 1),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::NotFound { key } if key == "20240229"));
    }
}
