//! Schedule-based target figures.

use chrono::NaiveDate;

use crate::hierarchy::{Hierarchy, UnitValues};
use crate::schedule::Schedule;

/// `factor_at(date) * target` for every unit.
///
/// NaN for every unit when `date` is at or after the schedule's last point;
/// see [`Schedule::factor_at`].
pub fn target_by(hierarchy: &Hierarchy, schedule: &Schedule, date: NaiveDate) -> UnitValues {
    let k = schedule.factor_at(date);
    hierarchy.map_units(|unit| k * unit.target)
}

/// What is left to achieve in a period, given the full `target`, the amount
/// `achieved` before the period and the scheduled targets at its start and
/// end: `(end_target - start_target) * (target - achieved) / (target - start_target)`.
///
/// Never negative and never NaN: any result that is not strictly positive is 0.
pub fn remaining(target: f64, achieved: f64, start_target: f64, end_target: f64) -> f64 {
    let rt = (end_target - start_target) * (target - achieved) / (target - start_target);
    if rt > 0.0 { rt } else { 0.0 }
}

/// [`remaining`] for every unit.
pub fn period_target(
    hierarchy: &Hierarchy,
    achieved: &UnitValues,
    start_targets: &UnitValues,
    end_targets: &UnitValues,
) -> UnitValues {
    let get = |values: &UnitValues, id: &str| values.get(id).copied().unwrap_or(0.0);
    hierarchy.map_units(|unit| {
        remaining(
            unit.target,
            get(achieved, &unit.id),
            get(start_targets, &unit.id),
            get(end_targets, &unit.id),
        )
    })
}
