//! Tabular rendering of per-unit results.

use tally::{Cell, Hierarchy, Table, UnitValues};

/// `ID,NAME,VALUE` rows in hierarchy order. Units missing from `values`
/// print an empty VALUE; NaN prints as `NaN`.
pub(crate) fn values_table(hierarchy: &Hierarchy, values: &UnitValues) -> Table {
    let rows = hierarchy.iter().map(|u| {
        vec![
            Cell::from(u.id.as_str()),
            u.name.as_deref().map(Cell::from).unwrap_or_default(),
            values.get(&u.id).copied().map(Cell::Number).unwrap_or_default(),
        ]
    });
    Table::from_rows(["ID", "NAME", "VALUE"], rows)
}
