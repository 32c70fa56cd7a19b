//! The organizational tree (or forest) every figure is reported against.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use tally_table::{Cell, Table, TableError};

use crate::error::{ReportError, Result};

/// Per-unit figures keyed by unit id.
pub type UnitValues = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: String,
    pub name: Option<String>,
    /// Height in the tree: a unit's level is strictly greater than the levels
    /// of all units that name it as their super.
    pub level: u32,
    /// Parent unit id; `None` for a root.
    pub super_id: Option<String>,
    /// Total target for the whole schedule period.
    pub target: f64,
}

impl Unit {
    pub fn new(id: impl Into<String>, level: u32, super_id: Option<&str>, target: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            level,
            super_id: super_id.map(str::to_string),
            target,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A structural problem that does not stop the hierarchy from loading but
/// makes some contributions disappear during rollup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyIssue {
    /// A unit's level is not below the level of its super.
    LevelOrder {
        id: String,
        level: u32,
        super_id: String,
        super_level: u32,
    },
    /// A super-id names no unit in the hierarchy.
    UnknownSuper { id: String, super_id: String },
}

impl fmt::Display for HierarchyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LevelOrder {
                id,
                level,
                super_id,
                super_level,
            } => write!(
                f,
                "unit `{id}` (level {level}) is not below its super `{super_id}` (level {super_level})"
            ),
            Self::UnknownSuper { id, super_id } => {
                write!(f, "unit `{id}` names unknown super `{super_id}`")
            }
        }
    }
}

/// Units in file order plus an id index. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    units: Vec<Unit>,
    index: FxHashMap<String, usize>,
}

impl PartialEq for Hierarchy {
    fn eq(&self, other: &Self) -> bool {
        self.units == other.units
    }
}

impl Hierarchy {
    /// Build from units; ids must be non-empty and unique.
    pub fn new(units: Vec<Unit>) -> Result<Self> {
        let mut index = FxHashMap::default();
        index.reserve(units.len());
        for (i, unit) in units.iter().enumerate() {
            if unit.id.trim().is_empty() {
                return Err(ReportError::InvalidHierarchy(format!(
                    "unit #{} has an empty id",
                    i + 1
                )));
            }
            if index.insert(unit.id.clone(), i).is_some() {
                return Err(ReportError::InvalidHierarchy(format!(
                    "duplicate unit id `{}`",
                    unit.id
                )));
            }
        }
        Ok(Self { units, index })
    }

    /// Read units from a table with columns ID, [NAME], LEVEL, SUPER, TARGET.
    pub fn from_table(table: &Table) -> Result<Self> {
        let invalid = |source: TableError| ReportError::Validation {
            what: "hierarchy".to_string(),
            source,
        };
        table
            .require(&["ID", "LEVEL", "SUPER", "TARGET"])
            .map_err(invalid)?;

        let ids = table.texts("ID").map_err(invalid)?;
        let levels = table.numbers("LEVEL").map_err(invalid)?;
        let supers = table.texts("SUPER").map_err(invalid)?;
        let targets = table.numbers("TARGET").map_err(invalid)?;
        let names = if table.has_column("NAME") {
            table.texts("NAME").map_err(invalid)?
        } else {
            vec![None; table.height()]
        };

        let mut units = Vec::with_capacity(table.height());
        for (row, ((((id, level), super_id), target), name)) in ids
            .into_iter()
            .zip(levels)
            .zip(supers)
            .zip(targets)
            .zip(names)
            .enumerate()
        {
            let line = row + 2;
            let id = id.ok_or_else(|| {
                ReportError::InvalidHierarchy(format!("row {line}: empty ID"))
            })?;
            let level = match level {
                Some(l) if l >= 0.0 && l.fract() == 0.0 && l <= f64::from(u32::MAX) => l as u32,
                Some(l) => {
                    return Err(ReportError::InvalidHierarchy(format!(
                        "row {line}: level of `{id}` must be a non-negative integer, got {l}"
                    )));
                }
                None => {
                    return Err(ReportError::InvalidHierarchy(format!(
                        "row {line}: `{id}` has no level"
                    )));
                }
            };
            units.push(Unit {
                id,
                name,
                level,
                super_id,
                target: target.unwrap_or(0.0),
            });
        }
        Self::new(units)
    }

    /// Render back to the ID, NAME, LEVEL, SUPER, TARGET layout.
    pub fn to_table(&self) -> Table {
        let rows = self.units.iter().map(|u| {
            vec![
                Cell::from(u.id.as_str()),
                u.name.as_deref().map(Cell::from).unwrap_or_default(),
                Cell::Number(f64::from(u.level)),
                u.super_id.as_deref().map(Cell::from).unwrap_or_default(),
                Cell::Number(u.target),
            ]
        });
        Table::from_rows(["ID", "NAME", "LEVEL", "SUPER", "TARGET"], rows)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Unit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Unit> {
        self.index_of(id).map(|i| &self.units[i])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.id.as_str())
    }

    pub fn max_level(&self) -> Option<u32> {
        self.units.iter().map(|u| u.level).max()
    }

    /// Position of the unit's super, if it names a known unit.
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        self.units
            .get(index)?
            .super_id
            .as_deref()
            .and_then(|s| self.index_of(s))
    }

    /// Level-order violations and unknown super-ids, in unit order.
    pub fn check(&self) -> Vec<HierarchyIssue> {
        let mut issues = Vec::new();
        for unit in &self.units {
            let Some(super_id) = unit.super_id.as_deref() else {
                continue;
            };
            match self.get(super_id) {
                None => issues.push(HierarchyIssue::UnknownSuper {
                    id: unit.id.clone(),
                    super_id: super_id.to_string(),
                }),
                Some(parent) if unit.level >= parent.level => {
                    issues.push(HierarchyIssue::LevelOrder {
                        id: unit.id.clone(),
                        level: unit.level,
                        super_id: super_id.to_string(),
                        super_level: parent.level,
                    })
                }
                Some(_) => {}
            }
        }
        issues
    }

    /// Values in unit order; ids outside the hierarchy are ignored and
    /// missing units read as 0.
    pub fn to_dense(&self, values: &UnitValues) -> Vec<f64> {
        self.units
            .iter()
            .map(|u| values.get(&u.id).copied().unwrap_or(0.0))
            .collect()
    }

    /// Inverse of [`Hierarchy::to_dense`]. Extra trailing values are ignored.
    pub fn from_dense(&self, dense: &[f64]) -> UnitValues {
        self.units
            .iter()
            .zip(dense)
            .map(|(u, v)| (u.id.clone(), *v))
            .collect()
    }

    /// `f(unit)` for every unit.
    pub fn map_units(&self, mut f: impl FnMut(&Unit) -> f64) -> UnitValues {
        self.units.iter().map(|u| (u.id.clone(), f(u))).collect()
    }
}

impl<'a> IntoIterator for &'a Hierarchy {
    type Item = &'a Unit;
    type IntoIter = std::slice::Iter<'a, Unit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}
