//! Wide table keyed by (entity, timestamp), the shape every report stage
//! exchanges.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

pub type RowKey = (String, NaiveDateTime);

/// Which side of a prediction interval a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Bound {
    Lo(u8),
    Hi(u8),
}

/// Column label: a model (or plain column) name plus an optional interval bound.
///
/// Renders as `Naive`, `Naive-lo-90`, `Naive-hi-90`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ColumnKey {
    pub name: String,
    pub bound: Option<Bound>,
}

impl ColumnKey {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: None,
        }
    }

    pub fn lo(name: impl Into<String>, level: u8) -> Self {
        Self {
            name: name.into(),
            bound: Some(Bound::Lo(level)),
        }
    }

    pub fn hi(name: impl Into<String>, level: u8) -> Self {
        Self {
            name: name.into(),
            bound: Some(Bound::Hi(level)),
        }
    }

    /// Same bound under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: self.bound,
        }
    }

    fn suffixed(&self, suffix: &str) -> Self {
        self.renamed(format!("{}{}", self.name, suffix))
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound {
            None => write!(f, "{}", self.name),
            Some(Bound::Lo(level)) => write!(f, "{}-lo-{}", self.name, level),
            Some(Bound::Hi(level)) => write!(f, "{}-hi-{}", self.name, level),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Outer,
}

/// Rows sorted by (entity, timestamp); a cell is `None` when absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<ColumnKey>,
    rows: BTreeMap<RowKey, Vec<Option<f64>>>,
}

impl Frame {
    pub fn new(columns: Vec<ColumnKey>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn position(&self, column: &ColumnKey) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Set one cell, creating an empty row if needed.
    pub fn set(&mut self, entity: &str, timestamp: NaiveDateTime, column: usize, value: f64) {
        let width = self.columns.len();
        let row = self
            .rows
            .entry((entity.to_string(), timestamp))
            .or_insert_with(|| vec![None; width]);
        if let Some(cell) = row.get_mut(column) {
            *cell = Some(value);
        }
    }

    /// Ensure a row exists without touching its cells.
    pub fn touch(&mut self, entity: &str, timestamp: NaiveDateTime) {
        let width = self.columns.len();
        self.rows
            .entry((entity.to_string(), timestamp))
            .or_insert_with(|| vec![None; width]);
    }

    pub fn get(&self, entity: &str, timestamp: NaiveDateTime, column: &ColumnKey) -> Option<f64> {
        let idx = self.position(column)?;
        self.rows
            .get(&(entity.to_string(), timestamp))
            .and_then(|row| row[idx])
    }

    pub fn rows(&self) -> impl Iterator<Item = (&RowKey, &[Option<f64>])> {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn entities(&self) -> BTreeSet<&str> {
        self.rows.keys().map(|(e, _)| e.as_str()).collect()
    }

    pub fn timestamps(&self) -> BTreeSet<NaiveDateTime> {
        self.rows.keys().map(|(_, ts)| *ts).collect()
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, NaiveDateTime) -> bool,
    {
        self.rows.retain(|(entity, ts), _| keep(entity, *ts));
    }

    /// Join on (entity, timestamp). Columns present on both sides get
    /// `suffixes.0` (left) and `suffixes.1` (right) appended to their name.
    pub fn join(&self, other: &Frame, kind: JoinKind, suffixes: (&str, &str)) -> Frame {
        let overlap: BTreeSet<&ColumnKey> = self
            .columns
            .iter()
            .filter(|c| other.columns.contains(c))
            .collect();
        let label = |c: &ColumnKey, suffix: &str| {
            if overlap.contains(c) {
                c.suffixed(suffix)
            } else {
                c.clone()
            }
        };

        let mut columns: Vec<ColumnKey> = self.columns.iter().map(|c| label(c, suffixes.0)).collect();
        columns.extend(other.columns.iter().map(|c| label(c, suffixes.1)));

        let keys: BTreeSet<&RowKey> = match kind {
            JoinKind::Inner => self
                .rows
                .keys()
                .filter(|k| other.rows.contains_key(*k))
                .collect(),
            JoinKind::Outer => self.rows.keys().chain(other.rows.keys()).collect(),
        };

        let left_blank = vec![None; self.columns.len()];
        let right_blank = vec![None; other.columns.len()];
        let rows = keys
            .into_iter()
            .map(|key| {
                let mut row = self.rows.get(key).unwrap_or(&left_blank).clone();
                row.extend_from_slice(other.rows.get(key).unwrap_or(&right_blank));
                (key.clone(), row)
            })
            .collect();

        Frame { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_column_labels() {
        assert_eq!(ColumnKey::plain("Naive").to_string(), "Naive");
        assert_eq!(ColumnKey::lo("Naive", 90).to_string(), "Naive-lo-90");
        assert_eq!(ColumnKey::hi("AutoETS", 80).to_string(), "AutoETS-hi-80");
        assert_eq!(
            ColumnKey::lo("Naive", 90).renamed("best_model").to_string(),
            "best_model-lo-90"
        );
    }

    #[test]
    fn test_set_and_get() {
        let mut frame = Frame::new(vec![ColumnKey::plain("a"), ColumnKey::plain("b")]);
        frame.set("x", day(1), 1, 2.5);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.get("x", day(1), &ColumnKey::plain("b")), Some(2.5));
        assert_eq!(frame.get("x", day(1), &ColumnKey::plain("a")), None);
        assert_eq!(frame.get("y", day(1), &ColumnKey::plain("b")), None);
    }

    #[test]
    fn test_inner_join_suffixes_overlap() {
        let mut left = Frame::new(vec![ColumnKey::plain("best_model"), ColumnKey::plain("Naive")]);
        left.set("x", day(1), 0, 1.0);
        left.set("x", day(1), 1, 2.0);
        left.set("y", day(1), 0, 3.0);

        let mut right = Frame::new(vec![ColumnKey::plain("Naive")]);
        right.set("x", day(1), 0, 9.0);

        let joined = left.join(&right, JoinKind::Inner, ("_best", "_baseline"));
        let labels: Vec<String> = joined.columns().iter().map(|c| c.to_string()).collect();
        assert_eq!(labels, vec!["best_model", "Naive_best", "Naive_baseline"]);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.get("x", day(1), &ColumnKey::plain("Naive_baseline")), Some(9.0));
    }

    #[test]
    fn test_outer_join_keeps_both_sides() {
        let mut left = Frame::new(vec![ColumnKey::plain("y")]);
        left.set("x", day(1), 0, 1.0);
        let mut right = Frame::new(vec![ColumnKey::plain("Naive")]);
        right.set("x", day(2), 0, 5.0);

        let joined = left.join(&right, JoinKind::Outer, ("", ""));
        assert_eq!(joined.len(), 2);
        assert_eq!(joined.get("x", day(1), &ColumnKey::plain("Naive")), None);
        assert_eq!(joined.get("x", day(2), &ColumnKey::plain("Naive")), Some(5.0));
        assert_eq!(joined.timestamps().len(), 2);
    }

    #[test]
    fn test_retain_filters_rows() {
        let mut frame = Frame::new(vec![ColumnKey::plain("y")]);
        frame.set("x", day(1), 0, 1.0);
        frame.set("x", day(2), 0, 2.0);
        frame.retain(|_, ts| ts == day(2));
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.entities().into_iter().collect::<Vec<_>>(), vec!["x"]);
    }
}
