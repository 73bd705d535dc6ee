//! Sort engine
//!
//! Stable, typed sorting by one column. Numeric columns (or any column under
//! a forced numeric compare) sort numerically with unparsable values pinned
//! last in both directions; every other column compares by display text.
//! Sorting produces a row permutation; the matrix applies it and resequences
//! row numbers.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::cell::Cell;
use crate::column::ColumnSpec;
use crate::datatype::DataType;
use crate::matrix::Matrix;

/// Typed key for one cell in the sort column.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(OrderedFloat<f64>),
    Text(String),
    /// Empty or unparsable in a numeric column. Pinned after everything in
    /// both directions.
    Last,
}

fn sort_key(col: &ColumnSpec, cell: &Cell, numeric: bool) -> SortKey {
    if numeric || col.data_type == DataType::Number {
        return match cell.value.as_f64() {
            Some(n) if n.is_finite() => SortKey::Number(OrderedFloat(n)),
            _ => SortKey::Last,
        };
    }
    SortKey::Text(cell.text.clone())
}

fn compare(a: &SortKey, b: &SortKey, ascending: bool) -> Ordering {
    let ord = match (a, b) {
        (SortKey::Last, SortKey::Last) => return Ordering::Equal,
        (SortKey::Last, _) => return Ordering::Greater,
        (_, SortKey::Last) => return Ordering::Less,
        (SortKey::Number(x), SortKey::Number(y)) => x.cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
    };
    if ascending {
        ord
    } else {
        ord.reverse()
    }
}

/// Remembered sort direction per column (true = ascending). Survives bulk
/// reloads so repeated header activations keep alternating.
#[derive(Debug, Clone, Default)]
pub struct SortToggle {
    last: FxHashMap<String, bool>,
}

impl SortToggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the direction for this sort. An explicit direction is used
    /// and remembered; without one, the remembered direction flips. The
    /// first sort on a column is ascending.
    pub fn resolve(&mut self, col_id: &str, direction: Option<bool>) -> bool {
        let ascending = match direction {
            Some(dir) => dir,
            None => !self.last.get(col_id).copied().unwrap_or(false),
        };
        self.last.insert(col_id.to_string(), ascending);
        ascending
    }

    pub fn last_direction(&self, col_id: &str) -> Option<bool> {
        self.last.get(col_id).copied()
    }
}

/// Compute the stable row permutation for sorting by one column. The result
/// lists 0-based old positions in new order, for [`Matrix::reorder_rows`].
/// `numeric` forces a numeric compare even on non-numeric columns; cells
/// that do not parse as numbers then sort last.
///
/// Equal keys keep their relative order in both directions: descending
/// inverts the comparator instead of reversing the sorted rows.
pub fn sort_permutation(
    matrix: &Matrix,
    col: &ColumnSpec,
    ascending: bool,
    numeric: bool,
) -> Vec<usize> {
    let keys: Vec<SortKey> = matrix
        .rows()
        .map(|r| sort_key(col, &r.cells[col.index - 1], numeric))
        .collect();
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| compare(&keys[a], &keys[b], ascending));
    order
}
