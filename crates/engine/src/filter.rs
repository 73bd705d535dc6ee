//! Filter engine
//!
//! One active filter value per column, matched against display text with
//! exact case-sensitive equality. A row is hidden when any active filter
//! mismatches. The chooser values per column are cached and invalidated on
//! edits and structural changes.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::column::ColumnSpec;
use crate::datatype::DataTypes;
use crate::matrix::Matrix;

/// Filter value that clears a column's filter.
pub const FILTER_ALL: &str = "$$ALL";

/// Cap on distinct chooser values per column.
pub const MAX_FILTER_VALUES: usize = 1000;

/// Active filters plus the per-column chooser cache.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    /// col_id -> required display text.
    active: FxHashMap<String, String>,
    /// Cached chooser values per column id (invalidate on edit/load/structure).
    filter_values_cache: FxHashMap<String, Vec<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear one column's filter. `FILTER_ALL` clears.
    pub fn set_filter(&mut self, col_id: &str, value: &str) {
        if value == FILTER_ALL {
            self.active.remove(col_id);
        } else {
            self.active.insert(col_id.to_string(), value.to_string());
        }
    }

    pub fn value_for(&self, col_id: &str) -> Option<&str> {
        self.active.get(col_id).map(|s| s.as_str())
    }

    pub fn has_active_filter(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.active.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Build (or return cached) chooser values for a column: the sentinel
    /// first, then distinct display texts in first-seen order.
    pub fn build_filter_values(&mut self, col_id: &str, texts: &[String]) -> &[String] {
        if !self.filter_values_cache.contains_key(col_id) {
            let mut seen: FxHashSet<&String> = FxHashSet::default();
            let mut values = vec![FILTER_ALL.to_string()];
            for text in texts {
                if seen.insert(text) {
                    values.push(text.clone());
                    if values.len() > MAX_FILTER_VALUES {
                        break;
                    }
                }
            }
            self.filter_values_cache.insert(col_id.to_string(), values);
        }
        &self.filter_values_cache[col_id]
    }

    /// Cached chooser values, if built.
    pub fn cached_filter_values(&self, col_id: &str) -> Option<&[String]> {
        self.filter_values_cache.get(col_id).map(|v| v.as_slice())
    }

    /// Invalidate one column's chooser cache (call on cell edit).
    pub fn invalidate_column(&mut self, col_id: &str) {
        self.filter_values_cache.remove(col_id);
    }

    /// Invalidate every chooser cache (call on load/structural change).
    pub fn invalidate_all_caches(&mut self) {
        self.filter_values_cache.clear();
    }
}

/// Recompute the per-row filtered flag and mirror it onto every cell.
pub fn recompute(matrix: &mut Matrix, state: &FilterState, types: &DataTypes) {
    let active: Vec<(usize, String, ColumnSpec)> = state
        .active
        .iter()
        .filter_map(|(id, value)| {
            matrix
                .columns()
                .get(id.as_str())
                .map(|c| (c.index, value.clone(), c.clone()))
        })
        .collect();

    for row in matrix.rows_mut().iter_mut() {
        let mut filtered = false;
        for (index, value, col) in &active {
            let text = types.filter_text(col, &row.cells[*index - 1].value);
            if text != *value {
                filtered = true;
                break;
            }
        }
        for cell in row.cells.iter_mut() {
            cell.filtered = filtered;
        }
    }
}
