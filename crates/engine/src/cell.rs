//! Cells and row status
//!
//! A cell owns its stored value plus optional per-cell flag overrides.
//! Behavioral flags resolve on read: cell override, else column default.
//! Merge spans and the filtered flag are derived state, recomputed by the
//! owning grid and never authoritative.

use serde::{Deserialize, Serialize};

use crate::column::ColumnSpec;
use crate::datatype::Value;

/// Status of a data row, shown in the reserved status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    Create,
    Update,
    Delete,
}

impl RowStatus {
    pub fn code(self) -> &'static str {
        match self {
            RowStatus::Create => "C",
            RowStatus::Update => "U",
            RowStatus::Delete => "D",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "C" => Some(RowStatus::Create),
            "U" => Some(RowStatus::Update),
            "D" => Some(RowStatus::Delete),
            _ => None,
        }
    }
}

/// One (row, column) slot of the matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Cell {
    pub value: Value,
    /// Display text for the current value; refreshed on every write.
    pub text: String,

    // Per-cell overrides; None falls back to the column default
    pub locked: Option<bool>,
    pub untarget: Option<bool>,
    pub required: Option<bool>,
    pub locked_color: Option<String>,

    // Derived merge/filter state
    #[serde(skip)]
    pub row_span: usize,
    #[serde(skip)]
    pub col_span: usize,
    #[serde(skip)]
    pub is_row_merge: bool,
    #[serde(skip)]
    pub is_col_merge: bool,
    #[serde(skip)]
    pub filtered: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            value: Value::Empty,
            text: String::new(),
            locked: None,
            untarget: None,
            required: None,
            locked_color: None,
            row_span: 1,
            col_span: 1,
            is_row_merge: false,
            is_col_merge: false,
            filtered: false,
        }
    }
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: Value, text: String) -> Self {
        Self {
            value,
            text,
            ..Default::default()
        }
    }

    pub fn from_seed(seed: CellSeed, text: String) -> Self {
        Self {
            value: seed.value,
            text,
            locked: seed.locked,
            untarget: seed.untarget,
            required: seed.required,
            locked_color: seed.locked_color,
            ..Default::default()
        }
    }

    /// Whether this cell is part of any merge span but not its owner.
    pub fn is_merge_continuation(&self) -> bool {
        self.is_row_merge || self.is_col_merge
    }

    pub fn effective_locked(&self, col: &ColumnSpec) -> bool {
        self.locked.unwrap_or(col.locked)
    }

    pub fn effective_untarget(&self, col: &ColumnSpec) -> bool {
        self.untarget.unwrap_or(col.untarget)
    }

    pub fn effective_required(&self, col: &ColumnSpec) -> bool {
        self.required.unwrap_or(col.required)
    }

    pub fn effective_locked_color<'a>(&'a self, col: &'a ColumnSpec) -> Option<&'a str> {
        self.locked_color
            .as_deref()
            .or(col.locked_color.as_deref())
    }
}

/// Input shape for one cell of a full cell-data row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CellSeed {
    pub value: Value,
    pub locked: Option<bool>,
    pub untarget: Option<bool>,
    pub required: Option<bool>,
    pub locked_color: Option<String>,
}

impl CellSeed {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_flags_fall_back_to_column() {
        let col = ColumnSpec::new("a", "A").with_locked(true);
        let mut cell = Cell::new();

        assert!(cell.effective_locked(&col));
        assert!(!cell.effective_untarget(&col));

        // Per-cell override wins
        cell.locked = Some(false);
        assert!(!cell.effective_locked(&col));
    }

    #[test]
    fn test_from_seed_keeps_overrides() {
        let seed = CellSeed {
            value: Value::Number(3.0),
            locked: Some(true),
            ..Default::default()
        };
        let cell = Cell::from_seed(seed, "3".into());
        let col = ColumnSpec::new("a", "A");

        assert_eq!(cell.value, Value::Number(3.0));
        assert_eq!(cell.text, "3");
        assert!(cell.effective_locked(&col));
    }

    #[test]
    fn test_new_cell_spans() {
        let cell = Cell::new();
        assert_eq!(cell.row_span, 1);
        assert_eq!(cell.col_span, 1);
        assert!(!cell.is_merge_continuation());
    }

    #[test]
    fn test_row_status_codes() {
        assert_eq!(RowStatus::Create.code(), "C");
        assert_eq!(RowStatus::from_code("D"), Some(RowStatus::Delete));
        assert_eq!(RowStatus::from_code("X"), None);
    }
}
