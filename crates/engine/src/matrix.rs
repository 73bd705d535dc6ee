//! Cell matrix
//!
//! Row-major store of cells, one `Row` per data row, one cell per column
//! (reserved columns included, so (row, col) addressing stays uniform).
//! Bulk loads rebuild every cell; no cell identity survives a reload.
//!
//! Coordinates are 1-based and never silently clamped: a bad index is an
//! error, because clamped writes would corrupt undo records.

use rustc_hash::FxHashMap;

use crate::cell::{Cell, CellSeed, RowStatus};
use crate::column::{ColumnSpec, Columns, ROW_NUMBER_COL, ROW_STATUS_COL};
use crate::config::GridOptions;
use crate::datatype::{format_number, DataTypes, Value};
use crate::error::{GridError, Result};

/// One data row: a cell per column plus the row's status.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub status: Option<RowStatus>,
}

impl Row {
    /// Whether the row is hidden by the active filters. The flag is mirrored
    /// onto every cell of the row.
    pub fn is_filtered(&self) -> bool {
        self.cells.first().map(|c| c.filtered).unwrap_or(false)
    }
}

/// One row of bulk load input.
#[derive(Debug, Clone)]
pub enum RowInput {
    /// `col_id -> value`; columns without an entry load empty. Unknown ids
    /// are ignored.
    KeyValue(FxHashMap<String, Value>),
    /// Already-shaped cell records for the user columns, in column order.
    Cells(Vec<CellSeed>),
}

impl RowInput {
    fn shape_name(&self) -> &'static str {
        match self {
            RowInput::KeyValue(_) => "key-value",
            RowInput::Cells(_) => "cell-data",
        }
    }

    fn same_shape(&self, other: &RowInput) -> bool {
        self.shape_name() == other.shape_name()
    }
}

/// The 2-D cell store plus its column registry.
#[derive(Default)]
pub struct Matrix {
    columns: Columns,
    rows: Vec<Row>,
}

impl Matrix {
    pub fn new(columns: Columns) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut Columns {
        &mut self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub fn row(&self, row: usize) -> Result<&Row> {
        self.check_row(row)?;
        Ok(&self.rows[row - 1])
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row == 0 || row > self.rows.len() {
            return Err(GridError::RowOutOfRange {
                row,
                rows: self.rows.len(),
            });
        }
        Ok(())
    }

    /// Resolve a column key to its 1-based index, failing like `require`.
    pub fn col_index<'a>(&self, key: impl Into<crate::column::ColumnKey<'a>>) -> Result<usize> {
        Ok(self.columns.require(key)?.index)
    }

    pub fn get<'a>(
        &self,
        row: usize,
        key: impl Into<crate::column::ColumnKey<'a>>,
    ) -> Result<&Cell> {
        let col = self.col_index(key)?;
        self.check_row(row)?;
        Ok(&self.rows[row - 1].cells[col - 1])
    }

    pub fn get_mut<'a>(
        &mut self,
        row: usize,
        key: impl Into<crate::column::ColumnKey<'a>>,
    ) -> Result<&mut Cell> {
        let col = self.col_index(key)?;
        self.check_row(row)?;
        Ok(&mut self.rows[row - 1].cells[col - 1])
    }

    /// Borrow a cell without coordinate errors, for traversal code.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&Cell> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows.get(row - 1).and_then(|r| r.cells.get(col - 1))
    }

    // ========================================================================
    // Bulk load
    // ========================================================================

    /// Replace all rows. Shape is detected from the first row; mixing
    /// key-value and cell-data rows is rejected.
    pub fn load(&mut self, input: Vec<RowInput>, types: &DataTypes, opts: &GridOptions) -> Result<()> {
        if let Some(first) = input.first() {
            for (i, row) in input.iter().enumerate() {
                if !row.same_shape(first) {
                    return Err(GridError::InconsistentRowShape { row: i + 1 });
                }
            }
        }

        let mut rows = Vec::with_capacity(input.len());
        for row_input in input {
            rows.push(self.build_row(row_input, None, types, opts)?);
        }
        self.rows = rows;
        self.renumber_rows();
        Ok(())
    }

    /// Dynamic-shape load: an array of objects (key-value rows) or an array
    /// of arrays (cell-data rows, primitives or `{value, ...}` records).
    pub fn load_json(
        &mut self,
        input: serde_json::Value,
        types: &DataTypes,
        opts: &GridOptions,
    ) -> Result<()> {
        let serde_json::Value::Array(json_rows) = input else {
            return Err(GridError::InvalidDataShape("expected an array of rows".into()));
        };

        let mut rows = Vec::with_capacity(json_rows.len());
        for (i, json_row) in json_rows.into_iter().enumerate() {
            let row = match json_row {
                serde_json::Value::Object(map) => {
                    let mut kv = FxHashMap::default();
                    for (k, v) in map {
                        kv.insert(k, Value::from(&v));
                    }
                    RowInput::KeyValue(kv)
                }
                serde_json::Value::Array(items) => {
                    let mut seeds = Vec::with_capacity(items.len());
                    for item in items {
                        seeds.push(json_seed(item)?);
                    }
                    RowInput::Cells(seeds)
                }
                other => {
                    return Err(GridError::InvalidDataShape(format!(
                        "row {} is not an object or array ({})",
                        i + 1,
                        json_type_name(&other)
                    )));
                }
            };
            rows.push(row);
        }
        self.load(rows, types, opts)
    }

    fn build_row(
        &self,
        input: RowInput,
        status: Option<RowStatus>,
        types: &DataTypes,
        opts: &GridOptions,
    ) -> Result<Row> {
        let mut cells = Vec::with_capacity(self.columns.len());

        match input {
            RowInput::KeyValue(mut kv) => {
                for col in self.columns.iter() {
                    if col.is_reserved() {
                        cells.push(Cell::new());
                        continue;
                    }
                    let raw = kv.remove(&col.col_id).unwrap_or(Value::Empty);
                    cells.push(self.build_cell(col, CellSeed::new(raw), types, opts)?);
                }
            }
            RowInput::Cells(seeds) => {
                let user_cols = self.columns.len() - 2;
                if seeds.len() != user_cols {
                    return Err(GridError::InvalidDataShape(format!(
                        "cell-data row has {} cell(s), grid has {} user column(s)",
                        seeds.len(),
                        user_cols
                    )));
                }
                let mut seeds = seeds.into_iter();
                for col in self.columns.iter() {
                    if col.is_reserved() {
                        cells.push(Cell::new());
                        continue;
                    }
                    // Guarded by the length check above
                    let seed = seeds.next().unwrap_or_default();
                    cells.push(self.build_cell(col, seed, types, opts)?);
                }
            }
        }

        Ok(Row { cells, status })
    }

    fn build_cell(
        &self,
        col: &ColumnSpec,
        seed: CellSeed,
        types: &DataTypes,
        opts: &GridOptions,
    ) -> Result<Cell> {
        let value = types.coerce(col, seed.value, opts)?;
        let text = types.text(col, &value);
        Ok(Cell::from_seed(
            CellSeed {
                value,
                locked: seed.locked,
                untarget: seed.untarget,
                required: seed.required,
                locked_color: seed.locked_color,
            },
            text,
        ))
    }

    // ========================================================================
    // Value writes
    // ========================================================================

    /// Write an already-coerced value and its display text to one cell.
    /// Returns the previous value for history capture. The reserved
    /// row-number and status columns reject writes. No hooks run here.
    pub fn write_value<'a>(
        &mut self,
        row: usize,
        key: impl Into<crate::column::ColumnKey<'a>>,
        value: Value,
        text: String,
    ) -> Result<Value> {
        let col_index = self.col_index(key)?;
        if col_index == ROW_NUMBER_COL || col_index == ROW_STATUS_COL {
            return Err(GridError::ImmutableColumn(col_index));
        }
        self.check_row(row)?;

        let cell = &mut self.rows[row - 1].cells[col_index - 1];
        let old = std::mem::replace(&mut cell.value, value);
        cell.text = text;
        Ok(old)
    }

    // ========================================================================
    // Structural changes
    // ========================================================================

    /// Insert a row at a 1-based position with status `Create`.
    pub fn add_row(
        &mut self,
        at: usize,
        input: RowInput,
        types: &DataTypes,
        opts: &GridOptions,
    ) -> Result<()> {
        if at == 0 || at > self.rows.len() + 1 {
            return Err(GridError::RowOutOfRange {
                row: at,
                rows: self.rows.len(),
            });
        }
        let row = self.build_row(input, Some(RowStatus::Create), types, opts)?;
        self.rows.insert(at - 1, row);
        self.renumber_rows();
        Ok(())
    }

    /// Remove a row. Rows still in status `Create` are removed physically;
    /// anything else is marked `Delete` and kept. Returns true when the row
    /// was physically removed.
    pub fn remove_row(&mut self, row: usize) -> Result<bool> {
        self.check_row(row)?;
        if self.rows[row - 1].status == Some(RowStatus::Create) {
            self.rows.remove(row - 1);
            self.renumber_rows();
            Ok(true)
        } else {
            self.set_row_status(row, Some(RowStatus::Delete))?;
            Ok(false)
        }
    }

    pub fn row_status(&self, row: usize) -> Result<Option<RowStatus>> {
        self.check_row(row)?;
        Ok(self.rows[row - 1].status)
    }

    pub fn set_row_status(&mut self, row: usize, status: Option<RowStatus>) -> Result<()> {
        self.check_row(row)?;
        self.rows[row - 1].status = status;
        let cell = &mut self.rows[row - 1].cells[ROW_STATUS_COL - 1];
        let code = status.map(|s| s.code()).unwrap_or("");
        cell.value = if code.is_empty() {
            Value::Empty
        } else {
            Value::Text(code.to_string())
        };
        cell.text = code.to_string();
        Ok(())
    }

    /// Insert a user column at a 1-based index, filling each row from
    /// `values` (coerced) or empty.
    pub fn add_col(
        &mut self,
        at: usize,
        spec: ColumnSpec,
        values: Option<Vec<Value>>,
        types: &DataTypes,
        opts: &GridOptions,
    ) -> Result<()> {
        self.columns.insert(at, spec)?;
        let col = self
            .columns
            .get(at)
            .cloned()
            .unwrap_or_default();

        for (i, row) in self.rows.iter_mut().enumerate() {
            let raw = values
                .as_ref()
                .and_then(|v| v.get(i).cloned())
                .unwrap_or(Value::Empty);
            let value = types.coerce(&col, raw, opts)?;
            let text = types.text(&col, &value);
            row.cells.insert(at - 1, Cell::with_value(value, text));
        }
        Ok(())
    }

    /// Remove a user column, returning its spec and per-row values.
    pub fn remove_col(&mut self, index: usize) -> Result<(ColumnSpec, Vec<Value>)> {
        let spec = self.columns.remove(index)?;
        let mut values = Vec::with_capacity(self.rows.len());
        for row in &mut self.rows {
            values.push(row.cells.remove(index - 1).value);
        }
        Ok((spec, values))
    }

    /// Stored values of one column, top to bottom.
    pub fn column_values<'a>(
        &self,
        key: impl Into<crate::column::ColumnKey<'a>>,
    ) -> Result<Vec<Value>> {
        let col = self.col_index(key)?;
        Ok(self
            .rows
            .iter()
            .map(|r| r.cells[col - 1].value.clone())
            .collect())
    }

    /// Reorder rows by a permutation of 0-based positions (new order listing
    /// old positions).
    pub fn reorder_rows(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.rows.len());
        let mut old_rows: Vec<Option<Row>> = std::mem::take(&mut self.rows).into_iter().map(Some).collect();
        self.rows = order
            .iter()
            .filter_map(|&old_pos| old_rows.get_mut(old_pos).and_then(Option::take))
            .collect();
        self.renumber_rows();
    }

    /// Refresh the reserved columns: row numbers 1..=N and status codes.
    pub fn renumber_rows(&mut self) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            let n = (i + 1) as f64;
            let number_cell = &mut row.cells[ROW_NUMBER_COL - 1];
            number_cell.value = Value::Number(n);
            number_cell.text = format_number(n);

            let code = row.status.map(|s| s.code()).unwrap_or("");
            let status_cell = &mut row.cells[ROW_STATUS_COL - 1];
            status_cell.value = if code.is_empty() {
                Value::Empty
            } else {
                Value::Text(code.to_string())
            };
            status_cell.text = code.to_string();
        }
    }
}

fn json_seed(item: serde_json::Value) -> Result<CellSeed> {
    match item {
        serde_json::Value::Object(_) => serde_json::from_value(item)
            .map_err(|e| GridError::InvalidDataShape(format!("bad cell record: {e}"))),
        primitive => Ok(CellSeed::new(Value::from(&primitive))),
    }
}

fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
