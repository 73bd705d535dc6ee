//! Grid facade
//!
//! One `Grid` owns the cell matrix, column registry, selection, history,
//! filter/sort state, and the host-wired hooks, and keeps them mutually
//! consistent: every mutation path recomputes merge spans and filter flags
//! before returning, so callers always observe settled state. There is no
//! ambient registry of instances; a host holds its `Grid` directly.

use rustc_hash::FxHashSet;

use cellgrid_core::{CellRange, NavDirection};

use crate::cell::{Cell, RowStatus};
use crate::clipboard;
use crate::column::{ColumnKey, ColumnSpec, Columns, FIRST_USER_COL};
use crate::config::{GridConfig, GridOptions};
use crate::datatype::{DataTypeHandler, DataTypes, Value};
use crate::error::{GridError, Result};
use crate::filter::{self, FilterState, FILTER_ALL};
use crate::footer::{self, FooterFormula, FooterFormulas};
use crate::history::{EditGroup, EditRecord, History};
use crate::hooks::{ChangeEvent, EditEvent, FilterEvent, GridHooks, PasteEvent, SelectEvent};
use crate::matrix::{Matrix, RowInput};
use crate::merge::{self, SpanCell};
use crate::selection::{self, DragScroll, Selection};
use crate::sort::{self, SortToggle};

/// An in-progress cell edit. Opened by [`Grid::begin_edit`], closed by
/// [`Grid::end_edit`]; any reorder or structural change closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EditSession {
    row: usize,
    col: usize,
}

pub struct Grid {
    matrix: Matrix,
    types: DataTypes,
    formulas: FooterFormulas,
    options: GridOptions,
    selection: Selection,
    drag: DragScroll,
    history: History,
    filter: FilterState,
    sort_toggle: SortToggle,
    hooks: GridHooks,
    edit: Option<EditSession>,
}

impl Grid {
    // ========================================================================
    // Construction
    // ========================================================================

    pub fn new(config: GridConfig) -> Result<Self> {
        let GridConfig { options, columns } = config;
        let columns = Columns::from_specs(columns)?;
        let history = History::new(options.redoable, options.redo_count);
        Ok(Self {
            matrix: Matrix::new(columns),
            types: DataTypes::new(),
            formulas: FooterFormulas::new(),
            options,
            selection: Selection::new(),
            drag: DragScroll::new(),
            history,
            filter: FilterState::new(),
            sort_toggle: SortToggle::new(),
            hooks: GridHooks::new(),
            edit: None,
        })
    }

    /// Build a grid with default options from user column specs alone.
    pub fn with_columns(specs: Vec<ColumnSpec>) -> Result<Self> {
        Self::new(GridConfig {
            options: GridOptions::default(),
            columns: specs,
        })
    }

    /// Parse a TOML configuration document and build the grid from it.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Self::new(GridConfig::from_toml_str(input)?)
    }

    /// Register a custom data type handler, keyed by its tag.
    pub fn register_data_type(&mut self, tag: impl Into<String>, handler: Box<dyn DataTypeHandler>) {
        self.types.register(tag, handler);
    }

    /// Register a custom footer formula, keyed by its tag.
    pub fn register_footer_formula(&mut self, tag: impl Into<String>, formula: FooterFormula) {
        self.formulas.register(tag, formula);
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn row_count(&self) -> usize {
        self.matrix.row_count()
    }

    pub fn col_count(&self) -> usize {
        self.matrix.col_count()
    }

    pub fn columns(&self) -> &Columns {
        self.matrix.columns()
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Read-only view of the cell matrix, for rendering.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn cell<'a>(&self, row: usize, key: impl Into<ColumnKey<'a>>) -> Result<&Cell> {
        self.matrix.get(row, key)
    }

    pub fn value<'a>(&self, row: usize, key: impl Into<ColumnKey<'a>>) -> Result<Value> {
        Ok(self.matrix.get(row, key)?.value.clone())
    }

    pub fn text<'a>(&self, row: usize, key: impl Into<ColumnKey<'a>>) -> Result<String> {
        Ok(self.matrix.get(row, key)?.text.clone())
    }

    pub fn row_status(&self, row: usize) -> Result<Option<RowStatus>> {
        self.matrix.row_status(row)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The host's callbacks. Wire hooks here before driving the grid.
    pub fn hooks_mut(&mut self) -> &mut GridHooks {
        &mut self.hooks
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Replace every row. No cell survives a load: selection, history, and
    /// any open editor are dropped. Active filters and remembered sort
    /// directions persist and apply to the new rows.
    pub fn load(&mut self, input: Vec<RowInput>) -> Result<()> {
        self.matrix.load(input, &self.types, &self.options)?;
        self.after_load();
        Ok(())
    }

    /// [`Grid::load`] from a JSON array of key-value or cell-data rows.
    pub fn load_json(&mut self, input: serde_json::Value) -> Result<()> {
        self.matrix.load_json(input, &self.types, &self.options)?;
        self.after_load();
        Ok(())
    }

    fn after_load(&mut self) {
        self.selection.clear();
        self.drag.stop();
        self.edit = None;
        self.history.clear();
        self.filter.invalidate_all_caches();
        self.refresh_derived();
    }

    // ========================================================================
    // Value commits
    // ========================================================================

    /// Commit one value: coerce it, offer the old/new pair to the
    /// cancellable before-change hook, apply, and notify. With `record` the
    /// change lands in history as its own undo group. Returns `false` when
    /// the hook cancelled; nothing changes in that case.
    pub fn set_value<'a>(
        &mut self,
        row: usize,
        key: impl Into<ColumnKey<'a>>,
        raw: Value,
        record: bool,
    ) -> Result<bool> {
        let col = self.matrix.col_index(key)?;
        if col < FIRST_USER_COL {
            return Err(GridError::ImmutableColumn(col));
        }
        let spec = self.matrix.columns().require(col)?.clone();

        let mut records = Vec::new();
        let applied = self.commit_into(&spec, row, col, raw, &mut records)?;
        if record {
            self.history.record_batch(records);
        }
        if applied {
            self.touch_column(col);
        }
        Ok(applied)
    }

    /// Commit a whole column top-down, one value per row, as a single undo
    /// group. Extra values beyond the last row are ignored. Returns the
    /// number of cells written. Not transactional: a coercion error leaves
    /// earlier rows committed (and recorded).
    pub fn set_col_values<'a>(
        &mut self,
        key: impl Into<ColumnKey<'a>>,
        values: &[Value],
        record: bool,
    ) -> Result<usize> {
        let col = self.matrix.col_index(key)?;
        if col < FIRST_USER_COL {
            return Err(GridError::ImmutableColumn(col));
        }
        let spec = self.matrix.columns().require(col)?.clone();

        let mut records = Vec::new();
        let mut written = 0;
        let mut failure = None;
        for (i, raw) in values.iter().enumerate() {
            let row = i + 1;
            if row > self.matrix.row_count() {
                break;
            }
            match self.commit_into(&spec, row, col, raw.clone(), &mut records) {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if record {
            self.history.record_batch(records);
        }
        self.touch_column(col);
        match failure {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    /// Set or clear a row's status cell directly.
    pub fn set_row_status(&mut self, row: usize, status: Option<RowStatus>) -> Result<()> {
        self.matrix.set_row_status(row, status)
    }

    /// Coerce, gate, apply. Pushes an [`EditRecord`] for a real change;
    /// `Ok(false)` means the before-change hook cancelled.
    fn commit_into(
        &mut self,
        spec: &ColumnSpec,
        row: usize,
        col: usize,
        raw: Value,
        records: &mut Vec<EditRecord>,
    ) -> Result<bool> {
        let old = self.matrix.get(row, col)?.value.clone();
        let new = self.types.coerce(spec, raw, &self.options)?;
        let event = ChangeEvent {
            row,
            col,
            old: old.clone(),
            new: new.clone(),
        };
        if !self.hooks.fire_before_change(&event) {
            return Ok(false);
        }
        let text = self.types.text(spec, &new);
        self.matrix.write_value(row, col, new.clone(), text)?;
        self.hooks.fire_after_change(&event);
        if old != new {
            records.push(EditRecord { row, col, old, new });
        }
        Ok(true)
    }

    fn touch_column(&mut self, col: usize) {
        if let Some(spec) = self.matrix.columns().get(col) {
            let id = spec.col_id.clone();
            self.filter.invalidate_column(&id);
        }
        self.refresh_derived();
    }

    fn refresh_derived(&mut self) {
        filter::recompute(&mut self.matrix, &self.filter, &self.types);
        merge::recompute_spans(&mut self.matrix);
    }

    /// Drop cursors that no longer point at a live, targetable cell. Any
    /// open editor is closed, its cell may have moved under it.
    fn clamp_cursors(&mut self) {
        self.edit = None;
        if let Some((row, col)) = self.selection.target() {
            if !selection::is_targetable(&self.matrix, row, col) {
                self.selection.clear();
                self.drag.stop();
            }
        }
    }

    // ========================================================================
    // Undo and redo
    // ========================================================================

    /// Step history back one group, writing each record's old value in
    /// reverse commit order. Replay bypasses coercion and the change hooks;
    /// the first affected cell is re-selected. `Ok(false)` at the boundary
    /// or when history is disabled.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(group) = self.history.undo() else {
            return Ok(false);
        };
        for record in group.records.iter().rev() {
            self.replay(record.row, record.col, &record.old)?;
        }
        self.finish_replay(&group);
        Ok(true)
    }

    /// Step history forward one group, writing each record's new value in
    /// commit order.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(group) = self.history.redo() else {
            return Ok(false);
        };
        for record in group.records.iter() {
            self.replay(record.row, record.col, &record.new)?;
        }
        self.finish_replay(&group);
        Ok(true)
    }

    fn replay(&mut self, row: usize, col: usize, value: &Value) -> Result<()> {
        let spec = self.matrix.columns().require(col)?.clone();
        let text = self.types.text(&spec, value);
        self.matrix.write_value(row, col, value.clone(), text)?;
        self.filter.invalidate_column(&spec.col_id);
        Ok(())
    }

    fn finish_replay(&mut self, group: &EditGroup) {
        self.refresh_derived();
        if let Some(first) = group.records.first() {
            self.selection.select_cell(
                &self.matrix,
                self.options.selection_policy,
                first.row,
                first.col,
            );
        }
    }

    // ========================================================================
    // Rows and columns
    // ========================================================================

    /// Insert a row at a 1-based position with status `Create`. History
    /// records at or below the insertion point shift down with their rows.
    pub fn add_row(&mut self, at: usize, input: RowInput) -> Result<()> {
        self.matrix.add_row(at, input, &self.types, &self.options)?;
        self.history.row_inserted(at);
        self.filter.invalidate_all_caches();
        self.refresh_derived();
        self.clamp_cursors();
        Ok(())
    }

    /// Remove a row. A never-saved row (status `Create`) disappears
    /// physically and its history records with it; any other row is only
    /// marked `Delete`. Returns whether the row was physically removed.
    pub fn remove_row(&mut self, row: usize) -> Result<bool> {
        let removed = self.matrix.remove_row(row)?;
        if removed {
            self.history.row_removed(row);
        }
        self.filter.invalidate_all_caches();
        self.refresh_derived();
        self.clamp_cursors();
        Ok(removed)
    }

    /// Insert a user column at a 1-based index, filling each row from
    /// `values` or empty.
    pub fn add_col(
        &mut self,
        at: usize,
        spec: ColumnSpec,
        values: Option<Vec<Value>>,
    ) -> Result<()> {
        self.matrix.add_col(at, spec, values, &self.types, &self.options)?;
        self.history.col_inserted(at);
        self.filter.invalidate_all_caches();
        self.refresh_derived();
        self.clamp_cursors();
        Ok(())
    }

    /// Remove a user column, returning its spec and per-row values. Its
    /// history records and any active filter on it are dropped.
    pub fn remove_col<'a>(
        &mut self,
        key: impl Into<ColumnKey<'a>>,
    ) -> Result<(ColumnSpec, Vec<Value>)> {
        let index = self.matrix.col_index(key)?;
        let (spec, values) = self.matrix.remove_col(index)?;
        self.history.col_removed(index);
        self.filter.set_filter(&spec.col_id, FILTER_ALL);
        self.filter.invalidate_column(&spec.col_id);
        self.refresh_derived();
        self.clamp_cursors();
        Ok((spec, values))
    }

    // ========================================================================
    // Sort and filter
    // ========================================================================

    /// Stable sort by one column. Without an explicit direction the
    /// remembered per-column direction flips (first sort ascending);
    /// `numeric` forces numeric comparison on any column. History records
    /// follow their rows. `Ok(false)` if the column is not sortable.
    pub fn sort<'a>(
        &mut self,
        key: impl Into<ColumnKey<'a>>,
        direction: Option<bool>,
        numeric: bool,
    ) -> Result<bool> {
        let spec = self.matrix.columns().require(key)?.clone();
        if !spec.sortable {
            return Ok(false);
        }
        let ascending = self.sort_toggle.resolve(&spec.col_id, direction);
        let order = sort::sort_permutation(&self.matrix, &spec, ascending, numeric);
        self.matrix.reorder_rows(&order);
        self.history.remap_rows(&order);
        self.filter.invalidate_all_caches();
        self.refresh_derived();
        self.clamp_cursors();
        Ok(true)
    }

    /// The remembered sort direction for a column, if it was ever sorted.
    pub fn sort_direction(&self, col_id: &str) -> Option<bool> {
        self.sort_toggle.last_direction(col_id)
    }

    /// Set one column's filter and recompute row visibility before
    /// returning. [`FILTER_ALL`] clears the column's filter. The chosen
    /// value is announced through the choose-filter hook.
    pub fn set_filter<'a>(&mut self, key: impl Into<ColumnKey<'a>>, value: &str) -> Result<()> {
        let col = self.matrix.col_index(key)?;
        let col_id = self.matrix.columns().require(col)?.col_id.clone();
        self.filter.set_filter(&col_id, value);
        if let Some(spec) = self.matrix.columns_mut().get_mut(col) {
            spec.filter_value = if value == FILTER_ALL {
                None
            } else {
                Some(value.to_string())
            };
        }
        self.refresh_derived();
        self.clamp_cursors();
        self.hooks.fire_choose_filter(&FilterEvent {
            col_id,
            value: value.to_string(),
        });
        Ok(())
    }

    /// The chooser entries for one column: the match-all sentinel followed
    /// by the distinct display texts in first-seen row order. Cached until
    /// the column's values change; also mirrored onto the column spec.
    pub fn filter_values<'a>(&mut self, key: impl Into<ColumnKey<'a>>) -> Result<Vec<String>> {
        let spec = self.matrix.columns().require(key)?.clone();
        let texts: Vec<String> = self
            .matrix
            .rows()
            .map(|r| self.types.filter_text(&spec, &r.cells[spec.index - 1].value))
            .collect();
        let values = self.filter.build_filter_values(&spec.col_id, &texts).to_vec();
        if let Some(s) = self.matrix.columns_mut().get_mut(spec.index) {
            s.filter_values = values.clone();
        }
        Ok(values)
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Pointer-select one cell. The before-click hook may cancel; a click
    /// on a merge continuation lands on the span owner. Announces the new
    /// selection through the active-cell hooks.
    pub fn select_cell(&mut self, row: usize, col: usize) -> bool {
        if !self.hooks.fire_before_select(&SelectEvent { row, col }) {
            return false;
        }
        if !self
            .selection
            .select_cell(&self.matrix, self.options.selection_policy, row, col)
        {
            return false;
        }
        self.announce_selection();
        true
    }

    /// Pointer-select a rectangle. Multi-cell ranges require the range
    /// selection policy; rejected selects leave the prior one untouched.
    pub fn select_range(&mut self, range: CellRange) -> bool {
        let event = SelectEvent {
            row: range.start_row,
            col: range.start_col,
        };
        if !self.hooks.fire_before_select(&event) {
            return false;
        }
        if !self
            .selection
            .select_range(&self.matrix, self.options.selection_policy, range)
        {
            return false;
        }
        self.announce_selection();
        true
    }

    /// Stretch the current range from its target to a dragged-over cell.
    pub fn extend_selection(&mut self, row: usize, col: usize) -> bool {
        if !self.selection.extend_to(self.options.selection_policy, row, col) {
            return false;
        }
        self.announce_selection();
        true
    }

    /// Arrow-key navigation from the target, skipping hidden, filtered,
    /// untargetable, and merge-continuation cells. Stays put at the edge.
    pub fn navigate(&mut self, dir: NavDirection) -> bool {
        if !self
            .selection
            .navigate(&self.matrix, self.options.selection_policy, dir)
        {
            return false;
        }
        self.announce_selection();
        true
    }

    /// Tab to the next (or previous) targetable cell, wrapping rows.
    pub fn tab(&mut self, reverse: bool) -> bool {
        if !self
            .selection
            .tab(&self.matrix, self.options.selection_policy, reverse)
        {
            return false;
        }
        self.announce_selection();
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.drag.stop();
    }

    /// Begin drag auto-scroll in one direction. The host's interval timer
    /// calls [`Grid::drag_tick`] until [`Grid::drag_stop`].
    pub fn drag_start(&mut self, dir: NavDirection) {
        self.drag.start(dir);
    }

    /// One auto-scroll step: extend the range one cell in the drag
    /// direction. `false` once the range is pinned at the grid edge.
    pub fn drag_tick(&mut self) -> bool {
        let drag = self.drag;
        if !drag.tick(&mut self.selection, &self.matrix, self.options.selection_policy) {
            return false;
        }
        self.announce_selection();
        true
    }

    pub fn drag_stop(&mut self) {
        self.drag.stop();
    }

    pub fn drag_active(&self) -> bool {
        self.drag.is_active()
    }

    fn announce_selection(&mut self) {
        if let Some(target) = self.selection.target() {
            self.hooks.fire_after_select(&SelectEvent {
                row: target.0,
                col: target.1,
            });
            self.hooks.fire_active_cell(&target);
            self.hooks.fire_active_row(&target.0);
            self.hooks.fire_active_col(&target.1);
        }
        let cells = self.selection.active_cells(&self.matrix);
        self.hooks.fire_active_cells(&cells);
        let rows = self.selection.active_rows();
        self.hooks.fire_active_rows(&rows);
        let cols = self.selection.active_cols();
        self.hooks.fire_active_cols(&cols);
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Open an editor on a cell. Refused for locked or untargetable cells
    /// and cancellable through the before-edit hook.
    pub fn begin_edit(&mut self, row: usize, col: usize) -> Result<bool> {
        let cell = self.matrix.get(row, col)?;
        let spec = self.matrix.columns().require(col)?;
        let locked = cell.effective_locked(spec);
        let text = cell.text.clone();
        if locked || !selection::is_targetable(&self.matrix, row, col) {
            return Ok(false);
        }
        let event = EditEvent { row, col, text };
        if !self.hooks.fire_before_edit(&event) {
            return Ok(false);
        }
        self.edit = Some(EditSession { row, col });
        self.hooks.fire_after_edit(&event);
        Ok(true)
    }

    /// The cell under the open editor, if any.
    pub fn editing(&self) -> Option<(usize, usize)> {
        self.edit.map(|s| (s.row, s.col))
    }

    /// Close the editor. `Some(text)` commits through the same
    /// text-to-value conversion as paste plus the full change protocol;
    /// `None` cancels. The edit-ending hook sees the outgoing text either
    /// way. Returns whether a value was committed.
    pub fn end_edit(&mut self, text: Option<&str>) -> Result<bool> {
        let Some(session) = self.edit.take() else {
            return Ok(false);
        };
        let event = EditEvent {
            row: session.row,
            col: session.col,
            text: text.unwrap_or_default().to_string(),
        };
        self.hooks.fire_edit_ending(&event);
        let Some(text) = text else {
            return Ok(false);
        };
        let spec = self.matrix.columns().require(session.col)?.clone();
        let raw = self.types.paste_value(&spec, text);
        self.set_value(session.row, session.col, raw, true)
    }

    // ========================================================================
    // Clipboard
    // ========================================================================

    /// Serialize the selected rectangle for the clipboard, skipping
    /// filtered rows and hidden columns. `None` without a selection.
    pub fn copy(&mut self) -> Option<String> {
        let range = self.selection.range()?;
        let block = clipboard::copy_block(&self.matrix, &self.types, range);
        let text = clipboard::serialize(&block);
        self.hooks.fire_on_copy(&text);
        Some(text)
    }

    /// Paste clipboard text at the selection target. No-op without one.
    pub fn paste(&mut self, text: &str) -> Result<usize> {
        match self.selection.target() {
            Some((row, col)) => self.paste_block(row, col, text),
            None => Ok(0),
        }
    }

    /// Paste clipboard text with an explicit starting cell.
    pub fn paste_at<'a>(
        &mut self,
        start_row: usize,
        key: impl Into<ColumnKey<'a>>,
        text: &str,
    ) -> Result<usize> {
        let start_col = self.matrix.col_index(key)?;
        self.paste_block(start_row, start_col, text)
    }

    /// Walk the parsed block over the grid: filtered rows and hidden
    /// columns shift the destination without consuming pasted cells;
    /// locked, untargetable, and structural cells consume theirs without
    /// writing; the matrix edge drops the rest silently. All written cells
    /// land in one undo group. Returns the number of cells written.
    fn paste_block(&mut self, start_row: usize, start_col: usize, text: &str) -> Result<usize> {
        let block = clipboard::parse(text);
        let targets = clipboard::paste_targets(&self.matrix, start_row, start_col, &block);

        let mut records = Vec::new();
        let mut written = 0;
        let mut failure = None;
        let mut touched: FxHashSet<usize> = FxHashSet::default();
        for target in &targets {
            let spec = match self.matrix.columns().get(target.col) {
                Some(s) => s.clone(),
                None => continue,
            };
            let raw = self.types.paste_value(&spec, &target.text);
            match self.commit_into(&spec, target.row, target.col, raw, &mut records) {
                Ok(true) => {
                    written += 1;
                    touched.insert(target.col);
                }
                Ok(false) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        self.history.record_batch(records);
        for col in touched {
            if let Some(spec) = self.matrix.columns().get(col) {
                let id = spec.col_id.clone();
                self.filter.invalidate_column(&id);
            }
        }
        self.refresh_derived();
        if let Some(e) = failure {
            return Err(e);
        }
        self.hooks.fire_on_paste(&PasteEvent {
            start_row,
            start_col,
            cells: written,
        });
        Ok(written)
    }

    // ========================================================================
    // Footer and spans
    // ========================================================================

    /// Footer values as `[footer_row][column - 1]`, computed over the
    /// currently visible rows only.
    pub fn footer_values(&self) -> Vec<Vec<Value>> {
        let footer_rows = self
            .matrix
            .columns()
            .iter()
            .map(|c| c.footer.len())
            .max()
            .unwrap_or(0);
        (0..footer_rows)
            .map(|fr| {
                self.matrix
                    .columns()
                    .iter()
                    .map(|c| match c.footer.get(fr) {
                        Some(rule) => {
                            let values = self.visible_column_values(c.index);
                            footer::compute_footer(rule, &values, &self.formulas)
                        }
                        None => Value::Empty,
                    })
                    .collect()
            })
            .collect()
    }

    /// Footer values projected to display text, for rendering and span
    /// computation.
    pub fn footer_texts(&self) -> Vec<Vec<String>> {
        self.footer_values()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(i, value)| match self.matrix.columns().get(i + 1) {
                        Some(spec) => self.types.text(spec, &value),
                        None => String::new(),
                    })
                    .collect()
            })
            .collect()
    }

    /// Merge spans for the header text rows.
    pub fn header_spans(&self) -> Vec<Vec<SpanCell>> {
        merge::header_spans(self.matrix.columns())
    }

    /// Merge spans for the footer rows.
    pub fn footer_spans(&self) -> Vec<Vec<SpanCell>> {
        merge::footer_spans(self.matrix.columns(), &self.footer_texts())
    }

    fn visible_column_values(&self, col: usize) -> Vec<Value> {
        self.matrix
            .rows()
            .filter(|r| !r.is_filtered())
            .map(|r| r.cells[col - 1].value.clone())
            .collect()
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Every row as a JSON object keyed by column id, user columns only.
    pub fn rows_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .matrix
            .rows()
            .map(|row| {
                let mut object = serde_json::Map::new();
                for spec in self.matrix.columns().iter().filter(|c| !c.is_reserved()) {
                    let value = serde_json::to_value(&row.cells[spec.index - 1].value)
                        .unwrap_or(serde_json::Value::Null);
                    object.insert(spec.col_id.clone(), value);
                }
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}
