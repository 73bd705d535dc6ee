//! Test harness for grid operations with hook tracking.
//!
//! `GridHarness` wraps a `Grid` with every hook wired into a shared
//! `HookLog`, so tests can drive operation scripts through `apply_ops`
//! and assert on the exact hook sequence and undo-group counts without
//! a rendering host.

use std::cell::RefCell;
use std::rc::Rc;

use crate::column::ColumnSpec;
use crate::datatype::{DataType, Value};
use crate::error::Result;
use crate::grid::Grid;
use crate::hooks::{ChangeEvent, FilterEvent, PasteEvent, SelectEvent};

/// One recorded hook invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum HookCall {
    BeforeChange(ChangeEvent),
    AfterChange(ChangeEvent),
    BeforeSelect(SelectEvent),
    AfterSelect(SelectEvent),
    ActiveCells(Vec<(usize, usize)>),
    Copy(String),
    Paste(PasteEvent),
    ChooseFilter(FilterEvent),
}

/// Shared recording sink the harness wires every hook into.
#[derive(Debug, Clone, Default)]
pub struct HookLog {
    calls: Rc<RefCell<Vec<HookCall>>>,
}

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: HookCall) {
        self.calls.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Number of recorded calls matching a predicate.
    pub fn count(&self, pred: impl Fn(&HookCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn change_count(&self) -> usize {
        self.count(|c| matches!(c, HookCall::AfterChange(_)))
    }

    pub fn select_count(&self) -> usize {
        self.count(|c| matches!(c, HookCall::AfterSelect(_)))
    }
}

/// Operation to apply to a grid.
#[derive(Debug, Clone)]
pub enum Op {
    SetValue { row: usize, col_id: &'static str, value: Value },
    SelectCell { row: usize, col: usize },
    Paste { text: &'static str },
    Sort { col_id: &'static str, direction: Option<bool> },
    Filter { col_id: &'static str, value: &'static str },
    Undo,
    Redo,
}

/// Result of applying an operation script.
#[derive(Debug, Clone, Default)]
pub struct ApplyResult {
    /// Number of ops that reported an effect (value applied, selection
    /// moved, history stepped).
    pub effective: usize,
    /// Ops that ran without effect (cancelled, boundary, no-op).
    pub ineffective: usize,
}

/// A `Grid` with all hooks recording into a [`HookLog`].
pub struct GridHarness {
    grid: Grid,
    log: HookLog,
}

impl GridHarness {
    /// A grid with default options over the given user columns, hooks
    /// wired for recording.
    pub fn new(specs: Vec<ColumnSpec>) -> Self {
        let mut grid = Grid::with_columns(specs).expect("valid column specs");
        let log = HookLog::new();
        wire(&mut grid, &log);
        Self { grid, log }
    }

    /// The standard two-column fixture: text `name`, numeric `qty`.
    pub fn name_qty() -> Self {
        Self::new(vec![
            ColumnSpec::new("name", "Name"),
            ColumnSpec::new("qty", "Qty").with_data_type(DataType::Number),
        ])
    }

    pub fn load_json(&mut self, rows: serde_json::Value) -> Result<()> {
        self.grid.load_json(rows)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn log(&self) -> &HookLog {
        &self.log
    }

    /// Undo groups currently held in history.
    pub fn undo_group_count(&self) -> usize {
        self.grid.history().len()
    }

    /// Run an operation script in order. Every op records into history
    /// where the real operation would; hook calls land in the log.
    pub fn apply_ops(&mut self, ops: &[Op]) -> Result<ApplyResult> {
        let mut result = ApplyResult::default();
        for op in ops {
            let effective = match op {
                Op::SetValue { row, col_id, value } => {
                    self.grid.set_value(*row, *col_id, value.clone(), true)?
                }
                Op::SelectCell { row, col } => self.grid.select_cell(*row, *col),
                Op::Paste { text } => self.grid.paste(text)? > 0,
                Op::Sort { col_id, direction } => self.grid.sort(*col_id, *direction, false)?,
                Op::Filter { col_id, value } => {
                    self.grid.set_filter(*col_id, value)?;
                    true
                }
                Op::Undo => self.grid.undo()?,
                Op::Redo => self.grid.redo()?,
            };
            if effective {
                result.effective += 1;
            } else {
                result.ineffective += 1;
            }
        }
        Ok(result)
    }
}

fn wire(grid: &mut Grid, log: &HookLog) {
    let hooks = grid.hooks_mut();

    let sink = log.clone();
    hooks.before_change = Some(Box::new(move |e| {
        sink.push(HookCall::BeforeChange(e.clone()));
        true
    }));
    let sink = log.clone();
    hooks.after_change = Some(Box::new(move |e| sink.push(HookCall::AfterChange(e.clone()))));
    let sink = log.clone();
    hooks.before_select = Some(Box::new(move |e| {
        sink.push(HookCall::BeforeSelect(*e));
        true
    }));
    let sink = log.clone();
    hooks.after_select = Some(Box::new(move |e| sink.push(HookCall::AfterSelect(*e))));
    let sink = log.clone();
    hooks.active_cells = Some(Box::new(move |cells| {
        sink.push(HookCall::ActiveCells(cells.clone()))
    }));
    let sink = log.clone();
    hooks.on_copy = Some(Box::new(move |text| sink.push(HookCall::Copy(text.clone()))));
    let sink = log.clone();
    hooks.on_paste = Some(Box::new(move |e| sink.push(HookCall::Paste(e.clone()))));
    let sink = log.clone();
    hooks.choose_filter = Some(Box::new(move |e| {
        sink.push(HookCall::ChooseFilter(e.clone()))
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harness() -> GridHarness {
        let mut h = GridHarness::name_qty();
        h.load_json(serde_json::json!([
            { "name": "ant", "qty": 1 },
            { "name": "bee", "qty": 2 },
            { "name": "cat", "qty": 3 },
        ]))
        .unwrap();
        h
    }

    #[test]
    fn test_set_value_fires_before_then_after() {
        let mut h = harness();
        h.apply_ops(&[Op::SetValue {
            row: 2,
            col_id: "qty",
            value: Value::Number(9.0),
        }])
        .unwrap();

        let calls = h.log().calls();
        assert!(matches!(calls[0], HookCall::BeforeChange(_)));
        assert!(matches!(calls[1], HookCall::AfterChange(_)));
        if let HookCall::AfterChange(e) = &calls[1] {
            assert_eq!(e.old, Value::Number(2.0));
            assert_eq!(e.new, Value::Number(9.0));
        }
    }

    #[test]
    fn test_script_counts_undo_groups() {
        let mut h = harness();
        let result = h
            .apply_ops(&[
                Op::SetValue { row: 1, col_id: "qty", value: Value::Number(10.0) },
                Op::SetValue { row: 2, col_id: "qty", value: Value::Number(20.0) },
                Op::Undo,
                Op::Undo,
                // Boundary: nothing left to undo
                Op::Undo,
            ])
            .unwrap();

        assert_eq!(result.effective, 4);
        assert_eq!(result.ineffective, 1);
        assert_eq!(h.undo_group_count(), 2);
        assert_eq!(h.grid().value(1, "qty").unwrap(), Value::Number(1.0));
        assert_eq!(h.grid().value(2, "qty").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_scenario_edit_undo_restores_and_steps_cursor() {
        let mut h = harness();
        h.apply_ops(&[Op::SetValue {
            row: 2,
            col_id: "qty",
            value: Value::Number(5.0),
        }])
        .unwrap();
        assert!(h.grid().can_undo());

        h.apply_ops(&[Op::Undo]).unwrap();
        assert_eq!(h.grid().value(2, "qty").unwrap(), Value::Number(2.0));
        assert!(!h.grid().can_undo());
        assert!(h.grid().can_redo());
    }

    #[test]
    fn test_paste_script_is_one_group_and_announces() {
        let mut h = harness();
        h.apply_ops(&[
            Op::SelectCell { row: 1, col: 3 },
            Op::Paste { text: "x\t7\ny\t8" },
        ])
        .unwrap();

        assert_eq!(h.undo_group_count(), 1);
        assert_eq!(
            h.log().count(|c| matches!(c, HookCall::Paste(_))),
            1
        );
        // Four cells wrote, so four after-change notifications
        assert_eq!(h.log().change_count(), 4);

        h.apply_ops(&[Op::Undo]).unwrap();
        assert_eq!(h.grid().text(1, "name").unwrap(), "ant");
        assert_eq!(h.grid().value(2, "qty").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_sort_and_filter_script() {
        let mut h = harness();
        h.apply_ops(&[
            Op::Sort { col_id: "qty", direction: Some(false) },
            Op::Filter { col_id: "name", value: "ant" },
        ])
        .unwrap();

        // Descending put cat first; the filter then hides everything but ant
        assert_eq!(h.grid().text(1, "name").unwrap(), "cat");
        assert!(h.grid().cell(1, "name").unwrap().filtered);
        assert!(!h.grid().cell(3, "name").unwrap().filtered);
        assert_eq!(
            h.log().count(|c| matches!(c, HookCall::ChooseFilter(_))),
            1
        );
    }

    #[test]
    fn test_selection_script_announces_cells() {
        let mut h = harness();
        h.apply_ops(&[Op::SelectCell { row: 2, col: 4 }]).unwrap();

        assert_eq!(h.log().select_count(), 1);
        let calls = h.log().calls();
        assert!(calls.contains(&HookCall::ActiveCells(vec![(2, 4)])));
    }
}
