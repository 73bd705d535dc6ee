//! Grid event hooks
//!
//! The engine's only outward surface: synchronous callbacks fired around
//! mutations and selection changes. `Guard` hooks run before an operation
//! and cancel it by returning false; `Notify` hooks are fire-and-forget.
//! History replay (undo/redo) bypasses guards.

use crate::datatype::Value;

/// A cancellable guard: return false to abort the operation.
pub type Guard<E> = Box<dyn FnMut(&E) -> bool>;

/// A notification callback.
pub type Notify<E> = Box<dyn FnMut(&E)>;

/// Payload of one cell value change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub row: usize,
    pub col: usize,
    pub old: Value,
    pub new: Value,
}

/// Payload of a selection change: the target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectEvent {
    pub row: usize,
    pub col: usize,
}

/// Payload around one cell's edit session.
#[derive(Debug, Clone, PartialEq)]
pub struct EditEvent {
    pub row: usize,
    pub col: usize,
    /// The cell text when the session opens; the candidate text when it
    /// is ending.
    pub text: String,
}

/// Payload of a completed paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    pub start_row: usize,
    pub start_col: usize,
    /// Number of cells actually written.
    pub cells: usize,
}

/// Payload of an applied filter choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEvent {
    pub col_id: String,
    pub value: String,
}

/// Callbacks a host wires into the grid. All fields are optional; a
/// missing guard allows the operation.
#[derive(Default)]
pub struct GridHooks {
    pub before_change: Option<Guard<ChangeEvent>>,
    pub after_change: Option<Notify<ChangeEvent>>,

    pub before_select: Option<Guard<SelectEvent>>,
    pub after_select: Option<Notify<SelectEvent>>,
    pub active_cell: Option<Notify<(usize, usize)>>,
    pub active_cells: Option<Notify<Vec<(usize, usize)>>>,
    pub active_row: Option<Notify<usize>>,
    pub active_rows: Option<Notify<Vec<usize>>>,
    pub active_col: Option<Notify<usize>>,
    pub active_cols: Option<Notify<Vec<usize>>>,

    pub before_edit: Option<Guard<EditEvent>>,
    pub after_edit: Option<Notify<EditEvent>>,
    pub edit_ending: Option<Notify<EditEvent>>,

    pub on_copy: Option<Notify<String>>,
    pub on_paste: Option<Notify<PasteEvent>>,
    pub choose_filter: Option<Notify<FilterEvent>>,
}

impl GridHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fire_before_change(&mut self, event: &ChangeEvent) -> bool {
        self.before_change.as_mut().map(|h| h(event)).unwrap_or(true)
    }

    pub(crate) fn fire_after_change(&mut self, event: &ChangeEvent) {
        if let Some(hook) = self.after_change.as_mut() {
            hook(event);
        }
    }

    pub(crate) fn fire_before_select(&mut self, event: &SelectEvent) -> bool {
        self.before_select.as_mut().map(|h| h(event)).unwrap_or(true)
    }

    pub(crate) fn fire_after_select(&mut self, event: &SelectEvent) {
        if let Some(hook) = self.after_select.as_mut() {
            hook(event);
        }
    }

    pub(crate) fn fire_active_cell(&mut self, cell: &(usize, usize)) {
        if let Some(hook) = self.active_cell.as_mut() {
            hook(cell);
        }
    }

    pub(crate) fn fire_active_cells(&mut self, cells: &Vec<(usize, usize)>) {
        if let Some(hook) = self.active_cells.as_mut() {
            hook(cells);
        }
    }

    pub(crate) fn fire_active_row(&mut self, row: &usize) {
        if let Some(hook) = self.active_row.as_mut() {
            hook(row);
        }
    }

    pub(crate) fn fire_active_rows(&mut self, rows: &Vec<usize>) {
        if let Some(hook) = self.active_rows.as_mut() {
            hook(rows);
        }
    }

    pub(crate) fn fire_active_col(&mut self, col: &usize) {
        if let Some(hook) = self.active_col.as_mut() {
            hook(col);
        }
    }

    pub(crate) fn fire_active_cols(&mut self, cols: &Vec<usize>) {
        if let Some(hook) = self.active_cols.as_mut() {
            hook(cols);
        }
    }

    pub(crate) fn fire_before_edit(&mut self, event: &EditEvent) -> bool {
        self.before_edit.as_mut().map(|h| h(event)).unwrap_or(true)
    }

    pub(crate) fn fire_after_edit(&mut self, event: &EditEvent) {
        if let Some(hook) = self.after_edit.as_mut() {
            hook(event);
        }
    }

    pub(crate) fn fire_edit_ending(&mut self, event: &EditEvent) {
        if let Some(hook) = self.edit_ending.as_mut() {
            hook(event);
        }
    }

    pub(crate) fn fire_on_copy(&mut self, text: &String) {
        if let Some(hook) = self.on_copy.as_mut() {
            hook(text);
        }
    }

    pub(crate) fn fire_on_paste(&mut self, event: &PasteEvent) {
        if let Some(hook) = self.on_paste.as_mut() {
            hook(event);
        }
    }

    pub(crate) fn fire_choose_filter(&mut self, event: &FilterEvent) {
        if let Some(hook) = self.choose_filter.as_mut() {
            hook(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn change() -> ChangeEvent {
        ChangeEvent {
            row: 1,
            col: 3,
            old: Value::Empty,
            new: Value::Text("x".into()),
        }
    }

    #[test]
    fn test_missing_guard_allows() {
        let mut hooks = GridHooks::new();
        assert!(hooks.fire_before_change(&change()));
        assert!(hooks.fire_before_select(&SelectEvent { row: 1, col: 3 }));
    }

    #[test]
    fn test_guard_cancels() {
        let mut hooks = GridHooks::new();
        hooks.before_change = Some(Box::new(|_| false));
        assert!(!hooks.fire_before_change(&change()));
    }

    #[test]
    fn test_guard_sees_payload() {
        let mut hooks = GridHooks::new();
        hooks.before_change = Some(Box::new(|e| e.new != Value::Text("x".into())));
        assert!(!hooks.fire_before_change(&change()));
    }

    #[test]
    fn test_notify_receives_each_event() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut hooks = GridHooks::new();
        hooks.after_change = Some(Box::new(move |e| sink.borrow_mut().push(e.clone())));

        hooks.fire_after_change(&change());
        hooks.fire_after_change(&change());
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[0].row, 1);
    }
}
