//! Edit history
//!
//! Bounded transaction log of committed cell writes. A cursor splits the
//! log into undoable groups behind it and redoable groups ahead of it; a
//! new commit truncates the redo tail. Capacity eviction drops the oldest
//! group and pulls the cursor back with it.
//!
//! Records address cells by position, so structural changes must keep the
//! log aligned: reorders remap rows, inserts shift, physical removals drop
//! the affected records.

use crate::datatype::Value;

/// One cell write inside a committed group.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord {
    pub row: usize,
    pub col: usize,
    pub old: Value,
    pub new: Value,
}

/// The cell writes of one gesture, undone and redone as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditGroup {
    pub records: Vec<EditRecord>,
}

impl EditGroup {
    pub fn new(records: Vec<EditRecord>) -> Self {
        Self { records }
    }
}

/// Undo/redo log.
#[derive(Debug, Clone)]
pub struct History {
    groups: Vec<EditGroup>,
    /// Number of applied groups. Everything before it can be undone,
    /// everything at or after it redone.
    cursor: usize,
    capacity: usize,
    enabled: bool,
}

impl History {
    pub fn new(enabled: bool, capacity: usize) -> Self {
        Self {
            groups: Vec::new(),
            cursor: 0,
            capacity,
            enabled,
        }
    }

    /// Record a single cell change. Writes that change nothing are not
    /// recorded.
    pub fn record_change(&mut self, row: usize, col: usize, old: Value, new: Value) {
        if old == new {
            return;
        }
        self.push_group(EditGroup::new(vec![EditRecord { row, col, old, new }]));
    }

    /// Record multiple cell changes as a single undoable operation.
    pub fn record_batch(&mut self, records: Vec<EditRecord>) {
        if records.is_empty() {
            return;
        }
        self.push_group(EditGroup::new(records));
    }

    fn push_group(&mut self, group: EditGroup) {
        if !self.enabled {
            return;
        }
        self.groups.truncate(self.cursor);
        self.groups.push(group);
        self.cursor += 1;

        if self.groups.len() > self.capacity {
            self.groups.remove(0);
            self.cursor -= 1;
        }
    }

    /// Step the cursor back, returning the group to revert. Apply its
    /// records in reverse order, writing the old values.
    pub fn undo(&mut self) -> Option<EditGroup> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.groups[self.cursor].clone())
    }

    /// Step the cursor forward, returning the group to reapply. Apply its
    /// records in order, writing the new values.
    pub fn redo(&mut self) -> Option<EditGroup> {
        if self.cursor == self.groups.len() {
            return None;
        }
        let group = self.groups[self.cursor].clone();
        self.cursor += 1;
        Some(group)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.groups.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.cursor = 0;
    }

    // ========================================================================
    // Structural maintenance
    // ========================================================================

    /// Rewrite record rows after a reorder. `order` lists old 0-based
    /// positions in new order, exactly as applied to the matrix.
    pub fn remap_rows(&mut self, order: &[usize]) {
        let mut inverse = vec![0usize; order.len()];
        for (new_pos, &old_pos) in order.iter().enumerate() {
            if old_pos < inverse.len() {
                inverse[old_pos] = new_pos;
            }
        }
        for group in &mut self.groups {
            for record in &mut group.records {
                if record.row >= 1 && record.row <= inverse.len() {
                    record.row = inverse[record.row - 1] + 1;
                }
            }
        }
    }

    /// Shift record rows after a row insert at a 1-based position.
    pub fn row_inserted(&mut self, at: usize) {
        for group in &mut self.groups {
            for record in &mut group.records {
                if record.row >= at {
                    record.row += 1;
                }
            }
        }
    }

    /// Drop records of a physically removed row and close the gap.
    /// Groups emptied by the drop disappear from the log.
    pub fn row_removed(&mut self, at: usize) {
        for group in &mut self.groups {
            group.records.retain(|r| r.row != at);
            for record in &mut group.records {
                if record.row > at {
                    record.row -= 1;
                }
            }
        }
        self.prune_empty();
    }

    /// Shift record columns after a column insert at a 1-based index.
    pub fn col_inserted(&mut self, at: usize) {
        for group in &mut self.groups {
            for record in &mut group.records {
                if record.col >= at {
                    record.col += 1;
                }
            }
        }
    }

    /// Drop records of a removed column and close the gap.
    pub fn col_removed(&mut self, at: usize) {
        for group in &mut self.groups {
            group.records.retain(|r| r.col != at);
            for record in &mut group.records {
                if record.col > at {
                    record.col -= 1;
                }
            }
        }
        self.prune_empty();
    }

    fn prune_empty(&mut self) {
        let mut i = 0;
        while i < self.groups.len() {
            if self.groups[i].records.is_empty() {
                self.groups.remove(i);
                if i < self.cursor {
                    self.cursor -= 1;
                }
            } else {
                i += 1;
            }
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(true, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn change(h: &mut History, row: usize, old: &str, new: &str) {
        h.record_change(row, 3, text(old), text(new));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut h = History::default();
        change(&mut h, 1, "a", "b");
        change(&mut h, 2, "x", "y");
        assert!(h.can_undo());
        assert!(!h.can_redo());

        let group = h.undo().unwrap();
        assert_eq!(group.records[0].old, text("x"));
        assert!(h.can_redo());

        let group = h.redo().unwrap();
        assert_eq!(group.records[0].new, text("y"));
        assert!(!h.can_redo());
    }

    #[test]
    fn test_commit_truncates_redo_tail() {
        let mut h = History::default();
        change(&mut h, 1, "a", "b");
        change(&mut h, 1, "b", "c");
        h.undo().unwrap();

        change(&mut h, 1, "b", "z");
        assert!(!h.can_redo());
        assert_eq!(h.len(), 2);
        assert_eq!(h.undo().unwrap().records[0].new, text("z"));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut h = History::new(true, 2);
        change(&mut h, 1, "a", "b");
        change(&mut h, 2, "a", "b");
        change(&mut h, 3, "a", "b");
        assert_eq!(h.len(), 2);

        // The oldest group is gone; only two undos remain
        assert_eq!(h.undo().unwrap().records[0].row, 3);
        assert_eq!(h.undo().unwrap().records[0].row, 2);
        assert!(h.undo().is_none());
        // Both survivors are still redoable
        assert!(h.redo().is_some());
        assert!(h.redo().is_some());
        assert!(h.redo().is_none());
    }

    #[test]
    fn test_disabled_history_records_nothing() {
        let mut h = History::new(false, 10);
        change(&mut h, 1, "a", "b");
        assert!(h.is_empty());
        assert!(h.undo().is_none());
    }

    #[test]
    fn test_noop_change_not_recorded() {
        let mut h = History::default();
        change(&mut h, 1, "same", "same");
        assert!(h.is_empty());
    }

    #[test]
    fn test_remap_rows_follows_reorder() {
        let mut h = History::default();
        change(&mut h, 1, "a", "b");
        change(&mut h, 3, "x", "y");

        // Reverse three rows: new order lists old positions [2, 1, 0]
        h.remap_rows(&[2, 1, 0]);

        let g2 = h.undo().unwrap();
        assert_eq!(g2.records[0].row, 1);
        let g1 = h.undo().unwrap();
        assert_eq!(g1.records[0].row, 3);
    }

    #[test]
    fn test_row_insert_shifts_records() {
        let mut h = History::default();
        change(&mut h, 2, "a", "b");
        h.row_inserted(1);
        assert_eq!(h.undo().unwrap().records[0].row, 3);
    }

    #[test]
    fn test_row_removal_drops_records_and_prunes() {
        let mut h = History::default();
        change(&mut h, 1, "a", "b");
        change(&mut h, 2, "x", "y");
        change(&mut h, 3, "p", "q");

        h.row_removed(2);
        assert_eq!(h.len(), 2);
        // The row-3 record slid up to row 2
        assert_eq!(h.undo().unwrap().records[0].row, 2);
        assert_eq!(h.undo().unwrap().records[0].row, 1);
        assert!(h.undo().is_none());
    }

    #[test]
    fn test_pruning_behind_cursor_keeps_redo_tail() {
        let mut h = History::default();
        change(&mut h, 1, "a", "b");
        change(&mut h, 2, "x", "y");
        h.undo().unwrap();

        // Dropping row 1 empties the group behind the cursor
        h.row_removed(1);
        assert_eq!(h.len(), 1);
        assert!(!h.can_undo());
        // The undone row-2 group survived (now at row 1)
        let group = h.redo().unwrap();
        assert_eq!(group.records[0].row, 1);
    }

    #[test]
    fn test_col_shift_and_removal() {
        let mut h = History::default();
        h.record_change(1, 4, text("a"), text("b"));
        h.col_inserted(3);
        h.record_change(1, 3, text("p"), text("q"));

        h.col_removed(3);
        assert_eq!(h.len(), 1);
        assert_eq!(h.undo().unwrap().records[0].col, 4);
    }
}
