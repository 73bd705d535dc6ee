//! Selection and navigation
//!
//! The selection is a target cell plus an optional rectangle anchored on
//! it. Eligibility is computed against the matrix: hidden columns,
//! filtered rows, untargetable cells and merge continuations can never be
//! targeted. Pointer selection on a merged block resolves to its
//! governing cell; keyboard navigation skips over the block instead.

use cellgrid_core::{CellRange, NavDirection, SelectionPolicy};

use crate::matrix::Matrix;

/// How often the host should fire [`DragScroll::tick`] while the pointer
/// is dragging outside the viewport.
pub const DRAG_SCROLL_INTERVAL_MS: u64 = 100;

/// Whether a cell can become the selection target.
pub fn is_targetable(matrix: &Matrix, row: usize, col: usize) -> bool {
    let Some(spec) = matrix.columns().get(col) else {
        return false;
    };
    if !spec.col_visible {
        return false;
    }
    let Some(cell) = matrix.cell_at(row, col) else {
        return false;
    };
    if cell.filtered || cell.is_merge_continuation() {
        return false;
    }
    !cell.effective_untarget(spec)
}

/// Resolve a merge continuation to the cell that governs it.
pub fn merge_owner(matrix: &Matrix, row: usize, col: usize) -> (usize, usize) {
    let (mut r, mut c) = (row, col);
    while let Some(cell) = matrix.cell_at(r, c) {
        if cell.is_row_merge && r > 1 {
            r -= 1;
        } else if cell.is_col_merge && c > 1 {
            c -= 1;
        } else {
            break;
        }
    }
    (r, c)
}

/// Current selection state.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// The focused cell. Always the anchor of the range.
    target: Option<(usize, usize)>,
    /// The corner the range was dragged to.
    extent: Option<(usize, usize)>,
    range: Option<CellRange>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<(usize, usize)> {
        self.target
    }

    pub fn range(&self) -> Option<CellRange> {
        self.range
    }

    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        self.range.map(|r| r.contains(row, col)).unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.target = None;
        self.extent = None;
        self.range = None;
    }

    /// Select one cell. Merge continuations resolve to their governing
    /// cell first. Returns false when the policy forbids selection or the
    /// cell cannot be targeted.
    pub fn select_cell(
        &mut self,
        matrix: &Matrix,
        policy: SelectionPolicy,
        row: usize,
        col: usize,
    ) -> bool {
        if !policy.allows_selection() {
            return false;
        }
        let (row, col) = merge_owner(matrix, row, col);
        if !is_targetable(matrix, row, col) {
            return false;
        }
        self.target = Some((row, col));
        self.extent = Some((row, col));
        self.range = Some(CellRange::single(row, col));
        true
    }

    /// Select a rectangle, anchored on its start cell. Under the single
    /// policy this collapses to the start cell.
    pub fn select_range(
        &mut self,
        matrix: &Matrix,
        policy: SelectionPolicy,
        range: CellRange,
    ) -> bool {
        if range.is_single() {
            return self.select_cell(matrix, policy, range.start_row, range.start_col);
        }
        // Multi-cell ranges are rejected outright under non-range policies,
        // leaving the prior selection untouched.
        if !policy.allows_range() {
            return false;
        }
        if !is_targetable(matrix, range.start_row, range.start_col) {
            return false;
        }
        self.target = Some((range.start_row, range.start_col));
        self.extent = Some((range.end_row, range.end_col));
        self.range = Some(range);
        true
    }

    /// Stretch the range from the target to a dragged-over cell.
    pub fn extend_to(&mut self, policy: SelectionPolicy, row: usize, col: usize) -> bool {
        if !policy.allows_range() {
            return false;
        }
        let Some((tr, tc)) = self.target else {
            return false;
        };
        self.extent = Some((row, col));
        self.range = Some(CellRange::new(tr, tc, row, col));
        true
    }

    /// Grow the range one step in a direction, clamped at the grid edge.
    /// Used by drag auto-scroll ticks.
    pub fn extend_step(
        &mut self,
        matrix: &Matrix,
        policy: SelectionPolicy,
        dir: NavDirection,
    ) -> bool {
        if !policy.allows_range() {
            return false;
        }
        let (Some((tr, tc)), Some((er, ec))) = (self.target, self.extent) else {
            return false;
        };
        let (dr, dc) = dir.delta();
        let nr = step(er, dr, matrix.row_count());
        let nc = step(ec, dc, matrix.col_count());
        if (nr, nc) == (er, ec) {
            return false;
        }
        self.extent = Some((nr, nc));
        self.range = Some(CellRange::new(tr, tc, nr, nc));
        true
    }

    /// Move the target one step, skipping cells that cannot be targeted.
    /// The target stays put (and this returns false) when nothing in that
    /// direction is eligible.
    pub fn navigate(
        &mut self,
        matrix: &Matrix,
        policy: SelectionPolicy,
        dir: NavDirection,
    ) -> bool {
        let Some((row, col)) = self.target else {
            return false;
        };
        let (r, c) = next_target(matrix, row, col, dir);
        if (r, c) == (row, col) {
            return false;
        }
        self.select_cell(matrix, policy, r, c)
    }

    /// Move to the next targetable cell to the right, wrapping to the
    /// start of the next row. `reverse` walks left and wraps upward.
    /// Returns false at the end of the grid.
    pub fn tab(&mut self, matrix: &Matrix, policy: SelectionPolicy, reverse: bool) -> bool {
        let Some((row, col)) = self.target else {
            return false;
        };
        match next_tab_stop(matrix, row, col, reverse) {
            Some((r, c)) => self.select_cell(matrix, policy, r, c),
            None => false,
        }
    }

    /// Cells the selection acts on: the range in row-major order, minus
    /// anything that cannot be targeted.
    pub fn active_cells(&self, matrix: &Matrix) -> Vec<(usize, usize)> {
        let Some(range) = self.range else {
            return Vec::new();
        };
        range
            .cells()
            .filter(|&(r, c)| is_targetable(matrix, r, c))
            .collect()
    }

    /// Rows the rectangle touches, in order. Unlike [`active_cells`]
    /// this ignores per-cell visibility: a fully filtered row inside
    /// the rectangle is still reported.
    ///
    /// [`active_cells`]: Selection::active_cells
    pub fn active_rows(&self) -> Vec<usize> {
        self.range.map(|r| r.rows().collect()).unwrap_or_default()
    }

    /// Columns the rectangle touches, in order, hidden and untargetable
    /// columns included.
    pub fn active_cols(&self) -> Vec<usize> {
        self.range.map(|r| r.cols().collect()).unwrap_or_default()
    }
}

/// Walk from (row, col) in a direction until a targetable cell or the
/// grid edge. Returns the original cell when nothing is eligible.
pub fn next_target(matrix: &Matrix, row: usize, col: usize, dir: NavDirection) -> (usize, usize) {
    let (dr, dc) = dir.delta();
    let rows = matrix.row_count() as isize;
    let cols = matrix.col_count() as isize;
    let (mut r, mut c) = (row as isize, col as isize);
    loop {
        r += dr;
        c += dc;
        if r < 1 || c < 1 || r > rows || c > cols {
            return (row, col);
        }
        if is_targetable(matrix, r as usize, c as usize) {
            return (r as usize, c as usize);
        }
    }
}

fn next_tab_stop(
    matrix: &Matrix,
    row: usize,
    col: usize,
    reverse: bool,
) -> Option<(usize, usize)> {
    let rows = matrix.row_count();
    let cols = matrix.col_count();
    let (mut r, mut c) = (row, col);
    loop {
        if reverse {
            if c > 1 {
                c -= 1;
            } else if r > 1 {
                r -= 1;
                c = cols;
            } else {
                return None;
            }
        } else if c < cols {
            c += 1;
        } else if r < rows {
            r += 1;
            c = 1;
        } else {
            return None;
        }
        if is_targetable(matrix, r, c) {
            return Some((r, c));
        }
    }
}

fn step(pos: usize, delta: isize, max: usize) -> usize {
    let next = pos as isize + delta;
    if next < 1 || next > max as isize {
        pos
    } else {
        next as usize
    }
}

/// Drag-selection auto-scroll state. The host starts it when the pointer
/// leaves the viewport mid-drag and fires [`DragScroll::tick`] on each
/// interval until [`DragScroll::stop`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DragScroll {
    direction: Option<NavDirection>,
}

impl DragScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, dir: NavDirection) {
        self.direction = Some(dir);
    }

    pub fn stop(&mut self) {
        self.direction = None;
    }

    pub fn is_active(&self) -> bool {
        self.direction.is_some()
    }

    pub fn direction(&self) -> Option<NavDirection> {
        self.direction
    }

    /// Extend the selection one step in the drag direction.
    pub fn tick(
        &self,
        selection: &mut Selection,
        matrix: &Matrix,
        policy: SelectionPolicy,
    ) -> bool {
        match self.direction {
            Some(dir) => selection.extend_step(matrix, policy, dir),
            None => false,
        }
    }
}
