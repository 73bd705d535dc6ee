use serde::{Deserialize, Serialize};

/// An inclusive rectangle of cell coordinates.
///
/// Coordinates are 1-based; row 1 is the first data row and column 1 the
/// row-number column. The constructor normalizes its corners, so
/// `start_* <= end_*` holds no matter which way a drag ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl CellRange {
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        }
    }

    pub fn single(row: usize, col: usize) -> Self {
        Self::new(row, col, row, col)
    }

    pub fn is_single(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.start_row..=self.end_row).contains(&row)
            && (self.start_col..=self.end_col).contains(&col)
    }

    /// Rows the rectangle touches, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = usize> {
        self.start_row..=self.end_row
    }

    /// Columns the rectangle touches, left to right.
    pub fn cols(&self) -> impl Iterator<Item = usize> {
        self.start_col..=self.end_col
    }

    /// Every coordinate pair in the rectangle, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let cols = self.start_col..=self.end_col;
        self.rows()
            .flat_map(move |r| cols.clone().map(move |c| (r, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cell() {
        let r = CellRange::single(5, 3);
        assert!(r.is_single());
        assert!(r.contains(5, 3));
        assert!(!r.contains(5, 4));
        assert_eq!(r.cells().count(), 1);
    }

    #[test]
    fn test_containment() {
        let r = CellRange::new(1, 1, 3, 2);
        assert!(r.contains(1, 1));
        assert!(r.contains(2, 2));
        assert!(r.contains(3, 1));
        assert!(!r.contains(4, 1));
        assert!(!r.is_single());
    }

    #[test]
    fn test_corners_normalize() {
        let r = CellRange::new(5, 5, 1, 1);
        assert_eq!((r.start_row, r.start_col), (1, 1));
        assert_eq!((r.end_row, r.end_col), (5, 5));
    }

    #[test]
    fn test_cells_walk_row_major() {
        let r = CellRange::new(1, 3, 2, 4);
        let cells: Vec<_> = r.cells().collect();
        assert_eq!(cells, vec![(1, 3), (1, 4), (2, 3), (2, 4)]);
    }

    #[test]
    fn test_rows_and_cols_span_the_rectangle() {
        let r = CellRange::new(2, 3, 4, 5);
        assert_eq!(r.rows().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(r.cols().collect::<Vec<_>>(), vec![3, 4, 5]);
    }
}
