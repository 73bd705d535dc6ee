//! Merge resolver
//!
//! Derived span state for row/col merging, recomputed whenever rows,
//! filters, or columns change. A span is owned by its first cell; the rest
//! of the run becomes continuations with span 0.
//!
//! Run rule: a cell continues the current span when the owner is non-blank
//! and this cell is blank or equal to the owner. Two adjacent blanks never
//! merge (there is no non-blank owner). Row-merge is resolved before
//! col-merge, and a cell inside a row span is never col-merged. Filtered
//! rows and hidden columns are skipped without breaking a run. The reserved
//! row-number/status columns are hard boundaries.

use crate::column::{Columns, FIRST_USER_COL};
use crate::matrix::Matrix;

/// One run of merged positions within a scanned sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    /// Position of the owner within the scanned sequence.
    start: usize,
    /// Owner plus continuations.
    len: usize,
}

/// Span info for one header/footer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanCell {
    pub row_span: usize,
    pub col_span: usize,
    pub is_row_merge: bool,
    pub is_col_merge: bool,
}

impl Default for SpanCell {
    fn default() -> Self {
        Self {
            row_span: 1,
            col_span: 1,
            is_row_merge: false,
            is_col_merge: false,
        }
    }
}

/// Collapse a sequence into merge runs. `is_blank` marks values that always
/// continue a non-blank owner's run.
fn collapse_runs<T: PartialEq>(seq: &[T], is_blank: impl Fn(&T) -> bool) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (pos, item) in seq.iter().enumerate() {
        let continues = match runs.last() {
            Some(run) => {
                let owner = &seq[run.start];
                !is_blank(owner) && (is_blank(item) || item == owner)
            }
            None => false,
        };
        match runs.last_mut() {
            Some(run) if continues => run.len += 1,
            _ => runs.push(Run { start: pos, len: 1 }),
        }
    }
    runs
}

/// Recompute body merge spans in place.
pub fn recompute_spans(matrix: &mut Matrix) {
    let row_merge_cols: Vec<usize> = matrix
        .columns()
        .iter()
        .filter(|c| c.row_merge && c.index >= FIRST_USER_COL && c.col_visible)
        .map(|c| c.index)
        .collect();
    let col_merge_cols: Vec<usize> = matrix
        .columns()
        .iter()
        .filter(|c| c.col_merge && c.index >= FIRST_USER_COL && c.col_visible)
        .map(|c| c.index)
        .collect();

    let rows = matrix.rows_mut();
    let visible_rows: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.is_filtered())
        .map(|(pos, _)| pos)
        .collect();

    // Reset
    for row in rows.iter_mut() {
        for cell in row.cells.iter_mut() {
            cell.row_span = 1;
            cell.col_span = 1;
            cell.is_row_merge = false;
            cell.is_col_merge = false;
        }
    }

    // Row merge: per flagged column, scan visible rows top to bottom
    for &col in &row_merge_cols {
        let values: Vec<_> = visible_rows
            .iter()
            .map(|&pos| rows[pos].cells[col - 1].value.clone())
            .collect();
        for run in collapse_runs(&values, |v| v.is_empty()) {
            if run.len < 2 {
                continue;
            }
            rows[visible_rows[run.start]].cells[col - 1].row_span = run.len;
            for i in 1..run.len {
                let cell = &mut rows[visible_rows[run.start + i]].cells[col - 1];
                cell.row_span = 0;
                cell.is_row_merge = true;
            }
        }
    }

    // Col merge: per visible row, scan flagged columns left to right,
    // skipping cells already captured by a row span
    for &row_pos in &visible_rows {
        let eligible: Vec<usize> = col_merge_cols
            .iter()
            .copied()
            .filter(|&col| {
                let cell = &rows[row_pos].cells[col - 1];
                cell.row_span == 1 && !cell.is_row_merge
            })
            .collect();
        let values: Vec<_> = eligible
            .iter()
            .map(|&col| rows[row_pos].cells[col - 1].value.clone())
            .collect();
        for run in collapse_runs(&values, |v| v.is_empty()) {
            if run.len < 2 {
                continue;
            }
            let cells = &mut rows[row_pos].cells;
            cells[eligible[run.start] - 1].col_span = run.len;
            for i in 1..run.len {
                let cell = &mut cells[eligible[run.start + i] - 1];
                cell.col_span = 0;
                cell.is_col_merge = true;
            }
        }
    }
}

/// Compute header spans from the columns' header text rows. Returned as
/// `[header_row][column - 1]`.
pub fn header_spans(columns: &Columns) -> Vec<Vec<SpanCell>> {
    let texts: Vec<Vec<String>> = header_texts(columns);
    span_table(columns, &texts)
}

/// Compute footer spans from an already-computed footer text table
/// (`[footer_row][column - 1]`).
pub fn footer_spans(columns: &Columns, footer_texts: &[Vec<String>]) -> Vec<Vec<SpanCell>> {
    span_table(columns, footer_texts)
}

fn header_texts(columns: &Columns) -> Vec<Vec<String>> {
    let header_rows = columns.iter().map(|c| c.header.len()).max().unwrap_or(0);
    (0..header_rows)
        .map(|hr| {
            columns
                .iter()
                .map(|c| c.header.get(hr).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

fn span_table(columns: &Columns, texts: &[Vec<String>]) -> Vec<Vec<SpanCell>> {
    let n_cols = columns.len();
    let mut table = vec![vec![SpanCell::default(); n_cols]; texts.len()];

    // Vertical runs for row_merge columns
    for col in columns.iter() {
        if !col.row_merge || col.index < FIRST_USER_COL || !col.col_visible {
            continue;
        }
        let column_texts: Vec<&String> = texts.iter().map(|row| &row[col.index - 1]).collect();
        for run in collapse_runs(&column_texts, |t| t.is_empty()) {
            if run.len < 2 {
                continue;
            }
            table[run.start][col.index - 1].row_span = run.len;
            for i in 1..run.len {
                let cell = &mut table[run.start + i][col.index - 1];
                cell.row_span = 0;
                cell.is_row_merge = true;
            }
        }
    }

    // Horizontal runs across col_merge columns
    let merge_cols: Vec<usize> = columns
        .iter()
        .filter(|c| c.col_merge && c.index >= FIRST_USER_COL && c.col_visible)
        .map(|c| c.index)
        .collect();
    for (hr, row_texts) in texts.iter().enumerate() {
        let eligible: Vec<usize> = merge_cols
            .iter()
            .copied()
            .filter(|&col| {
                let cell = &table[hr][col - 1];
                cell.row_span == 1 && !cell.is_row_merge
            })
            .collect();
        let values: Vec<&String> = eligible.iter().map(|&col| &row_texts[col - 1]).collect();
        for run in collapse_runs(&values, |t| t.is_empty()) {
            if run.len < 2 {
                continue;
            }
            table[hr][eligible[run.start] - 1].col_span = run.len;
            for i in 1..run.len {
                let cell = &mut table[hr][eligible[run.start + i] - 1];
                cell.col_span = 0;
                cell.is_col_merge = true;
            }
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnSpec;
    use crate::config::GridOptions;
    use crate::datatype::{DataTypes, Value};
    use crate::matrix::{Matrix, RowInput};
    use rustc_hash::FxHashMap;

    fn kv(pairs: &[(&str, &str)]) -> RowInput {
        let mut map = FxHashMap::default();
        for (k, v) in pairs {
            let value = if v.is_empty() {
                Value::Empty
            } else {
                Value::Text(v.to_string())
            };
            map.insert(k.to_string(), value);
        }
        RowInput::KeyValue(map)
    }

    fn grid_matrix(rows: Vec<RowInput>) -> Matrix {
        let columns = Columns::from_specs(vec![
            ColumnSpec::new("grp", "Group").with_row_merge(true),
            ColumnSpec::new("a", "A").with_col_merge(true),
            ColumnSpec::new("b", "B").with_col_merge(true),
        ])
        .unwrap();
        let mut m = Matrix::new(columns);
        m.load(rows, &DataTypes::new(), &GridOptions::default()).unwrap();
        m
    }

    #[test]
    fn test_row_merge_equal_run() {
        let mut m = grid_matrix(vec![
            kv(&[("grp", "x")]),
            kv(&[("grp", "x")]),
            kv(&[("grp", "y")]),
        ]);
        recompute_spans(&mut m);

        let owner = m.get(1, "grp").unwrap();
        assert_eq!(owner.row_span, 2);
        assert!(!owner.is_row_merge);

        let cont = m.get(2, "grp").unwrap();
        assert_eq!(cont.row_span, 0);
        assert!(cont.is_row_merge);

        assert_eq!(m.get(3, "grp").unwrap().row_span, 1);
    }

    #[test]
    fn test_row_merge_blank_continues() {
        let mut m = grid_matrix(vec![
            kv(&[("grp", "x")]),
            kv(&[("grp", "")]),
            kv(&[("grp", "x")]),
        ]);
        recompute_spans(&mut m);

        // blank and the equal value both extend the run
        assert_eq!(m.get(1, "grp").unwrap().row_span, 3);
        assert!(m.get(2, "grp").unwrap().is_row_merge);
        assert!(m.get(3, "grp").unwrap().is_row_merge);
    }

    #[test]
    fn test_leading_blanks_do_not_merge() {
        let mut m = grid_matrix(vec![
            kv(&[("grp", "")]),
            kv(&[("grp", "")]),
            kv(&[("grp", "x")]),
        ]);
        recompute_spans(&mut m);

        assert_eq!(m.get(1, "grp").unwrap().row_span, 1);
        assert_eq!(m.get(2, "grp").unwrap().row_span, 1);
        assert!(!m.get(2, "grp").unwrap().is_row_merge);
    }

    #[test]
    fn test_col_merge_within_row() {
        let mut m = grid_matrix(vec![kv(&[("a", "same"), ("b", "same")])]);
        recompute_spans(&mut m);

        assert_eq!(m.get(1, "a").unwrap().col_span, 2);
        assert!(m.get(1, "b").unwrap().is_col_merge);
    }

    #[test]
    fn test_row_merge_wins_over_col_merge() {
        let columns = Columns::from_specs(vec![
            ColumnSpec::new("a", "A").with_row_merge(true).with_col_merge(true),
            ColumnSpec::new("b", "B").with_col_merge(true),
        ])
        .unwrap();
        let mut m = Matrix::new(columns);
        m.load(
            vec![
                kv(&[("a", "x"), ("b", "x")]),
                kv(&[("a", "x"), ("b", "z")]),
            ],
            &DataTypes::new(),
            &GridOptions::default(),
        )
        .unwrap();
        recompute_spans(&mut m);

        // "a" is a 2-row span, so no col merge happens on row 1
        assert_eq!(m.get(1, "a").unwrap().row_span, 2);
        assert_eq!(m.get(1, "a").unwrap().col_span, 1);
        assert!(!m.get(1, "b").unwrap().is_col_merge);
    }

    #[test]
    fn test_filtered_rows_skipped_without_breaking_runs() {
        let mut m = grid_matrix(vec![
            kv(&[("grp", "x")]),
            kv(&[("grp", "other")]),
            kv(&[("grp", "x")]),
        ]);
        // Hide the middle row as a filter would
        for cell in m.rows_mut()[1].cells.iter_mut() {
            cell.filtered = true;
        }
        recompute_spans(&mut m);

        assert_eq!(m.get(1, "grp").unwrap().row_span, 2);
        assert!(m.get(3, "grp").unwrap().is_row_merge);
        // The hidden row keeps a plain span
        assert_eq!(m.get(2, "grp").unwrap().row_span, 1);
        assert!(!m.get(2, "grp").unwrap().is_row_merge);
    }

    #[test]
    fn test_header_spans_group() {
        let columns = Columns::from_specs(vec![
            ColumnSpec::new("a", "A")
                .with_col_merge(true)
                .with_header(vec!["Group".into(), "A".into()]),
            ColumnSpec::new("b", "B")
                .with_col_merge(true)
                .with_header(vec!["Group".into(), "B".into()]),
            ColumnSpec::new("c", "C")
                .with_row_merge(true)
                .with_header(vec!["C".into(), "".into()]),
        ])
        .unwrap();

        let spans = header_spans(&columns);
        assert_eq!(spans.len(), 2);

        // First header row: "Group" spans across a and b
        assert_eq!(spans[0][2].col_span, 2);
        assert!(spans[0][3].is_col_merge);
        // Second header row: no horizontal merge ("A" != "B")
        assert_eq!(spans[1][2].col_span, 1);
        // "C" spans both header rows vertically
        assert_eq!(spans[0][4].row_span, 2);
        assert!(spans[1][4].is_row_merge);
    }
}
