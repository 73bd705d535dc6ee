//! Clipboard codec
//!
//! Tab/newline block format: cells joined by `\t`, rows by `\n`, cell text
//! containing a newline wrapped in double quotes. Parsing splits rows with
//! a quote-aware scanner so wrapped newlines survive a round trip.
//!
//! Paste mapping walks the parsed block over the grid: hidden rows and
//! columns shift the destination without consuming block cells; locked,
//! untargetable and structural cells consume theirs without being written;
//! the walk stops silently at the matrix edge.

use cellgrid_core::CellRange;

use crate::datatype::DataTypes;
use crate::matrix::Matrix;

/// Render a rectangular block as clipboard text.
pub fn serialize(block: &[Vec<String>]) -> String {
    block
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    if cell.contains('\n') {
                        format!("\"{cell}\"")
                    } else {
                        cell.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse clipboard text into rows of cells. Rows split on `\n` or `\r\n`
/// outside quoted spans; cells split on `\t`; surrounding quotes are
/// stripped.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut line = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                line.push(ch);
            }
            '\r' if !in_quotes => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                rows.push(split_row(&line));
                line.clear();
            }
            '\n' if !in_quotes => {
                rows.push(split_row(&line));
                line.clear();
            }
            _ => line.push(ch),
        }
    }
    // A trailing newline terminates the block instead of adding a row
    if !line.is_empty() {
        rows.push(split_row(&line));
    }
    rows
}

fn split_row(line: &str) -> Vec<String> {
    line.split('\t').map(strip_quotes).collect()
}

fn strip_quotes(cell: &str) -> String {
    if cell.len() >= 2 && cell.starts_with('"') && cell.ends_with('"') {
        cell[1..cell.len() - 1].to_string()
    } else {
        cell.to_string()
    }
}

/// Collect the copyable text of a range, row-major, skipping filtered rows
/// and hidden columns.
pub fn copy_block(matrix: &Matrix, types: &DataTypes, range: CellRange) -> Vec<Vec<String>> {
    let mut block = Vec::new();
    for r in range.rows() {
        let Ok(row) = matrix.row(r) else {
            continue;
        };
        if row.is_filtered() {
            continue;
        }
        let mut out = Vec::new();
        for c in range.cols() {
            let Some(col) = matrix.columns().get(c) else {
                continue;
            };
            if !col.col_visible {
                continue;
            }
            if let Some(cell) = matrix.cell_at(r, c) {
                out.push(types.copy_text(col, &cell.value));
            }
        }
        if !out.is_empty() {
            block.push(out);
        }
    }
    block
}

/// One destination cell for a parsed paste block.
#[derive(Debug, Clone, PartialEq)]
pub struct PasteTarget {
    pub row: usize,
    pub col: usize,
    pub text: String,
}

/// Map a parsed block onto the grid starting at a cell.
pub fn paste_targets(
    matrix: &Matrix,
    start_row: usize,
    start_col: usize,
    block: &[Vec<String>],
) -> Vec<PasteTarget> {
    let row_count = matrix.row_count();
    let col_count = matrix.col_count();
    let mut targets = Vec::new();

    let mut dest_row = start_row;
    for cells in block {
        // Filtered rows shift the destination without consuming a block row
        while dest_row <= row_count
            && matrix.row(dest_row).map(|r| r.is_filtered()).unwrap_or(false)
        {
            dest_row += 1;
        }
        if dest_row > row_count {
            break;
        }

        let mut dest_col = start_col;
        for text in cells {
            while dest_col <= col_count
                && !matrix
                    .columns()
                    .get(dest_col)
                    .map(|c| c.col_visible)
                    .unwrap_or(false)
            {
                dest_col += 1;
            }
            if dest_col > col_count {
                break;
            }
            if paste_writable(matrix, dest_row, dest_col) {
                targets.push(PasteTarget {
                    row: dest_row,
                    col: dest_col,
                    text: text.clone(),
                });
            }
            dest_col += 1;
        }
        dest_row += 1;
    }
    targets
}

fn paste_writable(matrix: &Matrix, row: usize, col: usize) -> bool {
    let Some(spec) = matrix.columns().get(col) else {
        return false;
    };
    if spec.data_type.is_structural() {
        return false;
    }
    let Some(cell) = matrix.cell_at(row, col) else {
        return false;
    };
    !cell.effective_locked(spec) && !cell.effective_untarget(spec)
}
