use std::fmt;

pub type Result<T> = std::result::Result<T, GridError>;

#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Row index outside 1..=row_count.
    RowOutOfRange { row: usize, rows: usize },
    /// Column index outside 1..=col_count.
    ColumnOutOfRange { col: usize, cols: usize },
    /// No column with the given id.
    ColumnNotFound(String),
    /// A column with this id already exists.
    DuplicateColumnId(String),
    /// Structural edit aimed at the reserved row-number/status columns.
    ImmutableColumn(usize),
    /// Bulk load mixed key-value rows with cell-data rows.
    InconsistentRowShape { row: usize },
    /// Bulk load input is not an array of rows.
    InvalidDataShape(String),
    /// A direct API call passed a primitive the column cannot hold.
    InvalidArgumentType { col: String, expected: &'static str, got: &'static str },
    /// TOML parse / deserialization error.
    ConfigParse(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowOutOfRange { row, rows } => {
                write!(f, "row {row} out of range (grid has {rows} row(s))")
            }
            Self::ColumnOutOfRange { col, cols } => {
                write!(f, "column {col} out of range (grid has {cols} column(s))")
            }
            Self::ColumnNotFound(id) => write!(f, "no column with id '{id}'"),
            Self::DuplicateColumnId(id) => write!(f, "column id '{id}' already exists"),
            Self::ImmutableColumn(index) => {
                write!(f, "column {index} is reserved and cannot be changed")
            }
            Self::InconsistentRowShape { row } => {
                write!(f, "row {row} does not match the shape of the first row")
            }
            Self::InvalidDataShape(msg) => write!(f, "invalid data shape: {msg}"),
            Self::InvalidArgumentType { col, expected, got } => {
                write!(f, "column '{col}': expected {expected}, got {got}")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for GridError {}
