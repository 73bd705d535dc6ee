//! Column registry
//!
//! Ordered column metadata with 1-based indices. Columns 1 and 2 are the
//! reserved row-number and row-status columns; they are created by the
//! registry itself and rejected by every user-facing structural operation.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::datatype::{CodeEntry, DataType};
use crate::error::{GridError, Result};
use crate::footer::FooterRule;

/// Index of the reserved row-number column.
pub const ROW_NUMBER_COL: usize = 1;
/// Index of the reserved row-status column.
pub const ROW_STATUS_COL: usize = 2;
/// First index available to user columns.
pub const FIRST_USER_COL: usize = 3;

pub const ROW_NUMBER_ID: &str = "_row_number";
pub const ROW_STATUS_ID: &str = "_row_status";

/// Per-column configuration: identity, constraints, behavioral flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    pub col_id: String,
    /// 1-based position; maintained by the registry on every insert/remove.
    pub index: usize,
    pub name: String,
    /// Header text per header row; shorter columns leave later rows blank.
    pub header: Vec<String>,
    /// Footer rule per footer row.
    pub footer: Vec<FooterRule>,
    pub data_type: DataType,

    // Value constraints
    pub max_length: Option<usize>,
    pub max_byte: Option<usize>,
    pub max_number: Option<f64>,
    pub min_number: Option<f64>,
    pub round_number: Option<u8>,
    pub codes: Vec<CodeEntry>,
    pub default_code: Option<String>,
    pub format: Option<String>,

    // Behavioral flags
    pub locked: bool,
    pub locked_color: Option<String>,
    pub required: bool,
    pub resizable: bool,
    pub sortable: bool,
    pub filterable: bool,
    pub row_merge: bool,
    pub col_merge: bool,
    pub col_visible: bool,
    pub untarget: bool,

    /// The active filter choice, if any.
    pub filter_value: Option<String>,
    /// Discovered filter choices; derived cache, rebuilt on demand.
    #[serde(skip)]
    pub filter_values: Vec<String>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            col_id: String::new(),
            index: 0,
            name: String::new(),
            header: Vec::new(),
            footer: Vec::new(),
            data_type: DataType::Text,
            max_length: None,
            max_byte: None,
            max_number: None,
            min_number: None,
            round_number: None,
            codes: Vec::new(),
            default_code: None,
            format: None,
            locked: false,
            locked_color: None,
            required: false,
            resizable: true,
            sortable: true,
            filterable: false,
            row_merge: false,
            col_merge: false,
            col_visible: true,
            untarget: false,
            filter_value: None,
            filter_values: Vec::new(),
        }
    }
}

impl ColumnSpec {
    pub fn new(col_id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            col_id: col_id.into(),
            header: vec![name.clone()],
            name,
            ..Default::default()
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_header(mut self, header: Vec<String>) -> Self {
        self.header = header;
        self
    }

    pub fn with_footer(mut self, footer: Vec<FooterRule>) -> Self {
        self.footer = footer;
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn with_max_byte(mut self, max: usize) -> Self {
        self.max_byte = Some(max);
        self
    }

    pub fn with_max_number(mut self, max: f64) -> Self {
        self.max_number = Some(max);
        self
    }

    pub fn with_min_number(mut self, min: f64) -> Self {
        self.min_number = Some(min);
        self
    }

    pub fn with_round_number(mut self, places: u8) -> Self {
        self.round_number = Some(places);
        self
    }

    pub fn with_codes(mut self, codes: Vec<CodeEntry>) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_default_code(mut self, code: impl Into<String>) -> Self {
        self.default_code = Some(code.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn with_filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn with_row_merge(mut self, merge: bool) -> Self {
        self.row_merge = merge;
        self
    }

    pub fn with_col_merge(mut self, merge: bool) -> Self {
        self.col_merge = merge;
        self
    }

    pub fn with_col_visible(mut self, visible: bool) -> Self {
        self.col_visible = visible;
        self
    }

    pub fn with_untarget(mut self, untarget: bool) -> Self {
        self.untarget = untarget;
        self
    }

    /// Whether this is one of the reserved row-number/status columns.
    pub fn is_reserved(&self) -> bool {
        self.index == ROW_NUMBER_COL || self.index == ROW_STATUS_COL
    }

    fn row_number() -> Self {
        let mut col = Self::new(ROW_NUMBER_ID, "No.");
        col.data_type = DataType::Number;
        col.locked = true;
        col.sortable = false;
        col.resizable = false;
        col.untarget = true;
        col
    }

    fn row_status() -> Self {
        let mut col = Self::new(ROW_STATUS_ID, "");
        col.locked = true;
        col.sortable = false;
        col.resizable = false;
        col.untarget = true;
        col
    }
}

/// Key for addressing a column: 1-based index or id.
#[derive(Debug, Clone, Copy)]
pub enum ColumnKey<'a> {
    Index(usize),
    Id(&'a str),
}

impl From<usize> for ColumnKey<'_> {
    fn from(index: usize) -> Self {
        ColumnKey::Index(index)
    }
}

impl<'a> From<&'a str> for ColumnKey<'a> {
    fn from(id: &'a str) -> Self {
        ColumnKey::Id(id)
    }
}

impl<'a> From<&'a String> for ColumnKey<'a> {
    fn from(id: &'a String) -> Self {
        ColumnKey::Id(id.as_str())
    }
}

/// The ordered column collection.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    cols: Vec<ColumnSpec>,
    by_id: FxHashMap<String, usize>,
}

impl Columns {
    /// A registry holding only the two reserved columns.
    pub fn new() -> Self {
        let mut columns = Self::default();
        columns.cols.push(ColumnSpec::row_number());
        columns.cols.push(ColumnSpec::row_status());
        columns.renumber();
        columns
    }

    /// Build a registry from user column specs, appended after the reserved
    /// columns in the given order.
    pub fn from_specs(specs: Vec<ColumnSpec>) -> Result<Self> {
        let mut columns = Self::new();
        for spec in specs {
            let at = columns.len() + 1;
            columns.insert(at, spec)?;
        }
        Ok(columns)
    }

    pub fn len(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.cols.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ColumnSpec> {
        self.cols.iter_mut()
    }

    /// 1-based index of a column id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).map(|pos| pos + 1)
    }

    /// Look up a column; `None` if absent.
    pub fn get<'a>(&self, key: impl Into<ColumnKey<'a>>) -> Option<&ColumnSpec> {
        match key.into() {
            ColumnKey::Index(index) => {
                if index == 0 {
                    return None;
                }
                self.cols.get(index - 1)
            }
            ColumnKey::Id(id) => self.by_id.get(id).map(|pos| &self.cols[*pos]),
        }
    }

    /// Look up a column or fail with the coordinate error for the key kind.
    pub fn require<'a>(&self, key: impl Into<ColumnKey<'a>>) -> Result<&ColumnSpec> {
        let key = key.into();
        self.get(key).ok_or_else(|| match key {
            ColumnKey::Index(index) => GridError::ColumnOutOfRange {
                col: index,
                cols: self.len(),
            },
            ColumnKey::Id(id) => GridError::ColumnNotFound(id.to_string()),
        })
    }

    pub fn get_mut<'a>(&mut self, key: impl Into<ColumnKey<'a>>) -> Option<&mut ColumnSpec> {
        match key.into() {
            ColumnKey::Index(index) => {
                if index == 0 {
                    return None;
                }
                self.cols.get_mut(index - 1)
            }
            ColumnKey::Id(id) => match self.by_id.get(id) {
                Some(pos) => self.cols.get_mut(*pos),
                None => None,
            },
        }
    }

    pub fn require_mut<'a>(&mut self, key: impl Into<ColumnKey<'a>>) -> Result<&mut ColumnSpec> {
        let key = key.into();
        let len = self.len();
        match self.get_mut(key) {
            Some(col) => Ok(col),
            None => Err(match key {
                ColumnKey::Index(index) => GridError::ColumnOutOfRange { col: index, cols: len },
                ColumnKey::Id(id) => GridError::ColumnNotFound(id.to_string()),
            }),
        }
    }

    /// Insert a user column at a 1-based index, shifting later columns right.
    pub fn insert(&mut self, at_index: usize, spec: ColumnSpec) -> Result<()> {
        if at_index < FIRST_USER_COL {
            return Err(GridError::ImmutableColumn(at_index));
        }
        if at_index > self.len() + 1 {
            return Err(GridError::ColumnOutOfRange {
                col: at_index,
                cols: self.len(),
            });
        }
        if self.by_id.contains_key(&spec.col_id) {
            return Err(GridError::DuplicateColumnId(spec.col_id));
        }
        self.cols.insert(at_index - 1, spec);
        self.renumber();
        Ok(())
    }

    /// Remove a user column by 1-based index, returning it.
    pub fn remove(&mut self, index: usize) -> Result<ColumnSpec> {
        if index < FIRST_USER_COL {
            return Err(GridError::ImmutableColumn(index));
        }
        if index > self.len() {
            return Err(GridError::ColumnOutOfRange {
                col: index,
                cols: self.len(),
            });
        }
        let removed = self.cols.remove(index - 1);
        self.renumber();
        Ok(removed)
    }

    /// Reassign indices 1..=N in order and rebuild the id map.
    pub fn renumber(&mut self) {
        self.by_id.clear();
        for (pos, col) in self.cols.iter_mut().enumerate() {
            col.index = pos + 1;
            self.by_id.insert(col.col_id.clone(), pos);
        }
    }
}
