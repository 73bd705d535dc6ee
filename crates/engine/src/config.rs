//! Grid configuration
//!
//! The typed equivalent of the declarative column/grid attributes: the host
//! parses its markup (out of scope here) and hands the engine a `GridConfig`.

use serde::{Deserialize, Serialize};

use cellgrid_core::SelectionPolicy;

use crate::column::ColumnSpec;
use crate::error::{GridError, Result};

/// Grid-level behavior knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// How much the user may select at once.
    pub selection_policy: SelectionPolicy,

    /// Whether undo/redo is enabled at all.
    pub redoable: bool,

    /// Maximum number of undo groups kept; oldest are evicted beyond this.
    pub redo_count: usize,

    /// Byte width charged per character above U+007F when clamping to
    /// `max_byte`.
    pub wide_char_bytes: u8,

    /// Output pattern for date columns without their own `format`.
    pub date_format: String,

    /// Output pattern for month columns without their own `format`.
    pub month_format: String,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            selection_policy: SelectionPolicy::Range,
            redoable: true,
            redo_count: 10,
            wide_char_bytes: 2,
            date_format: "%Y-%m-%d".to_string(),
            month_format: "%Y-%m".to_string(),
        }
    }
}

/// Full declarative grid configuration: options plus the user columns.
///
/// The reserved row-number/status columns are not listed here; the engine
/// creates them itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub options: GridOptions,
    pub columns: Vec<ColumnSpec>,
}

impl GridConfig {
    /// Parse a TOML document into a grid configuration.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| GridError::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let opts = GridOptions::default();
        assert_eq!(opts.selection_policy, SelectionPolicy::Range);
        assert!(opts.redoable);
        assert_eq!(opts.redo_count, 10);
        assert_eq!(opts.wide_char_bytes, 2);
        assert_eq!(opts.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            [options]
            selection_policy = "single"
            redo_count = 5

            [[columns]]
            col_id = "name"
            name = "Name"

            [[columns]]
            col_id = "qty"
            name = "Qty"
            data_type = "number"
        "#;
        let config = GridConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.options.selection_policy, SelectionPolicy::Single);
        assert_eq!(config.options.redo_count, 5);
        // Unspecified options keep their defaults
        assert!(config.options.redoable);
        assert_eq!(config.columns.len(), 2);
        assert_eq!(config.columns[0].col_id, "name");
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        assert!(GridConfig::from_toml_str("options = 3").is_err());
    }
}
