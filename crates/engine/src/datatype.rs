//! Cell values and per-data-type behavior
//!
//! Every stored value passes through `DataTypes::coerce` on its way into the
//! matrix: text is clamped, numbers are bounded and rounded, codes are mapped
//! through the column's code list, dates are reparsed to a canonical pattern.
//! User text is never rejected, only normalized; errors are reserved for
//! direct API misuse (a primitive the column cannot hold).
//!
//! ## Case Sensitivity
//!
//! Code/label lookup and filter matching are case-sensitive. "Yes" != "yes".

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::column::ColumnSpec;
use crate::config::GridOptions;
use crate::error::{GridError, Result};

/// Recognized input patterns for date columns.
pub const DATE_INPUT_PATTERNS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

/// Recognized input patterns for month columns, with the day suffix used to
/// complete them for parsing.
const MONTH_INPUT_PATTERNS: &[(&str, &str)] = &[
    ("%Y-%m-%d", "-01"),
    ("%Y/%m/%d", "/01"),
    ("%Y%m%d", "01"),
];

/// A stored cell value. Serializes untagged, so JSON null/bool/number/string
/// round-trip as themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Empty
    }
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Primitive name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }

    /// Raw text of the value with no per-type projection applied.
    pub fn raw_text(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Empty,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Value::Number(f),
                None => Value::Empty,
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Empty => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// The data type tag of a column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Text,
    Mask,
    Number,
    Code,
    Date,
    Month,
    Select,
    Checkbox,
    Button,
    Link,
    /// A registered custom type, dispatched by tag.
    Custom(String),
}

impl DataType {
    /// Types rendered as widgets rather than plain text. Paste never writes
    /// into these.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DataType::Select | DataType::Checkbox | DataType::Button | DataType::Link
        )
    }
}

/// One entry of a column's code list: stored code plus display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    pub label: String,
}

impl CodeEntry {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// Capability hooks for a custom data type.
///
/// Every method is optional; `None` falls back to the built-in behavior for
/// the concern (`filter_text`/`copy_text` fall back to `text`).
pub trait DataTypeHandler {
    /// Normalize a raw value before it is stored.
    fn coerce(&self, _col: &ColumnSpec, _raw: &Value) -> Option<Value> {
        None
    }

    /// Text shown in the cell.
    fn text(&self, _col: &ColumnSpec, _value: &Value) -> Option<String> {
        None
    }

    /// Text the filter engine matches against.
    fn filter_text(&self, _col: &ColumnSpec, _value: &Value) -> Option<String> {
        None
    }

    /// Text placed on the clipboard for this cell.
    fn copy_text(&self, _col: &ColumnSpec, _value: &Value) -> Option<String> {
        None
    }

    /// Value produced from pasted text.
    fn paste_value(&self, _col: &ColumnSpec, _text: &str) -> Option<Value> {
        None
    }
}

/// Registry of custom data type handlers plus the built-in projections.
///
/// Dispatch is by tag lookup only: a `DataType::Custom(tag)` consults the
/// registered handler, everything else uses the built-in rules.
#[derive(Default)]
pub struct DataTypes {
    handlers: FxHashMap<String, Box<dyn DataTypeHandler>>,
}

impl DataTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a custom data type tag. Replaces any previous
    /// handler for the same tag.
    pub fn register(&mut self, tag: impl Into<String>, handler: Box<dyn DataTypeHandler>) {
        self.handlers.insert(tag.into(), handler);
    }

    fn handler_for(&self, data_type: &DataType) -> Option<&dyn DataTypeHandler> {
        match data_type {
            DataType::Custom(tag) => self.handlers.get(tag).map(|h| h.as_ref()),
            _ => None,
        }
    }

    /// Normalize a raw value for storage in a cell of the given column.
    pub fn coerce(&self, col: &ColumnSpec, raw: Value, opts: &GridOptions) -> Result<Value> {
        if let Some(handler) = self.handler_for(&col.data_type) {
            if let Some(v) = handler.coerce(col, &raw) {
                return Ok(v);
            }
        }

        match &col.data_type {
            DataType::Text | DataType::Mask => Ok(coerce_text(col, raw, opts)),
            DataType::Number => coerce_number(col, raw),
            DataType::Code | DataType::Select => Ok(coerce_code(col, raw)),
            DataType::Date => Ok(coerce_date(col, raw, &opts.date_format)),
            DataType::Month => Ok(coerce_month(col, raw, &opts.month_format)),
            DataType::Checkbox => coerce_checkbox(col, raw),
            DataType::Button | DataType::Link | DataType::Custom(_) => Ok(raw),
        }
    }

    /// The cell's display text: per-type projection of the stored value.
    pub fn text(&self, col: &ColumnSpec, value: &Value) -> String {
        if let Some(handler) = self.handler_for(&col.data_type) {
            if let Some(t) = handler.text(col, value) {
                return t;
            }
        }

        match &col.data_type {
            DataType::Code | DataType::Select => code_label(col, value),
            DataType::Checkbox => checkbox_label(col, value),
            _ => value.raw_text(),
        }
    }

    /// Text the filter engine compares against. Falls back to `text`.
    pub fn filter_text(&self, col: &ColumnSpec, value: &Value) -> String {
        if let Some(handler) = self.handler_for(&col.data_type) {
            if let Some(t) = handler.filter_text(col, value) {
                return t;
            }
        }
        self.text(col, value)
    }

    /// Text placed on the clipboard. Falls back to `text`.
    pub fn copy_text(&self, col: &ColumnSpec, value: &Value) -> String {
        if let Some(handler) = self.handler_for(&col.data_type) {
            if let Some(t) = handler.copy_text(col, value) {
                return t;
            }
        }
        self.text(col, value)
    }

    /// Value produced from pasted text, before coercion.
    pub fn paste_value(&self, col: &ColumnSpec, text: &str) -> Value {
        if let Some(handler) = self.handler_for(&col.data_type) {
            if let Some(v) = handler.paste_value(col, text) {
                return v;
            }
        }
        if text.is_empty() {
            Value::Empty
        } else {
            Value::Text(text.to_string())
        }
    }
}

// ============================================================================
// Built-in coercion rules
// ============================================================================

fn coerce_text(col: &ColumnSpec, raw: Value, opts: &GridOptions) -> Value {
    let mut s = match raw {
        Value::Empty => return Value::Empty,
        other => other.raw_text(),
    };

    if let Some(max_length) = col.max_length {
        if s.chars().count() > max_length {
            s = s.chars().take(max_length).collect();
        }
    }
    if let Some(max_byte) = col.max_byte {
        s = clamp_to_bytes(&s, max_byte, opts.wide_char_bytes);
    }
    Value::Text(s)
}

fn coerce_number(col: &ColumnSpec, raw: Value) -> Result<Value> {
    let n = match raw {
        Value::Empty => return Ok(Value::Empty),
        Value::Number(n) => n,
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Value::Empty);
            }
            match trimmed.parse::<f64>() {
                Ok(n) => n,
                // User text is clamped, never rejected; unparsable becomes empty
                Err(_) => return Ok(Value::Empty),
            }
        }
        Value::Bool(_) => {
            return Err(GridError::InvalidArgumentType {
                col: col.col_id.clone(),
                expected: "number",
                got: "boolean",
            });
        }
    };

    let mut n = n;
    if let Some(max) = col.max_number {
        if n > max {
            n = max;
        }
    }
    if let Some(min) = col.min_number {
        if n < min {
            n = min;
        }
    }
    if let Some(places) = col.round_number {
        let p = 10f64.powi(places as i32);
        n = (n * p).round() / p;
    }
    Ok(Value::Number(n))
}

fn coerce_code(col: &ColumnSpec, raw: Value) -> Value {
    if raw.is_empty() {
        return Value::Empty;
    }
    let s = raw.raw_text();
    for entry in &col.codes {
        if entry.code == s || entry.label == s {
            return Value::Text(entry.code.clone());
        }
    }
    match &col.default_code {
        Some(code) => Value::Text(code.clone()),
        None => raw,
    }
}

fn coerce_date(col: &ColumnSpec, raw: Value, default_format: &str) -> Value {
    let s = match &raw {
        Value::Empty => return Value::Empty,
        Value::Text(s) => s.trim(),
        // Dates only arrive as text
        _ => return Value::Empty,
    };
    if s.is_empty() {
        return Value::Empty;
    }
    match parse_date_text(s) {
        Some(date) => {
            let fmt = col.format.as_deref().unwrap_or(default_format);
            Value::Text(date.format(fmt).to_string())
        }
        None => Value::Empty,
    }
}

fn coerce_month(col: &ColumnSpec, raw: Value, default_format: &str) -> Value {
    let s = match &raw {
        Value::Empty => return Value::Empty,
        Value::Text(s) => s.trim(),
        _ => return Value::Empty,
    };
    if s.is_empty() {
        return Value::Empty;
    }
    match parse_month_text(s) {
        Some(date) => {
            let fmt = col.format.as_deref().unwrap_or(default_format);
            Value::Text(date.format(fmt).to_string())
        }
        None => Value::Empty,
    }
}

fn coerce_checkbox(col: &ColumnSpec, raw: Value) -> Result<Value> {
    match raw {
        Value::Empty => Ok(Value::Empty),
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Value::Empty);
            }
            if trimmed == "true" {
                return Ok(Value::Bool(true));
            }
            if trimmed == "false" {
                return Ok(Value::Bool(false));
            }
            // The first code is the checked state, the second unchecked
            if let Some(entry) = col.codes.first() {
                if entry.code == trimmed || entry.label == trimmed {
                    return Ok(Value::Bool(true));
                }
            }
            if let Some(entry) = col.codes.get(1) {
                if entry.code == trimmed || entry.label == trimmed {
                    return Ok(Value::Bool(false));
                }
            }
            Err(GridError::InvalidArgumentType {
                col: col.col_id.clone(),
                expected: "boolean",
                got: "text",
            })
        }
        Value::Number(_) => Err(GridError::InvalidArgumentType {
            col: col.col_id.clone(),
            expected: "boolean",
            got: "number",
        }),
    }
}

fn code_label(col: &ColumnSpec, value: &Value) -> String {
    let s = value.raw_text();
    for entry in &col.codes {
        if entry.code == s {
            return entry.label.clone();
        }
    }
    s
}

fn checkbox_label(col: &ColumnSpec, value: &Value) -> String {
    match value {
        Value::Bool(true) => col
            .codes
            .first()
            .map(|e| e.label.clone())
            .unwrap_or_else(|| "true".to_string()),
        Value::Bool(false) => col
            .codes
            .get(1)
            .map(|e| e.label.clone())
            .unwrap_or_else(|| "false".to_string()),
        other => other.raw_text(),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Display formatting for numbers: integers print without a fraction.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Truncate `s` so its byte length fits `max_byte`, where characters above
/// U+007F are charged `wide_char_bytes` each and the rest one byte.
pub fn clamp_to_bytes(s: &str, max_byte: usize, wide_char_bytes: u8) -> String {
    let mut total = 0usize;
    let mut out = String::new();
    for ch in s.chars() {
        let w = if (ch as u32) > 0x7F {
            wide_char_bytes as usize
        } else {
            1
        };
        if total + w > max_byte {
            break;
        }
        total += w;
        out.push(ch);
    }
    out
}

/// Parse date text through the recognized input patterns.
pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    for pattern in DATE_INPUT_PATTERNS {
        if let Ok(date) = NaiveDate::parse_from_str(s, pattern) {
            return Some(date);
        }
    }
    None
}

/// Parse month text ("2024-03" and friends) to the first day of that month.
pub fn parse_month_text(s: &str) -> Option<NaiveDate> {
    for (pattern, day_suffix) in MONTH_INPUT_PATTERNS {
        let completed = format!("{s}{day_suffix}");
        if let Ok(date) = NaiveDate::parse_from_str(&completed, pattern) {
            return Some(date);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(data_type: DataType) -> ColumnSpec {
        ColumnSpec::new("c", "C").with_data_type(data_type)
    }

    #[test]
    fn test_text_clamps_length() {
        let c = col(DataType::Text).with_max_length(3);
        let opts = GridOptions::default();
        let types = DataTypes::new();
        let v = types.coerce(&c, Value::Text("abcdef".into()), &opts).unwrap();
        assert_eq!(v, Value::Text("abc".into()));
    }

    #[test]
    fn test_text_clamps_bytes_wide_chars() {
        let c = col(DataType::Text).with_max_byte(5);
        let opts = GridOptions::default();
        let types = DataTypes::new();
        // Each hangul syllable counts 2 bytes, ascii counts 1
        let v = types.coerce(&c, Value::Text("한글ab한".into()), &opts).unwrap();
        // 한(2) 글(2) a(1) = 5; b would exceed
        assert_eq!(v, Value::Text("한글a".into()));
    }

    #[test]
    fn test_number_clamp_and_round() {
        let c = col(DataType::Number)
            .with_min_number(0.0)
            .with_max_number(100.0)
            .with_round_number(1);
        let opts = GridOptions::default();
        let types = DataTypes::new();

        assert_eq!(
            types.coerce(&c, Value::Number(123.46), &opts).unwrap(),
            Value::Number(100.0)
        );
        assert_eq!(
            types.coerce(&c, Value::Number(-5.0), &opts).unwrap(),
            Value::Number(0.0)
        );
        assert_eq!(
            types.coerce(&c, Value::Number(3.14), &opts).unwrap(),
            Value::Number(3.1)
        );
        assert_eq!(
            types.coerce(&c, Value::Text("2.55".into()), &opts).unwrap(),
            Value::Number(2.6)
        );
    }

    #[test]
    fn test_number_unparsable_text_becomes_empty() {
        let c = col(DataType::Number);
        let opts = GridOptions::default();
        let types = DataTypes::new();
        assert_eq!(
            types.coerce(&c, Value::Text("abc".into()), &opts).unwrap(),
            Value::Empty
        );
    }

    #[test]
    fn test_number_rejects_bool() {
        let c = col(DataType::Number);
        let opts = GridOptions::default();
        let types = DataTypes::new();
        let err = types.coerce(&c, Value::Bool(true), &opts).unwrap_err();
        assert!(matches!(err, GridError::InvalidArgumentType { .. }));
    }

    #[test]
    fn test_code_maps_label_to_code() {
        let c = col(DataType::Code)
            .with_codes(vec![CodeEntry::new("A", "Active"), CodeEntry::new("I", "Inactive")]);
        let opts = GridOptions::default();
        let types = DataTypes::new();

        assert_eq!(
            types.coerce(&c, Value::Text("Active".into()), &opts).unwrap(),
            Value::Text("A".into())
        );
        assert_eq!(
            types.coerce(&c, Value::Text("I".into()), &opts).unwrap(),
            Value::Text("I".into())
        );
        // Not in list and no default: unchanged
        assert_eq!(
            types.coerce(&c, Value::Text("X".into()), &opts).unwrap(),
            Value::Text("X".into())
        );
    }

    #[test]
    fn test_code_falls_back_to_default() {
        let c = col(DataType::Code)
            .with_codes(vec![CodeEntry::new("A", "Active")])
            .with_default_code("A");
        let opts = GridOptions::default();
        let types = DataTypes::new();
        assert_eq!(
            types.coerce(&c, Value::Text("nope".into()), &opts).unwrap(),
            Value::Text("A".into())
        );
    }

    #[test]
    fn test_code_display_text_is_label() {
        let c = col(DataType::Code)
            .with_codes(vec![CodeEntry::new("A", "Active")]);
        let types = DataTypes::new();
        assert_eq!(types.text(&c, &Value::Text("A".into())), "Active");
        assert_eq!(types.text(&c, &Value::Text("Z".into())), "Z");
    }

    #[test]
    fn test_date_patterns() {
        let c = col(DataType::Date);
        let opts = GridOptions::default();
        let types = DataTypes::new();

        for input in ["2024-03-05", "2024/03/05", "2024.03.05", "20240305"] {
            assert_eq!(
                types.coerce(&c, Value::Text(input.into()), &opts).unwrap(),
                Value::Text("2024-03-05".into()),
                "input {input}"
            );
        }
        assert_eq!(
            types.coerce(&c, Value::Text("not a date".into()), &opts).unwrap(),
            Value::Empty
        );
    }

    #[test]
    fn test_date_custom_output_format() {
        let c = col(DataType::Date).with_format("%d/%m/%Y");
        let opts = GridOptions::default();
        let types = DataTypes::new();
        assert_eq!(
            types.coerce(&c, Value::Text("2024-03-05".into()), &opts).unwrap(),
            Value::Text("05/03/2024".into())
        );
    }

    #[test]
    fn test_month_patterns() {
        let c = col(DataType::Month);
        let opts = GridOptions::default();
        let types = DataTypes::new();

        for input in ["2024-03", "2024/03", "202403"] {
            assert_eq!(
                types.coerce(&c, Value::Text(input.into()), &opts).unwrap(),
                Value::Text("2024-03".into()),
                "input {input}"
            );
        }
    }

    #[test]
    fn test_checkbox_coercion() {
        let c = col(DataType::Checkbox)
            .with_codes(vec![CodeEntry::new("Y", "Yes"), CodeEntry::new("N", "No")]);
        let opts = GridOptions::default();
        let types = DataTypes::new();

        assert_eq!(
            types.coerce(&c, Value::Bool(true), &opts).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            types.coerce(&c, Value::Text("Y".into()), &opts).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            types.coerce(&c, Value::Text("No".into()), &opts).unwrap(),
            Value::Bool(false)
        );
        assert!(types.coerce(&c, Value::Number(1.0), &opts).is_err());

        assert_eq!(types.text(&c, &Value::Bool(true)), "Yes");
        assert_eq!(types.text(&c, &Value::Bool(false)), "No");
    }

    #[test]
    fn test_custom_handler_dispatch() {
        struct Upper;
        impl DataTypeHandler for Upper {
            fn coerce(&self, _col: &ColumnSpec, raw: &Value) -> Option<Value> {
                match raw {
                    Value::Text(s) => Some(Value::Text(s.to_uppercase())),
                    _ => None,
                }
            }
            fn text(&self, _col: &ColumnSpec, value: &Value) -> Option<String> {
                Some(format!("[{}]", value.raw_text()))
            }
        }

        let c = col(DataType::Custom("upper".into()));
        let opts = GridOptions::default();
        let mut types = DataTypes::new();
        types.register("upper", Box::new(Upper));

        assert_eq!(
            types.coerce(&c, Value::Text("abc".into()), &opts).unwrap(),
            Value::Text("ABC".into())
        );
        assert_eq!(types.text(&c, &Value::Text("ABC".into())), "[ABC]");
        // filter_text falls back through the handler's text
        assert_eq!(types.filter_text(&c, &Value::Text("ABC".into())), "[ABC]");
    }

    #[test]
    fn test_unregistered_custom_passes_through() {
        let c = col(DataType::Custom("mystery".into()));
        let opts = GridOptions::default();
        let types = DataTypes::new();
        assert_eq!(
            types.coerce(&c, Value::Text("x".into()), &opts).unwrap(),
            Value::Text("x".into())
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(3.25), "3.25");
    }

    #[test]
    fn test_json_value_conversion() {
        assert_eq!(Value::from(&serde_json::json!(null)), Value::Empty);
        assert_eq!(Value::from(&serde_json::json!(true)), Value::Bool(true));
        assert_eq!(Value::from(&serde_json::json!(2.5)), Value::Number(2.5));
        assert_eq!(
            Value::from(&serde_json::json!("hi")),
            Value::Text("hi".into())
        );
    }
}
