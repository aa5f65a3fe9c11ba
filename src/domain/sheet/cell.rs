// ============================================================
// RAW CELL TYPES
// ============================================================
// Untyped cell values as produced by the spreadsheet decoders

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single untyped cell value read from a spreadsheet.
///
/// Serialized as `{"type": ..., "value": ...}` so a stored grid reloads
/// unchanged, including text that happens to look like a datetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RawCell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

/// Ordered rows of ordered cells. Rows may have different lengths.
pub type RawGrid = Vec<Vec<RawCell>>;

/// Render a number the way spreadsheets display it: integral values
/// without a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl RawCell {
    pub fn text(value: impl Into<String>) -> Self {
        RawCell::Text(value.into())
    }

    /// Get the cell at `col` in `row`, treating missing cells as empty.
    pub fn at(row: &[RawCell], col: usize) -> &RawCell {
        static EMPTY: RawCell = RawCell::Empty;
        row.get(col).unwrap_or(&EMPTY)
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        RawCell::Text(value)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

impl From<i64> for RawCell {
    fn from(value: i64) -> Self {
        RawCell::Number(value as f64)
    }
}

impl From<bool> for RawCell {
    fn from(value: bool) -> Self {
        RawCell::Bool(value)
    }
}

impl From<NaiveDateTime> for RawCell {
    fn from(value: NaiveDateTime) -> Self {
        RawCell::Date(value)
    }
}
