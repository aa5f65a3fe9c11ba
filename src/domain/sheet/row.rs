// ============================================================
// GENERIC ROW TYPES
// ============================================================
// Typed row objects keyed by column name

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::cell::format_number;

/// A typed cell value in a normalized row.
///
/// Dates are canonical `YYYY-MM-DD` strings. Blank cells are `Text("")`.
/// Serialized as `{"type": ..., "value": ...}` so dates survive a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Number(f64),
    Text(String),
    Date(String),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&str> {
        match self {
            CellValue::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Stringified value, used for category counting and display
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) | CellValue::Date(s) => s.clone(),
        }
    }
}

/// One normalized row: column name to typed value, plus the back-reference
/// to its position in the post-transposition grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericRow {
    #[serde(rename = "_rowIndex")]
    pub row_index: usize,

    #[serde(flatten)]
    pub values: HashMap<String, CellValue>,
}

impl GenericRow {
    pub fn new(row_index: usize) -> Self {
        Self {
            row_index,
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.values.insert(column.into(), value);
    }

    /// Lookup by column name; unknown names are absent rather than an error.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
