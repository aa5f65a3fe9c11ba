// ============================================================
// DATASET TYPES
// ============================================================
// The normalized dataset handed to presentation and export

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{ColumnMetadata, GenericRow, RawGrid};

/// Label counted for blank cells in category columns
pub const BLANK_CATEGORY_LABEL: &str = "(vazio)";

/// Prefix of dataset keys in the key-value store
pub const DATASET_KEY_PREFIX: &str = "dataset_";

/// Shape of the imported sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    /// Ordinary long table, one row per record
    Table,

    /// Wide date-by-entity status matrix, transposed to long form
    RdaMatrix,
}

impl std::fmt::Display for SheetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetKind::Table => write!(f, "table"),
            SheetKind::RdaMatrix => write!(f, "rda_matrix"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub min: String,
    pub max: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
}

impl NumericStats {
    /// Stats over `values`; `None` when there is nothing to aggregate
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            min,
            max,
            avg: sum / values.len() as f64,
            sum,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub total_records: usize,
    pub date_range: Option<DateRange>,
    pub category_counts: HashMap<String, HashMap<String, usize>>,
    pub numeric_stats: HashMap<String, NumericStats>,
}

/// Aggregate root produced once per successful import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub file_name: String,
    pub sheet_name: String,
    pub kind: SheetKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Decoded grid as read, kept for the spreadsheet editor view
    pub raw_grid: RawGrid,

    pub header_row_index: usize,
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<GenericRow>,

    pub detected_date_column: Option<String>,
    pub detected_category_columns: Vec<String>,
    pub detected_numeric_columns: Vec<String>,
    pub detected_text_columns: Vec<String>,

    pub total_rows: usize,
    pub summary: DatasetSummary,

    /// SHA-256 of the imported bytes, when imported from bytes
    pub source_fingerprint: Option<String>,
}

impl Dataset {
    /// Key under which the dataset is persisted
    pub fn storage_key(&self) -> String {
        Self::storage_key_for(&self.id)
    }

    pub fn storage_key_for(id: &str) -> String {
        format!("{}{}", DATASET_KEY_PREFIX, id)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Replace the raw grid after hand edits. Inference is not re-run:
    /// columns, rows and summary keep describing the imported data.
    pub fn replace_raw_grid(&mut self, grid: RawGrid) {
        self.raw_grid = grid;
        self.updated_at = Utc::now();
    }
}

/// Metadata about how a sheet was interpreted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseMeta {
    pub sheet_names: Vec<String>,
    pub header_row_index: usize,
    pub original_row_count: usize,
    pub truncated: bool,
    pub entity_count: usize,
    pub has_groups: bool,
}

/// Normalized grid of the selected sheet, before dataset assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSheet {
    pub kind: SheetKind,
    pub sheet_name: String,

    /// Long-form grid; header at `meta.header_row_index`
    pub rows: RawGrid,
    pub meta: ParseMeta,
}
