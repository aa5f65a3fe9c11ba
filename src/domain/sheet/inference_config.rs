// ============================================================
// INFERENCE CONFIGURATION
// ============================================================
// Thresholds and sampling windows for structure inference

use serde::{Deserialize, Serialize};

/// Rows scanned when looking for the header row
pub const HEADER_SCAN_ROWS: usize = 10;

/// Spreadsheet date serials accepted as dates (roughly 1968 to 2064)
pub const DATE_SERIAL_MIN: f64 = 25_000.0;
pub const DATE_SERIAL_MAX: f64 = 60_000.0;

/// Rows below the header sampled for the matrix date column
pub const MATRIX_DATE_SAMPLE_ROWS: usize = 20;
/// Share of sampled first-column cells that must be date-like
pub const MATRIX_DATE_RATIO: f64 = 0.6;
/// Minimum number of entity names in the matrix header row
pub const MATRIX_MIN_ENTITIES: usize = 2;
pub const MATRIX_VALUE_SAMPLE_ROWS: usize = 10;
pub const MATRIX_VALUE_SAMPLE_COLS: usize = 10;
/// Largest status vocabulary a matrix may have
pub const MATRIX_MAX_DISTINCT_VALUES: usize = 20;

pub const DATE_COLUMN_RATIO: f64 = 0.7;
pub const NUMBER_COLUMN_RATIO: f64 = 0.7;
pub const CATEGORY_MAX_DISTINCT: usize = 50;
pub const CATEGORY_MAX_DISTINCT_RATIO: f64 = 0.3;
/// Identifier columns need strictly more than this many values
pub const ID_MIN_VALUES: usize = 5;

pub const MAX_UNIQUE_VALUES: usize = 100;
pub const MAX_SAMPLE_VALUES: usize = 10;

/// Rows kept from a decoded sheet before inference runs
pub const MAX_PROCESSED_ROWS: usize = 20_000;

/// Configuration for the structure inference pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub header_scan_rows: usize,

    pub matrix_date_sample_rows: usize,
    pub matrix_date_ratio: f64,
    pub matrix_min_entities: usize,
    pub matrix_value_sample_rows: usize,
    pub matrix_value_sample_cols: usize,
    pub matrix_max_distinct_values: usize,

    /// Share of non-empty values that must be date-like (default: 0.7)
    pub date_column_ratio: f64,

    /// Share of non-empty values that must be numeric-like (default: 0.7)
    pub number_column_ratio: f64,

    /// Category columns have at most min(this, ratio * non-empty) distinct values
    pub category_max_distinct: usize,
    pub category_max_distinct_ratio: f64,

    pub id_min_values: usize,

    pub max_unique_values: usize,
    pub max_sample_values: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: HEADER_SCAN_ROWS,
            matrix_date_sample_rows: MATRIX_DATE_SAMPLE_ROWS,
            matrix_date_ratio: MATRIX_DATE_RATIO,
            matrix_min_entities: MATRIX_MIN_ENTITIES,
            matrix_value_sample_rows: MATRIX_VALUE_SAMPLE_ROWS,
            matrix_value_sample_cols: MATRIX_VALUE_SAMPLE_COLS,
            matrix_max_distinct_values: MATRIX_MAX_DISTINCT_VALUES,
            date_column_ratio: DATE_COLUMN_RATIO,
            number_column_ratio: NUMBER_COLUMN_RATIO,
            category_max_distinct: CATEGORY_MAX_DISTINCT,
            category_max_distinct_ratio: CATEGORY_MAX_DISTINCT_RATIO,
            id_min_values: ID_MIN_VALUES,
            max_unique_values: MAX_UNIQUE_VALUES,
            max_sample_values: MAX_SAMPLE_VALUES,
        }
    }
}

impl InferenceConfig {
    /// Upper bound on distinct values for a category column of `non_empty` values
    pub fn category_limit(&self, non_empty: usize) -> f64 {
        (self.category_max_distinct as f64).min(self.category_max_distinct_ratio * non_empty as f64)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.header_scan_rows == 0 {
            return Err("header_scan_rows must be > 0".to_string());
        }
        for (name, ratio) in [
            ("matrix_date_ratio", self.matrix_date_ratio),
            ("date_column_ratio", self.date_column_ratio),
            ("number_column_ratio", self.number_column_ratio),
            ("category_max_distinct_ratio", self.category_max_distinct_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(format!("{} must be between 0.0 and 1.0", name));
            }
        }
        if self.matrix_min_entities == 0 {
            return Err("matrix_min_entities must be > 0".to_string());
        }
        if self.matrix_value_sample_rows == 0 || self.matrix_value_sample_cols == 0 {
            return Err("matrix value sampling window must be non-empty".to_string());
        }
        Ok(())
    }
}

/// Which sheet to import when no preferred sheet name matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetSelection {
    First,
    MostRows,
}

/// Configuration for decoding and importing files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Rows kept from a decoded sheet (default: 20000)
    pub max_rows: usize,

    pub sheet_selection: SheetSelection,

    /// Fixed CSV delimiter; detected from content when unset
    pub csv_delimiter: Option<char>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_rows: MAX_PROCESSED_ROWS,
            sheet_selection: SheetSelection::First,
            csv_delimiter: None,
        }
    }
}

impl ImportConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_rows == 0 {
            return Err("max_rows must be > 0".to_string());
        }
        if let Some(d) = self.csv_delimiter {
            if !d.is_ascii() {
                return Err("csv_delimiter must be an ASCII character".to_string());
            }
        }
        Ok(())
    }
}
