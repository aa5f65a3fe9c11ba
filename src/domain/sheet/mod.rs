// ============================================================
// SHEET DOMAIN LAYER
// ============================================================
// Core types and value objects for spreadsheet normalization
// No I/O, no async

mod cell;
mod column;
mod dataset;
mod inference_config;
mod row;

pub use cell::{format_number, RawCell, RawGrid};
pub use column::{ColumnMetadata, ColumnType};
pub use dataset::{
    Dataset, DatasetSummary, DateRange, NumericStats, ParseMeta, ParsedSheet, SheetKind,
    BLANK_CATEGORY_LABEL, DATASET_KEY_PREFIX,
};
pub use inference_config::{
    ImportConfig, InferenceConfig, SheetSelection, DATE_SERIAL_MAX, DATE_SERIAL_MIN,
    MAX_PROCESSED_ROWS,
};
pub use row::{CellValue, GenericRow};
