pub mod application;
pub mod domain;
pub mod infrastructure;

pub use crate::application::use_cases::structure_inference::{
    detect_column_type, detect_matrix_format, find_header_row, transpose_matrix_to_long,
    DatasetAssembler, MatrixInfo,
};
pub use crate::application::{ParseOptions, SpreadsheetImporter};
pub use crate::domain::error::{AppError, Result};
pub use crate::domain::sheet::{
    CellValue, ColumnMetadata, ColumnType, Dataset, DatasetSummary, GenericRow, ParsedSheet,
    RawCell, RawGrid, SheetKind,
};
pub use crate::infrastructure::bootstrap::{setup, AppState};
pub use crate::infrastructure::config::{AppConfig, ConfigService};
pub use crate::infrastructure::storage::{
    DatasetRepository, DatasetStore, FileDatasetStore, MemoryDatasetStore,
};
