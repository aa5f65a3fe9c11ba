// ============================================================
// STRUCTURE INFERENCE
// ============================================================
// Turn a raw cell grid into a typed dataset: header location,
// matrix detection and transposition, column typing, assembly

pub mod cell_classifier;
pub mod column_inference;
pub mod dataset_assembler;
pub mod header_locator;
pub mod matrix_detector;
pub mod matrix_transposer;

pub use column_inference::{detect_column_type, ColumnProfile};
pub use dataset_assembler::{DatasetAssembler, NormalizedGrid};
pub use header_locator::find_header_row;
pub use matrix_detector::{detect_matrix_format, MatrixEntity, MatrixInfo};
pub use matrix_transposer::transpose_matrix_to_long;
