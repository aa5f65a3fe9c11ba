pub mod use_cases;

pub use use_cases::spreadsheet_import::{ParseOptions, SpreadsheetImporter};
pub use use_cases::structure_inference::DatasetAssembler;
