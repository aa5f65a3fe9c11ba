pub mod spreadsheet_import;
pub mod structure_inference;
