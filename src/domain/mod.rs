pub mod error;

// Spreadsheet model: raw grids, typed rows, datasets
pub mod sheet;
