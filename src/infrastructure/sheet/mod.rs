// ============================================================
// SHEET DECODING LAYER
// ============================================================
// Decode workbook and CSV bytes into raw cell grids

mod csv_reader;
mod workbook_reader;

pub use csv_reader::CsvGridReader;
pub use workbook_reader::WorkbookReader;

use crate::domain::error::Result;
use crate::domain::sheet::RawGrid;

/// One decoded sheet
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSheet {
    pub name: String,
    pub grid: RawGrid,
}

/// All sheets of a decoded file, in workbook order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedWorkbook {
    pub sheets: Vec<DecodedSheet>,
}

impl DecodedWorkbook {
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn into_sheet(self, name: &str) -> Option<DecodedSheet> {
        self.sheets.into_iter().find(|s| s.name == name)
    }
}

/// Turns file bytes into raw grids
pub trait GridDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedWorkbook>;
}
