// ============================================================
// SPREADSHEET IMPORT USE CASE
// ============================================================
// Decode an uploaded file, pick a sheet and run structure inference

use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{info, warn};

use crate::application::use_cases::structure_inference::{DatasetAssembler, NormalizedGrid};
use crate::domain::error::{AppError, Result};
use crate::domain::sheet::{
    Dataset, ImportConfig, InferenceConfig, ParseMeta, ParsedSheet, SheetSelection,
};
use crate::infrastructure::sheet::{
    CsvGridReader, DecodedSheet, DecodedWorkbook, GridDecoder, WorkbookReader,
};

/// Caller options for a single import
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Matched case-insensitively against the workbook's sheet names
    pub preferred_sheet_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Csv,
}

/// Pick the decoder: `.csv`/`.txt` names are CSV, zip (xlsx/ods) and OLE
/// (xls) signatures are workbooks, anything else is tried as CSV.
pub fn detect_source_format(bytes: &[u8], file_name: Option<&str>) -> SourceFormat {
    if let Some(ext) = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
    {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "txt" => return SourceFormat::Csv,
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => return SourceFormat::Workbook,
            _ => {}
        }
    }

    if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"\xD0\xCF\x11\xE0") {
        SourceFormat::Workbook
    } else {
        SourceFormat::Csv
    }
}

/// SHA-256 of the uploaded bytes, hex encoded
pub fn source_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Preferred sheet when present, otherwise per `selection`
pub fn select_sheet<'a>(
    workbook: &'a DecodedWorkbook,
    preferred: Option<&str>,
    selection: SheetSelection,
) -> Option<&'a DecodedSheet> {
    if let Some(preferred) = preferred.map(str::trim).filter(|p| !p.is_empty()) {
        let wanted = preferred.to_lowercase();
        match workbook.sheets.iter().find(|s| s.name.to_lowercase() == wanted) {
            Some(sheet) => return Some(sheet),
            None => warn!("Sheet '{}' not found, falling back to {:?}", preferred, selection),
        }
    }

    match selection {
        SheetSelection::First => workbook.sheets.first(),
        // first sheet wins ties
        SheetSelection::MostRows => workbook
            .sheets
            .iter()
            .rev()
            .max_by_key(|s| s.grid.len()),
    }
}

/// Spreadsheet import use case
pub struct SpreadsheetImporter {
    import: ImportConfig,
    assembler: DatasetAssembler,
}

impl SpreadsheetImporter {
    pub fn new(inference: InferenceConfig, import: ImportConfig) -> Result<Self> {
        inference.validate().map_err(|e| {
            AppError::ValidationError(format!("Invalid inference config: {}", e))
        })?;
        import
            .validate()
            .map_err(|e| AppError::ValidationError(format!("Invalid import config: {}", e)))?;

        let assembler = DatasetAssembler::new(inference, import.max_rows);
        Ok(Self { import, assembler })
    }

    /// Create with default configuration
    pub fn default_config() -> Self {
        let import = ImportConfig::default();
        Self {
            assembler: DatasetAssembler::new(InferenceConfig::default(), import.max_rows),
            import,
        }
    }

    /// Decode the bytes and normalize the selected sheet
    pub fn parse_workbook(&self, bytes: &[u8], options: &ParseOptions) -> Result<ParsedSheet> {
        let (sheet_names, sheet) = self.decode_selected(bytes, None, options)?;
        let normalized = self.assembler.normalize(&sheet.grid);
        Ok(to_parsed_sheet(sheet.name, sheet_names, normalized))
    }

    /// Full import: decode, infer and assemble a dataset
    pub fn import_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
        options: &ParseOptions,
    ) -> Result<Dataset> {
        let (_, sheet) = self.decode_selected(bytes, Some(file_name), options)?;
        let normalized = self.assembler.normalize(&sheet.grid);

        let mut dataset = self
            .assembler
            .assemble_normalized(&normalized, sheet.grid, file_name);
        dataset.sheet_name = sheet.name;
        dataset.source_fingerprint = Some(source_fingerprint(bytes));

        info!(
            "Imported {} (sheet '{}') as dataset {}: {} rows, {} columns",
            file_name,
            dataset.sheet_name,
            dataset.id,
            dataset.total_rows,
            dataset.columns.len()
        );

        Ok(dataset)
    }

    /// Read a file from disk and import it
    pub async fn parse_excel_file(&self, path: &Path, options: &ParseOptions) -> Result<Dataset> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        self.import_bytes(&bytes, &file_name, options)
    }

    fn decode_selected(
        &self,
        bytes: &[u8],
        file_name: Option<&str>,
        options: &ParseOptions,
    ) -> Result<(Vec<String>, DecodedSheet)> {
        let workbook = match detect_source_format(bytes, file_name) {
            SourceFormat::Workbook => WorkbookReader::new().decode(bytes)?,
            SourceFormat::Csv => CsvGridReader::new()
                .with_delimiter(self.import.csv_delimiter.map(|c| c as u8))
                .decode(bytes)?,
        };

        let sheet_names = workbook.sheet_names();
        let selected = select_sheet(
            &workbook,
            options.preferred_sheet_name.as_deref(),
            self.import.sheet_selection,
        )
        .map(|s| s.name.clone())
        .ok_or_else(|| AppError::NotFound("No sheet to import".to_string()))?;

        let sheet = workbook
            .into_sheet(&selected)
            .ok_or_else(|| AppError::NotFound(format!("Sheet '{}' not found", selected)))?;

        Ok((sheet_names, sheet))
    }
}

fn to_parsed_sheet(
    sheet_name: String,
    sheet_names: Vec<String>,
    normalized: NormalizedGrid,
) -> ParsedSheet {
    ParsedSheet {
        kind: normalized.kind,
        sheet_name,
        meta: ParseMeta {
            sheet_names,
            header_row_index: normalized.header_row_index,
            original_row_count: normalized.original_row_count,
            truncated: normalized.truncated,
            entity_count: normalized.matrix.entity_columns.len(),
            has_groups: normalized.matrix.has_groups,
        },
        rows: normalized.rows,
    }
}
