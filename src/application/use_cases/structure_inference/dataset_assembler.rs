// ============================================================
// DATASET ASSEMBLER
// ============================================================
// Orchestrate header location, matrix detection/transposition and
// column inference, then build typed rows and the summary block.
// Malformed data degrades the result; it never fails the import.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cell_classifier::{cell_to_string, is_blank, to_iso_date, to_number};
use super::column_inference::detect_column_type;
use super::header_locator::find_header_row;
use super::matrix_detector::{detect_matrix_format, MatrixInfo};
use super::matrix_transposer::transpose_matrix_to_long;
use crate::domain::sheet::{
    CellValue, ColumnMetadata, ColumnType, Dataset, DatasetSummary, DateRange, GenericRow,
    InferenceConfig, NumericStats, RawCell, RawGrid, SheetKind, BLANK_CATEGORY_LABEL,
    MAX_PROCESSED_ROWS,
};

/// Grid after header location and, for matrices, transposition
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGrid {
    pub kind: SheetKind,

    /// Working grid: capped, and in long form for matrices
    pub rows: RawGrid,
    pub header_row_index: usize,
    pub matrix: MatrixInfo,
    pub original_row_count: usize,
    pub truncated: bool,
}

/// Column sets picked out of the inferred types
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectedColumns {
    pub date: Option<String>,
    pub categories: Vec<String>,
    pub numeric: Vec<String>,
    pub text: Vec<String>,
}

impl DetectedColumns {
    pub fn from_columns(columns: &[ColumnMetadata]) -> Self {
        let mut detected = Self::default();
        for column in columns {
            if column.column_type.is_textual() {
                detected.text.push(column.name.clone());
                continue;
            }
            match column.column_type {
                ColumnType::Date => {
                    if detected.date.is_none() {
                        detected.date = Some(column.name.clone());
                    }
                }
                ColumnType::Category => detected.categories.push(column.name.clone()),
                ColumnType::Number => detected.numeric.push(column.name.clone()),
                ColumnType::Text | ColumnType::Id => {}
            }
        }
        detected
    }
}

/// Dataset assembly use case
pub struct DatasetAssembler {
    config: InferenceConfig,
    max_rows: usize,
}

impl DatasetAssembler {
    pub fn new(config: InferenceConfig, max_rows: usize) -> Self {
        Self { config, max_rows }
    }

    /// Locate the header and rewrite matrices into long form
    pub fn normalize(&self, grid: &[Vec<RawCell>]) -> NormalizedGrid {
        let original_row_count = grid.len();
        let truncated = original_row_count > self.max_rows;
        if truncated {
            warn!(
                "Sheet has {} rows, processing only the first {}",
                original_row_count, self.max_rows
            );
        }
        let capped = &grid[..original_row_count.min(self.max_rows)];

        let header_row_index = find_header_row(capped, &self.config);
        let matrix = detect_matrix_format(capped, header_row_index, &self.config);

        if matrix.is_matrix {
            let rows = transpose_matrix_to_long(capped, matrix.header_row_index, &matrix);
            NormalizedGrid {
                kind: SheetKind::RdaMatrix,
                rows,
                header_row_index: 0,
                matrix,
                original_row_count,
                truncated,
            }
        } else {
            NormalizedGrid {
                kind: SheetKind::Table,
                rows: capped.to_vec(),
                header_row_index,
                matrix,
                original_row_count,
                truncated,
            }
        }
    }

    /// Run the whole pipeline over a decoded grid
    pub fn assemble(&self, grid: RawGrid, file_name: &str) -> Dataset {
        let normalized = self.normalize(&grid);
        self.assemble_normalized(&normalized, grid, file_name)
    }

    /// Build the dataset from an already normalized grid. `raw_grid` is
    /// kept untouched for the spreadsheet editor view.
    pub fn assemble_normalized(
        &self,
        normalized: &NormalizedGrid,
        raw_grid: RawGrid,
        file_name: &str,
    ) -> Dataset {
        let grid = &normalized.rows;
        let header_idx = normalized.header_row_index;
        let header: &[RawCell] = grid.get(header_idx).map(|r| r.as_slice()).unwrap_or(&[]);

        // Entirely blank rows are dropped; indices point into the working grid
        let data_rows: Vec<(usize, &Vec<RawCell>)> = grid
            .iter()
            .enumerate()
            .skip(header_idx + 1)
            .filter(|(_, row)| !row.iter().all(is_blank))
            .collect();

        let width = data_rows
            .iter()
            .map(|(_, row)| row.len())
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);
        let names = resolve_column_names(header, width);

        let mut columns = Vec::new();
        for (col, name) in names.into_iter().enumerate() {
            let values: Vec<&RawCell> = data_rows
                .iter()
                .map(|(_, row)| RawCell::at(row, col))
                .collect();
            if let Some(column) = self.build_column(name, col, &values) {
                columns.push(column);
            } else {
                debug!("Dropping empty column at index {}", col);
            }
        }

        let rows: Vec<GenericRow> = data_rows
            .iter()
            .map(|(row_index, row)| {
                let mut generic = GenericRow::new(*row_index);
                for column in &columns {
                    let cell = RawCell::at(row, column.original_index);
                    generic.insert(column.name.clone(), convert_cell(cell, column.column_type));
                }
                generic
            })
            .collect();

        let detected = DetectedColumns::from_columns(&columns);
        let summary = build_summary(&rows, &detected);

        info!(
            "Assembled dataset from {}: {} rows, {} columns ({})",
            file_name,
            rows.len(),
            columns.len(),
            normalized.kind
        );

        let now = Utc::now();
        Dataset {
            id: Uuid::new_v4().to_string(),
            name: dataset_name(file_name),
            file_name: file_name.to_string(),
            sheet_name: String::new(),
            kind: normalized.kind,
            created_at: now,
            updated_at: now,
            raw_grid,
            header_row_index: header_idx,
            total_rows: rows.len(),
            columns,
            rows,
            detected_date_column: detected.date,
            detected_category_columns: detected.categories,
            detected_numeric_columns: detected.numeric,
            detected_text_columns: detected.text,
            summary,
            source_fingerprint: None,
        }
    }

    fn build_column(&self, name: String, index: usize, values: &[&RawCell]) -> Option<ColumnMetadata> {
        if values.iter().all(|v| is_blank(v)) {
            return None;
        }

        let column_type = detect_column_type(values.iter().copied(), &self.config);

        let mut seen = HashSet::new();
        let mut unique_values = Vec::new();
        for value in values.iter().filter(|v| !is_blank(v)) {
            if unique_values.len() >= self.config.max_unique_values {
                break;
            }
            let text = cell_to_string(value).trim().to_string();
            if seen.insert(text.clone()) {
                unique_values.push(text);
            }
        }

        let sample_values = values
            .iter()
            .take(self.config.max_sample_values)
            .map(|v| (*v).clone())
            .collect();

        Some(ColumnMetadata::new(
            name,
            index,
            column_type,
            unique_values,
            sample_values,
            false,
        ))
    }
}

impl Default for DatasetAssembler {
    fn default() -> Self {
        Self::new(InferenceConfig::default(), MAX_PROCESSED_ROWS)
    }
}

/// Header names for `width` columns: blanks become `Coluna <n>`,
/// duplicates get `_2`, `_3`, ... suffixes.
pub fn resolve_column_names(header: &[RawCell], width: usize) -> Vec<String> {
    let mut used = HashSet::new();
    let mut names = Vec::with_capacity(width);

    for col in 0..width {
        let label = cell_to_string(RawCell::at(header, col)).trim().to_string();
        let base = if label.is_empty() {
            format!("Coluna {}", col + 1)
        } else {
            label
        };

        let mut name = base.clone();
        let mut suffix = 2;
        while used.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        used.insert(name.clone());
        names.push(name);
    }

    names
}

/// Typed value for a cell of a column. Conversion failures keep the
/// trimmed original text so the row survives.
pub fn convert_cell(cell: &RawCell, column_type: ColumnType) -> CellValue {
    if is_blank(cell) {
        return CellValue::empty();
    }
    let fallback = || CellValue::Text(cell_to_string(cell).trim().to_string());
    match column_type {
        ColumnType::Date => to_iso_date(cell).map(CellValue::Date).unwrap_or_else(fallback),
        ColumnType::Number => to_number(cell).map(CellValue::Number).unwrap_or_else(fallback),
        ColumnType::Category | ColumnType::Text | ColumnType::Id => fallback(),
    }
}

fn build_summary(rows: &[GenericRow], detected: &DetectedColumns) -> DatasetSummary {
    let date_range = detected.date.as_ref().and_then(|column| {
        let mut dates = rows
            .iter()
            .filter_map(|row| row.get(column).and_then(|v| v.as_date()));
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(min, max), d| {
            (if d < min { d } else { min }, if d > max { d } else { max })
        });
        Some(DateRange {
            min: min.to_string(),
            max: max.to_string(),
        })
    });

    let mut category_counts = HashMap::new();
    for column in &detected.categories {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for row in rows {
            let key = match row.get(column) {
                Some(value) if !value.is_empty() => value.to_display_string(),
                _ => BLANK_CATEGORY_LABEL.to_string(),
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        category_counts.insert(column.clone(), counts);
    }

    let mut numeric_stats = HashMap::new();
    for column in &detected.numeric {
        let values: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.get(column).and_then(|v| v.as_number()))
            .collect();
        if let Some(stats) = NumericStats::from_values(&values) {
            numeric_stats.insert(column.clone(), stats);
        }
    }

    DatasetSummary {
        total_records: rows.len(),
        date_range,
        category_counts,
        numeric_stats,
    }
}

fn dataset_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(file_name)
        .to_string()
}
