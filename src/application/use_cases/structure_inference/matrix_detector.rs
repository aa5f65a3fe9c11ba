// ============================================================
// MATRIX FORMAT DETECTOR
// ============================================================
// Recognize wide "date x entity" status sheets (dates down the
// first column, people across the header, a small vocabulary of
// status codes in the cells)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::cell_classifier::{cell_to_string, is_blank, is_date_like, is_numeric_like};
use super::header_locator::is_header_candidate;
use crate::domain::sheet::{InferenceConfig, RawCell};

/// One entity (person, asset, ...) spread across a header column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixEntity {
    pub column_index: usize,
    pub name: String,
}

/// Result of matrix detection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatrixInfo {
    pub is_matrix: bool,

    /// Header row used for the entity names. May sit below the row the
    /// header locator picked when several label rows are stacked.
    pub header_row_index: usize,

    pub date_column_index: usize,

    /// Trimmed non-blank header names, left to right
    pub entity_names: Vec<String>,
    pub entity_columns: Vec<MatrixEntity>,

    /// Forward-filled group label per column, from the row above the header
    pub group_row: Option<Vec<String>>,
    pub has_groups: bool,
}

impl MatrixInfo {
    fn not_matrix(header_row_index: usize) -> Self {
        Self {
            header_row_index,
            ..Default::default()
        }
    }

    pub fn group_for(&self, column_index: usize) -> &str {
        self.group_row
            .as_ref()
            .and_then(|groups| groups.get(column_index))
            .map(|g| g.as_str())
            .unwrap_or("")
    }
}

/// Carry the last non-blank label rightwards, starting at `start_col`.
/// Columns before `start_col` and before the first label get "".
pub fn forward_fill_groups(row: &[RawCell], start_col: usize) -> Vec<String> {
    let mut current = String::new();
    row.iter()
        .enumerate()
        .map(|(idx, cell)| {
            if idx < start_col {
                return String::new();
            }
            let label = cell_to_string(cell).trim().to_string();
            if !label.is_empty() {
                current = label;
            }
            current.clone()
        })
        .collect()
}

/// Decide whether the grid is a wide matrix, given the located header row.
pub fn detect_matrix_format(
    grid: &[Vec<RawCell>],
    header_row_index: usize,
    config: &InferenceConfig,
) -> MatrixInfo {
    let refined = refine_matrix_header(grid, header_row_index, config);
    if refined != header_row_index {
        let info = evaluate(grid, refined, config);
        if info.is_matrix {
            debug!(
                "Matrix header refined from row {} to row {}",
                header_row_index, refined
            );
            return info;
        }
    }
    evaluate(grid, header_row_index, config)
}

/// Stacked label rows (e.g. teams above names) directly below the located
/// header: the one closest to the data holds the entity names.
fn refine_matrix_header(grid: &[Vec<RawCell>], header_row_index: usize, config: &InferenceConfig) -> usize {
    let mut idx = header_row_index;
    while idx + 1 < grid.len() && idx + 1 < header_row_index + config.header_scan_rows {
        let next = &grid[idx + 1];
        if is_header_candidate(next) && !is_date_like(RawCell::at(next, 0)) {
            idx += 1;
        } else {
            break;
        }
    }
    idx
}

fn evaluate(grid: &[Vec<RawCell>], header_row_index: usize, config: &InferenceConfig) -> MatrixInfo {
    let date_column_index = 0;
    let Some(header) = grid.get(header_row_index) else {
        return MatrixInfo::not_matrix(header_row_index);
    };
    let data_rows = &grid[header_row_index + 1..];

    // 1. Dates down the first column
    let mut sampled = 0usize;
    let mut dates = 0usize;
    for row in data_rows.iter().take(config.matrix_date_sample_rows) {
        let cell = RawCell::at(row, date_column_index);
        if is_blank(cell) {
            continue;
        }
        sampled += 1;
        if is_date_like(cell) {
            dates += 1;
        }
    }
    if sampled == 0 || (dates as f64 / sampled as f64) <= config.matrix_date_ratio {
        debug!("Not a matrix: {} of {} first-column cells are dates", dates, sampled);
        return MatrixInfo::not_matrix(header_row_index);
    }

    // 2. Entity names across the header
    let entity_columns: Vec<MatrixEntity> = header
        .iter()
        .enumerate()
        .skip(date_column_index + 1)
        .filter(|(_, cell)| !is_blank(cell))
        .map(|(column_index, cell)| MatrixEntity {
            column_index,
            name: cell_to_string(cell).trim().to_string(),
        })
        .collect();
    let named = header
        .iter()
        .skip(date_column_index + 1)
        .filter(|cell| !is_blank(cell) && !is_numeric_like(cell))
        .count();
    if named < config.matrix_min_entities {
        debug!("Not a matrix: only {} entity names in header", named);
        return MatrixInfo::not_matrix(header_row_index);
    }

    // 3. Small status vocabulary in the cells
    let mut vocabulary = HashSet::new();
    for row in data_rows.iter().take(config.matrix_value_sample_rows) {
        for col in (date_column_index + 1)..=(date_column_index + config.matrix_value_sample_cols) {
            let cell = RawCell::at(row, col);
            if !is_blank(cell) {
                vocabulary.insert(cell_to_string(cell).trim().to_lowercase());
            }
        }
    }
    if vocabulary.is_empty() || vocabulary.len() > config.matrix_max_distinct_values {
        debug!("Not a matrix: {} distinct sampled values", vocabulary.len());
        return MatrixInfo::not_matrix(header_row_index);
    }

    // Optional group row directly above the header
    let group_row = header_row_index
        .checked_sub(1)
        .and_then(|idx| grid.get(idx))
        .map(|row| forward_fill_groups(row, date_column_index + 1));
    let has_groups = group_row.as_ref().is_some_and(|groups| {
        entity_columns
            .iter()
            .any(|e| groups.get(e.column_index).is_some_and(|g| !g.is_empty()))
    });

    debug!(
        "Matrix detected: {} entities, groups: {}",
        entity_columns.len(),
        has_groups
    );

    MatrixInfo {
        is_matrix: true,
        header_row_index,
        date_column_index,
        entity_names: entity_columns.iter().map(|e| e.name.clone()).collect(),
        entity_columns,
        group_row,
        has_groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<RawCell> {
        cells
            .iter()
            .map(|c| if c.is_empty() { RawCell::Empty } else { RawCell::from(*c) })
            .collect()
    }

    fn team_schedule() -> Vec<Vec<RawCell>> {
        vec![
            row(&["DATA", "EQUIPE A", "EQUIPE A", "EQUIPE B"]),
            row(&["DATA", "João", "Maria", "Pedro"]),
            row(&["01/03/2024", "ENTREGUE", "FOLGA", ""]),
            row(&["02/03/2024", "FOLGA", "ENTREGUE", "ENTREGUE"]),
            row(&["03/03/2024", "", "ENTREGUE", "FOLGA"]),
            row(&["04/03/2024", "ENTREGUE", "", "ENTREGUE"]),
            row(&["05/03/2024", "FOLGA", "FOLGA", "ENTREGUE"]),
        ]
    }

    #[test]
    fn test_detects_team_schedule() {
        let grid = team_schedule();
        let info = detect_matrix_format(&grid, 0, &InferenceConfig::default());

        assert!(info.is_matrix);
        assert_eq!(info.header_row_index, 1);
        assert_eq!(info.date_column_index, 0);
        assert_eq!(info.entity_names, vec!["João", "Maria", "Pedro"]);
        assert!(info.has_groups);
        assert_eq!(info.group_for(1), "EQUIPE A");
        assert_eq!(info.group_for(3), "EQUIPE B");
    }

    #[test]
    fn test_matrix_without_group_row() {
        let grid = vec![
            row(&["Dia", "Ana", "Bia"]),
            row(&["2024-01-01", "P", "F"]),
            row(&["2024-01-02", "F", "P"]),
            row(&["2024-01-03", "P", "P"]),
        ];
        let info = detect_matrix_format(&grid, 0, &InferenceConfig::default());
        assert!(info.is_matrix);
        assert!(!info.has_groups);
        assert!(info.group_row.is_none());
    }

    #[test]
    fn test_long_table_is_not_matrix() {
        let mut grid = vec![row(&["ID", "Nome", "Valor", "Data"])];
        for i in 0..30 {
            let id = format!("PED-{:04}", i);
            let name = format!("Cliente {}", i);
            let value = format!("{},50", i * 10);
            let date = format!("{:02}/01/2024", i % 28 + 1);
            grid.push(row(&[id.as_str(), name.as_str(), value.as_str(), date.as_str()]));
        }
        let info = detect_matrix_format(&grid, 0, &InferenceConfig::default());
        assert!(!info.is_matrix);
    }

    #[test]
    fn test_date_first_table_with_free_values_is_not_matrix() {
        let mut grid = vec![row(&["Data", "Cliente", "Produto", "Quantidade"])];
        for i in 0..15 {
            let date = format!("2024-02-{:02}", i + 1);
            let client = format!("Cliente {}", i);
            let product = format!("Produto {}", i * 3);
            let quantity = format!("{}", i * 7 + 1);
            grid.push(row(&[date.as_str(), client.as_str(), product.as_str(), quantity.as_str()]));
        }
        let info = detect_matrix_format(&grid, 0, &InferenceConfig::default());
        assert!(!info.is_matrix);
    }

    #[test]
    fn test_single_entity_is_not_matrix() {
        let grid = vec![
            row(&["Data", "Status"]),
            row(&["2024-01-01", "OK"]),
            row(&["2024-01-02", "OK"]),
        ];
        let info = detect_matrix_format(&grid, 0, &InferenceConfig::default());
        assert!(!info.is_matrix);
    }

    #[test]
    fn test_empty_grid() {
        let info = detect_matrix_format(&[], 0, &InferenceConfig::default());
        assert!(!info.is_matrix);
    }

    #[test]
    fn test_forward_fill() {
        let groups = forward_fill_groups(&row(&["DATA", "", "A", "", "B", ""]), 1);
        assert_eq!(groups, vec!["", "", "A", "A", "B", "B"]);
    }
}
