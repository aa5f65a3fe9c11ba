// ============================================================
// HEADER LOCATOR
// ============================================================
// Find the row most likely to hold column labels

use tracing::debug;

use super::cell_classifier::{is_blank, is_label_like};
use crate::domain::sheet::{InferenceConfig, RawCell};

/// A row reads as a header when it has at least two non-empty cells and
/// more than half of them are labels (neither numeric nor date-like).
pub fn is_header_candidate(row: &[RawCell]) -> bool {
    let non_empty = row.iter().filter(|c| !is_blank(c)).count();
    if non_empty < 2 {
        return false;
    }
    let labels = row.iter().filter(|c| is_label_like(c)).count();
    labels * 2 > non_empty
}

/// Index of the first header candidate among the first
/// `header_scan_rows` rows, or 0 when none qualifies.
pub fn find_header_row(grid: &[Vec<RawCell>], config: &InferenceConfig) -> usize {
    let found = grid
        .iter()
        .take(config.header_scan_rows)
        .position(|row| is_header_candidate(row));

    match found {
        Some(idx) => {
            debug!("Header row located at index {}", idx);
            idx
        }
        None => {
            debug!("No header candidate in first {} rows, using row 0", config.header_scan_rows);
            0
        }
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

    #[test]
    fn test_skips_title_rows() {
        let grid = vec![
            row(&["Relatório mensal", "", ""]),
            row(&["", "", ""]),
            row(&["Nome", "Setor", "Valor"]),
            row(&["Ana", "RH", "10"]),
        ];
        assert_eq!(find_header_row(&grid, &InferenceConfig::default()), 2);
    }

    #[test]
    fn test_numeric_rows_are_not_headers() {
        let grid = vec![
            row(&["1", "2", "3"]),
            row(&["2024-01-01", "5", "x"]),
            row(&["ID", "Nome", "Data"]),
        ];
        assert_eq!(find_header_row(&grid, &InferenceConfig::default()), 2);
    }

    #[test]
    fn test_fallback_is_row_zero() {
        let grid = vec![
            row(&["1", "2", "3"]),
            row(&["4", "5", "6"]),
            row(&["only-one", "", ""]),
        ];
        assert_eq!(find_header_row(&grid, &InferenceConfig::default()), 0);
        assert_eq!(find_header_row(&[], &InferenceConfig::default()), 0);
    }

    #[test]
    fn test_scan_window_is_bounded() {
        let mut grid: Vec<Vec<RawCell>> = (0..10)
            .map(|i| {
                let n = i.to_string();
                row(&[n.as_str(), "1"])
            })
            .collect();
        grid.push(row(&["Nome", "Setor"]));
        assert_eq!(find_header_row(&grid, &InferenceConfig::default()), 0);
    }

    #[test]
    fn test_half_labels_is_not_enough() {
        assert!(!is_header_candidate(&row(&["Nome", "10"])));
        assert!(is_header_candidate(&row(&["Nome", "Setor", "10"])));
    }
}
