// ============================================================
// MATRIX TRANSPOSER
// ============================================================
// Rewrite a wide date x entity matrix into long form:
// one (date, entity, [group], value) row per cell

use tracing::debug;

use super::cell_classifier::{cell_to_string, is_blank};
use super::matrix_detector::MatrixInfo;
use crate::domain::sheet::{RawCell, RawGrid};

pub const ENTITY_COLUMN: &str = "ENTIDADE";
pub const GROUP_COLUMN: &str = "GRUPO";
pub const VALUE_COLUMN: &str = "VALOR";

/// Used when the date column has no header label
pub const DEFAULT_DATE_COLUMN: &str = "DATA";

/// Build the long grid. The header is `[date, ENTIDADE, GRUPO?, VALOR]`,
/// with GRUPO present only when groups were detected. Rows with a blank
/// date are skipped.
pub fn transpose_matrix_to_long(
    grid: &[Vec<RawCell>],
    header_row_index: usize,
    info: &MatrixInfo,
) -> RawGrid {
    let date_col = info.date_column_index;
    let date_name = grid
        .get(header_row_index)
        .map(|header| cell_to_string(RawCell::at(header, date_col)).trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_DATE_COLUMN.to_string());

    let mut header = vec![RawCell::Text(date_name), RawCell::text(ENTITY_COLUMN)];
    if info.has_groups {
        header.push(RawCell::text(GROUP_COLUMN));
    }
    header.push(RawCell::text(VALUE_COLUMN));

    let data_rows = grid.get(header_row_index + 1..).unwrap_or(&[]);
    let mut out = Vec::with_capacity(1 + data_rows.len() * info.entity_columns.len());
    out.push(header);

    let mut skipped = 0usize;
    for row in data_rows {
        let date = RawCell::at(row, date_col);
        if is_blank(date) {
            skipped += 1;
            continue;
        }

        for entity in &info.entity_columns {
            let mut long_row = Vec::with_capacity(4);
            long_row.push(date.clone());
            long_row.push(RawCell::text(entity.name.clone()));
            if info.has_groups {
                let group = info.group_for(entity.column_index);
                long_row.push(if group.is_empty() {
                    RawCell::Empty
                } else {
                    RawCell::text(group)
                });
            }
            long_row.push(RawCell::at(row, entity.column_index).clone());
            out.push(long_row);
        }
    }

    debug!(
        "Transposed matrix into {} rows ({} blank-date rows skipped)",
        out.len() - 1,
        skipped
    );

    out
}
