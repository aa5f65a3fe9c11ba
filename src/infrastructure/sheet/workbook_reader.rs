// ============================================================
// WORKBOOK READER
// ============================================================
// Decode xlsx/xls/xlsb/ods bytes with calamine

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::io::Cursor;
use tracing::{debug, warn};

use super::{DecodedSheet, DecodedWorkbook, GridDecoder};
use crate::application::use_cases::structure_inference::cell_classifier::serial_to_date;
use crate::domain::error::{AppError, Result};
use crate::domain::sheet::{RawCell, RawGrid};

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookReader;

impl WorkbookReader {
    pub fn new() -> Self {
        Self
    }
}

impl GridDecoder for WorkbookReader {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedWorkbook> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let names = workbook.sheet_names().to_vec();
        if names.is_empty() {
            return Err(AppError::DecodeError("Workbook has no sheets".to_string()));
        }

        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            match workbook.worksheet_range(&name) {
                Ok(range) => {
                    let grid = range_to_grid(&range);
                    debug!("Decoded sheet '{}' with {} rows", name, grid.len());
                    sheets.push(DecodedSheet { name, grid });
                }
                Err(e) => {
                    // Chart sheets and similar have no cell range
                    warn!("Skipping sheet '{}': {}", name, e);
                    sheets.push(DecodedSheet {
                        name,
                        grid: Vec::new(),
                    });
                }
            }
        }

        Ok(DecodedWorkbook { sheets })
    }
}

/// Grid anchored at A1: leading empty rows and columns of the used range are
/// padded back so indices match the sheet.
fn range_to_grid(range: &Range<Data>) -> RawGrid {
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: RawGrid = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![RawCell::Empty; start_col];
        cells.extend(row.iter().map(data_to_cell));
        grid.push(cells);
    }
    grid
}

pub(crate) fn data_to_cell(data: &Data) -> RawCell {
    match data {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => serial_to_datetime(dt.as_f64())
            .map(RawCell::Date)
            .unwrap_or(RawCell::Number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(RawCell::Date)
            .unwrap_or_else(|| RawCell::Text(s.clone())),
        Data::DurationIso(s) => RawCell::Text(s.clone()),
        // #N/A, #DIV/0! and friends carry no value
        Data::Error(_) => RawCell::Empty,
    }
}

fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let date = serial_to_date(serial)?;
    let seconds = (serial.fract().abs() * 86_400.0).round() as i64;
    Some(date.and_hms_opt(0, 0, 0)? + Duration::seconds(seconds))
}

fn parse_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_cells() {
        assert_eq!(data_to_cell(&Data::Empty), RawCell::Empty);
        assert_eq!(data_to_cell(&Data::Int(7)), RawCell::Number(7.0));
        assert_eq!(data_to_cell(&Data::Float(1.5)), RawCell::Number(1.5));
        assert_eq!(data_to_cell(&Data::Bool(true)), RawCell::Bool(true));
        assert_eq!(
            data_to_cell(&Data::String("Ana".to_string())),
            RawCell::Text("Ana".to_string())
        );
    }

    #[test]
    fn test_iso_datetime_cells() {
        let cell = data_to_cell(&Data::DateTimeIso("2024-03-01T08:30:00".to_string()));
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(cell, RawCell::Date(expected));

        let cell = data_to_cell(&Data::DateTimeIso("ontem".to_string()));
        assert_eq!(cell, RawCell::Text("ontem".to_string()));
    }

    #[test]
    fn test_serial_with_time_fraction() {
        let dt = serial_to_datetime(45000.5).unwrap();
        assert_eq!(dt.to_string(), "2023-03-15 12:00:00");
    }

    #[test]
    fn test_grid_is_anchored_at_a1() {
        // used range B3:C4
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("Nome".to_string()));
        range.set_value((2, 2), Data::String("Setor".to_string()));
        range.set_value((3, 1), Data::String("Ana".to_string()));
        range.set_value((3, 2), Data::Int(3));

        let grid = range_to_grid(&range);
        assert_eq!(grid.len(), 4);
        assert!(grid[0].is_empty() && grid[1].is_empty());
        assert_eq!(
            grid[2],
            vec![RawCell::Empty, RawCell::text("Nome"), RawCell::text("Setor")]
        );
        assert_eq!(
            grid[3],
            vec![RawCell::Empty, RawCell::text("Ana"), RawCell::Number(3.0)]
        );
    }

    #[test]
    fn test_empty_range_is_empty_grid() {
        let range: Range<Data> = Range::empty();
        assert!(range_to_grid(&range).is_empty());
    }

    #[test]
    fn test_garbage_bytes_are_a_decode_error() {
        let err = WorkbookReader::new().decode(b"definitely not a workbook").unwrap_err();
        assert_eq!(err.user_message(), "Não foi possível ler o arquivo");
    }
}
