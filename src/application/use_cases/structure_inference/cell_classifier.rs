// ============================================================
// CELL CLASSIFIER
// ============================================================
// Decide whether a raw cell looks like a date or a number, and
// normalize it to a canonical form. Never fails: a negative
// answer is the worst case.

use chrono::{Duration, NaiveDate, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::sheet::{format_number, RawCell, DATE_SERIAL_MAX, DATE_SERIAL_MIN};

// YYYY-MM-DD or YYYY/MM/DD, optionally followed by a time
static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})(?:[T ]\d{1,2}:\d{2}.*)?$")
        .expect("Invalid regex: YYYY-MM-DD")
});

// DD/MM/YYYY, DD-MM-YYYY, DD.MM.YYYY or two-digit year variants
static DMY_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})(?:\s+\d{1,2}:\d{2}(?::\d{2})?)?$")
        .expect("Invalid regex: DD/MM/YYYY")
});

static PLAIN_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("Invalid regex: number")
});

/// Largest serial we try to convert; far past year 9999
const MAX_CONVERTIBLE_SERIAL: f64 = 2_958_465.0;

/// True for empty cells and whitespace-only text
pub fn is_blank(cell: &RawCell) -> bool {
    match cell {
        RawCell::Empty => true,
        RawCell::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Stringify a cell the way it would be displayed
pub fn cell_to_string(cell: &RawCell) -> String {
    match cell {
        RawCell::Empty => String::new(),
        RawCell::Bool(b) => b.to_string(),
        RawCell::Number(n) => format_number(*n),
        RawCell::Date(dt) => {
            if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
                dt.format("%Y-%m-%d").to_string()
            } else {
                dt.format("%Y-%m-%d %H:%M:%S").to_string()
            }
        }
        RawCell::Text(s) => s.clone(),
    }
}

/// Trimmed, uppercased form used when counting distinct values
pub fn normalize_key(cell: &RawCell) -> String {
    cell_to_string(cell).trim().to_uppercase()
}

/// Spreadsheet serial (days since 1899-12-30) to a calendar date
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.abs() > MAX_CONVERTIBLE_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Parse ISO and Brazilian (day first) date strings
pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DATE.captures(s) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DMY_DATE.captures(s) {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let mut year: i32 = caps[3].parse().ok()?;
        if caps[3].len() == 2 {
            // Same pivot as strftime's %y
            year += if year < 70 { 2000 } else { 1900 };
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

/// Native dates, plausible date serials, and date strings that parse
pub fn is_date_like(cell: &RawCell) -> bool {
    match cell {
        RawCell::Date(_) => true,
        RawCell::Number(n) => n.is_finite() && (DATE_SERIAL_MIN..=DATE_SERIAL_MAX).contains(n),
        RawCell::Text(s) => parse_date_text(s).is_some(),
        RawCell::Empty | RawCell::Bool(_) => false,
    }
}

/// Canonical `YYYY-MM-DD`, or `None` when the cell is not a date.
/// Any finite number is read as a serial.
pub fn to_iso_date(cell: &RawCell) -> Option<String> {
    let date = match cell {
        RawCell::Date(dt) => dt.date(),
        RawCell::Number(n) => serial_to_date(*n)?,
        RawCell::Text(s) => parse_date_text(s)?,
        RawCell::Empty | RawCell::Bool(_) => return None,
    };
    Some(date.format("%Y-%m-%d").to_string())
}

/// Parse a number written with Brazilian conventions: comma as decimal
/// separator (dots then act as thousands separators), optional `R$`
/// prefix and `%` suffix.
pub fn parse_number_text(raw: &str) -> Option<f64> {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("R$") {
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_suffix('%') {
        s = rest.trim_end();
    }
    if s.is_empty() {
        return None;
    }

    let mut normalized: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if normalized.contains(',') {
        normalized = normalized.replace('.', "").replace(',', ".");
    }

    if !PLAIN_NUMBER.is_match(&normalized) {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn is_numeric_like(cell: &RawCell) -> bool {
    to_number(cell).is_some()
}

/// Numeric value of a cell. Unparsable values are `None`, never a
/// silent zero, so a literal "0" stays distinguishable.
pub fn to_number(cell: &RawCell) -> Option<f64> {
    match cell {
        RawCell::Number(n) if n.is_finite() => Some(*n),
        RawCell::Text(s) => parse_number_text(s),
        _ => None,
    }
}

/// A cell that reads as a label: non-blank, neither numeric nor a date
pub fn is_label_like(cell: &RawCell) -> bool {
    !is_blank(cell) && !is_numeric_like(cell) && !is_date_like(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn text(s: &str) -> RawCell {
        RawCell::text(s)
    }

    #[test]
    fn test_serial_45000_is_2023_03_15() {
        assert_eq!(to_iso_date(&RawCell::from(45000.0)).as_deref(), Some("2023-03-15"));
        assert_eq!(to_iso_date(&RawCell::from(45000.75)).as_deref(), Some("2023-03-15"));
    }

    #[test]
    fn test_serial_range() {
        assert!(is_date_like(&RawCell::from(25000.0)));
        assert!(is_date_like(&RawCell::from(60000.0)));
        assert!(!is_date_like(&RawCell::from(24999.0)));
        assert!(!is_date_like(&RawCell::from(75000.0)));
        assert!(!is_date_like(&RawCell::from(f64::NAN)));
    }

    #[test]
    fn test_date_strings() {
        assert_eq!(to_iso_date(&text("2024-02-29")).as_deref(), Some("2024-02-29"));
        assert_eq!(to_iso_date(&text("2024/1/5")).as_deref(), Some("2024-01-05"));
        assert_eq!(to_iso_date(&text("05/01/2024")).as_deref(), Some("2024-01-05"));
        assert_eq!(to_iso_date(&text("31-12-2023")).as_deref(), Some("2023-12-31"));
        assert_eq!(to_iso_date(&text("15.03.2024")).as_deref(), Some("2024-03-15"));
        assert_eq!(to_iso_date(&text("01/02/24")).as_deref(), Some("2024-02-01"));
        assert_eq!(
            to_iso_date(&text("2024-01-05T08:30:00Z")).as_deref(),
            Some("2024-01-05")
        );
        assert_eq!(to_iso_date(&text("05/01/2024 14:00")).as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn test_invalid_dates_rejected() {
        assert!(!is_date_like(&text("2023-02-30")));
        assert!(!is_date_like(&text("31/13/2024")));
        assert!(!is_date_like(&text("ENTREGUE")));
        assert!(!is_date_like(&text("45000")));
        assert!(!is_date_like(&RawCell::Empty));
        assert!(!is_date_like(&RawCell::from(true)));
        assert_eq!(to_iso_date(&text("nope")), None);
    }

    #[test]
    fn test_native_date() {
        let dt = NaiveDateTime::parse_from_str("2024-06-01 13:45:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let cell = RawCell::from(dt);
        assert!(is_date_like(&cell));
        assert_eq!(to_iso_date(&cell).as_deref(), Some("2024-06-01"));
        assert_eq!(cell_to_string(&cell), "2024-06-01 13:45:00");
    }

    #[test]
    fn test_iso_output_is_fixed_point() {
        let inputs = vec![
            RawCell::from(25000.0),
            RawCell::from(45000.0),
            RawCell::from(59999.5),
            text("1/2/2020"),
            text("2020-2-1"),
            text("29.02.2000"),
            text("10-10-99"),
        ];
        for input in inputs {
            assert!(is_date_like(&input), "{:?}", input);
            let iso = to_iso_date(&input).unwrap();
            let again = RawCell::text(iso.clone());
            assert!(is_date_like(&again));
            assert_eq!(to_iso_date(&again), Some(iso));
        }
    }

    #[test]
    fn test_brazilian_numbers() {
        assert_eq!(to_number(&text("1.234,56")), Some(1234.56));
        assert_eq!(to_number(&text("12,5")), Some(12.5));
        assert_eq!(to_number(&text("R$ 10,00")), Some(10.0));
        assert_eq!(to_number(&text("45%")), Some(45.0));
        assert_eq!(to_number(&text("-3")), Some(-3.0));
        assert_eq!(to_number(&text(" 42 ")), Some(42.0));
        assert_eq!(to_number(&RawCell::from(7.25)), Some(7.25));
    }

    #[test]
    fn test_zero_is_distinguishable_from_garbage() {
        assert_eq!(to_number(&text("0")), Some(0.0));
        assert_eq!(to_number(&text("abc")), None);
        assert_eq!(to_number(&text("")), None);
        assert_eq!(to_number(&text("NaN")), None);
        assert_eq!(to_number(&text("inf")), None);
        assert_eq!(to_number(&RawCell::from(true)), None);
        assert!(!is_numeric_like(&text("12abc")));
    }

    #[test]
    fn test_dates_are_not_numbers() {
        assert!(!is_numeric_like(&text("2024-01-05")));
        assert!(!is_numeric_like(&text("05/01/2024")));
    }

    #[test]
    fn test_label_like() {
        assert!(is_label_like(&text("Nome")));
        assert!(!is_label_like(&text("  ")));
        assert!(!is_label_like(&text("12")));
        assert!(!is_label_like(&text("2024-01-01")));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key(&text("  folga ")), "FOLGA");
        assert_eq!(normalize_key(&RawCell::from(3.0)), "3");
    }
}
