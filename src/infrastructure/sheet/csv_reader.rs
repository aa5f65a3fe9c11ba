// ============================================================
// CSV GRID READER
// ============================================================
// Parse CSV bytes into a single-sheet grid with encoding and
// delimiter detection

use csv::{ReaderBuilder, Trim};
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use tracing::{debug, warn};

use super::{DecodedSheet, DecodedWorkbook, GridDecoder};
use crate::domain::error::Result;
use crate::domain::sheet::{RawCell, RawGrid};

/// Sheet name reported for CSV input
pub const CSV_SHEET_NAME: &str = "Sheet1";

/// CSV decoder. Cells stay as text; typing happens in inference.
#[derive(Debug, Clone, Default)]
pub struct CsvGridReader {
    /// Fixed delimiter; detected from content when unset
    delimiter: Option<u8>,
}

impl CsvGridReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content.lines().take(10).collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        if sample_lines.is_empty() {
            return best_delimiter;
        }

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());
            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }

    /// UTF-8 first (BOM stripped), Windows-1252 otherwise
    pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(content) => Cow::Borrowed(content),
            Err(_) => {
                warn!("CSV is not valid UTF-8, decoding as Windows-1252");
                let (content, _, _) = WINDOWS_1252.decode(bytes);
                content
            }
        }
    }

    pub fn parse_content(&self, content: &str) -> Result<RawGrid> {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));
        debug!("Parsing CSV with delimiter {:?}", delimiter as char);

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .trim(Trim::None)
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let mut grid = Vec::new();
        for result in reader.records() {
            let record = result?;
            grid.push(
                record
                    .iter()
                    .map(|value| {
                        if value.is_empty() {
                            RawCell::Empty
                        } else {
                            RawCell::Text(value.to_string())
                        }
                    })
                    .collect(),
            );
        }

        Ok(grid)
    }
}

impl GridDecoder for CsvGridReader {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedWorkbook> {
        let content = Self::decode_text(bytes);
        let grid = self.parse_content(&content)?;
        Ok(DecodedWorkbook {
            sheets: vec![DecodedSheet {
                name: CSV_SHEET_NAME.to_string(),
                grid,
            }],
        })
    }
}
