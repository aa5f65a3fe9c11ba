// ============================================================
// COLUMN METADATA
// ============================================================
// Inferred per-column type and preview information

use serde::{Deserialize, Serialize};

use super::RawCell;

/// Inferred type of a column. Assigned once during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Date,
    Number,
    Category,
    Text,
    Id,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Date => "date",
            ColumnType::Number => "number",
            ColumnType::Category => "category",
            ColumnType::Text => "text",
            ColumnType::Id => "id",
        }
    }

    /// Text and identifier columns are both listed as "text" columns.
    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::Id)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one surviving column of a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    /// Display name, unique and non-empty within a dataset
    pub name: String,

    /// Position in the (post-transposition) grid
    pub original_index: usize,

    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Capped sample of distinct non-empty values, in first-seen order
    pub unique_values: Vec<String>,

    /// First raw values of the column, for previews
    pub sample_values: Vec<RawCell>,

    pub is_numeric: bool,
    pub is_date: bool,

    /// Always false in assembled datasets: empty columns are dropped first
    pub is_empty: bool,
}

impl ColumnMetadata {
    pub fn new(
        name: String,
        original_index: usize,
        column_type: ColumnType,
        unique_values: Vec<String>,
        sample_values: Vec<RawCell>,
        is_empty: bool,
    ) -> Self {
        Self {
            name,
            original_index,
            column_type,
            unique_values,
            sample_values,
            is_numeric: column_type == ColumnType::Number,
            is_date: column_type == ColumnType::Date,
            is_empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_mirror_type() {
        let col = ColumnMetadata::new(
            "Valor".to_string(),
            2,
            ColumnType::Number,
            vec!["10".to_string()],
            vec![RawCell::from(10.0)],
            false,
        );
        assert!(col.is_numeric);
        assert!(!col.is_date);

        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["type"], "number");
        assert_eq!(json["originalIndex"], 2);
    }

    #[test]
    fn test_textual_types() {
        assert!(ColumnType::Id.is_textual());
        assert!(ColumnType::Text.is_textual());
        assert!(!ColumnType::Category.is_textual());
    }
}
