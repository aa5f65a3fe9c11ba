// ============================================================
// COLUMN TYPE INFERENCER
// ============================================================
// Classify a column from value-level statistics

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::cell_classifier::{is_blank, is_date_like, is_numeric_like, normalize_key};
use crate::domain::sheet::{ColumnType, InferenceConfig, RawCell};

/// Value counts behind a column type decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub non_empty: usize,
    pub date_like: usize,
    pub numeric_like: usize,
    /// Distinct trimmed, uppercased values
    pub distinct: usize,
}

impl ColumnProfile {
    pub fn date_ratio(&self) -> f64 {
        ratio(self.date_like, self.non_empty)
    }

    pub fn numeric_ratio(&self) -> f64 {
        ratio(self.numeric_like, self.non_empty)
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

pub fn profile_column<'a, I>(values: I) -> ColumnProfile
where
    I: IntoIterator<Item = &'a RawCell>,
{
    let mut profile = ColumnProfile::default();
    let mut distinct = HashSet::new();

    for value in values {
        if is_blank(value) {
            continue;
        }
        profile.non_empty += 1;
        if is_date_like(value) {
            profile.date_like += 1;
        }
        if is_numeric_like(value) {
            profile.numeric_like += 1;
        }
        distinct.insert(normalize_key(value));
    }

    profile.distinct = distinct.len();
    profile
}

/// Decision cascade over a column profile:
/// empty → text, dates, numbers, low-cardinality categories,
/// all-unique identifiers, and text otherwise.
pub fn classify_profile(profile: &ColumnProfile, config: &InferenceConfig) -> ColumnType {
    if profile.non_empty == 0 {
        return ColumnType::Text;
    }
    if profile.date_ratio() > config.date_column_ratio {
        return ColumnType::Date;
    }
    if profile.numeric_ratio() > config.number_column_ratio {
        return ColumnType::Number;
    }
    if profile.distinct as f64 <= config.category_limit(profile.non_empty) {
        return ColumnType::Category;
    }
    if profile.distinct == profile.non_empty && profile.non_empty > config.id_min_values {
        return ColumnType::Id;
    }
    ColumnType::Text
}

pub fn detect_column_type<'a, I>(values: I, config: &InferenceConfig) -> ColumnType
where
    I: IntoIterator<Item = &'a RawCell>,
{
    classify_profile(&profile_column(values), config)
}
