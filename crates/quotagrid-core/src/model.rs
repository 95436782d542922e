//! Core data model types for quotagrid.
//!
//! A [`Specification`] owns the item budget and the four column weights; each
//! [`Row`] is one topic with its hour weight, derived quotas and the four
//! editable cell values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuotaError;
use crate::quota::column_targets;

/// Number of cognitive-level columns in every grid.
pub const LEVEL_COUNT: usize = 4;

/// The four fixed classification columns test items are distributed across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CognitiveLevel {
    Knowledge,
    Comprehension,
    Application,
    Synthesis,
}

impl CognitiveLevel {
    /// All levels in column order.
    pub const ALL: [CognitiveLevel; LEVEL_COUNT] = [
        CognitiveLevel::Knowledge,
        CognitiveLevel::Comprehension,
        CognitiveLevel::Application,
        CognitiveLevel::Synthesis,
    ];

    /// Zero-based column index.
    pub fn index(self) -> usize {
        match self {
            CognitiveLevel::Knowledge => 0,
            CognitiveLevel::Comprehension => 1,
            CognitiveLevel::Application => 2,
            CognitiveLevel::Synthesis => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for CognitiveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CognitiveLevel::Knowledge => write!(f, "knowledge"),
            CognitiveLevel::Comprehension => write!(f, "comprehension"),
            CognitiveLevel::Application => write!(f, "application"),
            CognitiveLevel::Synthesis => write!(f, "synthesis"),
        }
    }
}

impl FromStr for CognitiveLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "knowledge" | "col1" | "1" => Ok(CognitiveLevel::Knowledge),
            "comprehension" | "col2" | "2" => Ok(CognitiveLevel::Comprehension),
            "application" | "col3" | "3" => Ok(CognitiveLevel::Application),
            "synthesis" | "col4" | "4" => Ok(CognitiveLevel::Synthesis),
            other => Err(format!("unknown cognitive level: {other}")),
        }
    }
}

/// The owning record: item budget and column weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    /// Identifier of the record in the backing store.
    pub id: u64,
    /// Total number of test items the grid must account for.
    pub total_items: u32,
    /// Column weights in percent. Expected to sum to 100; not enforced here.
    pub column_percentages: [u32; LEVEL_COUNT],
    /// Column targets, summing to `total_items`.
    pub column_expected: [u32; LEVEL_COUNT],
}

impl Specification {
    /// Build a specification, deriving the column targets from the percentages.
    pub fn new(
        id: u64,
        total_items: u32,
        column_percentages: [u32; LEVEL_COUNT],
    ) -> Result<Self, QuotaError> {
        let column_expected = column_targets(&column_percentages, total_items)?;
        Ok(Self {
            id,
            total_items,
            column_percentages,
            column_expected,
        })
    }

    /// Replace the derived column targets with values stored on the record.
    pub fn with_expected(mut self, column_expected: [u32; LEVEL_COUNT]) -> Self {
        self.column_expected = column_expected;
        self
    }

    /// A column with a zero percentage is never editable and always holds 0.
    pub fn is_disabled(&self, level: CognitiveLevel) -> bool {
        self.column_percentages[level.index()] == 0
    }

    pub fn disabled_columns(&self) -> [bool; LEVEL_COUNT] {
        self.column_percentages.map(|p| p == 0)
    }
}

/// One topic of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: u64,
    pub topic: String,
    /// Instructional hours; a relative weight.
    #[serde(default)]
    pub hours: f64,
    /// Share of 100, derived from hours.
    #[serde(default)]
    pub percent: u32,
    /// Share of the specification's total items, derived from hours.
    #[serde(default)]
    pub item_quota: u32,
    /// Items allocated to each cognitive level.
    #[serde(default)]
    pub cells: [u32; LEVEL_COUNT],
}

impl Row {
    pub fn new(id: u64, topic: impl Into<String>, hours: f64) -> Self {
        Self {
            id,
            topic: topic.into(),
            hours,
            percent: 0,
            item_quota: 0,
            cells: [0; LEVEL_COUNT],
        }
    }

    pub fn cell(&self, level: CognitiveLevel) -> u32 {
        self.cells[level.index()]
    }

    /// Sum of the four cell values, widened so that large hand-edited cells
    /// cannot overflow.
    pub fn cell_total(&self) -> u64 {
        self.cells.iter().map(|&v| u64::from(v)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_display_and_parse() {
        assert_eq!(CognitiveLevel::Knowledge.to_string(), "knowledge");
        assert_eq!(
            "Application".parse::<CognitiveLevel>().unwrap(),
            CognitiveLevel::Application
        );
        assert_eq!(
            "col4".parse::<CognitiveLevel>().unwrap(),
            CognitiveLevel::Synthesis
        );
        assert_eq!(
            "2".parse::<CognitiveLevel>().unwrap(),
            CognitiveLevel::Comprehension
        );
        assert!("evaluation".parse::<CognitiveLevel>().is_err());
    }

    #[test]
    fn level_indices_follow_column_order() {
        for (i, level) in CognitiveLevel::ALL.iter().enumerate() {
            assert_eq!(level.index(), i);
            assert_eq!(CognitiveLevel::from_index(i), Some(*level));
        }
        assert_eq!(CognitiveLevel::from_index(4), None);
    }

    #[test]
    fn specification_derives_expected_columns() {
        let spec = Specification::new(1, 50, [40, 30, 20, 10]).unwrap();
        assert_eq!(spec.column_expected, [20, 15, 10, 5]);
        assert!(!spec.is_disabled(CognitiveLevel::Synthesis));
    }

    #[test]
    fn zero_percentage_disables_column() {
        let spec = Specification::new(1, 40, [50, 50, 0, 0]).unwrap();
        assert_eq!(spec.disabled_columns(), [false, false, true, true]);
        assert_eq!(spec.column_expected, [20, 20, 0, 0]);
    }

    #[test]
    fn row_serde_defaults() {
        let row: Row = serde_json::from_str(r#"{"id": 3, "topic": "Sets"}"#).unwrap();
        assert_eq!(row.hours, 0.0);
        assert_eq!(row.cells, [0; LEVEL_COUNT]);
        assert_eq!(row.cell_total(), 0);
    }
}
