//! Running sums over a grid and deviation classification for live display.

use serde::{Deserialize, Serialize};

use crate::model::{CognitiveLevel, Row, Specification, LEVEL_COUNT};
use crate::validate::Tolerance;

/// Column and grand totals over a set of rows.
///
/// Sums are kept in `u64`: every cell is a `u32` and a grid can hold any
/// number of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of the hour weights.
    pub hours: f64,
    /// Sum of the row percentages.
    pub percent: u64,
    /// Sum of the row item quotas.
    pub item_quotas: u64,
    /// Per-level sums of the cell values.
    pub columns: [u64; LEVEL_COUNT],
    /// Sum of every cell value.
    pub grand: u64,
}

impl Totals {
    pub fn compute(rows: &[Row]) -> Self {
        let mut totals = Totals::default();
        for row in rows {
            totals.hours += row.hours;
            totals.percent += u64::from(row.percent);
            totals.item_quotas += u64::from(row.item_quota);
            for (sum, value) in totals.columns.iter_mut().zip(row.cells) {
                *sum += u64::from(value);
            }
        }
        totals.grand = totals.columns.iter().sum();
        totals
    }

    pub fn column(&self, level: CognitiveLevel) -> u64 {
        self.columns[level.index()]
    }

    /// How far a column total is from the specification's target.
    pub fn column_deviation(
        &self,
        spec: &Specification,
        level: CognitiveLevel,
        tolerance: Tolerance,
    ) -> Deviation {
        Deviation::classify(
            self.column(level),
            spec.column_expected[level.index()],
            tolerance,
        )
    }

    /// How far the grand total is from the specification's item count.
    pub fn grand_deviation(&self, spec: &Specification, tolerance: Tolerance) -> Deviation {
        Deviation::classify(self.grand, spec.total_items, tolerance)
    }
}

/// Where a value sits relative to its expected quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deviation {
    /// Matches exactly.
    Exact,
    /// Off, but inside the tolerance band.
    WithinTolerance,
    /// Outside the tolerance band; submission will be blocked.
    Exceeded,
}

impl Deviation {
    pub fn classify(actual: u64, expected: u32, tolerance: Tolerance) -> Self {
        let diff = actual.abs_diff(u64::from(expected));
        if diff == 0 {
            Deviation::Exact
        } else if tolerance.allows(diff) {
            Deviation::WithinTolerance
        } else {
            Deviation::Exceeded
        }
    }
}
