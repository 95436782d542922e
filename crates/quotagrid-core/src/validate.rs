//! Tolerance checks run before a grid is persisted.
//!
//! Every rule compares a sum against its expected quota and fails when the
//! absolute deviation is larger than the injected [`Tolerance`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{CognitiveLevel, Row, Specification};
use crate::totals::Totals;

/// Default deviation band, in items.
pub const DEFAULT_TOLERANCE: u32 = 5;

/// Maximum permitted deviation between a sum and its expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tolerance(u32);

impl Tolerance {
    pub const fn new(items: u32) -> Self {
        Self(items)
    }

    pub fn items(self) -> u32 {
        self.0
    }

    /// True when a deviation of `diff` items is acceptable.
    pub fn allows(self, diff: u64) -> bool {
        diff <= u64::from(self.0)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "±{}", self.0)
    }
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ToleranceViolation {
    /// Sum of every cell is too far from the specification's item count.
    GrandTotal {
        actual: u64,
        expected: u32,
        tolerance: Tolerance,
    },
    /// Sum of the row item quotas is too far from the item count.
    QuotaTotal {
        actual: u64,
        expected: u32,
        tolerance: Tolerance,
    },
    /// A column total is too far from its target.
    Column {
        level: CognitiveLevel,
        actual: u64,
        expected: u32,
        tolerance: Tolerance,
    },
    /// A row's cells are too far from its item quota.
    Row {
        row_id: u64,
        topic: String,
        actual: u64,
        expected: u32,
        tolerance: Tolerance,
    },
}

impl fmt::Display for ToleranceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToleranceViolation::GrandTotal {
                actual,
                expected,
                tolerance,
            } => write!(
                f,
                "grand total {actual} deviates more than {tolerance} from {expected} items"
            ),
            ToleranceViolation::QuotaTotal {
                actual,
                expected,
                tolerance,
            } => write!(
                f,
                "row item quotas sum to {actual}, more than {tolerance} from {expected} items"
            ),
            ToleranceViolation::Column {
                level,
                actual,
                expected,
                tolerance,
            } => write!(
                f,
                "{level} column total {actual} deviates more than {tolerance} from expected {expected}"
            ),
            ToleranceViolation::Row {
                topic,
                actual,
                expected,
                tolerance,
                ..
            } => write!(
                f,
                "row \"{topic}\" total {actual} deviates more than {tolerance} from expected {expected}"
            ),
        }
    }
}

/// Outcome of [`validate`]: empty when the grid may be persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<ToleranceViolation>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// The row violation, if a row failed.
    pub fn row_violation(&self) -> Option<&ToleranceViolation> {
        self.violations
            .iter()
            .find(|v| matches!(v, ToleranceViolation::Row { .. }))
    }

    /// One-line description for user display.
    pub fn summary(&self) -> String {
        match self.violations.as_slice() {
            [] => "all totals within tolerance".to_string(),
            [only] => only.to_string(),
            [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
        }
    }
}

/// Check a (possibly hand-edited) grid against its specification.
///
/// Aggregate rules run first, in order: grand total, quota total, then each
/// column. Rows are checked last and only the first failing row is reported.
pub fn validate(rows: &[Row], spec: &Specification, tolerance: Tolerance) -> ValidationReport {
    let totals = Totals::compute(rows);
    let mut violations = Vec::new();

    if !tolerance.allows(totals.grand.abs_diff(u64::from(spec.total_items))) {
        violations.push(ToleranceViolation::GrandTotal {
            actual: totals.grand,
            expected: spec.total_items,
            tolerance,
        });
    }

    if !tolerance.allows(totals.item_quotas.abs_diff(u64::from(spec.total_items))) {
        violations.push(ToleranceViolation::QuotaTotal {
            actual: totals.item_quotas,
            expected: spec.total_items,
            tolerance,
        });
    }

    for level in CognitiveLevel::ALL {
        let actual = totals.column(level);
        let expected = spec.column_expected[level.index()];
        if !tolerance.allows(actual.abs_diff(u64::from(expected))) {
            violations.push(ToleranceViolation::Column {
                level,
                actual,
                expected,
                tolerance,
            });
        }
    }

    if let Some(row) = rows
        .iter()
        .find(|r| !tolerance.allows(r.cell_total().abs_diff(u64::from(r.item_quota))))
    {
        violations.push(ToleranceViolation::Row {
            row_id: row.id,
            topic: row.topic.clone(),
            actual: row.cell_total(),
            expected: row.item_quota,
            tolerance,
        });
    }

    ValidationReport { violations }
}
