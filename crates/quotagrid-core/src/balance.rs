//! Two-axis balancing of the topic × level matrix.
//!
//! The ideal allocation `item_quota[k] * percentage[i] / 100` is floored, and
//! the units lost to flooring are handed back so that every row meets its
//! item quota and every column meets its target exactly. Redistribution runs
//! in two phases:
//!
//! 1. [`priority_pass`] walks the cells by descending fractional remainder
//!    and repeats until the total is met or a whole scan makes no progress.
//! 2. [`fallback_pass`] fills whatever is left in plain row-major order.
//!
//! The second phase only ever sees the small residual the first phase could
//! not place; it picks any feasible cell, not the fairest one.

use serde::{Deserialize, Serialize};

use crate::allocate::fraction;
use crate::error::{Axis, QuotaError};
use crate::model::{CognitiveLevel, LEVEL_COUNT};

/// Integer cell values, one `[u32; 4]` per row.
pub type Matrix = Vec<[u32; LEVEL_COUNT]>;

/// Fractional cell values before flooring.
pub type RawMatrix = Vec<[f64; LEVEL_COUNT]>;

/// Working state of the balancer: the matrix plus its running sums and the
/// targets both axes must reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub matrix: Matrix,
    pub row_sums: Vec<u32>,
    pub column_sums: [u32; LEVEL_COUNT],
    pub row_targets: Vec<u32>,
    pub column_targets: [u32; LEVEL_COUNT],
    /// Disabled columns never receive units.
    pub enabled: [bool; LEVEL_COUNT],
    /// Running grand total of `matrix`.
    pub assigned: u32,
    /// Grand total to reach, the sum of the row targets.
    pub target_total: u32,
}

impl Ledger {
    pub fn new(
        matrix: Matrix,
        row_targets: Vec<u32>,
        column_targets: [u32; LEVEL_COUNT],
        enabled: [bool; LEVEL_COUNT],
    ) -> Self {
        let row_sums: Vec<u32> = matrix.iter().map(|r| r.iter().sum()).collect();
        let mut column_sums = [0u32; LEVEL_COUNT];
        for row in &matrix {
            for (sum, value) in column_sums.iter_mut().zip(row) {
                *sum += value;
            }
        }
        let assigned = row_sums.iter().sum();
        let target_total = row_targets.iter().sum();

        Self {
            matrix,
            row_sums,
            column_sums,
            row_targets,
            column_targets,
            enabled,
            assigned,
            target_total,
        }
    }

    /// True when both the row and the column of the cell can take another unit.
    pub fn has_capacity(&self, row: usize, column: usize) -> bool {
        self.enabled[column]
            && self.row_sums[row] < self.row_targets[row]
            && self.column_sums[column] < self.column_targets[column]
    }

    pub fn is_complete(&self) -> bool {
        self.assigned >= self.target_total
    }

    fn assign(&mut self, row: usize, column: usize) {
        self.matrix[row][column] += 1;
        self.row_sums[row] += 1;
        self.column_sums[column] += 1;
        self.assigned += 1;
    }

    /// Verify every row and column sum equals its target.
    pub fn verify(&self) -> Result<(), QuotaError> {
        for (index, (&actual, &expected)) in
            self.row_sums.iter().zip(&self.row_targets).enumerate()
        {
            if actual != expected {
                return Err(QuotaError::AllocationFailed {
                    axis: Axis::Row,
                    index,
                    actual,
                    expected,
                });
            }
        }
        for (index, (&actual, &expected)) in
            self.column_sums.iter().zip(&self.column_targets).enumerate()
        {
            if actual != expected {
                return Err(QuotaError::AllocationFailed {
                    axis: Axis::Column,
                    index,
                    actual,
                    expected,
                });
            }
        }
        Ok(())
    }

    pub fn into_matrix(self) -> Matrix {
        self.matrix
    }
}

/// Ideal fractional allocation: `item_quota[k] * percentage[i] / 100`.
pub fn raw_matrix(item_quotas: &[u32], percentages: &[u32; LEVEL_COUNT]) -> RawMatrix {
    item_quotas
        .iter()
        .map(|&quota| percentages.map(|pct| f64::from(quota) * f64::from(pct) / 100.0))
        .collect()
}

pub fn floor_matrix(raw: &[[f64; LEVEL_COUNT]]) -> Matrix {
    raw.iter().map(|row| row.map(|v| v.floor() as u32)).collect()
}

/// Enabled cells ordered by fractional remainder, largest first, ties by
/// (row, column) ascending.
pub fn candidate_order(
    raw: &[[f64; LEVEL_COUNT]],
    enabled: &[bool; LEVEL_COUNT],
) -> Vec<(usize, usize)> {
    let mut cells: Vec<(usize, usize)> = (0..raw.len())
        .flat_map(|row| (0..LEVEL_COUNT).map(move |column| (row, column)))
        .filter(|&(_, column)| enabled[column])
        .collect();
    // stable: row-major generation order breaks ties
    cells.sort_by(|&(ra, ca), &(rb, cb)| fraction(raw[rb][cb]).total_cmp(&fraction(raw[ra][ca])));
    cells
}

/// Hand out units in candidate order, rescanning until the total is reached
/// or a full scan assigns nothing.
pub fn priority_pass(mut ledger: Ledger, order: &[(usize, usize)]) -> Ledger {
    let mut progressed = true;
    while !ledger.is_complete() && progressed {
        progressed = false;
        for &(row, column) in order {
            if ledger.is_complete() {
                break;
            }
            if ledger.has_capacity(row, column) {
                ledger.assign(row, column);
                progressed = true;
            }
        }
    }
    ledger
}

/// Fill the remaining capacity in row-major order, topping up each cell
/// until its row or column is full.
pub fn fallback_pass(mut ledger: Ledger) -> Ledger {
    for row in 0..ledger.matrix.len() {
        for column in 0..LEVEL_COUNT {
            while !ledger.is_complete() && ledger.has_capacity(row, column) {
                ledger.assign(row, column);
            }
        }
    }
    ledger
}

/// Build the integer matrix whose rows sum to `item_quotas` and whose columns
/// sum to `column_targets`.
///
/// # Errors
///
/// - [`QuotaError::InvalidArgument`] when the row quotas and column targets do
///   not describe the same total, or a disabled column has a non-zero target.
/// - [`QuotaError::AllocationFailed`] when the passes cannot meet a target,
///   which only happens when the percentages overshoot 100.
pub fn balance(
    item_quotas: &[u32],
    percentages: &[u32; LEVEL_COUNT],
    column_targets: &[u32; LEVEL_COUNT],
) -> Result<Matrix, QuotaError> {
    let row_total: u64 = item_quotas.iter().map(|&q| u64::from(q)).sum();
    let column_total: u64 = column_targets.iter().map(|&t| u64::from(t)).sum();
    if row_total != column_total {
        return Err(QuotaError::invalid(format!(
            "row quotas sum to {row_total} but column targets sum to {column_total}"
        )));
    }

    let enabled = percentages.map(|p| p > 0);
    for level in CognitiveLevel::ALL {
        let column = level.index();
        if !enabled[column] && column_targets[column] > 0 {
            return Err(QuotaError::invalid(format!(
                "{level} is disabled but expects {} items",
                column_targets[column]
            )));
        }
    }

    let raw = raw_matrix(item_quotas, percentages);
    let order = candidate_order(&raw, &enabled);
    let ledger = Ledger::new(
        floor_matrix(&raw),
        item_quotas.to_vec(),
        *column_targets,
        enabled,
    );

    let ledger = priority_pass(ledger, &order);
    let ledger = if ledger.is_complete() {
        ledger
    } else {
        tracing::debug!(
            residual = ledger.target_total - ledger.assigned,
            "priority pass stalled, filling remainder in row-major order"
        );
        fallback_pass(ledger)
    };

    ledger.verify()?;
    Ok(ledger.into_matrix())
}
