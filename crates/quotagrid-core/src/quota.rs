//! Row quotas and column targets.
//!
//! Both are thin layers over [`distribute`]: rows are weighted by their
//! instructional hours, columns by their percentages.

use serde::{Deserialize, Serialize};

use crate::allocate::distribute;
use crate::error::QuotaError;
use crate::model::LEVEL_COUNT;

/// Per-row shares derived from hour weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowQuotas {
    /// Share of 100 for each row.
    pub percents: Vec<u32>,
    /// Share of the total item count for each row.
    pub item_quotas: Vec<u32>,
}

/// Derive each row's percentage and item quota from its hours.
///
/// When no row has any hours, every percent and quota is zero.
pub fn row_quotas(hours: &[f64], total_items: u32) -> Result<RowQuotas, QuotaError> {
    let total_hours: f64 = hours.iter().sum();
    if total_hours <= 0.0 {
        if let Some(h) = hours.iter().find(|h| !h.is_finite() || **h < 0.0) {
            return Err(QuotaError::invalid(format!(
                "hours must be non-negative numbers, got {h}"
            )));
        }
        return Ok(RowQuotas {
            percents: vec![0; hours.len()],
            item_quotas: vec![0; hours.len()],
        });
    }

    Ok(RowQuotas {
        percents: distribute(hours, 100)?,
        item_quotas: distribute(hours, total_items)?,
    })
}

/// Derive the four column targets from the column percentages.
///
/// Only enabled (non-zero) columns take part in the distribution; a disabled
/// column's target is always 0.
pub fn column_targets(
    percentages: &[u32; LEVEL_COUNT],
    total_items: u32,
) -> Result<[u32; LEVEL_COUNT], QuotaError> {
    let enabled: Vec<usize> = (0..LEVEL_COUNT).filter(|&i| percentages[i] > 0).collect();
    if enabled.is_empty() {
        if total_items == 0 {
            return Ok([0; LEVEL_COUNT]);
        }
        return Err(QuotaError::invalid(format!(
            "all cognitive levels are disabled but {total_items} items must be placed"
        )));
    }

    let weights: Vec<f64> = enabled.iter().map(|&i| f64::from(percentages[i])).collect();
    let shares = distribute(&weights, total_items)?;

    let mut targets = [0; LEVEL_COUNT];
    for (&column, share) in enabled.iter().zip(shares) {
        targets[column] = share;
    }
    Ok(targets)
}
