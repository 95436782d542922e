//! Largest-remainder apportionment.
//!
//! Turns a list of non-negative weights into integers that sum exactly to a
//! requested total: every share is floored, then the leftover units go to the
//! entries with the largest fractional remainders.

use crate::error::QuotaError;

/// Distribute `total` units proportionally to `weights`.
///
/// The raw share of entry `k` is `weights[k] * total / Σweights`, so callers
/// may pass either relative weights or shares already scaled to `total`.
/// Ties between equal remainders go to the lower index, which makes the
/// result deterministic: `distribute(&[1.0, 1.0, 1.0], 2) == [1, 1, 0]`.
///
/// When every weight is zero, all shares are zero and the leftover is handed
/// out round-robin from index 0.
///
/// # Errors
///
/// Returns [`QuotaError::InvalidArgument`] when a weight is negative or not
/// finite, or when `weights` is empty and `total > 0`.
pub fn distribute(weights: &[f64], total: u32) -> Result<Vec<u32>, QuotaError> {
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(QuotaError::invalid(format!(
            "weights must be non-negative numbers, got {w}"
        )));
    }
    if total == 0 {
        return Ok(vec![0; weights.len()]);
    }
    if weights.is_empty() {
        return Err(QuotaError::invalid(format!(
            "cannot distribute {total} units over an empty weight list"
        )));
    }

    let shares = scale_to_total(weights, total);
    let mut allocated: Vec<u32> = shares.iter().map(|s| s.floor() as u32).collect();
    let assigned: u64 = allocated.iter().map(|&v| u64::from(v)).sum();
    let order = remainder_order(&shares);

    if assigned <= u64::from(total) {
        let leftover = (u64::from(total) - assigned) as usize;
        for k in 0..leftover {
            allocated[order[k % order.len()]] += 1;
        }
    } else {
        // Floating-point shares can overshoot by a unit; take it back from
        // the smallest remainders.
        let mut surplus = assigned - u64::from(total);
        for &idx in order.iter().rev().cycle() {
            if surplus == 0 {
                break;
            }
            if allocated[idx] > 0 {
                allocated[idx] -= 1;
                surplus -= 1;
            }
        }
    }

    debug_assert_eq!(
        allocated.iter().map(|&v| u64::from(v)).sum::<u64>(),
        u64::from(total)
    );
    Ok(allocated)
}

/// Raw shares of `total`, proportional to `weights`.
///
/// Multiplies before dividing so integral weights with integral shares stay
/// exact. All-zero weights yield all-zero shares.
///
/// This is one rounding step. Going through a percentage first
/// (`w / Σw * 100`, then `total * pct / 100`) rounds twice, and a share that
/// should land exactly on an integer can come out just below it and floor
/// one lower: 1 hour of 3 with 3 items is `3 * (1 / 3 * 100) / 100`, which
/// is `0.9999999999999999`, while `1 * 3 / 3` is `1`.
pub fn scale_to_total(weights: &[f64], total: u32) -> Vec<f64> {
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return vec![0.0; weights.len()];
    }
    let total = f64::from(total);
    weights.iter().map(|w| w * total / sum).collect()
}

/// Indices ordered by fractional remainder, largest first, ties by index.
pub fn remainder_order(shares: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..shares.len()).collect();
    // sort_by is stable, so equal remainders keep ascending index order
    order.sort_by(|&a, &b| fraction(shares[b]).total_cmp(&fraction(shares[a])));
    order
}

/// Fractional part of a non-negative share.
pub(crate) fn fraction(value: f64) -> f64 {
    value - value.floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_weights_break_ties_by_index() {
        assert_eq!(distribute(&[1.0, 1.0, 1.0], 2).unwrap(), vec![1, 1, 0]);
    }

    #[test]
    fn three_equal_rows_of_ten_items() {
        assert_eq!(distribute(&[10.0, 10.0, 10.0], 10).unwrap(), vec![4, 3, 3]);
    }

    #[test]
    fn largest_remainder_wins() {
        // shares: 1.4, 2.35, 3.25 -> floors 1, 2, 3; one unit left for 0.4
        assert_eq!(distribute(&[1.4, 2.35, 3.25], 7).unwrap(), vec![2, 2, 3]);
    }

    #[test]
    fn pre_scaled_shares_are_kept() {
        assert_eq!(
            distribute(&[30.0, 30.0, 20.0, 20.0], 100).unwrap(),
            vec![30, 30, 20, 20]
        );
    }

    #[test]
    fn zero_total_gives_zeros() {
        assert_eq!(distribute(&[3.0, 5.0], 0).unwrap(), vec![0, 0]);
        assert!(distribute(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn empty_weights_with_units_is_rejected() {
        let err = distribute(&[], 4).unwrap_err();
        assert!(matches!(err, QuotaError::InvalidArgument(_)));
    }

    #[test]
    fn negative_or_nan_weight_is_rejected() {
        assert!(distribute(&[1.0, -0.5], 3).is_err());
        assert!(distribute(&[f64::NAN, 1.0], 3).is_err());
        assert!(distribute(&[f64::INFINITY], 3).is_err());
    }

    #[test]
    fn all_zero_weights_cycle_round_robin() {
        assert_eq!(distribute(&[0.0, 0.0, 0.0], 7).unwrap(), vec![3, 2, 2]);
    }

    #[test]
    fn zero_weight_entry_gets_nothing_when_others_have_remainders() {
        assert_eq!(distribute(&[1.0, 0.0, 1.0], 3).unwrap(), vec![2, 0, 1]);
    }

    #[test]
    fn sum_is_always_exact() {
        let weight_sets: [&[f64]; 6] = [
            &[1.0],
            &[7.0, 3.0],
            &[3.0, 3.0, 3.0, 1.0],
            &[0.5, 0.25, 0.125, 0.125, 2.0],
            &[13.0, 17.0, 19.0, 23.0, 29.0, 31.0, 37.0],
            &[0.0, 4.0, 0.0, 9.5],
        ];
        for weights in weight_sets {
            for total in [0u32, 1, 2, 3, 7, 10, 33, 50, 99, 100, 101, 1000] {
                let result = distribute(weights, total).unwrap();
                assert_eq!(result.len(), weights.len());
                assert_eq!(
                    result.iter().sum::<u32>(),
                    total,
                    "weights {weights:?} total {total} -> {result:?}"
                );
            }
        }
    }

    #[test]
    fn integral_shares_are_not_rounded_down() {
        assert_eq!(scale_to_total(&[1.0, 2.0], 3), vec![1.0, 2.0]);
        assert_eq!(distribute(&[1.0, 2.0], 3).unwrap(), vec![1, 2]);
        assert_eq!(distribute(&[132.0, 66.0], 498).unwrap(), vec![332, 166]);
    }

    #[test]
    fn remainder_order_is_stable() {
        let order = remainder_order(&[1.5, 2.5, 0.75, 3.0]);
        assert_eq!(order, vec![2, 0, 1, 3]);
    }
}
