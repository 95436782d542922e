//! Engine error types.
//!
//! Nothing here is fatal: every variant is recovered by correcting input and
//! retrying. Collaborator failures arrive as `anyhow` errors and are carried
//! as their rendered message so the caller can show them as-is.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validate::ValidationReport;

/// Errors raised by the reconciliation engine.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// Malformed input to the distributor, balancer or quota calculators.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// One or more tolerance rules failed; submission was blocked.
    #[error("cannot submit: {}", .0.summary())]
    ToleranceExceeded(ValidationReport),

    /// The balancer finished without meeting a row or column target.
    #[error("allocation failed: {axis} {index} sums to {actual}, expected {expected}")]
    AllocationFailed {
        axis: Axis,
        index: usize,
        actual: u32,
        expected: u32,
    },

    /// The persistence collaborator rejected the save.
    #[error("failed to save rows: {0}")]
    PersistenceFailure(String),
}

impl QuotaError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        QuotaError::InvalidArgument(message.into())
    }

    /// Returns the validation report when this is a tolerance failure.
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            QuotaError::ToleranceExceeded(report) => Some(report),
            _ => None,
        }
    }
}

/// Which side of the matrix an allocation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}
