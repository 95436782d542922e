//! quotagrid-core — Quota reconciliation engine.
//!
//! This crate fills and validates the topic × cognitive-level grid of a
//! Table of Specification: largest-remainder apportionment of rows and
//! columns, two-axis balancing of the cell matrix, and tolerance checks on
//! hand-edited values before they are persisted.

pub mod allocate;
pub mod balance;
pub mod error;
pub mod grid;
pub mod model;
pub mod parser;
pub mod quota;
pub mod snapshot;
pub mod totals;
pub mod traits;
pub mod validate;

pub use error::QuotaError;
