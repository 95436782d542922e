//! quotagrid-store — Specification stores.
//!
//! Implements the `SpecificationStore` trait for the REST API the grids live
//! behind, for a directory of JSON snapshots, and in memory for tests.

pub mod config;
pub mod error;
pub mod file;
pub mod http;
pub mod mock;

pub use config::{create_store, load_config, QuotagridConfig, StoreConfig};
pub use error::StoreError;
