//! In-memory store for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quotagrid_core::model::{Row, Specification};
use quotagrid_core::traits::SpecificationStore;

use crate::error::StoreError;

/// A store holding grids in memory, for exercising the grid without a backend.
///
/// Counts saves and can be told to fail them.
#[derive(Default)]
pub struct MemoryStore {
    grids: Mutex<HashMap<u64, (Specification, Vec<Row>)>>,
    save_count: AtomicU32,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a specification and its rows.
    pub fn with_grid(self, spec: Specification, rows: Vec<Row>) -> Self {
        self.insert(spec, rows);
        self
    }

    pub fn insert(&self, spec: Specification, rows: Vec<Row>) {
        self.grids.lock().unwrap().insert(spec.id, (spec, rows));
    }

    /// Make every following `save_rows` call fail.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Relaxed);
    }

    /// Number of `save_rows` calls made, failed ones included.
    pub fn save_count(&self) -> u32 {
        self.save_count.load(Ordering::Relaxed)
    }

    /// Rows currently held for a specification.
    pub fn rows(&self, id: u64) -> Option<Vec<Row>> {
        self.grids.lock().unwrap().get(&id).map(|(_, rows)| rows.clone())
    }
}

#[async_trait]
impl SpecificationStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_specification(&self, id: u64) -> anyhow::Result<Specification> {
        let grids = self.grids.lock().unwrap();
        let (spec, _) = grids.get(&id).ok_or(StoreError::NotFound(id))?;
        Ok(spec.clone())
    }

    async fn get_rows(&self, id: u64) -> anyhow::Result<Vec<Row>> {
        self.rows(id).ok_or_else(|| StoreError::NotFound(id).into())
    }

    async fn save_rows(&self, id: u64, rows: &[Row]) -> anyhow::Result<()> {
        self.save_count.fetch_add(1, Ordering::Relaxed);
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(StoreError::Api {
                status: 503,
                message: "memory store configured to fail".into(),
            }
            .into());
        }

        let mut grids = self.grids.lock().unwrap();
        let (_, stored) = grids.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *stored = rows.to_vec();
        Ok(())
    }
}
