//! JSON snapshots of a specification and its rows.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Row, Specification};

/// A grid captured at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub specification: Specification,
    #[serde(default)]
    pub rows: Vec<Row>,
    /// When the rows were last written.
    pub updated_at: DateTime<Utc>,
}

impl GridSnapshot {
    pub fn new(specification: Specification, rows: Vec<Row>) -> Self {
        Self {
            specification,
            rows,
            updated_at: Utc::now(),
        }
    }

    /// Replace the rows and bump the timestamp.
    pub fn replace_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.updated_at = Utc::now();
    }

    /// Save the snapshot as pretty-printed JSON, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize snapshot")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        let snapshot: GridSnapshot =
            serde_json::from_str(&content).context("failed to parse snapshot JSON")?;
        Ok(snapshot)
    }
}
