//! Collaborator interfaces.
//!
//! The engine never talks to a database or an API directly. Fetching and
//! persisting a grid goes through [`SpecificationStore`], implemented by the
//! `quotagrid-store` crate; user-facing messages go through [`Notifier`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Row, Specification};

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Backing store for specifications and their rows.
#[async_trait]
pub trait SpecificationStore: Send + Sync {
    /// Human-readable store name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch the owning record.
    async fn get_specification(&self, id: u64) -> anyhow::Result<Specification>;

    /// Fetch the rows of a specification.
    async fn get_rows(&self, id: u64) -> anyhow::Result<Vec<Row>>;

    /// Fetch the record and its rows together. Stores that hold both in one
    /// resource override this to read it once.
    async fn get_grid(&self, id: u64) -> anyhow::Result<(Specification, Vec<Row>)> {
        let spec = self.get_specification(id).await?;
        let rows = self.get_rows(id).await?;
        Ok((spec, rows))
    }

    /// Persist the final rows. Only called after validation passed.
    async fn save_rows(&self, id: u64, rows: &[Row]) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Notification side-channel
// ---------------------------------------------------------------------------

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Receives messages meant for the user (toast, banner, console line).
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Routes notices into the tracing subscriber.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => tracing::info!("{message}"),
            NoticeLevel::Error => tracing::warn!("{message}"),
        }
    }
}

/// Discards every notice.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _: NoticeLevel, _: &str) {}
}
