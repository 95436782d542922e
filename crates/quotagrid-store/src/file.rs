//! Directory of JSON snapshots, one `{id}.json` per specification.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use quotagrid_core::model::{Row, Specification};
use quotagrid_core::snapshot::GridSnapshot;
use quotagrid_core::traits::SpecificationStore;

use crate::error::StoreError;

/// Store backed by snapshot files on disk.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read(&self, id: u64) -> Result<GridSnapshot, StoreError> {
        let path = self.snapshot_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id));
        }
        GridSnapshot::load_json(&path).map_err(|e| StoreError::Storage(format!("{e:#}")))
    }

    /// Write a full snapshot, replacing any existing one for the same id.
    pub fn put(&self, snapshot: &GridSnapshot) -> anyhow::Result<()> {
        snapshot.save_json(&self.snapshot_path(snapshot.specification.id))
    }
}

#[async_trait]
impl SpecificationStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_specification(&self, id: u64) -> anyhow::Result<Specification> {
        Ok(self.read(id)?.specification)
    }

    async fn get_rows(&self, id: u64) -> anyhow::Result<Vec<Row>> {
        Ok(self.read(id)?.rows)
    }

    async fn get_grid(&self, id: u64) -> anyhow::Result<(Specification, Vec<Row>)> {
        let snapshot = self.read(id)?;
        Ok((snapshot.specification, snapshot.rows))
    }

    async fn save_rows(&self, id: u64, rows: &[Row]) -> anyhow::Result<()> {
        let mut snapshot = self.read(id)?;
        snapshot.replace_rows(rows.to_vec());
        snapshot
            .save_json(&self.snapshot_path(id))
            .map_err(|e| StoreError::Storage(format!("{e:#}")))?;
        tracing::debug!(id, path = %self.snapshot_path(id).display(), "snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let spec = Specification::new(3, 10, [40, 30, 20, 10]).unwrap();
        store
            .put(&GridSnapshot::new(spec, vec![Row::new(1, "Sets", 2.0)]))
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn reads_seeded_snapshot() {
        let (_dir, store) = seeded_store();
        let spec = store.get_specification(3).await.unwrap();
        assert_eq!(spec.column_expected, [4, 3, 2, 1]);
        let rows = store.get_rows(3).await.unwrap();
        assert_eq!(rows, vec![Row::new(1, "Sets", 2.0)]);

        let (spec, rows) = store.get_grid(3).await.unwrap();
        assert_eq!(spec.id, 3);
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn save_replaces_rows_and_keeps_specification() {
        let (dir, store) = seeded_store();
        let mut row = Row::new(1, "Sets", 2.0);
        row.item_quota = 10;
        row.cells = [4, 3, 2, 1];
        store.save_rows(3, &[row.clone()]).await.unwrap();

        let on_disk = GridSnapshot::load_json(&dir.path().join("3.json")).unwrap();
        assert_eq!(on_disk.rows, vec![row]);
        assert_eq!(on_disk.specification.total_items, 10);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (_dir, store) = seeded_store();
        let err = store.get_rows(4).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound(4))
        ));
        assert!(store.save_rows(4, &[]).await.is_err());
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_storage_error() {
        let (dir, store) = seeded_store();
        std::fs::write(dir.path().join("3.json"), "{ not json").unwrap();
        let err = store.get_specification(3).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Storage(_))
        ));
    }
}
