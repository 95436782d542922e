//! Grid state container.
//!
//! Owns one specification and its rows for the lifetime of an editing
//! session: applies single-cell edits, restores the default allocation,
//! reports running totals and gates persistence on the tolerance checks.

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::balance::balance;
use crate::error::QuotaError;
use crate::model::{CognitiveLevel, Row, Specification};
use crate::quota::{column_targets, row_quotas};
use crate::totals::Totals;
use crate::traits::{NoticeLevel, Notifier, SpecificationStore, TracingNotifier};
use crate::validate::{validate, Tolerance, ValidationReport};

const RESTORED_MESSAGE: &str = "Values restored to default based on expected computation.";
const SAVED_MESSAGE: &str = "Rows successfully updated!";
const SAVE_FAILED_MESSAGE: &str = "Failed to update rows.";

/// What happened to a single-cell edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOutcome {
    /// The value was stored.
    Applied(u32),
    /// Empty input; the cell now holds 0.
    Cleared,
    /// Nothing was stored.
    Ignored(IgnoreReason),
}

/// Why an edit was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    UnknownRow,
    DisabledColumn,
    NotANumber,
}

/// The in-memory grid owned by one editing session.
pub struct GridState {
    spec: Specification,
    rows: Vec<Row>,
    tolerance: Tolerance,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridState")
            .field("spec", &self.spec)
            .field("rows", &self.rows)
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}

impl GridState {
    /// Take ownership of a specification and its rows.
    ///
    /// Cells in disabled columns are forced to 0.
    pub fn new(spec: Specification, mut rows: Vec<Row>) -> Self {
        let disabled = spec.disabled_columns();
        for row in &mut rows {
            for (cell, off) in row.cells.iter_mut().zip(disabled) {
                if off && *cell != 0 {
                    tracing::warn!(
                        row_id = row.id,
                        value = *cell,
                        "zeroing cell in disabled column"
                    );
                    *cell = 0;
                }
            }
        }

        Self {
            spec,
            rows,
            tolerance: Tolerance::default(),
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Fetch a specification and its rows from the store.
    pub async fn load(store: &dyn SpecificationStore, id: u64) -> anyhow::Result<Self> {
        let (spec, rows) = store
            .get_grid(id)
            .await
            .with_context(|| format!("failed to fetch specification {id} from {}", store.name()))?;
        tracing::debug!(id, rows = rows.len(), store = store.name(), "loaded grid");
        Ok(Self::new(spec, rows))
    }

    pub fn specification(&self) -> &Specification {
        &self.spec
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Apply a keystroke-level edit to one cell.
    ///
    /// Only non-negative integers are stored. Anything else is dropped without
    /// notifying the user so typing is never interrupted; empty input clears
    /// the cell to 0.
    pub fn edit_cell(&mut self, row_id: u64, level: CognitiveLevel, raw_input: &str) -> EditOutcome {
        let outcome = self.apply_edit(row_id, level, raw_input);
        if let EditOutcome::Ignored(reason) = outcome {
            tracing::debug!(row_id, %level, ?reason, "ignored cell edit");
        }
        outcome
    }

    fn apply_edit(&mut self, row_id: u64, level: CognitiveLevel, raw_input: &str) -> EditOutcome {
        if self.spec.is_disabled(level) {
            return EditOutcome::Ignored(IgnoreReason::DisabledColumn);
        }
        let Some(row) = self.rows.iter_mut().find(|r| r.id == row_id) else {
            return EditOutcome::Ignored(IgnoreReason::UnknownRow);
        };

        if raw_input.is_empty() {
            row.cells[level.index()] = 0;
            return EditOutcome::Cleared;
        }
        if !raw_input.chars().all(|c| c.is_ascii_digit()) {
            return EditOutcome::Ignored(IgnoreReason::NotANumber);
        }
        match raw_input.parse::<u32>() {
            Ok(value) => {
                row.cells[level.index()] = value;
                EditOutcome::Applied(value)
            }
            Err(_) => EditOutcome::Ignored(IgnoreReason::NotANumber),
        }
    }

    /// Recompute every row's percent, item quota and cells from the hour
    /// weights. The grid is left untouched when any step fails.
    pub fn restore_defaults(&mut self) -> Result<(), QuotaError> {
        if self.rows.is_empty() {
            return Ok(());
        }

        let hours: Vec<f64> = self.rows.iter().map(|r| r.hours).collect();
        let computed = row_quotas(&hours, self.spec.total_items)
            .and_then(|quotas| {
                let targets = column_targets(&self.spec.column_percentages, self.spec.total_items)?;
                let matrix = balance(&quotas.item_quotas, &self.spec.column_percentages, &targets)?;
                Ok((quotas, matrix))
            });

        let (quotas, matrix) = match computed {
            Ok(result) => result,
            Err(e) => {
                self.notifier.notify(NoticeLevel::Error, &e.to_string());
                return Err(e);
            }
        };

        for (i, row) in self.rows.iter_mut().enumerate() {
            row.percent = quotas.percents[i];
            row.item_quota = quotas.item_quotas[i];
            row.cells = matrix[i];
        }

        tracing::info!(
            spec_id = self.spec.id,
            rows = self.rows.len(),
            total_items = self.spec.total_items,
            "restored default allocation"
        );
        self.notifier.notify(NoticeLevel::Info, RESTORED_MESSAGE);
        Ok(())
    }

    /// Running sums for live display.
    pub fn totals(&self) -> Totals {
        Totals::compute(&self.rows)
    }

    pub fn validate(&self) -> ValidationReport {
        validate(&self.rows, &self.spec, self.tolerance)
    }

    /// Validate and, when every rule passes, persist the rows.
    ///
    /// A failed validation never reaches the store and leaves the grid as is.
    pub async fn submit(&self, store: &dyn SpecificationStore) -> Result<(), QuotaError> {
        let report = self.validate();
        if !report.is_ok() {
            self.notifier.notify(
                NoticeLevel::Error,
                &format!("Cannot submit: {}", report.summary()),
            );
            return Err(QuotaError::ToleranceExceeded(report));
        }

        match store.save_rows(self.spec.id, &self.rows).await {
            Ok(()) => {
                tracing::info!(spec_id = self.spec.id, store = store.name(), "rows saved");
                self.notifier.notify(NoticeLevel::Success, SAVED_MESSAGE);
                Ok(())
            }
            Err(e) => {
                tracing::error!(spec_id = self.spec.id, "save failed: {e:#}");
                self.notifier.notify(NoticeLevel::Error, SAVE_FAILED_MESSAGE);
                Err(QuotaError::PersistenceFailure(format!("{e:#}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::validate::ToleranceViolation;

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<(NoticeLevel, String)>>,
    }

    impl RecordingNotifier {
        fn last(&self) -> Option<(NoticeLevel, String)> {
            self.notices.lock().unwrap().last().cloned()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, level: NoticeLevel, message: &str) {
            self.notices.lock().unwrap().push((level, message.to_string()));
        }
    }

    struct CountingStore {
        saves: AtomicU32,
        fail: bool,
    }

    impl CountingStore {
        fn new(fail: bool) -> Self {
            Self {
                saves: AtomicU32::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl SpecificationStore for CountingStore {
        fn name(&self) -> &str {
            "counting"
        }

        async fn get_specification(&self, id: u64) -> anyhow::Result<Specification> {
            Ok(Specification::new(id, 100, [30, 30, 20, 20])?)
        }

        async fn get_rows(&self, _id: u64) -> anyhow::Result<Vec<Row>> {
            Ok(vec![Row::new(1, "Limits", 20.0), Row::new(2, "Derivatives", 20.0)])
        }

        async fn save_rows(&self, _id: u64, _rows: &[Row]) -> anyhow::Result<()> {
            self.saves.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(())
        }
    }

    fn two_topic_grid() -> GridState {
        let spec = Specification::new(9, 100, [30, 30, 20, 20]).unwrap();
        GridState::new(
            spec,
            vec![Row::new(1, "Limits", 20.0), Row::new(2, "Derivatives", 20.0)],
        )
    }

    #[test]
    fn restore_fills_even_split() {
        let mut grid = two_topic_grid();
        grid.restore_defaults().unwrap();
        for row in grid.rows() {
            assert_eq!(row.percent, 50);
            assert_eq!(row.item_quota, 50);
            assert_eq!(row.cells, [15, 15, 10, 10]);
        }
        assert_eq!(grid.totals().columns, [30, 30, 20, 20]);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn restore_is_idempotent() {
        let spec = Specification::new(3, 37, [35, 25, 25, 15]).unwrap();
        let rows = vec![
            Row::new(1, "Sets", 3.0),
            Row::new(2, "Relations", 5.0),
            Row::new(3, "Functions", 4.0),
        ];
        let mut grid = GridState::new(spec, rows);
        grid.restore_defaults().unwrap();
        let first = grid.rows().to_vec();
        grid.restore_defaults().unwrap();
        assert_eq!(grid.rows(), first.as_slice());
    }

    #[test]
    fn restore_overwrites_edits() {
        let mut grid = two_topic_grid();
        grid.restore_defaults().unwrap();
        grid.edit_cell(1, CognitiveLevel::Knowledge, "40");
        grid.restore_defaults().unwrap();
        assert_eq!(grid.rows()[0].cells, [15, 15, 10, 10]);
    }

    #[test]
    fn restore_on_empty_grid_is_noop() {
        let spec = Specification::new(1, 10, [25, 25, 25, 25]).unwrap();
        let mut grid = GridState::new(spec, vec![]);
        assert!(grid.restore_defaults().is_ok());
        assert!(grid.rows().is_empty());
    }

    #[test]
    fn restore_without_hours_leaves_grid_untouched() {
        let spec = Specification::new(1, 10, [25, 25, 25, 25]).unwrap();
        let mut row = Row::new(1, "Unweighted", 0.0);
        row.cells = [1, 2, 3, 4];
        let notifier = Arc::new(RecordingNotifier::default());
        let mut grid = GridState::new(spec, vec![row.clone()]).with_notifier(notifier.clone());

        let err = grid.restore_defaults().unwrap_err();
        assert!(matches!(err, QuotaError::InvalidArgument(_)));
        assert_eq!(grid.rows(), &[row]);
        assert_eq!(notifier.last().map(|(level, _)| level), Some(NoticeLevel::Error));
    }

    #[test]
    fn restore_notifies_info() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut grid = two_topic_grid().with_notifier(notifier.clone());
        grid.restore_defaults().unwrap();
        assert_eq!(
            notifier.last(),
            Some((NoticeLevel::Info, RESTORED_MESSAGE.to_string()))
        );
    }

    #[test]
    fn edit_accepts_digits_only() {
        let mut grid = two_topic_grid();
        assert_eq!(
            grid.edit_cell(1, CognitiveLevel::Application, "12"),
            EditOutcome::Applied(12)
        );
        assert_eq!(grid.rows()[0].cell(CognitiveLevel::Application), 12);

        for bad in ["-3", "4.5", "abc", "1e3", " 7", "+2", "99999999999"] {
            assert_eq!(
                grid.edit_cell(1, CognitiveLevel::Application, bad),
                EditOutcome::Ignored(IgnoreReason::NotANumber),
                "input {bad:?}"
            );
        }
        assert_eq!(grid.rows()[0].cell(CognitiveLevel::Application), 12);
    }

    #[test]
    fn empty_edit_clears_cell() {
        let mut grid = two_topic_grid();
        grid.edit_cell(2, CognitiveLevel::Synthesis, "8");
        assert_eq!(grid.edit_cell(2, CognitiveLevel::Synthesis, ""), EditOutcome::Cleared);
        assert_eq!(grid.rows()[1].cell(CognitiveLevel::Synthesis), 0);
    }

    #[test]
    fn edit_unknown_row_is_ignored() {
        let mut grid = two_topic_grid();
        assert_eq!(
            grid.edit_cell(42, CognitiveLevel::Knowledge, "3"),
            EditOutcome::Ignored(IgnoreReason::UnknownRow)
        );
    }

    #[test]
    fn disabled_column_is_never_editable() {
        let spec = Specification::new(1, 20, [50, 50, 0, 0]).unwrap();
        let mut grid = GridState::new(spec, vec![Row::new(1, "Sets", 2.0)]);
        assert_eq!(
            grid.edit_cell(1, CognitiveLevel::Synthesis, "5"),
            EditOutcome::Ignored(IgnoreReason::DisabledColumn)
        );
        assert_eq!(grid.rows()[0].cell(CognitiveLevel::Synthesis), 0);
    }

    #[test]
    fn new_zeroes_disabled_cells() {
        let spec = Specification::new(1, 20, [50, 50, 0, 0]).unwrap();
        let mut row = Row::new(1, "Sets", 2.0);
        row.cells = [10, 8, 2, 1];
        let grid = GridState::new(spec, vec![row]);
        assert_eq!(grid.rows()[0].cells, [10, 8, 0, 0]);
    }

    #[tokio::test]
    async fn submit_persists_valid_grid() {
        let store = CountingStore::new(false);
        let notifier = Arc::new(RecordingNotifier::default());
        let mut grid = two_topic_grid().with_notifier(notifier.clone());
        grid.restore_defaults().unwrap();

        grid.submit(&store).await.unwrap();
        assert_eq!(store.saves.load(Ordering::Relaxed), 1);
        assert_eq!(
            notifier.last(),
            Some((NoticeLevel::Success, SAVED_MESSAGE.to_string()))
        );
    }

    #[tokio::test]
    async fn submit_rejects_column_off_by_six_without_saving() {
        let store = CountingStore::new(false);
        let notifier = Arc::new(RecordingNotifier::default());
        let mut grid = two_topic_grid().with_notifier(notifier.clone());
        grid.restore_defaults().unwrap();
        // shift 3 items per row from comprehension to knowledge: column off by 6
        grid.edit_cell(1, CognitiveLevel::Knowledge, "18");
        grid.edit_cell(1, CognitiveLevel::Comprehension, "12");
        grid.edit_cell(2, CognitiveLevel::Knowledge, "18");
        grid.edit_cell(2, CognitiveLevel::Comprehension, "12");
        let before = grid.rows().to_vec();

        let err = grid.submit(&store).await.unwrap_err();
        let report = err.validation_report().expect("tolerance failure");
        assert!(report.violations.iter().any(|v| matches!(
            v,
            ToleranceViolation::Column {
                level: CognitiveLevel::Knowledge,
                ..
            }
        )));
        assert_eq!(store.saves.load(Ordering::Relaxed), 0);
        assert_eq!(grid.rows(), before.as_slice());

        let (level, message) = notifier.last().unwrap();
        assert_eq!(level, NoticeLevel::Error);
        assert!(message.starts_with("Cannot submit: knowledge column"));
    }

    #[tokio::test]
    async fn max_valued_edits_block_submit() {
        let store = CountingStore::new(false);
        let mut grid = two_topic_grid();
        grid.restore_defaults().unwrap();
        assert_eq!(
            grid.edit_cell(1, CognitiveLevel::Knowledge, "4294967295"),
            EditOutcome::Applied(u32::MAX)
        );
        grid.edit_cell(2, CognitiveLevel::Knowledge, "1");

        let totals = grid.totals();
        assert_eq!(
            totals.column(CognitiveLevel::Knowledge),
            u64::from(u32::MAX) + 1
        );
        let report = grid.validate();
        assert!(matches!(
            report.violations.first(),
            Some(ToleranceViolation::GrandTotal { .. })
        ));
        assert!(matches!(
            report.row_violation(),
            Some(ToleranceViolation::Row { row_id: 1, .. })
        ));

        let err = grid.submit(&store).await.unwrap_err();
        assert!(err.validation_report().is_some());
        assert_eq!(store.saves.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn submit_surfaces_store_failure() {
        let store = CountingStore::new(true);
        let notifier = Arc::new(RecordingNotifier::default());
        let mut grid = two_topic_grid().with_notifier(notifier.clone());
        grid.restore_defaults().unwrap();

        let err = grid.submit(&store).await.unwrap_err();
        assert!(matches!(err, QuotaError::PersistenceFailure(ref m) if m.contains("connection refused")));
        assert_eq!(
            notifier.last(),
            Some((NoticeLevel::Error, SAVE_FAILED_MESSAGE.to_string()))
        );
    }

    #[tokio::test]
    async fn load_fetches_spec_and_rows() {
        let store = CountingStore::new(false);
        let grid = GridState::load(&store, 5).await.unwrap();
        assert_eq!(grid.specification().id, 5);
        assert_eq!(grid.rows().len(), 2);
        assert_eq!(grid.tolerance(), Tolerance::default());
    }
}
