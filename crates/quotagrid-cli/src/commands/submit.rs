//! The `quotagrid submit` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use quotagrid_core::grid::GridState;
use quotagrid_core::parser::parse_grid_file;
use quotagrid_store::create_store;

use super::{config, tolerance, ConsoleNotifier};

pub async fn execute(
    grid_path: PathBuf,
    store_name: Option<String>,
    config_path: Option<PathBuf>,
    restore: bool,
    tolerance_flag: Option<u32>,
) -> Result<()> {
    let config = config(config_path.as_deref())?;
    let (name, store_config) = config.store(store_name.as_deref())?;
    let store = create_store(store_config)?;

    let file = parse_grid_file(&grid_path)?;
    let mut grid = GridState::new(file.specification, file.rows)
        .with_tolerance(tolerance(tolerance_flag, &config))
        .with_notifier(Arc::new(ConsoleNotifier));

    if restore {
        grid.restore_defaults()?;
    }

    tracing::info!(
        spec_id = grid.specification().id,
        store = name,
        rows = grid.rows().len(),
        "submitting grid"
    );
    grid.submit(store.as_ref()).await?;

    Ok(())
}
