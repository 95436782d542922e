//! The `quotagrid show` command.

use std::path::PathBuf;

use anyhow::Result;

use quotagrid_core::grid::GridState;
use quotagrid_store::create_store;

use super::{config, grid_table};

pub async fn execute(id: u64, store_name: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = config(config_path.as_deref())?;
    let (name, store_config) = config.store(store_name.as_deref())?;
    let store = create_store(store_config)?;

    let grid = GridState::load(store.as_ref(), id)
        .await?
        .with_tolerance(config.tolerance);

    println!("Specification {id} from store '{name}'");
    println!("{}", grid_table(&grid));

    let report = grid.validate();
    if report.is_ok() {
        println!("All totals within {} tolerance.", grid.tolerance());
    } else {
        println!("Not submittable: {}", report.summary());
    }

    Ok(())
}
