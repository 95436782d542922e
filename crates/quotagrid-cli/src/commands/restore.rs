//! The `quotagrid restore` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use quotagrid_core::grid::GridState;
use quotagrid_core::model::{Row, Specification};
use quotagrid_core::parser::parse_grid_file;
use quotagrid_core::totals::Totals;
use quotagrid_core::traits::TracingNotifier;

use super::{grid_table, ConsoleNotifier};

#[derive(Serialize)]
struct RestoreOutput<'a> {
    specification: &'a Specification,
    rows: &'a [Row],
    totals: Totals,
}

pub fn execute(grid_path: PathBuf, format: String) -> Result<()> {
    let file = parse_grid_file(&grid_path)?;
    let mut grid = GridState::new(file.specification, file.rows);

    match format.as_str() {
        "json" => {
            // keep stdout parseable
            grid = grid.with_notifier(Arc::new(TracingNotifier));
            grid.restore_defaults()
                .with_context(|| format!("cannot restore {}", grid_path.display()))?;
            let output = RestoreOutput {
                specification: grid.specification(),
                rows: grid.rows(),
                totals: grid.totals(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "table" => {
            grid = grid.with_notifier(Arc::new(ConsoleNotifier));
            grid.restore_defaults()
                .with_context(|| format!("cannot restore {}", grid_path.display()))?;
            println!("{}", grid_table(&grid));
        }
        other => anyhow::bail!("unknown format: {other} (expected table or json)"),
    }

    Ok(())
}
