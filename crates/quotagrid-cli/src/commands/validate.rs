//! The `quotagrid validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quotagrid_core::grid::GridState;
use quotagrid_core::parser::{lint_grid, load_grid_directory, parse_grid_file};

use super::{config, tolerance};

pub fn execute(
    grid_path: PathBuf,
    tolerance_flag: Option<u32>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = config(config_path.as_deref())?;
    let tolerance = tolerance(tolerance_flag, &config);

    let grids = if grid_path.is_dir() {
        load_grid_directory(&grid_path)?
    } else {
        vec![parse_grid_file(&grid_path)?]
    };

    let mut total_warnings = 0;
    let mut failed = 0;

    for file in grids {
        let warnings = lint_grid(&file);
        let grid = GridState::new(file.specification, file.rows).with_tolerance(tolerance);
        let spec = grid.specification();
        println!(
            "Specification {}: {} items, {} rows",
            spec.id,
            spec.total_items,
            grid.rows().len()
        );

        for w in &warnings {
            let prefix = w
                .row_id
                .map(|id| format!("  [row {id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();

        let report = grid.validate();
        for violation in &report.violations {
            println!("  VIOLATION: {violation}");
        }
        if !report.is_ok() {
            failed += 1;
        }
    }

    if total_warnings > 0 {
        println!("\n{total_warnings} warning(s) found.");
    }
    if failed > 0 {
        anyhow::bail!("{failed} grid(s) exceed the {tolerance} tolerance");
    }
    println!("All grids within {tolerance} tolerance.");

    Ok(())
}
