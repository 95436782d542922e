pub mod init;
pub mod restore;
pub mod show;
pub mod submit;
pub mod validate;

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Color, Table};

use quotagrid_core::grid::GridState;
use quotagrid_core::model::CognitiveLevel;
use quotagrid_core::totals::Deviation;
use quotagrid_core::traits::{NoticeLevel, Notifier};
use quotagrid_core::validate::Tolerance;
use quotagrid_store::{load_config, QuotagridConfig};

/// Prints notices on the console.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => println!("{message}"),
            NoticeLevel::Error => eprintln!("{message}"),
        }
    }
}

/// Load the config from an explicit path or the default locations.
pub fn config(path: Option<&Path>) -> Result<QuotagridConfig> {
    match path {
        Some(p) => quotagrid_store::config::load_config_from(Some(p)),
        None => load_config(),
    }
}

/// The `--tolerance` flag wins over the config value.
pub fn tolerance(flag: Option<u32>, config: &QuotagridConfig) -> Tolerance {
    flag.map(Tolerance::new).unwrap_or(config.tolerance)
}

fn deviation_cell(text: String, deviation: Deviation) -> Cell {
    match deviation {
        Deviation::Exact => Cell::new(text),
        Deviation::WithinTolerance => Cell::new(text).fg(Color::Yellow),
        Deviation::Exceeded => Cell::new(text).fg(Color::Red),
    }
}

/// Render the grid with a totals row and an expected row.
pub fn grid_table(grid: &GridState) -> Table {
    let spec = grid.specification();
    let tolerance = grid.tolerance();

    let mut table = Table::new();
    let mut header = vec![
        "ID".to_string(),
        "Topic".to_string(),
        "Hours".to_string(),
        "%".to_string(),
        "Items".to_string(),
    ];
    header.extend(
        CognitiveLevel::ALL
            .iter()
            .map(|l| format!("{l} ({}%)", spec.column_percentages[l.index()])),
    );
    header.push("Row Total".to_string());
    table.set_header(header);

    for row in grid.rows() {
        let mut cells = vec![
            Cell::new(row.id),
            Cell::new(&row.topic),
            Cell::new(row.hours),
            Cell::new(row.percent),
            Cell::new(row.item_quota),
        ];
        for level in CognitiveLevel::ALL {
            cells.push(if spec.is_disabled(level) {
                Cell::new("-")
            } else {
                Cell::new(row.cell(level))
            });
        }
        cells.push(deviation_cell(
            row.cell_total().to_string(),
            Deviation::classify(row.cell_total(), row.item_quota, tolerance),
        ));
        table.add_row(cells);
    }

    let totals = grid.totals();
    let mut total_row = vec![
        Cell::new(""),
        Cell::new("Total"),
        Cell::new(totals.hours),
        Cell::new(totals.percent),
        deviation_cell(
            totals.item_quotas.to_string(),
            Deviation::classify(totals.item_quotas, spec.total_items, tolerance),
        ),
    ];
    for level in CognitiveLevel::ALL {
        total_row.push(deviation_cell(
            totals.column(level).to_string(),
            totals.column_deviation(spec, level, tolerance),
        ));
    }
    total_row.push(deviation_cell(
        totals.grand.to_string(),
        totals.grand_deviation(spec, tolerance),
    ));
    table.add_row(total_row);

    let mut expected_row = vec![
        Cell::new(""),
        Cell::new("Expected"),
        Cell::new(""),
        Cell::new(100),
        Cell::new(spec.total_items),
    ];
    expected_row.extend(spec.column_expected.iter().map(|e| Cell::new(e)));
    expected_row.push(Cell::new(spec.total_items));
    table.add_row(expected_row);

    table
}
