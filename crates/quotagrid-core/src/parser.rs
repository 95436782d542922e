//! TOML grid file parser.
//!
//! Loads grid files (a specification plus its rows) from disk or directories,
//! and lints them for issues that do not block editing.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{CognitiveLevel, Row, Specification, LEVEL_COUNT};
use crate::quota::column_targets;

/// Knowledge-level share above which the grid is flagged.
const KNOWLEDGE_CAP: u32 = 50;

/// A specification and its rows as read from a grid file.
#[derive(Debug, Clone, PartialEq)]
pub struct GridFile {
    pub specification: Specification,
    pub rows: Vec<Row>,
}

/// Intermediate TOML structure for parsing grid files.
#[derive(Debug, Deserialize)]
struct TomlGridFile {
    specification: TomlSpecification,
    #[serde(default)]
    rows: Vec<TomlRow>,
}

#[derive(Debug, Deserialize)]
struct TomlSpecification {
    #[serde(default = "default_id")]
    id: u64,
    total_items: u32,
    percentages: [u32; LEVEL_COUNT],
    #[serde(default)]
    expected: Option<[u32; LEVEL_COUNT]>,
}

fn default_id() -> u64 {
    1
}

#[derive(Debug, Deserialize)]
struct TomlRow {
    id: u64,
    topic: String,
    #[serde(default)]
    hours: f64,
    #[serde(default)]
    percent: u32,
    #[serde(default)]
    item_quota: u32,
    #[serde(default)]
    cells: [u32; LEVEL_COUNT],
}

/// Parse a single grid file.
pub fn parse_grid_file(path: &Path) -> Result<GridFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read grid file: {}", path.display()))?;

    parse_grid_str(&content, path)
}

/// Parse a TOML string into a [`GridFile`].
pub fn parse_grid_str(content: &str, source_path: &Path) -> Result<GridFile> {
    let parsed: TomlGridFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let header = parsed.specification;
    let mut specification = Specification::new(header.id, header.total_items, header.percentages)
        .with_context(|| format!("invalid specification in {}", source_path.display()))?;
    if let Some(expected) = header.expected {
        specification = specification.with_expected(expected);
    }

    let rows = parsed
        .rows
        .into_iter()
        .map(|r| Row {
            id: r.id,
            topic: r.topic,
            hours: r.hours,
            percent: r.percent,
            item_quota: r.item_quota,
            cells: r.cells,
        })
        .collect();

    Ok(GridFile {
        specification,
        rows,
    })
}

/// Recursively load all `.toml` grid files from a directory.
pub fn load_grid_directory(dir: &Path) -> Result<Vec<GridFile>> {
    let mut grids = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            grids.extend(load_grid_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_grid_file(&path) {
                Ok(grid) => grids.push(grid),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(grids)
}

/// A non-blocking issue found in a grid file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    /// The row the warning is about, if any.
    pub row_id: Option<u64>,
    pub message: String,
}

impl LintWarning {
    fn grid(message: impl Into<String>) -> Self {
        Self {
            row_id: None,
            message: message.into(),
        }
    }

    fn row(row_id: u64, message: impl Into<String>) -> Self {
        Self {
            row_id: Some(row_id),
            message: message.into(),
        }
    }
}

/// Check a grid for common authoring mistakes.
pub fn lint_grid(grid: &GridFile) -> Vec<LintWarning> {
    let spec = &grid.specification;
    let mut warnings = Vec::new();

    let pct_sum: u64 = spec.column_percentages.iter().map(|&p| u64::from(p)).sum();
    if pct_sum != 100 {
        warnings.push(LintWarning::grid(format!(
            "column percentages sum to {pct_sum}, not 100"
        )));
    }

    let knowledge = spec.column_percentages[CognitiveLevel::Knowledge.index()];
    if knowledge > KNOWLEDGE_CAP {
        warnings.push(LintWarning::grid(format!(
            "knowledge percentage {knowledge} exceeds {KNOWLEDGE_CAP}"
        )));
    }

    match column_targets(&spec.column_percentages, spec.total_items) {
        Ok(derived) if derived != spec.column_expected => {
            warnings.push(LintWarning::grid(format!(
                "stored expected {:?} differs from derived {:?}",
                spec.column_expected, derived
            )));
        }
        Ok(_) => {}
        Err(e) => warnings.push(LintWarning::grid(e.to_string())),
    }

    let expected_sum: u64 = spec.column_expected.iter().map(|&e| u64::from(e)).sum();
    if expected_sum != u64::from(spec.total_items) {
        warnings.push(LintWarning::grid(format!(
            "expected column totals sum to {expected_sum}, not {} items",
            spec.total_items
        )));
    }

    if grid.rows.is_empty() {
        warnings.push(LintWarning::grid("grid has no rows"));
    }

    let mut seen_ids = HashSet::new();
    for row in &grid.rows {
        if !seen_ids.insert(row.id) {
            warnings.push(LintWarning::row(row.id, format!("duplicate row ID: {}", row.id)));
        }
    }

    for row in &grid.rows {
        if row.topic.trim().is_empty() {
            warnings.push(LintWarning::row(row.id, "topic is empty"));
        }
        if !row.hours.is_finite() || row.hours < 0.0 {
            warnings.push(LintWarning::row(
                row.id,
                format!("hours must be a non-negative number, got {}", row.hours),
            ));
        } else if row.hours == 0.0 {
            warnings.push(LintWarning::row(row.id, "zero hours; row will receive no items"));
        }
        for level in CognitiveLevel::ALL {
            if spec.is_disabled(level) && row.cell(level) != 0 {
                warnings.push(LintWarning::row(
                    row.id,
                    format!("{level} column is disabled but holds {}", row.cell(level)),
                ));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[specification]
id = 12
total_items = 100
percentages = [30, 30, 20, 20]

[[rows]]
id = 1
topic = "Limits"
hours = 20.0

[[rows]]
id = 2
topic = "Derivatives"
hours = 20.0
cells = [15, 15, 10, 10]
item_quota = 50
percent = 50
"#;

    fn parse(content: &str) -> GridFile {
        parse_grid_str(content, &PathBuf::from("test.toml")).unwrap()
    }

    #[test]
    fn parse_valid_toml() {
        let grid = parse(VALID_TOML);
        assert_eq!(grid.specification.id, 12);
        assert_eq!(grid.specification.column_expected, [30, 30, 20, 20]);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0].cells, [0; LEVEL_COUNT]);
        assert_eq!(grid.rows[1].cells, [15, 15, 10, 10]);
        assert_eq!(grid.rows[1].item_quota, 50);
        assert!(lint_grid(&grid).is_empty());
    }

    #[test]
    fn stored_expected_overrides_derived() {
        let toml = r#"
[specification]
total_items = 10
percentages = [40, 30, 20, 10]
expected = [5, 2, 2, 1]

[[rows]]
id = 1
topic = "Sets"
hours = 1.0
"#;
        let grid = parse(toml);
        assert_eq!(grid.specification.id, 1);
        assert_eq!(grid.specification.column_expected, [5, 2, 2, 1]);
        let warnings = lint_grid(&grid);
        assert!(warnings.iter().any(|w| w.message.contains("differs from derived")));
    }

    #[test]
    fn lint_flags_percentages_and_knowledge_cap() {
        let toml = r#"
[specification]
total_items = 20
percentages = [60, 20, 10, 0]

[[rows]]
id = 1
topic = "Sets"
hours = 2.0
"#;
        let warnings = lint_grid(&parse(toml));
        assert!(warnings.iter().any(|w| w.message.contains("sum to 90")));
        assert!(warnings.iter().any(|w| w.message.contains("exceeds 50")));
    }

    #[test]
    fn lint_flags_rows() {
        let toml = r#"
[specification]
total_items = 20
percentages = [50, 50, 0, 0]

[[rows]]
id = 1
topic = "Sets"
hours = 2.0
cells = [1, 1, 3, 0]

[[rows]]
id = 1
topic = "  "
hours = 0.0
"#;
        let warnings = lint_grid(&parse(toml));
        assert!(warnings.iter().any(|w| w.message.contains("duplicate row ID")));
        assert!(warnings.iter().any(|w| w.message == "topic is empty"));
        assert!(warnings.iter().any(|w| w.message.contains("zero hours")));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("application column is disabled")));
        assert!(warnings.iter().all(|w| w.row_id == Some(1)));
    }

    #[test]
    fn all_disabled_columns_fail_to_parse() {
        let toml = r#"
[specification]
total_items = 20
percentages = [0, 0, 0, 0]
"#;
        let err = parse_grid_str(toml, &PathBuf::from("zero.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("invalid specification"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_grid_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[specification]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let grids = load_grid_directory(dir.path()).unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].specification.id, 12);
    }

    #[test]
    fn load_directory_rejects_file_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_grid_directory(file.path()).is_err());
    }
}
