//! The `quotagrid init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("quotagrid.toml").exists() {
        println!("quotagrid.toml already exists, skipping.");
    } else {
        std::fs::write("quotagrid.toml", SAMPLE_CONFIG)?;
        println!("Created quotagrid.toml");
    }

    std::fs::create_dir_all("grids")?;
    let example_path = Path::new("grids/example.toml");
    if example_path.exists() {
        println!("grids/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_GRID)?;
        println!("Created grids/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit quotagrid.toml with your API base URL");
    println!("  2. Run: quotagrid restore --grid grids/example.toml");
    println!("  3. Run: quotagrid validate --grid grids/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quotagrid configuration

default_store = "local"
tolerance = 5

[stores.local]
type = "file"
dir = "./quotagrid-data"

[stores.api]
type = "http"
base_url = "http://localhost:8000/api"
token = "${QUOTAGRID_API_TOKEN}"
role = "BAYANIHAN_LEADER"
"#;

const EXAMPLE_GRID: &str = r#"[specification]
id = 1
total_items = 50
percentages = [30, 30, 20, 20]

[[rows]]
id = 1
topic = "Number systems"
hours = 6.0
percent = 22
item_quota = 11
cells = [3, 3, 2, 3]

[[rows]]
id = 2
topic = "Linear equations"
hours = 9.0
percent = 33
item_quota = 17
cells = [5, 5, 4, 3]

[[rows]]
id = 3
topic = "Quadratic functions"
hours = 12.0
percent = 45
item_quota = 22
cells = [7, 7, 4, 4]
"#;
