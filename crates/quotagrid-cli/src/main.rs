//! quotagrid CLI — fill, check and persist table-of-specification grids.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quotagrid",
    version,
    about = "Table-of-specification quota reconciler"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the default allocation for a grid file
    Restore {
        /// Path to a .toml grid file
        #[arg(long)]
        grid: PathBuf,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Lint grid files and check their cells against the tolerance rules
    Validate {
        /// Path to a grid file or directory
        #[arg(long)]
        grid: PathBuf,

        /// Maximum deviation in items (overrides the config)
        #[arg(long)]
        tolerance: Option<u32>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Fetch a grid from a store and print it
    Show {
        /// Specification ID
        #[arg(long)]
        id: u64,

        /// Store name from the config (default: default_store)
        #[arg(long)]
        store: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a grid file and persist its rows through a store
    Submit {
        /// Path to a .toml grid file
        #[arg(long)]
        grid: PathBuf,

        /// Store name from the config (default: default_store)
        #[arg(long)]
        store: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Recompute the default allocation before submitting
        #[arg(long)]
        restore: bool,

        /// Maximum deviation in items (overrides the config)
        #[arg(long)]
        tolerance: Option<u32>,
    },

    /// Create starter config and example grid
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quotagrid=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Restore { grid, format } => commands::restore::execute(grid, format),
        Commands::Validate {
            grid,
            tolerance,
            config,
        } => commands::validate::execute(grid, tolerance, config),
        Commands::Show { id, store, config } => commands::show::execute(id, store, config).await,
        Commands::Submit {
            grid,
            store,
            config,
            restore,
            tolerance,
        } => commands::submit::execute(grid, store, config, restore, tolerance).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
