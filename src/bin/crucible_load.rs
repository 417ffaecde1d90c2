//! crucible-load: Create tables from a configuration and import a directory
//!
//! Usage:
//!   # Create tables and load every matching file under ./data
//!   crucible-load --config schema.json --database app.db ./data
//!
//!   # Tables already exist: just import
//!   crucible-load --config schema.json --database app.db --skip-ddl ./data

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use crucible::{CompileConfig, ConfigLoader, ImportEngine, SchemaCompiler, SqliteStore, Storage};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "crucible-load")]
#[command(about = "Load directories of JSON array files into SQLite", long_about = None)]
struct Args {
    /// Directory to walk for <table>.json files
    #[arg(value_name = "DATA_DIR")]
    data_dir: PathBuf,

    /// Table configuration file
    #[arg(long, short = 'c')]
    config: PathBuf,

    /// SQLite database file (created if missing)
    #[arg(long, short = 'd')]
    database: PathBuf,

    /// Don't execute DDL before importing
    #[arg(long)]
    skip_ddl: bool,

    /// Emit CREATE TABLE IF NOT EXISTS so reruns against the same database work
    #[arg(long)]
    if_not_exists: bool,

    /// Enforce foreign keys while inserting (files must then load parents first)
    #[arg(long)]
    enforce_foreign_keys: bool,
}

fn main() -> Result<()> {
    crucible::logging::init("info");
    let args = Args::parse();

    // Load and validate the table configuration
    let schema = ConfigLoader::from_path(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;

    // Open the target database
    let store = SqliteStore::open(&args.database)
        .with_context(|| format!("Failed to open database {}", args.database.display()))?;
    store.enforce_foreign_keys(args.enforce_foreign_keys)?;

    // Create tables unless told to skip
    if !args.skip_ddl {
        let config = CompileConfig {
            if_not_exists: args.if_not_exists,
            ..CompileConfig::default()
        };
        let ddl = SchemaCompiler::new(config).compile(&schema)?;
        store.execute(&ddl).context("Failed to create tables")?;
    }

    // Import every matching file under the data directory
    let store = Arc::new(store);
    let summary = ImportEngine::new(Arc::new(schema), store.clone())
        .import(&args.data_dir)
        .with_context(|| format!("Failed to import {}", args.data_dir.display()))?;

    // Report results
    println!("{}", summary);
    for failure in &summary.failures {
        eprintln!("  failed: {} ({})", failure.path.display(), failure.error);
    }

    if let Ok(store) = Arc::try_unwrap(store) {
        store.close()?;
    }

    if !summary.is_complete() {
        std::process::exit(1);
    }
    Ok(())
}
