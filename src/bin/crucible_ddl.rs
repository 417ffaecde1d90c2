//! crucible-ddl: Print the SQLite DDL for a table configuration
//!
//! Usage:
//!   # Print DDL for a config
//!   crucible-ddl schema.json
//!
//!   # Re-runnable DDL with a wider overflow column
//!   crucible-ddl schema.json --if-not-exists --overflow-type TEXT

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use crucible::{CompileConfig, ConfigLoader, SchemaCompiler};

#[derive(Parser, Debug)]
#[command(name = "crucible-ddl")]
#[command(about = "Compile a JSON table configuration into SQLite DDL", long_about = None)]
struct Args {
    /// Table configuration file
    #[arg(value_name = "CONFIG")]
    config: String,

    /// Emit CREATE TABLE IF NOT EXISTS
    #[arg(long)]
    if_not_exists: bool,

    /// Storage type of the overflow column (default: VARCHAR(5000))
    #[arg(long)]
    overflow_type: Option<String>,

    /// Storage type of junction table key columns (default: VARCHAR(100))
    #[arg(long)]
    junction_key_type: Option<String>,
}

fn main() -> Result<()> {
    crucible::logging::init("warn");
    let args = Args::parse();

    let mut config = CompileConfig {
        if_not_exists: args.if_not_exists,
        ..CompileConfig::default()
    };
    if let Some(overflow_type) = args.overflow_type {
        config.overflow_type = overflow_type;
    }
    if let Some(junction_key_type) = args.junction_key_type {
        config.junction_key_type = junction_key_type;
    }

    let schema = ConfigLoader::from_path(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config))?;
    let ddl = SchemaCompiler::new(config)
        .compile(&schema)
        .context("Failed to compile schema")?;

    print!("{}", ddl);
    Ok(())
}
