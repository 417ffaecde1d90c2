//! # Crucible - JSON schema config to SQLite
//!
//! Turns a declarative JSON table description into SQLite DDL, then bulk-loads
//! directories of JSON array files into the tables it created. Fields that are
//! not declared as columns are preserved as JSON text in an `extra` column.
//!
//! ## Modules
//!
//! - **config**: Parse the table description into an immutable `Schema`
//! - **ddl**: Render `CREATE TABLE` statements, including junction tables
//! - **import**: Walk a directory and load matching files, one transaction per file
//! - **storage**: The storage primitive and its SQLite implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use crucible::{CompileConfig, ConfigLoader, SqliteStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = ConfigLoader::from_value(json!({
//!     "customers": {
//!         "id": {"type": "INTEGER", "pk": true},
//!         "name": {"type": "TEXT"}
//!     }
//! }))?;
//!
//! let dir = tempfile::tempdir()?;
//! std::fs::write(dir.path().join("customers.json"), r#"[{"id": 1, "name": "Ada", "vip": true}]"#)?;
//!
//! let store = Arc::new(SqliteStore::open_in_memory()?);
//! let summary = crucible::load_directory(
//!     Arc::new(schema),
//!     store,
//!     dir.path(),
//!     &CompileConfig::default(),
//! )?;
//!
//! assert_eq!(summary.to_string(), "Inserted 1 rows in 1 tables");
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

pub mod config;
pub mod ddl;
pub mod error;
pub mod import;
pub mod logging;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{ConfigLoader, Schema, Table, OVERFLOW_COLUMN};
pub use ddl::{CompileConfig, SchemaCompiler};
pub use error::{ConfigError, Error, ImportError, Result, SchemaError, StorageError};
pub use import::{CancellationToken, ImportEngine, ImportSummary};
pub use storage::{SqliteStore, Storage};

/// Main entry point: create the schema's tables, then import `data_dir`
pub fn load_directory<S: Storage>(
    schema: Arc<Schema>,
    storage: Arc<S>,
    data_dir: &Path,
    config: &CompileConfig,
) -> Result<ImportSummary> {
    let ddl = SchemaCompiler::new(config.clone()).compile(&schema)?;
    storage.execute(&ddl)?;

    let summary = ImportEngine::new(schema, storage).import(data_dir)?;
    Ok(summary)
}
