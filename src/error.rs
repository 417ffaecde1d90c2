//! Error types for each stage of the pipeline
//!
//! Configuration and compilation errors are fatal to the caller. Import errors
//! are scoped to a single input file unless stated otherwise.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a configuration document into a `Schema`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config has an unexpected shape: {0}")]
    Shape(String),

    #[error("config does not declare any tables")]
    Empty,

    #[error("invalid column {table}.{column}: {reason}")]
    Column {
        table: String,
        column: String,
        reason: String,
    },

    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    /// Two tables (declared or junction) whose names only differ in case, or
    /// not at all
    #[error("table name `{name}` conflicts with `{existing}`")]
    NameConflict { name: String, existing: String },
}

/// Errors raised by the DDL compiler
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema has not been properly initialized: no tables loaded")]
    Uninitialized,
}

/// Errors from the underlying storage engine
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("row for table {table} has no columns")]
    EmptyRow { table: String },
}

/// Errors raised while importing data files
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("import directory does not exist: {0}")]
    MissingDirectory(PathBuf),
}

/// Umbrella error for callers driving the whole pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Import(#[from] ImportError),
}

pub type Result<T> = std::result::Result<T, Error>;
