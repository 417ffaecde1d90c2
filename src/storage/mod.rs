//! Storage primitives consumed by the import engine
//!
//! A `Storage` executes DDL and hands out one transaction at a time. A
//! transaction that is dropped without `commit` is rolled back.

pub mod sqlite;

pub use sqlite::{SqliteStore, SqliteTransaction};

use crate::error::StorageError;

/// A single column value bound into an insert
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// An ordered set of column values destined for one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<(String, FieldValue)>,
}

impl Row {
    pub fn new() -> Self {
        Row { values: Vec::new() }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: FieldValue) {
        self.values.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.values.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A storage engine able to run DDL and transactional inserts
pub trait Storage {
    type Transaction<'a>: StorageTransaction
    where
        Self: 'a;

    /// Execute one or more SQL statements verbatim
    fn execute(&self, sql: &str) -> Result<(), StorageError>;

    /// Start a transaction; no other writer runs until it is committed or dropped
    fn begin(&self) -> Result<Self::Transaction<'_>, StorageError>;
}

/// An open transaction. Dropping it without `commit` rolls it back.
pub trait StorageTransaction {
    /// Insert a row, overwriting any existing row with the same key
    fn insert_or_replace(&mut self, table: &str, row: &Row) -> Result<(), StorageError>;

    fn commit(self) -> Result<(), StorageError>;
}
