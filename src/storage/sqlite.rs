//! SQLite-backed storage

use crate::ddl::quote_identifier;
use crate::error::StorageError;
use crate::storage::{FieldValue, Row, Storage, StorageTransaction};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            FieldValue::Integer(i) => ToSqlOutput::from(*i),
            FieldValue::Real(f) => ToSqlOutput::from(*f),
            FieldValue::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

/// A SQLite database shared behind a mutex so only one writer is active
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "opening SQLite database");
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Toggle foreign-key enforcement. Off by default, so files may be
    /// imported in any order.
    pub fn enforce_foreign_keys(&self, enabled: bool) -> Result<(), StorageError> {
        let value = if enabled { "ON" } else { "OFF" };
        self.conn.lock().pragma_update(None, "foreign_keys", value)?;
        Ok(())
    }

    /// Run a read-only closure against the underlying connection
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Number of rows currently stored in `table`
    pub fn count_rows(&self, table: &str) -> Result<i64, StorageError> {
        let conn = self.conn.lock();
        let sql = format!("SELECT count(*) FROM {}", quote_identifier(table));
        let count = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    /// Close the database, surfacing any error from the final flush
    pub fn close(self) -> Result<(), StorageError> {
        tracing::info!("closing SQLite database");
        self.conn
            .into_inner()
            .close()
            .map_err(|(_, e)| StorageError::Sqlite(e))
    }
}

impl Storage for SqliteStore {
    type Transaction<'a> = SqliteTransaction<'a>;

    fn execute(&self, sql: &str) -> Result<(), StorageError> {
        tracing::debug!("executing SQL batch");
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }

    fn begin(&self) -> Result<SqliteTransaction<'_>, StorageError> {
        let conn = self.conn.lock();
        conn.execute_batch("BEGIN")?;
        Ok(SqliteTransaction {
            conn,
            finished: false,
        })
    }
}

/// A transaction holding the connection lock until commit or drop
pub struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl StorageTransaction for SqliteTransaction<'_> {
    fn insert_or_replace(&mut self, table: &str, row: &Row) -> Result<(), StorageError> {
        if row.is_empty() {
            return Err(StorageError::EmptyRow {
                table: table.to_string(),
            });
        }

        let columns: Vec<String> = row.columns().map(quote_identifier).collect();
        let placeholders: Vec<String> = (1..=row.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        stmt.execute(params_from_iter(row.values()))?;
        Ok(())
    }

    fn commit(mut self) -> Result<(), StorageError> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!(error = %e, "rollback failed");
        }
    }
}
