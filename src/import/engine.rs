use crate::config::{Schema, Table};
use crate::error::ImportError;
use crate::import::row::record_to_row;
use crate::import::stream::for_each_element;
use crate::storage::{Storage, StorageTransaction};
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use walkdir::WalkDir;

/// Shared flag checked between files to stop an import early
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A file whose import was rolled back
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,

    /// Table the file mapped to, if it got that far
    pub table: Option<String>,

    pub error: ImportError,
}

/// Outcome of a directory import
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Rows inserted (or replaced) across all committed files
    pub rows: u64,

    /// Committed files that matched a table
    pub tables: u64,

    /// Array elements skipped because they were not objects
    pub skipped_elements: u64,

    pub failures: Vec<FileFailure>,

    /// Whether the walk stopped early on request
    pub cancelled: bool,
}

impl ImportSummary {
    /// True when every matched file committed and the walk ran to the end
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Inserted {} rows in {} tables", self.rows, self.tables)
    }
}

#[derive(Debug, Default)]
struct FileStats {
    rows: u64,
    skipped: u64,
}

/// Bulk-loads JSON array files into the tables of a `Schema`
pub struct ImportEngine<S> {
    schema: Arc<Schema>,
    storage: Arc<S>,
    cancel: CancellationToken,
}

impl<S: Storage> ImportEngine<S> {
    pub fn new(schema: Arc<Schema>, storage: Arc<S>) -> Self {
        ImportEngine {
            schema,
            storage,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that stops the walk before the next file when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Walk `base_dir` and import every file named after a table.
    ///
    /// Each file is loaded in its own transaction. A file that fails is
    /// rolled back and recorded in the summary; the walk carries on.
    pub fn import<P: AsRef<Path>>(&self, base_dir: P) -> Result<ImportSummary, ImportError> {
        let base_dir = base_dir.as_ref();
        if !base_dir.is_dir() {
            return Err(ImportError::MissingDirectory(base_dir.to_path_buf()));
        }

        tracing::info!(dir = %base_dir.display(), "starting import");
        let mut summary = ImportSummary::default();

        // Sorted walk keeps the import order stable between runs
        for entry in WalkDir::new(base_dir).sort_by_file_name() {
            if self.cancel.is_cancelled() {
                tracing::warn!("import cancelled");
                summary.cancelled = true;
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read directory entry");
                    summary.failures.push(FileFailure {
                        path: e.path().map(Path::to_path_buf).unwrap_or_default(),
                        table: None,
                        error: e.into(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            // Only files named after a declared table are loaded
            let path = entry.path();
            let Some(table) = self.matching_table(path) else {
                tracing::debug!(path = %path.display(), "no matching table, skipping");
                continue;
            };

            match self.import_file(path, table) {
                Ok(stats) => {
                    tracing::info!(
                        path = %path.display(),
                        table = %table.name,
                        rows = stats.rows,
                        "file imported"
                    );
                    summary.rows += stats.rows;
                    summary.tables += 1;
                    summary.skipped_elements += stats.skipped;
                }
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        table = %table.name,
                        error = %error,
                        "file import rolled back"
                    );
                    summary.failures.push(FileFailure {
                        path: path.to_path_buf(),
                        table: Some(table.name.clone()),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            rows = summary.rows,
            tables = summary.tables,
            failures = summary.failures.len(),
            "import finished"
        );
        Ok(summary)
    }

    fn matching_table(&self, path: &Path) -> Option<&Table> {
        let stem = path.file_stem()?.to_str()?;
        self.schema.table(stem)
    }

    /// Load one file inside a single transaction
    fn import_file(&self, path: &Path, table: &Table) -> Result<FileStats, ImportError> {
        let reader = BufReader::new(File::open(path)?);

        // Every row of the file lands in this one transaction
        let mut tx = self.storage.begin()?;
        let mut stats = FileStats::default();

        for_each_element(reader, |element| {
            let record = match element {
                Value::Object(record) => record,
                other => {
                    tracing::warn!(
                        path = %path.display(),
                        element = %other,
                        "skipping non-object element"
                    );
                    stats.skipped += 1;
                    return Ok(());
                }
            };

            // Declared fields become columns, the rest goes to overflow
            let row = record_to_row(table, record)?;
            tx.insert_or_replace(&table.name, &row)?;
            stats.rows += 1;
            Ok(())
        })?;

        // Any early return above drops `tx` and rolls the file back
        tx.commit()?;
        Ok(stats)
    }
}

impl<S> ImportEngine<S>
where
    S: Storage + Send + Sync + 'static,
{
    /// Run the import on a dedicated worker thread
    pub fn spawn(
        self,
        base_dir: PathBuf,
    ) -> std::io::Result<JoinHandle<Result<ImportSummary, ImportError>>> {
        std::thread::Builder::new()
            .name("crucible-import".to_string())
            .spawn(move || self.import(&base_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::ddl::SchemaCompiler;
    use crate::storage::SqliteStore;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (Arc<Schema>, Arc<SqliteStore>) {
        let schema = ConfigLoader::from_value(json!({
            "customers": {
                "id": {"type": "INTEGER", "pk": true},
                "name": {"type": "TEXT"}
            },
            "orders": {
                "id": {"type": "INTEGER", "pk": true},
                "total": {"type": "REAL"},
                "customer": {"type": "INTEGER", "references": "customers", "referencesOn": "id"}
            }
        }))
        .unwrap();

        let store = SqliteStore::open_in_memory().unwrap();
        let ddl = SchemaCompiler::default().compile(&schema).unwrap();
        store.execute(&ddl).unwrap();

        (Arc::new(schema), Arc::new(store))
    }

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_imports_matching_file() {
        let (schema, store) = setup();
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "orders.json",
            r#"[{"id": 1, "total": 10.0}, {"id": 2, "total": 3.5}, 42, {"id": 3}]"#,
        );

        let summary = ImportEngine::new(schema, store.clone())
            .import(dir.path())
            .unwrap();

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.tables, 1);
        assert_eq!(summary.skipped_elements, 1);
        assert!(summary.is_complete());
        assert_eq!(summary.to_string(), "Inserted 3 rows in 1 tables");
        assert_eq!(store.count_rows("orders").unwrap(), 3);
    }

    #[test]
    fn test_file_with_byte_order_mark() {
        let (schema, store) = setup();
        let dir = TempDir::new().unwrap();
        write(dir.path(), "customers.json", "\u{feff}[{\"id\": 1, \"name\": \"a\"}]");

        let summary = ImportEngine::new(schema, store.clone())
            .import(dir.path())
            .unwrap();

        assert!(summary.is_complete());
        assert_eq!(summary.to_string(), "Inserted 1 rows in 1 tables");
        assert_eq!(store.count_rows("customers").unwrap(), 1);
    }

    #[test]
    fn test_unknown_files_are_skipped() {
        let (schema, store) = setup();
        let dir = TempDir::new().unwrap();
        write(dir.path(), "unknownTable.json", r#"[{"id": 1}]"#);
        write(dir.path(), "README.md", "not json at all");

        let summary = ImportEngine::new(schema, store).import(dir.path()).unwrap();

        assert_eq!(summary.rows, 0);
        assert_eq!(summary.tables, 0);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_overflow_holds_unmapped_fields() {
        let (schema, store) = setup();
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "customers.json",
            r#"[{"id": 5, "name": "Ada", "email": "ada@example.com", "vip": true}]"#,
        );

        ImportEngine::new(schema, store.clone())
            .import(dir.path())
            .unwrap();

        let (name, extra): (String, String) = store.with_connection(|conn| {
            conn.query_row("SELECT name, extra FROM customers WHERE id = 5", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap()
        });
        assert_eq!(name, "Ada");
        let overflow: Value = serde_json::from_str(&extra).unwrap();
        assert_eq!(overflow, json!({"email": "ada@example.com", "vip": true}));
    }

    #[test]
    fn test_reimport_replaces_rows() {
        let (schema, store) = setup();
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "customers.json",
            r#"[{"id": 1, "name": "old"}, {"id": 2, "name": "b"}]"#,
        );

        let engine = ImportEngine::new(schema, store.clone());
        engine.import(dir.path()).unwrap();

        write(dir.path(), "customers.json", r#"[{"id": 1, "name": "new"}]"#);
        let summary = engine.import(dir.path()).unwrap();

        assert_eq!(summary.rows, 1);
        assert_eq!(store.count_rows("customers").unwrap(), 2);
        let name: String = store.with_connection(|conn| {
            conn.query_row("SELECT name FROM customers WHERE id = 1", [], |r| r.get(0))
                .unwrap()
        });
        assert_eq!(name, "new");
    }

    #[test]
    fn test_failed_file_rolls_back_and_walk_continues() {
        let (schema, store) = setup();
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "customers.json",
            r#"[{"id": 1, "name": "a"}, {"id": 2, "name": "#,
        );
        write(dir.path(), "orders.json", r#"[{"id": 1, "customer": 1}]"#);

        let summary = ImportEngine::new(schema, store.clone())
            .import(dir.path())
            .unwrap();

        assert_eq!(store.count_rows("customers").unwrap(), 0);
        assert_eq!(store.count_rows("orders").unwrap(), 1);
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.tables, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].table.as_deref(), Some("customers"));
        assert!(matches!(summary.failures[0].error, ImportError::Decode(_)));
    }

    #[test]
    fn test_storage_failure_is_isolated() {
        let (_, store) = setup();
        let schema = ConfigLoader::from_value(json!({
            "customers": {"id": {"type": "INTEGER", "pk": true}},
            "ghosts": {"id": {"type": "INTEGER"}}
        }))
        .unwrap();

        let dir = TempDir::new().unwrap();
        write(dir.path(), "customers.json", r#"[{"id": 1}]"#);
        write(dir.path(), "ghosts.json", r#"[{"id": 1}]"#);

        let summary = ImportEngine::new(Arc::new(schema), store)
            .import(dir.path())
            .unwrap();

        assert_eq!(summary.tables, 1);
        assert_eq!(summary.failures.len(), 1);
        assert!(matches!(summary.failures[0].error, ImportError::Storage(_)));
    }

    #[test]
    fn test_nested_directories_and_empty_files() {
        let (schema, store) = setup();
        let dir = TempDir::new().unwrap();
        write(dir.path(), "nested/deeper/orders.json", r#"[{"id": 9}]"#);
        write(dir.path(), "customers.txt", "[]");

        let summary = ImportEngine::new(schema, store).import(dir.path()).unwrap();

        assert_eq!(summary.rows, 1);
        assert_eq!(summary.tables, 2);
    }

    #[test]
    fn test_missing_directory() {
        let (schema, store) = setup();
        let err = ImportEngine::new(schema, store)
            .import("/no/such/import/dir")
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingDirectory(_)));
    }

    #[test]
    fn test_cancelled_import_stops_before_files() {
        let (schema, store) = setup();
        let dir = TempDir::new().unwrap();
        write(dir.path(), "orders.json", r#"[{"id": 1}]"#);

        let token = CancellationToken::new();
        token.cancel();
        let summary = ImportEngine::new(schema, store.clone())
            .with_cancellation(token)
            .import(dir.path())
            .unwrap();

        assert!(summary.cancelled);
        assert!(!summary.is_complete());
        assert_eq!(store.count_rows("orders").unwrap(), 0);
    }

    #[test]
    fn test_spawned_import() {
        let (schema, store) = setup();
        let dir = TempDir::new().unwrap();
        write(dir.path(), "orders.json", r#"[{"id": 1}, {"id": 2}]"#);

        let handle = ImportEngine::new(schema, store.clone())
            .spawn(dir.path().to_path_buf())
            .unwrap();
        let summary = handle.join().unwrap().unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(store.count_rows("orders").unwrap(), 2);
    }
}
