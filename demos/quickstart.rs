/// Quickstart example - config to DDL to a loaded database
use crucible::{CompileConfig, ConfigLoader, ImportEngine, SchemaCompiler, SqliteStore, Storage};
use serde_json::json;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    println!("=== Crucible Quick Start ===\n");

    // Step 1: Describe your tables
    let schema = ConfigLoader::from_value(json!({
        "authors": {
            "id": {"type": "INTEGER", "pk": true},
            "name": {"type": "TEXT"}
        },
        "books": {
            "isbn": {"type": "TEXT", "pk": true},
            "title": {"type": "TEXT"},
            "author": {"type": "INTEGER", "references": "authors", "referencesOn": "id"}
        }
    }))?;

    // Step 2: Compile it into DDL
    let ddl = SchemaCompiler::new(CompileConfig::default()).compile(&schema)?;
    println!("Generated DDL:\n{}", ddl);

    // Step 3: Drop some data files into a directory
    let data_dir = tempfile::tempdir()?;
    std::fs::write(
        data_dir.path().join("authors.json"),
        serde_json::to_string(&json!([
            {"id": 1, "name": "Le Guin", "born": 1929},
            {"id": 2, "name": "Herbert"}
        ]))?,
    )?;
    std::fs::write(
        data_dir.path().join("books.json"),
        serde_json::to_string(&json!([
            {"isbn": "978-0", "title": "The Dispossessed", "author": 1},
            {"isbn": "978-1", "title": "Dune", "author": 2, "pages": 412}
        ]))?,
    )?;

    // Step 4: Create the tables and import
    let store = Arc::new(SqliteStore::open_in_memory()?);
    store.execute(&ddl)?;
    let summary = ImportEngine::new(Arc::new(schema), store.clone()).import(data_dir.path())?;
    println!("{}\n", summary);

    // Step 5: Look at what we got
    let rows = store.with_connection(|conn| -> rusqlite::Result<Vec<(String, Option<String>)>> {
        let mut stmt = conn.prepare(r#"SELECT "title", "extra" FROM "books" ORDER BY "isbn""#)?;
        let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
        rows.collect()
    })?;
    for (title, extra) in rows {
        println!("  • {:<20} extra = {}", title, extra.unwrap_or_default());
    }

    Ok(())
}
