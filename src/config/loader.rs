//! Configuration parsing
//!
//! A configuration is a JSON object keyed by table name. Each table maps
//! column names to descriptors:
//!
//! ```json
//! {
//!   "customers": { "id": { "type": "INTEGER", "pk": true } },
//!   "orders": {
//!     "id": { "type": "INTEGER", "pk": true },
//!     "customer": { "type": "INTEGER", "references": "customers", "referencesOn": "id" }
//!   }
//! }
//! ```
//!
//! Every descriptor is decoded and classified up front; nothing partially
//! built ever escapes a failed load.

use crate::config::types::{
    Column, ColumnKind, Constraint, ManyOnConstraint, Schema, Table, OVERFLOW_COLUMN,
};
use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Raw column descriptor as it appears in the config file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Descriptor {
    #[serde(rename = "type")]
    sql_type: Option<String>,
    pk: Option<bool>,
    references: Option<String>,
    #[serde(rename = "referencesOn")]
    references_on: Option<String>,
    #[serde(rename = "manyOn")]
    many_on: Option<String>,
}

impl Descriptor {
    fn classify(self) -> Result<ColumnKind, String> {
        match (self.references, self.many_on) {
            (None, None) => {
                let sql_type = self.sql_type.ok_or("missing `type`")?;
                Ok(ColumnKind::Column(Column {
                    sql_type,
                    pk: self.pk.unwrap_or(false),
                }))
            }
            (None, Some(_)) => Err("`manyOn` requires `references`".to_string()),
            (Some(references), None) => {
                let references_on = self
                    .references_on
                    .ok_or("`references` requires `referencesOn`")?;
                let sql_type = self.sql_type.ok_or("missing `type`")?;
                Ok(ColumnKind::Constraint(Constraint {
                    references,
                    references_on,
                    column: Column {
                        sql_type,
                        pk: self.pk.unwrap_or(false),
                    },
                }))
            }
            (Some(references), Some(many_on)) => {
                let references_on = self
                    .references_on
                    .ok_or("`references` requires `referencesOn`")?;
                Ok(ColumnKind::ManyOn(ManyOnConstraint {
                    references,
                    references_on,
                    many_on,
                }))
            }
        }
    }
}

/// Builds a `Schema` from a configuration document
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read and parse a config file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Schema, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loading schema config");
        Self::from_str(&text)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Schema, ConfigError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Build a schema from an already-decoded JSON value
    pub fn from_value(value: Value) -> Result<Schema, ConfigError> {
        let config = match value {
            Value::Object(config) => config,
            other => {
                return Err(ConfigError::Shape(format!(
                    "top level must be an object, found {}",
                    type_name(&other)
                )))
            }
        };

        if config.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut tables = BTreeMap::new();
        for (table_name, columns) in config {
            let table = Self::parse_table(table_name, columns)?;
            tables.insert(table.name.clone(), table);
        }
        check_table_names(&tables)?;

        tracing::debug!(tables = tables.len(), "schema config loaded");
        Ok(Schema::from_tables(tables))
    }

    fn parse_table(table_name: String, columns: Value) -> Result<Table, ConfigError> {
        validate_identifier(&table_name)?;

        let columns = match columns {
            Value::Object(columns) => columns,
            other => {
                return Err(ConfigError::Shape(format!(
                    "table `{}` must map column names to descriptors, found {}",
                    table_name,
                    type_name(&other)
                )))
            }
        };

        let mut table = Table::new(table_name);
        // SQLite folds identifier case, so `Id` and `id` are one column
        let mut seen: HashMap<String, String> = HashMap::new();
        for (column_name, descriptor) in columns {
            let kind = Self::parse_column(&table.name, &column_name, descriptor)?;
            let folded = column_name.to_lowercase();
            if !matches!(kind, ColumnKind::ManyOn(_)) {
                if let Some(existing) = seen.insert(folded, column_name.clone()) {
                    return Err(ConfigError::Column {
                        table: table.name.clone(),
                        column: column_name,
                        reason: format!("conflicts with column `{}`", existing),
                    });
                }
            }
            table.insert(column_name, kind);
        }

        Ok(table)
    }

    fn parse_column(
        table_name: &str,
        column_name: &str,
        descriptor: Value,
    ) -> Result<ColumnKind, ConfigError> {
        validate_identifier(column_name)?;

        let column_error = |reason: String| ConfigError::Column {
            table: table_name.to_string(),
            column: column_name.to_string(),
            reason,
        };

        if column_name.eq_ignore_ascii_case(OVERFLOW_COLUMN) {
            return Err(column_error(format!(
                "`{}` is reserved for unmapped fields",
                OVERFLOW_COLUMN
            )));
        }

        if !descriptor.is_object() {
            return Err(column_error(format!(
                "descriptor must be an object, found {}",
                type_name(&descriptor)
            )));
        }

        let descriptor: Descriptor =
            serde_json::from_value(descriptor).map_err(|e| column_error(e.to_string()))?;
        let kind = descriptor.classify().map_err(column_error)?;

        match &kind {
            ColumnKind::Column(_) => {}
            ColumnKind::Constraint(constraint) => {
                validate_identifier(&constraint.references)?;
                validate_identifier(&constraint.references_on)?;
                tracing::debug!(
                    table = table_name,
                    column = column_name,
                    references = %constraint.references,
                    "foreign key declared"
                );
            }
            ColumnKind::ManyOn(many_on) => {
                validate_identifier(&many_on.references)?;
                validate_identifier(&many_on.references_on)?;
                if many_on.references.eq_ignore_ascii_case(table_name) {
                    return Err(column_error(
                        "a many-to-many link cannot target its own table".to_string(),
                    ));
                }
                tracing::debug!(
                    table = table_name,
                    column = column_name,
                    references = %many_on.references,
                    "many-to-many declared"
                );
            }
        }

        Ok(kind)
    }
}

/// Declared tables and synthesized junction tables share one case-insensitive
/// namespace
fn check_table_names(tables: &BTreeMap<String, Table>) -> Result<(), ConfigError> {
    let mut seen: HashMap<String, String> = HashMap::new();
    let junctions = tables.values().flat_map(|table| {
        table
            .many_on
            .values()
            .map(move |many_on| table.junction_name(many_on))
    });

    for name in tables.keys().cloned().chain(junctions) {
        if let Some(existing) = seen.insert(name.to_lowercase(), name.clone()) {
            return Err(ConfigError::NameConflict { name, existing });
        }
    }
    Ok(())
}

fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    if IDENTIFIER_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
