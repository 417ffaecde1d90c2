//! Structured DDL statements
//!
//! Statements are assembled as clause lists and only turned into text by
//! their `Display` impls, so the compiler never deals with separators.

use std::fmt;

/// Render `name` as a double-quoted SQL identifier, so keywords such as
/// `order` or `group` are usable as table and column names
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A column definition inside a `CREATE TABLE` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
    pub primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        ColumnDef {
            name: name.into(),
            sql_type: sql_type.into(),
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", quote_identifier(&self.name), self.sql_type)?;
        if self.primary_key {
            write!(f, " PRIMARY KEY")?;
        }
        Ok(())
    }
}

/// A table-level constraint clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConstraint {
    /// Composite primary key
    PrimaryKey(Vec<String>),

    /// Named foreign key with delete-sets-null semantics
    ForeignKey {
        column: String,
        references: String,
        references_on: String,
    },
}

impl TableConstraint {
    pub fn foreign_key(
        column: impl Into<String>,
        references: impl Into<String>,
        references_on: impl Into<String>,
    ) -> Self {
        TableConstraint::ForeignKey {
            column: column.into(),
            references: references.into(),
            references_on: references_on.into(),
        }
    }
}

impl fmt::Display for TableConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableConstraint::PrimaryKey(columns) => {
                let columns: Vec<String> =
                    columns.iter().map(|c| quote_identifier(c)).collect();
                write!(f, "PRIMARY KEY ({})", columns.join(", "))
            }
            TableConstraint::ForeignKey {
                column,
                references,
                references_on,
            } => write!(
                f,
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE SET NULL",
                quote_identifier(&format!("fk_{}", references)),
                quote_identifier(column),
                quote_identifier(references),
                quote_identifier(references_on)
            ),
        }
    }
}

/// A complete `CREATE TABLE` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub name: String,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
}

impl CreateTable {
    pub fn new(name: impl Into<String>) -> Self {
        CreateTable {
            name: name.into(),
            if_not_exists: false,
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn if_not_exists(mut self, if_not_exists: bool) -> Self {
        self.if_not_exists = if_not_exists;
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn constraint(mut self, constraint: TableConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

impl fmt::Display for CreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = if self.if_not_exists { "IF NOT EXISTS " } else { "" };
        writeln!(f, "CREATE TABLE {}{} (", guard, quote_identifier(&self.name))?;

        let clauses: Vec<String> = self
            .columns
            .iter()
            .map(ToString::to_string)
            .chain(self.constraints.iter().map(ToString::to_string))
            .collect();
        for (i, clause) in clauses.iter().enumerate() {
            let separator = if i + 1 < clauses.len() { "," } else { "" };
            writeln!(f, "    {}{}", clause, separator)?;
        }

        writeln!(f, ");")
    }
}
