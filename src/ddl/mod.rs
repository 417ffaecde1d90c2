//! DDL generation - render a `Schema` into `CREATE TABLE` statements
//!
//! Each declared table becomes one statement holding its stored columns, the
//! overflow column and its foreign keys. Every many-to-many declaration adds a
//! junction table named `<owner>_<target>`.

pub mod compiler;
pub mod statement;

pub use compiler::{CompileConfig, SchemaCompiler};
pub use statement::{quote_identifier, ColumnDef, CreateTable, TableConstraint};
