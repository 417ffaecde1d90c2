//! Schema configuration - parse a JSON table description into a `Schema`

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{
    Column, ColumnKind, Constraint, ManyOnConstraint, Schema, Table, OVERFLOW_COLUMN,
};
