//! Bulk import of JSON array files into schema tables
//!
//! A file is matched to a table by its name without extension, so
//! `data/2024/orders.json` loads into `orders`. Declared columns are written
//! to their own columns; every other field is kept in the overflow column.

pub mod engine;
pub mod row;
pub mod stream;

pub use engine::{CancellationToken, FileFailure, ImportEngine, ImportSummary};
pub use row::{record_to_row, to_field_value};
pub use stream::for_each_element;
