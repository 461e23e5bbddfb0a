//! Scanner backing the `information_schema.views` system table.
//!
//! The scanner walks databases visible to the requesting user and emits a
//! row per view, fetching each database's views lazily from the catalog.
pub mod batch;
pub mod columns;
pub mod errors;
pub mod scanner;
pub mod schema;

#[cfg(test)]
mod testutil;

pub use batch::{Batch, Projections, Utf8Array};
pub use columns::{VIEWS_COLUMNS, ViewsColumn, views_schema};
pub use errors::{Result, SchemaViewsError};
pub use scanner::{PollPull, ScanConfig, ScanPhase, ScanRequest, SchemaViewsScanner};
pub use schema::{ColumnDesc, ColumnSchema, DataType, Field};
