//! Client side of the metadata catalog.
//!
//! The catalog answers two questions: which databases a principal can see,
//! and which relations of a given type a database holds. Everything consuming
//! catalog metadata goes through [`CatalogClient`].
pub mod client;
pub mod errors;
pub mod identity;
pub mod memory;
pub mod pattern;

pub use client::{
    CatalogClient, DatabaseListParams, RelationListParams, RelationRecord, RelationType,
    extract_db_name,
};
pub use errors::{CatalogError, Result};
pub use identity::{Principal, UserIdentity};
pub use memory::{MemoryCatalog, MemoryDatabase};
