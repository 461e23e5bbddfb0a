use std::fmt::{self, Debug};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::identity::Principal;

/// Kind of a relation tracked by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    #[default]
    Table,
    View,
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "TABLE"),
            Self::View => write!(f, "VIEW"),
        }
    }
}

/// A relation as returned from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub name: String,
    #[serde(default, rename = "type")]
    pub relation_type: RelationType,
    /// Defining statement. Empty for base tables.
    #[serde(default)]
    pub ddl_sql: String,
}

impl RelationRecord {
    pub fn view(name: impl Into<String>, ddl_sql: impl Into<String>) -> Self {
        RelationRecord {
            name: name.into(),
            relation_type: RelationType::View,
            ddl_sql: ddl_sql.into(),
        }
    }

    pub fn table(name: impl Into<String>) -> Self {
        RelationRecord {
            name: name.into(),
            relation_type: RelationType::Table,
            ddl_sql: String::new(),
        }
    }
}

/// Strip catalog qualification from a database name.
///
/// Both `catalog.db` and the legacy `cluster:db` forms are accepted, only the
/// part after the first separator is kept.
pub fn extract_db_name(full_name: &str) -> &str {
    match full_name.find(['.', ':']) {
        Some(idx) => &full_name[idx + 1..],
        None => full_name,
    }
}

/// Parameters for listing databases.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatabaseListParams {
    /// LIKE pattern on the database name.
    pub pattern: Option<String>,
    pub principal: Principal,
}

/// Parameters for listing the relations of a single database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationListParams {
    /// Database name exactly as returned from `list_databases`.
    pub database: String,
    /// LIKE pattern on the relation name.
    pub pattern: Option<String>,
    pub principal: Principal,
    /// Only relations of this type are returned.
    pub relation_type: RelationType,
}

/// Client for the remote catalog.
///
/// Calls are blocking. Results are returned in a stable order and visibility
/// checks happen on the catalog side.
pub trait CatalogClient: Debug {
    /// List databases visible to the principal.
    fn list_databases(&self, params: &DatabaseListParams) -> Result<Vec<String>>;

    /// List relations of a given type in a database.
    fn list_relations(&self, params: &RelationListParams) -> Result<Vec<RelationRecord>>;
}

impl<C: CatalogClient + ?Sized> CatalogClient for &C {
    fn list_databases(&self, params: &DatabaseListParams) -> Result<Vec<String>> {
        (**self).list_databases(params)
    }

    fn list_relations(&self, params: &RelationListParams) -> Result<Vec<RelationRecord>> {
        (**self).list_relations(params)
    }
}

impl<C: CatalogClient + ?Sized> CatalogClient for Arc<C> {
    fn list_databases(&self, params: &DatabaseListParams) -> Result<Vec<String>> {
        self.as_ref().list_databases(params)
    }

    fn list_relations(&self, params: &RelationListParams) -> Result<Vec<RelationRecord>> {
        self.as_ref().list_relations(params)
    }
}

impl<C: CatalogClient + ?Sized> CatalogClient for Box<C> {
    fn list_databases(&self, params: &DatabaseListParams) -> Result<Vec<String>> {
        self.as_ref().list_databases(params)
    }

    fn list_relations(&self, params: &RelationListParams) -> Result<Vec<RelationRecord>> {
        self.as_ref().list_relations(params)
    }
}
