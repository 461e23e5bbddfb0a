use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{
    CatalogClient, DatabaseListParams, RelationListParams, RelationRecord, RelationType,
    extract_db_name,
};
use crate::errors::{CatalogError, Result};
use crate::identity::Principal;
use crate::pattern::LikePattern;

/// A database held by the in-memory catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDatabase {
    /// Name as reported to clients, possibly catalog qualified.
    pub name: String,
    /// Users allowed to see this database. `None` means everyone.
    #[serde(default)]
    pub grants: Option<Vec<String>>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
}

impl MemoryDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryDatabase {
            name: name.into(),
            grants: None,
            relations: Vec::new(),
        }
    }

    pub fn with_view(mut self, name: impl Into<String>, ddl_sql: impl Into<String>) -> Self {
        self.relations.push(RelationRecord::view(name, ddl_sql));
        self
    }

    pub fn with_table(mut self, name: impl Into<String>) -> Self {
        self.relations.push(RelationRecord::table(name));
        self
    }

    /// Restrict visibility to the given user. May be called multiple times.
    pub fn with_grant(mut self, user: impl Into<String>) -> Self {
        self.grants.get_or_insert_with(Vec::new).push(user.into());
        self
    }

    fn visible_to(&self, principal: &Principal) -> bool {
        match &self.grants {
            None => true,
            Some(grants) => match principal.user_name() {
                Some(user) => grants.iter().any(|g| g == user),
                None => false,
            },
        }
    }
}

/// Catalog client backed by an in-process list of databases.
///
/// Databases and relations are returned in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCatalog {
    #[serde(default)]
    pub databases: Vec<MemoryDatabase>,
}

impl MemoryCatalog {
    pub fn with_database(mut self, database: MemoryDatabase) -> Self {
        self.databases.push(database);
        self
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| CatalogError::Load(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Load(format!("{}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    fn find_database(&self, name: &str) -> Option<&MemoryDatabase> {
        self.databases.iter().find(|db| db.name == name)
    }
}

impl CatalogClient for MemoryCatalog {
    fn list_databases(&self, params: &DatabaseListParams) -> Result<Vec<String>> {
        let pattern = LikePattern::try_new_optional(params.pattern.as_deref())?;

        let names: Vec<_> = self
            .databases
            .iter()
            .filter(|db| db.visible_to(&params.principal))
            .filter(|db| match &pattern {
                // Patterns apply to the unqualified name.
                Some(pattern) => pattern.is_match(extract_db_name(&db.name)),
                None => true,
            })
            .map(|db| db.name.clone())
            .collect();

        debug!(principal = %params.principal, count = names.len(), "listed databases");

        Ok(names)
    }

    fn list_relations(&self, params: &RelationListParams) -> Result<Vec<RelationRecord>> {
        let database = self
            .find_database(&params.database)
            .ok_or_else(|| {
                CatalogError::Unavailable(format!("Unknown database: {}", params.database))
            })?;

        if !database.visible_to(&params.principal) {
            return Err(CatalogError::Unauthorized {
                principal: params.principal.to_string(),
                reason: format!("no privilege on database '{}'", params.database),
            });
        }

        let pattern = LikePattern::try_new_optional(params.pattern.as_deref())?;

        let relations: Vec<_> = database
            .relations
            .iter()
            .filter(|rel| rel.relation_type == params.relation_type)
            .filter(|rel| pattern.as_ref().is_none_or(|p| p.is_match(&rel.name)))
            .cloned()
            .collect();

        debug!(
            database = %params.database,
            relation_type = %params.relation_type,
            count = relations.len(),
            "listed relations"
        );

        Ok(relations)
    }
}
