use parking_lot::Mutex;
use viewcatalog::{
    CatalogClient, CatalogError, DatabaseListParams, MemoryCatalog, RelationListParams,
    RelationRecord,
};

/// Catalog client recording every call, with optional injected failures.
#[derive(Debug, Default)]
pub struct RecordingClient {
    pub inner: MemoryCatalog,
    pub calls: Mutex<Vec<String>>,
    /// Errors returned by the next `list_databases` calls, front first.
    pub database_failures: Mutex<Vec<CatalogError>>,
    /// Errors returned by the next `list_relations` calls, front first.
    pub relation_failures: Mutex<Vec<CatalogError>>,
}

impl RecordingClient {
    pub fn new(inner: MemoryCatalog) -> Self {
        RecordingClient {
            inner,
            ..Default::default()
        }
    }

    pub fn fail_next_list_databases(&self, err: CatalogError) {
        self.database_failures.lock().push(err);
    }

    pub fn fail_next_list_relations(&self, err: CatalogError) {
        self.relation_failures.lock().push(err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl CatalogClient for RecordingClient {
    fn list_databases(&self, params: &DatabaseListParams) -> viewcatalog::Result<Vec<String>> {
        self.calls.lock().push("list_databases".to_string());
        let mut failures = self.database_failures.lock();
        if !failures.is_empty() {
            return Err(failures.remove(0));
        }
        self.inner.list_databases(params)
    }

    fn list_relations(
        &self,
        params: &RelationListParams,
    ) -> viewcatalog::Result<Vec<RelationRecord>> {
        self.calls
            .lock()
            .push(format!("list_relations({})", params.database));
        let mut failures = self.relation_failures.lock();
        if !failures.is_empty() {
            return Err(failures.remove(0));
        }
        self.inner.list_relations(params)
    }
}
