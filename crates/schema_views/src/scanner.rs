use tracing::{debug, trace};
use viewcatalog::{
    CatalogClient, DatabaseListParams, Principal, RelationListParams, RelationRecord, RelationType,
    UserIdentity,
};

use crate::batch::Batch;
use crate::columns::{ViewsColumn, views_schema};
use crate::errors::{Result, SchemaViewsError};
use crate::schema::ColumnSchema;

/// Parameters for a single scan of the views table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanRequest {
    /// LIKE pattern on database names.
    pub db_pattern: Option<String>,
    /// LIKE pattern on view names.
    pub view_pattern: Option<String>,
    /// Identity resolved by the session. Takes precedence over `user` and
    /// `user_ip`.
    pub current_user_ident: Option<UserIdentity>,
    pub user: Option<String>,
    pub user_ip: Option<String>,
}

impl ScanRequest {
    pub fn with_db_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.db_pattern = Some(pattern.into());
        self
    }

    pub fn with_view_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.view_pattern = Some(pattern.into());
        self
    }

    pub fn with_identity(mut self, ident: UserIdentity) -> Self {
        self.current_user_ident = Some(ident);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_user_ip(mut self, user_ip: impl Into<String>) -> Self {
        self.user_ip = Some(user_ip.into());
        self
    }

    pub fn principal(&self) -> Principal {
        Principal::resolve(
            self.current_user_ident.as_ref(),
            self.user.as_deref(),
            self.user_ip.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Max number of rows produced per pull. Rows from different databases
    /// are never mixed in one pull.
    pub batch_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig { batch_size: 1 }
    }
}

/// Result of a single pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPull {
    /// Rows were written to the output, more may follow.
    HasMore,
    /// No rows were written and none will be.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Uninitialized,
    Ready,
    Streaming,
    Exhausted,
}

#[derive(Debug)]
struct ScanCursor {
    view_pattern: Option<String>,
    principal: Principal,
    databases: Vec<String>,
    /// Next database to fetch views for.
    db_idx: usize,
    /// Views for `databases[db_idx - 1]`.
    views: Vec<RelationRecord>,
    /// Next view to emit.
    view_idx: usize,
    streaming: bool,
}

impl ScanCursor {
    fn views_exhausted(&self) -> bool {
        self.view_idx >= self.views.len()
    }

    fn current_database(&self) -> &str {
        debug_assert!(self.db_idx > 0);
        &self.databases[self.db_idx - 1]
    }
}

#[derive(Debug)]
enum ScanState {
    Uninitialized,
    Scanning(ScanCursor),
    Exhausted,
}

/// Produces rows for `information_schema.views`.
///
/// Databases are listed once on `initialize`. Views are fetched one database
/// at a time as the previous database's views are consumed.
#[derive(Debug)]
pub struct SchemaViewsScanner<C: CatalogClient> {
    client: C,
    config: ScanConfig,
    schema: ColumnSchema,
    state: ScanState,
}

impl<C: CatalogClient> SchemaViewsScanner<C> {
    pub fn try_new(client: C, config: ScanConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(SchemaViewsError::InvalidArgument(
                "Batch size must be greater than zero".to_string(),
            ));
        }
        Ok(SchemaViewsScanner {
            client,
            config,
            schema: views_schema(),
            state: ScanState::Uninitialized,
        })
    }

    /// Output schema of the scan.
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn phase(&self) -> ScanPhase {
        match &self.state {
            ScanState::Uninitialized => ScanPhase::Uninitialized,
            ScanState::Scanning(cursor) if cursor.streaming => ScanPhase::Streaming,
            ScanState::Scanning(_) => ScanPhase::Ready,
            ScanState::Exhausted => ScanPhase::Exhausted,
        }
    }

    /// Fetch the list of databases for this scan.
    ///
    /// On error the scanner remains uninitialized and may be initialized
    /// again.
    pub fn initialize(&mut self, request: &ScanRequest) -> Result<()> {
        if !matches!(self.state, ScanState::Uninitialized) {
            return Err(SchemaViewsError::NotInitialized("initialize called more than once"));
        }

        let principal = request.principal();
        let databases = self.client.list_databases(&DatabaseListParams {
            pattern: request.db_pattern.clone(),
            principal: principal.clone(),
        })?;

        debug!(%principal, num_databases = databases.len(), "initialized views scan");

        self.state = ScanState::Scanning(ScanCursor {
            view_pattern: request.view_pattern.clone(),
            principal,
            databases,
            db_idx: 0,
            views: Vec::new(),
            view_idx: 0,
            streaming: false,
        });

        Ok(())
    }

    /// Pull the next set of rows into `output`.
    ///
    /// `output` is reset before writing. Returns `Exhausted` with zero rows
    /// once all databases have been visited, and keeps doing so on every
    /// subsequent call.
    pub fn produce_batch(&mut self, output: &mut Batch) -> Result<PollPull> {
        let cursor = match &mut self.state {
            ScanState::Uninitialized => {
                return Err(SchemaViewsError::NotInitialized("used before initialized"));
            }
            ScanState::Exhausted => {
                output.reset();
                return Ok(PollPull::Exhausted);
            }
            ScanState::Scanning(cursor) => cursor,
        };

        if output.write_capacity() == 0 {
            return Err(SchemaViewsError::InvalidArgument(
                "Output batch has zero capacity".to_string(),
            ));
        }
        for &col_idx in output.projections().indices() {
            ViewsColumn::try_from_index(col_idx)?;
        }

        while cursor.views_exhausted() {
            if cursor.db_idx >= cursor.databases.len() {
                debug!(num_databases = cursor.databases.len(), "views scan exhausted");
                self.state = ScanState::Exhausted;
                output.reset();
                return Ok(PollPull::Exhausted);
            }

            // Cursor only moves once the fetch succeeds so a failed fetch is
            // retried as-is.
            let database = &cursor.databases[cursor.db_idx];
            let views = self.client.list_relations(&RelationListParams {
                database: database.clone(),
                pattern: cursor.view_pattern.clone(),
                principal: cursor.principal.clone(),
                relation_type: RelationType::View,
            })?;
            debug!(%database, num_views = views.len(), "fetched views");

            cursor.views = views;
            cursor.db_idx += 1;
            cursor.view_idx = 0;
        }

        let max_rows = usize::min(self.config.batch_size, output.write_capacity());
        let count = usize::min(max_rows, cursor.views.len() - cursor.view_idx);
        let rows = &cursor.views[cursor.view_idx..cursor.view_idx + count];
        let db_name = cursor.current_database();

        output.reset();
        output.for_each_column(&mut |col_idx, array| {
            let column = ViewsColumn::try_from_index(col_idx)?;
            for view in rows {
                array.push(Some(column.value(db_name, view)));
            }
            Ok(())
        })?;
        output.set_num_rows(count)?;

        trace!(database = %db_name, offset = cursor.view_idx, count, "produced views batch");

        cursor.view_idx += count;
        cursor.streaming = true;

        Ok(PollPull::HasMore)
    }
}

#[cfg(test)]
mod tests {
    use viewcatalog::{CatalogError, MemoryCatalog, MemoryDatabase};

    use super::*;
    use crate::batch::Projections;
    use crate::testutil::RecordingClient;

    fn two_schemas() -> MemoryCatalog {
        MemoryCatalog::default()
            .with_database(MemoryDatabase::new("s1").with_view("v1", "SELECT 1"))
            .with_database(MemoryDatabase::new("s2"))
    }

    fn scanner(
        client: &RecordingClient,
        batch_size: usize,
    ) -> SchemaViewsScanner<&RecordingClient> {
        SchemaViewsScanner::try_new(client, ScanConfig { batch_size }).unwrap()
    }

    fn rows(batch: &Batch) -> Vec<Vec<String>> {
        (0..batch.num_rows())
            .map(|idx| {
                batch
                    .row(idx)
                    .unwrap()
                    .into_iter()
                    .map(|v| v.unwrap_or_default().to_string())
                    .collect()
            })
            .collect()
    }

    /// Pull until exhausted, returning all rows and the number of pulls that
    /// produced rows.
    fn scan_all<C: CatalogClient>(
        scanner: &mut SchemaViewsScanner<C>,
        batch: &mut Batch,
    ) -> (Vec<Vec<String>>, usize) {
        let mut out = Vec::new();
        let mut pulls = 0;
        loop {
            match scanner.produce_batch(batch).unwrap() {
                PollPull::HasMore => {
                    assert!(batch.num_rows() > 0);
                    pulls += 1;
                    out.extend(rows(batch));
                }
                PollPull::Exhausted => {
                    assert_eq!(0, batch.num_rows());
                    return (out, pulls);
                }
            }
        }
    }

    #[test]
    fn two_databases_one_view() {
        logutil::init_test();

        let client = RecordingClient::new(two_schemas());
        let mut scanner = scanner(&client, 1);
        scanner.initialize(&ScanRequest::default()).unwrap();
        assert_eq!(ScanPhase::Ready, scanner.phase());

        let mut batch = Batch::for_schema(scanner.schema(), 1);

        assert_eq!(PollPull::HasMore, scanner.produce_batch(&mut batch).unwrap());
        assert_eq!(
            vec![vec![
                "def",
                "s1",
                "v1",
                "SELECT 1",
                "NONE",
                "NO",
                "",
                "",
                "utf8",
                "utf8_general_ci"
            ]],
            rows(&batch)
        );
        assert_eq!(ScanPhase::Streaming, scanner.phase());

        assert_eq!(PollPull::Exhausted, scanner.produce_batch(&mut batch).unwrap());
        assert_eq!(0, batch.num_rows());
        assert_eq!(ScanPhase::Exhausted, scanner.phase());

        assert_eq!(
            vec!["list_databases", "list_relations(s1)", "list_relations(s2)"],
            client.calls()
        );
    }

    #[test]
    fn empty_database_list() {
        let client = RecordingClient::new(MemoryCatalog::default());
        let mut scanner = scanner(&client, 1);
        scanner.initialize(&ScanRequest::default()).unwrap();

        let mut batch = Batch::for_schema(scanner.schema(), 1);
        assert_eq!(PollPull::Exhausted, scanner.produce_batch(&mut batch).unwrap());
        assert_eq!(0, batch.num_rows());
        assert_eq!(vec!["list_databases"], client.calls());
    }

    #[test]
    fn exhausted_is_idempotent() {
        let client = RecordingClient::new(two_schemas());
        let mut scanner = scanner(&client, 1);
        scanner.initialize(&ScanRequest::default()).unwrap();

        let mut batch = Batch::for_schema(scanner.schema(), 1);
        scan_all(&mut scanner, &mut batch);
        let calls = client.calls();

        for _ in 0..3 {
            assert_eq!(PollPull::Exhausted, scanner.produce_batch(&mut batch).unwrap());
            assert_eq!(0, batch.num_rows());
        }
        assert_eq!(calls, client.calls());
    }

    #[test]
    fn rows_in_database_then_view_order() {
        let catalog = MemoryCatalog::default()
            .with_database(
                MemoryDatabase::new("b")
                    .with_view("z", "SELECT 'z'")
                    .with_table("t")
                    .with_view("a", "SELECT 'a'"),
            )
            .with_database(MemoryDatabase::new("empty"))
            .with_database(MemoryDatabase::new("a").with_view("m", "SELECT 'm'"));
        let client = RecordingClient::new(catalog);
        let mut scanner = scanner(&client, 1);
        scanner.initialize(&ScanRequest::default()).unwrap();

        let projections =
            Projections::try_from_names(scanner.schema(), &["TABLE_SCHEMA", "TABLE_NAME"]).unwrap();
        let mut batch = Batch::new(projections, 1);
        let (rows, pulls) = scan_all(&mut scanner, &mut batch);

        assert_eq!(
            vec![
                vec!["b".to_string(), "z".to_string()],
                vec!["b".to_string(), "a".to_string()],
                vec!["a".to_string(), "m".to_string()],
            ],
            rows
        );
        assert_eq!(3, pulls);
    }

    #[test]
    fn larger_batches_stay_within_database() {
        let catalog = MemoryCatalog::default()
            .with_database(
                MemoryDatabase::new("s1")
                    .with_view("v1", "SELECT 1")
                    .with_view("v2", "SELECT 2")
                    .with_view("v3", "SELECT 3"),
            )
            .with_database(MemoryDatabase::new("s2").with_view("v4", "SELECT 4"));
        let client = RecordingClient::new(catalog);
        let mut scanner = scanner(&client, 2);
        scanner.initialize(&ScanRequest::default()).unwrap();

        let mut batch = Batch::new(Projections::new([ViewsColumn::TableName.index()]), 16);

        let mut sizes = Vec::new();
        while scanner.produce_batch(&mut batch).unwrap() == PollPull::HasMore {
            sizes.push(batch.num_rows());
        }
        // Limited by the configured batch size, and never crossing databases.
        assert_eq!(vec![2, 1, 1], sizes);
    }

    #[test]
    fn output_capacity_limits_rows() {
        let catalog = MemoryCatalog::default().with_database(
            MemoryDatabase::new("s1")
                .with_view("v1", "SELECT 1")
                .with_view("v2", "SELECT 2")
                .with_view("v3", "SELECT 3"),
        );
        let client = RecordingClient::new(catalog);
        let mut scanner = scanner(&client, 1024);
        scanner.initialize(&ScanRequest::default()).unwrap();

        let mut batch = Batch::for_schema(scanner.schema(), 2);
        let (rows, pulls) = scan_all(&mut scanner, &mut batch);
        assert_eq!(3, rows.len());
        assert_eq!(2, pulls);
    }

    #[test]
    fn qualified_database_name_stripped() {
        let catalog = MemoryCatalog::default()
            .with_database(MemoryDatabase::new("cat1.s1").with_view("v1", "SELECT 1"));
        let client = RecordingClient::new(catalog);
        let mut scanner = scanner(&client, 1);
        scanner.initialize(&ScanRequest::default()).unwrap();

        let mut batch = Batch::for_schema(scanner.schema(), 1);
        scanner.produce_batch(&mut batch).unwrap();
        let schema_col = batch.array_for_column(ViewsColumn::TableSchema.index()).unwrap();
        assert_eq!(Some("s1"), schema_col.get(0));
        // The catalog is always asked with the name it returned.
        assert_eq!("list_relations(cat1.s1)", client.calls()[1]);
    }

    #[test]
    fn patterns_and_identity_forwarded() {
        let catalog = MemoryCatalog::default()
            .with_database(
                MemoryDatabase::new("sales")
                    .with_view("v_a", "SELECT 1")
                    .with_view("w_b", "SELECT 2"),
            )
            .with_database(
                MemoryDatabase::new("secret")
                    .with_grant("alice")
                    .with_view("v_s", "SELECT 3"),
            )
            .with_database(MemoryDatabase::new("ops").with_view("v_o", "SELECT 4"));
        let client = RecordingClient::new(catalog);

        let request = ScanRequest::default()
            .with_db_pattern("s%")
            .with_view_pattern("v\\_%")
            .with_identity(UserIdentity::new("alice", "%"))
            .with_user("mallory");
        let mut scanner = scanner(&client, 8);
        scanner.initialize(&request).unwrap();

        let projections =
            Projections::try_from_names(scanner.schema(), &["TABLE_SCHEMA", "TABLE_NAME"]).unwrap();
        let mut batch = Batch::new(projections, 8);
        let (rows, _) = scan_all(&mut scanner, &mut batch);
        assert_eq!(
            vec![
                vec!["sales".to_string(), "v_a".to_string()],
                vec!["secret".to_string(), "v_s".to_string()],
            ],
            rows
        );
    }

    #[test]
    fn produce_before_initialize() {
        let client = RecordingClient::new(two_schemas());
        let mut scanner = scanner(&client, 1);
        let mut batch = Batch::for_schema(scanner.schema(), 1);

        let err = scanner.produce_batch(&mut batch).unwrap_err();
        assert!(matches!(err, SchemaViewsError::NotInitialized(_)));
        assert!(client.calls().is_empty());
    }

    #[test]
    fn initialize_twice() {
        let client = RecordingClient::new(two_schemas());
        let mut scanner = scanner(&client, 1);
        scanner.initialize(&ScanRequest::default()).unwrap();

        let err = scanner.initialize(&ScanRequest::default()).unwrap_err();
        assert!(matches!(err, SchemaViewsError::NotInitialized(_)));
        assert_eq!(1, client.calls().len());
    }

    #[test]
    fn initialize_unauthorized_can_retry() {
        let client = RecordingClient::new(two_schemas());
        client.fail_next_list_databases(CatalogError::Unauthorized {
            principal: "anonymous".to_string(),
            reason: "denied".to_string(),
        });

        let mut scanner = scanner(&client, 1);
        let err = scanner.initialize(&ScanRequest::default()).unwrap_err();
        assert!(matches!(err, SchemaViewsError::AuthorizationError(_)));
        assert_eq!(ScanPhase::Uninitialized, scanner.phase());

        scanner.initialize(&ScanRequest::default()).unwrap();
        assert_eq!(ScanPhase::Ready, scanner.phase());

        let mut batch = Batch::for_schema(scanner.schema(), 1);
        let (rows, _) = scan_all(&mut scanner, &mut batch);
        assert_eq!(1, rows.len());
    }

    #[test]
    fn failed_view_fetch_does_not_advance() {
        let catalog = MemoryCatalog::default()
            .with_database(MemoryDatabase::new("s1").with_view("v1", "SELECT 1"))
            .with_database(MemoryDatabase::new("s2").with_view("v2", "SELECT 2"));
        let client = RecordingClient::new(catalog);
        let mut scanner = scanner(&client, 1);
        scanner.initialize(&ScanRequest::default()).unwrap();

        let projections = Projections::new([ViewsColumn::TableName.index()]);
        let mut batch = Batch::new(projections, 1);

        assert_eq!(PollPull::HasMore, scanner.produce_batch(&mut batch).unwrap());
        assert_eq!(vec![vec!["v1".to_string()]], rows(&batch));

        client.fail_next_list_relations(CatalogError::Unavailable("connection reset".to_string()));
        let err = scanner.produce_batch(&mut batch).unwrap_err();
        assert!(matches!(err, SchemaViewsError::CatalogUnavailable(_)));

        // Retrying fetches s2 again, nothing skipped or duplicated.
        assert_eq!(PollPull::HasMore, scanner.produce_batch(&mut batch).unwrap());
        assert_eq!(vec![vec!["v2".to_string()]], rows(&batch));
        assert_eq!(PollPull::Exhausted, scanner.produce_batch(&mut batch).unwrap());

        assert_eq!(
            vec![
                "list_databases",
                "list_relations(s1)",
                "list_relations(s2)",
                "list_relations(s2)",
            ],
            client.calls()
        );
    }

    #[test]
    fn unauthorized_view_fetch_does_not_advance() {
        let catalog = MemoryCatalog::default()
            .with_database(MemoryDatabase::new("s1").with_view("v1", "SELECT 1"))
            .with_database(MemoryDatabase::new("s2").with_view("v2", "SELECT 2"));
        let client = RecordingClient::new(catalog);
        let mut scanner = scanner(&client, 1);
        scanner.initialize(&ScanRequest::default().with_user("bob")).unwrap();

        let projections = Projections::new([ViewsColumn::TableName.index()]);
        let mut batch = Batch::new(projections, 1);
        assert_eq!(PollPull::HasMore, scanner.produce_batch(&mut batch).unwrap());

        client.fail_next_list_relations(CatalogError::Unauthorized {
            principal: "bob".to_string(),
            reason: "no privilege on database 's2'".to_string(),
        });
        let err = scanner.produce_batch(&mut batch).unwrap_err();
        assert!(matches!(
            err,
            SchemaViewsError::AuthorizationError(CatalogError::Unauthorized { .. })
        ));
        assert!(err.to_string().contains("no privilege on database 's2'"));
        assert_eq!(ScanPhase::Streaming, scanner.phase());

        assert_eq!(PollPull::HasMore, scanner.produce_batch(&mut batch).unwrap());
        assert_eq!(vec![vec!["v2".to_string()]], rows(&batch));
        assert_eq!(PollPull::Exhausted, scanner.produce_batch(&mut batch).unwrap());
        assert_eq!(
            vec![
                "list_databases",
                "list_relations(s1)",
                "list_relations(s2)",
                "list_relations(s2)",
            ],
            client.calls()
        );
    }

    #[test]
    fn unknown_column_rejected_before_fetch() {
        let client = RecordingClient::new(two_schemas());
        let mut scanner = scanner(&client, 1);
        scanner.initialize(&ScanRequest::default()).unwrap();

        let mut batch = Batch::new(Projections::new([2, 11]), 1);
        let err = scanner.produce_batch(&mut batch).unwrap_err();
        assert!(matches!(err, SchemaViewsError::UnknownColumn { index: 11, .. }));
        assert_eq!(vec!["list_databases"], client.calls());
        assert_eq!(ScanPhase::Ready, scanner.phase());
    }

    #[test]
    fn zero_capacity_output_rejected() {
        let client = RecordingClient::new(two_schemas());
        let mut scanner = scanner(&client, 1);
        scanner.initialize(&ScanRequest::default()).unwrap();

        let mut batch = Batch::for_schema(scanner.schema(), 0);
        let err = scanner.produce_batch(&mut batch).unwrap_err();
        assert!(matches!(err, SchemaViewsError::InvalidArgument(_)));
    }

    #[test]
    fn zero_batch_size_rejected() {
        let config = ScanConfig { batch_size: 0 };
        let err = SchemaViewsScanner::try_new(MemoryCatalog::default(), config).unwrap_err();
        assert!(matches!(err, SchemaViewsError::InvalidArgument(_)));
    }
}
