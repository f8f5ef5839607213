//! Mock database adapter for testing
//!
//! This adapter keeps tables in memory and never opens a connection. It's
//! useful for:
//! - Unit testing record binding, validation and persistence
//! - Asserting exactly which statements a record issued
//! - Simulating catalog and connection failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rowbind_catalog::{MockAdapter, CatalogProvider};
//! use rowbind_core::ColumnSchema;
//!
//! let adapter = MockAdapter::new();
//! adapter.add_table("users", vec![
//!     ColumnSchema::new("id", "integer").primary(),
//!     ColumnSchema::new("name", "varchar"),
//! ], vec![]).await;
//! adapter.add_row("users", 1, &[("name", Some("ada"))]).await;
//!
//! let columns = adapter.fetch_columns("users").await?;
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! // Every operation fails with a connection error
//! let adapter = MockAdapter::new().with_connection_failure();
//!
//! // Operations on one table fail with a chosen error
//! adapter.add_error_for_table("audit_log", FetchError::PermissionDenied("no".into())).await;
//! ```

use crate::adapter::{CatalogProvider, RowStore, FetchError, RawRow, ExecOutcome};
use crate::statement::{Statement, Binding};
use rowbind_core::{ColumnSchema, ForeignKeyDescriptor};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Stored row: column name to text value
pub type MockRow = HashMap<String, Option<String>>;

/// One in-memory table
#[derive(Debug, Clone, Default)]
struct MockTable {
    columns: Vec<ColumnSchema>,
    foreign_keys: Vec<ForeignKeyDescriptor>,
    rows: BTreeMap<i64, MockRow>,
}

impl MockTable {
    fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn next_key(&self) -> i64 {
        self.rows.keys().next_back().map_or(1, |k| k + 1)
    }

    /// Text stored when a column is bound to its default
    fn default_text(&self, column: &str) -> Option<String> {
        self.column(column).and_then(|c| c.default_value.clone())
    }

    fn resolve(&self, column: &str, binding: &Binding) -> Option<String> {
        match binding {
            Binding::Value(value) => value.to_sql_text(),
            Binding::Default => self.default_text(column),
        }
    }
}

/// Mock database adapter for testing
///
/// Clones share the same tables, errors and statement log, so a test can hand
/// one clone to the code under test and inspect the other.
pub struct MockAdapter {
    /// Tables by name
    tables: Arc<RwLock<HashMap<String, MockTable>>>,

    /// Errors to return for specific tables
    errors: Arc<RwLock<HashMap<String, FetchError>>>,

    /// Every statement passed to `execute`, in order
    statements: Arc<RwLock<Vec<Statement>>>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulate query latency (milliseconds)
    latency_ms: u64,

    /// Report generated keys from inserts
    generate_keys: bool,

    /// Name to return from name() method
    adapter_name: &'static str,
}

impl MockAdapter {
    /// Create a new mock adapter with no tables
    pub fn new() -> Self {
        MockAdapterBuilder::new().build()
    }

    /// Define (or replace) a table
    pub async fn add_table(
        &self,
        table: &str,
        columns: Vec<ColumnSchema>,
        foreign_keys: Vec<ForeignKeyDescriptor>,
    ) {
        self.tables.write().await.insert(
            table.to_string(),
            MockTable {
                columns,
                foreign_keys,
                rows: BTreeMap::new(),
            },
        );
    }

    /// Store a row under `key`, replacing any existing one
    ///
    /// Does nothing when the table has not been defined.
    pub async fn add_row(&self, table: &str, key: i64, values: &[(&str, Option<&str>)]) {
        if let Some(t) = self.tables.write().await.get_mut(table) {
            let row = values
                .iter()
                .map(|(c, v)| (c.to_string(), v.map(str::to_string)))
                .collect();
            t.rows.insert(key, row);
        }
    }

    /// Current contents of a stored row
    pub async fn row(&self, table: &str, key: i64) -> Option<MockRow> {
        self.tables.read().await.get(table)?.rows.get(&key).cloned()
    }

    /// Number of rows stored in a table (0 for unknown tables)
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, |t| t.rows.len())
    }

    /// Statements executed so far
    pub async fn statements(&self) -> Vec<Statement> {
        self.statements.read().await.clone()
    }

    /// Forget executed statements
    pub async fn clear_statements(&self) {
        self.statements.write().await.clear();
    }

    /// Configure an error to be returned for every operation on a table
    pub async fn add_error_for_table(&self, table: &str, error: FetchError) {
        self.errors.write().await.insert(table.to_string(), error);
    }

    /// Clear all stored errors
    pub async fn clear_errors(&self) {
        self.errors.write().await.clear();
    }

    /// Configure every operation to fail with a connection error
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure simulated latency for all operations
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Set a custom adapter name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.adapter_name = name;
        self
    }

    /// Store inserted rows but report no generated key
    pub fn without_generated_keys(mut self) -> Self {
        self.generate_keys = false;
        self
    }

    /// Names of all defined tables, sorted
    pub async fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Simulate latency and configured failures for an operation on `table`
    async fn begin(&self, table: Option<&str>) -> Result<(), FetchError> {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        if self.fail_connection {
            return Err(FetchError::ConnectionError(
                "Simulated connection failure".to_string(),
            ));
        }

        if let Some(table) = table {
            if let Some(error) = self.errors.read().await.get(table) {
                return Err(error.clone());
            }
        }

        Ok(())
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockAdapter {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            errors: Arc::clone(&self.errors),
            statements: Arc::clone(&self.statements),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
            generate_keys: self.generate_keys,
            adapter_name: self.adapter_name,
        }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for MockAdapter {
    fn name(&self) -> &'static str {
        self.adapter_name
    }

    async fn fetch_columns(&self, table: &str) -> Result<Vec<ColumnSchema>, FetchError> {
        self.begin(Some(table)).await?;

        self.tables
            .read()
            .await
            .get(table)
            .filter(|t| !t.columns.is_empty())
            .map(|t| t.columns.clone())
            .ok_or_else(|| FetchError::TableNotFound(table.to_string()))
    }

    async fn fetch_foreign_keys(
        &self,
        table: &str,
    ) -> Result<Vec<ForeignKeyDescriptor>, FetchError> {
        self.begin(Some(table)).await?;

        Ok(self
            .tables
            .read()
            .await
            .get(table)
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default())
    }

    async fn test_connection(&self) -> Result<(), FetchError> {
        self.begin(None).await
    }
}

#[async_trait::async_trait]
impl RowStore for MockAdapter {
    async fn fetch_row(
        &self,
        table: &str,
        _key: &ColumnSchema,
        value: i64,
        columns: &[ColumnSchema],
    ) -> Result<Option<RawRow>, FetchError> {
        self.begin(Some(table)).await?;

        let tables = self.tables.read().await;
        let t = tables
            .get(table)
            .ok_or_else(|| FetchError::TableNotFound(table.to_string()))?;

        Ok(t.rows.get(&value).map(|row| {
            columns
                .iter()
                .map(|c| (c.name.clone(), row.get(&c.name).cloned().flatten()))
                .collect()
        }))
    }

    async fn execute(&self, statement: &Statement) -> Result<ExecOutcome, FetchError> {
        self.begin(Some(statement.table())).await?;
        self.statements.write().await.push(statement.clone());

        let mut tables = self.tables.write().await;
        let t = tables
            .get_mut(statement.table())
            .ok_or_else(|| FetchError::TableNotFound(statement.table().to_string()))?;

        match statement {
            Statement::Insert { key, values, .. } => {
                let generated = t.next_key();

                let mut row: MockRow = t
                    .columns
                    .iter()
                    .filter(|c| c.name != key.name)
                    .map(|c| (c.name.clone(), c.default_value.clone()))
                    .collect();
                for assignment in values {
                    let text = t.resolve(&assignment.column, &assignment.binding);
                    row.insert(assignment.column.clone(), text);
                }
                row.insert(key.name.clone(), Some(generated.to_string()));
                t.rows.insert(generated, row);

                Ok(ExecOutcome {
                    rows_affected: 1,
                    generated_key: self.generate_keys.then_some(generated),
                })
            }
            Statement::Update { key_value, assignments, .. } => {
                let resolved: Vec<(String, Option<String>)> = assignments
                    .iter()
                    .map(|a| (a.column.clone(), t.resolve(&a.column, &a.binding)))
                    .collect();

                let Some(row) = t.rows.get_mut(key_value) else {
                    return Ok(ExecOutcome::default());
                };
                row.extend(resolved);

                Ok(ExecOutcome {
                    rows_affected: 1,
                    generated_key: None,
                })
            }
        }
    }
}

/// Builder for creating MockAdapter with several tables up front
///
/// # Example
///
/// ```rust,ignore
/// let adapter = MockAdapterBuilder::new()
///     .with_table("users", users_columns(), vec![])
///     .with_row("users", 1, &[("email", Some("ada@example.com"))])
///     .with_latency(50)
///     .build();
/// ```
pub struct MockAdapterBuilder {
    tables: HashMap<String, MockTable>,
    errors: HashMap<String, FetchError>,
    fail_connection: bool,
    latency_ms: u64,
    generate_keys: bool,
    adapter_name: &'static str,
}

impl MockAdapterBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            errors: HashMap::new(),
            fail_connection: false,
            latency_ms: 0,
            generate_keys: true,
            adapter_name: "Mock",
        }
    }

    /// Define a table
    pub fn with_table(
        mut self,
        table: &str,
        columns: Vec<ColumnSchema>,
        foreign_keys: Vec<ForeignKeyDescriptor>,
    ) -> Self {
        self.tables.insert(
            table.to_string(),
            MockTable {
                columns,
                foreign_keys,
                rows: BTreeMap::new(),
            },
        );
        self
    }

    /// Add a row to a table defined earlier
    pub fn with_row(mut self, table: &str, key: i64, values: &[(&str, Option<&str>)]) -> Self {
        if let Some(t) = self.tables.get_mut(table) {
            let row = values
                .iter()
                .map(|(c, v)| (c.to_string(), v.map(str::to_string)))
                .collect();
            t.rows.insert(key, row);
        }
        self
    }

    /// Add an error for a specific table
    pub fn with_error(mut self, table: &str, error: FetchError) -> Self {
        self.errors.insert(table.to_string(), error);
        self
    }

    /// Configure connection failure
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure latency
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Set adapter name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.adapter_name = name;
        self
    }

    /// Report no generated key from inserts
    pub fn without_generated_keys(mut self) -> Self {
        self.generate_keys = false;
        self
    }

    /// Build the MockAdapter
    pub fn build(self) -> MockAdapter {
        MockAdapter {
            tables: Arc::new(RwLock::new(self.tables)),
            errors: Arc::new(RwLock::new(self.errors)),
            statements: Arc::new(RwLock::new(Vec::new())),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
            generate_keys: self.generate_keys,
            adapter_name: self.adapter_name,
        }
    }
}

impl Default for MockAdapterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::Assignment;
    use rowbind_core::Value;

    fn columns() -> Vec<ColumnSchema> {
        vec![
            ColumnSchema::new("id", "integer").primary(),
            ColumnSchema::new("name", "varchar").not_null(),
            ColumnSchema::new("status", "varchar").not_null().with_default(Some("active")),
        ]
    }

    #[tokio::test]
    async fn test_mock_adapter_basic() {
        let adapter = MockAdapter::new();
        adapter.add_table("users", columns(), vec![]).await;

        let fetched = adapter.fetch_columns("users").await.unwrap();
        assert_eq!(fetched.len(), 3);
        assert_eq!(fetched[0].name, "id");
        assert!(adapter.fetch_foreign_keys("users").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_adapter_table_not_found() {
        let adapter = MockAdapter::new();

        let result = adapter.fetch_columns("nonexistent").await;
        assert!(matches!(result, Err(FetchError::TableNotFound(_))));
        assert!(adapter.fetch_foreign_keys("nonexistent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_adapter_connection_failure() {
        let adapter = MockAdapterBuilder::new()
            .with_table("users", columns(), vec![])
            .with_connection_failure()
            .build();

        assert!(matches!(
            adapter.test_connection().await,
            Err(FetchError::ConnectionError(_))
        ));
        assert!(matches!(
            adapter.fetch_columns("users").await,
            Err(FetchError::ConnectionError(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_adapter_custom_error() {
        let adapter = MockAdapter::new();
        adapter.add_table("restricted", columns(), vec![]).await;
        adapter
            .add_error_for_table(
                "restricted",
                FetchError::PermissionDenied("Access denied".to_string()),
            )
            .await;

        let result = adapter.fetch_columns("restricted").await;
        assert!(matches!(result, Err(FetchError::PermissionDenied(_))));

        adapter.clear_errors().await;
        assert!(adapter.fetch_columns("restricted").await.is_ok());
    }

    #[tokio::test]
    async fn test_builder_error_applies_to_one_table() {
        let adapter = MockAdapterBuilder::new()
            .with_table("users", columns(), vec![])
            .with_table("audit", columns(), vec![])
            .with_error("audit", FetchError::QueryError("relation is locked".to_string()))
            .build();

        assert!(matches!(adapter.fetch_columns("audit").await, Err(FetchError::QueryError(_))));
        assert!(adapter.fetch_columns("users").await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_row_projects_requested_columns() {
        let adapter = MockAdapterBuilder::new()
            .with_table("users", columns(), vec![])
            .with_row("users", 4, &[("id", Some("4")), ("name", Some("ada"))])
            .build();

        let cols = columns();
        let row = adapter.fetch_row("users", &cols[0], 4, &cols).await.unwrap().unwrap();
        assert_eq!(
            row,
            vec![
                ("id".to_string(), Some("4".to_string())),
                ("name".to_string(), Some("ada".to_string())),
                ("status".to_string(), None),
            ]
        );

        assert!(adapter.fetch_row("users", &cols[0], 5, &cols).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_generates_key_and_applies_defaults() {
        let adapter = MockAdapterBuilder::new()
            .with_table("users", columns(), vec![])
            .with_row("users", 7, &[("id", Some("7")), ("name", Some("old"))])
            .build();
        let cols = columns();

        let outcome = adapter
            .execute(&Statement::Insert {
                table: "users".to_string(),
                key: cols[0].clone(),
                values: vec![
                    Assignment::value(&cols[1], Value::from("grace")),
                    Assignment::database_default(&cols[2]),
                ],
            })
            .await
            .unwrap();

        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(outcome.generated_key, Some(8));

        let row = adapter.row("users", 8).await.unwrap();
        assert_eq!(row["id"].as_deref(), Some("8"));
        assert_eq!(row["name"].as_deref(), Some("grace"));
        assert_eq!(row["status"].as_deref(), Some("active"));
        assert_eq!(adapter.row_count("users").await, 2);
        assert_eq!(adapter.statements().await.len(), 1);

        adapter.clear_statements().await;
        assert!(adapter.statements().await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_without_generated_keys() {
        let adapter = MockAdapterBuilder::new()
            .with_table("users", columns(), vec![])
            .without_generated_keys()
            .build();
        let cols = columns();

        let outcome = adapter
            .execute(&Statement::Insert {
                table: "users".to_string(),
                key: cols[0].clone(),
                values: vec![Assignment::value(&cols[1], Value::from("grace"))],
            })
            .await
            .unwrap();

        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(outcome.generated_key, None);
        assert_eq!(adapter.row_count("users").await, 1);
    }

    #[tokio::test]
    async fn test_update_missing_row_affects_nothing() {
        let adapter = MockAdapterBuilder::new()
            .with_table("users", columns(), vec![])
            .build();
        let cols = columns();

        let outcome = adapter
            .execute(&Statement::Update {
                table: "users".to_string(),
                key: cols[0].clone(),
                key_value: 99,
                assignments: vec![Assignment::value(&cols[1], Value::from("x"))],
            })
            .await
            .unwrap();

        assert_eq!(outcome.rows_affected, 0);
        assert_eq!(adapter.row_count("users").await, 0);
    }

    #[tokio::test]
    async fn test_mock_adapter_name() {
        let adapter = MockAdapter::new();
        assert_eq!(adapter.name(), "Mock");

        let adapter = MockAdapter::new().with_name("TestPostgres");
        assert_eq!(adapter.name(), "TestPostgres");
    }

    #[tokio::test]
    async fn test_mock_adapter_clone_shares_state() {
        let adapter = MockAdapter::new();
        let cloned = adapter.clone();

        adapter.add_table("b", columns(), vec![]).await;
        cloned.add_table("a", columns(), vec![]).await;
        adapter.add_row("a", 1, &[("name", Some("x"))]).await;

        assert_eq!(cloned.table_names().await, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cloned.row_count("a").await, 1);
    }

    #[tokio::test]
    async fn test_mock_adapter_latency() {
        let adapter = MockAdapter::new().with_latency(20);
        adapter.add_table("users", columns(), vec![]).await;

        let start = std::time::Instant::now();
        adapter.fetch_columns("users").await.unwrap();
        assert!(start.elapsed() >= std::time::Duration::from_millis(20));
    }
}
