//! Adapter traits for catalog introspection and single-row persistence

use crate::statement::Statement;
use rowbind_core::{ColumnSchema, ForeignKeyDescriptor};

/// One fetched row: `(column, text value)` pairs in the requested column order
pub type RawRow = Vec<(String, Option<String>)>;

/// Result of executing an insert or update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    /// Number of rows the statement touched
    pub rows_affected: u64,

    /// Primary key generated by an insert
    pub generated_key: Option<i64>,
}

/// Errors that can occur when talking to the database
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Source of table metadata
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Get the adapter name (e.g., "PostgreSQL")
    fn name(&self) -> &'static str;

    /// Fetch the columns of a table in ordinal order
    ///
    /// Returns `FetchError::TableNotFound` when the catalog reports no
    /// columns for the table.
    async fn fetch_columns(&self, table: &str) -> Result<Vec<ColumnSchema>, FetchError>;

    /// Fetch the foreign-key constraints declared on a table (may be empty)
    async fn fetch_foreign_keys(
        &self,
        table: &str,
    ) -> Result<Vec<ForeignKeyDescriptor>, FetchError>;

    /// Test the connection to the database
    async fn test_connection(&self) -> Result<(), FetchError>;
}

/// Single-row reads and writes
#[async_trait::async_trait]
pub trait RowStore: Send + Sync {
    /// Fetch at most one row whose `key` column equals `value`
    ///
    /// Every column in `columns` is returned as text so the caller decides
    /// how to coerce it.
    async fn fetch_row(
        &self,
        table: &str,
        key: &ColumnSchema,
        value: i64,
        columns: &[ColumnSchema],
    ) -> Result<Option<RawRow>, FetchError>;

    /// Execute one insert or update
    async fn execute(&self, statement: &Statement) -> Result<ExecOutcome, FetchError>;
}

/// Everything a record needs from its connection
pub trait Database: CatalogProvider + RowStore {}

impl<T: CatalogProvider + RowStore + ?Sized> Database for T {}
