//! PostgreSQL adapter using information_schema
//!
//! Columns come from `information_schema.columns`; primary and foreign key
//! membership is derived from `table_constraints` joined with
//! `key_column_usage`, and referenced tables from `constraint_column_usage`.
//!
//! Values travel as text in both directions. Rows are selected with every
//! column cast to `text`, and every bound parameter is sent as `text` and cast
//! to the column's `udt_name` inside the statement. A `Binding::Default`
//! renders the `DEFAULT` keyword instead of a parameter.
//!
//! ## Usage
//!
//! ```rust,ignore
//! // From configuration (TLS when `tls = true`)
//! let adapter = PostgresAdapter::connect(&config.database).await?;
//!
//! // Using connection string
//! let adapter = PostgresAdapter::from_connection_string(
//!     "host=localhost port=5432 dbname=mydb user=username password=password",
//!     "public",
//! ).await?;
//! ```
//!
//! Reference: https://www.postgresql.org/docs/current/information-schema.html

use crate::adapter::{CatalogProvider, RowStore, FetchError, RawRow, ExecOutcome};
use crate::statement::{Statement, Assignment, Binding};
use rowbind_core::{ColumnSchema, DatabaseConfig, ForeignKeyDescriptor, KeyRole};

#[cfg(feature = "postgres")]
use tokio_postgres::{Client, NoTls, Config as PgConfig};

#[cfg(feature = "postgres")]
use tokio_postgres::types::ToSql;

#[cfg(feature = "postgres")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "postgres")]
use native_tls::TlsConnector;

#[cfg(feature = "postgres")]
const COLUMNS_QUERY: &str = r#"
    SELECT
        c.column_name::text,
        c.data_type::text,
        c.udt_name::text,
        c.is_nullable::text,
        c.column_default::text,
        EXISTS (
            SELECT 1
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
             AND tc.table_name = kcu.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = c.table_schema
              AND tc.table_name = c.table_name
              AND kcu.column_name = c.column_name
        ) AS is_primary,
        EXISTS (
            SELECT 1
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
             AND tc.table_name = kcu.table_name
            WHERE tc.constraint_type = 'FOREIGN KEY'
              AND tc.table_schema = c.table_schema
              AND tc.table_name = c.table_name
              AND kcu.column_name = c.column_name
        ) AS is_foreign
    FROM information_schema.columns c
    WHERE c.table_schema::text = $1
      AND c.table_name::text = $2
    ORDER BY c.ordinal_position
"#;

#[cfg(feature = "postgres")]
const FOREIGN_KEYS_QUERY: &str = r#"
    SELECT
        kcu.column_name::text,
        tc.constraint_name::text,
        ccu.table_name::text
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
      ON tc.constraint_name = kcu.constraint_name
     AND tc.table_schema = kcu.table_schema
     AND tc.table_name = kcu.table_name
    JOIN information_schema.constraint_column_usage ccu
      ON ccu.constraint_name = tc.constraint_name
     AND ccu.constraint_schema = tc.constraint_schema
    WHERE tc.constraint_type = 'FOREIGN KEY'
      AND tc.table_schema::text = $1
      AND tc.table_name::text = $2
    ORDER BY kcu.ordinal_position
"#;

/// PostgreSQL adapter
///
/// Holds one client connection. Tables are looked up in a single schema
/// (`public` unless configured otherwise).
pub struct PostgresAdapter {
    /// PostgreSQL client (only available with postgres feature)
    #[cfg(feature = "postgres")]
    client: Client,

    /// Connection host
    host: String,

    /// Connection port
    port: u16,

    /// Database name
    database: String,

    /// Schema that table names are resolved in
    schema: String,
}

impl PostgresAdapter {
    /// Connect using a [`DatabaseConfig`], over TLS when `tls` is set
    #[cfg(feature = "postgres")]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, FetchError> {
        let conn_str = config.connection_string();
        let client = Self::establish(&conn_str, config.tls, &config.host, config.port).await?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            tls = config.tls,
            "Connected to PostgreSQL"
        );

        Ok(Self {
            client,
            host: config.host.clone(),
            port: config.port,
            database: config.name.clone(),
            schema: config.schema.clone(),
        })
    }

    /// Create adapter without postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub async fn connect(_config: &DatabaseConfig) -> Result<Self, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    /// Create adapter from a PostgreSQL connection string
    ///
    /// Supports standard PostgreSQL connection string format:
    /// `host=localhost port=5432 dbname=mydb user=postgres password=secret`
    #[cfg(feature = "postgres")]
    pub async fn from_connection_string(
        conn_str: &str,
        schema: impl Into<String>,
    ) -> Result<Self, FetchError> {
        Self::from_parts(conn_str, schema.into(), false).await
    }

    /// Create adapter without postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub async fn from_connection_string(
        _conn_str: &str,
        _schema: impl Into<String>,
    ) -> Result<Self, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    /// Create adapter from a PostgreSQL connection string with TLS
    ///
    /// The sslmode setting is ignored, TLS is always used.
    #[cfg(feature = "postgres")]
    pub async fn from_connection_string_with_tls(
        conn_str: &str,
        schema: impl Into<String>,
    ) -> Result<Self, FetchError> {
        Self::from_parts(conn_str, schema.into(), true).await
    }

    /// Create adapter without postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub async fn from_connection_string_with_tls(
        _conn_str: &str,
        _schema: impl Into<String>,
    ) -> Result<Self, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    #[cfg(feature = "postgres")]
    async fn from_parts(conn_str: &str, schema: String, tls: bool) -> Result<Self, FetchError> {
        let config: PgConfig = conn_str.parse()
            .map_err(|e| FetchError::ConfigError(format!(
                "Invalid connection string: {}", e
            )))?;

        // Extract connection info for logging
        let host = config.get_hosts()
            .first()
            .map(|h| format!("{:?}", h))
            .unwrap_or_else(|| "localhost".to_string());
        let port = config.get_ports()
            .first()
            .copied()
            .unwrap_or(5432);
        let database = config.get_dbname()
            .unwrap_or("postgres")
            .to_string();

        let client = Self::establish(conn_str, tls, &host, port).await?;

        Ok(Self {
            client,
            host,
            port,
            database,
            schema,
        })
    }

    /// Open the connection and drive it on a background task
    #[cfg(feature = "postgres")]
    async fn establish(
        conn_str: &str,
        tls: bool,
        host: &str,
        port: u16,
    ) -> Result<Client, FetchError> {
        let host = host.to_string();

        if tls {
            let connector = TlsConnector::builder()
                .build()
                .map_err(|e| FetchError::ConfigError(format!(
                    "Failed to create TLS connector: {}", e
                )))?;

            let make_tls = MakeTlsConnector::new(connector);
            let (client, connection) = tokio_postgres::connect(conn_str, make_tls)
                .await
                .map_err(|e| FetchError::AuthenticationError(format!(
                    "Failed to connect to PostgreSQL at {}:{} with TLS: {}",
                    host, port, e
                )))?;

            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(
                        host = %host,
                        port,
                        error = %e,
                        "PostgreSQL TLS connection error"
                    );
                }
            });

            Ok(client)
        } else {
            let (client, connection) = tokio_postgres::connect(conn_str, NoTls)
                .await
                .map_err(|e| FetchError::AuthenticationError(format!(
                    "Failed to connect to PostgreSQL at {}:{}: {}",
                    host, port, e
                )))?;

            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(host = %host, port, error = %e, "PostgreSQL connection error");
                }
            });

            Ok(client)
        }
    }

    /// Build a column description from one `information_schema.columns` row
    ///
    /// `is_nullable` is the catalog's `YES`/`NO` flag. A column has a default
    /// exactly when `column_default` is not NULL.
    pub fn column_from_catalog(
        name: String,
        data_type: String,
        udt_name: String,
        is_nullable: &str,
        column_default: Option<String>,
        is_primary: bool,
        is_foreign: bool,
    ) -> ColumnSchema {
        let key_role = if is_primary {
            KeyRole::Primary
        } else if is_foreign {
            KeyRole::Foreign
        } else {
            KeyRole::None
        };

        let mut column = ColumnSchema::new(name, data_type)
            .with_udt_name(udt_name)
            .with_nullable(is_nullable.eq_ignore_ascii_case("YES"))
            .with_key_role(key_role);

        if column_default.is_some() {
            column = column.with_default(column_default);
        }

        column
    }

    /// Render the single-row select used by `fetch_row`
    ///
    /// The key value is parameter `$1`.
    pub fn render_select(
        schema: &str,
        table: &str,
        key: &ColumnSchema,
        columns: &[ColumnSchema],
    ) -> String {
        let projection = columns
            .iter()
            .map(|c| format!("{}::text", quote_ident(&c.name)))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "SELECT {} FROM {} WHERE {} = {} LIMIT 1",
            projection,
            qualified_table(schema, table),
            quote_ident(&key.name),
            cast_param(1, &key.udt_name),
        )
    }

    /// Render an insert or update together with its text parameters
    pub fn render_statement(schema: &str, statement: &Statement) -> (String, Vec<Option<String>>) {
        let mut params = Vec::new();

        let sql = match statement {
            Statement::Insert { table, key, values } => {
                let target = qualified_table(schema, table);
                let returning = format!("RETURNING {}::text", quote_ident(&key.name));

                if values.is_empty() {
                    format!("INSERT INTO {} DEFAULT VALUES {}", target, returning)
                } else {
                    let columns = values
                        .iter()
                        .map(|a| quote_ident(&a.column))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let placeholders = values
                        .iter()
                        .map(|a| placeholder(a, &mut params))
                        .collect::<Vec<_>>()
                        .join(", ");

                    format!(
                        "INSERT INTO {} ({}) VALUES ({}) {}",
                        target, columns, placeholders, returning
                    )
                }
            }
            Statement::Update { table, key, key_value, assignments } => {
                let set = assignments
                    .iter()
                    .map(|a| {
                        format!("{} = {}", quote_ident(&a.column), placeholder(a, &mut params))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");

                params.push(Some(key_value.to_string()));

                format!(
                    "UPDATE {} SET {} WHERE {} = {}",
                    qualified_table(schema, table),
                    set,
                    quote_ident(&key.name),
                    cast_param(params.len(), &key.udt_name),
                )
            }
        };

        (sql, params)
    }

    /// Get the connection host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the connection port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the database name
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Get the schema table names resolve in
    pub fn schema(&self) -> &str {
        &self.schema
    }
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

fn cast_param(index: usize, sql_type: &str) -> String {
    format!("CAST(${}::text AS {})", index, quote_ident(sql_type))
}

fn placeholder(assignment: &Assignment, params: &mut Vec<Option<String>>) -> String {
    match &assignment.binding {
        Binding::Default => "DEFAULT".to_string(),
        Binding::Value(value) => {
            params.push(value.to_sql_text());
            cast_param(params.len(), &assignment.sql_type)
        }
    }
}

/// Which kind of query failed
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    /// `information_schema` lookups, where a missing relation means a missing table
    Catalog,

    /// Row reads and writes, where a missing relation, column or type is a query error
    Row,
}

#[cfg(feature = "postgres")]
fn map_query_error(e: tokio_postgres::Error, table: &str, kind: QueryKind) -> FetchError {
    if e.is_closed() {
        return FetchError::ConnectionError(e.to_string());
    }

    classify_error(e.to_string(), table, kind)
}

#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
fn classify_error(err_str: String, table: &str, kind: QueryKind) -> FetchError {
    if kind == QueryKind::Catalog && err_str.contains("does not exist") {
        FetchError::TableNotFound(table.to_string())
    } else if err_str.contains("permission denied") {
        FetchError::PermissionDenied(format!("Cannot access {}: {}", table, err_str))
    } else {
        FetchError::QueryError(err_str)
    }
}

#[cfg(feature = "postgres")]
fn as_params(params: &[Option<String>]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

#[cfg(feature = "postgres")]
fn column_text(row: &tokio_postgres::Row, idx: usize) -> Result<Option<String>, FetchError> {
    row.try_get::<_, Option<String>>(idx)
        .map_err(|e| FetchError::QueryError(format!("Unreadable column {}: {}", idx, e)))
}

#[async_trait::async_trait]
impl CatalogProvider for PostgresAdapter {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    #[cfg(feature = "postgres")]
    async fn fetch_columns(&self, table: &str) -> Result<Vec<ColumnSchema>, FetchError> {
        let rows = self.client
            .query(COLUMNS_QUERY, &[&self.schema, &table])
            .await
            .map_err(|e| map_query_error(e, table, QueryKind::Catalog))?;

        let mut columns = Vec::with_capacity(rows.len());

        for row in rows {
            let name = column_text(&row, 0)?.unwrap_or_default();
            let data_type = column_text(&row, 1)?.unwrap_or_default();
            let udt_name = column_text(&row, 2)?.unwrap_or_else(|| data_type.clone());
            let is_nullable = column_text(&row, 3)?.unwrap_or_default();
            let column_default = column_text(&row, 4)?;
            let is_primary: bool = row.try_get(5)
                .map_err(|e| FetchError::QueryError(e.to_string()))?;
            let is_foreign: bool = row.try_get(6)
                .map_err(|e| FetchError::QueryError(e.to_string()))?;

            columns.push(Self::column_from_catalog(
                name,
                data_type,
                udt_name,
                &is_nullable,
                column_default,
                is_primary,
                is_foreign,
            ));
        }

        if columns.is_empty() {
            return Err(FetchError::TableNotFound(format!(
                "Table {}.{} not found or has no columns",
                self.schema, table
            )));
        }

        tracing::debug!(table, columns = columns.len(), "Fetched column metadata");

        Ok(columns)
    }

    #[cfg(not(feature = "postgres"))]
    async fn fetch_columns(&self, _table: &str) -> Result<Vec<ColumnSchema>, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    #[cfg(feature = "postgres")]
    async fn fetch_foreign_keys(
        &self,
        table: &str,
    ) -> Result<Vec<ForeignKeyDescriptor>, FetchError> {
        let rows = self.client
            .query(FOREIGN_KEYS_QUERY, &[&self.schema, &table])
            .await
            .map_err(|e| map_query_error(e, table, QueryKind::Catalog))?;

        let mut foreign_keys = Vec::with_capacity(rows.len());
        for row in rows {
            foreign_keys.push(ForeignKeyDescriptor::new(
                column_text(&row, 0)?.unwrap_or_default(),
                column_text(&row, 1)?.unwrap_or_default(),
                column_text(&row, 2)?.unwrap_or_default(),
            ));
        }

        Ok(foreign_keys)
    }

    #[cfg(not(feature = "postgres"))]
    async fn fetch_foreign_keys(
        &self,
        _table: &str,
    ) -> Result<Vec<ForeignKeyDescriptor>, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    #[cfg(feature = "postgres")]
    async fn test_connection(&self) -> Result<(), FetchError> {
        // Simple query to test connection
        self.client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| FetchError::ConnectionError(format!("Connection test failed: {}", e)))?;
        Ok(())
    }

    #[cfg(not(feature = "postgres"))]
    async fn test_connection(&self) -> Result<(), FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }
}

#[async_trait::async_trait]
impl RowStore for PostgresAdapter {
    #[cfg(feature = "postgres")]
    async fn fetch_row(
        &self,
        table: &str,
        key: &ColumnSchema,
        value: i64,
        columns: &[ColumnSchema],
    ) -> Result<Option<RawRow>, FetchError> {
        let sql = Self::render_select(&self.schema, table, key, columns);
        let key_text = Some(value.to_string());

        let row = self.client
            .query_opt(sql.as_str(), &[&key_text])
            .await
            .map_err(|e| map_query_error(e, table, QueryKind::Row))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut raw = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            raw.push((column.name.clone(), column_text(&row, idx)?));
        }

        Ok(Some(raw))
    }

    #[cfg(not(feature = "postgres"))]
    async fn fetch_row(
        &self,
        _table: &str,
        _key: &ColumnSchema,
        _value: i64,
        _columns: &[ColumnSchema],
    ) -> Result<Option<RawRow>, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    #[cfg(feature = "postgres")]
    async fn execute(&self, statement: &Statement) -> Result<ExecOutcome, FetchError> {
        let (sql, params) = Self::render_statement(&self.schema, statement);
        let params = as_params(&params);
        let table = statement.table();

        tracing::debug!(sql = %sql, "Executing statement");

        match statement {
            Statement::Insert { .. } => {
                let rows = self.client
                    .query(sql.as_str(), &params)
                    .await
                    .map_err(|e| map_query_error(e, table, QueryKind::Row))?;

                let generated_key = match rows.first() {
                    Some(row) => column_text(row, 0)?.and_then(|k| k.parse().ok()),
                    None => None,
                };

                Ok(ExecOutcome {
                    rows_affected: rows.len() as u64,
                    generated_key,
                })
            }
            Statement::Update { .. } => {
                let rows_affected = self.client
                    .execute(sql.as_str(), &params)
                    .await
                    .map_err(|e| map_query_error(e, table, QueryKind::Row))?;

                Ok(ExecOutcome {
                    rows_affected,
                    generated_key: None,
                })
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn execute(&self, _statement: &Statement) -> Result<ExecOutcome, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }
}
