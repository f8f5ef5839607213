//! Shared, lazily opened database connection

use crate::adapter::{Database, FetchError};
use crate::postgres::PostgresAdapter;
use rowbind_core::DatabaseConfig;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Hands out one connection to every caller
///
/// The connection is opened on the first call to [`connection`](Self::connection)
/// and reused afterwards. Concurrent first calls wait for the same attempt.
/// A failed attempt is not cached, so the next call retries.
pub struct ConnectionProvider {
    config: Option<DatabaseConfig>,
    cell: OnceCell<Arc<dyn Database>>,
}

impl ConnectionProvider {
    /// Provider that connects to PostgreSQL with `config` on first use
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config: Some(config),
            cell: OnceCell::new(),
        }
    }

    /// Provider that always returns an already-open database
    pub fn from_database(db: Arc<dyn Database>) -> Self {
        Self {
            config: None,
            cell: OnceCell::from(db),
        }
    }

    /// Get the shared connection, opening it if needed
    pub async fn connection(&self) -> Result<Arc<dyn Database>, FetchError> {
        let db = self
            .cell
            .get_or_try_init(|| async {
                let config = self.config.as_ref().ok_or_else(|| {
                    FetchError::ConfigError("No connection settings configured".to_string())
                })?;

                tracing::debug!(
                    host = %config.host,
                    database = %config.name,
                    "Opening shared connection"
                );
                let adapter = PostgresAdapter::connect(config).await?;
                Ok::<_, FetchError>(Arc::new(adapter) as Arc<dyn Database>)
            })
            .await?;

        Ok(Arc::clone(db))
    }

    /// Whether the connection has been opened
    pub fn is_connected(&self) -> bool {
        self.cell.initialized()
    }
}

impl std::fmt::Debug for ConnectionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProvider")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}
