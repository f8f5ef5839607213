//! Catalog providers and row stores for rowbind records
//!
//! A record learns its shape from the database's system catalog and persists
//! itself through single-row statements. This crate defines both seams and
//! ships two implementations:
//!
//! - `PostgresAdapter` - `information_schema` introspection over `tokio-postgres`
//!   (requires the `postgres` feature)
//! - `MockAdapter` - in-memory tables for tests and demos
//!
//! `ConnectionProvider` hands out one lazily-created connection that every
//! record shares.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rowbind_catalog::{ConnectionProvider, CatalogProvider};
//! use rowbind_core::Config;
//!
//! let config = Config::from_env()?;
//! let provider = ConnectionProvider::new(config.database);
//! let db = provider.connection().await?;
//! let columns = db.fetch_columns("users").await?;
//! ```

pub mod adapter;
pub mod statement;
pub mod postgres;
pub mod mock;
pub mod connection;

pub use adapter::{CatalogProvider, RowStore, Database, FetchError, RawRow, ExecOutcome};
pub use statement::{Statement, Assignment, Binding};
pub use postgres::PostgresAdapter;
pub use mock::{MockAdapter, MockAdapterBuilder};
pub use connection::ConnectionProvider;
