//! rowbind core
//!
//! Catalog-sourced column metadata, typed field values and the key value
//! objects shared by the catalog adapters and the record layer.

pub mod schema;
pub mod value;
pub mod keys;
pub mod config;

pub use schema::{ColumnSchema, ColumnFamily, KeyRole, ForeignKeyDescriptor};
pub use value::Value;
pub use keys::{PrimaryKey, ForeignKeyRef, InvalidProperty};
pub use config::{Config, DatabaseConfig, ConfigError};
