//! Record error types

use rowbind_catalog::FetchError;
use rowbind_core::InvalidProperty;

/// Errors raised while building, reading or saving a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("Schema not found for table: {0}")]
    SchemaNotFound(String),

    #[error("No row in {table} with primary key {key}")]
    RowNotFound { table: String, key: i64 },

    #[error("Field {column} of {table} failed validation")]
    Validation { table: String, column: String },

    #[error("Property {0} is protected")]
    ProtectedProperty(String),

    #[error(transparent)]
    InvalidProperty(#[from] InvalidProperty),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Table {0} has no primary key")]
    MissingPrimaryKey(String),

    #[error("Table {0} has a composite primary key")]
    CompositePrimaryKey(String),

    #[error("Column {column} holds {value:?}, which is not an integer")]
    Decode { column: String, value: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

impl From<FetchError> for RecordError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::TableNotFound(table) => Self::SchemaNotFound(table),
            FetchError::AuthenticationError(msg) | FetchError::ConnectionError(msg) => {
                Self::Connection(msg)
            }
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}
