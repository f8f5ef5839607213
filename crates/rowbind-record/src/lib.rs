//! rowbind records
//!
//! Active-record style access to single table rows. A record reads its
//! shape from the database catalog, so no model type has to be declared:
//!
//! ```rust,ignore
//! use rowbind_catalog::ConnectionProvider;
//! use rowbind_core::Config;
//! use rowbind_record::Record;
//!
//! let provider = ConnectionProvider::new(Config::from_env()?.database);
//! let db = provider.connection().await?;
//!
//! let mut user = Record::load(db.clone(), "users", 1).await?;
//! user.set("name", "Ada Lovelace")?;
//! user.save().await?;
//!
//! let order = Record::load(db, "orders", 10).await?;
//! let owner = order.load_referenced("user_id").await?;
//! ```

pub mod error;
pub mod validation;
pub mod record;
mod save;

pub use error::RecordError;
pub use validation::{validate_field, FieldValidation};
pub use record::{Record, RESERVED_PREFIX};
