//! Shared tables for record tests
//!
//! A mock shop database with users, orders pointing at users, and an audit
//! log that has no primary key.

#![allow(dead_code)]

use rowbind_catalog::{Database, MockAdapter, MockAdapterBuilder};
use rowbind_core::{ColumnSchema, ForeignKeyDescriptor, KeyRole};
use std::sync::Arc;

pub fn users_columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("id", "integer")
            .with_udt_name("int4")
            .primary()
            .with_default(Some("nextval('users_id_seq'::regclass)")),
        ColumnSchema::new("email", "character varying")
            .with_udt_name("varchar")
            .not_null(),
        ColumnSchema::new("name", "character varying").with_udt_name("varchar"),
        ColumnSchema::new("login_count", "integer")
            .with_udt_name("int4")
            .not_null()
            .with_default(Some("0")),
        ColumnSchema::new("created_at", "timestamp without time zone")
            .with_udt_name("timestamp")
            .not_null()
            .with_default(Some("2024-06-01 00:00:00")),
        ColumnSchema::new("score", "numeric"),
    ]
}

pub fn orders_columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("id", "integer")
            .with_udt_name("int4")
            .primary(),
        ColumnSchema::new("user_id", "integer")
            .with_udt_name("int4")
            .with_key_role(KeyRole::Foreign),
        ColumnSchema::new("status", "character varying")
            .with_udt_name("varchar")
            .not_null()
            .with_default(Some("pending")),
        ColumnSchema::new("quantity", "integer")
            .with_udt_name("int4")
            .not_null(),
        ColumnSchema::new("note", "text"),
    ]
}

pub fn orders_foreign_keys() -> Vec<ForeignKeyDescriptor> {
    vec![ForeignKeyDescriptor::new("user_id", "orders_user_id_fkey", "users")]
}

pub fn audit_log_columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("happened_at", "timestamp").not_null(),
        ColumnSchema::new("message", "text"),
    ]
}

/// Mock adapter with one user, two orders (one without a user) and an audit log
pub fn shop() -> MockAdapter {
    MockAdapterBuilder::new()
        .with_table("users", users_columns(), vec![])
        .with_table("orders", orders_columns(), orders_foreign_keys())
        .with_table("audit_log", audit_log_columns(), vec![])
        .with_row(
            "users",
            1,
            &[
                ("id", Some("1")),
                ("email", Some("ada@example.com")),
                ("name", Some("Ada")),
                ("login_count", Some("3")),
                ("created_at", Some("2024-01-01 10:00:00")),
                ("score", Some("9.50")),
            ],
        )
        .with_row(
            "orders",
            10,
            &[
                ("id", Some("10")),
                ("user_id", Some("1")),
                ("status", Some("shipped")),
                ("quantity", Some("2")),
                ("note", Some("leave at door")),
            ],
        )
        .with_row(
            "orders",
            11,
            &[
                ("id", Some("11")),
                ("user_id", None),
                ("status", Some("pending")),
                ("quantity", Some("1")),
                ("note", None),
            ],
        )
        .build()
}

/// The same adapter as a shared database handle
pub fn as_database(mock: &MockAdapter) -> Arc<dyn Database> {
    Arc::new(mock.clone())
}

/// Install a test subscriber so `RUST_LOG=debug` shows record logs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
