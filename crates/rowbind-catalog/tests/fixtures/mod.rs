//! Test fixtures for catalog adapter integration tests
//!
//! Column layouts for a small shop database: users, orders referencing users,
//! and an audit log without a usable key.

#![allow(dead_code)]

use rowbind_catalog::{MockAdapter, MockAdapterBuilder};
use rowbind_core::{ColumnSchema, ForeignKeyDescriptor, KeyRole};

/// Users table
///
/// - Primary key (id)
/// - Required contact column (email)
/// - Defaulted counters and timestamps
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
            .with_default(Some("CURRENT_TIMESTAMP")),
    ]
}

/// Orders table with a foreign key to users
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
    ]
}

pub fn orders_foreign_keys() -> Vec<ForeignKeyDescriptor> {
    vec![ForeignKeyDescriptor::new("user_id", "orders_user_id_fkey", "users")]
}

/// Table without a primary key (edge case)
pub fn audit_log_columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("happened_at", "timestamp").not_null(),
        ColumnSchema::new("message", "text"),
    ]
}

/// Mock adapter holding all three tables and a couple of rows
pub fn shop_adapter() -> MockAdapter {
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
            ],
        )
        .build()
}
