//! Primary and foreign key value objects
//!
//! Both pair an immutable column description with a mutable integer value.
//! They serialize with a fixed field order: `key`, `value`, `schema`.

use crate::schema::{ColumnSchema, ForeignKeyDescriptor};
use serde::Serialize;

/// Lookup of a property that the key object does not declare
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid property name for object of type {owner}: {name}")]
pub struct InvalidProperty {
    pub owner: &'static str,
    pub name: String,
}

fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// A table's primary key column and its current value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryKey {
    key: String,
    value: Option<i64>,
    schema: ColumnSchema,
}

impl PrimaryKey {
    /// Create an unset primary key for a column
    pub fn new(schema: ColumnSchema) -> Self {
        Self {
            key: schema.name.clone(),
            value: None,
            schema,
        }
    }

    pub fn with_value(mut self, value: Option<i64>) -> Self {
        self.value = value;
        self
    }

    /// Column name
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<i64> {
        self.value
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn set(&mut self, value: Option<i64>) {
        self.value = value;
    }

    /// Read a property by name as JSON
    pub fn property(&self, name: &str) -> Result<serde_json::Value, InvalidProperty> {
        match name {
            "key" => Ok(to_json(&self.key)),
            "value" => Ok(to_json(&self.value)),
            "schema" => Ok(to_json(&self.schema)),
            _ => Err(InvalidProperty {
                owner: "PrimaryKey",
                name: name.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

/// A foreign-key column, the constraint behind it, and its current value
///
/// The column schema is optional: the constraint list and the column list are
/// fetched separately and the schema is attached only when both agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyRef {
    key: String,
    value: Option<i64>,
    schema: Option<ColumnSchema>,
    constraint_name: String,
    referenced_table: String,
}

impl ForeignKeyRef {
    pub fn new(descriptor: &ForeignKeyDescriptor) -> Self {
        Self {
            key: descriptor.column.clone(),
            value: None,
            schema: None,
            constraint_name: descriptor.constraint_name.clone(),
            referenced_table: descriptor.referenced_table.clone(),
        }
    }

    pub fn with_value(mut self, value: Option<i64>) -> Self {
        self.value = value;
        self
    }

    /// Attach the column description once it is known
    pub fn attach_schema(&mut self, schema: ColumnSchema) {
        self.schema = Some(schema);
    }

    /// Constrained column name
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<i64> {
        self.value
    }

    pub fn schema(&self) -> Option<&ColumnSchema> {
        self.schema.as_ref()
    }

    pub fn constraint_name(&self) -> &str {
        &self.constraint_name
    }

    pub fn referenced_table(&self) -> &str {
        &self.referenced_table
    }

    /// True if `name` is either the column or the constraint name
    pub fn answers_to(&self, name: &str) -> bool {
        self.key == name || self.constraint_name == name
    }

    pub fn set(&mut self, value: Option<i64>) {
        self.value = value;
    }

    /// Read a property by name as JSON
    pub fn property(&self, name: &str) -> Result<serde_json::Value, InvalidProperty> {
        match name {
            "key" => Ok(to_json(&self.key)),
            "value" => Ok(to_json(&self.value)),
            "schema" => Ok(to_json(&self.schema)),
            "constraint_name" => Ok(to_json(&self.constraint_name)),
            "referenced_table" => Ok(to_json(&self.referenced_table)),
            _ => Err(InvalidProperty {
                owner: "ForeignKeyRef",
                name: name.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id_column() -> ColumnSchema {
        ColumnSchema::new("test_id", "int").primary()
    }

    #[test]
    fn primary_key_defaults_to_unset() {
        let pk = PrimaryKey::new(id_column());
        assert_eq!(pk.key(), "test_id");
        assert_eq!(pk.value(), None);
        assert_eq!(pk.schema(), &id_column());
    }

    #[test]
    fn primary_key_set() {
        let mut pk = PrimaryKey::new(id_column()).with_value(Some(1));
        pk.set(Some(2));
        assert_eq!(pk.value(), Some(2));
    }

    #[test]
    fn primary_key_properties() {
        let pk = PrimaryKey::new(id_column()).with_value(Some(1));
        assert_eq!(pk.property("key").unwrap(), json!("test_id"));
        assert_eq!(pk.property("value").unwrap(), json!(1));
        assert_eq!(pk.property("schema").unwrap()["name"], json!("test_id"));

        let err = pk.property("foo").unwrap_err();
        assert_eq!(err.name, "foo");
        assert_eq!(err.owner, "PrimaryKey");
    }

    #[test]
    fn primary_key_serializes_in_fixed_order() {
        let pk = PrimaryKey::new(id_column());
        let text = pk.to_string();

        assert!(text.starts_with(r#"{"key":"test_id","value":null,"schema":{"name":"test_id""#));

        let with_value = PrimaryKey::new(id_column()).with_value(Some(1)).to_string();
        assert!(with_value.starts_with(r#"{"key":"test_id","value":1,"schema":"#));
    }

    #[test]
    fn foreign_key_from_descriptor() {
        let descriptor = ForeignKeyDescriptor::new("user_id", "orders_user_id_fkey", "users");
        let fk = ForeignKeyRef::new(&descriptor);

        assert_eq!(fk.key(), "user_id");
        assert_eq!(fk.value(), None);
        assert!(fk.schema().is_none());
        assert_eq!(fk.constraint_name(), "orders_user_id_fkey");
        assert_eq!(fk.referenced_table(), "users");
        assert!(fk.answers_to("user_id"));
        assert!(fk.answers_to("orders_user_id_fkey"));
        assert!(!fk.answers_to("users"));
    }

    #[test]
    fn foreign_key_set_and_attach() {
        let descriptor = ForeignKeyDescriptor::new("user_id", "orders_user_id_fkey", "users");
        let mut fk = ForeignKeyRef::new(&descriptor).with_value(Some(1));
        fk.set(Some(2));
        fk.attach_schema(ColumnSchema::new("user_id", "integer"));

        assert_eq!(fk.value(), Some(2));
        assert_eq!(fk.schema().map(|s| s.data_type.as_str()), Some("integer"));
    }

    #[test]
    fn foreign_key_properties() {
        let descriptor = ForeignKeyDescriptor::new("user_id", "orders_user_id_fkey", "users");
        let fk = ForeignKeyRef::new(&descriptor).with_value(Some(1));

        assert_eq!(fk.property("value").unwrap(), json!(1));
        assert_eq!(fk.property("schema").unwrap(), serde_json::Value::Null);
        assert_eq!(fk.property("referenced_table").unwrap(), json!("users"));
        assert!(fk.property("foo").is_err());
    }

    #[test]
    fn foreign_key_serializes_in_fixed_order() {
        let descriptor = ForeignKeyDescriptor::new("test_id", "t_test_id_fkey", "test");
        let fk = ForeignKeyRef::new(&descriptor).with_value(Some(1));

        let compact = serde_json::to_string(&fk).unwrap();
        assert_eq!(
            compact,
            r#"{"key":"test_id","value":1,"schema":null,"constraint_name":"t_test_id_fkey","referenced_table":"test"}"#
        );

        // Display is the pretty form
        assert!(fk.to_string().contains("\n  \"key\": \"test_id\""));
    }
}
