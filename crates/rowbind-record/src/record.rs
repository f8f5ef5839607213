//! Schema-bound records
//!
//! A [`Record`] is built from the live catalog: the table's primary key
//! column becomes a [`PrimaryKey`], columns named by foreign-key constraints
//! become [`ForeignKeyRef`]s, and every other column is a plain field that
//! can be read, written, validated and saved.

use crate::error::RecordError;
use rowbind_catalog::{CatalogProvider, Database, RowStore};
use rowbind_core::{
    ColumnFamily, ColumnSchema, ForeignKeyDescriptor, ForeignKeyRef, InvalidProperty, PrimaryKey,
    Value,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

/// Names starting with this prefix are reserved and cannot be set
pub const RESERVED_PREFIX: char = '_';

/// One table row bound to its catalog schema
pub struct Record {
    pub(crate) db: Arc<dyn Database>,
    pub(crate) table: String,
    pub(crate) primary_key: PrimaryKey,
    pub(crate) fields: Vec<ColumnSchema>,
    pub(crate) foreign_keys: Vec<ForeignKeyRef>,

    /// Current plain-field values
    pub(crate) values: HashMap<String, Value>,

    /// Plain-field values as last read from or written to the database
    pub(crate) pristine: HashMap<String, Value>,

    /// Values set under names that are not columns
    pub(crate) extras: HashMap<String, Value>,
}

impl Record {
    /// Bind a record to `table`, loading the row with primary key `key` if given
    ///
    /// Fails with `SchemaNotFound` when the catalog knows no columns for the
    /// table and with `RowNotFound` when `key` matches no row.
    pub async fn open(
        db: Arc<dyn Database>,
        table: &str,
        key: Option<i64>,
    ) -> Result<Self, RecordError> {
        let columns = db.fetch_columns(table).await?;
        if columns.is_empty() {
            return Err(RecordError::SchemaNotFound(table.to_string()));
        }
        let descriptors = db.fetch_foreign_keys(table).await?;

        let (primary_key, foreign_keys, fields) = partition(table, &columns, &descriptors)?;

        tracing::debug!(
            table,
            fields = fields.len(),
            foreign_keys = foreign_keys.len(),
            "Bound record schema"
        );

        let values: HashMap<String, Value> = fields
            .iter()
            .map(|f| (f.name.clone(), Value::Null))
            .collect();

        let mut record = Self {
            db,
            table: table.to_string(),
            primary_key,
            fields,
            foreign_keys,
            pristine: values.clone(),
            values,
            extras: HashMap::new(),
        };

        if let Some(key) = key {
            record.populate(key, &columns).await?;
        }

        Ok(record)
    }

    /// A new, unsaved record
    pub async fn new(db: Arc<dyn Database>, table: &str) -> Result<Self, RecordError> {
        Self::open(db, table, None).await
    }

    /// The existing row with primary key `key`
    pub async fn load(db: Arc<dyn Database>, table: &str, key: i64) -> Result<Self, RecordError> {
        Self::open(db, table, Some(key)).await
    }

    async fn populate(&mut self, key: i64, columns: &[ColumnSchema]) -> Result<(), RecordError> {
        let row = self
            .db
            .fetch_row(&self.table, self.primary_key.schema(), key, columns)
            .await?
            .ok_or_else(|| RecordError::RowNotFound {
                table: self.table.clone(),
                key,
            })?;

        for (name, raw) in row {
            let Some(column) = columns.iter().find(|c| c.name == name) else {
                continue;
            };
            let value = coerce(column, raw)?;

            if name == self.primary_key.key() {
                self.primary_key.set(Some(value.as_int().unwrap_or(key)));
            } else if let Some(fk) = self.foreign_keys.iter_mut().find(|f| f.key() == name) {
                fk.set(key_value(&value));
            } else if self.values.contains_key(&name) {
                self.values.insert(name, value);
            }
        }

        self.pristine = self.values.clone();

        tracing::debug!(table = %self.table, key, "Loaded record");
        Ok(())
    }

    /// Read a field by name
    ///
    /// Plain fields come first, then the primary key and foreign-key columns,
    /// then values stored with [`set`](Self::set) under non-column names.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if name == self.primary_key.key() {
            return Some(self.primary_key.value().map_or(Value::Null, Value::Int));
        }
        if let Some(fk) = self.foreign_keys.iter().find(|f| f.key() == name) {
            return Some(fk.value().map_or(Value::Null, Value::Int));
        }
        self.extras.get(name).cloned()
    }

    /// Write a field by name
    ///
    /// Names that are not columns are kept aside and never validated or
    /// saved. The primary key and foreign-key columns are not written through
    /// records, so setting one fails with `InvalidProperty`.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), RecordError> {
        if name.starts_with(RESERVED_PREFIX) {
            return Err(RecordError::ProtectedProperty(name.to_string()));
        }
        if name == self.primary_key.key() || self.foreign_key(name).is_some() {
            return Err(InvalidProperty {
                owner: "Record",
                name: name.to_string(),
            }
            .into());
        }

        let value = value.into();
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        } else {
            self.extras.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Load the record a foreign key points at
    ///
    /// `name` is the foreign-key column or its constraint name. Returns
    /// `Ok(None)` when the foreign key holds no value.
    pub async fn load_referenced(&self, name: &str) -> Result<Option<Record>, RecordError> {
        let fk = self.foreign_key(name).ok_or_else(|| InvalidProperty {
            owner: "Record",
            name: name.to_string(),
        })?;

        match fk.value() {
            None => Ok(None),
            Some(key) => Record::load(Arc::clone(&self.db), fk.referenced_table(), key)
                .await
                .map(Some),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyRef] {
        &self.foreign_keys
    }

    /// Foreign key by column or constraint name
    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKeyRef> {
        self.foreign_keys.iter().find(|f| f.answers_to(name))
    }

    /// Plain fields in declaration order
    pub fn fields(&self) -> &[ColumnSchema] {
        &self.fields
    }

    /// True until the record has a primary key value
    pub fn is_new(&self) -> bool {
        self.primary_key.value().is_none()
    }

    /// Plain fields whose value differs from the last load or save
    pub fn changed_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| self.current(&f.name) != self.saved(&f.name))
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        !self.changed_fields().is_empty()
    }

    /// Pretty JSON with the table name, keys and field values
    pub fn to_extended_json(&self) -> Result<String, RecordError> {
        #[derive(serde::Serialize)]
        struct Extended<'a> {
            table: &'a str,
            primary_key: &'a PrimaryKey,
            foreign_keys: &'a [ForeignKeyRef],
            fields: &'a Record,
        }

        Ok(serde_json::to_string_pretty(&Extended {
            table: &self.table,
            primary_key: &self.primary_key,
            foreign_keys: &self.foreign_keys,
            fields: self,
        })?)
    }

    pub(crate) fn current(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&Value::Null)
    }

    pub(crate) fn saved(&self, name: &str) -> &Value {
        self.pristine.get(name).unwrap_or(&Value::Null)
    }
}

/// Split catalog columns into primary key, foreign keys and plain fields
pub(crate) fn partition(
    table: &str,
    columns: &[ColumnSchema],
    descriptors: &[ForeignKeyDescriptor],
) -> Result<(PrimaryKey, Vec<ForeignKeyRef>, Vec<ColumnSchema>), RecordError> {
    let mut primary = columns.iter().filter(|c| c.is_primary());
    let primary_column = primary
        .next()
        .ok_or_else(|| RecordError::MissingPrimaryKey(table.to_string()))?;
    if primary.next().is_some() {
        return Err(RecordError::CompositePrimaryKey(table.to_string()));
    }

    let mut foreign_keys: Vec<ForeignKeyRef> = Vec::new();
    for descriptor in descriptors {
        if descriptor.column == primary_column.name {
            tracing::debug!(
                table,
                column = %descriptor.column,
                "Primary key is also a foreign key; keeping it as primary"
            );
            continue;
        }
        if foreign_keys.iter().any(|f| f.key() == descriptor.column) {
            continue;
        }

        let mut fk = ForeignKeyRef::new(descriptor);
        if let Some(column) = columns.iter().find(|c| c.name == descriptor.column) {
            fk.attach_schema(column.clone());
        }
        foreign_keys.push(fk);
    }

    let fields = columns
        .iter()
        .filter(|c| !c.is_primary() && !foreign_keys.iter().any(|f| f.key() == c.name))
        .cloned()
        .collect();

    Ok((PrimaryKey::new(primary_column.clone()), foreign_keys, fields))
}

/// Turn fetched text into a field value according to the column family
pub(crate) fn coerce(column: &ColumnSchema, raw: Option<String>) -> Result<Value, RecordError> {
    let Some(text) = raw else {
        return Ok(Value::Null);
    };

    match column.family() {
        ColumnFamily::Integer => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| RecordError::Decode {
                column: column.name.clone(),
                value: text,
            }),
        ColumnFamily::String | ColumnFamily::Other => Ok(Value::Text(text)),
    }
}

fn key_value(value: &Value) -> Option<i64> {
    value
        .as_int()
        .or_else(|| value.as_text().and_then(|s| s.trim().parse().ok()))
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, self.current(&field.name))?;
        }
        map.end()
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.table)
            .field("primary_key", &self.primary_key.value())
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}
