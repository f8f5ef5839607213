//! Column metadata and type families

use serde::{Deserialize, Serialize};

/// Coarse grouping of declared data types
///
/// Field validation only distinguishes integer-like and string-like columns.
/// Everything else is carried as opaque text and never checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFamily {
    /// Integer types of any width
    Integer,

    /// Character types, plus the date/time types exchanged as text
    String,

    /// Anything else (decimal, double, blob, char, datetime, ...)
    Other,
}

impl ColumnFamily {
    /// Classify a catalog `data_type`
    ///
    /// Accepts both MySQL and PostgreSQL spellings. A length or precision
    /// suffix such as `varchar(255)` is ignored.
    pub fn from_data_type(data_type: &str) -> Self {
        let base = data_type
            .split('(')
            .next()
            .unwrap_or(data_type)
            .trim()
            .to_lowercase();

        match base.as_str() {
            "int" | "integer" | "tinyint" | "smallint" | "mediumint" | "bigint" => Self::Integer,
            "int2" | "int4" | "int8" => Self::Integer,
            "serial" | "serial2" | "serial4" | "serial8" | "smallserial" | "bigserial" => {
                Self::Integer
            }

            "varchar" | "character varying" | "text" | "tinytext" | "mediumtext" => Self::String,
            "date" | "timestamp" | "timestamptz" => Self::String,
            "timestamp without time zone" | "timestamp with time zone" => Self::String,

            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for ColumnFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::String => write!(f, "STRING"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// Role a column plays in the table's key constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Foreign,
}

/// A column as reported by the system catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,

    /// Declared data type (`integer`, `varchar`, ...)
    pub data_type: String,

    /// Concrete type name used when casting bound parameters (`int4`, `varchar`, ...)
    pub udt_name: String,

    /// Whether NULL is accepted
    pub is_nullable: bool,

    /// Whether the catalog reported a default clause
    pub has_default: bool,

    /// The default expression, if any
    pub default_value: Option<String>,

    /// Primary/foreign key membership
    pub key_role: KeyRole,
}

impl ColumnSchema {
    /// Create a nullable column without default or key role
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let data_type = data_type.into();
        Self {
            name: name.into(),
            udt_name: data_type.clone(),
            data_type,
            is_nullable: true,
            has_default: false,
            default_value: None,
            key_role: KeyRole::None,
        }
    }

    /// Set the concrete type name
    pub fn with_udt_name(mut self, udt_name: impl Into<String>) -> Self {
        self.udt_name = udt_name.into();
        self
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = nullable;
        self
    }

    /// Shorthand for `with_nullable(false)`
    pub fn not_null(self) -> Self {
        self.with_nullable(false)
    }

    /// Declare a default clause. `None` records a default whose value is NULL.
    pub fn with_default(mut self, default: Option<impl Into<String>>) -> Self {
        self.has_default = true;
        self.default_value = default.map(Into::into);
        self
    }

    /// Set key role
    pub fn with_key_role(mut self, key_role: KeyRole) -> Self {
        self.key_role = key_role;
        self
    }

    /// Mark as the primary key column
    pub fn primary(self) -> Self {
        self.not_null().with_key_role(KeyRole::Primary)
    }

    /// Type family of the declared data type
    pub fn family(&self) -> ColumnFamily {
        ColumnFamily::from_data_type(&self.data_type)
    }

    pub fn is_primary(&self) -> bool {
        self.key_role == KeyRole::Primary
    }
}

/// A foreign-key constraint on a single column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    /// Constrained column in the owning table
    pub column: String,

    /// Constraint name
    pub constraint_name: String,

    /// Table the column points at
    pub referenced_table: String,
}

impl ForeignKeyDescriptor {
    pub fn new(
        column: impl Into<String>,
        constraint_name: impl Into<String>,
        referenced_table: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            constraint_name: constraint_name.into(),
            referenced_table: referenced_table.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_families() {
        let types = [
            "int", "INTEGER", "tinyint", "smallint", "mediumint", "bigint", "int4", "bigserial",
        ];
        for ty in types {
            assert_eq!(ColumnFamily::from_data_type(ty), ColumnFamily::Integer, "{ty}");
        }
    }

    #[test]
    fn string_families() {
        for ty in [
            "varchar",
            "varchar(255)",
            "character varying",
            "text",
            "mediumtext",
            "tinytext",
            "date",
            "timestamp",
            "timestamp without time zone",
        ] {
            assert_eq!(ColumnFamily::from_data_type(ty), ColumnFamily::String, "{ty}");
        }
    }

    #[test]
    fn unchecked_families() {
        for ty in ["decimal(10,2)", "double", "longblob", "char", "datetime", "numeric", "jsonb"] {
            assert_eq!(ColumnFamily::from_data_type(ty), ColumnFamily::Other, "{ty}");
        }
    }

    #[test]
    fn column_builder() {
        let column = ColumnSchema::new("status", "varchar")
            .with_udt_name("varchar")
            .not_null()
            .with_default(Some("'pending'"));

        assert!(!column.is_nullable);
        assert!(column.has_default);
        assert_eq!(column.default_value.as_deref(), Some("'pending'"));
        assert_eq!(column.family(), ColumnFamily::String);
        assert_eq!(column.key_role, KeyRole::None);
    }

    #[test]
    fn null_default_is_still_a_default() {
        let column = ColumnSchema::new("note", "text").with_default(None::<String>);
        assert!(column.has_default);
        assert!(column.default_value.is_none());
    }

    #[test]
    fn primary_column() {
        let column = ColumnSchema::new("id", "integer").primary();
        assert!(column.is_primary());
        assert!(!column.is_nullable);
        assert_eq!(column.udt_name, "integer");
    }
}
