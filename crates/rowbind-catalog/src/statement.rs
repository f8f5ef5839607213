//! Backend-neutral description of the writes a record issues

use rowbind_core::{ColumnSchema, Value};

/// What gets bound for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A literal value
    Value(Value),

    /// The column's database default
    Default,
}

/// One `column = binding` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub column: String,

    /// Concrete type the bound text is cast to
    pub sql_type: String,

    pub binding: Binding,
}

impl Assignment {
    pub fn new(column: &ColumnSchema, binding: Binding) -> Self {
        Self {
            column: column.name.clone(),
            sql_type: column.udt_name.clone(),
            binding,
        }
    }

    pub fn value(column: &ColumnSchema, value: Value) -> Self {
        Self::new(column, Binding::Value(value))
    }

    pub fn database_default(column: &ColumnSchema) -> Self {
        Self::new(column, Binding::Default)
    }
}

/// A single-row write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Insert one row and report the generated key
    Insert {
        table: String,
        key: ColumnSchema,
        values: Vec<Assignment>,
    },

    /// Update the row whose `key` column equals `key_value`
    Update {
        table: String,
        key: ColumnSchema,
        key_value: i64,
        assignments: Vec<Assignment>,
    },
}

impl Statement {
    pub fn table(&self) -> &str {
        match self {
            Self::Insert { table, .. } | Self::Update { table, .. } => table,
        }
    }

    pub fn assignments(&self) -> &[Assignment] {
        match self {
            Self::Insert { values, .. } => values,
            Self::Update { assignments, .. } => assignments,
        }
    }

    /// Names of the columns the statement writes, in order
    pub fn columns(&self) -> Vec<&str> {
        self.assignments().iter().map(|a| a.column.as_str()).collect()
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert { .. })
    }
}
