//! Field validation against column metadata

use rowbind_core::{ColumnFamily, ColumnSchema, Value};

/// Outcome of checking one field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldValidation {
    /// The value may be written
    pub valid: bool,

    /// Bind the column's database default instead of the value
    pub use_default: bool,
}

impl FieldValidation {
    const INVALID: Self = Self { valid: false, use_default: false };
    const VALID: Self = Self { valid: true, use_default: false };
    const DEFAULT: Self = Self { valid: true, use_default: true };
}

/// Check `value` against `column`
///
/// A NULL in a NOT NULL column is only accepted when the column has a
/// non-null default, and then the default is written instead. Every other
/// value must match the column's family: integer columns take `Int`, string
/// columns take `Text`. `Null` matches neither family. Columns of any other
/// family accept anything.
pub fn validate_field(column: &ColumnSchema, value: &Value) -> FieldValidation {
    if value.is_null() && !column.is_nullable {
        return if column.has_default && column.default_value.is_some() {
            FieldValidation::DEFAULT
        } else {
            FieldValidation::INVALID
        };
    }

    let matches = match column.family() {
        ColumnFamily::Integer => matches!(value, Value::Int(_)),
        ColumnFamily::String => matches!(value, Value::Text(_)),
        ColumnFamily::Other => true,
    };

    if matches {
        FieldValidation::VALID
    } else {
        FieldValidation::INVALID
    }
}
