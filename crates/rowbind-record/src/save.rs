//! Persisting records
//!
//! A record without a primary key value is inserted with every plain field.
//! A record with one is updated with only the fields that changed since the
//! last load or save. Both paths validate every plain field first and write
//! nothing if any field is invalid. Fields written as the column default are
//! read back afterwards so the record holds what the database stored.

use crate::error::RecordError;
use crate::record::{coerce, Record};
use crate::validation::{validate_field, FieldValidation};
use rowbind_catalog::{Assignment, Binding, RowStore, Statement};
use rowbind_core::ColumnSchema;

impl Record {
    /// Insert or update the row
    ///
    /// Returns `Ok(true)` when exactly one row was written and `Ok(false)`
    /// when nothing was written: an update with no changed fields, or a
    /// statement that touched no rows.
    pub async fn save(&mut self) -> Result<bool, RecordError> {
        let checked = self.validate()?;

        match self.primary_key.value() {
            None => self.insert(&checked).await,
            Some(key) => self.update(key, &checked).await,
        }
    }

    /// Validate every plain field, stopping at the first invalid one
    fn validate(&self) -> Result<Vec<FieldValidation>, RecordError> {
        self.fields
            .iter()
            .map(|field| {
                let value = self.current(&field.name);
                let outcome = validate_field(field, value);
                if outcome.valid {
                    Ok(outcome)
                } else {
                    tracing::warn!(
                        table = %self.table,
                        column = %field.name,
                        family = %field.family(),
                        value = value.type_name(),
                        "Field failed validation"
                    );
                    Err(RecordError::Validation {
                        table: self.table.clone(),
                        column: field.name.clone(),
                    })
                }
            })
            .collect()
    }

    fn assignment(&self, field: &ColumnSchema, outcome: FieldValidation) -> Assignment {
        if outcome.use_default {
            Assignment::database_default(field)
        } else {
            Assignment::value(field, self.current(&field.name).clone())
        }
    }

    async fn insert(&mut self, checked: &[FieldValidation]) -> Result<bool, RecordError> {
        let values = self
            .fields
            .iter()
            .zip(checked)
            .map(|(field, outcome)| self.assignment(field, *outcome))
            .collect();

        let statement = Statement::Insert {
            table: self.table.clone(),
            key: self.primary_key.schema().clone(),
            values,
        };

        let outcome = self.db.execute(&statement).await?;
        if outcome.rows_affected != 1 {
            tracing::warn!(
                table = %self.table,
                rows = outcome.rows_affected,
                "Insert did not write one row"
            );
            return Ok(false);
        }

        let Some(key) = outcome.generated_key else {
            return Err(RecordError::Database(format!(
                "Insert into {} reported no generated key",
                self.table
            )));
        };

        self.primary_key.set(Some(key));
        self.commit(&statement, key).await?;

        tracing::info!(table = %self.table, key, "Inserted record");
        Ok(true)
    }

    async fn update(&mut self, key: i64, checked: &[FieldValidation]) -> Result<bool, RecordError> {
        let assignments: Vec<Assignment> = self
            .fields
            .iter()
            .zip(checked)
            .filter(|(field, _)| self.current(&field.name) != self.saved(&field.name))
            .map(|(field, outcome)| self.assignment(field, *outcome))
            .collect();

        if assignments.is_empty() {
            tracing::debug!(table = %self.table, key, "No changes to save");
            return Ok(false);
        }

        let statement = Statement::Update {
            table: self.table.clone(),
            key: self.primary_key.schema().clone(),
            key_value: key,
            assignments,
        };

        let outcome = self.db.execute(&statement).await?;
        if outcome.rows_affected != 1 {
            tracing::warn!(
                table = %self.table,
                key,
                rows = outcome.rows_affected,
                "Update did not write one row"
            );
            return Ok(false);
        }

        self.commit(&statement, key).await?;

        tracing::info!(
            table = %self.table,
            key,
            columns = ?statement.columns(),
            "Updated record"
        );
        Ok(true)
    }

    /// Mark the written columns as matching the database
    async fn commit(&mut self, statement: &Statement, key: i64) -> Result<(), RecordError> {
        let defaulted: Vec<ColumnSchema> = statement
            .assignments()
            .iter()
            .filter(|a| a.binding == Binding::Default)
            .filter_map(|a| self.fields.iter().find(|f| f.name == a.column).cloned())
            .collect();

        if !defaulted.is_empty() {
            self.reload_columns(key, &defaulted).await?;
        }

        for column in statement.columns() {
            let value = self.current(column).clone();
            self.pristine.insert(column.to_string(), value);
        }
        Ok(())
    }

    async fn reload_columns(
        &mut self,
        key: i64,
        columns: &[ColumnSchema],
    ) -> Result<(), RecordError> {
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
            self.values.insert(name, value);
        }

        tracing::debug!(
            table = %self.table,
            key,
            columns = columns.len(),
            "Read back defaulted fields"
        );
        Ok(())
    }
}
