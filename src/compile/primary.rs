//! Primary name column resolution.

use super::encode::DEFAULT_STRING_MAX_LENGTH;
use super::error::{SchemaError, SchemaResult};
use crate::model::{Column, Table};

/// How a table's primary name column was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryColumn {
    /// Named by the table's `primaryNameColumn`.
    Override(String),
    /// A declared column named `<prefix>_name`.
    Convention(String),
    FirstRequiredString(String),
    FirstString(String),
    /// No candidate; `<table>_name` is generated.
    Synthesized(String),
}

impl PrimaryColumn {
    pub fn name(&self) -> &str {
        match self {
            PrimaryColumn::Override(name)
            | PrimaryColumn::Convention(name)
            | PrimaryColumn::FirstRequiredString(name)
            | PrimaryColumn::FirstString(name)
            | PrimaryColumn::Synthesized(name) => name,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, PrimaryColumn::Synthesized(_))
    }
}

/// Pick the primary name column of `table`.
///
/// Precedence: explicit override, `<prefix>_name`, first required String,
/// first String, then a synthesized `<table>_name`.
pub fn resolve_primary_column(table: &Table, prefix: &str) -> PrimaryColumn {
    if let Some(name) = &table.primary_name_column {
        return PrimaryColumn::Override(name.clone());
    }

    let convention = format!("{}_name", prefix);
    if table.find_column(&convention).is_some() {
        return PrimaryColumn::Convention(convention);
    }

    if let Some(column) = table.columns.iter().find(|c| c.is_string() && c.required) {
        return PrimaryColumn::FirstRequiredString(column.logical_name.clone());
    }

    if let Some(column) = table.columns.iter().find(|c| c.is_string()) {
        return PrimaryColumn::FirstString(column.logical_name.clone());
    }

    PrimaryColumn::Synthesized(format!("{}_name", table.logical_name))
}

/// Ordered column list of `table` with the primary column materialized.
///
/// A synthesized primary is inserted first as a required String column with
/// the default length. An override naming an undeclared column is taken to
/// exist on the target store and is not inserted.
pub fn materialize_primary_column(table: &Table, primary: &PrimaryColumn) -> SchemaResult<Vec<Column>> {
    // A synthesized name must not shadow a declared column of another type.
    let clash = match primary {
        PrimaryColumn::Override(name) => table.find_column(name).filter(|c| !c.is_string()),
        PrimaryColumn::Synthesized(name) => table.find_column(name),
        _ => None,
    };
    if let Some(column) = clash {
        return Err(SchemaError::NonTextPrimaryColumn {
            table: table.logical_name.clone(),
            column: column.logical_name.clone(),
            found: column.column_type.name().to_string(),
        });
    }

    let mut columns = Vec::with_capacity(table.columns.len() + 1);
    if primary.is_synthesized() {
        columns.push(synthesized_column(table, primary.name()));
    }
    columns.extend(table.columns.iter().cloned());
    Ok(columns)
}

fn synthesized_column(table: &Table, name: &str) -> Column {
    Column::string(name, format!("{} Name", table.display_name))
        .max_length(DEFAULT_STRING_MAX_LENGTH)
        .required()
}
