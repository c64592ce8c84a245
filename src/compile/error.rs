//! Schema compilation errors.

use thiserror::Error;

/// Result type for compilation.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that abort compilation of a schema.
///
/// Every variant names the table it was raised for so a diagnostic can point
/// straight at the offending definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Unknown column type '{type_name}' for column '{column}' in table '{table}'")]
    UnknownColumnType {
        table: String,
        column: String,
        type_name: String,
    },

    #[error("Duplicate table name: '{0}'")]
    DuplicateTable(String),

    #[error("Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Invalid logical name '{name}' in table '{table}': expected a letter followed by letters, digits or underscores")]
    InvalidLogicalName { table: String, name: String },

    #[error("Column '{column}' in table '{table}' has a zero max length")]
    InvalidMaxLength { table: String, column: String },

    #[error("Lookup column '{column}' in table '{table}' has no target")]
    MissingLookupTarget { table: String, column: String },

    #[error("Lookup column '{column}' in table '{table}' targets unknown table '{target}'")]
    UnknownLookupTarget {
        table: String,
        column: String,
        target: String,
    },

    #[error("Choice column '{column}' in table '{table}' has no options")]
    EmptyChoice { table: String, column: String },

    #[error("Choice column '{column}' in table '{table}' repeats option value {value}")]
    DuplicateOptionValue {
        table: String,
        column: String,
        value: i32,
    },

    #[error("Primary name column '{column}' of table '{table}' must be a String column, found {found}")]
    NonTextPrimaryColumn {
        table: String,
        column: String,
        found: String,
    },

    #[error("Relationship name '{name}' is produced by both {first} and {second}")]
    DuplicateRelationshipName {
        name: String,
        first: String,
        second: String,
    },

    #[error("Dependency ordering failed at table '{table}'")]
    DependencyCycle { table: String },
}

impl SchemaError {
    /// The table the error was raised for, when there is exactly one.
    pub fn table(&self) -> Option<&str> {
        match self {
            SchemaError::UnknownColumnType { table, .. }
            | SchemaError::DuplicateColumn { table, .. }
            | SchemaError::InvalidLogicalName { table, .. }
            | SchemaError::InvalidMaxLength { table, .. }
            | SchemaError::MissingLookupTarget { table, .. }
            | SchemaError::UnknownLookupTarget { table, .. }
            | SchemaError::EmptyChoice { table, .. }
            | SchemaError::DuplicateOptionValue { table, .. }
            | SchemaError::NonTextPrimaryColumn { table, .. }
            | SchemaError::DependencyCycle { table } => Some(table),
            SchemaError::DuplicateTable(table) => Some(table),
            SchemaError::DuplicateRelationshipName { .. } => None,
        }
    }
}
