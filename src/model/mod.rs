//! Declarative schema model: tables, columns and their declared types.

pub mod loader;
pub mod table;

pub use loader::{load_schema, load_schema_from_str, LoadError, LoadResult, SchemaFormat};
pub use table::{ChoiceOption, Column, ColumnType, DeclaredType, Schema, Table};
