// src/model/table.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A complete schema document: the ordered list of tables to compile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Find a table by logical name.
    pub fn table(&self, logical_name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.logical_name == logical_name)
    }
}

/// A user-defined record type (entity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub logical_name: String,
    pub display_name: String,
    pub plural_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Explicit primary name column; may name a column that only exists on the target store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_name_column: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(
        logical_name: impl Into<String>,
        display_name: impl Into<String>,
        plural_name: impl Into<String>,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            display_name: display_name.into(),
            plural_name: plural_name.into(),
            description: None,
            primary_name_column: None,
            columns: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn primary_name_column(mut self, column: impl Into<String>) -> Self {
        self.primary_name_column = Some(column.into());
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Find a declared column by logical name.
    pub fn find_column(&self, logical_name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.logical_name == logical_name)
    }
}

/// A typed field of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub logical_name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub column_type: DeclaredType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    /// Referenced table for lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Boolean default; only honoured when provisioning a live store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<bool>,
}

impl Column {
    pub fn new(
        logical_name: impl Into<String>,
        display_name: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            display_name: display_name.into(),
            column_type: DeclaredType::Known(column_type),
            required: false,
            max_length: None,
            options: Vec::new(),
            target: None,
            default_value: None,
        }
    }

    pub fn string(logical_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(logical_name, display_name, ColumnType::String)
    }

    pub fn lookup(
        logical_name: impl Into<String>,
        display_name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let mut column = Self::new(logical_name, display_name, ColumnType::Lookup);
        column.target = Some(target.into());
        column
    }

    pub fn choice<I, S>(logical_name: impl Into<String>, display_name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut column = Self::new(logical_name, display_name, ColumnType::Choice);
        column.options = labels.into_iter().map(|l| ChoiceOption::Label(l.into())).collect();
        column
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn default_value(mut self, value: bool) -> Self {
        self.default_value = Some(value);
        self
    }

    /// The recognised type, if the declared type name is known.
    pub fn known_type(&self) -> Option<ColumnType> {
        match &self.column_type {
            DeclaredType::Known(t) => Some(*t),
            DeclaredType::Unrecognized(_) => None,
        }
    }

    pub fn is_string(&self) -> bool {
        self.known_type() == Some(ColumnType::String)
    }
}

/// Semantic column types understood by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Memo,
    Integer,
    Boolean,
    DateTime,
    DateOnly,
    Lookup,
    Choice,
}

impl ColumnType {
    pub const ALL: [ColumnType; 8] = [
        ColumnType::String,
        ColumnType::Memo,
        ColumnType::Integer,
        ColumnType::Boolean,
        ColumnType::DateTime,
        ColumnType::DateOnly,
        ColumnType::Lookup,
        ColumnType::Choice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "String",
            ColumnType::Memo => "Memo",
            ColumnType::Integer => "Integer",
            ColumnType::Boolean => "Boolean",
            ColumnType::DateTime => "DateTime",
            ColumnType::DateOnly => "DateOnly",
            ColumnType::Lookup => "Lookup",
            ColumnType::Choice => "Choice",
        }
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column type as written in the schema document.
///
/// Unrecognised names survive loading so that compilation can report them
/// against the owning table and column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeclaredType {
    Known(ColumnType),
    Unrecognized(String),
}

impl DeclaredType {
    pub fn name(&self) -> &str {
        match self {
            DeclaredType::Known(t) => t.as_str(),
            DeclaredType::Unrecognized(name) => name,
        }
    }
}

impl From<String> for DeclaredType {
    fn from(name: String) -> Self {
        match name.parse::<ColumnType>() {
            Ok(t) => DeclaredType::Known(t),
            Err(name) => DeclaredType::Unrecognized(name),
        }
    }
}

impl From<DeclaredType> for String {
    fn from(declared: DeclaredType) -> Self {
        declared.name().to_string()
    }
}

impl From<ColumnType> for DeclaredType {
    fn from(t: ColumnType) -> Self {
        DeclaredType::Known(t)
    }
}

/// A choice option: either a bare label or an explicit `{ value, label }` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceOption {
    Label(String),
    Explicit { value: i32, label: String },
}

impl ChoiceOption {
    pub fn explicit(value: i32, label: impl Into<String>) -> Self {
        ChoiceOption::Explicit {
            value,
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ChoiceOption::Label(label) => label,
            ChoiceOption::Explicit { label, .. } => label,
        }
    }

    pub fn explicit_value(&self) -> Option<i32> {
        match self {
            ChoiceOption::Label(_) => None,
            ChoiceOption::Explicit { value, .. } => Some(*value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_keeps_unknown_names() {
        let known: DeclaredType = "Memo".to_string().into();
        assert_eq!(known, DeclaredType::Known(ColumnType::Memo));

        let unknown: DeclaredType = "Currency".to_string().into();
        assert_eq!(unknown, DeclaredType::Unrecognized("Currency".to_string()));
        assert_eq!(unknown.name(), "Currency");
    }

    #[test]
    fn test_column_type_names_are_case_sensitive() {
        assert_eq!("DateOnly".parse::<ColumnType>(), Ok(ColumnType::DateOnly));
        assert!("string".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_choice_option_forms() {
        let options: Vec<ChoiceOption> =
            serde_json::from_str(r#"["Image", {"value": 7, "label": "Attachment"}]"#).unwrap();
        assert_eq!(options[0].label(), "Image");
        assert_eq!(options[0].explicit_value(), None);
        assert_eq!(options[1].label(), "Attachment");
        assert_eq!(options[1].explicit_value(), Some(7));
    }

    #[test]
    fn test_column_builders() {
        let column = Column::string("redi_code", "Code").max_length(20).required();
        assert!(column.is_string());
        assert!(column.required);
        assert_eq!(column.max_length, Some(20));

        let lookup = Column::lookup("redi_buildingid", "Building", "redi_building");
        assert_eq!(lookup.known_type(), Some(ColumnType::Lookup));
        assert_eq!(lookup.target.as_deref(), Some("redi_building"));
    }
}
