//! Column → attribute encoding.
//!
//! Every declared column is encoded exactly once into a [`ResolvedAttribute`].
//! Both outputs read the same attribute; where the package and the live
//! provisioning path disagree on a constraint, the attribute keeps both
//! answers and the caller picks one with an [`OutputPath`].
//!
//! | Constraint      | Package                  | Provision                    |
//! |-----------------|--------------------------|------------------------------|
//! | Memo max length | always 2000              | declared, default 100000     |
//! | Integer bounds  | full `i32` range         | 0 ..= 999999                 |
//! | Boolean default | not rendered             | declared, default `true`     |
//! | Choice values   | 100000000 + index        | explicit value, else index+1 |

use super::error::{SchemaError, SchemaResult};
use crate::model::{Column, ColumnType, DeclaredType};

pub const DEFAULT_STRING_MAX_LENGTH: u32 = 200;
pub const PACKAGE_MEMO_MAX_LENGTH: u32 = 2000;
pub const DEFAULT_MEMO_MAX_LENGTH: u32 = 100_000;
pub const OPTION_VALUE_BASE: i32 = 100_000_000;
pub const PROVISION_INTEGER_MIN: i64 = 0;
pub const PROVISION_INTEGER_MAX: i64 = 999_999;

/// Which output an attribute is being rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPath {
    /// Offline solution package.
    Package,
    /// Live Web API provisioning.
    Provision,
}

/// Requirement level of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredLevel {
    None,
    ApplicationRequired,
    SystemRequired,
}

impl RequiredLevel {
    /// Spelling used inside package documents.
    pub fn package_name(&self) -> &'static str {
        match self {
            RequiredLevel::None => "none",
            RequiredLevel::ApplicationRequired => "required",
            RequiredLevel::SystemRequired => "systemrequired",
        }
    }

    /// Spelling used by the Web API.
    pub fn api_name(&self) -> &'static str {
        match self {
            RequiredLevel::None => "None",
            RequiredLevel::ApplicationRequired => "ApplicationRequired",
            RequiredLevel::SystemRequired => "SystemRequired",
        }
    }
}

/// Input style of the attribute's editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImeMode {
    Auto,
    Inactive,
    Disabled,
}

impl ImeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImeMode::Auto => "auto",
            ImeMode::Inactive => "inactive",
            ImeMode::Disabled => "disabled",
        }
    }
}

/// Date-time storage behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeBehavior {
    DateAndTime,
    DateOnly,
}

impl DateTimeBehavior {
    pub fn code(&self) -> u8 {
        match self {
            DateTimeBehavior::DateAndTime => 1,
            DateTimeBehavior::DateOnly => 2,
        }
    }

    pub fn package_format(&self) -> &'static str {
        match self {
            DateTimeBehavior::DateAndTime => "datetime",
            DateTimeBehavior::DateOnly => "date",
        }
    }

    pub fn api_format(&self) -> &'static str {
        match self {
            DateTimeBehavior::DateAndTime => "DateAndTime",
            DateTimeBehavior::DateOnly => "DateOnly",
        }
    }
}

/// Storage-level shape of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    String { max_length: u32 },
    Memo { declared_max_length: Option<u32> },
    Integer,
    Boolean { default_value: bool },
    DateTime { behavior: DateTimeBehavior },
    Lookup { target: String },
    Choice,
}

impl AttributeKind {
    /// Internal type tag written into package documents.
    pub fn type_tag(&self) -> &'static str {
        match self {
            AttributeKind::String { .. } => "nvarchar",
            AttributeKind::Memo { .. } => "ntext",
            AttributeKind::Integer => "int",
            AttributeKind::Boolean { .. } => "bit",
            AttributeKind::DateTime { .. } => "datetime",
            AttributeKind::Lookup { .. } => "lookup",
            AttributeKind::Choice => "picklist",
        }
    }

    /// Web API type discriminator.
    pub fn odata_type(&self) -> &'static str {
        match self {
            AttributeKind::String { .. } => "Microsoft.Dynamics.CRM.StringAttributeMetadata",
            AttributeKind::Memo { .. } => "Microsoft.Dynamics.CRM.MemoAttributeMetadata",
            AttributeKind::Integer => "Microsoft.Dynamics.CRM.IntegerAttributeMetadata",
            AttributeKind::Boolean { .. } => "Microsoft.Dynamics.CRM.BooleanAttributeMetadata",
            AttributeKind::DateTime { .. } => "Microsoft.Dynamics.CRM.DateTimeAttributeMetadata",
            AttributeKind::Lookup { .. } => "Microsoft.Dynamics.CRM.LookupAttributeMetadata",
            AttributeKind::Choice => "Microsoft.Dynamics.CRM.PicklistAttributeMetadata",
        }
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, AttributeKind::Lookup { .. })
    }
}

/// Kind of an option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSetKind {
    Bit,
    Picklist,
    State,
    Status,
}

impl OptionSetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionSetKind::Bit => "bit",
            OptionSetKind::Picklist => "picklist",
            OptionSetKind::State => "state",
            OptionSetKind::Status => "status",
        }
    }
}

/// One option of an option set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    pub label: String,
    pub package_value: i32,
    pub provision_value: i32,
    /// Default status of a state, or owning state of a status.
    pub linked_value: Option<i32>,
}

impl OptionEntry {
    pub fn new(value: i32, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            package_value: value,
            provision_value: value,
            linked_value: None,
        }
    }

    pub fn linked(mut self, value: i32) -> Self {
        self.linked_value = Some(value);
        self
    }

    pub fn value(&self, path: OutputPath) -> i32 {
        match path {
            OutputPath::Package => self.package_value,
            OutputPath::Provision => self.provision_value,
        }
    }
}

/// A named enumeration backing Boolean, Choice, state and status attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    pub name: String,
    pub kind: OptionSetKind,
    pub display_name: String,
    pub options: Vec<OptionEntry>,
}

impl OptionSet {
    /// The inline Yes/No set every Boolean attribute carries.
    pub fn yes_no(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: OptionSetKind::Bit,
            display_name: display_name.into(),
            options: vec![OptionEntry::new(1, "Yes"), OptionEntry::new(0, "No")],
        }
    }
}

/// Search and retrieval flags of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeFlags {
    pub searchable: bool,
    pub filterable: bool,
    pub retrievable: bool,
}

/// Canonical attribute definition derived from one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttribute {
    pub logical_name: String,
    pub display_name: String,
    pub kind: AttributeKind,
    pub required_level: RequiredLevel,
    pub is_primary_name: bool,
    pub flags: AttributeFlags,
    pub ime_mode: ImeMode,
    pub option_set: Option<OptionSet>,
}

impl ResolvedAttribute {
    pub fn display_mask(&self) -> &'static str {
        if self.is_primary_name {
            "PrimaryName|ValidForAdvancedFind|ValidForForm|ValidForGrid|RequiredForForm"
        } else {
            "ValidForAdvancedFind|ValidForForm|ValidForGrid"
        }
    }

    /// Maximum length in characters, for text attributes.
    pub fn max_length(&self, path: OutputPath) -> Option<u32> {
        match (&self.kind, path) {
            (AttributeKind::String { max_length }, _) => Some(*max_length),
            (AttributeKind::Memo { .. }, OutputPath::Package) => Some(PACKAGE_MEMO_MAX_LENGTH),
            (AttributeKind::Memo { declared_max_length }, OutputPath::Provision) => {
                Some(declared_max_length.unwrap_or(DEFAULT_MEMO_MAX_LENGTH))
            }
            _ => None,
        }
    }

    /// Stored length in bytes; text is stored as two bytes per character.
    pub fn stored_length(&self) -> Option<u32> {
        match &self.kind {
            AttributeKind::String { max_length } => Some(max_length.saturating_mul(2)),
            _ => None,
        }
    }

    /// Inclusive value bounds, for integer attributes.
    pub fn integer_bounds(&self, path: OutputPath) -> Option<(i64, i64)> {
        match (&self.kind, path) {
            (AttributeKind::Integer, OutputPath::Package) => {
                Some((i64::from(i32::MIN), i64::from(i32::MAX)))
            }
            (AttributeKind::Integer, OutputPath::Provision) => {
                Some((PROVISION_INTEGER_MIN, PROVISION_INTEGER_MAX))
            }
            _ => None,
        }
    }

    /// Default value, for boolean attributes on paths that render one.
    pub fn boolean_default(&self, path: OutputPath) -> Option<bool> {
        match (&self.kind, path) {
            (AttributeKind::Boolean { default_value }, OutputPath::Provision) => Some(*default_value),
            _ => None,
        }
    }

    /// `(value, label)` pairs of the option set as seen by the given path.
    pub fn option_values(&self, path: OutputPath) -> Vec<(i32, &str)> {
        self.option_set
            .iter()
            .flat_map(|set| set.options.iter())
            .map(|o| (o.value(path), o.label.as_str()))
            .collect()
    }

    pub fn lookup_target(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Lookup { target } => Some(target),
            _ => None,
        }
    }
}

/// Encode a column of `table` into its canonical attribute.
///
/// `is_primary` marks the table's primary name column: it is always
/// required, searchable and retrievable.
pub fn encode_column(table: &str, column: &Column, is_primary: bool) -> SchemaResult<ResolvedAttribute> {
    let column_type = match &column.column_type {
        DeclaredType::Known(t) => *t,
        DeclaredType::Unrecognized(name) => {
            return Err(SchemaError::UnknownColumnType {
                table: table.to_string(),
                column: column.logical_name.clone(),
                type_name: name.clone(),
            })
        }
    };

    if column.max_length == Some(0) {
        return Err(SchemaError::InvalidMaxLength {
            table: table.to_string(),
            column: column.logical_name.clone(),
        });
    }

    let option_set_name = format!("{}_{}", table, column.logical_name);
    let mut ime_mode = ImeMode::Auto;
    let mut option_set = None;

    let kind = match column_type {
        ColumnType::String => AttributeKind::String {
            max_length: column.max_length.unwrap_or(DEFAULT_STRING_MAX_LENGTH),
        },
        ColumnType::Memo => AttributeKind::Memo {
            declared_max_length: column.max_length,
        },
        ColumnType::Integer => AttributeKind::Integer,
        ColumnType::Boolean => {
            option_set = Some(OptionSet::yes_no(&option_set_name, &column.display_name));
            AttributeKind::Boolean {
                default_value: column.default_value.unwrap_or(true),
            }
        }
        ColumnType::DateTime | ColumnType::DateOnly => {
            ime_mode = ImeMode::Inactive;
            let behavior = if column_type == ColumnType::DateOnly {
                DateTimeBehavior::DateOnly
            } else {
                DateTimeBehavior::DateAndTime
            };
            AttributeKind::DateTime { behavior }
        }
        ColumnType::Lookup => {
            let target = column
                .target
                .clone()
                .ok_or_else(|| SchemaError::MissingLookupTarget {
                    table: table.to_string(),
                    column: column.logical_name.clone(),
                })?;
            AttributeKind::Lookup { target }
        }
        ColumnType::Choice => {
            option_set = Some(choice_option_set(table, column, option_set_name)?);
            AttributeKind::Choice
        }
    };

    let required_level = if is_primary || column.required {
        RequiredLevel::ApplicationRequired
    } else {
        RequiredLevel::None
    };

    Ok(ResolvedAttribute {
        logical_name: column.logical_name.clone(),
        display_name: column.display_name.clone(),
        kind,
        required_level,
        is_primary_name: is_primary,
        flags: AttributeFlags {
            searchable: is_primary,
            filterable: false,
            retrievable: is_primary,
        },
        ime_mode,
        option_set,
    })
}

fn choice_option_set(table: &str, column: &Column, name: String) -> SchemaResult<OptionSet> {
    if column.options.is_empty() {
        return Err(SchemaError::EmptyChoice {
            table: table.to_string(),
            column: column.logical_name.clone(),
        });
    }

    let mut options: Vec<OptionEntry> = Vec::with_capacity(column.options.len());
    for (index, option) in column.options.iter().enumerate() {
        let index = index as i32;
        let provision_value = option.explicit_value().unwrap_or(index + 1);
        if options.iter().any(|o| o.provision_value == provision_value) {
            return Err(SchemaError::DuplicateOptionValue {
                table: table.to_string(),
                column: column.logical_name.clone(),
                value: provision_value,
            });
        }
        options.push(OptionEntry {
            label: option.label().to_string(),
            package_value: OPTION_VALUE_BASE + index,
            provision_value,
            linked_value: None,
        });
    }

    Ok(OptionSet {
        name,
        kind: OptionSetKind::Picklist,
        display_name: column.display_name.clone(),
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChoiceOption;

    #[test]
    fn test_primary_string_is_required_with_double_length() {
        let column = Column::string("redi_code", "Code").max_length(50).required();
        let attr = encode_column("redi_building", &column, true).unwrap();

        assert_eq!(attr.required_level, RequiredLevel::ApplicationRequired);
        assert_eq!(attr.required_level.package_name(), "required");
        assert_eq!(attr.max_length(OutputPath::Package), Some(50));
        assert_eq!(attr.stored_length(), Some(100));
        assert!(attr.flags.searchable);
        assert!(attr.flags.retrievable);
        assert!(attr.display_mask().starts_with("PrimaryName|"));
    }

    #[test]
    fn test_primary_escalates_optional_column() {
        let column = Column::string("redi_label", "Label");
        let attr = encode_column("t", &column, true).unwrap();
        assert_eq!(attr.required_level, RequiredLevel::ApplicationRequired);

        let attr = encode_column("t", &column, false).unwrap();
        assert_eq!(attr.required_level, RequiredLevel::None);
        assert_eq!(attr.max_length(OutputPath::Package), Some(DEFAULT_STRING_MAX_LENGTH));
        assert_eq!(attr.flags, AttributeFlags::default());
    }

    #[test]
    fn test_memo_length_differs_per_path() {
        let column = Column::new("redi_notes", "Notes", ColumnType::Memo).max_length(10_000);
        let attr = encode_column("t", &column, false).unwrap();
        assert_eq!(attr.max_length(OutputPath::Package), Some(PACKAGE_MEMO_MAX_LENGTH));
        assert_eq!(attr.max_length(OutputPath::Provision), Some(10_000));

        let bare = Column::new("redi_notes", "Notes", ColumnType::Memo);
        let attr = encode_column("t", &bare, false).unwrap();
        assert_eq!(attr.max_length(OutputPath::Provision), Some(DEFAULT_MEMO_MAX_LENGTH));
    }

    #[test]
    fn test_integer_bounds_differ_per_path() {
        let column = Column::new("redi_sortorder", "Sort Order", ColumnType::Integer);
        let attr = encode_column("t", &column, false).unwrap();
        assert_eq!(
            attr.integer_bounds(OutputPath::Package),
            Some((-2_147_483_648, 2_147_483_647))
        );
        assert_eq!(attr.integer_bounds(OutputPath::Provision), Some((0, 999_999)));
    }

    #[test]
    fn test_boolean_option_set_and_default() {
        let column = Column::new("redi_active", "Active", ColumnType::Boolean).default_value(false);
        let attr = encode_column("redi_team", &column, false).unwrap();

        let set = attr.option_set.as_ref().unwrap();
        assert_eq!(set.name, "redi_team_redi_active");
        assert_eq!(set.kind, OptionSetKind::Bit);
        assert_eq!(attr.option_values(OutputPath::Package), vec![(1, "Yes"), (0, "No")]);
        assert_eq!(attr.boolean_default(OutputPath::Provision), Some(false));
        assert_eq!(attr.boolean_default(OutputPath::Package), None);
    }

    #[test]
    fn test_date_behaviors() {
        let date = Column::new("redi_duedate", "Due", ColumnType::DateOnly);
        let attr = encode_column("t", &date, false).unwrap();
        assert_eq!(
            attr.kind,
            AttributeKind::DateTime {
                behavior: DateTimeBehavior::DateOnly
            }
        );
        assert_eq!(attr.ime_mode, ImeMode::Inactive);

        let stamp = Column::new("redi_seen", "Seen", ColumnType::DateTime);
        let attr = encode_column("t", &stamp, false).unwrap();
        match attr.kind {
            AttributeKind::DateTime { behavior } => assert_eq!(behavior.code(), 1),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_choice_values_per_path() {
        let mut column = Column::choice("redi_status", "Status", ["Draft", "Active"]);
        column.options.push(ChoiceOption::explicit(9, "Closed"));
        let attr = encode_column("redi_loan", &column, false).unwrap();

        assert_eq!(
            attr.option_values(OutputPath::Package),
            vec![(100_000_000, "Draft"), (100_000_001, "Active"), (100_000_002, "Closed")]
        );
        assert_eq!(
            attr.option_values(OutputPath::Provision),
            vec![(1, "Draft"), (2, "Active"), (9, "Closed")]
        );
    }

    #[test]
    fn test_choice_rejects_colliding_values() {
        let mut column = Column::choice("redi_status", "Status", ["Draft"]);
        column.options.push(ChoiceOption::explicit(1, "Also one"));
        let err = encode_column("t", &column, false).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateOptionValue { value: 1, .. }));
    }

    #[test]
    fn test_empty_choice_fails() {
        let column = Column::new("redi_kind", "Kind", ColumnType::Choice);
        let err = encode_column("t", &column, false).unwrap_err();
        assert!(matches!(err, SchemaError::EmptyChoice { .. }));
    }

    #[test]
    fn test_unknown_type_names_column_and_table() {
        let mut column = Column::string("redi_price", "Price");
        column.column_type = DeclaredType::Unrecognized("Currency".to_string());
        let err = encode_column("redi_equipment", &column, false).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownColumnType {
                table: "redi_equipment".to_string(),
                column: "redi_price".to_string(),
                type_name: "Currency".to_string(),
            }
        );
    }

    #[test]
    fn test_lookup_carries_only_target() {
        let column = Column::lookup("redi_buildingid", "Building", "redi_building");
        let attr = encode_column("redi_level", &column, false).unwrap();
        assert_eq!(attr.lookup_target(), Some("redi_building"));
        assert!(attr.option_set.is_none());
        assert_eq!(attr.max_length(OutputPath::Package), None);
    }
}
