//! Schema compilation.
//!
//! Turns a declarative [`Schema`] into the normalized model shared by the
//! package renderer and the live provisioner:
//!
//! ```text
//! Schema → validate → per table: resolve primary → encode columns → Entity
//!                                                                     │
//!        CompiledSchema ◄── plan (tiers + fixups) ◄── relationships ◄─┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use trellis::compile::{compile_schema, CompileOptions};
//!
//! let schema = trellis::model::load_schema(Path::new("schema.json"))?;
//! let compiled = compile_schema(&schema, &CompileOptions::default())?;
//! for step in &compiled.plan.steps {
//!     println!("tier {}: {}", step.tier, step.table);
//! }
//! ```

pub mod encode;
pub mod error;
pub mod primary;
pub mod relationships;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ColumnType, Schema, Table};

pub use encode::{
    encode_column, AttributeFlags, AttributeKind, DateTimeBehavior, ImeMode, OptionEntry,
    OptionSet, OptionSetKind, OutputPath, RequiredLevel, ResolvedAttribute,
};
pub use error::{SchemaError, SchemaResult};
pub use primary::{materialize_primary_column, resolve_primary_column, PrimaryColumn};
pub use relationships::{
    discover_relationships, group_by_referenced, relationship_index, relationship_name,
    DependencyGraph, ProvisionPlan, Relationship, TableStep,
};

/// Default publisher customization prefix.
pub const DEFAULT_PREFIX: &str = "redi";

static LOGICAL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid regex"));

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Publisher prefix, used for the `<prefix>_name` convention and
    /// stripped from relationship name components.
    pub prefix: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl CompileOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// A table after primary resolution and attribute encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub logical_name: String,
    pub display_name: String,
    pub plural_name: String,
    pub description: String,
    pub entity_set_name: String,
    pub primary: PrimaryColumn,
    /// Declared columns in order, led by the synthesized primary if any.
    pub attributes: Vec<ResolvedAttribute>,
}

impl Entity {
    /// The materialized primary attribute. `None` when an override names a
    /// column that only exists on the target store.
    pub fn primary_attribute(&self) -> Option<&ResolvedAttribute> {
        self.attributes.iter().find(|a| a.is_primary_name)
    }

    /// Primary attribute to send with a table creation request.
    pub fn creation_primary_attribute(&self) -> ResolvedAttribute {
        if let Some(attr) = self.primary_attribute() {
            return attr.clone();
        }
        let column = crate::model::Column::string(
            self.primary.name(),
            format!("{} Name", self.display_name),
        );
        ResolvedAttribute {
            logical_name: column.logical_name,
            display_name: column.display_name,
            kind: AttributeKind::String {
                max_length: encode::DEFAULT_STRING_MAX_LENGTH,
            },
            required_level: RequiredLevel::ApplicationRequired,
            is_primary_name: true,
            flags: AttributeFlags {
                searchable: true,
                filterable: false,
                retrievable: true,
            },
            ime_mode: ImeMode::Auto,
            option_set: None,
        }
    }

    pub fn attribute(&self, logical_name: &str) -> Option<&ResolvedAttribute> {
        self.attributes.iter().find(|a| a.logical_name == logical_name)
    }

    /// Attributes created as plain columns; lookups come from relationships.
    pub fn plain_attributes(&self) -> impl Iterator<Item = &ResolvedAttribute> {
        self.attributes.iter().filter(|a| !a.kind.is_lookup())
    }
}

/// The normalized model consumed by both outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSchema {
    pub entities: Vec<Entity>,
    /// One per Lookup attribute, in declaration order.
    pub relationships: Vec<Relationship>,
    pub plan: ProvisionPlan,
}

impl CompiledSchema {
    pub fn entity(&self, logical_name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.logical_name == logical_name)
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn relationships_by_referenced(&self) -> std::collections::BTreeMap<&str, Vec<&Relationship>> {
        group_by_referenced(&self.relationships)
    }

    pub fn relationship_index(&self) -> Vec<&str> {
        relationship_index(&self.relationships)
    }
}

// ============================================================================
// Compilation
// ============================================================================

/// Entity set name: `es` after a trailing `s`, otherwise `s`.
pub fn entity_set_name(logical_name: &str) -> String {
    if logical_name.ends_with('s') {
        format!("{}es", logical_name)
    } else {
        format!("{}s", logical_name)
    }
}

/// Structural checks that need the whole schema.
pub fn validate_schema(schema: &Schema) -> SchemaResult<()> {
    let mut tables: HashSet<&str> = HashSet::new();
    for table in &schema.tables {
        if !LOGICAL_NAME.is_match(&table.logical_name) {
            return Err(SchemaError::InvalidLogicalName {
                table: table.logical_name.clone(),
                name: table.logical_name.clone(),
            });
        }
        if !tables.insert(&table.logical_name) {
            return Err(SchemaError::DuplicateTable(table.logical_name.clone()));
        }
    }

    for table in &schema.tables {
        let mut columns: HashSet<&str> = HashSet::new();
        for column in &table.columns {
            if !LOGICAL_NAME.is_match(&column.logical_name) {
                return Err(SchemaError::InvalidLogicalName {
                    table: table.logical_name.clone(),
                    name: column.logical_name.clone(),
                });
            }
            if !columns.insert(&column.logical_name) {
                return Err(SchemaError::DuplicateColumn {
                    table: table.logical_name.clone(),
                    column: column.logical_name.clone(),
                });
            }
            if column.known_type() == Some(ColumnType::Lookup) {
                match &column.target {
                    None => {
                        return Err(SchemaError::MissingLookupTarget {
                            table: table.logical_name.clone(),
                            column: column.logical_name.clone(),
                        })
                    }
                    Some(target) if !tables.contains(target.as_str()) => {
                        return Err(SchemaError::UnknownLookupTarget {
                            table: table.logical_name.clone(),
                            column: column.logical_name.clone(),
                            target: target.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }
    }

    Ok(())
}

/// Resolve the primary column and encode every column of one table.
pub fn compile_table(table: &Table, options: &CompileOptions) -> SchemaResult<Entity> {
    let primary = resolve_primary_column(table, &options.prefix);
    let columns = materialize_primary_column(table, &primary)?;

    let attributes = columns
        .iter()
        .map(|column| encode_column(&table.logical_name, column, column.logical_name == primary.name()))
        .collect::<SchemaResult<Vec<_>>>()?;

    Ok(Entity {
        logical_name: table.logical_name.clone(),
        display_name: table.display_name.clone(),
        plural_name: table.plural_name.clone(),
        description: table
            .description
            .clone()
            .unwrap_or_else(|| format!("{} table", table.display_name)),
        entity_set_name: entity_set_name(&table.logical_name),
        primary,
        attributes,
    })
}

/// Compile a whole schema. Any error aborts compilation.
pub fn compile_schema(schema: &Schema, options: &CompileOptions) -> SchemaResult<CompiledSchema> {
    validate_schema(schema)?;

    let entities = schema
        .tables
        .iter()
        .map(|table| compile_table(table, options))
        .collect::<SchemaResult<Vec<_>>>()?;

    let relationships = discover_relationships(&entities, &options.prefix)?;
    let graph = DependencyGraph::build(entities.iter().map(|e| e.logical_name.as_str()), &relationships);
    let plan = graph.plan(&relationships)?;

    tracing::debug!(
        tables = entities.len(),
        relationships = relationships.len(),
        fixups = plan.fixups.len(),
        "compiled schema"
    );

    Ok(CompiledSchema {
        entities,
        relationships,
        plan,
    })
}
