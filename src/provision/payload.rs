//! JSON request bodies for the metadata endpoint.
//!
//! Every attribute and relationship body carries an `@odata.type`
//! discriminator naming the metadata variant being created.

use serde_json::{json, Value};

use crate::compile::{AttributeKind, Entity, OutputPath, Relationship, ResolvedAttribute};
use crate::config::SolutionSettings;

const ENTITY_COMPONENT_TYPE: u32 = 1;

pub fn label(text: &str, language: u32) -> Value {
    json!({
        "@odata.type": "Microsoft.Dynamics.CRM.Label",
        "LocalizedLabels": [{
            "@odata.type": "Microsoft.Dynamics.CRM.LocalizedLabel",
            "Label": text,
            "LanguageCode": language,
        }],
    })
}

fn required_level(attr: &ResolvedAttribute) -> Value {
    json!({ "Value": attr.required_level.api_name() })
}

/// Body for `POST EntityDefinitions`.
pub fn table_body(entity: &Entity, primary: &ResolvedAttribute, language: u32) -> Value {
    let mut primary_body = attribute_body(primary, language);
    primary_body["IsPrimaryName"] = Value::Bool(true);

    json!({
        "SchemaName": entity.logical_name,
        "DisplayName": label(&entity.display_name, language),
        "DisplayCollectionName": label(&entity.plural_name, language),
        "Description": label(&entity.description, language),
        "HasActivities": false,
        "HasNotes": false,
        "OwnershipType": "UserOwned",
        "IsActivity": false,
        "PrimaryNameAttribute": primary.logical_name,
        "Attributes": [primary_body],
    })
}

/// Body for `POST EntityDefinitions(...)/Attributes`, using the
/// provisioning-path constraints.
pub fn attribute_body(attr: &ResolvedAttribute, language: u32) -> Value {
    let path = OutputPath::Provision;
    let mut body = json!({
        "@odata.type": attr.kind.odata_type(),
        "SchemaName": attr.logical_name,
        "RequiredLevel": required_level(attr),
        "DisplayName": label(&attr.display_name, language),
    });

    match &attr.kind {
        AttributeKind::String { .. } | AttributeKind::Memo { .. } => {
            body["MaxLength"] = json!(attr.max_length(path));
        }
        AttributeKind::Integer => {
            if let Some((min, max)) = attr.integer_bounds(path) {
                body["MinValue"] = json!(min);
                body["MaxValue"] = json!(max);
            }
        }
        AttributeKind::Boolean { .. } => {
            body["DefaultValue"] = json!(attr.boolean_default(path));
            body["OptionSet"] = json!({
                "TrueOption": { "Value": 1, "Label": label("Yes", language) },
                "FalseOption": { "Value": 0, "Label": label("No", language) },
            });
        }
        AttributeKind::DateTime { behavior } => {
            body["Format"] = json!(behavior.api_format());
        }
        AttributeKind::Choice => {
            let options: Vec<Value> = attr
                .option_values(path)
                .into_iter()
                .map(|(value, text)| json!({ "Value": value, "Label": label(text, language) }))
                .collect();
            body["OptionSet"] = json!({
                "@odata.type": "Microsoft.Dynamics.CRM.OptionSetMetadata",
                "IsGlobal": false,
                "OptionSetType": "Picklist",
                "Options": options,
            });
        }
        AttributeKind::Lookup { .. } => {}
    }

    body
}

/// Body for `POST RelationshipDefinitions`.
pub fn relationship_body(rel: &Relationship, lookup: &ResolvedAttribute, language: u32) -> Value {
    json!({
        "SchemaName": rel.name,
        "@odata.type": "Microsoft.Dynamics.CRM.OneToManyRelationshipMetadata",
        "ReferencedEntity": rel.referenced_table,
        "ReferencingEntity": rel.referencing_table,
        "Lookup": attribute_body(lookup, language),
    })
}

/// Body for `POST solutions`.
pub fn solution_body(solution: &SolutionSettings, publisher_id: &str) -> Value {
    json!({
        "uniquename": solution.unique_name,
        "friendlyname": solution.display_name,
        "description": solution.description,
        "version": solution.version,
        "publisherid@odata.bind": format!("/publishers({})", publisher_id),
    })
}

/// Body for the `AddSolutionComponent` action.
pub fn add_component_body(solution: &str, metadata_id: &str) -> Value {
    json!({
        "ComponentId": metadata_id,
        "ComponentType": ENTITY_COMPONENT_TYPE,
        "SolutionUniqueName": solution,
        "AddRequiredComponents": false,
    })
}
