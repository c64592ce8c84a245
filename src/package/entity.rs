//! `Entities/<table>/Entity.xml` and its ribbon placeholder.

use super::attribute::AttributeRecord;
use super::system::system_attributes;
use super::xml::{XmlWriter, XSI_NAMESPACE};
use crate::compile::Entity;

/// Fixed entity settings, written after `EntitySetName` in this order.
const ENTITY_SETTINGS: &[(&str, &str)] = &[
    ("IsDuplicateCheckSupported", "0"),
    ("IsBusinessProcessEnabled", "0"),
    ("IsRequiredOffline", "0"),
    ("IsInteractionCentricEnabled", "0"),
    ("IsCollaboration", "0"),
    ("AutoRouteToOwnerQueue", "0"),
    ("IsConnectionsEnabled", "0"),
    ("IsDocumentManagementEnabled", "0"),
    ("AutoCreateAccessTeams", "0"),
    ("IsOneNoteIntegrationEnabled", "0"),
    ("IsKnowledgeManagementEnabled", "0"),
    ("IsSLAEnabled", "0"),
    ("IsDocumentRecommendationsEnabled", "0"),
    ("IsBPFEntity", "0"),
    ("OwnershipTypeMask", "UserOwned"),
    ("IsAuditEnabled", "1"),
    ("IsRetrieveAuditEnabled", "0"),
    ("IsRetrieveMultipleAuditEnabled", "0"),
    ("IsActivity", "0"),
    ("ActivityTypeMask", ""),
    ("IsActivityParty", "0"),
    ("IsReplicated", "0"),
    ("IsReplicationUserFiltered", "0"),
    ("IsMailMergeEnabled", "0"),
    ("IsVisibleInMobile", "0"),
    ("IsVisibleInMobileClient", "0"),
    ("IsReadOnlyInMobileClient", "0"),
    ("IsOfflineInMobileClient", "0"),
    ("DaysSinceRecordLastModified", "0"),
    ("MobileOfflineFilters", ""),
    ("IsMapiGridEnabled", "1"),
    ("IsReadingPaneEnabled", "1"),
    ("IsQuickCreateEnabled", "0"),
    ("SyncToExternalSearchIndex", "0"),
    ("IntroducedVersion", "1.0.0.0"),
    ("IsCustomizable", "1"),
    ("IsRenameable", "1"),
    ("IsMappable", "1"),
    ("CanModifyAuditSettings", "1"),
    ("CanModifyMobileVisibility", "1"),
    ("CanModifyMobileClientVisibility", "1"),
    ("CanModifyMobileClientReadOnly", "1"),
    ("CanModifyMobileClientOffline", "1"),
    ("CanModifyConnectionSettings", "1"),
    ("CanModifyDuplicateDetectionSettings", "1"),
    ("CanModifyMailMergeSettings", "1"),
    ("CanModifyQueueSettings", "1"),
    ("CanCreateAttributes", "1"),
    ("CanCreateForms", "1"),
    ("CanCreateCharts", "1"),
    ("CanCreateViews", "1"),
    ("CanModifyAdditionalSettings", "1"),
    ("CanEnableSyncToExternalSearchIndex", "1"),
    ("EnforceStateTransitions", "0"),
    ("CanChangeHierarchicalRelationship", "1"),
    ("EntityHelpUrlEnabled", "0"),
    ("ChangeTrackingEnabled", "1"),
    ("CanChangeTrackingBeEnabled", "1"),
    ("IsEnabledForExternalChannels", "0"),
    ("IsMSTeamsIntegrationEnabled", "0"),
    ("IsSolutionAware", "0"),
];

/// Attribute records in document order: declared columns (led by a
/// synthesized primary) then the system bundle.
pub fn entity_attributes(entity: &Entity, prefix: &str) -> Vec<AttributeRecord> {
    entity
        .attributes
        .iter()
        .map(AttributeRecord::from_resolved)
        .chain(system_attributes(&entity.logical_name, prefix))
        .collect()
}

pub fn render_entity(entity: &Entity, prefix: &str, language: &str) -> String {
    let mut w = XmlWriter::document();
    let display = entity.display_name.as_str();

    w.open("Entity", &[("xmlns:xsi", XSI_NAMESPACE)]);
    w.element_with(
        "Name",
        &[("LocalizedName", display), ("OriginalName", display)],
        &entity.logical_name,
    );
    w.open("EntityInfo", &[]);
    w.open("entity", &[("Name", entity.logical_name.as_str())]);

    w.open("LocalizedNames", &[]);
    w.empty("LocalizedName", &[("description", display), ("languagecode", language)]);
    w.close("LocalizedNames");
    w.open("LocalizedCollectionNames", &[]);
    w.empty(
        "LocalizedCollectionName",
        &[("description", entity.plural_name.as_str()), ("languagecode", language)],
    );
    w.close("LocalizedCollectionNames");
    w.open("Descriptions", &[]);
    w.empty(
        "Description",
        &[("description", entity.description.as_str()), ("languagecode", language)],
    );
    w.close("Descriptions");

    w.open("attributes", &[]);
    for record in entity_attributes(entity, prefix) {
        record.write(&mut w, language);
    }
    w.close("attributes");

    w.element("EntitySetName", &entity.entity_set_name);
    for (tag, value) in ENTITY_SETTINGS {
        w.element(tag, value);
    }

    w.close("entity");
    w.close("EntityInfo");
    w.empty("FormXml", &[]);
    w.empty("SavedQueries", &[]);
    w.empty("RibbonDiffXml", &[]);
    w.close("Entity");
    w.into_string()
}

pub fn render_ribbon_diff() -> String {
    let mut w = XmlWriter::document();
    w.empty("RibbonDiffXml", &[]);
    w.into_string()
}
