//! Relationship documents: one per referenced table plus a flat index.

use super::xml::{XmlWriter, XSI_NAMESPACE};
use crate::compile::Relationship;

fn write_relationship(w: &mut XmlWriter, rel: &Relationship) {
    let attribute = rel.referencing_attribute.as_str();

    w.open("EntityRelationship", &[("Name", rel.name.as_str())]);
    w.element("EntityRelationshipType", "OneToMany");
    w.element("IsCustomizable", "1");
    w.element("IntroducedVersion", "1.0.0.0");
    w.element("IsHierarchical", "0");
    w.element("ReferencingEntityName", &rel.referencing_table);
    w.element("ReferencedEntityName", &rel.referenced_table);
    w.element("CascadeAssign", "NoCascade");
    w.element("CascadeDelete", "RemoveLink");
    w.element("CascadeArchive", "RemoveLink");
    w.element("CascadeReparent", "NoCascade");
    w.element("CascadeShare", "NoCascade");
    w.element("CascadeUnshare", "NoCascade");
    w.element("CascadeRollupView", "NoCascade");
    w.element("IsValidForAdvancedFind", "1");
    w.element("ReferencingAttributeName", attribute);
    w.empty("RelationshipDescription", &[]);
    w.open("EntityRelationshipRoles", &[]);
    w.open("EntityRelationshipRole", &[]);
    w.element("NavPaneDisplayOption", "UseCollectionName");
    w.element("NavPaneArea", "Details");
    w.element("NavPaneOrder", "10000");
    w.element("NavigationPropertyName", attribute);
    w.element("RelationshipRoleType", "1");
    w.close("EntityRelationshipRole");
    w.open("EntityRelationshipRole", &[]);
    w.element("NavigationPropertyName", &rel.name);
    w.element("RelationshipRoleType", "0");
    w.close("EntityRelationshipRole");
    w.close("EntityRelationshipRoles");
    w.close("EntityRelationship");
}

/// `Other/Relationships/<referenced>.xml`.
pub fn render_relationship_group(relationships: &[&Relationship]) -> String {
    let mut w = XmlWriter::document();
    w.open("EntityRelationships", &[("xmlns:xsi", XSI_NAMESPACE)]);
    for rel in relationships {
        write_relationship(&mut w, rel);
    }
    w.close("EntityRelationships");
    w.into_string()
}

/// `Other/Relationships.xml`, names already sorted.
pub fn render_relationship_index(names: &[&str]) -> String {
    let mut w = XmlWriter::document();
    w.open("EntityRelationships", &[("xmlns:xsi", XSI_NAMESPACE)]);
    for name in names {
        w.empty("EntityRelationship", &[("Name", *name)]);
    }
    w.close("EntityRelationships");
    w.into_string()
}
