//! `<attribute>` elements of an entity document.
//!
//! Declared columns and the implicit system bundle share one record shape so
//! they render through the same writer.

use super::xml::{flag, XmlWriter};
use crate::compile::{
    AttributeFlags, AttributeKind, ImeMode, OptionSet, OptionSetKind, OutputPath, RequiredLevel,
    ResolvedAttribute,
};

/// Type-specific tail of an attribute element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeExtra {
    None,
    Text {
        format: &'static str,
        max_length: u32,
        length: Option<u32>,
    },
    Integer {
        min: i64,
        max: i64,
    },
    DateTime {
        format: &'static str,
        can_change_behavior: bool,
        behavior: u8,
    },
    Lookup,
    OptionSet(OptionSet),
}

/// Everything written for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    pub physical_name: String,
    pub logical_name: String,
    pub type_tag: &'static str,
    pub required_level: RequiredLevel,
    /// Omitted from the document when `None`.
    pub display_mask: Option<&'static str>,
    pub ime_mode: ImeMode,
    /// Update, read, create.
    pub valid_for_api: (bool, bool, bool),
    pub is_custom: bool,
    pub audit: bool,
    pub can_modify_requirement: bool,
    pub flags: AttributeFlags,
    pub extra: AttributeExtra,
    pub display_name: String,
    pub description: Option<String>,
}

impl AttributeRecord {
    /// Record for a declared column, as seen by the package path.
    pub fn from_resolved(attr: &ResolvedAttribute) -> Self {
        let path = OutputPath::Package;
        let extra = match &attr.kind {
            AttributeKind::String { max_length } => AttributeExtra::Text {
                format: "text",
                max_length: *max_length,
                length: attr.stored_length(),
            },
            AttributeKind::Memo { .. } => AttributeExtra::Text {
                format: "textarea",
                max_length: attr.max_length(path).unwrap_or_default(),
                length: None,
            },
            AttributeKind::Integer => {
                let (min, max) = attr.integer_bounds(path).unwrap_or((0, 0));
                AttributeExtra::Integer { min, max }
            }
            AttributeKind::DateTime { behavior } => AttributeExtra::DateTime {
                format: behavior.package_format(),
                can_change_behavior: true,
                behavior: behavior.code(),
            },
            AttributeKind::Lookup { .. } => AttributeExtra::Lookup,
            AttributeKind::Boolean { .. } | AttributeKind::Choice => match &attr.option_set {
                Some(set) => AttributeExtra::OptionSet(set.clone()),
                None => AttributeExtra::None,
            },
        };

        Self {
            physical_name: attr.logical_name.clone(),
            logical_name: attr.logical_name.clone(),
            type_tag: attr.kind.type_tag(),
            required_level: attr.required_level,
            display_mask: Some(attr.display_mask()),
            ime_mode: attr.ime_mode,
            valid_for_api: (true, true, true),
            is_custom: true,
            audit: true,
            can_modify_requirement: true,
            flags: attr.flags,
            extra,
            display_name: attr.display_name.clone(),
            description: None,
        }
    }

    pub fn write(&self, w: &mut XmlWriter, language: &str) {
        w.open("attribute", &[("PhysicalName", self.physical_name.as_str())]);
        w.element("Type", self.type_tag);
        w.element("Name", self.logical_name.as_str());
        w.element("LogicalName", self.logical_name.as_str());
        w.element("RequiredLevel", self.required_level.package_name());
        if let Some(mask) = self.display_mask {
            w.element("DisplayMask", mask);
        }
        w.element("ImeMode", self.ime_mode.as_str());
        let (update, read, create) = self.valid_for_api;
        w.element("ValidForUpdateApi", flag(update));
        w.element("ValidForReadApi", flag(read));
        w.element("ValidForCreateApi", flag(create));
        w.element("IsCustomField", flag(self.is_custom));
        w.element("IsAuditEnabled", flag(self.audit));
        w.element("IsSecured", "0");
        w.element("IntroducedVersion", "1.0.0.0");
        w.element("IsCustomizable", "1");
        w.element("IsRenameable", "1");
        w.element("CanModifySearchSettings", "1");
        w.element(
            "CanModifyRequirementLevelSettings",
            flag(self.can_modify_requirement),
        );
        w.element("CanModifyAdditionalSettings", "1");
        w.element("SourceType", "0");
        w.element("IsGlobalFilterEnabled", "0");
        w.element("IsSortableEnabled", "0");
        w.element("CanModifyGlobalFilterSettings", "1");
        w.element("CanModifyIsSortableSettings", "1");
        w.element("IsDataSourceSecret", "0");
        w.element("AutoNumberFormat", "");
        w.element("IsSearchable", flag(self.flags.searchable));
        w.element("IsFilterable", flag(self.flags.filterable));
        w.element("IsRetrievable", flag(self.flags.retrievable));
        w.element("IsLocalizable", "0");
        self.write_extra(w, language);
        w.open("displaynames", &[]);
        w.empty(
            "displayname",
            &[("description", self.display_name.as_str()), ("languagecode", language)],
        );
        w.close("displaynames");
        if let Some(description) = &self.description {
            w.open("Descriptions", &[]);
            w.empty(
                "Description",
                &[("description", description.as_str()), ("languagecode", language)],
            );
            w.close("Descriptions");
        }
        w.close("attribute");
    }

    fn write_extra(&self, w: &mut XmlWriter, language: &str) {
        match &self.extra {
            AttributeExtra::None => {}
            AttributeExtra::Text {
                format,
                max_length,
                length,
            } => {
                w.element("Format", format);
                w.element("MaxLength", &max_length.to_string());
                if let Some(length) = length {
                    w.element("Length", &length.to_string());
                }
            }
            AttributeExtra::Integer { min, max } => {
                w.element("Format", "");
                w.element("MinValue", &min.to_string());
                w.element("MaxValue", &max.to_string());
            }
            AttributeExtra::DateTime {
                format,
                can_change_behavior,
                behavior,
            } => {
                w.element("Format", format);
                w.element("CanChangeDateTimeBehavior", flag(*can_change_behavior));
                w.element("Behavior", &behavior.to_string());
            }
            AttributeExtra::Lookup => {
                w.element("LookupStyle", "single");
                w.empty("LookupTypes", &[]);
            }
            AttributeExtra::OptionSet(set) => write_option_set(w, set, language),
        }
    }
}

fn write_labels(w: &mut XmlWriter, label: &str, language: &str) {
    w.open("labels", &[]);
    w.empty("label", &[("description", label), ("languagecode", language)]);
    w.close("labels");
}

/// `<optionset>` with options, states or statuses depending on its kind.
pub fn write_option_set(w: &mut XmlWriter, set: &OptionSet, language: &str) {
    w.open("optionset", &[("Name", set.name.as_str())]);
    w.element("OptionSetType", set.kind.as_str());
    w.element("IntroducedVersion", "1.0.0.0");
    w.element("IsCustomizable", "1");
    w.open("displaynames", &[]);
    w.empty(
        "displayname",
        &[("description", set.display_name.as_str()), ("languagecode", language)],
    );
    w.close("displaynames");

    match set.kind {
        OptionSetKind::Bit | OptionSetKind::Picklist => {
            w.open("options", &[]);
            for option in &set.options {
                let value = option.value(OutputPath::Package).to_string();
                w.open(
                    "option",
                    &[("value", value.as_str()), ("ExternalValue", ""), ("IsHidden", "0")],
                );
                write_labels(w, &option.label, language);
                w.close("option");
            }
            w.close("options");
        }
        OptionSetKind::State => {
            w.open("states", &[]);
            for option in &set.options {
                let value = option.package_value.to_string();
                let default_status = option.linked_value.unwrap_or_default().to_string();
                w.open(
                    "state",
                    &[
                        ("value", value.as_str()),
                        ("defaultstatus", default_status.as_str()),
                        ("invariantname", option.label.as_str()),
                    ],
                );
                write_labels(w, &option.label, language);
                w.close("state");
            }
            w.close("states");
        }
        OptionSetKind::Status => {
            w.open("statuses", &[]);
            for option in &set.options {
                let value = option.package_value.to_string();
                let state = option.linked_value.unwrap_or_default().to_string();
                w.open("status", &[("value", value.as_str()), ("state", state.as_str())]);
                write_labels(w, &option.label, language);
                w.close("status");
            }
            w.close("statuses");
        }
    }

    w.close("optionset");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::encode_column;
    use crate::model::{Column, ColumnType};

    fn render(record: &AttributeRecord) -> String {
        let mut w = XmlWriter::new();
        record.write(&mut w, "1033");
        w.into_string()
    }

    #[test]
    fn test_primary_string_lengths() {
        let column = Column::string("redi_code", "Code").max_length(50).required();
        let attr = encode_column("redi_building", &column, true).unwrap();
        let xml = render(&AttributeRecord::from_resolved(&attr));

        assert!(xml.contains("<RequiredLevel>required</RequiredLevel>"));
        assert!(xml.contains("<MaxLength>50</MaxLength>"));
        assert!(xml.contains("<Length>100</Length>"));
        assert!(xml.contains("<IsSearchable>1</IsSearchable>"));
        assert!(xml.contains(
            "<DisplayMask>PrimaryName|ValidForAdvancedFind|ValidForForm|ValidForGrid|RequiredForForm</DisplayMask>"
        ));
    }

    #[test]
    fn test_memo_renders_fixed_length() {
        let column = Column::new("redi_notes", "Notes", ColumnType::Memo).max_length(10_000);
        let attr = encode_column("t", &column, false).unwrap();
        let xml = render(&AttributeRecord::from_resolved(&attr));

        assert!(xml.contains("<Format>textarea</Format>"));
        assert!(xml.contains("<MaxLength>2000</MaxLength>"));
        assert!(!xml.contains("<Length>"));
    }

    #[test]
    fn test_choice_option_set() {
        let column = Column::choice("redi_mediatype", "Media Type", ["Image", "Attachment"]);
        let attr = encode_column("redi_equipmentmedia", &column, false).unwrap();
        let mut w = XmlWriter::new();
        if let Some(set) = &attr.option_set {
            write_option_set(&mut w, set, "1033");
        }

        insta::assert_snapshot!(w.into_string(), @r#"
        <optionset Name="redi_equipmentmedia_redi_mediatype">
          <OptionSetType>picklist</OptionSetType>
          <IntroducedVersion>1.0.0.0</IntroducedVersion>
          <IsCustomizable>1</IsCustomizable>
          <displaynames>
            <displayname description="Media Type" languagecode="1033" />
          </displaynames>
          <options>
            <option value="100000000" ExternalValue="" IsHidden="0">
              <labels>
                <label description="Image" languagecode="1033" />
              </labels>
            </option>
            <option value="100000001" ExternalValue="" IsHidden="0">
              <labels>
                <label description="Attachment" languagecode="1033" />
              </labels>
            </option>
          </options>
        </optionset>
        "#);
    }
}
