//! Implicit attributes every custom entity carries.
//!
//! Identifier, audit stamps, delegate lookups, import and time-zone
//! bookkeeping, and the state/status pair. The state option set has exactly
//! two states (Active, Inactive) and the status set maps one status to each.

use super::attribute::{AttributeExtra, AttributeRecord};
use crate::compile::{
    AttributeFlags, ImeMode, OptionEntry, OptionSet, OptionSetKind, RequiredLevel,
};

const STANDARD_MASK: &str = "ValidForAdvancedFind|ValidForForm|ValidForGrid";

/// Title-case each word: `equipment_media` → `Equipment_Media`.
pub(crate) fn title_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            result.push(c);
            word_start = true;
        }
    }
    result
}

fn flags(searchable: bool, filterable: bool, retrievable: bool) -> AttributeFlags {
    AttributeFlags {
        searchable,
        filterable,
        retrievable,
    }
}

/// A system attribute with the settings most of the bundle shares.
fn base(physical_name: &str, type_tag: &'static str, display_name: &str) -> AttributeRecord {
    AttributeRecord {
        physical_name: physical_name.to_string(),
        logical_name: physical_name.to_lowercase(),
        type_tag,
        required_level: RequiredLevel::None,
        display_mask: Some(STANDARD_MASK),
        ime_mode: ImeMode::Auto,
        valid_for_api: (false, true, false),
        is_custom: false,
        audit: false,
        can_modify_requirement: true,
        flags: AttributeFlags::default(),
        extra: AttributeExtra::None,
        display_name: display_name.to_string(),
        description: None,
    }
}

fn lookup(physical_name: &str, display_name: &str) -> AttributeRecord {
    AttributeRecord {
        extra: AttributeExtra::Lookup,
        ..base(physical_name, "lookup", display_name)
    }
}

fn stamp(physical_name: &str, display_name: &str) -> AttributeRecord {
    AttributeRecord {
        ime_mode: ImeMode::Inactive,
        flags: flags(false, true, true),
        extra: AttributeExtra::DateTime {
            format: "datetime",
            can_change_behavior: false,
            behavior: 1,
        },
        ..base(physical_name, "datetime", display_name)
    }
}

fn time_zone_code(physical_name: &str, display_name: &str) -> AttributeRecord {
    AttributeRecord {
        display_mask: None,
        valid_for_api: (true, true, true),
        extra: AttributeExtra::Integer {
            min: -1,
            max: i64::from(i32::MAX),
        },
        ..base(physical_name, "int", display_name)
    }
}

fn state_option_set(table: &str) -> OptionSet {
    OptionSet {
        name: format!("{}_statecode", table),
        kind: OptionSetKind::State,
        display_name: "Status".to_string(),
        options: vec![
            OptionEntry::new(0, "Active").linked(1),
            OptionEntry::new(1, "Inactive").linked(2),
        ],
    }
}

fn status_option_set(table: &str) -> OptionSet {
    OptionSet {
        name: format!("{}_statuscode", table),
        kind: OptionSetKind::Status,
        display_name: "Status Reason".to_string(),
        options: vec![
            OptionEntry::new(1, "Active").linked(0),
            OptionEntry::new(2, "Inactive").linked(1),
        ],
    }
}

/// The thirteen system attributes of `table`, in document order.
pub fn system_attributes(table: &str, prefix: &str) -> Vec<AttributeRecord> {
    let short = table
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(table);
    let id = format!("{}id", table);

    vec![
        AttributeRecord {
            required_level: RequiredLevel::SystemRequired,
            display_mask: Some("ValidForAdvancedFind|RequiredForGrid"),
            valid_for_api: (false, true, true),
            can_modify_requirement: false,
            flags: flags(false, true, true),
            description: Some("Unique identifier for entity instances".to_string()),
            ..base(&id, "primarykey", &title_case(short))
        },
        lookup("CreatedBy", "Created By"),
        stamp("CreatedOn", "Created On"),
        lookup("CreatedOnBehalfBy", "Created By (Delegate)"),
        lookup("ModifiedBy", "Modified By"),
        stamp("ModifiedOn", "Modified On"),
        lookup("ModifiedOnBehalfBy", "Modified By (Delegate)"),
        AttributeRecord {
            display_mask: Some("ValidForAdvancedFind|ValidForGrid"),
            ime_mode: ImeMode::Inactive,
            valid_for_api: (false, true, true),
            audit: true,
            extra: AttributeExtra::DateTime {
                format: "date",
                can_change_behavior: false,
                behavior: 1,
            },
            ..base("OverriddenCreatedOn", "datetime", "Record Created On")
        },
        AttributeRecord {
            display_mask: Some("ValidForAdvancedFind"),
            ime_mode: ImeMode::Disabled,
            valid_for_api: (false, true, true),
            audit: true,
            extra: AttributeExtra::Integer {
                min: i64::from(i32::MIN),
                max: i64::from(i32::MAX),
            },
            ..base("ImportSequenceNumber", "int", "Import Sequence Number")
        },
        time_zone_code("TimeZoneRuleVersionNumber", "Time Zone Rule Version Number"),
        time_zone_code("UTCConversionTimeZoneCode", "UTC Conversion Time Zone Code"),
        AttributeRecord {
            required_level: RequiredLevel::SystemRequired,
            valid_for_api: (true, true, false),
            audit: true,
            flags: flags(false, true, false),
            extra: AttributeExtra::OptionSet(state_option_set(table)),
            ..base("statecode", "state", "Status")
        },
        AttributeRecord {
            valid_for_api: (true, true, true),
            audit: true,
            extra: AttributeExtra::OptionSet(status_option_set(table)),
            ..base("statuscode", "status", "Status Reason")
        },
    ]
}
