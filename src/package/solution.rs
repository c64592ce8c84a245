//! Solution manifest, customization registry and content types.

use super::xml::{XmlWriter, XSI_NAMESPACE};
use crate::config::{PublisherSettings, SolutionSettings};

/// Root component type code for entities.
const ENTITY_COMPONENT_TYPE: &str = "1";

const ADDRESS_FIELDS: &[&str] = &[
    "City",
    "County",
    "Country",
    "Fax",
    "FreightTermsCode",
    "ImportSequenceNumber",
    "Latitude",
    "Line1",
    "Line2",
    "Line3",
    "Longitude",
    "Name",
    "PostalCode",
    "PostOfficeBox",
    "PrimaryContactName",
];

const ADDRESS_TRAILING_FIELDS: &[&str] = &["Telephone1", "Telephone2", "Telephone3"];

/// `Other/Customizations.xml`.
pub fn render_customizations(language: &str) -> String {
    let mut w = XmlWriter::document();
    w.open("ImportExportXml", &[("xmlns:xsi", XSI_NAMESPACE)]);
    for section in [
        "Entities",
        "Roles",
        "Workflows",
        "FieldSecurityProfiles",
        "Templates",
        "EntityMaps",
        "EntityRelationships",
        "OrganizationSettings",
        "optionsets",
        "CustomControls",
        "EntityDataProviders",
    ] {
        w.empty(section, &[]);
    }
    w.open("Languages", &[]);
    w.element("Language", language);
    w.close("Languages");
    w.close("ImportExportXml");
    w.into_string()
}

fn write_address(w: &mut XmlWriter, number: u8) {
    w.open("Address", &[]);
    w.element("AddressNumber", &number.to_string());
    w.element("AddressTypeCode", "1");
    for field in ADDRESS_FIELDS {
        w.nil(field);
    }
    w.element("ShippingMethodCode", "1");
    w.nil("StateOrProvince");
    for field in ADDRESS_TRAILING_FIELDS {
        w.nil(field);
    }
    w.element("TimeZoneRuleVersionNumber", "0");
    w.nil("UPSZone");
    w.nil("UTCOffset");
    w.nil("UTCConversionTimeZoneCode");
    w.close("Address");
}

/// `Other/Solution.xml`: identity plus every table as a root component.
pub fn render_solution_manifest<'a>(
    solution: &SolutionSettings,
    publisher: &PublisherSettings,
    language: &str,
    tables: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut w = XmlWriter::document();
    w.open(
        "ImportExportXml",
        &[
            ("version", "9.2.26012.156"),
            ("SolutionPackageVersion", "9.2"),
            ("languagecode", language),
            ("generatedBy", "CrmLive"),
            ("xmlns:xsi", XSI_NAMESPACE),
        ],
    );
    w.open("SolutionManifest", &[]);
    w.element("UniqueName", &solution.unique_name);
    w.open("LocalizedNames", &[]);
    w.empty(
        "LocalizedName",
        &[("description", solution.display_name.as_str()), ("languagecode", language)],
    );
    w.close("LocalizedNames");
    w.open("Descriptions", &[]);
    w.empty(
        "Description",
        &[("description", solution.description.as_str()), ("languagecode", language)],
    );
    w.close("Descriptions");
    w.element("Version", &solution.version);
    w.element("Managed", "0");

    w.open("Publisher", &[]);
    w.element("UniqueName", &publisher.unique_name);
    w.open("LocalizedNames", &[]);
    w.empty(
        "LocalizedName",
        &[("description", publisher.display_name.as_str()), ("languagecode", language)],
    );
    w.close("LocalizedNames");
    w.empty("Descriptions", &[]);
    w.nil("EMailAddress");
    w.nil("SupportingWebsiteUrl");
    w.element("CustomizationPrefix", &publisher.prefix);
    w.element(
        "CustomizationOptionValuePrefix",
        &publisher.option_value_prefix.to_string(),
    );
    w.open("Addresses", &[]);
    write_address(&mut w, 1);
    write_address(&mut w, 2);
    w.close("Addresses");
    w.close("Publisher");

    w.open("RootComponents", &[]);
    for table in tables {
        w.empty(
            "RootComponent",
            &[
                ("type", ENTITY_COMPONENT_TYPE),
                ("schemaName", table),
                ("behavior", "0"),
            ],
        );
    }
    w.close("RootComponents");
    w.empty("MissingDependencies", &[]);
    w.close("SolutionManifest");
    w.close("ImportExportXml");
    w.into_string()
}

/// `[Content_Types].xml`.
pub fn render_content_types() -> String {
    let mut w = XmlWriter::document();
    w.open(
        "Types",
        &[("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")],
    );
    w.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/octet-stream")],
    );
    w.close("Types");
    w.into_string()
}
