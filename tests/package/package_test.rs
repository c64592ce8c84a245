#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use trellis::compile::{compile_schema, CompileOptions, CompiledSchema};
    use trellis::config::Settings;
    use trellis::model::{load_schema, Column, Schema, Table};
    use trellis::package::{render_package, Package};

    fn simquip() -> CompiledSchema {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/simquip.json");
        let schema = load_schema(&path).unwrap();
        compile_schema(&schema, &CompileOptions::default()).unwrap()
    }

    fn render(compiled: &CompiledSchema) -> Package {
        render_package(compiled, &Settings::default())
    }

    /// The `<attribute>` block for `name` inside an entity document.
    fn attribute_block<'a>(xml: &'a str, name: &str) -> &'a str {
        let open = format!(r#"<attribute PhysicalName="{}">"#, name);
        let start = xml.find(&open).unwrap();
        let end = start + xml[start..].find("</attribute>").unwrap();
        &xml[start..end]
    }

    #[test]
    fn test_document_set() {
        let package = render(&simquip());

        assert_eq!(package.len(), 7 * 2 + 6 + 4);
        for path in [
            "[Content_Types].xml",
            "Other/Customizations.xml",
            "Other/Relationships.xml",
            "Other/Solution.xml",
            "Entities/redi_building/Entity.xml",
            "Entities/redi_building/RibbonDiff.xml",
            "Other/Relationships/redi_person.xml",
            "Other/Relationships/redi_equipment.xml",
        ] {
            assert!(package.get(path).is_some(), "missing {}", path);
        }
        assert!(package.get("Other/Relationships/redi_loantransfer.xml").is_none());
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let first = render(&simquip());
        let second = render(&simquip());

        assert_eq!(first, second);
        assert_eq!(first.digest(), second.digest());
        assert_eq!(first.digest().len(), 64);
    }

    #[test]
    fn test_digest_tracks_content() {
        let base = render(&simquip());

        let mut settings = Settings::default();
        settings.solution.version = "1.0.0.1".to_string();
        let bumped = render_package(&simquip(), &settings);

        assert_ne!(base.digest(), bumped.digest());
    }

    #[test]
    fn test_primary_string_length_doubles() {
        let schema = Schema::new(vec![Table::new("redi_room", "Room", "Rooms")
            .column(Column::string("redi_name", "Name").max_length(50).required())]);
        let compiled = compile_schema(&schema, &CompileOptions::default()).unwrap();
        let package = render(&compiled);

        let xml = package.get("Entities/redi_room/Entity.xml").unwrap();
        let block = attribute_block(xml, "redi_name");
        assert!(block.contains("<RequiredLevel>required</RequiredLevel>"));
        assert!(block.contains("<MaxLength>50</MaxLength>"));
        assert!(block.contains("<Length>100</Length>"));
    }

    #[test]
    fn test_relationship_documents() {
        let package = render(&simquip());

        let index = package.get("Other/Relationships.xml").unwrap();
        let names: Vec<&str> = index
            .lines()
            .filter_map(|l| l.trim().strip_prefix(r#"<EntityRelationship Name=""#))
            .filter_map(|l| l.strip_suffix(r#"" />"#))
            .collect();
        assert_eq!(names.len(), 8);
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);

        let person = package.get("Other/Relationships/redi_person.xml").unwrap();
        assert!(person.contains(r#"<EntityRelationship Name="redi_person_loantransfer_personid">"#));
        assert!(person.contains(r#"<EntityRelationship Name="redi_person_team_leadpersonid">"#));
    }

    #[test]
    fn test_manifest_lists_every_table() {
        let compiled = simquip();
        let package = render(&compiled);
        let manifest = package.get("Other/Solution.xml").unwrap();

        for entity in &compiled.entities {
            let component = format!(
                r#"<RootComponent type="1" schemaName="{}" behavior="0" />"#,
                entity.logical_name
            );
            assert!(manifest.contains(&component), "missing {}", entity.logical_name);
        }
    }

    #[test]
    fn test_package_path_values() {
        let package = render(&simquip());
        let loan = package.get("Entities/redi_loantransfer/Entity.xml").unwrap();

        // Memo is fixed at 2000 in the package regardless of the declared length.
        assert!(attribute_block(loan, "redi_notes").contains("<MaxLength>2000</MaxLength>"));
        // Choice values are offset into the publisher's option value range.
        assert!(attribute_block(loan, "redi_reasoncode").contains(r#"value="100000000""#));
    }

    #[test]
    fn test_write_to_dir_regenerates() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("solution_output");
        fs::create_dir_all(out.join("Entities/redi_stale")).unwrap();
        fs::write(out.join("Entities/redi_stale/Entity.xml"), "stale").unwrap();

        let package = render(&simquip());
        package.write_to_dir(&out).unwrap();

        assert!(!out.join("Entities/redi_stale").exists());
        let written = fs::read_to_string(out.join("Entities/redi_level/Entity.xml")).unwrap();
        assert_eq!(Some(written.as_str()), package.get("Entities/redi_level/Entity.xml"));
        assert!(out.join("[Content_Types].xml").exists());
        assert!(out.join("Other/Relationships/redi_building.xml").exists());
    }
}
