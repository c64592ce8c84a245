#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::Path;
    use trellis::compile::{
        compile_schema, AttributeKind, CompileOptions, CompiledSchema, OutputPath, PrimaryColumn,
        RequiredLevel, SchemaError,
    };
    use trellis::model::{load_schema, load_schema_from_str, Column, Schema, SchemaFormat, Table};

    fn simquip() -> CompiledSchema {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/simquip.json");
        let schema = load_schema(&path).unwrap();
        compile_schema(&schema, &CompileOptions::default()).unwrap()
    }

    #[test]
    fn test_building_and_level() {
        let json = r#"{"tables": [
            {"logicalName": "building", "displayName": "Building", "pluralName": "Buildings", "columns": []},
            {"logicalName": "level", "displayName": "Level", "pluralName": "Levels", "columns": [
                {"logicalName": "buildingId", "displayName": "Building", "type": "Lookup", "target": "building"}
            ]}
        ]}"#;
        let schema = load_schema_from_str(json, SchemaFormat::Json).unwrap();
        let compiled = compile_schema(&schema, &CompileOptions::default()).unwrap();

        assert_eq!(compiled.entities.len(), 2);
        assert_eq!(compiled.relationships.len(), 1);

        let rel = &compiled.relationships[0];
        assert_eq!(rel.name, "redi_building_level_buildingId");
        assert_eq!(rel.referenced_table, "building");
        assert_eq!(rel.referencing_table, "level");
        assert_eq!(rel.referencing_attribute, "buildingId");

        let building = compiled.plan.position("building").unwrap();
        let level = compiled.plan.position("level").unwrap();
        assert!(building < level);
        assert!(compiled.plan.fixups.is_empty());
    }

    #[test]
    fn test_primary_string_length_doubles() {
        let schema = Schema::new(vec![Table::new("redi_room", "Room", "Rooms")
            .column(Column::string("redi_name", "Name").max_length(50).required())]);
        let compiled = compile_schema(&schema, &CompileOptions::default()).unwrap();

        let primary = compiled.entities[0].primary_attribute().unwrap();
        assert_eq!(primary.logical_name, "redi_name");
        assert_eq!(primary.required_level.package_name(), "required");
        assert_eq!(primary.max_length(OutputPath::Package), Some(50));
        assert_eq!(primary.stored_length(), Some(100));
    }

    #[test]
    fn test_unknown_type_names_column_and_table() {
        let json = r#"{"tables": [{"logicalName": "redi_invoice", "displayName": "Invoice", "pluralName": "Invoices",
            "columns": [{"logicalName": "redi_amount", "displayName": "Amount", "type": "Currency"}]}]}"#;
        let schema = load_schema_from_str(json, SchemaFormat::Json).unwrap();

        let err = compile_schema(&schema, &CompileOptions::default()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownColumnType {
                table: "redi_invoice".to_string(),
                column: "redi_amount".to_string(),
                type_name: "Currency".to_string(),
            }
        );
        assert_eq!(err.table(), Some("redi_invoice"));
        assert!(err.to_string().contains("redi_amount"));
    }

    #[test]
    fn test_every_table_has_one_primary() {
        let compiled = simquip();

        for entity in &compiled.entities {
            let primaries = entity.attributes.iter().filter(|a| a.is_primary_name).count();
            assert_eq!(primaries, 1, "table {}", entity.logical_name);
        }

        let person = compiled.entity("redi_person").unwrap();
        assert_eq!(
            person.primary,
            PrimaryColumn::FirstRequiredString("redi_displayname".to_string())
        );

        let loan = compiled.entity("redi_loantransfer").unwrap();
        assert!(loan.primary.is_synthesized());
        assert_eq!(loan.attributes[0].logical_name, "redi_loantransfer_name");
        assert_eq!(loan.attributes[0].required_level, RequiredLevel::ApplicationRequired);
    }

    #[test]
    fn test_one_relationship_per_lookup() {
        let compiled = simquip();

        let lookups: usize = compiled
            .entities
            .iter()
            .map(|e| e.attributes.iter().filter(|a| a.kind.is_lookup()).count())
            .sum();
        assert_eq!(compiled.relationships.len(), lookups);
        assert_eq!(lookups, 8);

        let names: HashSet<&str> = compiled.relationships.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names.len(), compiled.relationships.len());

        for rel in &compiled.relationships {
            let attr = compiled
                .entity(&rel.referencing_table)
                .and_then(|e| e.attribute(&rel.referencing_attribute))
                .unwrap();
            assert_eq!(
                attr.kind,
                AttributeKind::Lookup {
                    target: rel.referenced_table.clone()
                }
            );
        }
    }

    #[test]
    fn test_cycles_are_deferred() {
        let compiled = simquip();

        assert_eq!(
            compiled.plan.fixups,
            vec![
                "redi_person_team_leadpersonid",
                "redi_team_person_teamid",
                "redi_equipment_equipment_parentequipmentid",
            ]
        );

        let self_ref = compiled
            .relationship("redi_equipment_equipment_parentequipmentid")
            .unwrap();
        assert!(self_ref.is_self_reference());

        let tiers = compiled.plan.tiers();
        assert_eq!(tiers[&0], vec!["redi_building", "redi_team", "redi_person"]);
        assert_eq!(tiers[&1], vec!["redi_level"]);
        assert_eq!(tiers[&2], vec!["redi_location"]);
        assert_eq!(tiers[&3], vec!["redi_equipment"]);
        assert_eq!(tiers[&4], vec!["redi_loantransfer"]);
    }

    #[test]
    fn test_referenced_tables_precede_acyclic_lookups() {
        let compiled = simquip();

        for (position, step) in compiled.plan.steps.iter().enumerate() {
            for name in &step.relationships {
                let rel = compiled.relationship(name).unwrap();
                assert_eq!(rel.referencing_table, step.table);
                let referenced = compiled.plan.position(&rel.referenced_table).unwrap();
                assert!(referenced < position, "{} before {}", rel.referenced_table, step.table);
            }
        }
    }

    #[test]
    fn test_relationship_name_collision() {
        let schema = Schema::new(vec![
            Table::new("redi_x", "X", "Xs"),
            Table::new("redi_x_y", "XY", "XYs"),
            Table::new("redi_y_z", "YZ", "YZs").column(Column::lookup("redi_w", "W", "redi_x")),
            Table::new("redi_z", "Z", "Zs").column(Column::lookup("redi_w", "W", "redi_x_y")),
        ]);

        let err = compile_schema(&schema, &CompileOptions::default()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateRelationshipName {
                name: "redi_x_y_z_w".to_string(),
                first: "redi_y_z.redi_w".to_string(),
                second: "redi_z.redi_w".to_string(),
            }
        );
    }

    #[test]
    fn test_structural_errors() {
        let duplicate = Schema::new(vec![
            Table::new("redi_a", "A", "As"),
            Table::new("redi_a", "A", "As"),
        ]);
        assert_eq!(
            compile_schema(&duplicate, &CompileOptions::default()).unwrap_err(),
            SchemaError::DuplicateTable("redi_a".to_string())
        );

        let dangling = Schema::new(vec![
            Table::new("redi_a", "A", "As").column(Column::lookup("redi_bid", "B", "redi_b"))
        ]);
        assert!(matches!(
            compile_schema(&dangling, &CompileOptions::default()),
            Err(SchemaError::UnknownLookupTarget { .. })
        ));

        let empty_choice = Schema::new(vec![Table::new("redi_a", "A", "As")
            .column(Column::choice("redi_kind", "Kind", Vec::<String>::new()))]);
        assert!(matches!(
            compile_schema(&empty_choice, &CompileOptions::default()),
            Err(SchemaError::EmptyChoice { .. })
        ));
    }

    #[test]
    fn test_compilation_is_deterministic() {
        assert_eq!(simquip(), simquip());
    }

    #[test]
    fn test_custom_prefix() {
        let schema = Schema::new(vec![
            Table::new("acme_site", "Site", "Sites"),
            Table::new("acme_asset", "Asset", "Assets")
                .column(Column::lookup("acme_siteid", "Site", "acme_site")),
        ]);
        let compiled = compile_schema(&schema, &CompileOptions::default().with_prefix("acme")).unwrap();

        assert_eq!(compiled.relationships[0].name, "acme_site_asset_siteid");
    }
}
