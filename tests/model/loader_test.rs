#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use trellis::model::{
        load_schema, load_schema_from_str, ChoiceOption, ColumnType, DeclaredType, LoadError,
        SchemaFormat,
    };

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn test_load_simquip_fixture() {
        let schema = load_schema(&fixture("simquip.json")).unwrap();

        assert_eq!(schema.tables.len(), 7);
        let person = schema.table("redi_person").unwrap();
        assert_eq!(person.plural_name, "People");
        assert_eq!(person.columns.len(), 4);

        let active = person.find_column("redi_isactive").unwrap();
        assert_eq!(active.known_type(), Some(ColumnType::Boolean));
        assert_eq!(active.default_value, Some(true));
    }

    #[test]
    fn test_mixed_option_forms() {
        let schema = load_schema(&fixture("simquip.json")).unwrap();

        let status = schema
            .table("redi_equipment")
            .and_then(|t| t.find_column("redi_status"))
            .unwrap();
        assert_eq!(status.options[1], ChoiceOption::Label("On Loan".to_string()));

        let reason = schema
            .table("redi_loantransfer")
            .and_then(|t| t.find_column("redi_reasoncode"))
            .unwrap();
        assert_eq!(reason.options[3], ChoiceOption::explicit(4, "Other"));
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.toml");
        fs::write(
            &path,
            r#"
[[tables]]
logicalName = "redi_building"
displayName = "Building"
pluralName = "Buildings"

[[tables.columns]]
logicalName = "redi_code"
displayName = "Code"
type = "String"
maxLength = 20
required = true
"#,
        )
        .unwrap();

        let schema = load_schema(&path).unwrap();
        let column = &schema.tables[0].columns[0];
        assert_eq!(column.column_type, DeclaredType::Known(ColumnType::String));
        assert_eq!(column.max_length, Some(20));
        assert!(column.required);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        fs::write(&path, "tables: []").unwrap();

        let result = load_schema(&path);
        assert!(matches!(
            result,
            Err(LoadError::UnsupportedExtension { ref extension }) if extension == "yaml"
        ));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, r#"{"tables": [{"logicalName": "redi_building"}]}"#).unwrap();

        let err = load_schema(&path).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
        assert!(err.to_string().starts_with("Invalid JSON schema"));
    }

    #[test]
    fn test_optional_fields_default() {
        let schema = load_schema_from_str(
            r#"{"tables": [{"logicalName": "redi_tag", "displayName": "Tag", "pluralName": "Tags"}]}"#,
            SchemaFormat::Json,
        )
        .unwrap();

        let table = &schema.tables[0];
        assert!(table.columns.is_empty());
        assert_eq!(table.description, None);
        assert_eq!(table.primary_name_column, None);
    }
}
