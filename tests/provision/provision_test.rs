#[cfg(test)]
mod tests {
    use std::path::Path;
    use trellis::compile::{compile_schema, CompileOptions, CompiledSchema};
    use trellis::config::Settings;
    use trellis::model::load_schema;
    use trellis::provision::{
        EnvToken, InMemoryStore, ItemKind, Outcome, PreconditionError, Provisioner, WebApiStore,
    };

    fn simquip() -> CompiledSchema {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/simquip.json");
        let schema = load_schema(&path).unwrap();
        compile_schema(&schema, &CompileOptions::default()).unwrap()
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.provision.visibility_attempts = 3;
        settings.provision.visibility_interval_ms = 0;
        settings
    }

    fn position(calls: &[String], call: &str) -> usize {
        calls
            .iter()
            .position(|c| c == call)
            .unwrap_or_else(|| panic!("no call {}", call))
    }

    #[tokio::test]
    async fn test_first_run_creates_everything() {
        let compiled = simquip();
        let settings = settings();
        let store = InMemoryStore::new().with_publisher("redi", "pub-1");

        let report = Provisioner::new(&store, &settings).run(&compiled).await.unwrap();

        assert!(report.is_clean(), "{}", report);
        assert_eq!(report.items_of(ItemKind::Table).count(), 7);
        assert_eq!(report.items_of(ItemKind::Relationship).count(), 8);
        assert_eq!(store.tables().await.len(), 7);
        assert_eq!(store.relationships().await.len(), 8);
        assert_eq!(store.solution_tables("SimQuipTables").await.len(), 7);
        assert_eq!(
            store.columns("redi_loantransfer").await,
            vec![
                "redi_duedate",
                "redi_equipmentid",
                "redi_isinternaltransfer",
                "redi_loantransfer_name",
                "redi_notes",
                "redi_personid",
                "redi_reasoncode",
                "redi_starteddate",
            ]
        );
    }

    #[tokio::test]
    async fn test_tables_exist_before_their_lookups() {
        let compiled = simquip();
        let settings = settings();
        let store = InMemoryStore::new().with_publisher("redi", "pub-1");
        Provisioner::new(&store, &settings).run(&compiled).await.unwrap();

        let calls = store.create_calls().await;
        assert!(
            position(&calls, "table:redi_building")
                < position(&calls, "relationship:redi_building_level_buildingid")
        );

        for rel in &compiled.relationships {
            let created = position(&calls, &format!("relationship:{}", rel.name));
            assert!(position(&calls, &format!("table:{}", rel.referenced_table)) < created);
            assert!(position(&calls, &format!("table:{}", rel.referencing_table)) < created);
        }
    }

    #[tokio::test]
    async fn test_rerun_is_a_no_op() {
        let compiled = simquip();
        let settings = settings();
        let store = InMemoryStore::new().with_publisher("redi", "pub-1");

        Provisioner::new(&store, &settings).run(&compiled).await.unwrap();
        let first_calls = store.create_calls().await.len();

        let report = Provisioner::new(&store, &settings).run(&compiled).await.unwrap();

        assert_eq!(report.created(), 0);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.blocked(), 0);
        assert_eq!(report.skipped(), report.items.len());
        assert_eq!(store.create_calls().await.len(), first_calls);
    }

    #[tokio::test]
    async fn test_existing_tables_get_missing_columns() {
        let compiled = simquip();
        let settings = settings();
        let store = InMemoryStore::new()
            .with_publisher("redi", "pub-1")
            .with_solution("SimQuipTables")
            .with_table("redi_building", ["redi_name", "redi_code"]);

        let report = Provisioner::new(&store, &settings).run(&compiled).await.unwrap();

        assert_eq!(report.outcome(ItemKind::Solution, "SimQuipTables"), Some(&Outcome::Skipped));
        assert_eq!(report.outcome(ItemKind::Table, "redi_building"), Some(&Outcome::Skipped));
        assert_eq!(report.outcome(ItemKind::Column, "redi_building.redi_code"), Some(&Outcome::Skipped));
        assert_eq!(
            report.outcome(ItemKind::Column, "redi_building.redi_address"),
            Some(&Outcome::Created)
        );
        assert_eq!(
            report.outcome(ItemKind::Component, "redi_building"),
            Some(&Outcome::Created)
        );
    }

    #[tokio::test]
    async fn test_rejected_create_is_recorded_and_run_continues() {
        let compiled = simquip();
        let settings = settings();
        let store = InMemoryStore::new()
            .with_publisher("redi", "pub-1")
            .reject_create("redi_assetnumber", 400, "Invalid MaxLength");

        let report = Provisioner::new(&store, &settings).run(&compiled).await.unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.outcome(ItemKind::Column, "redi_equipment.redi_assetnumber"),
            Some(&Outcome::Failed {
                status: Some(400),
                message: "Invalid MaxLength".to_string(),
            })
        );
        assert_eq!(report.outcome(ItemKind::Table, "redi_loantransfer"), Some(&Outcome::Created));
        assert_eq!(
            report.outcome(ItemKind::Relationship, "redi_equipment_loantransfer_equipmentid"),
            Some(&Outcome::Created)
        );
    }

    #[tokio::test]
    async fn test_missing_publisher_is_fatal() {
        let compiled = simquip();
        let settings = settings();
        let store = InMemoryStore::new();

        let result = Provisioner::new(&store, &settings).run(&compiled).await;

        assert!(matches!(
            result,
            Err(PreconditionError::PublisherNotFound { ref prefix }) if prefix == "redi"
        ));
        assert!(store.create_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_existing_solution_needs_no_publisher() {
        let compiled = simquip();
        let settings = settings();
        let store = InMemoryStore::new().with_solution("SimQuipTables");

        let report = Provisioner::new(&store, &settings).run(&compiled).await.unwrap();
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_unreachable_store_is_fatal() {
        let compiled = simquip();
        let settings = settings();
        let store = InMemoryStore::new().with_publisher("redi", "pub-1").offline();

        let result = Provisioner::new(&store, &settings).run(&compiled).await;
        assert!(matches!(result, Err(PreconditionError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_slow_visibility_within_budget() {
        let compiled = simquip();
        let settings = settings();
        let store = InMemoryStore::new()
            .with_publisher("redi", "pub-1")
            .with_visibility_delay(2);

        let report = Provisioner::new(&store, &settings).run(&compiled).await.unwrap();
        assert!(report.is_clean(), "{}", report);
    }

    #[tokio::test]
    async fn test_visibility_timeout_blocks_dependents() {
        let compiled = simquip();
        let settings = settings();
        let store = InMemoryStore::new()
            .with_publisher("redi", "pub-1")
            .with_visibility_delay(5);

        let report = Provisioner::new(&store, &settings).run(&compiled).await.unwrap();

        assert_eq!(
            report.outcome(ItemKind::Table, "redi_building"),
            Some(&Outcome::Failed {
                status: None,
                message: "Table 'redi_building' not visible after 3 attempts".to_string(),
            })
        );
        assert!(matches!(
            report.outcome(ItemKind::Column, "redi_building.redi_code"),
            Some(Outcome::Blocked { .. })
        ));
        assert!(matches!(
            report.outcome(ItemKind::Relationship, "redi_building_level_buildingid"),
            Some(Outcome::Blocked { .. })
        ));
        assert_eq!(report.failed(), 7);
    }

    #[test]
    fn test_missing_token_stops_before_connecting() {
        let mut settings = Settings::default();
        settings.environment.url = Some("https://example.crm6.dynamics.com".to_string());
        settings.environment.token_env = "TRELLIS_TEST_TOKEN_THAT_IS_NEVER_SET".to_string();

        let credentials = EnvToken::new(settings.environment.token_env.clone());
        let result = WebApiStore::connect(&settings.environment, &credentials, 1033);
        assert!(matches!(result, Err(PreconditionError::MissingCredential(_))));
    }
}
