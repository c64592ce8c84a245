//! Idempotent live provisioning.
//!
//! Walks the compiled [`ProvisionPlan`](crate::compile::ProvisionPlan)
//! against a [`MetadataStore`]. Every table, column, relationship and
//! solution component goes through the same check-then-create step keyed
//! by logical name, so a rerun against a fully provisioned store performs
//! no creates.
//!
//! Only two conditions stop a run: the store failing the connectivity
//! check, and a missing publisher when the solution has to be created.
//! Everything else is recorded in the [`ProvisionReport`] and the walk
//! moves on.

pub mod credentials;
pub mod error;
pub mod http;
pub mod memory;
pub mod payload;
pub mod store;

use std::collections::HashSet;
use std::fmt;

pub use credentials::{CredentialProvider, EnvToken, StaticToken};
pub use error::{PreconditionError, StoreError, StoreResult};
pub use http::WebApiStore;
pub use memory::InMemoryStore;
pub use store::MetadataStore;

use crate::compile::{CompiledSchema, Entity, Relationship};
use crate::config::{ProvisionSettings, Settings};

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Solution,
    Table,
    Column,
    Relationship,
    Component,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Solution => "solution",
            ItemKind::Table => "table",
            ItemKind::Column => "column",
            ItemKind::Relationship => "relationship",
            ItemKind::Component => "component",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    /// Already present; a successful no-op.
    Skipped,
    /// The store rejected the call.
    Failed { status: Option<u16>, message: String },
    /// Not attempted because something it depends on is unavailable.
    Blocked { reason: String },
}

impl Outcome {
    fn failed(err: &StoreError) -> Self {
        let message = match err {
            StoreError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Outcome::Failed {
            status: err.status(),
            message,
        }
    }

    fn blocked(reason: impl Into<String>) -> Self {
        Outcome::Blocked {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportItem {
    pub kind: ItemKind,
    pub name: String,
    pub outcome: Outcome,
}

/// Per-item outcomes of a provisioning run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub items: Vec<ReportItem>,
}

impl ProvisionReport {
    fn record(&mut self, kind: ItemKind, name: impl Into<String>, outcome: Outcome) {
        let name = name.into();
        match &outcome {
            Outcome::Created => tracing::info!(%kind, %name, "created"),
            Outcome::Skipped => tracing::info!(%kind, %name, "exists, skipped"),
            Outcome::Failed { status, message } => {
                tracing::warn!(%kind, %name, status = ?status, %message, "failed")
            }
            Outcome::Blocked { reason } => tracing::warn!(%kind, %name, %reason, "blocked"),
        }
        self.items.push(ReportItem { kind, name, outcome });
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.items.iter().filter(|i| predicate(&i.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn blocked(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Blocked { .. }))
    }

    /// No failures and nothing blocked.
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.blocked() == 0
    }

    pub fn outcome(&self, kind: ItemKind, name: &str) -> Option<&Outcome> {
        self.items
            .iter()
            .find(|i| i.kind == kind && i.name == name)
            .map(|i| &i.outcome)
    }

    pub fn items_of(&self, kind: ItemKind) -> impl Iterator<Item = &ReportItem> {
        self.items.iter().filter(move |i| i.kind == kind)
    }
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} skipped, {} failed, {} blocked",
            self.created(),
            self.skipped(),
            self.failed(),
            self.blocked()
        )
    }
}

// ============================================================================
// Provisioner
// ============================================================================

/// Poll until `table` is visible, up to the configured attempts.
pub async fn wait_until_visible(
    store: &dyn MetadataStore,
    table: &str,
    settings: &ProvisionSettings,
) -> StoreResult<()> {
    let attempts = settings.visibility_attempts.max(1);
    for attempt in 1..=attempts {
        if store.table_exists(table).await? {
            return Ok(());
        }
        tracing::debug!(table, attempt, "table not yet visible");
        if attempt < attempts {
            tokio::time::sleep(settings.visibility_interval()).await;
        }
    }
    Err(StoreError::VisibilityTimeout {
        table: table.to_string(),
        attempts,
    })
}

/// Whether a table is usable after its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableState {
    Existing,
    Created,
    Unavailable,
}

pub struct Provisioner<'a> {
    store: &'a dyn MetadataStore,
    settings: &'a Settings,
}

impl<'a> Provisioner<'a> {
    pub fn new(store: &'a dyn MetadataStore, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// Provision every table, column, relationship and solution component.
    pub async fn run(&self, compiled: &CompiledSchema) -> Result<ProvisionReport, PreconditionError> {
        let user = self
            .store
            .who_am_i()
            .await
            .map_err(PreconditionError::Unreachable)?;
        tracing::info!(user = %user, "connected");

        let mut report = ProvisionReport::default();
        let solution_ready = self.ensure_solution(&mut report).await?;

        let mut available: HashSet<&str> = HashSet::new();
        for step in &compiled.plan.steps {
            let Some(entity) = compiled.entity(&step.table) else {
                continue;
            };

            let state = self.ensure_table(entity, &mut report).await;
            if state == TableState::Unavailable {
                for attr in entity.plain_attributes() {
                    report.record(
                        ItemKind::Column,
                        format!("{}.{}", entity.logical_name, attr.logical_name),
                        Outcome::blocked(format!("table {} is unavailable", entity.logical_name)),
                    );
                }
            } else {
                available.insert(entity.logical_name.as_str());
                self.ensure_columns(entity, state == TableState::Created, &mut report)
                    .await;
            }

            for name in &step.relationships {
                if let Some(rel) = compiled.relationship(name) {
                    self.ensure_relationship(compiled, rel, &available, &mut report)
                        .await;
                }
            }
        }

        for name in &compiled.plan.fixups {
            if let Some(rel) = compiled.relationship(name) {
                self.ensure_relationship(compiled, rel, &available, &mut report)
                    .await;
            }
        }

        for step in &compiled.plan.steps {
            let table = step.table.as_str();
            if !solution_ready {
                report.record(
                    ItemKind::Component,
                    table,
                    Outcome::blocked("solution is unavailable"),
                );
            } else if !available.contains(table) {
                report.record(
                    ItemKind::Component,
                    table,
                    Outcome::blocked(format!("table {} is unavailable", table)),
                );
            } else {
                let outcome = self.ensure_component(table).await;
                report.record(ItemKind::Component, table, outcome);
            }
        }

        tracing::info!(
            created = report.created(),
            skipped = report.skipped(),
            failed = report.failed(),
            blocked = report.blocked(),
            "provisioning finished"
        );
        Ok(report)
    }

    /// Returns whether the solution can receive components.
    async fn ensure_solution(&self, report: &mut ProvisionReport) -> Result<bool, PreconditionError> {
        let solution = &self.settings.solution;
        let name = solution.unique_name.as_str();

        match self.store.solution_exists(name).await {
            Ok(true) => {
                report.record(ItemKind::Solution, name, Outcome::Skipped);
                return Ok(true);
            }
            Ok(false) => {}
            Err(err) => {
                report.record(ItemKind::Solution, name, Outcome::failed(&err));
                return Ok(false);
            }
        }

        let prefix = self.settings.publisher.prefix.as_str();
        let publisher_id = self
            .store
            .find_publisher(prefix)
            .await
            .map_err(PreconditionError::PublisherLookup)?
            .ok_or_else(|| PreconditionError::PublisherNotFound {
                prefix: prefix.to_string(),
            })?;

        match self.store.create_solution(solution, &publisher_id).await {
            Ok(()) => {
                report.record(ItemKind::Solution, name, Outcome::Created);
                Ok(true)
            }
            Err(err) => {
                report.record(ItemKind::Solution, name, Outcome::failed(&err));
                Ok(false)
            }
        }
    }

    async fn ensure_table(&self, entity: &Entity, report: &mut ProvisionReport) -> TableState {
        let table = entity.logical_name.as_str();

        match self.store.table_exists(table).await {
            Ok(true) => {
                report.record(ItemKind::Table, table, Outcome::Skipped);
                return TableState::Existing;
            }
            Ok(false) => {}
            Err(err) => {
                report.record(ItemKind::Table, table, Outcome::failed(&err));
                return TableState::Unavailable;
            }
        }

        let primary = entity.creation_primary_attribute();
        if let Err(err) = self.store.create_table(entity, &primary).await {
            report.record(ItemKind::Table, table, Outcome::failed(&err));
            return TableState::Unavailable;
        }

        match wait_until_visible(self.store, table, &self.settings.provision).await {
            Ok(()) => {
                report.record(ItemKind::Table, table, Outcome::Created);
                TableState::Created
            }
            Err(err) => {
                report.record(ItemKind::Table, table, Outcome::failed(&err));
                TableState::Unavailable
            }
        }
    }

    /// Plain columns; a freshly created table already carries its primary.
    async fn ensure_columns(&self, entity: &Entity, fresh: bool, report: &mut ProvisionReport) {
        let table = entity.logical_name.as_str();

        for attr in entity.plain_attributes() {
            if fresh && attr.is_primary_name {
                continue;
            }
            let name = format!("{}.{}", table, attr.logical_name);
            let outcome = match self.store.column_exists(table, &attr.logical_name).await {
                Ok(true) => Outcome::Skipped,
                Ok(false) => match self.store.create_column(table, attr).await {
                    Ok(()) => Outcome::Created,
                    Err(err) => Outcome::failed(&err),
                },
                Err(err) => Outcome::failed(&err),
            };
            report.record(ItemKind::Column, name, outcome);
        }
    }

    async fn ensure_relationship(
        &self,
        compiled: &CompiledSchema,
        rel: &Relationship,
        available: &HashSet<&str>,
        report: &mut ProvisionReport,
    ) {
        let name = rel.name.as_str();

        for endpoint in [&rel.referenced_table, &rel.referencing_table] {
            if !available.contains(endpoint.as_str()) {
                report.record(
                    ItemKind::Relationship,
                    name,
                    Outcome::blocked(format!("table {} is unavailable", endpoint)),
                );
                return;
            }
        }

        let Some(lookup) = compiled
            .entity(&rel.referencing_table)
            .and_then(|e| e.attribute(&rel.referencing_attribute))
        else {
            report.record(
                ItemKind::Relationship,
                name,
                Outcome::blocked(format!("lookup {} is not compiled", rel.referencing_attribute)),
            );
            return;
        };

        // The lookup column exists exactly when the relationship does.
        let outcome = match self
            .store
            .column_exists(&rel.referencing_table, &rel.referencing_attribute)
            .await
        {
            Ok(true) => Outcome::Skipped,
            Ok(false) => match self.store.create_relationship(rel, lookup).await {
                Ok(()) => Outcome::Created,
                Err(err) => Outcome::failed(&err),
            },
            Err(err) => Outcome::failed(&err),
        };
        report.record(ItemKind::Relationship, name, outcome);
    }

    async fn ensure_component(&self, table: &str) -> Outcome {
        let solution = self.settings.solution.unique_name.as_str();

        let metadata_id = match self.store.table_metadata_id(table).await {
            Ok(Some(id)) => id,
            Ok(None) => return Outcome::blocked(format!("table {} has no metadata id", table)),
            Err(err) => return Outcome::failed(&err),
        };

        match self.store.solution_contains(solution, &metadata_id).await {
            Ok(true) => Outcome::Skipped,
            Ok(false) => match self.store.add_solution_component(solution, &metadata_id).await {
                Ok(()) => Outcome::Created,
                Err(err) => Outcome::failed(&err),
            },
            Err(err) => Outcome::failed(&err),
        }
    }
}

/// Provision against an empty in-memory store carrying the configured
/// publisher, to preview what a first run would create.
pub async fn dry_run(compiled: &CompiledSchema, settings: &Settings) -> Result<ProvisionReport, PreconditionError> {
    let store = InMemoryStore::new().with_publisher(settings.publisher.prefix.clone(), "dry-run");
    let mut dry_settings = settings.clone();
    dry_settings.provision.visibility_interval_ms = 0;
    Provisioner::new(&store, &dry_settings).run(compiled).await
}
