//! In-process metadata store.
//!
//! Backs `--dry-run` and the provisioning tests. Behaves like the live
//! store where the provisioner can observe it: lookups are created by
//! relationships, creates against missing tables fail with 404, and a
//! freshly created table can be made to stay invisible for a number of
//! polls.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::error::{StoreError, StoreResult};
use super::store::MetadataStore;
use crate::compile::{Entity, Relationship, ResolvedAttribute};
use crate::config::SolutionSettings;

#[derive(Debug, Default)]
struct TableRecord {
    metadata_id: String,
    columns: BTreeSet<String>,
    /// Existence checks left before the table shows up.
    hidden_polls: u32,
}

#[derive(Debug, Default)]
struct State {
    publishers: HashMap<String, String>,
    solutions: BTreeSet<String>,
    tables: BTreeMap<String, TableRecord>,
    relationships: BTreeSet<String>,
    components: BTreeSet<(String, String)>,
    rejections: HashMap<String, StoreError>,
    creates: Vec<String>,
    next_id: u64,
}

impl State {
    fn metadata_id(&mut self) -> String {
        self.next_id += 1;
        format!("00000000-0000-0000-0000-{:012}", self.next_id)
    }

    fn rejected(&self, name: &str) -> StoreResult<()> {
        match self.rejections.get(name) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn table_mut(&mut self, table: &str) -> StoreResult<&mut TableRecord> {
        self.tables.get_mut(table).ok_or_else(|| StoreError::Remote {
            status: 404,
            message: format!("Could not find entity with name '{}'", table),
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    offline: bool,
    visibility_delay: u32,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_publisher(mut self, prefix: impl Into<String>, id: impl Into<String>) -> Self {
        self.state.get_mut().publishers.insert(prefix.into(), id.into());
        self
    }

    pub fn with_solution(mut self, unique_name: impl Into<String>) -> Self {
        self.state.get_mut().solutions.insert(unique_name.into());
        self
    }

    /// Seed an existing table with the given columns.
    pub fn with_table<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let state = self.state.get_mut();
        let metadata_id = state.metadata_id();
        state.tables.insert(
            table.into(),
            TableRecord {
                metadata_id,
                columns: columns.into_iter().map(Into::into).collect(),
                hidden_polls: 0,
            },
        );
        self
    }

    /// Fail every create of the named table, column or relationship.
    pub fn reject_create(mut self, name: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        self.state.get_mut().rejections.insert(
            name.into(),
            StoreError::Remote {
                status,
                message: message.into(),
            },
        );
        self
    }

    /// Fail every call with a transport error.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Keep new tables invisible to existence checks for `polls` checks.
    pub fn with_visibility_delay(mut self, polls: u32) -> Self {
        self.visibility_delay = polls;
        self
    }

    /// Successful creates, in call order, as `kind:name`.
    pub async fn create_calls(&self) -> Vec<String> {
        self.state.lock().await.creates.clone()
    }

    pub async fn tables(&self) -> Vec<String> {
        self.state.lock().await.tables.keys().cloned().collect()
    }

    pub async fn columns(&self, table: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .tables
            .get(table)
            .map(|t| t.columns.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn relationships(&self) -> Vec<String> {
        self.state.lock().await.relationships.iter().cloned().collect()
    }

    /// Tables that are components of `solution`.
    pub async fn solution_tables(&self, solution: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .tables
            .iter()
            .filter(|(_, t)| state.components.contains(&(solution.to_string(), t.metadata_id.clone())))
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn online(&self) -> StoreResult<()> {
        if self.offline {
            return Err(StoreError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn who_am_i(&self) -> StoreResult<String> {
        self.online()?;
        Ok("00000000-0000-0000-0000-000000000000".to_string())
    }

    async fn find_publisher(&self, prefix: &str) -> StoreResult<Option<String>> {
        self.online()?;
        Ok(self.state.lock().await.publishers.get(prefix).cloned())
    }

    async fn solution_exists(&self, unique_name: &str) -> StoreResult<bool> {
        self.online()?;
        Ok(self.state.lock().await.solutions.contains(unique_name))
    }

    async fn create_solution(&self, solution: &SolutionSettings, _publisher_id: &str) -> StoreResult<()> {
        self.online()?;
        let mut state = self.state.lock().await;
        state.rejected(&solution.unique_name)?;
        state.solutions.insert(solution.unique_name.clone());
        state.creates.push(format!("solution:{}", solution.unique_name));
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> StoreResult<bool> {
        self.online()?;
        let mut state = self.state.lock().await;
        match state.tables.get_mut(table) {
            Some(record) if record.hidden_polls > 0 => {
                record.hidden_polls -= 1;
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn column_exists(&self, table: &str, column: &str) -> StoreResult<bool> {
        self.online()?;
        let state = self.state.lock().await;
        Ok(state
            .tables
            .get(table)
            .is_some_and(|t| t.columns.contains(column)))
    }

    async fn create_table(&self, entity: &Entity, primary: &ResolvedAttribute) -> StoreResult<()> {
        self.online()?;
        let mut state = self.state.lock().await;
        state.rejected(&entity.logical_name)?;
        if state.tables.contains_key(&entity.logical_name) {
            return Err(StoreError::Remote {
                status: 400,
                message: format!("An entity with the name {} already exists", entity.logical_name),
            });
        }
        let metadata_id = state.metadata_id();
        state.tables.insert(
            entity.logical_name.clone(),
            TableRecord {
                metadata_id,
                columns: BTreeSet::from([primary.logical_name.clone()]),
                hidden_polls: self.visibility_delay,
            },
        );
        state.creates.push(format!("table:{}", entity.logical_name));
        Ok(())
    }

    async fn create_column(&self, table: &str, attribute: &ResolvedAttribute) -> StoreResult<()> {
        self.online()?;
        let mut state = self.state.lock().await;
        state.rejected(&attribute.logical_name)?;
        let record = state.table_mut(table)?;
        if !record.columns.insert(attribute.logical_name.clone()) {
            return Err(StoreError::Remote {
                status: 400,
                message: format!("Attribute {} already exists", attribute.logical_name),
            });
        }
        state
            .creates
            .push(format!("column:{}.{}", table, attribute.logical_name));
        Ok(())
    }

    async fn create_relationship(
        &self,
        relationship: &Relationship,
        lookup: &ResolvedAttribute,
    ) -> StoreResult<()> {
        self.online()?;
        let mut state = self.state.lock().await;
        state.rejected(&relationship.name)?;
        state.table_mut(&relationship.referenced_table)?;
        let record = state.table_mut(&relationship.referencing_table)?;
        record.columns.insert(lookup.logical_name.clone());
        state.relationships.insert(relationship.name.clone());
        state.creates.push(format!("relationship:{}", relationship.name));
        Ok(())
    }

    async fn table_metadata_id(&self, table: &str) -> StoreResult<Option<String>> {
        self.online()?;
        let state = self.state.lock().await;
        Ok(state.tables.get(table).map(|t| t.metadata_id.clone()))
    }

    async fn solution_contains(&self, solution: &str, metadata_id: &str) -> StoreResult<bool> {
        self.online()?;
        let state = self.state.lock().await;
        Ok(state
            .components
            .contains(&(solution.to_string(), metadata_id.to_string())))
    }

    async fn add_solution_component(&self, solution: &str, metadata_id: &str) -> StoreResult<()> {
        self.online()?;
        let mut state = self.state.lock().await;
        if !state.solutions.contains(solution) {
            return Err(StoreError::Remote {
                status: 404,
                message: format!("Solution {} not found", solution),
            });
        }
        state
            .components
            .insert((solution.to_string(), metadata_id.to_string()));
        state.creates.push(format!("component:{}", metadata_id));
        Ok(())
    }
}
