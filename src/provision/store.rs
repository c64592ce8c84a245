//! The remote metadata store seam.

use async_trait::async_trait;

use super::error::StoreResult;
use crate::compile::{Entity, Relationship, ResolvedAttribute};
use crate::config::SolutionSettings;

/// Verbs the provisioner needs from a metadata store.
///
/// Existence checks are by logical name only; a missing record is `Ok(false)`
/// (or `Ok(None)`), never an error.
///
/// # Example
///
/// ```ignore
/// async fn ensure(store: &dyn MetadataStore, entity: &Entity) -> StoreResult<()> {
///     if !store.table_exists(&entity.logical_name).await? {
///         store.create_table(entity, &entity.creation_primary_attribute()).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Identify the calling user; used as the connectivity check.
    async fn who_am_i(&self) -> StoreResult<String>;

    /// Publisher id for a customization prefix.
    async fn find_publisher(&self, prefix: &str) -> StoreResult<Option<String>>;

    async fn solution_exists(&self, unique_name: &str) -> StoreResult<bool>;

    async fn create_solution(&self, solution: &SolutionSettings, publisher_id: &str) -> StoreResult<()>;

    async fn table_exists(&self, table: &str) -> StoreResult<bool>;

    async fn column_exists(&self, table: &str, column: &str) -> StoreResult<bool>;

    /// Create a table together with its primary name attribute.
    async fn create_table(&self, entity: &Entity, primary: &ResolvedAttribute) -> StoreResult<()>;

    async fn create_column(&self, table: &str, attribute: &ResolvedAttribute) -> StoreResult<()>;

    /// Create a one-to-many relationship; the store creates the lookup
    /// attribute on the referencing table as part of it.
    async fn create_relationship(
        &self,
        relationship: &Relationship,
        lookup: &ResolvedAttribute,
    ) -> StoreResult<()>;

    async fn table_metadata_id(&self, table: &str) -> StoreResult<Option<String>>;

    async fn solution_contains(&self, solution: &str, metadata_id: &str) -> StoreResult<bool>;

    async fn add_solution_component(&self, solution: &str, metadata_id: &str) -> StoreResult<()>;
}
