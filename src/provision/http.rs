//! Metadata store backed by the Dataverse Web API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use super::credentials::CredentialProvider;
use super::error::{PreconditionError, StoreError, StoreResult};
use super::payload;
use super::store::MetadataStore;
use crate::compile::{Entity, Relationship, ResolvedAttribute};
use crate::config::{EnvironmentSettings, SolutionSettings};

/// Longest error body echoed back when the response carries no message.
const MAX_ERROR_BODY: usize = 300;

/// Quote a value for an OData string literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Extract `error.message` from an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect())
}

async fn check(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Remote {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// First record of an OData collection response.
fn first_record(body: &Value) -> Option<&Value> {
    body["value"].as_array().and_then(|records| records.first())
}

fn string_field(record: &Value, field: &str) -> StoreResult<String> {
    record[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| StoreError::Decode(format!("response has no '{}' field", field)))
}

pub struct WebApiStore {
    client: Client,
    api_base: String,
    token: String,
    language: u32,
}

impl WebApiStore {
    /// Build a client for the configured environment.
    ///
    /// Fails before any request is sent when the URL or credential is missing.
    pub fn connect(
        environment: &EnvironmentSettings,
        credentials: &dyn CredentialProvider,
        language: u32,
    ) -> Result<Self, PreconditionError> {
        let api_base = environment.api_base()?;
        let token = credentials.token()?;

        let mut headers = HeaderMap::new();
        headers.insert("OData-MaxVersion", HeaderValue::from_static("4.0"));
        headers.insert("OData-Version", HeaderValue::from_static("4.0"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(environment.request_timeout())
            .build()
            .map_err(|e| PreconditionError::Configuration(e.to_string()))?;

        tracing::debug!(api_base = %api_base, "connected web api store");

        Ok(Self {
            client,
            api_base,
            token,
            language,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// GET a resource; a 404 yields `None`.
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> StoreResult<Option<Value>> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = check(response).await?.json::<Value>().await?;
        Ok(Some(body))
    }

    async fn post(&self, path: &str, body: &Value) -> StoreResult<()> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn solution_id(&self, unique_name: &str) -> StoreResult<Option<String>> {
        let filter = format!("uniquename eq {}", quote(unique_name));
        let body = self
            .get("solutions", &[("$filter", filter.as_str()), ("$select", "solutionid")])
            .await?;
        match body.as_ref().and_then(first_record) {
            Some(record) => Ok(Some(string_field(record, "solutionid")?)),
            None => Ok(None),
        }
    }

    fn entity_path(table: &str) -> String {
        format!("EntityDefinitions(LogicalName={})", quote(table))
    }
}

#[async_trait]
impl MetadataStore for WebApiStore {
    async fn who_am_i(&self) -> StoreResult<String> {
        let body = self
            .get("WhoAmI", &[])
            .await?
            .ok_or_else(|| StoreError::Remote {
                status: 404,
                message: "WhoAmI not found".to_string(),
            })?;
        string_field(&body, "UserId")
    }

    async fn find_publisher(&self, prefix: &str) -> StoreResult<Option<String>> {
        let filter = format!("customizationprefix eq {}", quote(prefix));
        let body = self
            .get("publishers", &[("$filter", filter.as_str()), ("$select", "publisherid")])
            .await?;
        match body.as_ref().and_then(first_record) {
            Some(record) => Ok(Some(string_field(record, "publisherid")?)),
            None => Ok(None),
        }
    }

    async fn solution_exists(&self, unique_name: &str) -> StoreResult<bool> {
        Ok(self.solution_id(unique_name).await?.is_some())
    }

    async fn create_solution(&self, solution: &SolutionSettings, publisher_id: &str) -> StoreResult<()> {
        self.post("solutions", &payload::solution_body(solution, publisher_id))
            .await
    }

    async fn table_exists(&self, table: &str) -> StoreResult<bool> {
        let body = self
            .get(&Self::entity_path(table), &[("$select", "LogicalName")])
            .await?;
        Ok(body.is_some())
    }

    async fn column_exists(&self, table: &str, column: &str) -> StoreResult<bool> {
        let path = format!(
            "{}/Attributes(LogicalName={})",
            Self::entity_path(table),
            quote(column)
        );
        let body = self.get(&path, &[("$select", "LogicalName")]).await?;
        Ok(body.is_some())
    }

    async fn create_table(&self, entity: &Entity, primary: &ResolvedAttribute) -> StoreResult<()> {
        self.post(
            "EntityDefinitions",
            &payload::table_body(entity, primary, self.language),
        )
        .await
    }

    async fn create_column(&self, table: &str, attribute: &ResolvedAttribute) -> StoreResult<()> {
        let path = format!("{}/Attributes", Self::entity_path(table));
        self.post(&path, &payload::attribute_body(attribute, self.language))
            .await
    }

    async fn create_relationship(
        &self,
        relationship: &Relationship,
        lookup: &ResolvedAttribute,
    ) -> StoreResult<()> {
        self.post(
            "RelationshipDefinitions",
            &payload::relationship_body(relationship, lookup, self.language),
        )
        .await
    }

    async fn table_metadata_id(&self, table: &str) -> StoreResult<Option<String>> {
        let body = self
            .get(&Self::entity_path(table), &[("$select", "MetadataId")])
            .await?;
        match body {
            Some(record) => Ok(Some(string_field(&record, "MetadataId")?)),
            None => Ok(None),
        }
    }

    async fn solution_contains(&self, solution: &str, metadata_id: &str) -> StoreResult<bool> {
        let Some(solution_id) = self.solution_id(solution).await? else {
            return Ok(false);
        };
        let filter = format!("_solutionid_value eq {} and objectid eq {}", solution_id, metadata_id);
        let body = self
            .get(
                "solutioncomponents",
                &[("$filter", filter.as_str()), ("$select", "solutioncomponentid")],
            )
            .await?;
        Ok(body.as_ref().and_then(first_record).is_some())
    }

    async fn add_solution_component(&self, solution: &str, metadata_id: &str) -> StoreResult<()> {
        self.post(
            "AddSolutionComponent",
            &payload::add_component_body(solution, metadata_id),
        )
        .await
    }
}
