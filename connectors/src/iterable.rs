use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use connkit_config::IterableConfig;
use connkit_models::{
    Catalog, Collection, FieldType, LoadResult, Operation, Record, Schema, SchemaRole,
};

use super::error::ConnectorError;
use super::traits::Connector;
use super::types::{select_fields, ConnectorType, RecordStream};

const API_KEY_HEADER: &str = "Api-Key";
const USERS_COLLECTION: &str = "users";
const ITERABLE_OPERATIONS: &[Operation] = &[Operation::Upsert];

/// Connector for the Iterable user API.
///
/// Every verb is a single request: extract does one export call with no
/// pagination, load sends the whole batch in one bulk update.
pub struct IterableConnector {
    name: String,
    client: Client,
    api_key: String,
    base_url: String,
}

impl IterableConnector {
    pub fn new(config: &IterableConfig) -> Result<Self, ConnectorError> {
        let client = Client::builder().build().map_err(|e| {
            ConnectorError::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            name: "Iterable".to_string(),
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_collection(&self, collection_id: &str) -> Result<(), ConnectorError> {
        if collection_id == USERS_COLLECTION {
            Ok(())
        } else {
            Err(ConnectorError::UnknownCollection(collection_id.to_string()))
        }
    }

    fn user_schema() -> Schema {
        Schema::from_fields([
            ("userId", FieldType::String),
            ("email", FieldType::String),
            ("dataFields", FieldType::Object),
        ])
    }
}

#[async_trait]
impl Connector for IterableConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> ConnectorType {
        ConnectorType::Iterable
    }

    fn supported_operations(&self) -> &'static [Operation] {
        ITERABLE_OPERATIONS
    }

    async fn discover(&self) -> Result<Catalog, ConnectorError> {
        let schema = Self::user_schema();
        Ok(Catalog::new(vec![Collection::new(USERS_COLLECTION, "Users")
            .with_roles(&[SchemaRole::Row, SchemaRole::Upsert], &schema)]))
    }

    async fn extract(
        &self,
        collection_id: &str,
        fields: Option<&[String]>,
    ) -> Result<RecordStream, ConnectorError> {
        self.check_collection(collection_id)?;

        let url = self.endpoint("/api/export/data.json");
        debug!(url = %url, "Requesting Iterable user export");

        let response = self
            .client
            .get(&url)
            .query(&[("dataTypeName", "user"), ("range", "All")])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| ConnectorError::ResourceUnavailable(format!("Export request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::ResourceUnavailable(format!(
                "Export returned {}: {}",
                status, body
            )));
        }

        let body = response.text().await.map_err(|e| {
            ConnectorError::ResourceUnavailable(format!("Failed to read export body: {}", e))
        })?;
        let records = parse_export(&body)?;
        info!("📥 Fetched {} users from Iterable", records.len());

        let fields = fields.map(<[String]>::to_vec);
        let records = records
            .into_iter()
            .map(move |record| Ok(select_fields(record, fields.as_deref())));

        Ok(stream::iter(records).boxed())
    }

    async fn load(
        &self,
        collection_id: &str,
        operation: Operation,
        records: Vec<Record>,
    ) -> Result<LoadResult, ConnectorError> {
        self.check_operation(operation)?;
        self.check_collection(collection_id)?;

        if records.is_empty() {
            return Ok(LoadResult::applied(0, "No records to load into users"));
        }

        let count = records.len();
        let url = self.endpoint("/api/users/bulkUpdate");
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&bulk_update_body(records))
            .send()
            .await
            .map_err(|e| ConnectorError::BackendWrite(format!("Bulk update request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::BackendWrite(format!(
                "Bulk update returned {}: {}",
                status, body
            )));
        }

        let body = response.text().await.map_err(|e| {
            ConnectorError::BackendWrite(format!("Failed to read bulk update response: {}", e))
        })?;

        let summary: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let failed = summary["failCount"].as_u64().unwrap_or(0) as usize;
        let applied = summary["successCount"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(count.saturating_sub(failed));

        if failed > 0 {
            warn!(failed, "Iterable rejected some users in bulk update");
        }
        info!(applied, "✅ Bulk updated Iterable users");

        Ok(LoadResult {
            success: failed == 0,
            message: format!(
                "Loaded {} of {} records into {} ({} failed)",
                applied, count, collection_id, failed
            ),
            applied,
            skipped: 0,
        })
    }
}

/// Builds the bulk update payload, flagging each user for id matching and nested merges
fn bulk_update_body(records: Vec<Record>) -> Value {
    let users: Vec<Value> = records
        .into_iter()
        .map(|mut record| {
            record.insert("preferUserId".to_string(), Value::Bool(true));
            record.insert("mergeNestedObjects".to_string(), Value::Bool(true));
            Value::Object(record)
        })
        .collect();

    json!({ "users": users })
}

/// Parses the newline-delimited export body
fn parse_export(body: &str) -> Result<Vec<Record>, ConnectorError> {
    body.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| match serde_json::from_str::<Value>(line.trim()) {
            Ok(Value::Object(record)) => Ok(record),
            _ => Err(ConnectorError::ResourceUnavailable(format!(
                "Malformed export line {}",
                index + 1
            ))),
        })
        .collect()
}
