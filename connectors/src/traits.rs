use async_trait::async_trait;

use connkit_models::{Catalog, LoadResult, Operation, Record};

use super::error::ConnectorError;
use super::types::{ConnectorType, RecordStream};

/// Main trait that all connectors must implement
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the name of the connector
    fn name(&self) -> &str;

    /// Returns the connector type
    fn connector_type(&self) -> ConnectorType;

    /// Write operations this backend accepts
    fn supported_operations(&self) -> &'static [Operation];

    /// Lists the collections this backend exposes, with freshly inferred schemas
    async fn discover(&self) -> Result<Catalog, ConnectorError>;

    /// Streams records out of one collection.
    ///
    /// `fields` restricts the keys of every record; unknown names are ignored.
    async fn extract(
        &self,
        collection_id: &str,
        fields: Option<&[String]>,
    ) -> Result<RecordStream, ConnectorError>;

    /// Writes records into one collection, in the given order
    async fn load(
        &self,
        collection_id: &str,
        operation: Operation,
        records: Vec<Record>,
    ) -> Result<LoadResult, ConnectorError>;

    /// Fails with `InvalidOperation` unless the backend accepts `operation`
    fn check_operation(&self, operation: Operation) -> Result<(), ConnectorError> {
        if self.supported_operations().contains(&operation) {
            return Ok(());
        }

        let legal: Vec<&str> = self
            .supported_operations()
            .iter()
            .map(Operation::as_str)
            .collect();
        Err(ConnectorError::InvalidOperation(format!(
            "{} connector does not support '{}' (supported: {})",
            self.connector_type().as_str(),
            operation,
            legal.join(", ")
        )))
    }
}
