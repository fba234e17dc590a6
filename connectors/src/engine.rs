use std::io::BufRead;

use tracing::{info, warn};

use connkit_config::ConnectorConfig;
use connkit_models::{Catalog, LoadResult, Operation};
use connkit_observability::log_timed;

use super::csv_file::CsvConnector;
use super::error::ConnectorError;
use super::iterable::IterableConnector;
use super::records::read_jsonl;
use super::traits::Connector;
use super::types::RecordStream;

/// Runs the discover/extract/load verbs against the configured backend.
///
/// The backend is picked once, from the config, when the engine is built.
pub struct ConnectorEngine {
    connector: Box<dyn Connector>,
}

impl ConnectorEngine {
    /// Build the engine for the backend a config declares
    pub fn from_config(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let connector: Box<dyn Connector> = match config {
            ConnectorConfig::Csv(csv) => Box::new(CsvConnector::new(csv)?),
            ConnectorConfig::Iterable(iterable) => Box::new(IterableConnector::new(iterable)?),
        };

        info!("🔌 Using {} connector", connector.name());
        Ok(Self::with_connector(connector))
    }

    pub fn with_connector(connector: Box<dyn Connector>) -> Self {
        Self { connector }
    }

    pub async fn discover(&self) -> Result<Catalog, ConnectorError> {
        log_timed!("discover", self.connector.discover().await)
    }

    pub async fn extract(
        &self,
        collection_id: &str,
        fields: Option<&[String]>,
    ) -> Result<RecordStream, ConnectorError> {
        log_timed!("extract", self.connector.extract(collection_id, fields).await)
    }

    /// Load line-delimited JSON from `input` into a collection.
    ///
    /// The operation is checked before any input is read. The whole input
    /// is then read before the backend writes anything, and malformed lines
    /// are skipped and counted in the result.
    pub async fn load<R: BufRead>(
        &self,
        collection_id: &str,
        operation: &str,
        input: R,
    ) -> Result<LoadResult, ConnectorError> {
        let operation: Operation = operation
            .parse()
            .map_err(|e: connkit_models::ParseOperationError| {
                ConnectorError::InvalidOperation(e.to_string())
            })?;
        self.connector.check_operation(operation)?;

        let batch = read_jsonl(input)?;
        let skipped = batch.skipped.len();
        if batch.records.is_empty() {
            warn!("No valid records found in input");
        }

        let result = log_timed!(
            "load",
            self.connector
                .load(collection_id, operation, batch.records)
                .await
        )?;

        Ok(result.with_skipped(skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConnectorType;
    use async_trait::async_trait;
    use connkit_config::CsvConfig;
    use connkit_models::Record;
    use futures::stream::{self, StreamExt};
    use std::io::{BufReader, Read};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    type LoadCalls = Arc<Mutex<Vec<(String, Operation, Vec<Record>)>>>;

    /// Records every load call instead of writing anywhere
    struct RecordingConnector {
        loads: LoadCalls,
    }

    #[async_trait]
    impl Connector for RecordingConnector {
        fn name(&self) -> &str {
            "recording"
        }

        fn connector_type(&self) -> ConnectorType {
            ConnectorType::Csv
        }

        fn supported_operations(&self) -> &'static [Operation] {
            &[Operation::Create]
        }

        async fn discover(&self) -> Result<Catalog, ConnectorError> {
            Ok(Catalog::default())
        }

        async fn extract(
            &self,
            _collection_id: &str,
            _fields: Option<&[String]>,
        ) -> Result<RecordStream, ConnectorError> {
            Ok(stream::empty().boxed())
        }

        async fn load(
            &self,
            collection_id: &str,
            operation: Operation,
            records: Vec<Record>,
        ) -> Result<LoadResult, ConnectorError> {
            let applied = records.len();
            self.loads
                .lock()
                .unwrap()
                .push((collection_id.to_string(), operation, records));
            Ok(LoadResult::applied(applied, "recorded"))
        }
    }

    /// Fails the test if anything tries to read it
    struct UntouchedInput;

    impl Read for UntouchedInput {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            panic!("load input must not be read");
        }
    }

    fn recording_engine() -> (ConnectorEngine, LoadCalls) {
        let loads = LoadCalls::default();
        let connector = RecordingConnector {
            loads: Arc::clone(&loads),
        };
        (ConnectorEngine::with_connector(Box::new(connector)), loads)
    }

    fn csv_engine(dir: &TempDir) -> ConnectorEngine {
        let config = ConnectorConfig::Csv(CsvConfig::new(dir.path().to_string_lossy()));
        ConnectorEngine::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_load_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts.csv");
        std::fs::write(&path, "id\n").unwrap();

        let input = "{\"id\":\"1\"}\nnotjson\n{\"id\":\"2\"}\n";
        let result = csv_engine(&dir)
            .load("contacts", "upsert", input.as_bytes())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.applied, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\n1\n2\n");
    }

    #[tokio::test]
    async fn test_load_passes_records_in_input_order() {
        let (engine, loads) = recording_engine();
        let input = "{\"n\":3}\n{\"n\":1}\n{\"n\":2}\n";

        engine.load("numbers", "create", input.as_bytes()).await.unwrap();

        let loads = loads.lock().unwrap();
        assert_eq!(loads.len(), 1);
        let (collection, operation, records) = &loads[0];
        assert_eq!(collection, "numbers");
        assert_eq!(*operation, Operation::Create);
        let order: Vec<i64> = records.iter().map(|r| r["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_invalid_operation_is_rejected_before_reading_input() {
        let (engine, loads) = recording_engine();

        for operation in ["delete", "merge"] {
            let err = engine
                .load("numbers", operation, BufReader::new(UntouchedInput))
                .await
                .unwrap_err();
            assert!(matches!(err, ConnectorError::InvalidOperation(_)));
        }
        assert!(loads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_on_csv_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts.csv");
        std::fs::write(&path, "id,name\n1,Ada\n").unwrap();

        let err = csv_engine(&dir)
            .load("contacts", "delete", "{\"id\":\"2\"}\n".as_bytes())
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectorError::InvalidOperation(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id,name\n1,Ada\n");
    }

    #[tokio::test]
    async fn test_empty_input_still_resolves_collection() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("contacts.csv"), "id\n").unwrap();
        let engine = csv_engine(&dir);

        let result = engine.load("contacts", "create", "bad\n".as_bytes()).await.unwrap();
        assert_eq!(result.applied, 0);
        assert_eq!(result.skipped, 1);

        let err = engine.load("missing", "create", "".as_bytes()).await.unwrap_err();
        assert!(matches!(err, ConnectorError::UnknownCollection(_)));
    }

    #[tokio::test]
    async fn test_from_config_rejects_bad_location() {
        let dir = TempDir::new().unwrap();
        let config = ConnectorConfig::Csv(CsvConfig::new(
            dir.path().join("nope.csv").to_string_lossy(),
        ));

        let err = ConnectorEngine::from_config(&config).err().unwrap();
        assert_eq!(err.kind(), "configuration_error");
    }
}
