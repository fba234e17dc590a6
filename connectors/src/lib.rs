//! connkit connectors
//!
//! Discover, extract and load against CSV files on disk or the Iterable
//! user API. Every backend implements [`Connector`]; [`ConnectorEngine`]
//! picks one from a [`connkit_config::ConnectorConfig`] and runs the verbs.

pub mod csv_file;
pub mod engine;
pub mod error;
pub mod iterable;
pub mod records;
pub mod schema;
pub mod traits;
pub mod types;

pub use csv_file::{CsvConnector, CsvLocation};
pub use engine::ConnectorEngine;
pub use error::ConnectorError;
pub use iterable::IterableConnector;
pub use records::{read_jsonl, JsonlBatch, MalformedLine};
pub use traits::Connector;
pub use types::{select_fields, ConnectorType, RecordStream};
