//! Connector configuration.
//!
//! A config document is JSON with comments allowed. It is parsed and
//! validated once at startup and then handed to the engine as an
//! immutable value.
//!
//! # Example
//!
//! ```jsonc
//! {
//!   // a single CSV file or a directory of them
//!   "type": "csv",
//!   "csv_path": "data/contacts.csv"
//! }
//! ```

pub mod error;

use json_comments::StripComments;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use validator::Validate;

pub use error::ConfigError;

pub const DEFAULT_ITERABLE_BASE_URL: &str = "https://api.iterable.com";

/// Backend selection plus its connection parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectorConfig {
    Csv(CsvConfig),
    Iterable(IterableConfig),
}

/// How much of a CSV file discover looks at when typing columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaInference {
    /// Header row only, every column is a string
    Headers,
    /// Header row plus the first data row
    #[default]
    FirstRow,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct CsvConfig {
    /// Path to a single `.csv` file or a directory of them
    #[validate(length(min = 1, message = "csv_path must not be empty"))]
    pub csv_path: String,

    #[serde(default)]
    pub schema_inference: SchemaInference,
}

impl CsvConfig {
    pub fn new(csv_path: impl Into<String>) -> Self {
        Self {
            csv_path: csv_path.into(),
            schema_inference: SchemaInference::default(),
        }
    }

    pub fn with_inference(mut self, inference: SchemaInference) -> Self {
        self.schema_inference = inference;
        self
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.csv_path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    #[default]
    UserIdBased,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
}

#[derive(Clone, PartialEq, Deserialize, Validate)]
pub struct IterableConfig {
    #[validate(length(min = 1, message = "api_key must not be empty"))]
    pub api_key: String,

    pub project_type: ProjectType,

    pub region: Region,

    #[serde(default = "default_iterable_base_url")]
    #[validate(url)]
    pub base_url: String,
}

fn default_iterable_base_url() -> String {
    DEFAULT_ITERABLE_BASE_URL.to_string()
}

impl IterableConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_type: ProjectType::default(),
            region: Region::default(),
            base_url: default_iterable_base_url(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// Keeps the API key out of logs
impl fmt::Debug for IterableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterableConfig")
            .field("api_key", &"<redacted>")
            .field("project_type", &self.project_type)
            .field("region", &self.region)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ConnectorConfig {
    /// Load and validate a config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_reader(file)?;
        debug!(path = %path.display(), connector = config.type_name(), "Loaded connector config");
        Ok(config)
    }

    /// Parse and validate a config document from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let mut document: Value = serde_json::from_reader(StripComments::new(reader))?;

        // Single-backend configs predate the `type` tag
        if let Value::Object(ref mut map) = document {
            if !map.contains_key("type") && map.contains_key("csv_path") {
                map.insert("type".to_string(), Value::String("csv".to_string()));
            }
        }

        let config: ConnectorConfig = serde_json::from_value(document)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ConnectorConfig::Csv(csv) => csv.validate()?,
            ConnectorConfig::Iterable(iterable) => iterable.validate()?,
        }
        Ok(())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ConnectorConfig::Csv(_) => "csv",
            ConnectorConfig::Iterable(_) => "iterable",
        }
    }
}

impl FromStr for ConnectorConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_csv_config_with_comments() {
        let config: ConnectorConfig = r#"
            {
                // point at a directory of exports
                "type": "csv",
                /* block comments work too */
                "csv_path": "exports/"
            }
        "#
        .parse()
        .unwrap();

        assert_eq!(config, ConnectorConfig::Csv(CsvConfig::new("exports/")));
    }

    #[test]
    fn test_untagged_csv_config_is_accepted() {
        let config: ConnectorConfig = r#"{ "csv_path": "a.csv", "schema_inference": "headers" }"#
            .parse()
            .unwrap();

        match config {
            ConnectorConfig::Csv(csv) => {
                assert_eq!(csv.csv_path, "a.csv");
                assert_eq!(csv.schema_inference, SchemaInference::Headers);
            }
            other => panic!("expected csv config, got {:?}", other),
        }
    }

    #[test]
    fn test_iterable_config_defaults_base_url() {
        let config: ConnectorConfig = r#"{
            "type": "iterable",
            "api_key": "secret",
            "project_type": "user_id_based",
            "region": "us"
        }"#
        .parse()
        .unwrap();

        match config {
            ConnectorConfig::Iterable(iterable) => {
                assert_eq!(iterable.base_url, DEFAULT_ITERABLE_BASE_URL);
                assert!(!format!("{:?}", iterable).contains("secret"));
            }
            other => panic!("expected iterable config, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_empty_values() {
        let err = r#"{ "type": "csv", "csv_path": "" }"#
            .parse::<ConnectorConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = r#"{ "type": "iterable", "api_key": "", "project_type": "user_id_based", "region": "us" }"#
            .parse::<ConnectorConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_unsupported_region_is_parse_error() {
        let err = r#"{ "type": "iterable", "api_key": "k", "project_type": "user_id_based", "region": "eu" }"#
            .parse::<ConnectorConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{ \"csv_path\": \"data\" }} // trailing comment").unwrap();

        let config = ConnectorConfig::from_path(file.path()).unwrap();
        assert_eq!(config.type_name(), "csv");

        let missing = ConnectorConfig::from_path("/definitely/not/here.jsonc").unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
