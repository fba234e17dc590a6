use connkit_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Backend write failed: {0}")]
    BackendWrite(String),
}

impl ConnectorError {
    /// Stable tag printed on the error channel
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectorError::Configuration(_) => "configuration_error",
            ConnectorError::UnknownCollection(_) => "unknown_collection_error",
            ConnectorError::InvalidOperation(_) => "invalid_operation_error",
            ConnectorError::ResourceUnavailable(_) => "resource_unavailable_error",
            ConnectorError::BackendWrite(_) => "backend_write_error",
        }
    }
}

impl From<ConfigError> for ConnectorError {
    fn from(err: ConfigError) -> Self {
        ConnectorError::Configuration(err.to_string())
    }
}
