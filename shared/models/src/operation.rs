use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Write mode requested by a load
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Upsert,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Upsert => "upsert",
            Operation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown operation: {0}")]
pub struct ParseOperationError(pub String);

impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "upsert" => Ok(Operation::Upsert),
            "delete" => Ok(Operation::Delete),
            _ => Err(ParseOperationError(s.to_string())),
        }
    }
}

/// Summary of a completed load
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadResult {
    pub success: bool,
    pub message: String,
    /// Records written to the backend
    pub applied: usize,
    /// Input lines skipped as malformed
    pub skipped: usize,
}

impl LoadResult {
    pub fn applied(applied: usize, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            applied,
            skipped: 0,
        }
    }

    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operation() {
        assert_eq!("upsert".parse::<Operation>().unwrap(), Operation::Upsert);
        assert_eq!(" Create ".parse::<Operation>().unwrap(), Operation::Create);
        assert_eq!("delete".parse::<Operation>().unwrap(), Operation::Delete);
        assert_eq!(
            "merge".parse::<Operation>().unwrap_err(),
            ParseOperationError("merge".to_string())
        );
    }

    #[test]
    fn test_load_result_json_shape() {
        let result = LoadResult::applied(2, "done").with_skipped(1);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "done");
        assert_eq!(value["applied"], 2);
        assert_eq!(value["skipped"], 1);
    }
}
