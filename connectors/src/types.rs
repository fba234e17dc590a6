use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use connkit_models::Record;

use super::error::ConnectorError;

/// Backend kind a connector talks to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    Csv,
    Iterable,
}

impl ConnectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::Csv => "csv",
            ConnectorType::Iterable => "iterable",
        }
    }
}

/// Lazy, single-pass sequence of extracted records.
///
/// Dropping the stream releases the underlying file or response.
pub type RecordStream = BoxStream<'static, Result<Record, ConnectorError>>;

/// Restricts a record to the requested fields, in request order.
///
/// `None` or an empty list keeps the record as is. Requested fields the
/// record does not have are skipped.
pub fn select_fields(record: Record, fields: Option<&[String]>) -> Record {
    match fields {
        Some(fields) if !fields.is_empty() => {
            let mut record = record;
            let mut selected = Record::new();
            for field in fields {
                if let Some(value) = record.remove(field) {
                    selected.insert(field.clone(), value);
                }
            }
            selected
        }
        _ => record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contact() -> Record {
        json!({ "id": "1", "name": "Ada", "email": "ada@example.com" })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_select_fields_follows_request_order() {
        let fields = vec!["email".to_string(), "id".to_string()];
        let record = select_fields(contact(), Some(&fields));

        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["email", "id"]);
    }

    #[test]
    fn test_select_fields_drops_unknown_fields() {
        let fields = vec!["id".to_string(), "phone".to_string()];
        let record = select_fields(contact(), Some(&fields));

        assert_eq!(record.len(), 1);
        assert_eq!(record["id"], "1");
    }

    #[test]
    fn test_select_fields_without_filter() {
        assert_eq!(select_fields(contact(), None).len(), 3);
        assert_eq!(select_fields(contact(), Some(&[])).len(), 3);
    }
}
