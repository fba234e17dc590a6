//! Shallow schema inference for CSV resources.
//!
//! Only the header row and, when asked, the first data row are read. Mixed
//! columns are typed by whatever that single sample looks like.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use connkit_config::SchemaInference;
use connkit_models::{FieldType, Schema};

use super::error::ConnectorError;

/// Infers the schema of a CSV file on disk
pub fn infer_csv_schema(path: &Path, inference: SchemaInference) -> Result<Schema, ConnectorError> {
    let file = std::fs::File::open(path).map_err(|e| {
        ConnectorError::ResourceUnavailable(format!("{}: {}", path.display(), e))
    })?;
    infer_from_reader(file, inference)
        .map_err(|e| ConnectorError::ResourceUnavailable(format!("{}: {}", path.display(), e)))
}

/// Infers a schema from CSV text, reading at most the header and one row
pub fn infer_from_reader<R: Read>(reader: R, inference: SchemaInference) -> Result<Schema, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let sample = match inference {
        SchemaInference::Headers => None,
        SchemaInference::FirstRow => reader.records().next().transpose()?,
    };

    Ok(schema_from_sample(&headers, sample.as_ref()))
}

/// Types every header from the matching cell of `sample`.
///
/// Without a sample, or for cells past the end of a short row, the field
/// stays `string`.
pub fn schema_from_sample(headers: &StringRecord, sample: Option<&StringRecord>) -> Schema {
    let mut schema = Schema::new();
    for (index, name) in headers.iter().enumerate() {
        let field_type = sample
            .and_then(|row| row.get(index))
            .map(infer_field_type)
            .unwrap_or(FieldType::String);
        schema.insert(name, field_type);
    }
    schema
}

/// Classifies one sampled cell
pub fn infer_field_type(value: &str) -> FieldType {
    let value = value.trim();
    if value.is_empty() {
        return FieldType::String;
    }
    if value.parse::<i64>().is_ok() {
        return FieldType::Integer;
    }
    // f64 parsing accepts "inf" and "NaN"
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => FieldType::Number,
        _ => FieldType::String,
    }
}
