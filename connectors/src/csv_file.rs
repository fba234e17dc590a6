use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use connkit_config::{CsvConfig, SchemaInference};
use connkit_models::{Catalog, Collection, LoadResult, Operation, Record, SchemaRole};

use super::error::ConnectorError;
use super::schema::infer_csv_schema;
use super::traits::Connector;
use super::types::{select_fields, ConnectorType, RecordStream};

/// CSV files append for every write mode
const CSV_OPERATIONS: &[Operation] = &[Operation::Create, Operation::Update, Operation::Upsert];

const CSV_ROLES: &[SchemaRole] = &[
    SchemaRole::Row,
    SchemaRole::Insert,
    SchemaRole::Update,
    SchemaRole::Upsert,
];

/// Where the configured CSV data lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvLocation {
    File(PathBuf),
    Directory(PathBuf),
}

impl CsvLocation {
    /// Classifies a configured path, failing unless it is a directory or a `.csv` file
    pub fn resolve(path: &Path) -> Result<Self, ConnectorError> {
        let metadata = std::fs::metadata(path).map_err(|_| {
            ConnectorError::Configuration(format!("CSV path does not exist: {}", path.display()))
        })?;

        if metadata.is_dir() {
            Ok(CsvLocation::Directory(path.to_path_buf()))
        } else if metadata.is_file() {
            if !is_csv(path) {
                return Err(ConnectorError::Configuration(format!(
                    "CSV path must end with .csv: {}",
                    path.display()
                )));
            }
            Ok(CsvLocation::File(path.to_path_buf()))
        } else {
            Err(ConnectorError::Configuration(format!(
                "CSV path is neither a file nor a directory: {}",
                path.display()
            )))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            CsvLocation::File(path) | CsvLocation::Directory(path) => path,
        }
    }
}

/// Connector over a single CSV file or a directory of CSV files
pub struct CsvConnector {
    name: String,
    location: CsvLocation,
    inference: SchemaInference,
}

impl CsvConnector {
    pub fn new(config: &CsvConfig) -> Result<Self, ConnectorError> {
        let location = CsvLocation::resolve(config.path())?;
        debug!(location = ?location, "Resolved CSV location");

        Ok(Self {
            name: "CSV Files".to_string(),
            location,
            inference: config.schema_inference,
        })
    }

    /// Backing files keyed by collection id, in file name order
    fn collection_files(&self) -> Result<Vec<(String, PathBuf)>, ConnectorError> {
        match &self.location {
            CsvLocation::File(path) => {
                if !path.is_file() {
                    return Err(ConnectorError::Configuration(format!(
                        "CSV file no longer exists: {}",
                        path.display()
                    )));
                }
                let id = collection_id(path).ok_or_else(|| {
                    ConnectorError::Configuration(format!("Unusable file name: {}", path.display()))
                })?;
                Ok(vec![(id, path.clone())])
            }
            CsvLocation::Directory(dir) => list_csv_files(dir),
        }
    }

    fn resolve_collection(&self, collection_id: &str) -> Result<PathBuf, ConnectorError> {
        let path = match &self.location {
            // Single-file mode only knows its own stem; the file is opened later
            CsvLocation::File(path) => {
                collection_id_matches(path, collection_id).then(|| path.clone())
            }
            CsvLocation::Directory(dir) => list_csv_files(dir)?
                .into_iter()
                .find(|(id, _)| id == collection_id)
                .map(|(_, path)| path),
        };

        path.ok_or_else(|| ConnectorError::UnknownCollection(collection_id.to_string()))
    }
}

#[async_trait]
impl Connector for CsvConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> ConnectorType {
        ConnectorType::Csv
    }

    fn supported_operations(&self) -> &'static [Operation] {
        CSV_OPERATIONS
    }

    async fn discover(&self) -> Result<Catalog, ConnectorError> {
        let mut collections = Vec::new();

        for (id, path) in self.collection_files()? {
            let schema = infer_csv_schema(&path, self.inference)?;
            debug!(collection = %id, fields = schema.len(), "Inferred CSV schema");
            collections.push(Collection::new(id.clone(), id).with_roles(CSV_ROLES, &schema));
        }

        info!("📁 Discovered {} CSV collections", collections.len());
        Ok(Catalog::new(collections))
    }

    async fn extract(
        &self,
        collection_id: &str,
        fields: Option<&[String]>,
    ) -> Result<RecordStream, ConnectorError> {
        let path = self.resolve_collection(collection_id)?;
        let unavailable = |e: csv::Error| {
            ConnectorError::ResourceUnavailable(format!("{}: {}", path.display(), e))
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
            .map_err(unavailable)?;
        let headers = reader.headers().map_err(unavailable)?.clone();

        let fields = fields.map(<[String]>::to_vec);
        let display_path = path.display().to_string();
        let rows = reader.into_records().map(move |row| {
            let row = row.map_err(|e| {
                ConnectorError::ResourceUnavailable(format!("{}: {}", display_path, e))
            })?;
            Ok(select_fields(row_to_record(&headers, &row), fields.as_deref()))
        });

        Ok(stream::iter(rows).boxed())
    }

    async fn load(
        &self,
        collection_id: &str,
        operation: Operation,
        records: Vec<Record>,
    ) -> Result<LoadResult, ConnectorError> {
        self.check_operation(operation)?;
        let path = self.resolve_collection(collection_id)?;

        if records.is_empty() {
            return Ok(LoadResult::applied(
                0,
                format!("No records to load into {}", path.display()),
            ));
        }

        let applied = append_records(&path, &records)?;
        info!(
            collection = %collection_id,
            operation = %operation,
            applied,
            "✅ Appended records to CSV"
        );

        Ok(LoadResult::applied(
            applied,
            format!("Successfully loaded {} records into {}", applied, path.display()),
        ))
    }
}

/// Appends `records` to an existing CSV file.
///
/// The write header is the file's own header row when it has one, otherwise
/// the keys of the first record that has any, which is then written as the
/// header. Nothing is written when no header can be found.
fn append_records(path: &Path, records: &[Record]) -> Result<usize, ConnectorError> {
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .open(path)
        .map_err(|e| write_error(path, e))?;
    let len = file.metadata().map_err(|e| write_error(path, e))?.len();

    let existing_header = if len == 0 {
        Vec::new()
    } else {
        read_header(path).map_err(|e| write_error(path, e))?
    };

    let write_header = existing_header.is_empty();
    let header: Vec<String> = if write_header {
        records
            .iter()
            .find(|record| !record.is_empty())
            .map(|record| record.keys().cloned().collect())
            .unwrap_or_default()
    } else {
        existing_header
    };

    if header.is_empty() {
        return Err(write_error(
            path,
            "file has no header and no record has any fields",
        ));
    }

    if len > 0 {
        ensure_trailing_newline(&mut file).map_err(|e| write_error(path, e))?;
    }

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file);

    if write_header {
        writer.write_record(&header).map_err(|e| write_error(path, e))?;
    }

    let mut dropped = 0usize;
    for record in records {
        dropped += record.keys().filter(|key| !header.contains(key)).count();
        writer
            .write_record(header.iter().map(|field| cell(record.get(field))))
            .map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| write_error(path, e))?;

    if dropped > 0 {
        debug!(dropped, "Dropped values for fields outside the CSV header");
    }

    Ok(records.len())
}

fn write_error(path: &Path, err: impl Display) -> ConnectorError {
    ConnectorError::BackendWrite(format!("{}: {}", path.display(), err))
}

fn ensure_trailing_newline(file: &mut File) -> std::io::Result<()> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        // append mode: the write lands at the end regardless of the cursor
        file.write_all(b"\n")?;
    }
    Ok(())
}

fn read_header(path: &Path) -> Result<Vec<String>, csv::Error> {
    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_path(path)?;
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

fn row_to_record(headers: &StringRecord, row: &StringRecord) -> Record {
    headers
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let value = row
                .get(index)
                .map(|cell| Value::String(cell.to_string()))
                .unwrap_or(Value::Null);
            (name.to_string(), value)
        })
        .collect()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn list_csv_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, ConnectorError> {
    if !dir.is_dir() {
        return Err(ConnectorError::Configuration(format!(
            "CSV directory no longer exists: {}",
            dir.display()
        )));
    }

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !is_csv(path) {
            continue;
        }

        let Some(id) = collection_id(path) else {
            continue;
        };
        if files.iter().any(|(existing, _)| *existing == id) {
            warn!(collection = %id, "Ignoring {} with duplicate collection id", path.display());
            continue;
        }
        files.push((id, path.to_path_buf()));
    }

    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// File name with its extension stripped
fn collection_id(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_string())
}

fn collection_id_matches(path: &Path, id: &str) -> bool {
    collection_id(path).as_deref() == Some(id)
}
