// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Loading dataset schemas from text, files, URLs, Rust types and the
//! headers of existing data files.
//!
//! Schemas are Arrow schemas; their text form is the JSON produced by
//! serializing an `arrow_schema::Schema` with serde.

use crate::error::{Error, Result};
use arrow::ipc::convert::fb_to_schema;
use arrow::ipc::reader::{FileReader, read_footer_length};
use arrow::ipc::root_as_footer;
use arrow_schema::{FieldRef, Schema, SchemaRef};
use bytes::Bytes;
use object_store::ObjectStore;
use object_store::path::Path as ObjectPath;
use parquet::arrow::ParquetRecordBatchStreamBuilder;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::async_reader::ParquetObjectReader;
use parquet::file::reader::ChunkReader;
use serde::Deserialize;
use serde_arrow::schema::{SchemaLike, TracingOptions};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use url::Url;

const PARQUET_MAGIC: &[u8] = b"PAR1";
const ARROW_MAGIC: &[u8] = b"ARROW1";
/// Footer length (i32) plus the trailing magic of an Arrow IPC file
const ARROW_TRAILER_LEN: u64 = 10;

/// Kinds of self-describing data files a schema can be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFileKind {
    Parquet,
    ArrowIpc,
}

impl DataFileKind {
    /// Identify a data file from its leading bytes
    #[must_use]
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(PARQUET_MAGIC) {
            Some(DataFileKind::Parquet)
        } else if header.starts_with(ARROW_MAGIC) {
            Some(DataFileKind::ArrowIpc)
        } else {
            None
        }
    }
}

/// Parse schema text
pub fn parse_schema(text: &str) -> Result<SchemaRef> {
    let schema: Schema = serde_json::from_str(text)
        .map_err(|e| Error::Schema(format!("invalid schema text: {e}")))?;
    Ok(Arc::new(schema))
}

/// Render a schema as text accepted by [`parse_schema`]
pub fn schema_to_text(schema: &Schema) -> Result<String> {
    Ok(serde_json::to_string_pretty(schema)?)
}

/// Read schema text from a reader; the caller keeps ownership of the reader
pub fn read_schema<R: Read>(mut reader: R) -> Result<SchemaRef> {
    let mut text = String::new();
    _ = reader.read_to_string(&mut text)?;
    parse_schema(&text)
}

/// Read schema text from a local file
pub fn schema_from_file<P: AsRef<Path>>(path: P) -> Result<SchemaRef> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    read_schema(file)
}

/// Fetch schema text from a locatable URL (`file://`, `memory://`, and
/// any object store scheme enabled in this build)
pub async fn fetch_schema(url: &Url) -> Result<SchemaRef> {
    let bytes = fetch_bytes(url).await?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| Error::Schema(format!("schema at {url} is not UTF-8: {e}")))?;
    parse_schema(text)
}

async fn fetch_bytes(url: &Url) -> Result<Bytes> {
    let (store, path) = object_store::parse_url(url)?;
    diagnostics::log_debug!("Fetching {url}", url: url.as_str());
    let result = store.get(&path).await?;
    Ok(result.bytes().await?)
}

/// Derive a schema from a serde-deserializable Rust type
pub fn schema_for_type<'de, T: Deserialize<'de>>() -> Result<SchemaRef> {
    let fields = Vec::<FieldRef>::from_type::<T>(TracingOptions::default())?;
    Ok(Arc::new(Schema::new(fields)))
}

/// Read the schema embedded in a Parquet or Arrow IPC data file
///
/// Only the file's header (Arrow IPC) or footer (Parquet) is read. The file
/// handle is dropped on every path out of this function.
pub fn schema_from_data_file<P: AsRef<Path>>(path: P) -> Result<SchemaRef> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;

    let mut header = [0u8; 6];
    let read = read_prefix(&mut file, &mut header)?;
    _ = file.seek(SeekFrom::Start(0))?;

    match DataFileKind::sniff(&header[..read]) {
        Some(DataFileKind::Parquet) => parquet_schema(file),
        Some(DataFileKind::ArrowIpc) => ipc_schema(file),
        None => Err(Error::Schema(format!(
            "{} is not a Parquet or Arrow IPC file",
            path.display()
        ))),
    }
}

/// Read the schema embedded in a Parquet or Arrow IPC file at a URL
///
/// Only ranged reads of the leading magic and the footer are issued.
pub async fn fetch_data_file_schema(url: &Url) -> Result<SchemaRef> {
    let (store, path) = object_store::parse_url(url)?;
    diagnostics::log_debug!("Reading data file schema from {url}", url: url.as_str());
    data_file_schema_from_store(Arc::from(store), &path).await
}

/// Read the schema of a Parquet or Arrow IPC object in `store`
pub async fn data_file_schema_from_store(
    store: Arc<dyn ObjectStore>,
    location: &ObjectPath,
) -> Result<SchemaRef> {
    let meta = store.head(location).await?;
    let magic_len = (ARROW_MAGIC.len() as u64).min(meta.size);
    let header = store.get_range(location, 0..magic_len).await?;

    match DataFileKind::sniff(&header) {
        Some(DataFileKind::Parquet) => {
            let reader = ParquetObjectReader::new(store, location.clone());
            let builder = ParquetRecordBatchStreamBuilder::new(reader).await?;
            Ok(builder.schema().clone())
        }
        Some(DataFileKind::ArrowIpc) => ipc_footer_schema(store.as_ref(), location, meta.size).await,
        None => Err(Error::Schema(format!(
            "{location} is not a Parquet or Arrow IPC file"
        ))),
    }
}

async fn ipc_footer_schema(store: &dyn ObjectStore, location: &ObjectPath, size: u64) -> Result<SchemaRef> {
    let truncated = || Error::Schema(format!("{location} is a truncated Arrow IPC file"));
    if size < ARROW_MAGIC.len() as u64 + ARROW_TRAILER_LEN {
        return Err(truncated());
    }

    let trailer = store.get_range(location, size - ARROW_TRAILER_LEN..size).await?;
    let trailer: [u8; 10] = trailer.as_ref().try_into().map_err(|_| truncated())?;
    let footer_len = read_footer_length(trailer)? as u64;
    if footer_len + ARROW_TRAILER_LEN > size {
        return Err(truncated());
    }

    let footer_end = size - ARROW_TRAILER_LEN;
    let footer = store.get_range(location, footer_end - footer_len..footer_end).await?;
    let footer = root_as_footer(&footer)
        .map_err(|e| Error::Schema(format!("invalid Arrow IPC footer in {location}: {e}")))?;
    let schema = footer
        .schema()
        .ok_or_else(|| Error::Schema(format!("Arrow IPC footer in {location} has no schema")))?;
    Ok(Arc::new(fb_to_schema(schema)))
}

/// Read the schema embedded in an in-memory Parquet or Arrow IPC file
pub fn schema_from_data_bytes(bytes: Bytes) -> Result<SchemaRef> {
    match DataFileKind::sniff(&bytes) {
        Some(DataFileKind::Parquet) => parquet_schema(bytes),
        Some(DataFileKind::ArrowIpc) => ipc_schema(Cursor::new(bytes)),
        None => Err(Error::Schema(
            "data is not a Parquet or Arrow IPC file".to_string(),
        )),
    }
}

fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn parquet_schema<T: ChunkReader + 'static>(input: T) -> Result<SchemaRef> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(input)?;
    Ok(builder.schema().clone())
}

fn ipc_schema<R: Read + Seek>(input: R) -> Result<SchemaRef> {
    let reader = FileReader::try_new(input, None)?;
    Ok(reader.schema())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::{DataType, Field};

    fn sample_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ])
    }

    #[test]
    fn test_text_round_trip() {
        let schema = sample_schema();
        let text = schema_to_text(&schema).unwrap();
        assert_eq!(*parse_schema(&text).unwrap(), schema);
    }

    #[test]
    fn test_invalid_text() {
        let err = parse_schema("{not json").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_read_schema_from_reader() {
        let text = schema_to_text(&sample_schema()).unwrap();
        let schema = read_schema(text.as_bytes()).unwrap();
        assert_eq!(schema.fields().len(), 2);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(DataFileKind::sniff(b"PAR1...."), Some(DataFileKind::Parquet));
        assert_eq!(DataFileKind::sniff(b"ARROW1\0\0"), Some(DataFileKind::ArrowIpc));
        assert_eq!(DataFileKind::sniff(b"Obj\x01"), None);
        assert_eq!(DataFileKind::sniff(b""), None);
    }

    #[test]
    fn test_missing_file() {
        let err = schema_from_data_file("/nonexistent/dir/data.parquet").unwrap_err();
        assert!(matches!(err, Error::File { .. }));
    }

    #[test]
    fn test_unrecognized_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, b"hello").unwrap();
        let err = schema_from_data_file(&path).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct Event {
        id: i64,
        name: String,
        score: Option<f64>,
    }

    #[test]
    fn test_schema_for_type() {
        let schema = schema_for_type::<Event>().unwrap();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, ["id", "name", "score"]);
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert!(schema.field(2).is_nullable());
    }
}
