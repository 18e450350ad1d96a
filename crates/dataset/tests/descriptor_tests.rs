// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use arrow::ipc::writer::FileWriter;
use arrow_array::{Int64Array, RecordBatch, StringArray};
use dataset::schema::schema_to_text;
use dataset::{
    Configuration, DataType, DatasetDescriptor, DescriptorBuilder, Field, Format, KeyType,
    PartitionStrategy, Schema, SchemaRef,
};
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::sync::Arc;
use url::Url;

fn events_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("user", DataType::Utf8, true),
        Field::new(
            "tags",
            DataType::Struct(vec![Field::new("source", DataType::Utf8, true)].into()),
            true,
        ),
    ]))
}

fn flat_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("user", DataType::Utf8, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])),
        ],
    )
    .unwrap()
}

fn full_descriptor() -> DatasetDescriptor {
    let strategy = PartitionStrategy::builder()
        .identity("user", "user", KeyType::String)
        .hash("id", "id_bucket", 8)
        .build()
        .unwrap();
    DatasetDescriptor::builder()
        .schema(events_schema())
        .format(Format::Parquet)
        .location_str("file:///warehouse/events")
        .unwrap()
        .configuration(Configuration::new().with("fs.defaultFS", "hdfs://nn:8020"))
        .partition_strategy(strategy)
        .build()
        .unwrap()
}

#[test]
fn test_copy_builder_equals_source() {
    let d = full_descriptor();
    let copy = DescriptorBuilder::from(&d).build().unwrap();
    assert_eq!(copy, d);
    assert_eq!(d.to_builder().build().unwrap(), d);
}

#[test]
fn test_copy_builder_of_unpartitioned_descriptor() {
    let d = DatasetDescriptor::builder()
        .schema(events_schema())
        .build()
        .unwrap();
    let copy = d.to_builder().build().unwrap();
    assert_eq!(copy, d);
    assert!(!copy.is_partitioned());
}

#[test]
fn test_copy_then_override() {
    let d = full_descriptor();
    let changed = d.to_builder().no_partition_strategy().build().unwrap();
    assert!(!changed.is_partitioned());
    assert_eq!(changed.schema(), d.schema());
    assert_eq!(changed.location(), d.location());
    // the source is untouched
    assert!(d.is_partitioned());
}

#[test]
fn test_nested_schema_literal() {
    let text = schema_to_text(&events_schema()).unwrap();
    let d = DescriptorBuilder::new()
        .schema_literal(&text)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(d.schema(), &events_schema());
    assert!(d.schema_url().is_none());
}

#[test]
fn test_schema_file_and_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.schema.json");
    std::fs::write(&path, schema_to_text(&events_schema()).unwrap()).unwrap();

    let from_file = DescriptorBuilder::new()
        .schema_file(&path)
        .unwrap()
        .build()
        .unwrap();
    let from_reader = DescriptorBuilder::new()
        .schema_reader(File::open(&path).unwrap())
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(from_file, from_reader);
    assert!(from_file.schema_url().is_none());
}

#[test]
fn test_missing_schema_file() {
    let err = DescriptorBuilder::new()
        .schema_file("/nonexistent/events.schema.json")
        .unwrap_err();
    assert!(err.to_string().starts_with("Cannot read /nonexistent"));
}

#[tokio::test]
async fn test_schema_uri_records_schema_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.schema.json");
    std::fs::write(&path, schema_to_text(&events_schema()).unwrap()).unwrap();
    let url = Url::from_file_path(&path).unwrap();

    let d = DescriptorBuilder::new()
        .schema_uri(&url)
        .await
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(d.schema(), &events_schema());
    assert_eq!(d.schema_url(), Some(&url));

    // the schema URL survives the copy builder
    assert_eq!(d.to_builder().build().unwrap().schema_url(), Some(&url));

    // replacing the schema forgets where the old one came from
    let replaced = d.to_builder().schema(events_schema()).build().unwrap();
    assert!(replaced.schema_url().is_none());
}

#[test]
fn test_schema_from_parquet_footer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("part-0.parquet");
    let batch = flat_batch();
    let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    _ = writer.close().unwrap();

    let d = DescriptorBuilder::new()
        .schema_from_data_file(&path)
        .unwrap()
        .build()
        .unwrap();
    let names: Vec<&str> = d.schema().fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, ["id", "user"]);
    assert_eq!(d.schema().field(0).data_type(), &DataType::Int64);
}

#[test]
fn test_schema_from_arrow_ipc_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("part-0.arrow");
    let batch = flat_batch();
    let mut writer = FileWriter::try_new(File::create(&path).unwrap(), &batch.schema()).unwrap();
    writer.write(&batch).unwrap();
    writer.finish().unwrap();

    let d = DescriptorBuilder::new()
        .schema_from_data_file(&path)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(d.schema(), &batch.schema());
}

#[tokio::test]
async fn test_schema_from_data_uri() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("part-0.parquet");
    let batch = flat_batch();
    let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    _ = writer.close().unwrap();

    let url = Url::from_file_path(&path).unwrap();
    let d = DescriptorBuilder::new()
        .schema_from_data_uri(&url)
        .await
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(d.schema().fields().len(), 2);
}

#[test]
fn test_truncated_parquet_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.parquet");
    std::fs::write(&path, b"PAR1 not really").unwrap();
    assert!(DescriptorBuilder::new().schema_from_data_file(&path).is_err());
}
