// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use cmd::{
    CreateOptions, RepoContext, SchemaSource, create_command, delete_command, list_command,
    partitions_command, show_command,
};
use dataset::schema::schema_to_text;
use dataset::{Configuration, DataType, Field, Schema};
use std::path::PathBuf;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    ctx: RepoContext,
    schema_file: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("user", DataType::Utf8, true),
        Field::new("ts", DataType::Int64, false),
    ]);
    let schema_file = dir.path().join("events.schema.json");
    std::fs::write(&schema_file, schema_to_text(&schema).unwrap()).unwrap();

    let repo_dir = dir.path().join("warehouse");
    let ctx = RepoContext::new(format!("repo:file:{}", repo_dir.display()), Configuration::new());
    Fixture {
        _dir: dir,
        ctx,
        schema_file,
    }
}

fn options(f: &Fixture, partitions: &[&str]) -> CreateOptions {
    CreateOptions {
        schema: SchemaSource::File(f.schema_file.clone()),
        format: Some("parquet".to_string()),
        partitions: partitions.iter().map(|p| p.to_string()).collect(),
        location: None,
    }
}

#[tokio::test]
async fn test_create_list_show_delete() {
    let f = fixture();
    let mut out = Vec::new();
    create_command(&f.ctx, "events", &options(&f, &["identity:user:user", "year:ts:year"]), |l| {
        out.push(l.to_string())
    })
    .await
    .unwrap();
    assert_eq!(out.len(), 1);
    assert!(out[0].starts_with("Created events at file:///"));

    let mut names = Vec::new();
    list_command(&f.ctx, |l| names.push(l.to_string())).await.unwrap();
    assert_eq!(names, ["events"]);

    let mut text = String::new();
    show_command(&f.ctx, "events", |t| text.push_str(t)).await.unwrap();
    assert!(text.contains("Format: parquet"));
    assert!(text.contains("  id: Int64 not null"));
    assert!(text.contains("  identity[string](user) -> user"));
    assert!(text.contains("  year(ts) -> year"));

    delete_command(&f.ctx, "events", |_| {}).await.unwrap();
    let mut names = Vec::new();
    list_command(&f.ctx, |l| names.push(l.to_string())).await.unwrap();
    assert!(names.is_empty());

    assert!(delete_command(&f.ctx, "events", |_| {}).await.is_err());
}

#[tokio::test]
async fn test_create_rejects_unknown_partition_source() {
    let f = fixture();
    let err = create_command(&f.ctx, "events", &options(&f, &["identity:region:region"]), |_| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("region"));
}

#[tokio::test]
async fn test_create_rejects_unknown_format() {
    let f = fixture();
    let mut opts = options(&f, &[]);
    opts.format = Some("orc".to_string());
    let err = create_command(&f.ctx, "events", &opts, |_| {}).await.unwrap_err();
    assert!(err.to_string().contains("known formats: avro, parquet"));
}

#[tokio::test]
async fn test_partitions_lists_leaf_directories() {
    let f = fixture();
    create_command(&f.ctx, "events", &options(&f, &["identity:user:user", "hash:id:bucket:4"]), |_| {})
        .await
        .unwrap();

    let repo = f.ctx.open().unwrap();
    let dataset = repo.load("events").await.unwrap();
    let strategy = dataset.descriptor().partition_strategy().unwrap().clone();
    for (id, user) in [(1, "alice"), (2, "alice"), (3, "bob")] {
        let record = record_of(id, user);
        let key = strategy.key_for(&record).unwrap();
        dataset
            .write_file(&key, &format!("part-{id}.parquet"), bytes_of("PAR1"))
            .await
            .unwrap();
    }

    let mut lines = Vec::new();
    partitions_command(&f.ctx, "events", |l| lines.push(l.to_string()))
        .await
        .unwrap();
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|l| l.starts_with("user=alice/bucket=") || l.starts_with("user=bob/bucket=")));
    let total: usize = lines
        .iter()
        .map(|l| l.rsplit('\t').next().unwrap().trim_end_matches(" files").parse::<usize>().unwrap())
        .sum();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn test_partitions_of_unpartitioned_dataset() {
    let f = fixture();
    create_command(&f.ctx, "plain", &options(&f, &[]), |_| {}).await.unwrap();
    let err = partitions_command(&f.ctx, "plain", |_| {}).await.unwrap_err();
    assert!(err.to_string().contains("not partitioned"));
}

#[test]
fn test_unknown_scheme_reported() {
    let ctx = RepoContext::new("repo:bogus:/x", Configuration::new());
    let err = ctx.open().unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("bogus"));
}

fn record_of(id: i64, user: &str) -> std::collections::BTreeMap<String, dataset::KeyValue> {
    [
        ("id".to_string(), id.into()),
        ("user".to_string(), user.into()),
    ]
    .into_iter()
    .collect()
}

fn bytes_of(text: &'static str) -> bytes::Bytes {
    bytes::Bytes::from_static(text.as_bytes())
}
