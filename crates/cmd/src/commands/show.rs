// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::RepoContext;
use anyhow::{Context, Result};
use dataset::DatasetDescriptor;
use std::fmt::Write;

/// Describe one dataset: location, format, schema and partitioning
pub async fn show_command<F>(ctx: &RepoContext, name: &str, mut handler: F) -> Result<()>
where
    F: FnMut(&str),
{
    let repo = ctx.open()?;
    let dataset = repo
        .load(name)
        .await
        .with_context(|| format!("Failed to load dataset {name}"))?;
    handler(&describe(name, dataset.descriptor())?);
    Ok(())
}

fn describe(name: &str, descriptor: &DatasetDescriptor) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Dataset: {name}")?;
    if let Some(location) = descriptor.location() {
        writeln!(out, "Location: {location}")?;
    }
    writeln!(out, "Format: {}", descriptor.format())?;
    if let Some(url) = descriptor.schema_url() {
        writeln!(out, "Schema URL: {url}")?;
    }
    writeln!(out, "Schema:")?;
    for field in descriptor.schema().fields() {
        let nullable = if field.is_nullable() { "" } else { " not null" };
        writeln!(out, "  {}: {}{nullable}", field.name(), field.data_type())?;
    }
    if descriptor.is_partitioned() {
        writeln!(out, "Partitioned by:")?;
        for field in descriptor.partition_strategy()?.fields() {
            writeln!(out, "  {field}")?;
        }
    } else {
        writeln!(out, "Not partitioned")?;
    }
    Ok(out)
}
