// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::{RepoContext, parse_partition_spec};
use anyhow::{Context, Result, bail};
use dataset::{DatasetDescriptor, DescriptorBuilder, PartitionStrategy};
use std::path::PathBuf;
use url::Url;

/// Where `create` takes the dataset schema from
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// Schema text in a local file
    File(PathBuf),
    /// Schema text at a URL (recorded on the descriptor)
    Url(Url),
    /// The schema embedded in a Parquet or Arrow IPC file
    DataFile(PathBuf),
}

impl SchemaSource {
    /// A URL when `arg` has a scheme, otherwise a local path
    #[must_use]
    pub fn from_arg(arg: &str) -> Self {
        match Url::parse(arg) {
            Ok(url) if url.scheme().len() > 1 => SchemaSource::Url(url),
            _ => SchemaSource::File(PathBuf::from(arg)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub schema: SchemaSource,
    pub format: Option<String>,
    pub partitions: Vec<String>,
    pub location: Option<String>,
}

pub async fn create_command<F>(
    ctx: &RepoContext,
    name: &str,
    options: &CreateOptions,
    mut handler: F,
) -> Result<()>
where
    F: FnMut(&str),
{
    let mut builder = match &options.schema {
        SchemaSource::File(path) => DescriptorBuilder::new().schema_file(path)?,
        SchemaSource::Url(url) => DescriptorBuilder::new().schema_uri(url).await?,
        SchemaSource::DataFile(path) => DescriptorBuilder::new().schema_from_data_file(path)?,
    };
    if let Some(format) = &options.format {
        builder = builder.format_name(format)?;
    }
    if let Some(location) = &options.location {
        builder = builder
            .location_str(location)
            .with_context(|| format!("Invalid location '{location}'"))?;
    }
    if !options.partitions.is_empty() {
        let fields = options
            .partitions
            .iter()
            .map(|spec| parse_partition_spec(spec))
            .collect::<Result<Vec<_>>>()?;
        builder = builder.partition_strategy(PartitionStrategy::new(fields)?);
    }
    let descriptor = builder.build()?;

    let missing = missing_sources(&descriptor);
    if !missing.is_empty() {
        bail!(
            "Partition source fields not in the schema: {}",
            missing.join(", ")
        );
    }

    let repo = ctx.open()?;
    let dataset = repo.create(name, &descriptor).await?;
    handler(&format!("Created {name} at {}", dataset.location()));
    Ok(())
}

/// Partition sources that name no top-level schema field
fn missing_sources(descriptor: &DatasetDescriptor) -> Vec<String> {
    let Ok(strategy) = descriptor.partition_strategy() else {
        return Vec::new();
    };
    strategy
        .fields()
        .iter()
        .filter(|field| descriptor.schema().field_with_name(&field.source).is_err())
        .map(|field| field.source.clone())
        .collect()
}
