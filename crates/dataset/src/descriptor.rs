// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Immutable dataset descriptors and the builder that produces them.

use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::partition::PartitionStrategy;
use crate::schema;
use arrow_schema::SchemaRef;
use serde::Deserialize;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Everything a repository needs to know to store a dataset: its schema,
/// storage format, location, backend configuration and partitioning
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescriptor {
    schema: SchemaRef,
    schema_url: Option<Url>,
    format: Format,
    location: Option<Url>,
    configuration: Option<Arc<Configuration>>,
    partition_strategy: Option<PartitionStrategy>,
}

impl DatasetDescriptor {
    #[must_use]
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder::new()
    }

    /// A builder seeded with every field of this descriptor
    #[must_use]
    pub fn to_builder(&self) -> DescriptorBuilder {
        DescriptorBuilder::from(self)
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Where the schema text was fetched from, when it came from a URL
    #[must_use]
    pub fn schema_url(&self) -> Option<&Url> {
        self.schema_url.as_ref()
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// `None` lets the repository choose
    #[must_use]
    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    /// Backend-specific configuration, passed through untouched
    #[must_use]
    pub fn configuration(&self) -> Option<&Arc<Configuration>> {
        self.configuration.as_ref()
    }

    #[must_use]
    pub fn is_partitioned(&self) -> bool {
        self.partition_strategy.is_some()
    }

    /// The partition strategy; only valid when [`Self::is_partitioned`]
    pub fn partition_strategy(&self) -> Result<&PartitionStrategy> {
        self.partition_strategy
            .as_ref()
            .ok_or_else(|| Error::illegal_state("Descriptor is not partitioned"))
    }
}

impl fmt::Display for DatasetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self
            .schema
            .fields()
            .iter()
            .map(|field| field.name().as_str())
            .collect();
        write!(f, "format={} schema=[{}]", self.format, fields.join(", "))?;
        if let Some(location) = &self.location {
            write!(f, " location={location}")?;
        }
        if let Some(url) = &self.schema_url {
            write!(f, " schema_url={url}")?;
        }
        if let Some(strategy) = &self.partition_strategy {
            write!(f, " partitions=[{strategy}]")?;
        }
        Ok(())
    }
}

/// Staged construction of a [`DatasetDescriptor`]
///
/// Setters consume and return the builder. Setters that parse input return
/// `Result<Self>` so they can be chained with `?`. `build` borrows the
/// builder, so one builder can produce several independent descriptors.
#[derive(Debug, Clone, Default)]
pub struct DescriptorBuilder {
    schema: Option<SchemaRef>,
    schema_url: Option<Url>,
    format: Format,
    location: Option<Url>,
    configuration: Option<Arc<Configuration>>,
    partition_strategy: Option<PartitionStrategy>,
}

impl DescriptorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self.schema_url = None;
        self
    }

    pub fn schema_literal(self, text: &str) -> Result<Self> {
        Ok(self.schema(schema::parse_schema(text)?))
    }

    pub fn schema_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        Ok(self.schema(schema::schema_from_file(path)?))
    }

    pub fn schema_reader<R: Read>(self, reader: R) -> Result<Self> {
        Ok(self.schema(schema::read_schema(reader)?))
    }

    /// Fetch the schema from `url` and remember `url` as its schema URL
    pub async fn schema_uri(self, url: &Url) -> Result<Self> {
        let parsed = schema::fetch_schema(url).await?;
        let mut builder = self.schema(parsed);
        builder.schema_url = Some(url.clone());
        Ok(builder)
    }

    /// Record where the current schema came from
    #[must_use]
    pub fn schema_url(mut self, url: Url) -> Self {
        self.schema_url = Some(url);
        self
    }

    /// Derive the schema from a serde-deserializable type
    pub fn schema_for<'de, T: Deserialize<'de>>(self) -> Result<Self> {
        Ok(self.schema(schema::schema_for_type::<T>()?))
    }

    /// Use the schema embedded in an existing Parquet or Arrow IPC file
    pub fn schema_from_data_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        Ok(self.schema(schema::schema_from_data_file(path)?))
    }

    pub async fn schema_from_data_uri(self, url: &Url) -> Result<Self> {
        Ok(self.schema(schema::fetch_data_file_schema(url).await?))
    }

    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn format_name(self, name: &str) -> Result<Self> {
        Ok(self.format(Format::from_name(name)?))
    }

    /// Set the location; existence is checked by the repository, not here
    #[must_use]
    pub fn location(mut self, location: Url) -> Self {
        self.location = Some(location);
        self
    }

    pub fn location_str(self, location: &str) -> Result<Self> {
        Ok(self.location(Url::parse(location)?))
    }

    #[must_use]
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(Arc::new(configuration));
        self
    }

    #[must_use]
    pub fn partition_strategy(mut self, strategy: PartitionStrategy) -> Self {
        self.partition_strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn no_partition_strategy(mut self) -> Self {
        self.partition_strategy = None;
        self
    }

    pub fn build(&self) -> Result<DatasetDescriptor> {
        let schema = self
            .schema
            .clone()
            .ok_or_else(|| Error::configuration("Descriptor schema is required"))?;
        Ok(DatasetDescriptor {
            schema,
            schema_url: self.schema_url.clone(),
            format: self.format,
            location: self.location.clone(),
            configuration: self.configuration.clone(),
            partition_strategy: self.partition_strategy.clone(),
        })
    }
}

impl From<&DatasetDescriptor> for DescriptorBuilder {
    fn from(descriptor: &DatasetDescriptor) -> Self {
        let partition_strategy = if descriptor.is_partitioned() {
            descriptor.partition_strategy().ok().cloned()
        } else {
            None
        };
        Self {
            schema: Some(descriptor.schema.clone()),
            schema_url: descriptor.schema_url.clone(),
            format: descriptor.format,
            location: descriptor.location.clone(),
            configuration: descriptor.configuration.clone(),
            partition_strategy,
        }
    }
}
