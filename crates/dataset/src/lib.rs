// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Dataset descriptions and partition layout planning.
//!
//! A [`DatasetDescriptor`] bundles a schema, a [`Format`], an optional
//! location and an optional [`PartitionStrategy`]. The strategy maps
//! records to Hive-style `name=value` directory paths and maps paths found
//! in storage back to partition keys.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod partition;
pub mod schema;

pub use config::Configuration;
pub use descriptor::{DatasetDescriptor, DescriptorBuilder};
pub use error::{Error, Result};
pub use format::Format;
pub use partition::{
    FieldPartitioner, KeyType, KeyValue, LayoutPath, PartitionFunction, PartitionKey,
    PartitionStrategy, PartitionStrategyBuilder, Partitioner, Record, TimeUnit,
};

// Re-exported so callers can build schemas without a direct arrow dependency
pub use arrow_schema::{DataType, Field, Schema, SchemaRef};
