// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use dataset::{DatasetDescriptor, KeyValue, PartitionKey, Record};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;
use url::Url;

/// A backend-specific manager of datasets rooted at one location
#[async_trait]
pub trait DatasetRepository: Send + Sync + Debug {
    /// The fully qualified root of this repository
    fn location(&self) -> &Url;

    async fn create(&self, name: &str, descriptor: &DatasetDescriptor) -> Result<Arc<dyn Dataset>>;

    async fn load(&self, name: &str) -> Result<Arc<dyn Dataset>>;

    /// Replace a dataset's descriptor. The format and partition strategy
    /// of an existing dataset cannot change.
    async fn update(&self, name: &str, descriptor: &DatasetDescriptor) -> Result<Arc<dyn Dataset>>;

    /// Remove a dataset's metadata and data; `false` if it did not exist
    async fn delete(&self, name: &str) -> Result<bool>;

    async fn exists(&self, name: &str) -> Result<bool>;

    /// Names of all datasets, sorted
    async fn list(&self) -> Result<Vec<String>>;

    /// Allows downcasting to the concrete repository type
    fn as_any(&self) -> &dyn Any;
}

/// A named dataset inside a repository
#[async_trait]
pub trait Dataset: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn descriptor(&self) -> &DatasetDescriptor;

    /// Root location of the dataset's data
    fn location(&self) -> &Url;

    /// Location of one partition. The key may be a prefix of the
    /// strategy's fields; an unpartitioned dataset accepts only the empty key.
    fn partition_location(&self, key: &PartitionKey) -> Result<Url>;

    /// Location of the leaf partition a record belongs in
    fn location_for(&self, record: &dyn Record) -> Result<Url>;

    /// Every leaf partition present in storage
    async fn partitions(&self) -> Result<Vec<PartitionKey>>;

    /// Leaf partitions whose leading values equal `prefix`
    async fn partitions_matching(&self, prefix: &[KeyValue]) -> Result<Vec<PartitionKey>>;

    /// Store an already-encoded data file in a leaf partition
    async fn write_file(&self, key: &PartitionKey, file_name: &str, contents: Bytes) -> Result<Url>;

    /// Names of the data files stored directly in a partition, sorted
    async fn data_files(&self, key: &PartitionKey) -> Result<Vec<String>>;

    fn as_any(&self) -> &dyn Any;
}
