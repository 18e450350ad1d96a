// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Descriptor persistence for repositories backed by an object store.
//!
//! Each dataset's descriptor is stored as JSON at
//! `<root>/<name>/.metadata/descriptor.json`.

use crate::error::{RepositoryError, Result};
use async_trait::async_trait;
use dataset::{DatasetDescriptor, Format, PartitionStrategy, Schema};
use futures::TryStreamExt;
use object_store::path::{Path, PathPart};
use object_store::{ObjectStore, PutMode, PutPayload};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use url::Url;

pub const METADATA_DIR: &str = ".metadata";
pub const DESCRIPTOR_FILE: &str = "descriptor.json";

/// Stores and retrieves dataset descriptors by name
#[async_trait]
pub trait MetadataProvider: Send + Sync + Debug {
    /// Store a new descriptor, returning it with its location filled in
    async fn create(&self, name: &str, descriptor: &DatasetDescriptor) -> Result<DatasetDescriptor>;

    async fn load(&self, name: &str) -> Result<DatasetDescriptor>;

    async fn update(&self, name: &str, descriptor: &DatasetDescriptor) -> Result<DatasetDescriptor>;

    /// Remove a descriptor; `false` if there was none
    async fn delete(&self, name: &str) -> Result<bool>;

    async fn exists(&self, name: &str) -> Result<bool>;

    /// Names of datasets with a stored descriptor, sorted
    async fn list(&self) -> Result<Vec<String>>;
}

/// On-disk form of a descriptor; the configuration handle is not persisted
#[derive(Debug, Serialize, Deserialize)]
struct StoredDescriptor {
    schema: Schema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_url: Option<String>,
    format: Format,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    partition_strategy: Option<PartitionStrategy>,
}

impl StoredDescriptor {
    fn from_descriptor(descriptor: &DatasetDescriptor) -> Result<Self> {
        let partition_strategy = if descriptor.is_partitioned() {
            Some(descriptor.partition_strategy()?.clone())
        } else {
            None
        };
        Ok(Self {
            schema: descriptor.schema().as_ref().clone(),
            schema_url: descriptor.schema_url().map(Url::to_string),
            format: descriptor.format(),
            location: descriptor.location().map(Url::to_string),
            partition_strategy,
        })
    }

    fn into_descriptor(self) -> Result<DatasetDescriptor> {
        let mut builder = DatasetDescriptor::builder()
            .schema(Arc::new(self.schema))
            .format(self.format);
        if let Some(url) = &self.schema_url {
            builder = builder.schema_url(Url::parse(url).map_err(dataset::Error::from)?);
        }
        if let Some(location) = &self.location {
            builder = builder.location_str(location)?;
        }
        if let Some(strategy) = self.partition_strategy {
            builder = builder.partition_strategy(strategy);
        }
        Ok(builder.build()?)
    }
}

/// Metadata provider writing descriptors next to the data in an object store
#[derive(Debug, Clone)]
pub struct FileSystemMetadataProvider {
    store: Arc<dyn ObjectStore>,
    root_url: Url,
    root: Path,
}

impl FileSystemMetadataProvider {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, root_url: Url, root: Path) -> Self {
        Self {
            store,
            root_url,
            root,
        }
    }

    fn descriptor_path(&self, name: &str) -> Path {
        self.root
            .child(PathPart::from(name))
            .child(METADATA_DIR)
            .child(DESCRIPTOR_FILE)
    }

    async fn write(&self, name: &str, descriptor: &DatasetDescriptor, mode: PutMode) -> Result<()> {
        let stored = StoredDescriptor::from_descriptor(descriptor)?;
        let json = serde_json::to_vec_pretty(&stored)?;
        let path = self.descriptor_path(name);
        match self
            .store
            .put_opts(&path, PutPayload::from(json), mode.into())
            .await
        {
            Ok(_) => Ok(()),
            Err(object_store::Error::AlreadyExists { .. }) => {
                Err(RepositoryError::AlreadyExists(name.to_string()))
            }
            Err(e) => Err(RepositoryError::storage(format!("writing {path}"), e)),
        }
    }
}

#[async_trait]
impl MetadataProvider for FileSystemMetadataProvider {
    async fn create(&self, name: &str, descriptor: &DatasetDescriptor) -> Result<DatasetDescriptor> {
        let descriptor = match descriptor.location() {
            Some(_) => descriptor.clone(),
            None => descriptor
                .to_builder()
                .location(crate::filesystem::child_url(&self.root_url, &[name.to_string()])?)
                .build()?,
        };
        self.write(name, &descriptor, PutMode::Create).await?;
        Ok(descriptor)
    }

    async fn load(&self, name: &str) -> Result<DatasetDescriptor> {
        let path = self.descriptor_path(name);
        let bytes = match self.store.get(&path).await {
            Ok(result) => result
                .bytes()
                .await
                .map_err(|e| RepositoryError::storage(format!("reading {path}"), e))?,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(RepositoryError::NotFound(name.to_string()));
            }
            Err(e) => return Err(RepositoryError::storage(format!("reading {path}"), e)),
        };
        let stored: StoredDescriptor = serde_json::from_slice(&bytes)?;
        stored.into_descriptor()
    }

    async fn update(&self, name: &str, descriptor: &DatasetDescriptor) -> Result<DatasetDescriptor> {
        if !self.exists(name).await? {
            return Err(RepositoryError::NotFound(name.to_string()));
        }
        self.write(name, descriptor, PutMode::Overwrite).await?;
        Ok(descriptor.clone())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let prefix = self.root.child(PathPart::from(name)).child(METADATA_DIR);
        let objects: Vec<_> = self
            .store
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| RepositoryError::storage(format!("listing {prefix}"), e))?;
        for meta in &objects {
            self.store
                .delete(&meta.location)
                .await
                .map_err(|e| RepositoryError::storage(format!("deleting {}", meta.location), e))?;
        }
        Ok(!objects.is_empty())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.descriptor_path(name);
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(RepositoryError::storage(format!("checking {path}"), e)),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let listing = self
            .store
            .list_with_delimiter(Some(&self.root))
            .await
            .map_err(|e| RepositoryError::storage(format!("listing {}", self.root), e))?;

        let mut names = Vec::new();
        for prefix in &listing.common_prefixes {
            let Some(name) = prefix.filename() else {
                continue;
            };
            if crate::filesystem::validate_name(name).is_err() {
                continue;
            }
            if self.exists(name).await? {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
