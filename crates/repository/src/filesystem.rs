// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The reference repository: datasets laid out as directories in an
//! object store, one `name=value` directory per partition level.

use crate::api::{Dataset, DatasetRepository};
use crate::error::{RepositoryError, Result};
use crate::metadata::{FileSystemMetadataProvider, MetadataProvider};
use async_trait::async_trait;
use bytes::Bytes;
use dataset::{DatasetDescriptor, KeyValue, PartitionKey, PartitionStrategy, Record};
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::any::Any;
use std::sync::Arc;
use url::Url;

/// Names starting with these are never datasets, partitions or data files
pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !is_hidden(name)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidName(name.to_string()))
    }
}

fn store_path(url: &Url) -> Result<Path> {
    Path::from_url_path(url.path())
        .map_err(|e| RepositoryError::storage(format!("mapping {url}"), e.into()))
}

fn same_storage(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme() && a.authority() == b.authority()
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.prefix_matches(b) || b.prefix_matches(a)
}

/// Object path below `base` for components that are already encoded
///
/// The components are used verbatim, so the names in the store are exactly
/// the planner's segments.
fn object_path(base: &Path, components: &[String]) -> Result<Path> {
    if components.is_empty() {
        return Ok(base.clone());
    }
    let joined = format!("{base}/{}", components.join("/"));
    Path::parse(&joined).map_err(|e| RepositoryError::storage(format!("mapping {joined}"), e.into()))
}

/// `base` extended by one URL path segment per component
///
/// Segment escaping (`%` included) is undone by `Url::to_file_path` and
/// `Path::from_url_path`, so the URL names the object written under
/// [`object_path`].
pub(crate) fn child_url(base: &Url, components: &[String]) -> Result<Url> {
    let mut url = base.clone();
    _ = url
        .path_segments_mut()
        .map_err(|()| dataset::Error::illegal_state(format!("{base} cannot have child paths")))?
        .pop_if_empty()
        .extend(components);
    Ok(url)
}

/// A repository over any object store, rooted at `root`
#[derive(Debug)]
pub struct FileSystemDatasetRepository {
    store: Arc<dyn ObjectStore>,
    root: Url,
    metadata: Arc<dyn MetadataProvider>,
}

impl FileSystemDatasetRepository {
    /// A repository at `root` with descriptors stored beside the data
    ///
    /// Object paths are the path of `root` (and of dataset locations)
    /// within `store`.
    pub fn new(store: Arc<dyn ObjectStore>, root: Url) -> Result<Self> {
        let root_path = store_path(&root)?;
        let metadata = Arc::new(FileSystemMetadataProvider::new(
            store.clone(),
            root.clone(),
            root_path,
        ));
        Ok(Self {
            store,
            root,
            metadata,
        })
    }

    #[must_use]
    pub fn with_metadata_provider(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    #[must_use]
    pub fn metadata_provider(&self) -> &Arc<dyn MetadataProvider> {
        &self.metadata
    }

    /// A new dataset's data may not share a directory with the repository
    /// root or with any other dataset
    async fn check_location(&self, name: &str, descriptor: &DatasetDescriptor) -> Result<()> {
        let location = match descriptor.location() {
            Some(location) => location.clone(),
            None => child_url(&self.root, &[name.to_string()])?,
        };
        if !same_storage(&location, &self.root) {
            return Err(RepositoryError::Incompatible(format!(
                "location {location} is not on the storage of {}",
                self.root
            )));
        }

        let path = store_path(&location)?;
        if store_path(&self.root)?.prefix_matches(&path) {
            return Err(RepositoryError::Incompatible(format!(
                "location {location} contains the repository root {}",
                self.root
            )));
        }
        for other in self.metadata.list().await? {
            if other == name {
                continue;
            }
            let existing = self.metadata.load(&other).await?;
            let Some(other_location) = existing.location() else {
                continue;
            };
            if same_storage(other_location, &location) && overlaps(&store_path(other_location)?, &path) {
                return Err(RepositoryError::Incompatible(format!(
                    "location {location} overlaps dataset {other} at {other_location}"
                )));
            }
        }
        Ok(())
    }

    fn open_dataset(&self, name: &str, descriptor: DatasetDescriptor) -> Result<Arc<dyn Dataset>> {
        Ok(Arc::new(FileSystemDataset::new(
            name,
            descriptor,
            self.store.clone(),
        )?))
    }
}

#[async_trait]
impl DatasetRepository for FileSystemDatasetRepository {
    fn location(&self) -> &Url {
        &self.root
    }

    async fn create(&self, name: &str, descriptor: &DatasetDescriptor) -> Result<Arc<dyn Dataset>> {
        validate_name(name)?;
        self.check_location(name, descriptor).await?;
        let saved = self.metadata.create(name, descriptor).await?;
        diagnostics::log_info!("Created dataset {name} at {location}",
            name: name,
            location: saved.location().map(Url::as_str).unwrap_or_default());
        self.open_dataset(name, saved)
    }

    async fn load(&self, name: &str) -> Result<Arc<dyn Dataset>> {
        validate_name(name)?;
        let descriptor = self.metadata.load(name).await?;
        self.open_dataset(name, descriptor)
    }

    async fn update(&self, name: &str, descriptor: &DatasetDescriptor) -> Result<Arc<dyn Dataset>> {
        validate_name(name)?;
        let current = self.metadata.load(name).await?;

        if descriptor.format() != current.format() {
            return Err(RepositoryError::Incompatible(format!(
                "cannot change the format of {name} from {} to {}",
                current.format(),
                descriptor.format()
            )));
        }
        let old_strategy = current.partition_strategy().ok();
        let new_strategy = descriptor.partition_strategy().ok();
        if old_strategy != new_strategy {
            return Err(RepositoryError::Incompatible(format!(
                "cannot change the partition strategy of {name}"
            )));
        }

        let descriptor = match (descriptor.location(), current.location()) {
            (None, Some(location)) => descriptor.to_builder().location(location.clone()).build()?,
            (Some(new), Some(old)) if new != old => {
                return Err(RepositoryError::Incompatible(format!(
                    "cannot move {name} from {old} to {new}"
                )));
            }
            _ => descriptor.clone(),
        };

        let saved = self.metadata.update(name, &descriptor).await?;
        diagnostics::log_info!("Updated dataset {name}", name: name);
        self.open_dataset(name, saved)
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        let descriptor = match self.metadata.load(name).await {
            Ok(descriptor) => descriptor,
            Err(RepositoryError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        _ = self.metadata.delete(name).await?;

        if let Some(location) = descriptor.location() {
            let prefix = store_path(location)?;
            if store_path(&self.root)?.prefix_matches(&prefix) {
                diagnostics::log_warn!("Leaving data of {name} in place: {location} contains the repository root",
                    name: name,
                    location: location.as_str());
                diagnostics::log_info!("Deleted dataset {name}", name: name);
                return Ok(true);
            }
            let objects: Vec<_> = self
                .store
                .list(Some(&prefix))
                .try_collect()
                .await
                .map_err(|e| RepositoryError::storage(format!("listing {location}"), e))?;
            for meta in &objects {
                self.store
                    .delete(&meta.location)
                    .await
                    .map_err(|e| RepositoryError::storage(format!("deleting {}", meta.location), e))?;
            }
            diagnostics::log_debug!("Deleted {count} data files of {name}", count: objects.len(), name: name);
        }
        diagnostics::log_info!("Deleted dataset {name}", name: name);
        Ok(true)
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        self.metadata.exists(name).await
    }

    async fn list(&self) -> Result<Vec<String>> {
        self.metadata.list().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A dataset stored under one directory of an object store
#[derive(Debug, Clone)]
pub struct FileSystemDataset {
    name: String,
    descriptor: DatasetDescriptor,
    store: Arc<dyn ObjectStore>,
    location: Url,
    root: Path,
}

impl FileSystemDataset {
    pub fn new(name: &str, descriptor: DatasetDescriptor, store: Arc<dyn ObjectStore>) -> Result<Self> {
        let location = descriptor
            .location()
            .cloned()
            .ok_or_else(|| dataset::Error::illegal_state(format!("dataset {name} has no location")))?;
        let root = store_path(&location)?;
        Ok(Self {
            name: name.to_string(),
            descriptor,
            store,
            location,
            root,
        })
    }

    fn strategy(&self) -> Option<&PartitionStrategy> {
        self.descriptor.partition_strategy().ok()
    }

    /// Encoded path components of a partition (possibly a prefix)
    fn components(&self, key: &PartitionKey) -> Result<Vec<String>> {
        match self.strategy() {
            Some(strategy) => Ok(strategy.path_for_prefix(key.values())?.components()),
            None if key.is_empty() => Ok(Vec::new()),
            None => Err(dataset::Error::illegal_state(format!(
                "dataset {} is not partitioned but was given key {key}",
                self.name
            ))
            .into()),
        }
    }

    fn require_leaf(&self, key: &PartitionKey) -> Result<()> {
        let expected = self.strategy().map_or(0, PartitionStrategy::field_count);
        if key.len() == expected {
            Ok(())
        } else {
            Err(dataset::Error::LayoutMismatch {
                path: key.to_string(),
                expected,
                found: key.len(),
            }
            .into())
        }
    }

    /// Collect leaf partitions below the dataset root, descending only
    /// into directories that agree with `prefix`
    async fn walk(&self, strategy: &PartitionStrategy, prefix: &[KeyValue]) -> Result<Vec<PartitionKey>> {
        let mut found = Vec::new();
        let mut pending = vec![(self.root.clone(), Vec::new())];
        while let Some((dir, values)) = pending.pop() {
            let depth = values.len();
            if depth == strategy.field_count() {
                found.push(PartitionKey::new(values));
                continue;
            }
            let listing = self
                .store
                .list_with_delimiter(Some(&dir))
                .await
                .map_err(|e| RepositoryError::storage(format!("listing {dir}"), e))?;
            for child in listing.common_prefixes {
                let Some(segment) = child.filename().map(str::to_string) else {
                    continue;
                };
                if is_hidden(&segment) {
                    diagnostics::log_debug!("Skipping hidden entry {segment}", segment: segment.as_str());
                    continue;
                }
                let value = strategy.parse_segment(depth, &segment)?;
                if prefix.get(depth).is_some_and(|wanted| *wanted != value) {
                    continue;
                }
                let mut next = values.clone();
                next.push(value);
                pending.push((child, next));
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl Dataset for FileSystemDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    fn location(&self) -> &Url {
        &self.location
    }

    fn partition_location(&self, key: &PartitionKey) -> Result<Url> {
        child_url(&self.location, &self.components(key)?)
    }

    fn location_for(&self, record: &dyn Record) -> Result<Url> {
        let key = match self.strategy() {
            Some(strategy) => strategy.key_for(record)?,
            None => PartitionKey::default(),
        };
        self.partition_location(&key)
    }

    async fn partitions(&self) -> Result<Vec<PartitionKey>> {
        self.partitions_matching(&[]).await
    }

    async fn partitions_matching(&self, prefix: &[KeyValue]) -> Result<Vec<PartitionKey>> {
        let Some(strategy) = self.strategy() else {
            return Ok(Vec::new());
        };
        // Validates the prefix against the strategy
        _ = strategy.path_for_prefix(prefix)?;

        let mut found = self.walk(strategy, prefix).await?;
        found.sort();
        diagnostics::log_debug!("Found {count} partitions in {name}", count: found.len(), name: self.name.as_str());
        Ok(found)
    }

    async fn write_file(&self, key: &PartitionKey, file_name: &str, contents: Bytes) -> Result<Url> {
        self.require_leaf(key)?;
        if file_name.is_empty() || file_name.contains('/') || is_hidden(file_name) {
            return Err(RepositoryError::Incompatible(format!(
                "'{file_name}' is not a valid data file name"
            )));
        }
        let mut components = self.components(key)?;
        components.push(file_name.to_string());
        let path = object_path(&self.root, &components)?;
        _ = self
            .store
            .put(&path, PutPayload::from(contents))
            .await
            .map_err(|e| RepositoryError::storage(format!("writing {path}"), e))?;

        child_url(&self.location, &components)
    }

    async fn data_files(&self, key: &PartitionKey) -> Result<Vec<String>> {
        self.require_leaf(key)?;
        let dir = object_path(&self.root, &self.components(key)?)?;
        let listing = self
            .store
            .list_with_delimiter(Some(&dir))
            .await
            .map_err(|e| RepositoryError::storage(format!("listing {dir}"), e))?;
        let mut files: Vec<String> = listing
            .objects
            .iter()
            .filter_map(|meta| meta.location.filename().map(str::to_string))
            .filter(|name| !is_hidden(name))
            .collect();
        files.sort();
        Ok(files)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        for good in ["events", "events_2024", "a-b", "X1"] {
            assert!(validate_name(good).is_ok(), "{good}");
        }
        for bad in ["", ".metadata", "_tmp", "a/b", "a b", "café", "a=b"] {
            assert!(matches!(validate_name(bad), Err(RepositoryError::InvalidName(_))), "{bad}");
        }
    }

    #[test]
    fn test_object_path_keeps_encoded_segments() {
        let base = Path::from("warehouse/events");
        let components = ["user=a%2Fb".to_string(), "year=2024".to_string()];
        let path = object_path(&base, &components).unwrap();
        assert_eq!(path.as_ref(), "warehouse/events/user=a%2Fb/year=2024");
        assert_eq!(
            path.parts().map(|p| p.as_ref().to_string()).collect::<Vec<_>>(),
            ["warehouse", "events", "user=a%2Fb", "year=2024"]
        );
        assert_eq!(object_path(&base, &[]).unwrap(), base);
    }

    #[test]
    fn test_child_url_maps_back_to_object_path() {
        let base = Url::parse("memory:///warehouse/events/").unwrap();
        let components = ["user=50%25".to_string(), "f.parquet".to_string()];
        let url = child_url(&base, &components).unwrap();
        assert_eq!(url.as_str(), "memory:///warehouse/events/user=50%2525/f.parquet");
        assert_eq!(
            store_path(&url).unwrap(),
            object_path(&Path::from("warehouse/events"), &components).unwrap()
        );
    }

    #[test]
    fn test_overlaps() {
        let root = Path::from("warehouse");
        assert!(overlaps(&root, &Path::from("warehouse/events")));
        assert!(overlaps(&Path::from("warehouse/events"), &root));
        assert!(overlaps(&root, &root));
        assert!(!overlaps(&Path::from("warehouse/events"), &Path::from("warehouse/events2")));
    }
}
