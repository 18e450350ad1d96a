// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{decoded_path, normalize_path};
use crate::api::DatasetRepository;
use crate::error::{RepositoryError, Result};
use crate::filesystem::FileSystemDatasetRepository;
use crate::registry::BackendFactory;
use crate::uri::RepositoryUri;
use dataset::Configuration;
use object_store::memory::InMemory;
use std::sync::Arc;
use url::Url;

/// In-process repositories, `repo:memory:/path`
///
/// Every repository opened through one backend shares the same store, so
/// reopening a URI sees earlier writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<InMemory>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<InMemory> {
        &self.store
    }
}

impl BackendFactory for MemoryBackend {
    fn open(&self, uri: &RepositoryUri, _conf: &Configuration) -> Result<Arc<dyn DatasetRepository>> {
        if let Some(authority) = uri.explicit_authority() {
            return Err(RepositoryError::resolution(format!(
                "memory repository {uri} cannot name an authority ('{authority}')"
            )));
        }
        let path = normalize_path(&format!("/{}", decoded_path(uri)?));
        let mut root = Url::parse("memory:///").map_err(dataset::Error::from)?;
        root.set_path(&path);
        Ok(Arc::new(FileSystemDatasetRepository::new(
            self.store.clone(),
            root,
        )?))
    }
}
