// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::api::DatasetRepository;
use crate::backends::register_default_backends;
use crate::error::{RepositoryError, Result};
use crate::registry::BackendRegistry;
use crate::uri::RepositoryUri;
use dataset::Configuration;
use std::sync::Arc;

/// Opens repositories from `repo:` URIs using a registry of backends and
/// an ambient configuration
#[derive(Debug, Clone)]
pub struct DatasetRepositories {
    registry: Arc<BackendRegistry>,
    conf: Arc<Configuration>,
}

impl DatasetRepositories {
    #[must_use]
    pub fn new(registry: Arc<BackendRegistry>, conf: Configuration) -> Self {
        Self {
            registry,
            conf: Arc::new(conf),
        }
    }

    /// A resolver over a fresh registry holding the built-in backends
    #[must_use]
    pub fn with_default_backends(conf: Configuration) -> Self {
        let registry = BackendRegistry::new();
        register_default_backends(&registry);
        Self::new(Arc::new(registry), conf)
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.conf
    }

    pub fn open(&self, uri: &str) -> Result<Arc<dyn DatasetRepository>> {
        self.open_uri(&RepositoryUri::parse(uri)?)
    }

    /// Dispatch to the backend registered for the URI's scheme
    pub fn open_uri(&self, uri: &RepositoryUri) -> Result<Arc<dyn DatasetRepository>> {
        let factory = self
            .registry
            .get(uri.scheme())
            .ok_or_else(|| RepositoryError::UnknownScheme {
                scheme: uri.scheme().to_string(),
                uri: uri.to_string(),
            })?;
        let repository = factory.open(uri, &self.conf)?;
        diagnostics::log_info!("Opened repository {uri} at {root}",
            uri: uri.as_str(),
            root: repository.location().as_str());
        Ok(repository)
    }
}
