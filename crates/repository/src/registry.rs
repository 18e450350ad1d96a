// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Scheme-keyed table of repository backends.

use crate::api::DatasetRepository;
use crate::error::Result;
use crate::uri::RepositoryUri;
use dashmap::DashMap;
use dataset::Configuration;
use std::fmt::Debug;
use std::sync::Arc;

/// Produces repositories for URIs of one scheme
///
/// `open` qualifies the URI (relative paths, default authorities) using the
/// ambient configuration and fails with a resolution error when it cannot.
/// Opening performs no storage I/O.
pub trait BackendFactory: Send + Sync + Debug {
    fn open(&self, uri: &RepositoryUri, conf: &Configuration) -> Result<Arc<dyn DatasetRepository>>;
}

/// Concurrent map from scheme token to backend factory
///
/// Registration may happen at any time from any thread; the last
/// registration for a scheme wins.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    factories: DashMap<String, Arc<dyn BackendFactory>>,
}

impl BackendRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `scheme`, returning the factory it replaced
    pub fn register<S, F>(&self, scheme: S, factory: F) -> Option<Arc<dyn BackendFactory>>
    where
        S: Into<String>,
        F: BackendFactory + 'static,
    {
        self.register_arc(scheme, Arc::new(factory))
    }

    pub fn register_arc<S: Into<String>>(
        &self,
        scheme: S,
        factory: Arc<dyn BackendFactory>,
    ) -> Option<Arc<dyn BackendFactory>> {
        let scheme = scheme.into();
        diagnostics::log_debug!("Registering backend for scheme {scheme}", scheme: scheme.as_str());
        self.factories.insert(scheme, factory)
    }

    /// Exact, case-sensitive lookup
    #[must_use]
    pub fn get(&self, scheme: &str) -> Option<Arc<dyn BackendFactory>> {
        self.factories.get(scheme).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn contains(&self, scheme: &str) -> bool {
        self.factories.contains_key(scheme)
    }

    /// Registered schemes, sorted
    #[must_use]
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        schemes.sort();
        schemes
    }
}
