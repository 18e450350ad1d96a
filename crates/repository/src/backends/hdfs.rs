// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{HDFS_SCHEME, decoded_path, normalize_path};
use crate::api::DatasetRepository;
use crate::error::{RepositoryError, Result};
use crate::filesystem::FileSystemDatasetRepository;
use crate::registry::BackendFactory;
use crate::uri::RepositoryUri;
use dataset::Configuration;
use dataset::config::{DEFAULT_FS_KEY, HDFS_USER_KEY};
use object_store::ObjectStore;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Creates the object store for a qualified `hdfs://authority` URL
pub type StoreBuilder =
    Arc<dyn Fn(&Url, &Configuration) -> object_store::Result<Arc<dyn ObjectStore>> + Send + Sync>;

/// HDFS repositories
///
/// `repo:hdfs://host:port/path` names its namenode; `repo:hdfs:/path` uses
/// the configured `fs.defaultFS`; relative paths are qualified against the
/// user's home directory `/user/<name>`.
#[derive(Clone)]
pub struct HdfsBackend {
    store_builder: Option<StoreBuilder>,
}

impl fmt::Debug for HdfsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdfsBackend")
            .field("store_builder", &self.store_builder.is_some())
            .finish()
    }
}

impl Default for HdfsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HdfsBackend {
    /// A backend using the native HDFS client when built with the `hdfs`
    /// feature
    #[must_use]
    pub fn new() -> Self {
        Self {
            store_builder: native_store_builder(),
        }
    }

    #[must_use]
    pub fn with_store_builder(store_builder: StoreBuilder) -> Self {
        Self {
            store_builder: Some(store_builder),
        }
    }

    /// The fully qualified `hdfs://authority/path` a URI names
    pub fn qualify(&self, uri: &RepositoryUri, conf: &Configuration) -> Result<Url> {
        let authority = match uri.explicit_authority() {
            Some(authority) => authority.to_string(),
            None => default_authority(conf)?,
        };

        let path = decoded_path(uri)?;
        let absolute = if uri.is_relative() {
            let user = conf
                .get(HDFS_USER_KEY)
                .map(str::to_string)
                .or_else(|| std::env::var("USER").ok())
                .ok_or_else(|| {
                    RepositoryError::resolution(format!(
                        "cannot qualify relative HDFS path '{path}': set {HDFS_USER_KEY}"
                    ))
                })?;
            diagnostics::log_debug!("Qualifying {path} against the home of {user}",
                path: path.as_str(),
                user: user.as_str());
            format!("/user/{user}/{path}")
        } else {
            path
        };

        let mut url = Url::parse(&format!("{HDFS_SCHEME}://{authority}")).map_err(|e| {
            RepositoryError::resolution(format!("invalid HDFS authority '{authority}': {e}"))
        })?;
        url.set_path(&normalize_path(&absolute));
        Ok(url)
    }
}

fn default_authority(conf: &Configuration) -> Result<String> {
    let default_fs = conf.default_fs().ok_or_else(|| {
        RepositoryError::resolution(format!(
            "no HDFS namenode in the URI and {DEFAULT_FS_KEY} is not configured"
        ))
    })?;
    let url = Url::parse(default_fs).map_err(|e| {
        RepositoryError::resolution(format!("{DEFAULT_FS_KEY} '{default_fs}' is not a URI: {e}"))
    })?;
    if url.scheme() != HDFS_SCHEME || url.authority().is_empty() {
        return Err(RepositoryError::resolution(format!(
            "{DEFAULT_FS_KEY} '{default_fs}' is not an hdfs:// URI with a namenode"
        )));
    }
    diagnostics::log_debug!("Using {key} {authority}", key: DEFAULT_FS_KEY, authority: url.authority());
    Ok(url.authority().to_string())
}

#[cfg(feature = "hdfs")]
fn native_store_builder() -> Option<StoreBuilder> {
    use hdfs_native_object_store::HdfsObjectStore;
    use std::collections::HashMap;

    let builder: StoreBuilder = Arc::new(
        |url: &Url, conf: &Configuration| -> object_store::Result<Arc<dyn ObjectStore>> {
            let options: HashMap<String, String> = conf
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let store = HdfsObjectStore::with_config(url.as_str(), options)?;
            Ok(Arc::new(store))
        },
    );
    Some(builder)
}

#[cfg(not(feature = "hdfs"))]
fn native_store_builder() -> Option<StoreBuilder> {
    None
}

impl BackendFactory for HdfsBackend {
    fn open(&self, uri: &RepositoryUri, conf: &Configuration) -> Result<Arc<dyn DatasetRepository>> {
        let root = self.qualify(uri, conf)?;
        let Some(store_builder) = &self.store_builder else {
            return Err(RepositoryError::resolution(format!(
                "cannot open {root}: HDFS support is not enabled in this build"
            )));
        };
        let mut namenode = root.clone();
        namenode.set_path("/");
        let store = store_builder(&namenode, conf)
            .map_err(|e| RepositoryError::resolution(format!("cannot connect to {namenode}: {e}")))?;
        Ok(Arc::new(FileSystemDatasetRepository::new(store, root)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qualify(uri: &str, conf: &Configuration) -> Result<Url> {
        HdfsBackend::new().qualify(&RepositoryUri::parse(uri).unwrap(), conf)
    }

    #[test]
    fn test_explicit_authority() {
        let url = qualify("repo:hdfs://nn:8020/data/events", &Configuration::new()).unwrap();
        assert_eq!(url.as_str(), "hdfs://nn:8020/data/events");
    }

    #[test]
    fn test_default_fs() {
        let conf = Configuration::new().with(DEFAULT_FS_KEY, "hdfs://namenode:9000");
        let url = qualify("repo:hdfs:/data", &conf).unwrap();
        assert_eq!(url.as_str(), "hdfs://namenode:9000/data");

        // `hdfs:///path` also means the default namenode
        let url = qualify("repo:hdfs:///data", &conf).unwrap();
        assert_eq!(url.as_str(), "hdfs://namenode:9000/data");
    }

    #[test]
    fn test_missing_default_fs() {
        let err = qualify("repo:hdfs:/data", &Configuration::new()).unwrap_err();
        assert!(err.is_resolution());
        assert!(err.to_string().contains(DEFAULT_FS_KEY));
    }

    #[test]
    fn test_default_fs_must_be_hdfs() {
        for value in ["file:///", "hdfs:///no-authority", "not a uri"] {
            let conf = Configuration::new().with(DEFAULT_FS_KEY, value);
            let err = qualify("repo:hdfs:/data", &conf).unwrap_err();
            assert!(err.is_resolution(), "{value}");
        }
    }

    #[test]
    fn test_relative_path_uses_home() {
        let conf = Configuration::new()
            .with(DEFAULT_FS_KEY, "hdfs://nn:8020")
            .with(HDFS_USER_KEY, "alice");
        let url = qualify("repo:hdfs:events/2024", &conf).unwrap();
        assert_eq!(url.as_str(), "hdfs://nn:8020/user/alice/events/2024");
    }
}
