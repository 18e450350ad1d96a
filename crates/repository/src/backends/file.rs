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
use object_store::local::LocalFileSystem;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Local filesystem repositories: `repo:file:/abs`, `repo:file:///abs`,
/// `repo:file://localhost/abs` and `repo:file:relative`
#[derive(Debug, Clone, Default)]
pub struct FileBackend {
    base_dir: Option<PathBuf>,
}

impl FileBackend {
    /// Relative paths are qualified against the process working directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative paths are qualified against `base_dir`
    #[must_use]
    pub fn with_base_dir<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn base_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().map_err(|e| {
                RepositoryError::resolution(format!("cannot determine the working directory: {e}"))
            }),
        }
    }

    /// The absolute, normalized local path a URI names
    pub fn qualify(&self, uri: &RepositoryUri) -> Result<PathBuf> {
        if let Some(host) = uri.explicit_authority()
            && host != "localhost"
        {
            return Err(RepositoryError::resolution(format!(
                "file repository {uri} names remote host '{host}'"
            )));
        }

        let path = decoded_path(uri)?;
        let absolute = if uri.is_relative() {
            let base = self.base_dir()?;
            diagnostics::log_debug!("Qualifying {path} against {base}",
                path: path.as_str(),
                base: base.display().to_string());
            base.join(&path).to_string_lossy().into_owned()
        } else {
            path
        };
        Ok(PathBuf::from(normalize_path(&absolute)))
    }
}

impl BackendFactory for FileBackend {
    fn open(&self, uri: &RepositoryUri, _conf: &Configuration) -> Result<Arc<dyn DatasetRepository>> {
        let root = self.qualify(uri)?;
        let root_url = Url::from_file_path(&root).map_err(|()| {
            RepositoryError::resolution(format!("{} is not an absolute path", root.display()))
        })?;
        let store = Arc::new(LocalFileSystem::new().with_automatic_cleanup(true));
        Ok(Arc::new(FileSystemDatasetRepository::new(store, root_url)?))
    }
}
