// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Dataset repositories addressed by `repo:<scheme>:<location>` URIs.
//!
//! ```no_run
//! # async fn demo() -> repository::Result<()> {
//! use repository::DatasetRepositories;
//!
//! let repos = DatasetRepositories::with_default_backends(dataset::Configuration::from_env()?);
//! let repo = repos.open("repo:file:warehouse")?;
//! for name in repo.list().await? {
//!     let dataset = repo.load(&name).await?;
//!     println!("{name}: {}", dataset.descriptor());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod backends;
pub mod error;
pub mod filesystem;
pub mod metadata;
pub mod registry;
pub mod resolver;
pub mod uri;

pub use api::{Dataset, DatasetRepository};
pub use backends::{FileBackend, HdfsBackend, MemoryBackend, register_default_backends};
pub use error::{RepositoryError, Result};
pub use filesystem::{FileSystemDataset, FileSystemDatasetRepository};
pub use metadata::{FileSystemMetadataProvider, MetadataProvider};
pub use registry::{BackendFactory, BackendRegistry};
pub use resolver::DatasetRepositories;
pub use uri::RepositoryUri;
