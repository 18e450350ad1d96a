// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepositoryError>;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The URI cannot be mapped to a repository
    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Unknown repository scheme '{scheme}' in {uri}")]
    UnknownScheme { scheme: String, uri: String },

    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Dataset already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid dataset name '{0}': use letters, digits, '_' and '-', not starting with '.' or '_'")]
    InvalidName(String),

    #[error("Incompatible dataset change: {0}")]
    Incompatible(String),

    #[error("Storage error ({context}): {source}")]
    Storage {
        context: String,
        #[source]
        source: object_store::Error,
    },

    #[error(transparent)]
    Dataset(#[from] dataset::Error),

    #[error("Metadata serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn resolution<S: Into<String>>(message: S) -> Self {
        RepositoryError::Resolution(message.into())
    }

    pub fn storage<C: Into<String>>(context: C, source: object_store::Error) -> Self {
        RepositoryError::Storage {
            context: context.into(),
            source,
        }
    }

    /// Unknown schemes and URIs a backend cannot qualify
    #[must_use]
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            RepositoryError::Resolution(_) | RepositoryError::UnknownScheme { .. }
        )
    }

    #[must_use]
    pub fn is_layout_mismatch(&self) -> bool {
        matches!(self, RepositoryError::Dataset(e) if e.is_layout_mismatch())
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }
}
