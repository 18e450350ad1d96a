// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Built-in repository backends.

mod file;
mod hdfs;
mod memory;

pub use file::FileBackend;
pub use hdfs::{HdfsBackend, StoreBuilder};
pub use memory::MemoryBackend;

use crate::error::{RepositoryError, Result};
use crate::registry::BackendRegistry;
use crate::uri::RepositoryUri;
use percent_encoding::percent_decode_str;

pub const FILE_SCHEME: &str = "file";
pub const HDFS_SCHEME: &str = "hdfs";
pub const MEMORY_SCHEME: &str = "memory";

/// Register the `file`, `hdfs` and `memory` backends
pub fn register_default_backends(registry: &BackendRegistry) {
    _ = registry.register(FILE_SCHEME, FileBackend::new());
    _ = registry.register(HDFS_SCHEME, HdfsBackend::new());
    _ = registry.register(MEMORY_SCHEME, MemoryBackend::new());
}

/// The URI's path with percent escapes removed
fn decoded_path(uri: &RepositoryUri) -> Result<String> {
    percent_decode_str(uri.path())
        .decode_utf8()
        .map(|path| path.into_owned())
        .map_err(|e| RepositoryError::resolution(format!("path of {uri} is not valid UTF-8: {e}")))
}

/// Resolve `.` and `..` in an absolute `/`-separated path
fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                _ = parts.pop();
            }
            part => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}
