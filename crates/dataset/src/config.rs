// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Key/value configuration shared by descriptors and repository backends.
//!
//! A `Configuration` is both the opaque backend handle a descriptor may
//! carry and the ambient context the resolver hands to backend factories.
//! Keys follow the dotted naming used by distributed filesystems:
//!
//! ```yaml
//! fs.defaultFS: hdfs://namenode:8020
//! hdfs.user: etl
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default distributed filesystem service, e.g. `hdfs://namenode:8020`
pub const DEFAULT_FS_KEY: &str = "fs.defaultFS";

/// User whose home directory qualifies relative HDFS paths
pub const HDFS_USER_KEY: &str = "hdfs.user";

/// Names a YAML file to load as the ambient configuration
pub const CONF_ENV: &str = "DSREPO_CONF";

/// Overrides `fs.defaultFS` in the ambient configuration
pub const DEFAULT_FS_ENV: &str = "DSREPO_DEFAULT_FS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    properties: BTreeMap<String, String>,
}

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> Option<String> {
        self.properties.insert(key.into(), value.into())
    }

    /// Builder-style `set`
    #[must_use]
    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        _ = self.set(key, value);
        self
    }

    #[must_use]
    pub fn default_fs(&self) -> Option<&str> {
        self.get(DEFAULT_FS_KEY).filter(|v| !v.trim().is_empty())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy every property of `other` into this configuration, replacing
    /// existing values
    pub fn merge(&mut self, other: &Configuration) {
        for (k, v) in other.iter() {
            _ = self.set(k, v);
        }
    }

    /// Parse a flat YAML mapping of string keys to scalar values
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: BTreeMap<String, serde_yaml_ng::Value> = serde_yaml_ng::from_str(text)?;
        let mut conf = Self::default();
        for (key, value) in raw {
            let value = match value {
                serde_yaml_ng::Value::String(s) => s,
                serde_yaml_ng::Value::Number(n) => n.to_string(),
                serde_yaml_ng::Value::Bool(b) => b.to_string(),
                serde_yaml_ng::Value::Null => String::new(),
                _ => {
                    return Err(Error::configuration(format!(
                        "configuration key '{key}' must have a scalar value"
                    )));
                }
            };
            _ = conf.set(key, value);
        }
        Ok(conf)
    }

    /// Load a YAML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::File {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Build the ambient configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the ambient configuration from an arbitrary variable lookup
    ///
    /// `DSREPO_CONF` names a YAML file loaded first; `DSREPO_DEFAULT_FS`
    /// then overrides `fs.defaultFS`. Nothing set yields an empty
    /// configuration.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut conf = match lookup(CONF_ENV).filter(|p| !p.is_empty()) {
            Some(path) => {
                diagnostics::log_debug!("Loading configuration from {path}", path: path.as_str());
                Self::load(path)?
            }
            None => Self::default(),
        };

        if let Some(default_fs) = lookup(DEFAULT_FS_ENV).filter(|v| !v.is_empty()) {
            _ = conf.set(DEFAULT_FS_KEY, default_fs);
        }

        Ok(conf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_yaml_scalars() {
        let conf = Configuration::from_yaml(
            "fs.defaultFS: hdfs://nn:8020\nreplication: 3\nsecure: false\n",
        )
        .unwrap();
        assert_eq!(conf.default_fs(), Some("hdfs://nn:8020"));
        assert_eq!(conf.get("replication"), Some("3"));
        assert_eq!(conf.get("secure"), Some("false"));
    }

    #[test]
    fn test_yaml_rejects_nested_values() {
        let err = Configuration::from_yaml("fs:\n  defaultFS: x\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_environment_is_empty() {
        let conf = Configuration::from_lookup(|_| None).unwrap();
        assert!(conf.is_empty());
        assert_eq!(conf.default_fs(), None);
    }

    #[test]
    fn test_environment_layering() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("site.yaml");
        std::fs::write(&file, "fs.defaultFS: hdfs://from-file:8020\nhdfs.user: etl\n").unwrap();

        let vars: HashMap<&str, String> = HashMap::from([
            (CONF_ENV, file.display().to_string()),
            (DEFAULT_FS_ENV, "hdfs://override:9000".to_string()),
        ]);
        let conf = Configuration::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(conf.default_fs(), Some("hdfs://override:9000"));
        assert_eq!(conf.get(HDFS_USER_KEY), Some("etl"));
    }

    #[test]
    fn test_blank_default_fs_is_absent() {
        let conf = Configuration::new().with(DEFAULT_FS_KEY, "  ");
        assert_eq!(conf.default_fs(), None);
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = Configuration::new().with("a", "1").with("b", "2");
        base.merge(&Configuration::new().with("b", "3"));
        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.get("b"), Some("3"));
    }
}
