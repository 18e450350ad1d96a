// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Parsing of `repo:<scheme>:<scheme-specific-part>` URIs.
//!
//! The inner part is split by hand rather than with `url::Url` because
//! the URL parser would turn `file:relative/path` into an absolute path
//! before a backend has a chance to qualify it.

use crate::error::{RepositoryError, Result};
use std::fmt;
use std::str::FromStr;

const OUTER_SCHEME: &str = "repo";

/// A parsed repository URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUri {
    raw: String,
    scheme: String,
    authority: Option<String>,
    path: String,
    query: Option<String>,
}

impl RepositoryUri {
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        let inner = match uri.split_once(':') {
            Some((outer, inner)) if outer.eq_ignore_ascii_case(OUTER_SCHEME) => inner,
            _ => {
                return Err(RepositoryError::resolution(format!(
                    "'{uri}' is not a repository URI (expected repo:<scheme>:<location>)"
                )));
            }
        };

        let Some((scheme, rest)) = inner.split_once(':') else {
            return Err(RepositoryError::resolution(format!(
                "'{uri}' has no backend scheme"
            )));
        };
        if !valid_scheme(scheme) {
            return Err(RepositoryError::resolution(format!(
                "'{scheme}' in '{uri}' is not a valid scheme"
            )));
        }

        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
        let (rest, query) = match rest.split_once('?') {
            Some((before, query)) => (before, Some(query.to_string())),
            None => (rest, None),
        };
        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                (Some(after[..end].to_string()), after[end..].to_string())
            }
            None => (None, rest.to_string()),
        };

        Ok(Self {
            raw: uri.to_string(),
            scheme: scheme.to_string(),
            authority,
            path,
            query,
        })
    }

    /// The backend scheme token, exactly as written
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// `Some("")` for `scheme:///path`, `None` for `scheme:/path`
    #[must_use]
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// The authority unless it is absent or empty
    #[must_use]
    pub fn explicit_authority(&self) -> Option<&str> {
        self.authority().filter(|a| !a.is_empty())
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.authority.is_none() && !self.path.starts_with('/')
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl FromStr for RepositoryUri {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepositoryUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        let uri = RepositoryUri::parse("repo:file:data/events").unwrap();
        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.authority(), None);
        assert_eq!(uri.path(), "data/events");
        assert!(uri.is_relative());
    }

    #[test]
    fn test_absolute_path() {
        let uri = RepositoryUri::parse("repo:file:/tmp/data").unwrap();
        assert_eq!(uri.path(), "/tmp/data");
        assert!(!uri.is_relative());
    }

    #[test]
    fn test_authority() {
        let uri = RepositoryUri::parse("repo:hdfs://namenode:8020/data?replication=2").unwrap();
        assert_eq!(uri.scheme(), "hdfs");
        assert_eq!(uri.explicit_authority(), Some("namenode:8020"));
        assert_eq!(uri.path(), "/data");
        assert_eq!(uri.query(), Some("replication=2"));

        let uri = RepositoryUri::parse("repo:file:///tmp/data").unwrap();
        assert_eq!(uri.authority(), Some(""));
        assert_eq!(uri.explicit_authority(), None);
        assert_eq!(uri.path(), "/tmp/data");
    }

    #[test]
    fn test_outer_scheme_is_case_insensitive() {
        let uri = RepositoryUri::parse("REPO:file:/x").unwrap();
        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.to_string(), "REPO:file:/x");
    }

    #[test]
    fn test_invalid() {
        for bad in ["file:/x", "repo:", "repo:nocolon", "repo:1x:/y", "repo::/y", "/tmp/x"] {
            let err = RepositoryUri::parse(bad).unwrap_err();
            assert!(err.is_resolution(), "{bad}");
        }
    }
}
