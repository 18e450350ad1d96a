// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Storage formats known to dataset descriptors.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The on-disk encoding of a dataset's records
///
/// Encoding itself is handled elsewhere; a descriptor only records which
/// format its files use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Avro,
    Parquet,
}

const KNOWN_FORMATS: [Format; 2] = [Format::Avro, Format::Parquet];

impl Format {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Format::Avro => "avro",
            Format::Parquet => "parquet",
        }
    }

    /// All registered formats, default first
    #[must_use]
    pub fn known() -> &'static [Format] {
        &KNOWN_FORMATS
    }

    /// Look up a format by its exact name
    pub fn from_name(name: &str) -> Result<Format> {
        KNOWN_FORMATS
            .iter()
            .find(|format| format.name() == name)
            .copied()
            .ok_or_else(|| Error::UnknownFormat {
                name: name.to_string(),
                known: KNOWN_FORMATS.iter().map(Format::name).collect(),
            })
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Format::from_name(s)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_avro() {
        assert_eq!(Format::default(), Format::Avro);
        assert_eq!(Format::known()[0], Format::default());
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(Format::from_name("parquet").unwrap(), Format::Parquet);
        assert_eq!("avro".parse::<Format>().unwrap(), Format::Avro);
    }

    #[test]
    fn test_unknown_format_lists_known_names() {
        let err = Format::from_name("orc").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Unknown format 'orc' (known formats: avro, parquet)"
        );
    }

    #[test]
    fn test_lookup_is_exact() {
        assert!(Format::from_name("Parquet").is_err());
        assert!(Format::from_name("").is_err());
    }

    #[test]
    fn test_serde_uses_name() {
        assert_eq!(serde_json::to_string(&Format::Parquet).unwrap(), "\"parquet\"");
        let parsed: Format = serde_json::from_str("\"avro\"").unwrap();
        assert_eq!(parsed, Format::Avro);
    }
}
