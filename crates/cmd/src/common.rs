// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result, anyhow, bail};
use dataset::{Configuration, FieldPartitioner, KeyType, Partitioner, TimeUnit};
use repository::{DatasetRepositories, DatasetRepository};
use std::path::PathBuf;
use std::sync::Arc;

/// The repository a command operates on
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub uri: String,
    pub conf: Configuration,
}

impl RepoContext {
    #[must_use]
    pub fn new(uri: impl Into<String>, conf: Configuration) -> Self {
        Self {
            uri: uri.into(),
            conf,
        }
    }

    /// Ambient configuration from the environment, overlaid with an
    /// optional `--conf` file
    pub fn from_args(uri: impl Into<String>, conf_file: Option<PathBuf>) -> Result<Self> {
        let mut conf = Configuration::from_env().context("Failed to load configuration")?;
        if let Some(path) = conf_file {
            let overlay = Configuration::load(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            conf.merge(&overlay);
        }
        Ok(Self::new(uri, conf))
    }

    pub fn open(&self) -> Result<Arc<dyn DatasetRepository>> {
        let resolver = DatasetRepositories::with_default_backends(self.conf.clone());
        resolver
            .open(&self.uri)
            .with_context(|| format!("Failed to open repository {}", self.uri))
    }
}

/// Parse `function:source:name[:arg]`
///
/// ```text
/// identity:user:user[:string|int|bool]
/// hash:id:id_bucket:16
/// int_range:size:size_class:10,100,1000
/// string_range:name:initial:g,n,z
/// year:ts:year   (also month, day, hour, minute)
/// ```
pub fn parse_partition_spec(spec: &str) -> Result<FieldPartitioner> {
    let parts: Vec<&str> = spec.splitn(4, ':').collect();
    let [function, source, name, rest @ ..] = parts.as_slice() else {
        bail!("Partition spec '{spec}' must look like function:source:name[:arg]");
    };
    let arg = rest.first().copied();

    let partitioner = match (*function, arg) {
        ("identity", arg) => {
            let type_name = arg.unwrap_or("string");
            let key_type = KeyType::from_name(type_name)
                .ok_or_else(|| anyhow!("Unknown key type '{type_name}' in '{spec}'"))?;
            Partitioner::Identity { key_type }
        }
        ("hash", Some(buckets)) => Partitioner::Hash {
            buckets: buckets
                .parse()
                .with_context(|| format!("Bucket count '{buckets}' in '{spec}' is not a number"))?,
        },
        ("int_range", Some(bounds)) => Partitioner::IntRange {
            upper_bounds: bounds
                .split(',')
                .map(|b| b.trim().parse::<i64>())
                .collect::<Result<_, _>>()
                .with_context(|| format!("Range bounds in '{spec}' must be integers"))?,
        },
        ("string_range", Some(bounds)) => Partitioner::StringRange {
            upper_bounds: bounds.split(',').map(str::to_string).collect(),
        },
        ("year", None) => Partitioner::DateTime { unit: TimeUnit::Year },
        ("month", None) => Partitioner::DateTime { unit: TimeUnit::Month },
        ("day", None) => Partitioner::DateTime { unit: TimeUnit::Day },
        ("hour", None) => Partitioner::DateTime { unit: TimeUnit::Hour },
        ("minute", None) => Partitioner::DateTime { unit: TimeUnit::Minute },
        ("hash" | "int_range" | "string_range", None) => {
            bail!("Partition function '{function}' in '{spec}' needs an argument")
        }
        (_, Some(_)) if is_time_unit(function) => {
            bail!("Partition function '{function}' in '{spec}' takes no argument")
        }
        _ => bail!("Unknown partition function '{function}' in '{spec}'"),
    };
    Ok(FieldPartitioner::new(*name, *source, partitioner))
}

fn is_time_unit(function: &str) -> bool {
    matches!(function, "year" | "month" | "day" | "hour" | "minute")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partition_specs() {
        let field = parse_partition_spec("identity:user:user").unwrap();
        assert_eq!(field.source, "user");
        assert_eq!(field.function, Partitioner::Identity { key_type: KeyType::String });

        let field = parse_partition_spec("identity:shard:shard:int").unwrap();
        assert_eq!(field.function, Partitioner::Identity { key_type: KeyType::Int });

        let field = parse_partition_spec("hash:id:id_bucket:16").unwrap();
        assert_eq!(field.name, "id_bucket");
        assert_eq!(field.function, Partitioner::Hash { buckets: 16 });

        let field = parse_partition_spec("int_range:size:size_class:10, 100,1000").unwrap();
        assert_eq!(field.function, Partitioner::IntRange { upper_bounds: vec![10, 100, 1000] });

        let field = parse_partition_spec("year:ts:year").unwrap();
        assert_eq!(field.function, Partitioner::DateTime { unit: TimeUnit::Year });
    }

    #[test]
    fn test_invalid_partition_specs() {
        for spec in [
            "year:ts",
            "hash:id:bucket",
            "hash:id:bucket:many",
            "identity:a:a:float",
            "month:ts:month:3",
            "bogus:a:b",
            "int_range:a:b:1,x",
        ] {
            assert!(parse_partition_spec(spec).is_err(), "{spec}");
        }
    }
}
