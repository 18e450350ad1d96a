// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::function::{PartitionFunction, Partitioner, TimeUnit};
use super::value::{KeyType, KeyValue};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One level of a partition strategy
///
/// `source` names the record field read, `name` is the partition name that
/// appears in storage paths (`name=value`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPartitioner {
    pub name: String,
    pub source: String,
    pub function: Partitioner,
}

impl FieldPartitioner {
    pub fn new<N: Into<String>, S: Into<String>>(name: N, source: S, function: Partitioner) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            function,
        }
    }

    /// Partition value for a source field value
    pub fn apply(&self, value: &KeyValue) -> Result<KeyValue> {
        self.function.apply(&self.source, value)
    }

    /// Parse a partition value back from its textual form
    pub fn invert(&self, text: &str) -> Result<KeyValue> {
        self.function.invert(&self.name, text)
    }

    #[must_use]
    pub fn result_type(&self) -> KeyType {
        self.function.result_type()
    }
}

impl fmt::Display for FieldPartitioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) -> {}", self.function, self.source, self.name)
    }
}

/// Ordered rule set mapping record fields to hierarchical path segments
///
/// The order of fields is the order of directories on disk. It must not
/// change once data has been written under a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldPartitioner>", into = "Vec<FieldPartitioner>")]
pub struct PartitionStrategy {
    fields: Vec<FieldPartitioner>,
}

impl PartitionStrategy {
    #[must_use]
    pub fn builder() -> PartitionStrategyBuilder {
        PartitionStrategyBuilder::default()
    }

    /// Build a strategy from field definitions, validating names and
    /// function parameters
    pub fn new(fields: Vec<FieldPartitioner>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::configuration(
                "a partition strategy needs at least one field",
            ));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            validate_partition_name(&field.name)?;
            if field.source.is_empty() {
                return Err(Error::configuration(format!(
                    "partition '{}' has an empty source field",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::configuration(format!(
                    "duplicate partition name '{}'",
                    field.name
                )));
            }
            field.function.validate()?;
        }

        Ok(Self { fields })
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldPartitioner] {
        &self.fields
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldPartitioner> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn validate_partition_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::configuration("partition names may not be empty"));
    }
    if name.contains('/') || name.contains('=') || name.contains('\\') {
        return Err(Error::configuration(format!(
            "partition name '{name}' may not contain '/', '\\' or '='"
        )));
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err(Error::configuration(format!(
            "partition name '{name}' may not start with '.' or '_'"
        )));
    }
    Ok(())
}

impl TryFrom<Vec<FieldPartitioner>> for PartitionStrategy {
    type Error = Error;

    fn try_from(fields: Vec<FieldPartitioner>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<PartitionStrategy> for Vec<FieldPartitioner> {
    fn from(strategy: PartitionStrategy) -> Self {
        strategy.fields
    }
}

impl fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

/// Fluent construction of a [`PartitionStrategy`]
#[derive(Debug, Default, Clone)]
pub struct PartitionStrategyBuilder {
    fields: Vec<FieldPartitioner>,
}

impl PartitionStrategyBuilder {
    #[must_use]
    pub fn field(mut self, field: FieldPartitioner) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn identity(self, source: &str, name: &str, key_type: KeyType) -> Self {
        self.field(FieldPartitioner::new(
            name,
            source,
            Partitioner::Identity { key_type },
        ))
    }

    #[must_use]
    pub fn hash(self, source: &str, name: &str, buckets: u32) -> Self {
        self.field(FieldPartitioner::new(name, source, Partitioner::Hash { buckets }))
    }

    #[must_use]
    pub fn int_range(self, source: &str, name: &str, upper_bounds: &[i64]) -> Self {
        self.field(FieldPartitioner::new(
            name,
            source,
            Partitioner::IntRange {
                upper_bounds: upper_bounds.to_vec(),
            },
        ))
    }

    #[must_use]
    pub fn string_range(self, source: &str, name: &str, upper_bounds: &[&str]) -> Self {
        self.field(FieldPartitioner::new(
            name,
            source,
            Partitioner::StringRange {
                upper_bounds: upper_bounds.iter().map(|s| (*s).to_string()).collect(),
            },
        ))
    }

    #[must_use]
    pub fn time(self, source: &str, name: &str, unit: TimeUnit) -> Self {
        self.field(FieldPartitioner::new(name, source, Partitioner::DateTime { unit }))
    }

    #[must_use]
    pub fn year(self, source: &str, name: &str) -> Self {
        self.time(source, name, TimeUnit::Year)
    }

    #[must_use]
    pub fn month(self, source: &str, name: &str) -> Self {
        self.time(source, name, TimeUnit::Month)
    }

    #[must_use]
    pub fn day(self, source: &str, name: &str) -> Self {
        self.time(source, name, TimeUnit::Day)
    }

    #[must_use]
    pub fn hour(self, source: &str, name: &str) -> Self {
        self.time(source, name, TimeUnit::Hour)
    }

    #[must_use]
    pub fn minute(self, source: &str, name: &str) -> Self {
        self.time(source, name, TimeUnit::Minute)
    }

    pub fn build(self) -> Result<PartitionStrategy> {
        PartitionStrategy::new(self.fields)
    }
}
