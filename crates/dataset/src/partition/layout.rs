// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Mapping between records and hierarchical partition paths.
//!
//! A record is laid out under one directory per strategy field, in
//! strategy order, each named `partition=value`:
//!
//! ```text
//! year=2024/month=3/id_bucket=11
//! ```
//!
//! Values are percent-encoded so that any string survives as a single
//! path component. Null is written as `__null__`; a real value whose
//! encoding would collide with that sentinel has its first `_` escaped
//! (`%5F_null__`). The empty string is an empty value (`name=`).
//! Decoding reverses exactly these rules, so for every value the forward
//! mapping produces, reading the path back yields the same value.

use super::record::Record;
use super::strategy::{FieldPartitioner, PartitionStrategy};
use super::value::KeyValue;
use crate::error::{Error, Result};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored form of a null partition value
pub const NULL_VALUE: &str = "__null__";

const SEGMENT_ESCAPES: &AsciiSet = &CONTROLS
    .add(b'%')
    .add(b'/')
    .add(b'\\')
    .add(b'=')
    .add(b':')
    .add(b'#')
    .add(b'?')
    .add(b'*')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'|');

/// Encode a partition value for use inside a path component
#[must_use]
pub fn encode_value(value: &KeyValue) -> String {
    let Some(text) = value.to_text() else {
        return NULL_VALUE.to_string();
    };
    let encoded = utf8_percent_encode(&text, SEGMENT_ESCAPES).to_string();
    if encoded == NULL_VALUE {
        format!("%5F{}", &encoded[1..])
    } else {
        encoded
    }
}

/// Decode a value written by [`encode_value`] using the field's inverse
pub fn decode_value(field: &FieldPartitioner, text: &str) -> Result<KeyValue> {
    if text == NULL_VALUE {
        return Ok(KeyValue::Null);
    }
    let decoded = percent_decode_str(text)
        .decode_utf8()
        .map_err(|e| Error::invalid_key(&field.name, format!("'{text}' is not valid UTF-8: {e}")))?;
    field.invert(&decoded)
}

/// The ordered partition values of one partition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionKey {
    values: Vec<KeyValue>,
}

impl PartitionKey {
    #[must_use]
    pub fn new(values: Vec<KeyValue>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn values(&self) -> &[KeyValue] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&KeyValue> {
        self.values.get(index)
    }

    /// True when `prefix` equals the first `prefix.len()` values
    #[must_use]
    pub fn starts_with(&self, prefix: &[KeyValue]) -> bool {
        self.values.starts_with(prefix)
    }

    #[must_use]
    pub fn into_values(self) -> Vec<KeyValue> {
        self.values
    }
}

impl From<Vec<KeyValue>> for PartitionKey {
    fn from(values: Vec<KeyValue>) -> Self {
        Self::new(values)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("]")
    }
}

/// Named partition values in strategy order, as laid out on storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutPath {
    segments: Vec<(String, KeyValue)>,
}

impl LayoutPath {
    #[must_use]
    pub fn segments(&self) -> &[(String, KeyValue)] {
        &self.segments
    }

    #[must_use]
    pub fn key(&self) -> PartitionKey {
        PartitionKey::new(self.segments.iter().map(|(_, v)| v.clone()).collect())
    }

    /// Encoded path components, one per strategy field
    #[must_use]
    pub fn components(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|(name, value)| format!("{name}={}", encode_value(value)))
            .collect()
    }

    /// Relative directory path, e.g. `year=2024/month=3`
    #[must_use]
    pub fn to_path_string(&self) -> String {
        self.components().join("/")
    }
}

impl fmt::Display for LayoutPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_string())
    }
}

fn split_components(path: &str) -> Vec<&str> {
    path.split('/').filter(|c| !c.is_empty()).collect()
}

impl PartitionStrategy {
    /// Partition values for a record, in strategy order
    pub fn key_for<R: Record + ?Sized>(&self, record: &R) -> Result<PartitionKey> {
        let values = self
            .fields()
            .iter()
            .map(|field| field.apply(&record.value(&field.source)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(PartitionKey::new(values))
    }

    /// Layout path a record's data belongs under
    pub fn to_path<R: Record + ?Sized>(&self, record: &R) -> Result<LayoutPath> {
        let key = self.key_for(record)?;
        self.path_for_key(&key)
    }

    /// Layout path of an explicit, complete partition key
    pub fn path_for_key(&self, key: &PartitionKey) -> Result<LayoutPath> {
        if key.len() != self.field_count() {
            return Err(Error::LayoutMismatch {
                path: key.to_string(),
                expected: self.field_count(),
                found: key.len(),
            });
        }
        self.named_segments(key.values())
    }

    /// Layout path of a key prefix (a non-leaf directory)
    pub fn path_for_prefix(&self, prefix: &[KeyValue]) -> Result<LayoutPath> {
        if prefix.len() > self.field_count() {
            return Err(Error::LayoutMismatch {
                path: PartitionKey::new(prefix.to_vec()).to_string(),
                expected: self.field_count(),
                found: prefix.len(),
            });
        }
        self.named_segments(prefix)
    }

    fn named_segments(&self, values: &[KeyValue]) -> Result<LayoutPath> {
        let segments = self
            .fields()
            .iter()
            .zip(values)
            .map(|(field, value)| {
                if let Some(key_type) = value.key_type()
                    && key_type != field.result_type()
                {
                    return Err(Error::invalid_key(
                        &field.name,
                        format!("expected a {} value, found {value}", field.result_type()),
                    ));
                }
                Ok((field.name.clone(), value.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(LayoutPath { segments })
    }

    /// Encoded `name=value` component for the field at `depth`
    pub fn segment(&self, depth: usize, value: &KeyValue) -> Result<String> {
        let field = self.field_at(depth)?;
        Ok(format!("{}={}", field.name, encode_value(value)))
    }

    /// Parse the path component found at `depth`
    pub fn parse_segment(&self, depth: usize, segment: &str) -> Result<KeyValue> {
        let field = self.field_at(depth)?;
        match segment.split_once('=') {
            Some((name, value)) if name == field.name => decode_value(field, value),
            _ => Err(Error::SegmentMismatch {
                expected: field.name.clone(),
                segment: segment.to_string(),
            }),
        }
    }

    fn field_at(&self, depth: usize) -> Result<&FieldPartitioner> {
        self.fields().get(depth).ok_or_else(|| Error::LayoutMismatch {
            path: format!("depth {depth}"),
            expected: self.field_count(),
            found: depth + 1,
        })
    }

    /// Recover the partition key of a leaf partition directory
    ///
    /// The path must have exactly one component per strategy field.
    pub fn from_path(&self, path: &str) -> Result<PartitionKey> {
        let components = split_components(path);
        if components.len() != self.field_count() {
            return Err(Error::LayoutMismatch {
                path: path.to_string(),
                expected: self.field_count(),
                found: components.len(),
            });
        }
        self.parse_components(&components)
    }

    /// Recover the leading partition values of a (possibly non-leaf)
    /// partition directory
    pub fn from_partial_path(&self, path: &str) -> Result<PartitionKey> {
        let components = split_components(path);
        if components.len() > self.field_count() {
            return Err(Error::LayoutMismatch {
                path: path.to_string(),
                expected: self.field_count(),
                found: components.len(),
            });
        }
        self.parse_components(&components)
    }

    fn parse_components(&self, components: &[&str]) -> Result<PartitionKey> {
        let values = components
            .iter()
            .enumerate()
            .map(|(depth, component)| self.parse_segment(depth, component))
            .collect::<Result<Vec<_>>>()?;
        Ok(PartitionKey::new(values))
    }
}
