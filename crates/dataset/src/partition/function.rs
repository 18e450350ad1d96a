// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Partition functions: mapping a source field value to a partition value.
//!
//! Every function has a forward half (`apply`) that derives the partition
//! value from a record's field, and an inverse half (`invert`) that parses a
//! partition value back from its textual form in a storage path. Only
//! `identity` recovers the original field value; the others recover the
//! bucket the value fell into.

use super::value::{KeyType, KeyValue};
use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// The two operations every partition function provides
pub trait PartitionFunction {
    /// Derive the partition value for `value`, read from field `field`
    fn apply(&self, field: &str, value: &KeyValue) -> Result<KeyValue>;

    /// Parse a partition value from the (decoded) text stored in a path
    fn invert(&self, field: &str, text: &str) -> Result<KeyValue>;
}

/// Calendar field extracted from an epoch-millisecond timestamp (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

impl TimeUnit {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TimeUnit::Year => "year",
            TimeUnit::Month => "month",
            TimeUnit::Day => "day",
            TimeUnit::Hour => "hour",
            TimeUnit::Minute => "minute",
        }
    }

    fn extract(&self, timestamp: &DateTime<Utc>) -> i64 {
        match self {
            TimeUnit::Year => i64::from(timestamp.year()),
            TimeUnit::Month => i64::from(timestamp.month()),
            TimeUnit::Day => i64::from(timestamp.day()),
            TimeUnit::Hour => i64::from(timestamp.hour()),
            TimeUnit::Minute => i64::from(timestamp.minute()),
        }
    }
}

/// The closed set of supported partition functions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Partitioner {
    /// The field value itself
    Identity { key_type: KeyType },
    /// Stable hash of the value modulo `buckets`
    Hash { buckets: u32 },
    /// Smallest upper bound that is `>=` an integer value
    IntRange { upper_bounds: Vec<i64> },
    /// Smallest upper bound that is `>=` a string value
    StringRange { upper_bounds: Vec<String> },
    /// Calendar field of an epoch-millisecond timestamp
    DateTime { unit: TimeUnit },
}

impl Partitioner {
    /// Type of the values this function produces
    #[must_use]
    pub fn result_type(&self) -> KeyType {
        match self {
            Partitioner::Identity { key_type } => *key_type,
            Partitioner::StringRange { .. } => KeyType::String,
            Partitioner::Hash { .. } | Partitioner::IntRange { .. } | Partitioner::DateTime { .. } => {
                KeyType::Int
            }
        }
    }

    /// Short function name used in strategy descriptions
    #[must_use]
    pub fn function_name(&self) -> &'static str {
        match self {
            Partitioner::Identity { .. } => "identity",
            Partitioner::Hash { .. } => "hash",
            Partitioner::IntRange { .. } => "int_range",
            Partitioner::StringRange { .. } => "string_range",
            Partitioner::DateTime { unit } => unit.name(),
        }
    }

    /// Check the function's own parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            Partitioner::Hash { buckets: 0 } => Err(Error::configuration(
                "hash partitioning requires at least one bucket",
            )),
            Partitioner::IntRange { upper_bounds } => validate_bounds(upper_bounds),
            Partitioner::StringRange { upper_bounds } => validate_bounds(upper_bounds),
            _ => Ok(()),
        }
    }
}

fn validate_bounds<T: PartialOrd + fmt::Debug>(bounds: &[T]) -> Result<()> {
    if bounds.is_empty() {
        return Err(Error::configuration(
            "range partitioning requires at least one upper bound",
        ));
    }
    if bounds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::configuration(format!(
            "range upper bounds must be strictly ascending: {bounds:?}"
        )));
    }
    Ok(())
}

fn hash_bucket(value: &KeyValue, buckets: u32) -> i64 {
    let digest = Sha256::digest(value.canonical_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let bucket = u64::from_be_bytes(prefix) % u64::from(buckets);
    // bucket < u32::MAX, so the conversion is lossless
    i64::try_from(bucket).unwrap_or_default()
}

fn range_bucket<T: PartialOrd + Clone>(bounds: &[T], value: &T) -> Option<T> {
    bounds.iter().find(|bound| value <= *bound).cloned()
}

impl PartitionFunction for Partitioner {
    fn apply(&self, field: &str, value: &KeyValue) -> Result<KeyValue> {
        if value.is_null() {
            return Ok(KeyValue::Null);
        }

        match (self, value) {
            (Partitioner::Identity { key_type }, value) => {
                if value.key_type() == Some(*key_type) {
                    Ok(value.clone())
                } else {
                    Err(Error::invalid_key(
                        field,
                        format!("expected a {key_type} value, found {value}"),
                    ))
                }
            }
            (Partitioner::Hash { buckets }, value) => {
                Ok(KeyValue::Int(hash_bucket(value, *buckets)))
            }
            (Partitioner::IntRange { upper_bounds }, KeyValue::Int(i)) => {
                range_bucket(upper_bounds, i).map(KeyValue::Int).ok_or_else(|| {
                    Error::invalid_key(field, format!("{i} is above every range upper bound"))
                })
            }
            (Partitioner::StringRange { upper_bounds }, KeyValue::String(s)) => {
                range_bucket(upper_bounds, s).map(KeyValue::String).ok_or_else(|| {
                    Error::invalid_key(field, format!("{s:?} is above every range upper bound"))
                })
            }
            (Partitioner::DateTime { unit }, KeyValue::Int(millis)) => {
                let timestamp = DateTime::<Utc>::from_timestamp_millis(*millis).ok_or_else(|| {
                    Error::invalid_key(field, format!("timestamp {millis} is out of range"))
                })?;
                Ok(KeyValue::Int(unit.extract(&timestamp)))
            }
            (partitioner, value) => Err(Error::invalid_key(
                field,
                format!(
                    "{} partitioning does not accept {value}",
                    partitioner.function_name()
                ),
            )),
        }
    }

    fn invert(&self, field: &str, text: &str) -> Result<KeyValue> {
        KeyValue::parse(self.result_type(), text).map_err(|message| Error::invalid_key(field, message))
    }
}

impl fmt::Display for Partitioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partitioner::Identity { key_type } => write!(f, "identity[{key_type}]"),
            Partitioner::Hash { buckets } => write!(f, "hash[{buckets}]"),
            Partitioner::IntRange { upper_bounds } => write!(f, "int_range{upper_bounds:?}"),
            Partitioner::StringRange { upper_bounds } => write!(f, "string_range{upper_bounds:?}"),
            Partitioner::DateTime { unit } => f.write_str(unit.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-15T13:45:30Z
    const TS: i64 = 1_710_510_330_000;

    #[test]
    fn test_identity_checks_type() {
        let p = Partitioner::Identity { key_type: KeyType::String };
        assert_eq!(p.apply("f", &"x".into()).unwrap(), KeyValue::from("x"));
        let err = p.apply("f", &KeyValue::Int(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));
    }

    #[test]
    fn test_null_passes_through() {
        for p in [
            Partitioner::Identity { key_type: KeyType::Int },
            Partitioner::Hash { buckets: 4 },
            Partitioner::IntRange { upper_bounds: vec![10] },
            Partitioner::DateTime { unit: TimeUnit::Year },
        ] {
            assert_eq!(p.apply("f", &KeyValue::Null).unwrap(), KeyValue::Null);
        }
    }

    #[test]
    fn test_hash_is_stable_and_bounded() {
        let p = Partitioner::Hash { buckets: 16 };
        let a = p.apply("id", &KeyValue::Int(12345)).unwrap();
        let b = p.apply("id", &KeyValue::Int(12345)).unwrap();
        assert_eq!(a, b);
        for i in 0..200 {
            match p.apply("id", &KeyValue::Int(i)).unwrap() {
                KeyValue::Int(bucket) => assert!((0..16).contains(&bucket)),
                other => panic!("unexpected bucket {other}"),
            }
        }
    }

    #[test]
    fn test_hash_spreads_values() {
        let p = Partitioner::Hash { buckets: 4 };
        let buckets: std::collections::HashSet<KeyValue> = (0..64)
            .map(|i| p.apply("id", &KeyValue::Int(i)).unwrap())
            .collect();
        assert!(buckets.len() > 1);
    }

    #[test]
    fn test_int_range() {
        let p = Partitioner::IntRange { upper_bounds: vec![10, 20, 30] };
        assert_eq!(p.apply("n", &KeyValue::Int(-5)).unwrap(), KeyValue::Int(10));
        assert_eq!(p.apply("n", &KeyValue::Int(10)).unwrap(), KeyValue::Int(10));
        assert_eq!(p.apply("n", &KeyValue::Int(11)).unwrap(), KeyValue::Int(20));
        assert!(p.apply("n", &KeyValue::Int(31)).is_err());
        assert!(p.apply("n", &KeyValue::from("5")).is_err());
    }

    #[test]
    fn test_string_range() {
        let p = Partitioner::StringRange {
            upper_bounds: vec!["g".into(), "n".into(), "z".into()],
        };
        assert_eq!(p.apply("s", &"apple".into()).unwrap(), KeyValue::from("g"));
        assert_eq!(p.apply("s", &"melon".into()).unwrap(), KeyValue::from("n"));
        assert!(p.apply("s", &"zz".into()).is_err());
    }

    #[test]
    fn test_datetime_units() {
        let cases = [
            (TimeUnit::Year, 2024),
            (TimeUnit::Month, 3),
            (TimeUnit::Day, 15),
            (TimeUnit::Hour, 13),
            (TimeUnit::Minute, 45),
        ];
        for (unit, expected) in cases {
            let p = Partitioner::DateTime { unit };
            assert_eq!(p.apply("ts", &KeyValue::Int(TS)).unwrap(), KeyValue::Int(expected));
        }
    }

    #[test]
    fn test_invert_uses_result_type() {
        let p = Partitioner::Hash { buckets: 8 };
        assert_eq!(p.invert("id", "3").unwrap(), KeyValue::Int(3));
        assert!(p.invert("id", "three").is_err());

        let p = Partitioner::Identity { key_type: KeyType::Bool };
        assert_eq!(p.invert("flag", "false").unwrap(), KeyValue::Bool(false));
    }

    #[test]
    fn test_validate() {
        assert!(Partitioner::Hash { buckets: 0 }.validate().is_err());
        assert!(Partitioner::IntRange { upper_bounds: vec![] }.validate().is_err());
        assert!(Partitioner::IntRange { upper_bounds: vec![5, 5] }.validate().is_err());
        assert!(Partitioner::StringRange { upper_bounds: vec!["b".into(), "a".into()] }
            .validate()
            .is_err());
        assert!(Partitioner::IntRange { upper_bounds: vec![1, 2] }.validate().is_ok());
    }

    #[test]
    fn test_serde_tagging() {
        let p = Partitioner::Hash { buckets: 8 };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json, serde_json::json!({"type": "hash", "buckets": 8}));
        let back: Partitioner = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
