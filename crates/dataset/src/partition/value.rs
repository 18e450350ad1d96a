// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of a partition key value, used to parse values back out of paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Bool,
    Int,
    String,
}

impl KeyType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            KeyType::Bool => "bool",
            KeyType::Int => "int",
            KeyType::String => "string",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<KeyType> {
        match name {
            "bool" => Some(KeyType::Bool),
            "int" => Some(KeyType::Int),
            "string" => Some(KeyType::String),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single partition key value
///
/// Record fields used as partition sources are converted to this type
/// before a partition function is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
}

impl KeyValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, KeyValue::Null)
    }

    /// The type of a non-null value
    #[must_use]
    pub fn key_type(&self) -> Option<KeyType> {
        match self {
            KeyValue::Null => None,
            KeyValue::Bool(_) => Some(KeyType::Bool),
            KeyValue::Int(_) => Some(KeyType::Int),
            KeyValue::String(_) => Some(KeyType::String),
        }
    }

    /// Parse the textual form produced by [`KeyValue::to_text`]
    pub fn parse(key_type: KeyType, text: &str) -> Result<KeyValue, String> {
        match key_type {
            KeyType::Bool => match text {
                "true" => Ok(KeyValue::Bool(true)),
                "false" => Ok(KeyValue::Bool(false)),
                _ => Err(format!("'{text}' is not a bool")),
            },
            KeyType::Int => {
                let i = text
                    .parse::<i64>()
                    .map_err(|e| format!("'{text}' is not an int: {e}"))?;
                // the only accepted spelling is the one to_text writes
                if i.to_string() == text {
                    Ok(KeyValue::Int(i))
                } else {
                    Err(format!("'{text}' is not written as {i}"))
                }
            }
            KeyType::String => Ok(KeyValue::String(text.to_string())),
        }
    }

    /// Textual form of a non-null value
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            KeyValue::Null => None,
            KeyValue::Bool(b) => Some(b.to_string()),
            KeyValue::Int(i) => Some(i.to_string()),
            KeyValue::String(s) => Some(s.clone()),
        }
    }

    /// Stable byte encoding used for hashing; distinct values of distinct
    /// types never collide
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        match self {
            KeyValue::Null => vec![0],
            KeyValue::Bool(b) => vec![1, u8::from(*b)],
            KeyValue::Int(i) => {
                let mut bytes = vec![2];
                bytes.extend_from_slice(&i.to_be_bytes());
                bytes
            }
            KeyValue::String(s) => {
                let mut bytes = vec![3];
                bytes.extend_from_slice(s.as_bytes());
                bytes
            }
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Null => f.write_str("null"),
            KeyValue::Bool(b) => write!(f, "{b}"),
            KeyValue::Int(i) => write!(f, "{i}"),
            KeyValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Int(i64::from(value))
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        KeyValue::Bool(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(KeyValue::Null, Into::into)
    }
}
