// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::value::KeyValue;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// Read access to the fields of a record for partitioning
///
/// A field that is absent from the record reads as [`KeyValue::Null`].
pub trait Record {
    fn value(&self, field: &str) -> Result<KeyValue>;
}

impl Record for HashMap<String, KeyValue> {
    fn value(&self, field: &str) -> Result<KeyValue> {
        Ok(self.get(field).cloned().unwrap_or(KeyValue::Null))
    }
}

impl Record for BTreeMap<String, KeyValue> {
    fn value(&self, field: &str) -> Result<KeyValue> {
        Ok(self.get(field).cloned().unwrap_or(KeyValue::Null))
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn value(&self, field: &str) -> Result<KeyValue> {
        match self.get(field) {
            None => Ok(KeyValue::Null),
            Some(value) => json_key_value(field, value),
        }
    }
}

impl Record for serde_json::Value {
    fn value(&self, field: &str) -> Result<KeyValue> {
        match self {
            serde_json::Value::Object(map) => map.value(field),
            other => Err(Error::invalid_key(
                field,
                format!("record is not a JSON object: {other}"),
            )),
        }
    }
}

fn json_key_value(field: &str, value: &serde_json::Value) -> Result<KeyValue> {
    match value {
        serde_json::Value::Null => Ok(KeyValue::Null),
        serde_json::Value::Bool(b) => Ok(KeyValue::Bool(*b)),
        serde_json::Value::String(s) => Ok(KeyValue::String(s.clone())),
        serde_json::Value::Number(n) => n.as_i64().map(KeyValue::Int).ok_or_else(|| {
            Error::invalid_key(field, format!("number {n} is not a 64-bit integer"))
        }),
        other => Err(Error::invalid_key(
            field,
            format!("unsupported partition source value {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_record() {
        let record = json!({"id": 7, "name": "x", "ok": true, "gone": null});
        assert_eq!(record.value("id").unwrap(), KeyValue::Int(7));
        assert_eq!(record.value("name").unwrap(), KeyValue::String("x".into()));
        assert_eq!(record.value("ok").unwrap(), KeyValue::Bool(true));
        assert_eq!(record.value("gone").unwrap(), KeyValue::Null);
        assert_eq!(record.value("missing").unwrap(), KeyValue::Null);
    }

    #[test]
    fn test_json_rejects_unsupported_values() {
        let record = json!({"ratio": 0.5, "tags": ["a"]});
        assert!(record.value("ratio").is_err());
        assert!(record.value("tags").is_err());
        assert!(json!([1, 2]).value("x").is_err());
    }

    #[test]
    fn test_map_record() {
        let record: HashMap<String, KeyValue> =
            HashMap::from([("a".to_string(), KeyValue::Int(1))]);
        assert_eq!(record.value("a").unwrap(), KeyValue::Int(1));
        assert_eq!(record.value("b").unwrap(), KeyValue::Null);
    }
}
