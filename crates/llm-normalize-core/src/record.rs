//! Normalized record: the fully-typed output of the pipeline.
//!
//! A [`Record`] holds exactly the fields its `SchemaSpec` declares, in
//! declaration order, each already defaulted, clamped and canonicalized.
//! It is built once and never mutated afterwards.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::canonical::SynonymTable;
use crate::metrics::count_by_category;

/// A single normalized value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    /// A canonical member of the field's synonym table.
    Enum(String),
    List(Vec<FieldValue>),
    Object(Record),
}

/// An ordered, immutable set of named field values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub(crate) fn from_fields(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Field names and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_f64)
    }

    pub fn list(&self, name: &str) -> Option<&[FieldValue]> {
        self.get(name).and_then(FieldValue::as_list)
    }

    pub fn object(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(FieldValue::as_object)
    }

    /// Count the objects in list `list_field` by their enum field `category_field`.
    ///
    /// Every canonical member of `table` appears in the result, including
    /// members no element carries.
    pub fn count_by(
        &self,
        list_field: &str,
        category_field: &str,
        table: &SynonymTable,
    ) -> BTreeMap<String, usize> {
        let items = self
            .list(list_field)
            .unwrap_or_default()
            .iter()
            .filter_map(|item| item.as_object()?.get(category_field)?.as_str());
        count_by_category(items, table.canonical())
    }

    /// Render as a plain JSON object.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_value()))
            .collect();
        Value::Object(map)
    }

    /// Decode into a strongly-typed view.
    ///
    /// A record always conforms to its spec, so this only fails when `T`
    /// does not match the spec the record was normalized against.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text or enum contents.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Record> {
        match self {
            Self::Object(record) => Some(record),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::Number(Number::from(*i)),
            // Normalized numbers are always finite.
            Self::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Text(s) | Self::Enum(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(FieldValue::to_value).collect()),
            Self::Object(record) => record.to_value(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Text(s) | Self::Enum(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(record) => record.serialize(serializer),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Record {
        Record::from_fields(vec![
            ("summary".to_string(), FieldValue::Text("ok".to_string())),
            ("score".to_string(), FieldValue::Integer(87)),
            (
                "findings".to_string(),
                FieldValue::List(vec![FieldValue::Object(Record::from_fields(vec![(
                    "severity".to_string(),
                    FieldValue::Enum("major".to_string()),
                )]))]),
            ),
            ("chart".to_string(), FieldValue::Null),
        ])
    }

    #[test]
    fn test_accessors() {
        let record = sample();
        assert_eq!(record.text("summary"), Some("ok"));
        assert_eq!(record.number("score"), Some(87.0));
        assert_eq!(record.list("findings").map(<[_]>::len), Some(1));
        assert!(record.get("chart").is_some_and(FieldValue::is_null));
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn test_serialize_preserves_declaration_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        let summary = json.find("\"summary\"").unwrap();
        let score = json.find("\"score\"").unwrap();
        let chart = json.find("\"chart\"").unwrap();
        assert!(summary < score && score < chart);
    }

    #[test]
    fn test_to_value_matches_serialize() {
        let record = sample();
        let via_serde: Value = serde_json::to_value(&record).unwrap();
        assert_eq!(via_serde, record.to_value());
        assert_eq!(
            record.to_value(),
            json!({
                "summary": "ok",
                "score": 87,
                "findings": [{"severity": "major"}],
                "chart": null
            })
        );
    }

    #[test]
    fn test_count_by_includes_zero_categories() {
        let table = SynonymTable::builder(["critical", "major", "minor"], "minor")
            .build()
            .unwrap();
        let counts = sample().count_by("findings", "severity", &table);
        assert_eq!(counts["major"], 1);
        assert_eq!(counts["critical"], 0);
        assert_eq!(counts["minor"], 0);
    }
}
