//! # Extension traits for reading DynamoDB event items.

use aws_sdk_dynamodb::model::AttributeValue;
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Trait to extract concrete values from a DynamoDB item
///
/// The DynamoDB client returns AttributeValues, which are enums that contain
/// the concrete values. This trait provides additional methods to the HashMap
/// to extract those values.
pub trait AttributeValuesExt {
    fn get_s(&self, key: &str) -> Option<String>;
    fn get_n(&self, key: &str) -> Option<f64>;
    fn get_ms(&self, key: &str) -> Option<i64>;
    fn get_dt(&self, key: &str) -> Option<DateTime<Utc>>;
    fn get_json(&self, key: &str) -> Option<Value>;
}

impl AttributeValuesExt for HashMap<String, AttributeValue> {
    /// Return a string from a key
    ///
    /// E.g. `get_s("sessionId")` on an item shaped like this returns `"abc123"`.
    ///
    /// ```json
    /// {
    ///   "sessionId": {
    ///     "S": "abc123"
    ///   }
    /// }
    /// ```
    fn get_s(&self, key: &str) -> Option<String> {
        Some(self.get(key)?.as_s().ok()?.to_owned())
    }

    /// Return a number from a key
    ///
    /// E.g. `get_n("scrollY")` on an item shaped like this returns `480.0`.
    ///
    /// ```json
    /// {
    ///  "scrollY": {
    ///   "N": "480.0"
    ///   }
    /// }
    /// ```
    fn get_n(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_n().ok()?.parse::<f64>().ok()
    }

    /// Return a millisecond count from a numeric key.
    ///
    /// Tracking clients write `relativeTime` as an integer, but the document
    /// mapper on the write side is loose about it, so fall back through f64.
    fn get_ms(&self, key: &str) -> Option<i64> {
        let raw = self.get(key)?.as_n().ok()?;
        raw.parse::<i64>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().map(|n| n as i64))
    }

    /// Return a DateTime<Utc> from an ISO-8601 string key.
    fn get_dt(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key)?
            .as_s()
            .ok()?
            .to_owned()
            .parse::<DateTime<Utc>>()
            .ok()
    }

    /// Return an untyped JSON value from a key.
    ///
    /// Event payloads (`eventData`) have a per-event-type shape that this
    /// service never validates, so they travel as `serde_json::Value`.
    fn get_json(&self, key: &str) -> Option<Value> {
        Some(attribute_to_json(self.get(key)?))
    }
}

/// Convert an `AttributeValue` tree into the JSON value the document mapper
/// on the write side produced.
pub fn attribute_to_json(attribute: &AttributeValue) -> Value {
    match attribute {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => n
            .parse::<i64>()
            .ok()
            .map(|i| Value::Number(i.into()))
            .or_else(|| {
                n.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            })
            .unwrap_or(Value::Null),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(items.iter().map(attribute_to_json).collect()),
        AttributeValue::M(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                map.insert(key.clone(), attribute_to_json(value));
            }
            Value::Object(map)
        }
        AttributeValue::Ss(items) => {
            Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
        }
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attributevalue_get_s() {
        let mut item = HashMap::new();
        item.insert("sessionId".to_owned(), AttributeValue::S("abc123".to_owned()));

        assert_eq!(item.get_s("sessionId"), Some("abc123".to_owned()));
    }

    #[test]
    fn attributevalue_get_s_missing() {
        let mut item = HashMap::new();
        item.insert("sessionId".to_owned(), AttributeValue::S("abc123".to_owned()));

        assert_eq!(item.get_s("foo"), None);
    }

    #[test]
    fn attributevalue_get_n() {
        let mut item = HashMap::new();
        item.insert("scrollY".to_owned(), AttributeValue::N("480.0".to_owned()));

        assert_eq!(item.get_n("scrollY"), Some(480.0));
    }

    #[test]
    fn attributevalue_get_n_missing() {
        let mut item = HashMap::new();
        item.insert("scrollY".to_owned(), AttributeValue::N("480.0".to_owned()));

        assert_eq!(item.get_n("foo"), None);
    }

    #[test]
    fn attributevalue_get_ms_integer_and_float() {
        let mut item = HashMap::new();
        item.insert("relativeTime".to_owned(), AttributeValue::N("1500".to_owned()));
        assert_eq!(item.get_ms("relativeTime"), Some(1500));

        item.insert("relativeTime".to_owned(), AttributeValue::N("1500.0".to_owned()));
        assert_eq!(item.get_ms("relativeTime"), Some(1500));
    }

    #[test]
    fn attribute_to_json_maps_nested_payloads() {
        let viewport = AttributeValue::M(HashMap::from([
            ("width".to_owned(), AttributeValue::N("1280".to_owned())),
            ("height".to_owned(), AttributeValue::N("720".to_owned())),
        ]));
        let payload = AttributeValue::M(HashMap::from([
            ("viewport".to_owned(), viewport),
            ("referrer".to_owned(), AttributeValue::S("direct".to_owned())),
            ("returning".to_owned(), AttributeValue::Bool(false)),
        ]));

        assert_eq!(
            attribute_to_json(&payload),
            json!({
                "viewport": { "width": 1280, "height": 720 },
                "referrer": "direct",
                "returning": false,
            })
        );
    }
}
