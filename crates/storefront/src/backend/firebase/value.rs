//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore REST wraps every value in a single-key object naming its type
//! (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). Documents in this
//! crate are plain JSON, so values are wrapped on the way out and unwrapped on
//! the way in. The top-level fields in [`TIMESTAMP_FIELDS`] are sent as
//! `timestampValue` so that ordering by time works server-side, and come back
//! as RFC 3339 strings. Every other string is sent as a `stringValue`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use crate::backend::{BackendError, Fields};

/// Document fields the repositories write as RFC 3339 timestamps.
pub const TIMESTAMP_FIELDS: &[&str] = &["createdAt", "updatedAt", "timestamp", "lastMessageTime"];

/// Wrap a JSON value in Firestore's typed encoding.
#[must_use]
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => n.as_i64().map_or_else(
            || json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
            // int64 travels as a decimal string
            |i| json!({ "integerValue": i.to_string() }),
        ),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({
            "mapValue": {
                "fields": map
                    .iter()
                    .map(|(key, value)| (key.clone(), encode(value)))
                    .collect::<Map<_, _>>()
            }
        }),
    }
}

/// Wrap a top-level document field, sending known timestamp fields as
/// `timestampValue` when they hold an RFC 3339 string.
#[must_use]
pub fn encode_field(name: &str, value: &Value) -> Value {
    if TIMESTAMP_FIELDS.contains(&name) {
        if let Some(ts) = value.as_str().and_then(parse_timestamp) {
            return json!({
                "timestampValue": ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            });
        }
    }
    encode(value)
}

/// Wrap every field of a document.
#[must_use]
pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_field(key, value)))
        .collect()
}

/// Unwrap a Firestore typed value into plain JSON.
///
/// # Errors
///
/// Returns `BackendError::Encoding` for malformed or unsupported values.
pub fn decode(value: &Value) -> Result<Value, BackendError> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(BackendError::Encoding(format!("untyped value: {value}")));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| malformed(kind, inner)),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| inner.as_i64())
            .map(Value::from)
            .ok_or_else(|| malformed(kind, inner)),
        "doubleValue" => inner
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| malformed(kind, inner)),
        "timestampValue" => inner
            .as_str()
            .and_then(parse_timestamp)
            .map(|ts| Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .ok_or_else(|| malformed(kind, inner)),
        "stringValue" | "referenceValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_owned()))
            .ok_or_else(|| malformed(kind, inner)),
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map_or_else(|| Ok(Vec::new()), |items| items.iter().map(decode).collect())
            .map(Value::Array),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map_or_else(|| Ok(Fields::new()), decode_fields)
            .map(Value::Object),
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(Value::from(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(Value::from(0.0)),
        })),
        other => Err(BackendError::Encoding(format!(
            "unsupported value type: {other}"
        ))),
    }
}

/// Unwrap every field of a document.
///
/// # Errors
///
/// Returns `BackendError::Encoding` if any field is malformed.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields, BackendError> {
    fields
        .iter()
        .map(|(key, value)| decode(value).map(|v| (key.clone(), v)))
        .collect()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if !s.contains('T') {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn malformed(kind: &str, inner: &Value) -> BackendError {
    BackendError::Encoding(format!("malformed {kind}: {inner}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&json!(null)), json!({"nullValue": null}));
        assert_eq!(encode(&json!(true)), json!({"booleanValue": true}));
        assert_eq!(encode(&json!(42)), json!({"integerValue": "42"}));
        assert_eq!(encode(&json!(4.5)), json!({"doubleValue": 4.5}));
        assert_eq!(encode(&json!("hello")), json!({"stringValue": "hello"}));
    }

    #[test]
    fn test_encode_timestamp_fields() {
        let fields = encode_fields(
            json!({
                "createdAt": "2024-03-01T12:00:00.250Z",
                "updatedAt": "not a time",
                "lastMessage": "2024-03-01T12:00:00.250Z",
            })
            .as_object()
            .unwrap(),
        );
        assert_eq!(
            fields["createdAt"],
            json!({"timestampValue": "2024-03-01T12:00:00.250Z"})
        );
        assert_eq!(fields["updatedAt"], json!({"stringValue": "not a time"}));
        assert_eq!(
            fields["lastMessage"],
            json!({"stringValue": "2024-03-01T12:00:00.250Z"})
        );
        assert_eq!(
            encode(&json!({"createdAt": "2024-03-01T12:00:00Z"})),
            json!({"mapValue": {"fields": {"createdAt": {"stringValue": "2024-03-01T12:00:00Z"}}}})
        );
    }

    #[test]
    fn test_user_text_that_looks_like_a_time_round_trips() {
        let text = "2024-01-01T00:00:00+02:00";
        let doc = json!({"content": text, "lastMessage": text, "tags": [text]});

        let wire = Value::Object(encode_fields(doc.as_object().unwrap()));
        assert_eq!(wire["content"], json!({"stringValue": text}));

        let decoded = decode_fields(wire.as_object().unwrap()).unwrap();
        assert_eq!(Value::Object(decoded), doc);
    }

    #[test]
    fn test_encode_nested() {
        let encoded = encode(&json!({"items": [{"qty": 2}]}));
        assert_eq!(
            encoded,
            json!({"mapValue": {"fields": {"items": {"arrayValue": {"values": [
                {"mapValue": {"fields": {"qty": {"integerValue": "2"}}}}
            ]}}}}})
        );
    }

    #[test]
    fn test_decode_document_fields() {
        let wire = json!({
            "question": {"stringValue": "How do refunds work?"},
            "order": {"integerValue": "3"},
            "rating": {"doubleValue": 4.25},
            "createdAt": {"timestampValue": "2024-03-01T12:00:00.123456Z"},
            "images": {"arrayValue": {}},
            "meta": {"mapValue": {"fields": {"pinned": {"booleanValue": false}}}}
        });

        let fields = decode_fields(wire.as_object().unwrap()).unwrap();
        assert_eq!(fields["question"], "How do refunds work?");
        assert_eq!(fields["order"], 3);
        assert_eq!(fields["rating"], 4.25);
        assert_eq!(fields["createdAt"], "2024-03-01T12:00:00.123Z");
        assert_eq!(fields["images"], json!([]));
        assert_eq!(fields["meta"], json!({"pinned": false}));
    }

    #[test]
    fn test_decode_rejects_untyped() {
        assert!(decode(&json!("bare")).is_err());
        assert!(decode(&json!({"integerValue": "abc"})).is_err());
        assert!(decode(&json!({"bytesValue": "AAE="})).is_err());
    }
}
