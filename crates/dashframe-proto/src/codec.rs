//! JSON envelope codec.
//!
//! On the wire every envelope is a flat object whose `value` is itself a JSON
//! document serialized into a string. The double encoding keeps the outer
//! shape fixed while payloads vary per action; it is undone exactly once, here.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::envelope::{Action, Envelope, SchemaVersion};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

fn malformed(reason: impl Into<String>) -> FrameError {
    FrameError::MalformedFrame(reason.into())
}

#[derive(Serialize)]
struct WireEnvelope<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

/// Encodes an envelope in the latest wire shape.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, FrameError> {
    encode_versioned(envelope, SchemaVersion::LATEST)
}

/// Encodes an envelope in the shape understood by a peer speaking `version`.
///
/// `V1` drops `id`; `V0` additionally omits `name` and `value` when they are
/// empty. Non-ASCII text is written literally, never `\u` escaped.
pub fn encode_versioned(envelope: &Envelope, version: SchemaVersion) -> Result<Vec<u8>, FrameError> {
    let legacy = version == SchemaVersion::V0;
    let value = if legacy && envelope.value.is_empty() {
        None
    } else {
        Some(
            serde_json::to_string(&envelope.value)
                .map_err(|err| FrameError::Encode(err.to_string()))?,
        )
    };
    let name = if legacy && envelope.name.is_empty() {
        None
    } else {
        Some(envelope.name.as_str())
    };
    let wire = WireEnvelope {
        id: version.carries_id().then_some(envelope.id.as_str()),
        action: envelope.action.as_str(),
        name,
        value,
    };
    serde_json::to_vec(&wire).map_err(|err| FrameError::Encode(err.to_string()))
}

/// Encodes an envelope followed by `\n`, for newline-delimited streams.
pub fn encode_line(envelope: &Envelope) -> Result<Vec<u8>, FrameError> {
    let mut buf = encode(envelope)?;
    buf.push(b'\n');
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> Result<Envelope, FrameError> {
    decode_versioned(bytes).map(|(envelope, _)| envelope)
}

/// Decodes an envelope of any known shape, filling missing fields with the
/// defaults of the shape that introduced them, and reports which shape the
/// sender used.
pub fn decode_versioned(bytes: &[u8]) -> Result<(Envelope, SchemaVersion), FrameError> {
    let root: Value =
        serde_json::from_slice(bytes).map_err(|err| malformed(format!("invalid json: {err}")))?;
    let Value::Object(mut fields) = root else {
        return Err(malformed("envelope must be a json object"));
    };
    let version = detect_version(&fields);

    let action = match fields.remove("action") {
        Some(Value::String(raw)) => Action::parse(&raw),
        Some(other) => {
            return Err(malformed(format!(
                "action must be a string, got {}",
                kind_of(&other)
            )))
        }
        None => return Err(malformed("missing action")),
    };
    let id = string_field(&mut fields, "id")?;
    let name = string_field(&mut fields, "name")?;
    let value = value_field(&mut fields)?;

    Ok((
        Envelope {
            id,
            action,
            name,
            value,
        },
        version,
    ))
}

fn detect_version(fields: &Map<String, Value>) -> SchemaVersion {
    if fields.contains_key("id") {
        SchemaVersion::V2
    } else if fields.contains_key("name") || fields.contains_key("value") {
        SchemaVersion::V1
    } else {
        SchemaVersion::V0
    }
}

fn string_field(fields: &mut Map<String, Value>, key: &str) -> Result<String, FrameError> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(raw)) => Ok(raw),
        Some(other) => Err(malformed(format!(
            "{key} must be a string, got {}",
            kind_of(&other)
        ))),
    }
}

fn value_field(fields: &mut Map<String, Value>) -> Result<Map<String, Value>, FrameError> {
    match fields.remove("value") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::String(encoded)) => {
            match serde_json::from_str::<Value>(&encoded)
                .map_err(|err| malformed(format!("value is not valid json: {err}")))?
            {
                Value::Object(map) => Ok(map),
                other => Err(malformed(format!(
                    "value must encode a json object, got {}",
                    kind_of(&other)
                ))),
            }
        }
        // Some early senders embedded the payload without string-encoding it.
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(malformed(format!(
            "value must be a json string, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn round_trips_non_ascii_text_literally() {
        let envelope = Envelope::new(Action::Text)
            .with_id("weather")
            .with_name("今日")
            .with_value(object(json!({"text": "Grüße ☀", "color": "white", "align": "center"})));

        let bytes = encode(&envelope).expect("encode");
        let raw = std::str::from_utf8(&bytes).expect("utf8");
        assert!(raw.contains("Grüße ☀"), "non-ascii must not be escaped: {raw}");
        assert!(raw.contains("今日"));
        assert!(!raw.contains("\\u"));

        assert_eq!(decode(&bytes).expect("decode"), envelope);
    }

    #[test]
    fn value_is_double_encoded() {
        let envelope = Envelope::new(Action::TodoDone).with_value(object(json!({"index": 2})));
        let bytes = encode(&envelope).expect("encode");
        let outer: Value = serde_json::from_slice(&bytes).expect("outer json");
        assert_eq!(outer["value"], json!("{\"index\":2}"));
        assert_eq!(outer["id"], json!(""));
        assert_eq!(outer["action"], json!("todo_done"));
    }

    #[test]
    fn missing_action_is_malformed() {
        let err = decode(br#"{"id":"a","name":"b","value":"{}"}"#).unwrap_err();
        assert_eq!(err, FrameError::MalformedFrame("missing action".into()));
    }

    #[test]
    fn non_string_action_is_malformed() {
        let err = decode(br#"{"action":7}"#).unwrap_err();
        assert!(matches!(err, FrameError::MalformedFrame(reason) if reason.contains("number")));
    }

    #[test]
    fn invalid_value_json_is_malformed() {
        let err = decode(br#"{"action":"text","name":"x","value":"{not json"}"#).unwrap_err();
        assert!(matches!(err, FrameError::MalformedFrame(reason) if reason.contains("not valid json")));
    }

    #[test]
    fn value_must_encode_an_object() {
        let err = decode(br#"{"action":"text","value":"[1,2]"}"#).unwrap_err();
        assert!(matches!(err, FrameError::MalformedFrame(reason) if reason.contains("array")));
    }

    #[test]
    fn non_object_root_is_malformed() {
        assert!(decode(b"[]").is_err());
        assert!(decode(b"not json at all").is_err());
    }

    #[test]
    fn v1_shape_defaults_id_to_empty() {
        let (envelope, version) =
            decode_versioned(br#"{"action":"text","name":"clock","value":"{\"text\":\"12:00\"}"}"#)
                .expect("decode");
        assert_eq!(version, SchemaVersion::V1);
        assert_eq!(envelope.id, "");
        assert_eq!(envelope.name, "clock");
        assert_eq!(envelope.value["text"], json!("12:00"));
    }

    #[test]
    fn v0_shape_defaults_everything_but_action() {
        let (envelope, version) = decode_versioned(br#"{"action":"reload"}"#).expect("decode");
        assert_eq!(version, SchemaVersion::V0);
        assert_eq!(envelope, Envelope::new(Action::Reload));
    }

    #[test]
    fn null_fields_take_defaults() {
        let envelope = decode(br#"{"id":null,"action":"exit","name":null,"value":null}"#)
            .expect("decode");
        assert_eq!(envelope, Envelope::new(Action::Exit));
    }

    #[test]
    fn inline_object_value_is_accepted() {
        let envelope = decode(br#"{"action":"todo_del","value":{"index":0}}"#).expect("decode");
        assert_eq!(envelope.value["index"], json!(0));
    }

    #[test]
    fn unknown_keys_are_preserved_inside_value() {
        let envelope = Envelope::new(Action::Chart)
            .with_name("cpu")
            .with_value(object(json!({"data": [[0.0, 1.0]], "smoothing": {"window": 3}})));
        let decoded = decode(&encode(&envelope).expect("encode")).expect("decode");
        assert_eq!(decoded.value["smoothing"], json!({"window": 3}));
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn chart_floats_survive_the_double_encoding() {
        let data: Vec<Value> = [971.9863718547629_f64, 955.4762570674258, 124.89148443491327]
            .iter()
            .map(|x| json!([x, x.sin()]))
            .collect();
        let envelope = Envelope::new(Action::Chart)
            .with_name("wave")
            .with_value(object(json!({"data": data, "x_bounds": [0.1, 1000.0]})));
        let decoded = decode(&encode(&envelope).expect("encode")).expect("decode");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn unknown_top_level_keys_are_ignored() {
        let envelope = decode(br#"{"action":"text","trace":"abc","value":"{}"}"#).expect("decode");
        assert_eq!(envelope.action, Action::Text);
    }

    #[test]
    fn unknown_action_is_accepted_by_codec() {
        let envelope = decode(br#"{"id":"s","action":"unsupported_x","name":"n","value":"{}"}"#)
            .expect("decode");
        assert_eq!(envelope.action, Action::Unknown("unsupported_x".into()));
    }

    #[test]
    fn v1_encoding_omits_id() {
        let envelope = Envelope::new(Action::Big).with_id("ignored").with_name("title");
        let bytes = encode_versioned(&envelope, SchemaVersion::V1).expect("encode");
        let outer: Value = serde_json::from_slice(&bytes).expect("json");
        assert!(outer.get("id").is_none());
        assert_eq!(outer["name"], json!("title"));
    }

    #[test]
    fn v0_encoding_is_action_only_for_lifecycle_frames() {
        let bytes = encode_versioned(&Envelope::new(Action::Exit), SchemaVersion::V0)
            .expect("encode");
        assert_eq!(bytes, br#"{"action":"exit"}"#.to_vec());
    }

    #[test]
    fn encode_line_terminates_with_newline() {
        let line = encode_line(&Envelope::new(Action::Reload)).expect("encode");
        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(decode(&line).expect("decode"), Envelope::new(Action::Reload));
    }
}
