//! Typed payloads, one per action.
//!
//! Fields that have a documented default are optional here and are only
//! resolved through accessors. Keys this version does not know about are
//! kept in `extra`. The typed view is for reading; [`Frame`] keeps the
//! object that was received so it can be handed back unchanged.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::builders::{Align, GraphType, MarkerType, DEFAULT_BOUNDS, DEFAULT_COLOR};
use crate::codec::FrameError;
use crate::envelope::{Action, Envelope};

/// `text` and `big`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextPayload {
    pub fn color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    pub fn align(&self) -> Align {
        Align::parse_or_default(self.align.as_deref())
    }
}

/// One line of `color_text`, as produced by `make_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledLine {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossline: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StyledLine {
    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    pub fn is_underline(&self) -> bool {
        self.underline.unwrap_or(false)
    }

    pub fn is_italic(&self) -> bool {
        self.italic.unwrap_or(false)
    }

    pub fn is_crossline(&self) -> bool {
        self.crossline.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorTextPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<StyledLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ColorTextPayload {
    pub fn color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    pub fn lines(&self) -> &[StyledLine] {
        self.lines.as_deref().unwrap_or_default()
    }

    pub fn align(&self) -> Align {
        Align::parse_or_default(self.align.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub filepath: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bounds are rendering hints; points outside them are kept as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    pub data: Vec<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_bounds: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_bounds: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_labels: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChartPayload {
    pub fn graph_type(&self) -> GraphType {
        GraphType::parse_or_default(self.graph_type.as_deref())
    }

    pub fn marker_type(&self) -> MarkerType {
        MarkerType::parse_or_default(self.marker_type.as_deref())
    }

    pub fn color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    pub fn x_color(&self) -> &str {
        self.x_color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    pub fn y_color(&self) -> &str {
        self.y_color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    pub fn x_bounds(&self) -> (f64, f64) {
        self.x_bounds.unwrap_or(DEFAULT_BOUNDS)
    }

    pub fn y_bounds(&self) -> (f64, f64) {
        self.y_bounds.unwrap_or(DEFAULT_BOUNDS)
    }

    pub fn x_labels(&self) -> &[String] {
        self.x_labels.as_deref().unwrap_or_default()
    }

    pub fn y_labels(&self) -> &[String] {
        self.y_labels.as_deref().unwrap_or_default()
    }

    /// Points that fall inside both advisory bounds.
    pub fn visible_points(&self) -> impl Iterator<Item = &(f64, f64)> {
        let (x_min, x_max) = self.x_bounds();
        let (y_min, y_max) = self.y_bounds();
        self.data
            .iter()
            .filter(move |(x, y)| (x_min..=x_max).contains(x) && (y_min..=y_max).contains(y))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoAddPayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    /// Unix epoch seconds. Fractional senders are truncated to the second.
    #[serde(
        default,
        deserialize_with = "epoch_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn epoch_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    number
        .as_i64()
        .or_else(|| number.as_f64().filter(|secs| secs.is_finite()).map(|secs| secs.trunc() as i64))
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("deadline {number} is not epoch seconds")))
}

/// `todo_done` and `todo_del`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoIndexPayload {
    pub index: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintPayload {
    pub text: String,
    /// `"stdout"` unless the sender captured its error stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PrintPayload {
    pub fn is_stderr(&self) -> bool {
        self.stream.as_deref() == Some("stderr")
    }
}

/// Envelope value decoded according to its action.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(TextPayload),
    ColorText(ColorTextPayload),
    Big(TextPayload),
    Image(ImagePayload),
    Chart(ChartPayload),
    TodoAdd(TodoAddPayload),
    TodoDone(TodoIndexPayload),
    TodoDel(TodoIndexPayload),
    Reload(Map<String, Value>),
    Exit(Map<String, Value>),
    Print(PrintPayload),
    Unknown {
        action: String,
        value: Map<String, Value>,
    },
}

impl Payload {
    pub fn decode(action: &Action, value: &Map<String, Value>) -> Result<Self, FrameError> {
        let payload = match action {
            Action::Text => Payload::Text(typed(action, value)?),
            Action::ColorText => Payload::ColorText(typed(action, value)?),
            Action::Big => Payload::Big(typed(action, value)?),
            Action::Image => Payload::Image(typed(action, value)?),
            Action::Chart => Payload::Chart(typed(action, value)?),
            Action::TodoAdd => Payload::TodoAdd(typed(action, value)?),
            Action::TodoDone => Payload::TodoDone(typed(action, value)?),
            Action::TodoDel => Payload::TodoDel(typed(action, value)?),
            Action::Reload => Payload::Reload(value.clone()),
            Action::Exit => Payload::Exit(value.clone()),
            Action::Print => Payload::Print(typed(action, value)?),
            Action::Unknown(raw) => Payload::Unknown {
                action: raw.clone(),
                value: value.clone(),
            },
        };
        Ok(payload)
    }

    pub fn action(&self) -> Action {
        match self {
            Payload::Text(_) => Action::Text,
            Payload::ColorText(_) => Action::ColorText,
            Payload::Big(_) => Action::Big,
            Payload::Image(_) => Action::Image,
            Payload::Chart(_) => Action::Chart,
            Payload::TodoAdd(_) => Action::TodoAdd,
            Payload::TodoDone(_) => Action::TodoDone,
            Payload::TodoDel(_) => Action::TodoDel,
            Payload::Reload(_) => Action::Reload,
            Payload::Exit(_) => Action::Exit,
            Payload::Print(_) => Action::Print,
            Payload::Unknown { action, .. } => Action::Unknown(action.clone()),
        }
    }

    /// Re-serializes the typed view. Numbers take their typed form and
    /// explicit nulls for optional fields are gone; use [`Frame::value`]
    /// for the object as received.
    pub fn to_value(&self) -> Map<String, Value> {
        match self {
            Payload::Text(p) | Payload::Big(p) => object_of(p),
            Payload::ColorText(p) => object_of(p),
            Payload::Image(p) => object_of(p),
            Payload::Chart(p) => object_of(p),
            Payload::TodoAdd(p) => object_of(p),
            Payload::TodoDone(p) | Payload::TodoDel(p) => object_of(p),
            Payload::Print(p) => object_of(p),
            Payload::Reload(value) | Payload::Exit(value) | Payload::Unknown { value, .. } => {
                value.clone()
            }
        }
    }
}

fn typed<T: DeserializeOwned>(action: &Action, value: &Map<String, Value>) -> Result<T, FrameError> {
    serde_json::from_value(Value::Object(value.clone()))
        .map_err(|err| FrameError::MalformedFrame(format!("invalid {action} payload: {err}")))
}

fn object_of<T: Serialize>(payload: &T) -> Map<String, Value> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// An envelope after its value has been decoded once into a typed payload.
/// The received object travels alongside, untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: String,
    pub name: String,
    pub payload: Payload,
    value: Map<String, Value>,
}

impl Frame {
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, FrameError> {
        Frame::try_from(envelope.clone())
    }

    pub fn action(&self) -> Action {
        self.payload.action()
    }

    /// The value exactly as it arrived.
    pub fn value(&self) -> &Map<String, Value> {
        &self.value
    }

    /// Splits the frame into its typed payload and the received value.
    pub fn into_parts(self) -> (String, String, Payload, Map<String, Value>) {
        (self.id, self.name, self.payload, self.value)
    }

    pub fn to_envelope(&self) -> Envelope {
        Envelope {
            id: self.id.clone(),
            action: self.action(),
            name: self.name.clone(),
            value: self.value.clone(),
        }
    }
}

impl TryFrom<Envelope> for Frame {
    type Error = FrameError;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        let payload = Payload::decode(&envelope.action, &envelope.value)?;
        Ok(Self {
            id: envelope.id,
            name: envelope.name,
            payload,
            value: envelope.value,
        })
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
    fn text_defaults_resolve_through_accessors() {
        let payload = Payload::decode(&Action::Text, &object(json!({"text": "hi"}))).unwrap();
        let Payload::Text(text) = &payload else {
            panic!("expected text payload");
        };
        assert_eq!(text.color(), "white");
        assert_eq!(text.align(), Align::Center);
        assert_eq!(payload.to_value(), object(json!({"text": "hi"})));
    }

    #[test]
    fn unknown_fields_survive_typed_decoding() {
        let value = object(json!({
            "text": "deploy",
            "by": "ops",
            "deadline": 1_700_000_000,
            "priority": "high"
        }));
        let payload = Payload::decode(&Action::TodoAdd, &value).unwrap();
        let Payload::TodoAdd(todo) = &payload else {
            panic!("expected todo_add payload");
        };
        assert_eq!(todo.extra["priority"], json!("high"));
        assert_eq!(payload.to_value(), value);
    }

    #[test]
    fn fractional_deadline_truncates_to_seconds() {
        let value = object(json!({"text": "x", "by": "a", "deadline": 1_700_000_000.5}));
        let Payload::TodoAdd(todo) = Payload::decode(&Action::TodoAdd, &value).unwrap() else {
            panic!("expected todo_add payload");
        };
        assert_eq!(todo.deadline, Some(1_700_000_000));

        let null = object(json!({"text": "x", "deadline": null}));
        let Payload::TodoAdd(todo) = Payload::decode(&Action::TodoAdd, &null).unwrap() else {
            panic!("expected todo_add payload");
        };
        assert_eq!(todo.deadline, None);
    }

    #[test]
    fn non_numeric_deadline_is_malformed() {
        let value = object(json!({"text": "x", "deadline": "tomorrow"}));
        assert!(Payload::decode(&Action::TodoAdd, &value).is_err());
    }

    #[test]
    fn frame_hands_back_the_received_value() {
        let chart = object(json!({"data": [[0, 1], [2, 3]], "x_bounds": [0, 10]}));
        let frame = Frame::try_from(Envelope::new(Action::Chart).with_value(chart.clone())).unwrap();
        assert_eq!(frame.value(), &chart);
        assert_eq!(frame.to_envelope().value, chart);

        let text = object(json!({"text": "hi", "color": null}));
        let frame = Frame::try_from(Envelope::new(Action::Text).with_value(text.clone())).unwrap();
        let Payload::Text(payload) = &frame.payload else {
            panic!("expected text payload");
        };
        assert_eq!(payload.color(), "white");
        assert_eq!(frame.to_envelope().value, text);
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let err = Payload::decode(&Action::TodoDone, &object(json!({"index": "3"}))).unwrap_err();
        assert!(matches!(err, FrameError::MalformedFrame(reason) if reason.contains("todo_done")));
    }

    #[test]
    fn negative_index_is_malformed() {
        assert!(Payload::decode(&Action::TodoDel, &object(json!({"index": -1}))).is_err());
    }

    #[test]
    fn missing_required_field_is_malformed() {
        assert!(Payload::decode(&Action::Image, &Map::new()).is_err());
        assert!(Payload::decode(&Action::Chart, &object(json!({"name": "cpu"}))).is_err());
    }

    #[test]
    fn chart_keeps_points_outside_bounds() {
        let value = object(json!({
            "data": [[1.0, 2.0], [50.0, 3.0], [4.0, -8.0]],
            "x_bounds": [0.0, 10.0],
            "y_bounds": [0.0, 10.0]
        }));
        let Payload::Chart(chart) = Payload::decode(&Action::Chart, &value).unwrap() else {
            panic!("expected chart payload");
        };
        assert_eq!(chart.data.len(), 3);
        assert_eq!(chart.visible_points().count(), 1);
        assert_eq!(chart.graph_type(), GraphType::Line);
        assert_eq!(chart.marker_type(), MarkerType::Braille);
    }

    #[test]
    fn color_text_lines_default_flags_to_false() {
        let value = object(json!({"lines": [{"text": "plain"}, {"text": "loud", "bold": true}]}));
        let Payload::ColorText(payload) = Payload::decode(&Action::ColorText, &value).unwrap()
        else {
            panic!("expected color_text payload");
        };
        let lines = payload.lines();
        assert_eq!(lines.len(), 2);
        assert!(!lines[0].is_bold());
        assert!(lines[1].is_bold());
        assert!(!lines[1].is_italic());
    }

    #[test]
    fn unknown_action_keeps_raw_value() {
        let value = object(json!({"anything": [1, 2, 3]}));
        let payload = Payload::decode(&Action::Unknown("sparkle".into()), &value).unwrap();
        assert_eq!(payload.action(), Action::Unknown("sparkle".into()));
        assert_eq!(payload.to_value(), value);
    }

    #[test]
    fn frame_converts_back_to_the_same_envelope() {
        let envelope = Envelope::new(Action::Print)
            .with_id("job")
            .with_value(object(json!({"text": "done", "stream": "stderr"})));
        let frame = Frame::try_from(envelope.clone()).unwrap();
        let Payload::Print(print) = &frame.payload else {
            panic!("expected print payload");
        };
        assert!(print.is_stderr());
        assert_eq!(frame.to_envelope(), envelope);
    }
}
