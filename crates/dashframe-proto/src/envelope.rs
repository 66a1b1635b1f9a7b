use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Command kind carried by an envelope.
///
/// The set is open-ended: anything the decoder does not recognise is kept as
/// [`Action::Unknown`] so newer clients can talk to older engines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Text,
    ColorText,
    Big,
    Image,
    Chart,
    TodoAdd,
    TodoDone,
    TodoDel,
    Reload,
    Exit,
    Print,
    Unknown(String),
}

impl Action {
    pub fn parse(value: &str) -> Self {
        match value {
            "text" => Action::Text,
            "color_text" => Action::ColorText,
            "big" => Action::Big,
            "image" => Action::Image,
            "chart" => Action::Chart,
            "todo_add" => Action::TodoAdd,
            "todo_done" => Action::TodoDone,
            "todo_del" => Action::TodoDel,
            "reload" => Action::Reload,
            "exit" => Action::Exit,
            "print" => Action::Print,
            other => Action::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Text => "text",
            Action::ColorText => "color_text",
            Action::Big => "big",
            Action::Image => "image",
            Action::Chart => "chart",
            Action::TodoAdd => "todo_add",
            Action::TodoDone => "todo_done",
            Action::TodoDel => "todo_del",
            Action::Reload => "reload",
            Action::Exit => "exit",
            Action::Print => "print",
            Action::Unknown(raw) => raw.as_str(),
        }
    }

    /// Actions that upsert a keyed widget.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Action::Text | Action::ColorText | Action::Big | Action::Image | Action::Chart
        )
    }

    /// Actions that mutate the positional todo list.
    pub fn is_todo(&self) -> bool {
        matches!(self, Action::TodoAdd | Action::TodoDone | Action::TodoDel)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Action::Unknown(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Action {
    fn from(value: &str) -> Self {
        Action::parse(value)
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Action::parse(&raw))
    }
}

/// Envelope shapes observed over the lifetime of the protocol.
///
/// - `V0`: `{action}` only; lifecycle frames from the first scripting bridge.
/// - `V1`: `{action, name, value}`.
/// - `V2`: `{id, action, name, value}`, the current shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaVersion {
    V0,
    V1,
    #[default]
    V2,
}

impl SchemaVersion {
    pub const LATEST: SchemaVersion = SchemaVersion::V2;

    pub fn carries_id(self) -> bool {
        self >= SchemaVersion::V2
    }
}

/// The `{id, action, name, value}` unit sent over the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub id: String,
    pub action: Action,
    pub name: String,
    pub value: Map<String, Value>,
}

impl Envelope {
    pub fn new(action: Action) -> Self {
        Self {
            id: String::new(),
            action,
            name: String::new(),
            value: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_value(mut self, value: Map<String, Value>) -> Self {
        self.value = value;
        self
    }
}
