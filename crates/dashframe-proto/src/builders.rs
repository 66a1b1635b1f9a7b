//! Command builders: pure functions from typed arguments to `(action, name, value)`.
//!
//! Builders always write every documented field explicitly, defaults included,
//! so receivers never have to guess what the sender meant.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::envelope::{Action, Envelope};
use crate::payload::{
    ChartPayload, ColorTextPayload, ImagePayload, PrintPayload, StyledLine, TextPayload,
    TodoAddPayload, TodoIndexPayload,
};

pub const DEFAULT_COLOR: &str = "white";
pub const DEFAULT_ALIGN: Align = Align::Center;
pub const DEFAULT_BOUNDS: (f64, f64) = (0.0, 10.0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Align::Left),
            "center" | "centre" => Some(Align::Center),
            "right" => Some(Align::Right),
            _ => None,
        }
    }

    pub(crate) fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(Align::parse).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GraphType {
    #[default]
    Line,
    Scatter,
    Bar,
}

impl GraphType {
    pub fn as_str(self) -> &'static str {
        match self {
            GraphType::Line => "line",
            GraphType::Scatter => "scatter",
            GraphType::Bar => "bar",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "line" => Some(GraphType::Line),
            "scatter" => Some(GraphType::Scatter),
            "bar" => Some(GraphType::Bar),
            _ => None,
        }
    }

    pub(crate) fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(GraphType::parse).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkerType {
    #[default]
    Braille,
    Dot,
    Block,
    Bar,
    HalfBlock,
}

impl MarkerType {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerType::Braille => "braille",
            MarkerType::Dot => "dot",
            MarkerType::Block => "block",
            MarkerType::Bar => "bar",
            MarkerType::HalfBlock => "half_block",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "braille" => Some(MarkerType::Braille),
            "dot" => Some(MarkerType::Dot),
            "block" => Some(MarkerType::Block),
            "bar" => Some(MarkerType::Bar),
            "half_block" | "halfblock" => Some(MarkerType::HalfBlock),
            _ => None,
        }
    }

    pub(crate) fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(MarkerType::parse).unwrap_or_default()
    }
}

/// Display options shared by `text`, `big` and `color_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOptions {
    pub color: String,
    pub align: Align,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            align: DEFAULT_ALIGN,
        }
    }
}

impl TextOptions {
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Chart data plus display metadata; `ChartSpec::new(data)` fills every default.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub data: Vec<(f64, f64)>,
    pub name: String,
    pub description: String,
    pub graph_type: GraphType,
    pub marker_type: MarkerType,
    pub color: String,
    pub x_title: String,
    pub x_color: String,
    pub x_bounds: (f64, f64),
    pub x_labels: Vec<String>,
    pub y_title: String,
    pub y_color: String,
    pub y_bounds: (f64, f64),
    pub y_labels: Vec<String>,
}

impl ChartSpec {
    pub fn new(data: Vec<(f64, f64)>) -> Self {
        Self {
            data,
            name: String::new(),
            description: String::new(),
            graph_type: GraphType::default(),
            marker_type: MarkerType::default(),
            color: DEFAULT_COLOR.to_string(),
            x_title: String::new(),
            x_color: DEFAULT_COLOR.to_string(),
            x_bounds: DEFAULT_BOUNDS,
            x_labels: Vec::new(),
            y_title: String::new(),
            y_color: DEFAULT_COLOR.to_string(),
            y_bounds: DEFAULT_BOUNDS,
            y_labels: Vec::new(),
        }
    }

    pub fn titled(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = name.into();
        self.description = description.into();
        self
    }

    pub fn graph(mut self, graph_type: GraphType, marker_type: MarkerType) -> Self {
        self.graph_type = graph_type;
        self.marker_type = marker_type;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn x_axis(
        mut self,
        title: impl Into<String>,
        bounds: (f64, f64),
        labels: Vec<String>,
    ) -> Self {
        self.x_title = title.into();
        self.x_bounds = bounds;
        self.x_labels = labels;
        self
    }

    pub fn y_axis(
        mut self,
        title: impl Into<String>,
        bounds: (f64, f64),
        labels: Vec<String>,
    ) -> Self {
        self.y_title = title.into();
        self.y_bounds = bounds;
        self.y_labels = labels;
        self
    }

    pub fn axis_colors(mut self, x_color: impl Into<String>, y_color: impl Into<String>) -> Self {
        self.x_color = x_color.into();
        self.y_color = y_color.into();
        self
    }
}

/// A built command before it is addressed to a session.
///
/// `id` is only set by builders whose action reuses the envelope id as data
/// (`todo_add`); everything else takes the sender's session id.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: Option<String>,
    pub action: Action,
    pub name: String,
    pub value: Map<String, Value>,
}

impl Command {
    fn new<T: Serialize>(action: Action, name: impl Into<String>, payload: &T) -> Self {
        let value = match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self {
            id: None,
            action,
            name: name.into(),
            value,
        }
    }

    fn bare(action: Action) -> Self {
        Self {
            id: None,
            action,
            name: String::new(),
            value: Map::new(),
        }
    }

    /// Addresses the command, producing the four-field envelope. Whether `id`
    /// reaches the wire depends on the schema version used to encode it.
    pub fn into_envelope(self, session_id: &str) -> Envelope {
        Envelope {
            id: self.id.unwrap_or_else(|| session_id.to_string()),
            action: self.action,
            name: self.name,
            value: self.value,
        }
    }
}

/// One styled line for [`color_text`]; pure payload constructor.
pub fn make_text(
    text: impl Into<String>,
    bold: bool,
    underline: bool,
    italic: bool,
    crossline: bool,
) -> StyledLine {
    StyledLine {
        text: text.into(),
        bold: Some(bold),
        underline: Some(underline),
        italic: Some(italic),
        crossline: Some(crossline),
        extra: Map::new(),
    }
}

pub fn text(name: impl Into<String>, text: impl Into<String>, options: &TextOptions) -> Command {
    Command::new(Action::Text, name, &text_payload(text, options))
}

pub fn big(name: impl Into<String>, text: impl Into<String>, options: &TextOptions) -> Command {
    Command::new(Action::Big, name, &text_payload(text, options))
}

/// Stacked styled lines, rendered in the order given.
pub fn color_text(name: impl Into<String>, lines: Vec<StyledLine>, options: &TextOptions) -> Command {
    let payload = ColorTextPayload {
        color: Some(options.color.clone()),
        lines: Some(lines),
        align: Some(options.align.as_str().to_string()),
        extra: Map::new(),
    };
    Command::new(Action::ColorText, name, &payload)
}

pub fn image(name: impl Into<String>, filepath: impl Into<String>) -> Command {
    let payload = ImagePayload {
        filepath: filepath.into(),
        extra: Map::new(),
    };
    Command::new(Action::Image, name, &payload)
}

pub fn chart(name: impl Into<String>, spec: ChartSpec) -> Command {
    let payload = ChartPayload {
        data: spec.data,
        name: Some(spec.name),
        description: Some(spec.description),
        graph_type: Some(spec.graph_type.as_str().to_string()),
        marker_type: Some(spec.marker_type.as_str().to_string()),
        color: Some(spec.color),
        x_title: Some(spec.x_title),
        x_color: Some(spec.x_color),
        x_bounds: Some(spec.x_bounds),
        x_labels: Some(spec.x_labels),
        y_title: Some(spec.y_title),
        y_color: Some(spec.y_color),
        y_bounds: Some(spec.y_bounds),
        y_labels: Some(spec.y_labels),
        extra: Map::new(),
    };
    Command::new(Action::Chart, name, &payload)
}

/// Appends a todo item. `id` becomes both the envelope id and the item's
/// display name on the receiver.
pub fn todo_add(
    id: impl Into<String>,
    text: impl Into<String>,
    by: impl Into<String>,
    deadline: i64,
) -> Command {
    let payload = TodoAddPayload {
        text: text.into(),
        by: Some(by.into()),
        deadline: Some(deadline),
        extra: Map::new(),
    };
    let mut command = Command::new(Action::TodoAdd, "", &payload);
    command.id = Some(id.into());
    command
}

pub fn todo_done(index: usize) -> Command {
    Command::new(Action::TodoDone, "", &index_payload(index))
}

pub fn todo_del(index: usize) -> Command {
    Command::new(Action::TodoDel, "", &index_payload(index))
}

pub fn reload() -> Command {
    Command::bare(Action::Reload)
}

pub fn exit() -> Command {
    Command::bare(Action::Exit)
}

pub fn print(text: impl Into<String>) -> Command {
    print_to(text, "stdout")
}

pub fn print_to(text: impl Into<String>, stream: &str) -> Command {
    let payload = PrintPayload {
        text: text.into(),
        stream: Some(stream.to_string()),
        extra: Map::new(),
    };
    Command::new(Action::Print, "", &payload)
}

fn text_payload(text: impl Into<String>, options: &TextOptions) -> TextPayload {
    TextPayload {
        text: text.into(),
        color: Some(options.color.clone()),
        align: Some(options.align.as_str().to_string()),
        extra: Map::new(),
    }
}

fn index_payload(index: usize) -> TodoIndexPayload {
    TodoIndexPayload {
        index,
        extra: Map::new(),
    }
}
