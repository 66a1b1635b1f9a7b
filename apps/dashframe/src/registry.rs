use std::collections::HashMap;

use dashframe_proto::{Action, Frame, Payload};
use serde_json::{Map, Value};

/// Widgets are addressed by the sender's session id plus the widget name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetKey {
    pub id: String,
    pub name: String,
}

impl WidgetKey {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Human-facing label: the name, qualified by the id when one was sent.
    pub fn label(&self) -> String {
        match (self.id.is_empty(), self.name.is_empty()) {
            (true, _) => self.name.clone(),
            (false, true) => self.id.clone(),
            (false, false) => format!("{}/{}", self.id, self.name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Widget {
    pub key: WidgetKey,
    pub payload: Payload,
    pub version: u64,
    received: Map<String, Value>,
}

impl Widget {
    fn new(key: WidgetKey, payload: Payload, received: Map<String, Value>) -> Self {
        Self {
            key,
            payload,
            version: 0,
            received,
        }
    }

    pub fn action(&self) -> Action {
        self.payload.action()
    }

    /// The last applied value, exactly as it arrived.
    pub fn value(&self) -> Map<String, Value> {
        self.received.clone()
    }

    fn increment_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }
}

/// Current state of every drawn widget. Each apply bumps the widget's
/// version, even when the payload is unchanged. Iteration follows first
/// insertion so the layout stays put while widgets update.
#[derive(Debug, Default)]
pub struct WidgetRegistry {
    widgets: HashMap<WidgetKey, Widget>,
    order: Vec<WidgetKey>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the widget for a draw frame and returns its new version.
    /// Frames for any other action leave the registry untouched.
    pub fn apply(&mut self, frame: Frame) -> Option<u64> {
        if !frame.action().is_draw() {
            return None;
        }
        let (id, name, payload, received) = frame.into_parts();
        let key = WidgetKey::new(id, name);
        let widget = match self.widgets.get_mut(&key) {
            Some(widget) => {
                widget.payload = payload;
                widget.received = received;
                widget
            }
            None => {
                self.order.push(key.clone());
                self.widgets
                    .entry(key.clone())
                    .or_insert_with(|| Widget::new(key, payload, received))
            }
        };
        Some(widget.increment_version())
    }

    /// Drops every widget; the next draw for any key starts over at version 1.
    pub fn reset(&mut self) {
        self.widgets.clear();
        self.order.clear();
    }

    pub fn get(&self, key: &WidgetKey) -> Option<&Widget> {
        self.widgets.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Widget> {
        self.order.iter().filter_map(|key| self.widgets.get(key))
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}
