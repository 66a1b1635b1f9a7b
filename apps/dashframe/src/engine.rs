use std::io;

use bytes::Bytes;
use dashframe_proto::{decode, Action, Envelope, Frame, FrameError, Payload};
use frame_bus::{TransportError, TransportResult};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::console::Console;
use crate::registry::{WidgetKey, WidgetRegistry};
use crate::render::RenderBackend;
use crate::todo::{TodoError, TodoId, TodoList};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Todo(#[from] TodoError),
    #[error("frame source failed: {0}")]
    Transport(#[from] TransportError),
    #[error("render failed: {0}")]
    Render(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Drawn { key: WidgetKey, version: u64 },
    TodoAdded(TodoId),
    TodoDone(TodoId),
    TodoRemoved(TodoId),
    Printed,
    Reloaded,
    Exit,
    Ignored(Action),
}

/// What the caller should do after a frame has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The sender asked the dashboard to stop.
    Exit,
    /// The frame source ran dry before an `exit` arrived.
    Disconnected,
    /// The viewer closed the dashboard.
    Quit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub applied: u64,
    pub ignored: u64,
    pub skipped: u64,
    pub last_error: Option<String>,
    pub source_closed: bool,
}

/// Everything a renderer needs to draw one screen.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub widgets: WidgetRegistry,
    pub todos: TodoList,
    pub console: Console,
    pub stats: EngineStats,
}

impl DashboardState {
    pub fn snapshot(&self) -> Value {
        let widgets: Vec<Value> = self
            .widgets
            .iter()
            .map(|widget| {
                json!({
                    "id": widget.key.id,
                    "name": widget.key.name,
                    "action": widget.action().as_str(),
                    "version": widget.version,
                    "value": widget.value(),
                })
            })
            .collect();
        let todos: Vec<Value> = self
            .todos
            .iter()
            .map(|item| {
                json!({
                    "name": item.name,
                    "text": item.text,
                    "by": item.by,
                    "deadline": item.deadline,
                    "done": item.done,
                })
            })
            .collect();
        let console: Vec<Value> = self
            .console
            .iter()
            .map(|line| {
                json!({
                    "text": line.text,
                    "stream": if line.stderr { "stderr" } else { "stdout" },
                })
            })
            .collect();
        json!({
            "widgets": widgets,
            "todos": todos,
            "console": console,
            "stats": {
                "applied": self.stats.applied,
                "ignored": self.stats.ignored,
                "skipped": self.stats.skipped,
                "last_error": self.stats.last_error,
                "source_closed": self.stats.source_closed,
            },
        })
    }
}

/// Applies frames to the dashboard strictly in arrival order.
#[derive(Debug, Default)]
pub struct Engine {
    state: DashboardState,
}

impl Engine {
    pub fn new(console_lines: usize) -> Self {
        Self {
            state: DashboardState {
                console: Console::new(console_lines),
                ..DashboardState::default()
            },
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn into_state(self) -> DashboardState {
        self.state
    }

    pub fn apply_bytes(&mut self, bytes: &[u8]) -> Result<ApplyOutcome, EngineError> {
        let envelope = decode(bytes)?;
        self.apply_envelope(&envelope)
    }

    pub fn apply_envelope(&mut self, envelope: &Envelope) -> Result<ApplyOutcome, EngineError> {
        let frame = Frame::from_envelope(envelope)?;
        self.apply_frame(frame)
    }

    pub fn apply_frame(&mut self, frame: Frame) -> Result<ApplyOutcome, EngineError> {
        let action = frame.action();
        let outcome = if action.is_draw() {
            let key = WidgetKey::new(frame.id.clone(), frame.name.clone());
            let Some(version) = self.state.widgets.apply(frame) else {
                return Ok(ApplyOutcome::Ignored(action));
            };
            ApplyOutcome::Drawn { key, version }
        } else {
            self.apply_control(frame)?
        };
        trace!(target: "dashframe::engine", ?outcome, "frame applied");
        Ok(outcome)
    }

    fn apply_control(&mut self, frame: Frame) -> Result<ApplyOutcome, EngineError> {
        let state = &mut self.state;
        let outcome = match frame.payload {
            Payload::TodoAdd(add) => {
                let id = state.todos.add(
                    frame.id,
                    add.text,
                    add.by.unwrap_or_default(),
                    add.deadline.unwrap_or_default(),
                );
                ApplyOutcome::TodoAdded(id)
            }
            Payload::TodoDone(target) => ApplyOutcome::TodoDone(state.todos.mark_done(target.index)?),
            Payload::TodoDel(target) => {
                ApplyOutcome::TodoRemoved(state.todos.remove(target.index)?.id)
            }
            Payload::Print(print) => {
                info!(
                    target: "dashframe::console",
                    stream = if print.is_stderr() { "stderr" } else { "stdout" },
                    "{}",
                    print.text
                );
                state.console.push(&print);
                ApplyOutcome::Printed
            }
            Payload::Reload(_) => {
                state.widgets.reset();
                state.todos.clear();
                debug!(target: "dashframe::engine", "dashboard reloaded");
                ApplyOutcome::Reloaded
            }
            Payload::Exit(_) => ApplyOutcome::Exit,
            Payload::Unknown { action, .. } => {
                debug!(target: "dashframe::engine", %action, "ignoring unknown action");
                ApplyOutcome::Ignored(Action::Unknown(action))
            }
            other => ApplyOutcome::Ignored(other.action()),
        };
        Ok(outcome)
    }

    /// Records that no more frames will arrive.
    pub fn close_source(&mut self) {
        if !self.state.stats.source_closed {
            info!(target: "dashframe::engine", "frame source closed");
        }
        self.state.stats.source_closed = true;
    }

    /// Applies one raw frame. Malformed or inapplicable frames are logged,
    /// counted and skipped so the stream keeps flowing.
    pub fn process(&mut self, bytes: &[u8]) -> Control {
        match self.apply_bytes(bytes) {
            Ok(ApplyOutcome::Exit) => {
                self.state.stats.applied += 1;
                info!(target: "dashframe::engine", "exit requested");
                Control::Exit
            }
            Ok(ApplyOutcome::Ignored(_)) => {
                self.state.stats.ignored += 1;
                Control::Continue
            }
            Ok(_) => {
                self.state.stats.applied += 1;
                Control::Continue
            }
            Err(err) => {
                warn!(target: "dashframe::engine", error = %err, bytes = bytes.len(), "skipping frame");
                self.state.stats.skipped += 1;
                self.state.stats.last_error = Some(err.to_string());
                Control::Continue
            }
        }
    }

    /// Drains `frames` into the dashboard, drawing after every frame. Stops
    /// at `exit` once the final state has been drawn, at the end of input,
    /// or when the source itself fails.
    pub fn run<I, R>(&mut self, frames: I, renderer: &mut R) -> Result<SessionEnd, EngineError>
    where
        I: IntoIterator<Item = TransportResult<Bytes>>,
        R: RenderBackend + ?Sized,
    {
        for frame in frames {
            let bytes = frame?;
            let control = self.process(&bytes);
            renderer.draw(&self.state)?;
            if control == Control::Exit {
                return Ok(SessionEnd::Exit);
            }
        }
        self.close_source();
        renderer.draw(&self.state)?;
        Ok(SessionEnd::Disconnected)
    }
}
