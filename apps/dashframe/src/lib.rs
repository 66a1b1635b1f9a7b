pub mod config;
pub mod console;
pub mod demo;
pub mod engine;
pub mod registry;
pub mod render;
pub mod telemetry;
pub mod terminal;
pub mod todo;

pub use engine::{ApplyOutcome, Control, DashboardState, Engine, EngineError, SessionEnd};
pub use registry::{Widget, WidgetKey, WidgetRegistry};
pub use todo::{TodoError, TodoId, TodoItem, TodoList};
