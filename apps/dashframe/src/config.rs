use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::console::DEFAULT_CONSOLE_LINES;

const DEFAULT_TICK_MS: u64 = 100;
const DEFAULT_CHANNEL_CAPACITY: usize = 256;
/// Where the terminal UI sends its logs unless told otherwise.
pub const DEFAULT_TUI_LOG_FILE: &str = "run.log";

/// Receiver tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long the terminal loop waits for input before redrawing.
    pub tick: Duration,
    /// Rows of `print` output kept for the console pane.
    pub console_lines: usize,
    /// Frames buffered between the reader thread and the render loop.
    pub channel_capacity: usize,
    pub tui_log_file: PathBuf,
}

impl Config {
    /// Load configuration from `DASHFRAME_*` environment variables, falling
    /// back to the defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick: env_parse("DASHFRAME_TICK_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick),
            console_lines: env_parse("DASHFRAME_CONSOLE_LINES").unwrap_or(defaults.console_lines),
            channel_capacity: env_parse("DASHFRAME_CHANNEL_CAPACITY")
                .unwrap_or(defaults.channel_capacity),
            tui_log_file: env::var_os("DASHFRAME_TUI_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.tui_log_file),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            console_lines: DEFAULT_CONSOLE_LINES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            tui_log_file: PathBuf::from(DEFAULT_TUI_LOG_FILE),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    env::var(var).ok()?.trim().parse().ok()
}
