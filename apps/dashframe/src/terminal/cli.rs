use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use std::path::PathBuf;

use crate::config::Config;
use crate::render::ScreenSize;
use crate::telemetry::logging::{LogConfig, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "dashframe",
    about = "Terminal dashboard driven by newline-delimited JSON frames",
    author,
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    #[arg(
        long = "log-level",
        global = true,
        value_enum,
        env = "DASHFRAME_LOG_LEVEL",
        default_value_t = LogLevel::Warn,
        help = "Minimum log level (error, warn, info, debug, trace)"
    )]
    pub level: LogLevel,

    #[arg(
        long = "log-file",
        global = true,
        value_name = "PATH",
        env = "DASHFRAME_LOG_FILE",
        help = "Write structured logs to the specified file (the terminal UI defaults to run.log)"
    )]
    pub file: Option<PathBuf>,
}

impl LoggingArgs {
    pub fn to_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            file: self.file.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = "DASHFRAME_INPUT",
        default_value = "-",
        help = "File to read frames from, one JSON envelope per line ('-' for stdin)"
    )]
    pub input: String,

    #[arg(
        long,
        global = true,
        env = "DASHFRAME_HEADLESS",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        value_name = "BOOL",
        help = "Apply frames without a terminal UI and print the final state as JSON"
    )]
    pub headless: Option<bool>,

    #[arg(
        long = "tick-ms",
        global = true,
        value_name = "MS",
        help = "Redraw interval while waiting for frames or keys"
    )]
    pub tick_ms: Option<u64>,

    #[arg(
        long = "console-lines",
        global = true,
        value_name = "LINES",
        help = "Rows of printed output kept in the console pane"
    )]
    pub console_lines: Option<usize>,

    #[arg(
        long = "channel-capacity",
        global = true,
        value_name = "FRAMES",
        help = "Frames buffered between the reader and the render loop"
    )]
    pub channel_capacity: Option<usize>,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = "DASHFRAME_SCREENSHOT",
        help = "Save a PNG of the final dashboard when the session ends"
    )]
    pub screenshot: Option<PathBuf>,

    #[arg(
        long = "screenshot-size",
        global = true,
        value_name = "COLSxROWS",
        default_value_t = ScreenSize::default(),
        value_parser = parse_screen_size,
        help = "Cells rendered into the screenshot"
    )]
    pub screenshot_size: ScreenSize,
}

fn parse_screen_size(raw: &str) -> Result<ScreenSize, String> {
    raw.parse()
}

impl EngineArgs {
    pub fn headless(&self) -> bool {
        self.headless.unwrap_or(false)
    }

    /// Layers explicit flags over environment-derived settings.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(ms) = self.tick_ms {
            config.tick = std::time::Duration::from_millis(ms);
        }
        if let Some(lines) = self.console_lines {
            config.console_lines = lines;
        }
        if let Some(capacity) = self.channel_capacity {
            config.channel_capacity = capacity;
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read frames and draw the dashboard (default when no subcommand given)
    Run,
    /// Drive the dashboard from a built-in scripted client
    Demo(DemoArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    #[arg(
        long = "step-ms",
        default_value_t = 400u64,
        value_name = "MS",
        help = "Pause between scripted steps"
    )]
    pub step_ms: u64,
}

pub fn parse() -> Cli {
    Cli::parse()
}
