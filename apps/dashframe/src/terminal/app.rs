use std::fs::File;
use std::io::{self, BufReader, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::Receiver;
use dashframe_client::Client;
use frame_bus::{FrameReader, TransportResult};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::demo;
use crate::engine::{Engine, SessionEnd};
use crate::render::{NullRenderer, screenshot};
use crate::telemetry::logging;
use crate::terminal::cli::{Cli, Command};
use crate::terminal::error::CliError;
use crate::terminal::tui;

pub type FrameSource = Box<dyn Iterator<Item = TransportResult<Bytes>> + Send>;

const DEMO_SESSION: &str = "demo";

pub fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.engine.apply(Config::from_env());
    let headless = cli.engine.headless();

    let mut log_config = cli.logging.to_config();
    if !headless && log_config.file.is_none() {
        log_config.file = Some(config.tui_log_file.clone());
    }
    logging::init(&log_config).map_err(|err| CliError::Logging(err.to_string()))?;

    if config.channel_capacity == 0 {
        return Err(CliError::InvalidArgument(
            "channel capacity must be at least 1".into(),
        ));
    }

    let source = match cli.command {
        Some(Command::Demo(args)) => spawn_demo(&config, Duration::from_millis(args.step_ms))?,
        Some(Command::Run) | None => open_input(&cli.engine.input)?,
    };

    let mut engine = Engine::new(config.console_lines);
    let end = if headless {
        run_headless(&mut engine, source, io::stdout().lock())?
    } else {
        run_tui(&mut engine, source, &config)?
    };

    if let Some(path) = &cli.engine.screenshot {
        screenshot::save(engine.state(), cli.engine.screenshot_size, path)?;
        info!(target: "dashframe::app", path = %path.display(), "screenshot saved");
    }

    let stats = &engine.state().stats;
    info!(
        target: "dashframe::app",
        ?end,
        applied = stats.applied,
        ignored = stats.ignored,
        skipped = stats.skipped,
        "session ended"
    );
    Ok(())
}

/// Applies every frame, then writes the final dashboard state as JSON.
pub fn run_headless<W: Write>(
    engine: &mut Engine,
    source: FrameSource,
    mut out: W,
) -> Result<SessionEnd, CliError> {
    let end = engine.run(source, &mut NullRenderer::default())?;
    serde_json::to_writer_pretty(&mut out, &engine.state().snapshot())?;
    writeln!(out)?;
    out.flush()?;
    Ok(end)
}

fn run_tui(engine: &mut Engine, source: FrameSource, config: &Config) -> Result<SessionEnd, CliError> {
    let frames = spawn_reader(source, config.channel_capacity)?;
    tui::install_panic_hook();
    let mut terminal = tui::setup_tui()?;
    let result = tui::run_loop(engine, &frames, config.tick, &mut terminal);
    tui::teardown_tui()?;
    result
}

pub fn open_input(input: &str) -> Result<FrameSource, CliError> {
    if input == "-" {
        debug!(target: "dashframe::app", "reading frames from stdin");
        return Ok(Box::new(FrameReader::new(BufReader::new(io::stdin()))));
    }
    let file = File::open(input).map_err(|source| CliError::Input {
        path: input.to_string(),
        source,
    })?;
    debug!(target: "dashframe::app", path = input, "reading frames from file");
    Ok(Box::new(FrameReader::new(BufReader::new(file))))
}

/// Moves blocking reads off the render loop.
fn spawn_reader(
    source: FrameSource,
    capacity: usize,
) -> Result<Receiver<TransportResult<Bytes>>, CliError> {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    thread::Builder::new()
        .name("dashframe-reader".into())
        .spawn(move || {
            for frame in source {
                if tx.send(frame).is_err() {
                    break;
                }
            }
            debug!(target: "dashframe::app", "reader finished");
        })?;
    Ok(rx)
}

fn spawn_demo(config: &Config, step: Duration) -> Result<FrameSource, CliError> {
    let (transport, receiver) = frame_bus::channel(config.channel_capacity);
    let client = Client::new(Arc::new(transport)).with_session(DEMO_SESSION);
    thread::Builder::new()
        .name("dashframe-demo".into())
        .spawn(move || {
            if let Err(err) = demo::run_script(&client, step) {
                warn!(target: "dashframe::demo", error = %err, "demo script stopped");
            }
        })?;
    Ok(Box::new(receiver.into_inner().into_iter().map(Ok)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn source(lines: &'static str) -> FrameSource {
        Box::new(FrameReader::new(lines.as_bytes()))
    }

    #[test]
    fn headless_prints_snapshot() {
        let mut engine = Engine::default();
        let mut out = Vec::new();
        let end = run_headless(
            &mut engine,
            source(concat!(
                r#"{"id":"","action":"text","name":"clock","value":"{\"text\":\"12:00\"}"}"#,
                "\n\n",
                r#"{"action":"exit"}"#,
                "\n",
            )),
            &mut out,
        )
        .unwrap();
        assert_eq!(end, SessionEnd::Exit);

        let snapshot: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(snapshot["widgets"][0]["value"]["text"], "12:00");
        assert_eq!(snapshot["stats"]["applied"], 2);
    }

    #[test]
    fn missing_input_file_is_reported() {
        let err = open_input("/definitely/not/here.ndjson").err().unwrap();
        assert!(matches!(err, CliError::Input { ref path, .. } if path.ends_with("here.ndjson")));
    }

    #[test]
    fn demo_source_runs_to_exit() {
        let _lock = demo::SCRIPT_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let config = Config::default();
        let mut engine = Engine::new(config.console_lines);
        let source = spawn_demo(&config, Duration::ZERO).unwrap();
        let end = run_headless(&mut engine, source, io::sink()).unwrap();
        assert_eq!(end, SessionEnd::Exit);
        assert_eq!(engine.state().todos.len(), 2);
    }
}
