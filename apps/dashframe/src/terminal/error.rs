use std::io;

use dashframe_client::CaptureError;
use frame_bus::TransportError;
use thiserror::Error;

use crate::engine::EngineError;
use crate::render::ScreenshotError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Engine(#[from] EngineError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to open input {path}: {source}")]
    Input { path: String, source: io::Error },
    #[error("demo script failed: {0}")]
    Demo(#[from] TransportError),
    #[error("output capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("snapshot output failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("{0}")]
    Screenshot(#[from] ScreenshotError),
    #[error("terminal runtime error: {0}")]
    Runtime(String),
    #[error("logging initialization failed: {0}")]
    Logging(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
