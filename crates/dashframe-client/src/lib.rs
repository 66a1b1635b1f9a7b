//! Client-side helpers for scripts that drive a dashboard engine.
//! The [`Client`] turns typed calls into envelopes and pushes them through a
//! [`Transport`]; [`capture::OutputCapture`] routes printed output into the
//! same channel.

use std::sync::Arc;

use bytes::Bytes;
use dashframe_proto::{
    builders, encode_versioned, ChartSpec, Command, SchemaVersion, StyledLine, TextOptions,
};
use frame_bus::{Fetch, HttpFetcher, Transport, TransportResult};
use once_cell::sync::OnceCell;
use tracing::trace;

pub mod capture;

pub use capture::{CaptureError, CaptureWriter, OutputCapture, Stream};
pub use dashframe_proto::builders::make_text;

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    fetcher: Arc<OnceCell<Arc<dyn Fetch>>>,
    session_id: String,
    version: SchemaVersion,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            fetcher: Arc::new(OnceCell::new()),
            session_id: String::new(),
            version: SchemaVersion::LATEST,
        }
    }

    /// Sets the id stamped on every envelope this client sends.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Speaks an older envelope shape, for engines that predate `id`.
    pub fn with_version(mut self, version: SchemaVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_fetcher(self, fetcher: Arc<dyn Fetch>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(fetcher);
        Self {
            fetcher: Arc::new(cell),
            ..self
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn send_command(&self, command: Command) -> TransportResult<()> {
        let envelope = command.into_envelope(&self.session_id);
        let bytes = encode_versioned(&envelope, self.version)?;
        trace!(
            target: "dashframe::client",
            action = %envelope.action,
            name = %envelope.name,
            bytes = bytes.len(),
            "sending frame"
        );
        self.transport.send_bytes(Bytes::from(bytes))
    }

    pub fn text(&self, name: &str, text: &str) -> TransportResult<()> {
        self.text_with(name, text, &TextOptions::default())
    }

    pub fn text_with(&self, name: &str, text: &str, options: &TextOptions) -> TransportResult<()> {
        self.send_command(builders::text(name, text, options))
    }

    pub fn color_text(
        &self,
        name: &str,
        lines: Vec<StyledLine>,
        options: &TextOptions,
    ) -> TransportResult<()> {
        self.send_command(builders::color_text(name, lines, options))
    }

    pub fn big(&self, name: &str, text: &str, options: &TextOptions) -> TransportResult<()> {
        self.send_command(builders::big(name, text, options))
    }

    pub fn image(&self, name: &str, filepath: &str) -> TransportResult<()> {
        self.send_command(builders::image(name, filepath))
    }

    pub fn chart(&self, name: &str, spec: ChartSpec) -> TransportResult<()> {
        self.send_command(builders::chart(name, spec))
    }

    /// Appends a todo item; `id` doubles as the item's display name.
    pub fn todo_add(&self, id: &str, text: &str, by: &str, deadline: i64) -> TransportResult<()> {
        self.send_command(builders::todo_add(id, text, by, deadline))
    }

    pub fn todo_done(&self, index: usize) -> TransportResult<()> {
        self.send_command(builders::todo_done(index))
    }

    pub fn todo_del(&self, index: usize) -> TransportResult<()> {
        self.send_command(builders::todo_del(index))
    }

    pub fn reload(&self) -> TransportResult<()> {
        self.send_command(builders::reload())
    }

    pub fn exit(&self) -> TransportResult<()> {
        self.send_command(builders::exit())
    }

    pub fn print(&self, text: &str) -> TransportResult<()> {
        self.print_to(Stream::Stdout, text)
    }

    pub fn print_to(&self, stream: Stream, text: &str) -> TransportResult<()> {
        self.send_command(builders::print_to(text, stream.as_str()))
    }

    /// Performs an HTTP request through the configured fetcher, defaulting to
    /// a blocking `reqwest` client created on first use.
    pub fn fetch(&self, method: &str, url: &str) -> TransportResult<String> {
        self.fetcher
            .get_or_init(|| Arc::new(HttpFetcher::new()))
            .fetch(method, url)
    }

    /// Routes captured output into `print` frames until the handle is released.
    pub fn capture_output(&self) -> Result<OutputCapture, CaptureError> {
        OutputCapture::install(self.clone())
    }
}
