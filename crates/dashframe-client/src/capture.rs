//! Output capture: printed text becomes `print` frames on the dashboard.
//!
//! A capture is an explicit, scoped handle. While one is installed,
//! [`dash_println!`](crate::dash_println) / [`dash_eprintln!`](crate::dash_eprintln)
//! and any [`CaptureWriter`] send completed lines over the client's
//! transport; once it is released they fall back to the real stdout/stderr.
//! At most one capture is installed per process.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use frame_bus::TransportError;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    pub fn as_str(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("an output capture is already installed")]
    AlreadyInstalled,
    #[error("{0}")]
    Transport(#[from] TransportError),
}

struct CaptureSink {
    client: Client,
    active: AtomicBool,
}

static ACTIVE: Lazy<Mutex<Option<Arc<CaptureSink>>>> = Lazy::new(|| Mutex::new(None));

/// Handle for an installed capture. Dropping it releases the capture too,
/// discarding any error from the final flush.
pub struct OutputCapture {
    sink: Arc<CaptureSink>,
    stdout: CaptureWriter,
    stderr: CaptureWriter,
    released: bool,
}

impl OutputCapture {
    pub fn install(client: Client) -> Result<Self, CaptureError> {
        let mut active = ACTIVE.lock();
        if active.is_some() {
            return Err(CaptureError::AlreadyInstalled);
        }
        let sink = Arc::new(CaptureSink {
            client,
            active: AtomicBool::new(true),
        });
        *active = Some(Arc::clone(&sink));
        debug!(target: "dashframe::capture", "output capture installed");
        Ok(Self {
            stdout: CaptureWriter::new(Arc::clone(&sink), Stream::Stdout),
            stderr: CaptureWriter::new(Arc::clone(&sink), Stream::Stderr),
            sink,
            released: false,
        })
    }

    pub fn is_installed() -> bool {
        ACTIVE.lock().is_some()
    }

    /// A writer for `stream` bound to this capture.
    pub fn writer(&self, stream: Stream) -> CaptureWriter {
        CaptureWriter::new(Arc::clone(&self.sink), stream)
    }

    /// Line-buffered writer behind [`dash_println!`](crate::dash_println).
    pub fn stdout(&mut self) -> &mut CaptureWriter {
        &mut self.stdout
    }

    /// Line-buffered writer behind [`dash_eprintln!`](crate::dash_eprintln).
    pub fn stderr(&mut self) -> &mut CaptureWriter {
        &mut self.stderr
    }

    /// Flushes partial lines and uninstalls the capture.
    pub fn release(mut self) -> Result<(), CaptureError> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<(), CaptureError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let flushed = self.stdout.flush().and(self.stderr.flush());
        self.sink.active.store(false, Ordering::SeqCst);
        {
            let mut active = ACTIVE.lock();
            if active
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &self.sink))
            {
                *active = None;
            }
        }
        debug!(target: "dashframe::capture", "output capture released");
        flushed.map_err(|err| match err.into_inner() {
            Some(inner) => match inner.downcast::<TransportError>() {
                Ok(transport) => CaptureError::Transport(*transport),
                Err(other) => CaptureError::Transport(TransportError::Io(io::Error::other(other))),
            },
            None => CaptureError::Transport(TransportError::Closed),
        })
    }
}

impl Drop for OutputCapture {
    fn drop(&mut self) {
        if let Err(err) = self.release_inner() {
            warn!(target: "dashframe::capture", error = %err, "final capture flush failed");
        }
    }
}

/// `std::io::Write` adapter that turns each completed line into one `print`
/// frame. `flush` sends a trailing partial line. After the owning capture is
/// released, writes go to the process's real stream instead.
pub struct CaptureWriter {
    sink: Arc<CaptureSink>,
    stream: Stream,
    pending: Vec<u8>,
}

impl CaptureWriter {
    fn new(sink: Arc<CaptureSink>, stream: Stream) -> Self {
        Self {
            sink,
            stream,
            pending: Vec::new(),
        }
    }

    fn emit(&self, line: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(line);
        self.sink
            .client
            .print_to(self.stream, &text)
            .map_err(io::Error::other)
    }

    fn passthrough(&self, buf: &[u8]) -> io::Result<()> {
        match self.stream {
            Stream::Stdout => io::stdout().write_all(buf),
            Stream::Stderr => io::stderr().write_all(buf),
        }
    }
}

impl Write for CaptureWriter {
    /// Sends every line `buf` completes. A line is consumed only once its
    /// frame was accepted: if the first send fails nothing is consumed and
    /// the error is returned, a later failure ends the call with a short count.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.sink.active.load(Ordering::SeqCst) {
            self.passthrough(buf)?;
            return Ok(buf.len());
        }
        let mut consumed = 0;
        while let Some(offset) = buf[consumed..].iter().position(|byte| *byte == b'\n') {
            let end = consumed + offset;
            let mut line = std::mem::take(&mut self.pending);
            let carried = line.len();
            line.extend_from_slice(&buf[consumed..end]);
            let sent = self.emit(line.strip_suffix(b"\r").unwrap_or(&line));
            match sent {
                Ok(()) => consumed = end + 1,
                Err(err) => {
                    line.truncate(carried);
                    self.pending = line;
                    if consumed == 0 {
                        return Err(err);
                    }
                    debug!(
                        target: "dashframe::capture",
                        error = %err,
                        consumed,
                        "short captured write"
                    );
                    return Ok(consumed);
                }
            }
        }
        self.pending.extend_from_slice(&buf[consumed..]);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let flushed = if self.sink.active.load(Ordering::SeqCst) {
            self.emit(&self.pending)
        } else {
            self.passthrough(&self.pending)
        };
        if flushed.is_ok() {
            self.pending.clear();
        }
        flushed
    }
}

impl Drop for CaptureWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Writes one line to `stream`: into the installed capture if there is one,
/// otherwise to the real stream. Backs the print macros.
pub fn write_line(stream: Stream, text: &str) {
    let sink = ACTIVE.lock().as_ref().map(Arc::clone);
    match sink {
        Some(sink) if sink.active.load(Ordering::SeqCst) => {
            for line in text.split('\n') {
                if let Err(err) = sink.client.print_to(stream, line) {
                    warn!(
                        target: "dashframe::capture",
                        error = %err,
                        stream = stream.as_str(),
                        "dropping captured output"
                    );
                    return;
                }
            }
        }
        _ => match stream {
            Stream::Stdout => println!("{text}"),
            Stream::Stderr => eprintln!("{text}"),
        },
    }
}

/// `println!` that lands on the dashboard while an output capture is installed.
#[macro_export]
macro_rules! dash_println {
    ($($arg:tt)*) => {
        $crate::capture::write_line($crate::capture::Stream::Stdout, &format!($($arg)*))
    };
}

/// `eprintln!` that lands on the dashboard while an output capture is installed.
#[macro_export]
macro_rules! dash_eprintln {
    ($($arg:tt)*) => {
        $crate::capture::write_line($crate::capture::Stream::Stderr, &format!($($arg)*))
    };
}
