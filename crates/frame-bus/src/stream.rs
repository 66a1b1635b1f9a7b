//! Newline-delimited envelope streams: one JSON envelope per line.

use std::io::{BufRead, Write};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::trace;

use crate::{Transport, TransportError, TransportResult};

/// Writes each envelope as a line into `W` (a pipe to the engine, a file, a
/// socket). The mutex keeps at most one writer active so lines never interleave.
pub struct StreamTransport<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> StreamTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Transport for StreamTransport<W> {
    fn send_bytes(&self, frame: Bytes) -> TransportResult<()> {
        let mut writer = self.writer.lock();
        writer.write_all(&frame)?;
        if frame.last() != Some(&b'\n') {
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        trace!(target: "frame_bus::stream", bytes = frame.len(), "frame written");
        Ok(())
    }
}

/// Splits a newline-delimited stream into frames, skipping blank lines.
pub struct FrameReader<R: BufRead> {
    reader: R,
    line: Vec<u8>,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::with_capacity(256),
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<Bytes, TransportError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = self.line.trim_ascii();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(Ok(Bytes::copy_from_slice(trimmed)));
                }
                Err(err) => return Some(Err(TransportError::Io(err))),
            }
        }
    }
}
