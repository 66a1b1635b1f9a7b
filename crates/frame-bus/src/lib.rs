//! Transport boundary between scripting clients and the dashboard engine.
//!
//! Three primitives cross it: `send` (one envelope), `print` (a `print`
//! envelope) and `fetch` (an HTTP round trip on the client's behalf). Every
//! call is synchronous and blocks until the transport accepts it; errors are
//! handed back to the caller unchanged.

use std::sync::Arc;

use bytes::Bytes;
use dashframe_proto::{builders, encode, Envelope, FrameError};
use thiserror::Error;

pub mod fetch;
pub mod stream;

pub use fetch::{Fetch, HttpFetcher};
pub use stream::{FrameReader, StreamTransport};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport channel closed")]
    Closed,
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame encoding failed: {0}")]
    Encode(#[from] FrameError),
    #[error("http request failed: {0}")]
    Http(String),
    #[error("unsupported fetch method: {0}")]
    UnsupportedMethod(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

pub trait Transport: Send + Sync {
    /// Hands one encoded envelope to the transport.
    fn send_bytes(&self, frame: Bytes) -> TransportResult<()>;

    fn send(&self, envelope: &Envelope) -> TransportResult<()> {
        let bytes = encode(envelope)?;
        self.send_bytes(Bytes::from(bytes))
    }

    fn print(&self, text: &str) -> TransportResult<()> {
        self.send(&builders::print(text).into_envelope(""))
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send_bytes(&self, frame: Bytes) -> TransportResult<()> {
        (**self).send_bytes(frame)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_bytes(&self, frame: Bytes) -> TransportResult<()> {
        (**self).send_bytes(frame)
    }
}

/// In-process transport for tests and for driving the engine from the same
/// process. Created in pairs by [`channel`].
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: crossbeam_channel::Sender<Bytes>,
}

/// Receiving half of [`channel`].
#[derive(Debug)]
pub struct FrameReceiver {
    rx: crossbeam_channel::Receiver<Bytes>,
}

/// Creates a connected transport pair. `capacity == 0` makes every send a
/// rendezvous with the receiver.
pub fn channel(capacity: usize) -> (ChannelTransport, FrameReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (ChannelTransport { tx }, FrameReceiver { rx })
}

impl Transport for ChannelTransport {
    fn send_bytes(&self, frame: Bytes) -> TransportResult<()> {
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }
}

impl FrameReceiver {
    /// Blocks for the next frame; `None` once every sender is gone.
    pub fn recv(&self) -> Option<Bytes> {
        self.rx.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Bytes> + '_ {
        self.rx.iter()
    }

    pub fn into_inner(self) -> crossbeam_channel::Receiver<Bytes> {
        self.rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashframe_proto::{decode, Action, TextOptions};

    #[test]
    fn channel_round_trip() {
        let (transport, receiver) = channel(4);
        let envelope = builders::text("clock", "12:00", &TextOptions::default()).into_envelope("s1");
        transport.send(&envelope).expect("send ok");

        let bytes = receiver.recv().expect("frame");
        assert_eq!(decode(&bytes).expect("decode"), envelope);
    }

    #[test]
    fn print_sends_a_print_envelope() {
        let (transport, receiver) = channel(1);
        transport.print("hello dashboard").expect("print ok");

        let envelope = decode(&receiver.recv().expect("frame")).expect("decode");
        assert_eq!(envelope.action, Action::Print);
        assert_eq!(envelope.value["text"], "hello dashboard");
    }

    #[test]
    fn send_fails_once_receiver_is_gone() {
        let (transport, receiver) = channel(1);
        drop(receiver);
        let err = transport.print("lost").unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[test]
    fn receiver_ends_when_senders_drop() {
        let (transport, receiver) = channel(2);
        transport.print("last words").expect("print ok");
        drop(transport);
        assert!(receiver.recv().is_some());
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn shared_transport_preserves_send_order() {
        let (transport, receiver) = channel(8);
        let shared: Arc<dyn Transport> = Arc::new(transport);
        for index in 0..3 {
            shared.send(&builders::todo_done(index).into_envelope("")).expect("send ok");
        }
        drop(shared);
        let indices: Vec<_> = receiver
            .iter()
            .map(|bytes| decode(&bytes).expect("decode").value["index"].clone())
            .collect();
        assert_eq!(indices, [0, 1, 2]);
    }
}
