//! Shared frame protocol for scripting client ↔ dashboard engine communication.
//! Keeping this in a dedicated crate lets clients depend on the wire shapes
//! and builders without pulling in the receiver or any render backend.

pub mod builders;
pub mod codec;
pub mod envelope;
pub mod payload;

pub use builders::{
    Align, ChartSpec, Command, GraphType, MarkerType, TextOptions, DEFAULT_ALIGN, DEFAULT_BOUNDS,
    DEFAULT_COLOR,
};
pub use codec::{decode, decode_versioned, encode, encode_line, encode_versioned, FrameError};
pub use envelope::{Action, Envelope, SchemaVersion};
pub use payload::{
    ChartPayload, ColorTextPayload, Frame, ImagePayload, Payload, PrintPayload, StyledLine,
    TextPayload, TodoAddPayload, TodoIndexPayload,
};

pub type FrameResult<T> = Result<T, FrameError>;
