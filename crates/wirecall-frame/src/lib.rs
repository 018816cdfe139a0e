//! Length-prefixed opcode framing for wirecall.
//!
//! Every message on the wire is one frame:
//! - A 4-byte big-endian opcode selecting the remote operation
//! - A 4-byte big-endian payload length (at most 4096 by default)
//! - The raw payload bytes
//!
//! [`FrameReader`] and [`FrameWriter`] move whole frames over any
//! `Read`/`Write` stream; partial transfers never leak to callers.

pub mod codec;
pub mod error;
pub mod ops;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use ops::{is_known, op_name, ADD, ECHO};
pub use reader::FrameReader;
pub use writer::FrameWriter;
