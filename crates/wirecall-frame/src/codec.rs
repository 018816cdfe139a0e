use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: opcode (4) + payload length (4) = 8 bytes, both big-endian.
pub const HEADER_SIZE: usize = 8;

/// Default maximum payload size: 4 KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 4096;

/// One opcode + payload unit exchanged over the wire.
///
/// Built fresh for every request and response and never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The remote operation this frame invokes or answers.
    pub opcode: u32,
    /// The operation-specific payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(opcode: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format (integers big-endian regardless of host byte order):
/// ```text
/// ┌─────────────┬─────────────┬──────────────────┐
/// │ Opcode (4B) │ Length (4B) │ Payload           │
/// │ big-endian  │ big-endian  │ (Length bytes)    │
/// └─────────────┴─────────────┴──────────────────┘
/// ```
pub fn encode_frame(opcode: u32, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::Oversized {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32(opcode);
    dst.put_u32(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Parse the 8-byte header into `(opcode, length)`.
pub(crate) fn parse_header(header: &[u8; HEADER_SIZE]) -> (u32, u32) {
    let opcode = u32::from_be_bytes(header[0..4].try_into().unwrap());
    let length = u32::from_be_bytes(header[4..8].try_into().unwrap());
    (opcode, length)
}

/// Decode one complete frame from a byte slice.
///
/// This is the datagram path: a request or reply arrives as a single
/// datagram that must hold the whole frame. Bytes past the declared length
/// are ignored.
pub fn decode_frame(buf: &[u8], max_payload: usize) -> Result<Frame> {
    if buf.len() < HEADER_SIZE {
        return Err(FrameError::Truncated {
            got: buf.len(),
            expected: HEADER_SIZE,
        });
    }

    let header: &[u8; HEADER_SIZE] = buf[..HEADER_SIZE].try_into().unwrap();
    let (opcode, length) = parse_header(header);
    let length = length as usize;

    if length > max_payload {
        return Err(FrameError::Oversized {
            size: length,
            max: max_payload,
        });
    }
    if buf.len() < HEADER_SIZE + length {
        return Err(FrameError::Truncated {
            got: buf.len(),
            expected: HEADER_SIZE + length,
        });
    }

    Ok(Frame {
        opcode,
        payload: Bytes::copy_from_slice(&buf[HEADER_SIZE..HEADER_SIZE + length]),
    })
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 4 KiB.
    pub max_payload: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}
