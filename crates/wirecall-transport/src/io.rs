//! Full-buffer read and write over streams that deliver partial transfers.
//!
//! A single `read`/`write` call on a socket transfers between one byte and
//! the whole buffer. Every frame read and write in wirecall goes through
//! [`read_full`] and [`write_full`] so that callers only ever see complete
//! logical units.

use std::io::{ErrorKind, Read, Write};

/// Outcome of a [`read_full`] call.
///
/// Orderly peer shutdown is an outcome, not an error: the caller decides
/// whether a close after zero bytes (clean) or mid-buffer (truncated) is
/// acceptable in its protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFull {
    /// The buffer was filled completely.
    Complete,
    /// The peer closed the stream after `got` bytes (possibly zero).
    Closed { got: usize },
}

/// Read until `buf` is full, the peer closes, or a non-transient error.
///
/// Reads interrupted by a signal (`ErrorKind::Interrupted`) are retried
/// transparently.
pub fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<ReadFull> {
    let mut got = 0usize;
    while got < buf.len() {
        match reader.read(&mut buf[got..]) {
            Ok(0) => return Ok(ReadFull::Closed { got }),
            Ok(n) => got += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(ReadFull::Complete)
}

/// Write all of `buf`, retrying partial and signal-interrupted writes.
///
/// A write that returns zero bytes is fatal (`ErrorKind::WriteZero`).
pub fn write_full<W: Write>(writer: &mut W, buf: &[u8]) -> std::io::Result<()> {
    let mut sent = 0usize;
    while sent < buf.len() {
        match writer.write(&buf[sent..]) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    ErrorKind::WriteZero,
                    "write returned zero bytes",
                ))
            }
            Ok(n) => sent += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
