use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use wirecall_transport::write_full;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.opcode, frame.payload.as_ref())
    }

    /// Encode and send a payload under an opcode.
    pub fn send(&mut self, opcode: u32, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload {
            return Err(FrameError::Oversized {
                size: payload.len(),
                max: self.config.max_payload,
            });
        }

        self.buf.clear();
        encode_frame(opcode, payload, &mut self.buf)?;
        write_full(&mut self.inner, &self.buf)?;
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{decode_frame, DEFAULT_MAX_PAYLOAD};
    use crate::ops::{ADD, ECHO};
    use crate::reader::FrameReader;

    #[test]
    fn written_bytes_decode() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(ECHO, b"hello").unwrap();

        let wire = writer.into_inner().into_inner();
        let frame = decode_frame(&wire, DEFAULT_MAX_PAYLOAD).unwrap();
        assert_eq!(frame.opcode, ECHO);
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn write_frame_method() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_frame(&Frame::new(ADD, &b"\x00\x00\x00\x01\x00\x00\x00\x02"[..])).unwrap();

        let wire = writer.into_inner().into_inner();
        let frame = decode_frame(&wire, DEFAULT_MAX_PAYLOAD).unwrap();
        assert_eq!(frame.opcode, ADD);
        assert_eq!(frame.payload.len(), 8);
    }

    #[test]
    fn payload_over_max_rejected_before_any_write() {
        let cfg = FrameConfig { max_payload: 4 };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.send(ECHO, b"oversized").unwrap_err();
        assert!(matches!(err, FrameError::Oversized { size: 9, max: 4 }));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn partial_writes_are_completed() {
        let mut writer = FrameWriter::new(OneBytePerCallWriter { data: Vec::new() });
        writer.send(ECHO, b"fragmented").unwrap();

        let wire = writer.into_inner().data;
        let frame = decode_frame(&wire, DEFAULT_MAX_PAYLOAD).unwrap();
        assert_eq!(frame.payload.as_ref(), b"fragmented");
    }

    #[test]
    fn zero_write_is_fatal() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(ECHO, b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WriteZero));
    }

    #[test]
    fn interrupted_flush_retries() {
        let mut writer = FrameWriter::new(InterruptedFlushWriter {
            flush_interrupted: false,
            data: Vec::new(),
        });
        writer.send(ECHO, b"ok").unwrap();
        assert!(!writer.into_inner().data.is_empty());
    }

    #[test]
    fn writer_reader_roundtrip() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(ECHO, b"ping").unwrap();

        let wire = writer.into_inner().into_inner();
        let mut reader = FrameReader::new(Cursor::new(wire));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.opcode, ECHO);
        assert_eq!(frame.payload.as_ref(), b"ping");
    }

    struct OneBytePerCallWriter {
        data: Vec<u8>,
    }

    impl Write for OneBytePerCallWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.is_empty() {
                return Ok(0);
            }
            self.data.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedFlushWriter {
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedFlushWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }
}
