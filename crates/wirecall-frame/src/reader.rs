use std::io::Read;

use wirecall_transport::{read_full, ReadFull};

use crate::codec::{parse_header, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Header first, then exactly the declared payload length; both reads go
/// through [`read_full`], so callers never see a partial frame. An
/// oversized declared length fails before a single payload byte is read.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame (blocking).
    ///
    /// An orderly close before any header byte is [`FrameError::Closed`];
    /// a close anywhere after that is [`FrameError::Truncated`].
    pub fn read_frame(&mut self) -> Result<Frame> {
        let mut header = [0u8; HEADER_SIZE];
        match read_full(&mut self.inner, &mut header)? {
            ReadFull::Complete => {}
            ReadFull::Closed { got: 0 } => return Err(FrameError::Closed),
            ReadFull::Closed { got } => {
                return Err(FrameError::Truncated {
                    got,
                    expected: HEADER_SIZE,
                })
            }
        }

        let (opcode, length) = parse_header(&header);
        let length = length as usize;

        if length > self.config.max_payload {
            return Err(FrameError::Oversized {
                size: length,
                max: self.config.max_payload,
            });
        }

        let mut payload = vec![0u8; length];
        if length > 0 {
            match read_full(&mut self.inner, &mut payload)? {
                ReadFull::Complete => {}
                ReadFull::Closed { got } => {
                    return Err(FrameError::Truncated {
                        got: HEADER_SIZE + got,
                        expected: HEADER_SIZE + length,
                    })
                }
            }
        }

        Ok(Frame {
            opcode,
            payload: payload.into(),
        })
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::encode_frame;
    use crate::ops::{ADD, ECHO};

    #[test]
    fn read_single_frame() {
        let mut wire = BytesMut::new();
        encode_frame(ECHO, b"hello", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.opcode, ECHO);
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn read_sequential_frames() {
        let mut wire = BytesMut::new();
        encode_frame(ADD, b"12345678", &mut wire).unwrap();
        encode_frame(ECHO, b"two", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();

        assert_eq!((f1.opcode, f1.payload.as_ref()), (ADD, b"12345678".as_ref()));
        assert_eq!((f2.opcode, f2.payload.as_ref()), (ECHO, b"two".as_ref()));
    }

    #[test]
    fn reassembles_frame_delivered_byte_by_byte() {
        let mut wire = BytesMut::new();
        encode_frame(ECHO, b"slow", &mut wire).unwrap();

        let mut reader = FrameReader::new(ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        });

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.opcode, ECHO);
        assert_eq!(frame.payload.as_ref(), b"slow");
    }

    #[test]
    fn clean_close_before_any_byte() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Closed));
    }

    #[test]
    fn close_mid_header_is_truncated() {
        let mut reader = FrameReader::new(Cursor::new(vec![0u8, 0, 0]));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Truncated { got: 3, expected: 8 }));
    }

    #[test]
    fn close_mid_payload_is_truncated() {
        let mut partial = BytesMut::new();
        partial.put_u32(ECHO);
        partial.put_u32(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Truncated { .. }));
    }

    #[test]
    fn oversized_length_fails_without_touching_payload() {
        let mut header = BytesMut::new();
        header.put_u32(ECHO);
        header.put_u32(crate::codec::DEFAULT_MAX_PAYLOAD as u32 + 1);

        // Reader that fails the test if any payload byte is requested.
        let mut reader = FrameReader::new(HeaderOnlyReader {
            header: header.to_vec(),
            pos: 0,
        });

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Oversized { size: 4097, .. }));
    }

    #[test]
    fn interrupted_read_retries() {
        let mut wire = BytesMut::new();
        encode_frame(ECHO, b"ok", &mut wire).unwrap();

        let mut reader = FrameReader::new(InterruptedThenData {
            interrupted: false,
            bytes: wire.to_vec(),
            pos: 0,
        });

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), b"ok");
    }

    #[test]
    fn zero_length_payload_frame() {
        let mut wire = BytesMut::new();
        encode_frame(ECHO, b"", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let frame = reader.read_frame().unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn tighter_max_payload_is_enforced() {
        let mut wire = BytesMut::new();
        encode_frame(ECHO, &vec![0u8; 64], &mut wire).unwrap();

        let cfg = FrameConfig { max_payload: 16 };
        let mut reader = FrameReader::with_config(Cursor::new(wire.to_vec()), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Oversized { size: 64, max: 16 }));
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct HeaderOnlyReader {
        header: Vec<u8>,
        pos: usize,
    }

    impl Read for HeaderOnlyReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            assert!(
                self.pos < self.header.len(),
                "payload must not be read after an oversized header"
            );
            let n = (self.header.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.header[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(std::io::ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
