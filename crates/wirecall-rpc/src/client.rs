//! One-shot client stubs.
//!
//! Every call is a complete synchronous round trip on a fresh transport
//! handle: connect, write the request frame, read the response frame,
//! close. No retries and no connection reuse; retry policy belongs to
//! the caller.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;
use wirecall_frame::{
    ops, Frame, FrameConfig, FrameError, FrameReader, FrameWriter,
};
use wirecall_transport::{tcp, TransportError};

use crate::error::{Result, RpcError};

/// Options for a single call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Bound on connection establishment and response wait. `None` means
    /// block indefinitely on the stream transport; the datagram transport
    /// falls back to [`udp::DEFAULT_RECV_TIMEOUT`].
    pub timeout: Option<Duration>,

    /// Frame limits applied to the exchange.
    pub frame: FrameConfig,
}

/// Perform one ADD call over the stream transport.
pub fn add(addr: SocketAddr, a: i32, b: i32) -> Result<i32> {
    add_with_options(addr, a, b, &CallOptions::default())
}

/// Perform one ADD call with explicit options.
pub fn add_with_options(addr: SocketAddr, a: i32, b: i32, options: &CallOptions) -> Result<i32> {
    let response = call_with_options(addr, ops::ADD, &add_request(a, b), options)?;
    decode_sum(&response)
}

/// Perform one ECHO call over the stream transport.
pub fn echo(addr: SocketAddr, payload: &[u8]) -> Result<Bytes> {
    echo_with_options(addr, payload, &CallOptions::default())
}

/// Perform one ECHO call with explicit options.
pub fn echo_with_options(
    addr: SocketAddr,
    payload: &[u8],
    options: &CallOptions,
) -> Result<Bytes> {
    let response = call_with_options(addr, ops::ECHO, payload, options)?;
    Ok(response.payload)
}

/// Perform one generic round trip over the stream transport.
///
/// Validates that the response echoes the request opcode; payload
/// interpretation is the caller's.
pub fn call(addr: SocketAddr, opcode: u32, payload: &[u8]) -> Result<Frame> {
    call_with_options(addr, opcode, payload, &CallOptions::default())
}

/// Perform one generic round trip with explicit options.
pub fn call_with_options(
    addr: SocketAddr,
    opcode: u32,
    payload: &[u8],
    options: &CallOptions,
) -> Result<Frame> {
    let stream = match options.timeout {
        Some(timeout) => tcp::connect_timeout(addr, timeout)?,
        None => tcp::connect(addr)?,
    };
    if let Some(timeout) = options.timeout {
        stream
            .set_read_timeout(Some(timeout))
            .map_err(TransportError::Io)?;
    }
    let reader_stream = stream.try_clone().map_err(TransportError::Io)?;

    let mut writer = FrameWriter::with_config(stream, options.frame.clone());
    writer.send(opcode, payload).map_err(RpcError::WriteFailed)?;
    debug!(%addr, opcode, op = ops::op_name(opcode), len = payload.len(), "request sent");

    let mut reader = FrameReader::with_config(reader_stream, options.frame.clone());
    let response = reader
        .read_frame()
        .map_err(|err| classify_read_error(err, options.timeout))?;

    validate_opcode(opcode, &response)?;
    Ok(response)
}

/// Datagram-transport variants of the stubs.
///
/// Same call contract, but the wait for the reply datagram is always
/// bounded by a receive deadline; expiry is the [`RpcError::Timeout`]
/// outcome, not a failure of the transport.
pub mod udp {
    use wirecall_frame::{decode_frame, encode_frame, HEADER_SIZE};
    use wirecall_transport::UdpTransport;

    use super::*;

    /// Receive deadline applied when [`CallOptions::timeout`] is unset.
    pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(5);

    /// Perform one ADD call over the datagram transport.
    pub fn add(addr: SocketAddr, a: i32, b: i32) -> Result<i32> {
        add_with_options(addr, a, b, &CallOptions::default())
    }

    /// Perform one ADD call with explicit options.
    pub fn add_with_options(
        addr: SocketAddr,
        a: i32,
        b: i32,
        options: &CallOptions,
    ) -> Result<i32> {
        let response = call_with_options(addr, ops::ADD, &add_request(a, b), options)?;
        decode_sum(&response)
    }

    /// Perform one ECHO call over the datagram transport.
    pub fn echo(addr: SocketAddr, payload: &[u8]) -> Result<Bytes> {
        echo_with_options(addr, payload, &CallOptions::default())
    }

    /// Perform one ECHO call with explicit options.
    pub fn echo_with_options(
        addr: SocketAddr,
        payload: &[u8],
        options: &CallOptions,
    ) -> Result<Bytes> {
        let response = call_with_options(addr, ops::ECHO, payload, options)?;
        Ok(response.payload)
    }

    /// Perform one generic datagram round trip.
    pub fn call(addr: SocketAddr, opcode: u32, payload: &[u8]) -> Result<Frame> {
        call_with_options(addr, opcode, payload, &CallOptions::default())
    }

    /// Perform one generic datagram round trip with explicit options.
    pub fn call_with_options(
        addr: SocketAddr,
        opcode: u32,
        payload: &[u8],
        options: &CallOptions,
    ) -> Result<Frame> {
        let timeout = options.timeout.unwrap_or(DEFAULT_RECV_TIMEOUT);

        let socket = UdpTransport::bind(SocketAddr::from(([0, 0, 0, 0], 0)))?;
        socket.set_read_timeout(Some(timeout))?;

        let mut wire = bytes::BytesMut::new();
        if payload.len() > options.frame.max_payload {
            return Err(RpcError::Frame(FrameError::Oversized {
                size: payload.len(),
                max: options.frame.max_payload,
            }));
        }
        encode_frame(opcode, payload, &mut wire)?;
        socket.send_to(&wire, addr).map_err(|err| match err {
            TransportError::Io(io) => RpcError::WriteFailed(FrameError::Io(io)),
            other => RpcError::Transport(other),
        })?;
        debug!(%addr, opcode, op = ops::op_name(opcode), len = payload.len(), "request sent");

        let mut buf = vec![0u8; HEADER_SIZE + options.frame.max_payload];
        let (len, _peer) = socket
            .recv_from(&mut buf)?
            .ok_or(RpcError::Timeout(timeout))?;

        let response = decode_frame(&buf[..len], options.frame.max_payload)?;
        validate_opcode(opcode, &response)?;
        Ok(response)
    }
}

fn add_request(a: i32, b: i32) -> [u8; 8] {
    let mut payload = [0u8; 8];
    payload[0..4].copy_from_slice(&a.to_be_bytes());
    payload[4..8].copy_from_slice(&b.to_be_bytes());
    payload
}

fn decode_sum(response: &Frame) -> Result<i32> {
    let payload: [u8; 4] =
        response
            .payload
            .as_ref()
            .try_into()
            .map_err(|_| RpcError::ResponseLength {
                expected: 4,
                got: response.payload.len(),
            })?;
    Ok(i32::from_be_bytes(payload))
}

fn validate_opcode(expected: u32, response: &Frame) -> Result<()> {
    if response.opcode != expected {
        return Err(RpcError::OpcodeMismatch {
            expected,
            got: response.opcode,
        });
    }
    Ok(())
}

/// A read that hits a configured deadline is a timeout outcome; a peer
/// that closes before responding stays the distinct close error.
fn classify_read_error(err: FrameError, timeout: Option<Duration>) -> RpcError {
    match (timeout, err) {
        (Some(deadline), FrameError::Io(io))
            if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
        {
            RpcError::Timeout(deadline)
        }
        (_, err) => RpcError::Frame(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_request_is_big_endian() {
        let payload = add_request(7, 35);
        assert_eq!(payload, [0, 0, 0, 7, 0, 0, 0, 35]);

        let payload = add_request(-1, 1);
        assert_eq!(payload, [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 1]);
    }

    #[test]
    fn decode_sum_validates_length() {
        let err = decode_sum(&Frame::new(ops::ADD, &b"\x00\x00"[..])).unwrap_err();
        assert!(matches!(
            err,
            RpcError::ResponseLength {
                expected: 4,
                got: 2
            }
        ));

        let sum = decode_sum(&Frame::new(ops::ADD, 42i32.to_be_bytes().to_vec())).unwrap();
        assert_eq!(sum, 42);
    }

    #[test]
    fn mismatched_opcode_is_rejected() {
        let response = Frame::new(ops::ECHO, &b"ping"[..]);
        let err = validate_opcode(ops::ADD, &response).unwrap_err();
        assert!(matches!(
            err,
            RpcError::OpcodeMismatch {
                expected: ops::ADD,
                got: ops::ECHO
            }
        ));
    }

    #[test]
    fn deadline_expiry_maps_to_timeout() {
        let deadline = Duration::from_millis(250);
        let err = classify_read_error(
            FrameError::Io(std::io::Error::from(ErrorKind::WouldBlock)),
            Some(deadline),
        );
        assert!(matches!(err, RpcError::Timeout(d) if d == deadline));
    }

    #[test]
    fn peer_close_is_not_a_timeout() {
        let err = classify_read_error(FrameError::Closed, Some(Duration::from_secs(1)));
        assert!(matches!(err, RpcError::Frame(FrameError::Closed)));
    }

    #[test]
    fn io_error_without_deadline_stays_io() {
        let err = classify_read_error(
            FrameError::Io(std::io::Error::from(ErrorKind::ConnectionReset)),
            None,
        );
        assert!(matches!(err, RpcError::Frame(FrameError::Io(_))));
    }
}
