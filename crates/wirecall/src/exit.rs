use std::fmt;
use std::io;

use wirecall_frame::FrameError;
use wirecall_rpc::RpcError;
use wirecall_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
#[allow(dead_code)]
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::Oversized { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::Truncated { .. } | FrameError::Closed => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}

pub fn rpc_error(context: &str, err: RpcError) -> CliError {
    match err {
        RpcError::Transport(err) => transport_error(context, err),
        RpcError::Frame(err) | RpcError::WriteFailed(err) => frame_error(context, err),
        RpcError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        RpcError::UnknownOpcode(_) | RpcError::BadPayload { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        RpcError::OpcodeMismatch { .. } | RpcError::ResponseLength { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_timeout_code() {
        let err = rpc_error("call failed", RpcError::Timeout(std::time::Duration::from_secs(5)));
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn refused_connect_maps_to_failure() {
        let io = io::Error::from(io::ErrorKind::ConnectionRefused);
        let addr = "127.0.0.1:9".parse().unwrap();
        let err = transport_error(
            "connect failed",
            TransportError::Connect { addr, source: io },
        );
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn oversized_payload_maps_to_data_invalid() {
        let err = frame_error(
            "send failed",
            FrameError::Oversized {
                size: 5000,
                max: 4096,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }
}
