use std::time::Duration;

/// Errors that can occur in RPC operations.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] wirecall_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] wirecall_frame::FrameError),

    /// The request frame could not be written.
    ///
    /// Kept apart from response-side failures so callers can tell a call
    /// that never reached the server from one that got no answer.
    #[error("request write failed: {0}")]
    WriteFailed(#[source] wirecall_frame::FrameError),

    /// The request opcode is not in the dispatch table.
    ///
    /// The server drops the connection without a response.
    #[error("unknown opcode {0}")]
    UnknownOpcode(u32),

    /// The request payload does not match the operation's contract.
    #[error("invalid payload for opcode {opcode} ({len} bytes)")]
    BadPayload { opcode: u32, len: usize },

    /// The response carried a different opcode than the request.
    #[error("response opcode mismatch (expected {expected}, got {got})")]
    OpcodeMismatch { expected: u32, got: u32 },

    /// The response payload length violates the operation's contract.
    #[error("response length mismatch (expected {expected} bytes, got {got})")]
    ResponseLength { expected: usize, got: usize },

    /// No response arrived within the receive deadline.
    ///
    /// A normal, reportable outcome for datagram calls, distinct from a
    /// confirmed I/O failure.
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, RpcError>;
