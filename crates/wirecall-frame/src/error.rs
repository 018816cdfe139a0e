/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The declared payload length exceeds the configured maximum.
    ///
    /// Raised before any payload byte is read.
    #[error("payload too large ({size} bytes, max {max})")]
    Oversized { size: usize, max: usize },

    /// The peer closed the stream mid-frame.
    #[error("connection closed mid-frame ({got} of {expected} bytes)")]
    Truncated { got: usize, expected: usize },

    /// The peer closed the stream cleanly, before any frame byte arrived.
    ///
    /// Distinct from [`FrameError::Truncated`]: an orderly shutdown between
    /// frames is a normal end-of-conversation, not a protocol violation.
    #[error("connection closed")]
    Closed,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
