//! Minimal binary RPC over TCP and UDP.
//!
//! wirecall frames every message as a big-endian `opcode + length` header
//! followed by the payload, dispatches requests through a read-only opcode
//! table, and serves each connection or datagram on its own thread.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP/UDP sockets and full-buffer I/O primitives
//! - [`frame`] — length-prefixed opcode framing
//! - [`rpc`] — dispatcher, concurrent servers, one-shot client stubs

/// Re-export transport types.
pub mod transport {
    pub use wirecall_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use wirecall_frame::*;
}

/// Re-export RPC types.
pub mod rpc {
    pub use wirecall_rpc::*;
}
