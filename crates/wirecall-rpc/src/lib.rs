//! Remote operations over wirecall frames.
//!
//! This is the "just works" layer: a [`Dispatcher`] mapping opcodes to
//! handlers, concurrent servers for both transports, and client stubs
//! that hide frame construction behind typed calls.
//!
//! One call is one exchange: the stream server closes every connection
//! after a single request/response, and each datagram pair is independent.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod server;
pub mod udp_server;

pub use dispatch::{Dispatcher, DispatcherConfig, Handler};
pub use error::{Result, RpcError};
pub use server::{RpcServer, ServerConfig};
pub use udp_server::UdpServer;
