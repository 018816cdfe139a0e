use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use wirecall_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use wirecall_transport::{TcpTransport, TransportError};

use crate::dispatch::Dispatcher;
use crate::error::{Result, RpcError};

/// Configuration shared by both server loops.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Frame limits applied to every exchange.
    pub frame: FrameConfig,

    /// How long the loop waits between shutdown-flag checks while no work
    /// is pending. Bounds shutdown latency.
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Stream-transport RPC server.
///
/// One detached worker thread per accepted connection; each worker owns
/// its connection exclusively and performs exactly one request/response
/// exchange before closing it. The accept loop never waits for workers;
/// shutdown can return while exchanges are still in flight.
pub struct RpcServer {
    transport: TcpTransport,
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
    shutdown: Arc<AtomicBool>,
}

impl RpcServer {
    /// Bind with default configuration.
    pub fn bind(addr: SocketAddr, dispatcher: Dispatcher) -> Result<Self> {
        Self::bind_with_config(addr, dispatcher, ServerConfig::default())
    }

    /// Bind with explicit configuration.
    pub fn bind_with_config(
        addr: SocketAddr,
        dispatcher: Dispatcher,
        config: ServerConfig,
    ) -> Result<Self> {
        let transport = TcpTransport::bind(addr)?;
        Ok(Self {
            transport,
            dispatcher: Arc::new(dispatcher),
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Flag observed by the accept loop. Storing `true` stops the loop
    /// within one poll interval.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Accept connections until the shutdown flag flips.
    ///
    /// The listener runs non-blocking so the flag is observed within
    /// `poll_interval` even when no client ever connects.
    pub fn serve(&self) -> Result<()> {
        self.transport.set_nonblocking(true)?;
        info!(addr = %self.local_addr(), "rpc server accepting connections");

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.transport.accept() {
                Ok(Some((stream, peer))) => {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let frame_config = self.config.frame.clone();
                    // Handle dropped: workers are detached and shutdown
                    // does not wait for them.
                    std::thread::spawn(move || {
                        serve_connection(stream, peer, &dispatcher, frame_config);
                    });
                }
                Ok(None) => std::thread::sleep(self.config.poll_interval),
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    std::thread::sleep(self.config.poll_interval);
                }
            }
        }

        info!(addr = %self.local_addr(), "rpc server stopped accepting");
        Ok(())
    }
}

/// Run one connection to completion, logging instead of propagating.
///
/// A failure here ends only this exchange; sibling workers and the accept
/// loop never observe it.
fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: &Dispatcher,
    frame_config: FrameConfig,
) {
    debug!(%peer, "client connected");
    match handle_exchange(stream, dispatcher, frame_config) {
        Ok(()) => debug!(%peer, "exchange complete"),
        Err(RpcError::Frame(FrameError::Closed)) => {
            debug!(%peer, "client closed without sending a request")
        }
        Err(err) => warn!(%peer, error = %err, "exchange failed, no response sent"),
    }
}

/// One read-frame → dispatch → write-frame sequence.
///
/// Any error drops the connection without a response; the socket closes
/// when both halves fall out of scope.
fn handle_exchange(
    stream: TcpStream,
    dispatcher: &Dispatcher,
    frame_config: FrameConfig,
) -> Result<()> {
    stream.set_nonblocking(false).map_err(TransportError::Io)?;
    let reader_stream = stream.try_clone().map_err(TransportError::Io)?;

    let mut reader = FrameReader::with_config(reader_stream, frame_config.clone());
    let mut writer = FrameWriter::with_config(stream, frame_config);

    let request = reader.read_frame()?;
    let response = dispatcher.dispatch(&request)?;
    writer.write_frame(&response)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatcherConfig;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[test]
    fn serve_stops_after_shutdown_flag() {
        let server = RpcServer::bind_with_config(
            loopback(),
            Dispatcher::with_defaults(),
            ServerConfig {
                poll_interval: Duration::from_millis(10),
                ..ServerConfig::default()
            },
        )
        .unwrap();

        let shutdown = server.shutdown_handle();
        let loop_thread = std::thread::spawn(move || server.serve());

        shutdown.store(true, Ordering::SeqCst);
        loop_thread.join().unwrap().unwrap();
    }

    #[test]
    fn config_defaults_are_protocol_limits() {
        let server = RpcServer::bind(loopback(), Dispatcher::with_defaults()).unwrap();
        assert_eq!(server.config.frame.max_payload, 4096);
        assert!(server.config.poll_interval > Duration::ZERO);
        assert!(server.dispatcher.knows(wirecall_frame::ops::ADD));
    }

    #[test]
    fn dispatcher_config_flows_through_bind() {
        let dispatcher = Dispatcher::new(DispatcherConfig {
            echo_reply_cap: 16,
            ..DispatcherConfig::default()
        });
        let server = RpcServer::bind(loopback(), dispatcher).unwrap();
        assert_eq!(server.dispatcher.config().echo_reply_cap, 16);
    }
}
