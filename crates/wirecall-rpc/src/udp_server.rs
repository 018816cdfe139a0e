use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::BytesMut;
use tracing::{debug, info, warn};
use wirecall_frame::{decode_frame, encode_frame, FrameConfig, HEADER_SIZE};
use wirecall_transport::UdpTransport;

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::server::ServerConfig;

/// One received datagram, snapshotted at receive time.
///
/// Owned exclusively by the worker that processes it; workers share only
/// the listening socket, never each other's buffers.
struct DatagramJob {
    peer: SocketAddr,
    datagram: Vec<u8>,
}

/// Datagram-transport RPC server.
///
/// One detached worker thread per received datagram. The worker decodes
/// the frame, dispatches it, and sends the reply through the shared
/// listening socket; a failed datagram produces no reply.
pub struct UdpServer {
    transport: Arc<UdpTransport>,
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
    shutdown: Arc<std::sync::atomic::AtomicBool>,
}

impl UdpServer {
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
        let transport = UdpTransport::bind(addr)?;
        Ok(Self {
            transport: Arc::new(transport),
            dispatcher: Arc::new(dispatcher),
            config,
            shutdown: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        })
    }

    /// The address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Flag observed by the receive loop. Storing `true` stops the loop
    /// within one poll interval.
    pub fn shutdown_handle(&self) -> Arc<std::sync::atomic::AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Receive datagrams until the shutdown flag flips.
    ///
    /// A receive timeout of `poll_interval` bounds how long the loop can
    /// sit blocked without observing the flag.
    pub fn serve(&self) -> Result<()> {
        self.transport
            .set_read_timeout(Some(self.config.poll_interval))?;
        info!(addr = %self.local_addr(), "rpc server receiving datagrams");

        let mut buf = vec![0u8; HEADER_SIZE + self.config.frame.max_payload];

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.transport.recv_from(&mut buf) {
                Ok(Some((len, peer))) => {
                    let job = DatagramJob {
                        peer,
                        datagram: buf[..len].to_vec(),
                    };
                    let socket = Arc::clone(&self.transport);
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let frame_config = self.config.frame.clone();
                    // Handle dropped: workers are detached and shutdown
                    // does not wait for them.
                    std::thread::spawn(move || {
                        serve_datagram(&socket, job, &dispatcher, &frame_config);
                    });
                }
                Ok(None) => {} // timeout tick, re-check the flag
                Err(err) => {
                    warn!(error = %err, "datagram receive failed");
                    std::thread::sleep(self.config.poll_interval);
                }
            }
        }

        info!(addr = %self.local_addr(), "rpc server stopped receiving");
        Ok(())
    }
}

/// Run one datagram exchange to completion, logging instead of
/// propagating. A failure drops the datagram without a reply.
fn serve_datagram(
    socket: &UdpTransport,
    job: DatagramJob,
    dispatcher: &Dispatcher,
    frame_config: &FrameConfig,
) {
    debug!(peer = %job.peer, len = job.datagram.len(), "datagram received");
    match handle_datagram(socket, &job, dispatcher, frame_config) {
        Ok(()) => debug!(peer = %job.peer, "exchange complete"),
        Err(err) => warn!(peer = %job.peer, error = %err, "exchange failed, no reply sent"),
    }
}

fn handle_datagram(
    socket: &UdpTransport,
    job: &DatagramJob,
    dispatcher: &Dispatcher,
    frame_config: &FrameConfig,
) -> Result<()> {
    let request = decode_frame(&job.datagram, frame_config.max_payload)?;
    let response = dispatcher.dispatch(&request)?;

    let mut wire = BytesMut::new();
    encode_frame(response.opcode, response.payload.as_ref(), &mut wire)?;
    socket.send_to(&wire, job.peer)?;
    Ok(())
}
