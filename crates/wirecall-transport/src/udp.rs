use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// UDP datagram transport.
///
/// One socket serves both roles: a server binds a well-known port and
/// replies via `send_to`; a client binds an ephemeral port, sends its
/// request, and waits for the reply under a receive deadline.
///
/// `recv_from`/`send_to` take `&self`, so a single bound socket can be
/// shared across reply threads without extra locking.
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind a UDP socket. Port 0 picks an ephemeral port.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|e| TransportError::Bind {
            addr,
            source: e,
        })?;
        let local_addr = socket.local_addr().map_err(TransportError::Io)?;
        info!(%local_addr, "bound udp socket");
        Ok(Self { socket, local_addr })
    }

    /// Receive one datagram into `buf`.
    ///
    /// Returns `Ok(None)` when a configured read timeout expires before a
    /// datagram arrives; reads interrupted by a signal are retried.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        loop {
            match self.socket.recv_from(buf) {
                Ok((len, peer)) => {
                    debug!(%peer, len, "received datagram");
                    return Ok(Some((len, peer)));
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    return Ok(None)
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Send one datagram to `peer`.
    pub fn send_to(&self, buf: &[u8], peer: SocketAddr) -> Result<()> {
        let sent = self.socket.send_to(buf, peer)?;
        if sent != buf.len() {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short datagram send ({sent} of {} bytes)", buf.len()),
            )));
        }
        debug!(%peer, len = buf.len(), "sent datagram");
        Ok(())
    }

    /// Bound on how long a single `recv_from` may block.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(timeout)?;
        Ok(())
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "udp"
    }
}
