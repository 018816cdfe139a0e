use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// TCP listening transport.
///
/// Wraps a bound [`TcpListener`]. The listener can be switched to
/// non-blocking mode so an accept loop can interleave accepts with
/// shutdown-flag checks instead of parking indefinitely.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on a TCP address.
    ///
    /// Binding to port 0 picks an ephemeral port; [`local_addr`] reports the
    /// actual one.
    ///
    /// [`local_addr`]: TcpTransport::local_addr
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr,
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(TransportError::Io)?;
        info!(%local_addr, "listening on tcp");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection.
    ///
    /// Blocking unless [`set_nonblocking`] was called; in non-blocking mode
    /// returns `Ok(None)` when no connection is pending.
    ///
    /// [`set_nonblocking`]: TcpTransport::set_nonblocking
    pub fn accept(&self) -> Result<Option<(TcpStream, SocketAddr)>> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted connection");
                Ok(Some((stream, peer)))
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// Toggle non-blocking mode on the listening socket.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.listener.set_nonblocking(nonblocking)?;
        Ok(())
    }

    /// The address this transport is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

/// Connect to a listening TCP peer (blocking).
pub fn connect(addr: SocketAddr) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr).map_err(|e| TransportError::Connect {
        addr,
        source: e,
    })?;
    debug!(%addr, "connected to tcp peer");
    Ok(stream)
}

/// Connect with an upper bound on connection establishment time.
pub fn connect_timeout(addr: SocketAddr, timeout: Duration) -> Result<TcpStream> {
    let stream =
        TcpStream::connect_timeout(&addr, timeout).map_err(|e| TransportError::Connect {
            addr,
            source: e,
        })?;
    debug!(%addr, "connected to tcp peer");
    Ok(stream)
}
