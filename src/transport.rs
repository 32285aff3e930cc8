//! Byte transport collaborator.
//!
//! The codecs only ever see byte slices. [`Transport`] is the seam between
//! them and whatever delivers those bytes; [`UdpTransport`] is the one
//! implementation shipped here.
//!
//! UDP delivers whole datagrams while framing code wants to peek at a header
//! before deciding how much to read, so received datagrams are queued and
//! served byte by byte.
//!
//! # Example
//!
//! ```no_run
//! use plc4x_codec::bacnetip::Bvlc;
//! use plc4x_codec::{Parse, Transport, UdpTransport};
//! use std::time::Duration;
//!
//! let mut transport = UdpTransport::new(
//!     "192.168.1.10:47808".parse().unwrap(),
//!     Duration::from_secs(2),
//! );
//! transport.connect().unwrap();
//! transport
//!     .write(&[0x81, 0x0B, 0x00, 0x0C, 0x01, 0x20, 0xFF, 0xFF, 0x00, 0xFF, 0x10, 0x08])
//!     .unwrap();
//!
//! let header = transport.peek_readable_bytes(4).unwrap();
//! let length = usize::from(u16::from_be_bytes([header[2], header[3]]));
//! let frame = transport.read(length).unwrap();
//! let reply = Bvlc::from_bytes(&frame, ()).unwrap();
//! ```

use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::debug;

use crate::error::{CodecError, Result};

/// Default timeout for UDP operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default size of the receive buffer for one datagram.
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 2048;

/// A connection that moves bytes.
pub trait Transport {
    /// Opens the connection. Opening an open transport does nothing.
    fn connect(&mut self) -> Result<()>;

    /// Closes the connection and drops buffered input.
    fn close(&mut self) -> Result<()>;

    /// Whether [`connect`](Transport::connect) succeeded and the transport
    /// has not been closed since.
    fn is_connected(&self) -> bool;

    /// Number of bytes that can be read without blocking.
    fn num_readable_bytes(&mut self) -> Result<usize>;

    /// Returns the next `count` bytes without consuming them, waiting for
    /// input if needed.
    fn peek_readable_bytes(&mut self, count: usize) -> Result<Vec<u8>>;

    /// Consumes and returns the next `count` bytes, waiting for input if
    /// needed.
    fn read(&mut self, count: usize) -> Result<Vec<u8>>;

    /// Sends `data`.
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

/// Blocking UDP transport to one remote endpoint.
pub struct UdpTransport {
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    timeout: Duration,
    max_datagram_size: usize,
    socket: Option<UdpSocket>,
    received: VecDeque<u8>,
}

impl UdpTransport {
    /// Creates an unconnected transport to `remote_addr`, bound to any local
    /// port once connected.
    pub fn new(remote_addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            local_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            remote_addr,
            timeout,
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
            socket: None,
            received: VecDeque::new(),
        }
    }

    /// Creates an unconnected transport with [`DEFAULT_TIMEOUT`].
    pub fn with_default_timeout(remote_addr: SocketAddr) -> Self {
        Self::new(remote_addr, DEFAULT_TIMEOUT)
    }

    /// Sets the local address to bind on connect.
    pub fn with_local_addr(mut self, local_addr: SocketAddr) -> Self {
        self.local_addr = local_addr;
        self
    }

    /// Sets the largest datagram accepted. Longer datagrams are truncated by
    /// the socket.
    pub fn with_max_datagram_size(mut self, max_datagram_size: usize) -> Self {
        self.max_datagram_size = max_datagram_size;
        self
    }

    /// Returns the remote address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Returns the bound local address, once connected.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|socket| socket.local_addr().ok())
    }

    /// Returns the read/write timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn socket(&self) -> Result<&UdpSocket> {
        self.socket.as_ref().ok_or(CodecError::NotConnected)
    }

    /// Blocks for one datagram and queues it.
    fn receive(&mut self) -> Result<()> {
        let mut datagram = vec![0u8; self.max_datagram_size];
        let size = self.socket()?.recv(&mut datagram).map_err(map_io_error)?;
        debug!(size, remote = %self.remote_addr, "received datagram");
        self.received.extend(&datagram[..size]);
        Ok(())
    }

    /// Queues every datagram already waiting on the socket.
    fn drain_pending(&mut self) -> Result<()> {
        self.socket()?.set_nonblocking(true)?;
        let result = loop {
            match self.receive() {
                Ok(()) => continue,
                Err(CodecError::Timeout) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        self.socket()?.set_nonblocking(false)?;
        result
    }

    fn fill(&mut self, count: usize) -> Result<()> {
        while self.received.len() < count {
            self.receive()?;
        }
        Ok(())
    }
}

fn map_io_error(err: io::Error) -> CodecError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => CodecError::Timeout,
        _ => CodecError::Io(err),
    }
}

impl Transport for UdpTransport {
    fn connect(&mut self) -> Result<()> {
        if self.socket.is_some() {
            return Ok(());
        }
        let socket = UdpSocket::bind(self.local_addr)?;
        socket.connect(self.remote_addr)?;
        socket.set_read_timeout(Some(self.timeout))?;
        socket.set_write_timeout(Some(self.timeout))?;
        debug!(
            local = ?socket.local_addr().ok(),
            remote = %self.remote_addr,
            "udp transport connected"
        );
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            debug!(remote = %self.remote_addr, "udp transport closed");
        }
        self.received.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn num_readable_bytes(&mut self) -> Result<usize> {
        self.drain_pending()?;
        Ok(self.received.len())
    }

    fn peek_readable_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.fill(count)?;
        Ok(self.received.iter().take(count).copied().collect())
    }

    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        self.fill(count)?;
        Ok(self.received.drain(..count).collect())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let sent = self.socket()?.send(data).map_err(map_io_error)?;
        debug!(size = sent, remote = %self.remote_addr, "sent datagram");
        if sent != data.len() {
            return Err(CodecError::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} bytes", data.len()),
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("remote_addr", &self.remote_addr)
            .field("local_addr", &self.local_addr())
            .field("buffered", &self.received.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> (UdpSocket, UdpTransport) {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let mut transport = UdpTransport::new(peer.local_addr().unwrap(), Duration::from_secs(2))
            .with_local_addr("127.0.0.1:0".parse().unwrap());
        transport.connect().unwrap();
        (peer, transport)
    }

    /// Writes `request`, answers it with `reply` and returns what the peer got.
    fn exchange(
        peer: &UdpSocket,
        transport: &mut UdpTransport,
        request: &[u8],
        reply: &[u8],
    ) -> Vec<u8> {
        transport.write(request).unwrap();
        let mut buffer = [0u8; 64];
        let (size, from) = peer.recv_from(&mut buffer).unwrap();
        peer.send_to(reply, from).unwrap();
        buffer[..size].to_vec()
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(2));
        assert_eq!(DEFAULT_MAX_DATAGRAM_SIZE, 2048);
    }

    #[test]
    fn test_not_connected() {
        let mut transport = UdpTransport::with_default_timeout("127.0.0.1:47808".parse().unwrap());
        assert!(!transport.is_connected());
        assert!(transport.local_addr().is_none());
        assert!(matches!(transport.write(&[0x01]), Err(CodecError::NotConnected)));
        assert!(matches!(transport.read(1), Err(CodecError::NotConnected)));
        assert!(matches!(transport.num_readable_bytes(), Err(CodecError::NotConnected)));
    }

    #[test]
    fn test_write_and_read() {
        let (peer, mut transport) = loopback();
        let reply = [0x81, 0x00, 0x00, 0x06, 0x00, 0x00];
        let sent = exchange(&peer, &mut transport, &[0x01, 0x02], &reply);
        assert_eq!(sent, [0x01, 0x02]);

        assert_eq!(transport.peek_readable_bytes(4).unwrap(), [0x81, 0x00, 0x00, 0x06]);
        assert_eq!(transport.num_readable_bytes().unwrap(), 6);
        assert_eq!(transport.read(2).unwrap(), [0x81, 0x00]);
        assert_eq!(transport.read(4).unwrap(), [0x00, 0x06, 0x00, 0x00]);
        assert_eq!(transport.num_readable_bytes().unwrap(), 0);
    }

    #[test]
    fn test_read_spans_datagrams() {
        let (peer, mut transport) = loopback();
        exchange(&peer, &mut transport, &[0x00], &[0x0A, 0x0B]);
        let from = transport.local_addr().unwrap();
        peer.send_to(&[0x0C], from).unwrap();
        assert_eq!(transport.read(3).unwrap(), [0x0A, 0x0B, 0x0C]);
    }

    #[test]
    fn test_timeout() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut transport = UdpTransport::new(peer.local_addr().unwrap(), Duration::from_millis(50))
            .with_local_addr("127.0.0.1:0".parse().unwrap());
        transport.connect().unwrap();
        assert!(matches!(transport.read(1), Err(CodecError::Timeout)));
    }

    #[test]
    fn test_close_drops_buffer() {
        let (peer, mut transport) = loopback();
        exchange(&peer, &mut transport, &[0x00], &[0x01, 0x02]);
        assert_eq!(transport.peek_readable_bytes(1).unwrap(), [0x01]);
        transport.close().unwrap();
        assert!(!transport.is_connected());
        assert!(matches!(transport.read(1), Err(CodecError::NotConnected)));

        transport.connect().unwrap();
        assert_eq!(transport.num_readable_bytes().unwrap(), 0);
    }

    #[test]
    fn test_transport_debug() {
        let transport = UdpTransport::with_default_timeout("127.0.0.1:502".parse().unwrap());
        let debug_str = format!("{:?}", transport);
        assert!(debug_str.contains("UdpTransport"));
        assert!(debug_str.contains("127.0.0.1:502"));
    }
}
