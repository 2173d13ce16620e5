//! Listener configuration.

use crate::protocol::{DEFAULT_PORT, RECORD_SIZE};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default socket read timeout. Bounds how long `stop()` can wait on an idle socket.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Default receive buffer; comfortably larger than one record plus any extension.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 2048;

/// Where and how a [`GazeListener`](crate::GazeListener) receives datagrams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Local address to bind. Defaults to all IPv4 interfaces.
    pub bind_addr: IpAddr,
    /// UDP port. 0 asks the OS for an ephemeral port (see `GazeListener::local_addr`).
    pub port: u16,
    /// Socket read timeout used to poll the stop flag. `None` blocks indefinitely;
    /// `stop()` then relies on a wake-up datagram to unblock the receive.
    pub read_timeout: Option<Duration>,
    /// Size of the receive buffer. Datagrams longer than this are truncated,
    /// which is harmless as long as it stays >= the record size.
    pub recv_buffer_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

impl ListenerConfig {
    /// Default configuration on a specific port.
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn bind_addr(mut self, addr: IpAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        // A zero timeout is rejected by set_read_timeout.
        self.read_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Socket address the listener binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Buffer size actually allocated by the receive loop.
    pub(crate) fn effective_buffer_size(&self) -> usize {
        self.recv_buffer_size.max(RECORD_SIZE)
    }
}
