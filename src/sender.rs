use crate::protocol::{self, DEFAULT_PORT};
use crate::types::GazeSample;
use crate::Result;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

/// Fire-and-forget producer of gaze datagrams.
///
/// Binds an ephemeral local port and sends one 24-byte record per sample to
/// a fixed target. Nothing is acknowledged or retried.
pub struct GazeSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl GazeSender {
    pub fn new(target: SocketAddr) -> Result<GazeSender> {
        let bind: SocketAddr = match target.ip() {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind)?;
        log::info!("Gaze sender ready, sending to {}", target);
        Ok(GazeSender { socket, target })
    }

    /// Sender targeting `127.0.0.1` on the default port.
    pub fn localhost() -> Result<GazeSender> {
        Self::new((Ipv4Addr::LOCALHOST, DEFAULT_PORT).into())
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn send(&self, sample: &GazeSample) -> Result<()> {
        self.socket.send_to(&protocol::encode(sample), self.target)?;
        Ok(())
    }

    /// Send an arbitrary payload, e.g. an extended record or garbage for testing.
    pub fn send_raw(&self, payload: &[u8]) -> Result<()> {
        self.socket.send_to(payload, self.target)?;
        Ok(())
    }
}
