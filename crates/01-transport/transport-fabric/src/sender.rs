use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use log::{trace, warn};
use transport_codecs::{encode, Command, WireFormat};

use crate::error::{FabricError, FabricResult};

/// Result of a best-effort send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Datagram handed to the socket; carries the byte count.
    Sent(usize),
    /// Sender has no peer; nothing was sent.
    NotConnected,
}

/// Client side of the command channel.
pub struct DatagramSender {
    socket: Option<UdpSocket>,
}

impl DatagramSender {
    /// Sender with no peer. Every send is skipped with a warning.
    pub fn unconnected() -> Self {
        Self { socket: None }
    }

    /// Binds an ephemeral local port and fixes `address:port` as the peer.
    pub fn connect(address: &str, port: u16) -> FabricResult<Self> {
        let ip: IpAddr = address
            .parse()
            .map_err(|_| FabricError::InvalidAddress(address.to_string()))?;
        let addr = SocketAddr::new(ip, port);
        let local = match ip {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(local).map_err(|source| FabricError::Bind {
            addr: local,
            source,
        })?;
        socket
            .connect(addr)
            .map_err(|source| FabricError::Connect { addr, source })?;
        Ok(Self {
            socket: Some(socket),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.peer_addr().ok())
    }

    /// Sends one command datagram.
    pub fn send(&self, command: Command, format: WireFormat) -> FabricResult<SendOutcome> {
        let Some(socket) = &self.socket else {
            warn!("socket not connected for send; dropping {command}");
            return Ok(SendOutcome::NotConnected);
        };
        let payload = encode(command, format);
        let sent = socket.send(&payload).map_err(FabricError::Send)?;
        trace!("SEND {command}: {sent} byte(s) as {format:?}");
        Ok(SendOutcome::Sent(sent))
    }
}
