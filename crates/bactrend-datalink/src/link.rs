use std::fmt;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataLinkError {
    #[error("socket: {0}")]
    Io(#[from] std::io::Error),
    /// An NPDU of this many octets does not fit the frame or the caller's buffer.
    #[error("{0}-octet NPDU does not fit")]
    Oversized(usize),
    #[error("malformed frame")]
    InvalidFrame,
    /// A well-formed frame that carries no NPDU, such as a BVLC-Result.
    #[error("BVLL function 0x{0:02x} carries no NPDU")]
    NotNpdu(u8),
}

impl DataLinkError {
    /// Errors that only concern one frame; a receive loop should move on.
    pub fn is_per_frame(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Moves NPDUs to and from peers.
pub trait DataLink: Send + Sync {
    async fn send(&self, to: DataLinkAddress, npdu: &[u8]) -> Result<(), DataLinkError>;

    /// Writes the next NPDU into `buf` and returns its length and sender.
    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, DataLinkAddress), DataLinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataLinkAddress {
    Ip(SocketAddr),
}

impl DataLinkAddress {
    /// UDP port 0xBAC0.
    pub const DEFAULT_BIP_PORT: u16 = 47808;

    pub fn socket_addr(self) -> SocketAddr {
        let Self::Ip(addr) = self;
        addr
    }

    pub fn is_broadcast(self) -> bool {
        matches!(self.socket_addr().ip(), IpAddr::V4(v4) if v4.is_broadcast())
    }
}

impl From<SocketAddr> for DataLinkAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::Ip(addr)
    }
}

impl fmt::Display for DataLinkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Ip(addr) = self;
        write!(f, "{addr}")
    }
}

#[cfg(test)]
mod tests {
    use super::{DataLinkAddress, DataLinkError};
    use std::net::{Ipv4Addr, SocketAddr};

    #[test]
    fn address_display_and_broadcast() {
        let unicast = DataLinkAddress::from(SocketAddr::from((
            Ipv4Addr::new(10, 0, 0, 5),
            DataLinkAddress::DEFAULT_BIP_PORT,
        )));
        assert_eq!(unicast.to_string(), "10.0.0.5:47808");
        assert!(!unicast.is_broadcast());

        let broadcast = DataLinkAddress::Ip(SocketAddr::from((Ipv4Addr::BROADCAST, 47808)));
        assert!(broadcast.is_broadcast());
    }

    #[test]
    fn only_socket_errors_are_fatal() {
        assert!(DataLinkError::NotNpdu(0).is_per_frame());
        assert!(DataLinkError::Oversized(2000).is_per_frame());
        let io = DataLinkError::from(std::io::Error::other("closed"));
        assert!(!io.is_per_frame());
    }
}
