use crate::bip::bvll::Bvll;
use crate::{DataLink, DataLinkAddress, DataLinkError};
use bactrend_core::encoding::writer::Writer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Largest datagram sent or accepted, BVLL header included.
pub const MAX_DATAGRAM_LEN: usize = 1600;

/// BACnet/IP over one UDP socket. Clones share the socket, so a responder
/// and a client in the same process can use one port.
#[derive(Debug, Clone)]
pub struct BacnetIpTransport {
    socket: Arc<UdpSocket>,
}

impl BacnetIpTransport {
    pub async fn bind(addr: SocketAddr) -> Result<Self, DataLinkError> {
        let socket = UdpSocket::bind(addr).await?;
        socket.set_broadcast(true)?;
        log::debug!("BACnet/IP bound to {}", socket.local_addr()?);
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DataLinkError> {
        Ok(self.socket.local_addr()?)
    }
}

impl DataLink for BacnetIpTransport {
    async fn send(&self, to: DataLinkAddress, npdu: &[u8]) -> Result<(), DataLinkError> {
        let mut datagram = [0u8; MAX_DATAGRAM_LEN];
        let mut w = Writer::new(&mut datagram);
        Bvll::encode_original(&mut w, npdu, to.is_broadcast())
            .map_err(|_| DataLinkError::Oversized(npdu.len()))?;
        self.socket.send_to(w.as_written(), to.socket_addr()).await?;
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, DataLinkAddress), DataLinkError> {
        let mut datagram = [0u8; MAX_DATAGRAM_LEN];
        let (n, peer) = self.socket.recv_from(&mut datagram).await?;
        let (npdu, sender) = match Bvll::decode(&datagram[..n]) {
            Ok(Bvll::Npdu(npdu)) => (npdu, peer),
            Ok(Bvll::Forwarded { origin, npdu }) => (npdu, SocketAddr::V4(origin)),
            Ok(Bvll::Other { function }) => {
                log::debug!("BVLL function 0x{function:02x} from {peer} ignored");
                return Err(DataLinkError::NotNpdu(function));
            }
            Err(err) => {
                log::debug!("bad BVLL frame from {peer}: {err}");
                return Err(DataLinkError::InvalidFrame);
            }
        };
        buf.get_mut(..npdu.len())
            .ok_or(DataLinkError::Oversized(npdu.len()))?
            .copy_from_slice(npdu);
        Ok((npdu.len(), sender.into()))
    }
}
