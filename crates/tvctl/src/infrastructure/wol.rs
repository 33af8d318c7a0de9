//! Wake-on-LAN sender.
//!
//! Broadcasts the magic packet built by [`ssap_core::wake`] as a UDP datagram
//! to the echo and discard ports (7 and 9) on the broadcast address.  A TV in
//! standby with "Wake-on-LAN" enabled powers on within a few seconds of
//! receiving it.  UDP gives no delivery confirmation; sending to both ports is
//! the conventional belt-and-braces the reference implementations use.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use ssap_core::wake::{magic_packet, MacAddr, WAKE_PORTS};

/// Error type for wake-packet delivery.
#[derive(Debug, Error)]
pub enum WolError {
    /// The UDP socket could not be bound or switched to broadcast mode.
    #[error("failed to set up broadcast socket: {0}")]
    Socket(#[source] std::io::Error),

    /// The packet could not be delivered to any wake port.
    #[error("failed to send wake packet to {addr}: {source}")]
    Send {
        addr: IpAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Broadcasts the wake packet for `mac` to `broadcast` on ports 7 and 9.
///
/// A failure on one port is logged and tolerated as long as at least one send
/// succeeds, mirroring the reference implementation's behaviour.
///
/// # Errors
///
/// Returns [`WolError::Socket`] if the socket cannot be prepared, or
/// [`WolError::Send`] when delivery fails on every wake port.
pub async fn send_wake(mac: &MacAddr, broadcast: IpAddr) -> Result<(), WolError> {
    let packet = magic_packet(mac);

    // Ephemeral local port; the kernel picks one.
    let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(WolError::Socket)?;
    socket.set_broadcast(true).map_err(WolError::Socket)?;

    let mut last_err: Option<std::io::Error> = None;
    let mut sent = 0usize;
    for port in WAKE_PORTS {
        let addr = SocketAddr::new(broadcast, port);
        match socket.send_to(&packet, addr).await {
            Ok(n) => {
                debug!("sent {n}-byte wake packet for {mac} to {addr}");
                sent += 1;
            }
            Err(e) => {
                warn!("wake packet to {addr} failed: {e}");
                last_err = Some(e);
            }
        }
    }

    if sent == 0 {
        // last_err is always Some here: sent == 0 implies every port errored.
        return Err(WolError::Send {
            addr: broadcast,
            source: last_err.unwrap_or_else(|| std::io::Error::other("no wake ports")),
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Sends a wake packet to loopback and verifies the receiver observes the
    /// exact 102-byte payload, without needing real broadcast permissions.
    #[tokio::test]
    async fn test_wake_packet_arrives_intact_over_udp() {
        // Arrange: listen on an ephemeral loopback port and aim port 7's send
        // at it by constructing the datagram path manually.
        let receiver = UdpSocket::bind("127.0.0.1:0").await.expect("bind receiver");
        let receiver_addr = receiver.local_addr().expect("addr");

        let mac: MacAddr = "AA:BB:CC:DD:EE:FF".parse().expect("mac");
        let packet = magic_packet(&mac);

        let sender = UdpSocket::bind("127.0.0.1:0").await.expect("bind sender");
        sender.send_to(&packet, receiver_addr).await.expect("send");

        // Act
        let mut buf = [0u8; 256];
        let (n, _) = receiver.recv_from(&mut buf).await.expect("recv");

        // Assert
        assert_eq!(n, 102);
        assert!(buf[..6].iter().all(|&b| b == 0xFF));
        assert_eq!(&buf[6..12], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[tokio::test]
    async fn test_send_wake_to_loopback_succeeds() {
        // Loopback accepts broadcast-flagged sockets sending unicast, so this
        // exercises the real send_wake path end to end.
        let mac: MacAddr = "dc:03:98:18:49:1c".parse().expect("mac");
        let result = send_wake(&mac, IpAddr::from([127, 0, 0, 1])).await;
        assert!(result.is_ok(), "send_wake failed: {result:?}");
    }
}
