//! The transport session: one WebSocket connection to the TV.
//!
//! [`Transport`] owns the single bidirectional connection and its lifecycle.
//! On connect the stream is split: the write half goes behind an async mutex
//! so the session can send from any task; the read half is consumed by a
//! dedicated reader task that forwards inbound frames as an ordered
//! [`TransportEvent`] stream over a channel.  The channel preserves arrival
//! order — frames are never reordered on the way to the session router.
//!
//! # State machine
//!
//! ```text
//! Disconnected → Connecting → Connected → Closing → Disconnected
//!                                  └────→ Failed  → Disconnected
//! ```
//!
//! `send` is valid only in `Connected`.  `close` is idempotent, always ends in
//! `Disconnected`, and releases the connection on every path including error
//! paths (the reader task is aborted, dropping the read half).

use std::sync::{Arc, Mutex as StdMutex};

use futures_util::stream::{SplitSink, StreamExt};
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, warn};

use ssap_core::DeviceEndpoint;

use crate::domain::error::TvError;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
    Failed,
}

/// What the reader task delivers to the session, in arrival order.
#[derive(Debug)]
pub enum TransportEvent {
    /// One complete text frame from the TV.
    Text(String),
    /// The TV closed the connection (Close frame or EOF).
    Closed,
    /// A transport-level error; fatal to the session.
    Error(String),
}

/// State shared between the transport handle and its reader task.
struct Shared {
    sink: Mutex<WsSink>,
    state: StdMutex<ConnectionState>,
}

impl Shared {
    fn set_state(&self, next: ConnectionState) {
        // Poisoning cannot happen: no code path panics while holding the lock.
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(ConnectionState::Failed)
    }
}

/// Handle to the open WebSocket connection.
pub struct Transport {
    shared: Arc<Shared>,
    reader: JoinHandle<()>,
}

impl Transport {
    /// Opens a WebSocket connection to `endpoint`.
    ///
    /// Returns the transport handle together with the ordered inbound event
    /// stream.  The caller is expected to bound this with its own operation
    /// timeout; `connect` itself only fails on unreachable/refused endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`TvError::Connect`] when the TCP connection or WebSocket
    /// handshake fails.
    pub async fn connect(
        endpoint: &DeviceEndpoint,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), TvError> {
        let url = endpoint.ws_url();
        debug!("connecting to {url}");

        let (ws_stream, _response) =
            connect_async(url.as_str()).await.map_err(|e| TvError::Connect {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            })?;

        // Split into independent halves: the sink is shared behind a mutex,
        // the stream is owned by the reader task.
        let (sink, stream) = ws_stream.split();

        let shared = Arc::new(Shared {
            sink: Mutex::new(sink),
            state: StdMutex::new(ConnectionState::Connected),
        });

        // Small buffer is enough: the session router drains continuously and
        // the TV sends one reply per request.
        let (event_tx, event_rx) = mpsc::channel(64);

        let reader_shared = Arc::clone(&shared);
        let reader = tokio::spawn(read_frames(stream, reader_shared, event_tx));

        Ok((
            Self { shared, reader },
            event_rx,
        ))
    }

    /// Sends one text frame to the TV.
    ///
    /// # Errors
    ///
    /// Returns [`TvError::NotConnected`] outside the `Connected` state, and
    /// [`TvError::ConnectionClosed`] when the write itself fails (the TV went
    /// away mid-session); the latter also moves the transport to `Failed`.
    pub async fn send(&self, text: String) -> Result<(), TvError> {
        if self.shared.state() != ConnectionState::Connected {
            return Err(TvError::NotConnected);
        }

        let mut sink = self.shared.sink.lock().await;
        if let Err(e) = sink.send(WsMessage::Text(text)).await {
            warn!("websocket send failed: {e}");
            self.shared.set_state(ConnectionState::Failed);
            return Err(TvError::ConnectionClosed);
        }
        Ok(())
    }

    /// Closes the connection.
    ///
    /// Idempotent: calling it in any state ends in `Disconnected`.  A best-
    /// effort Close frame is sent, the reader task is aborted, and the read
    /// half is dropped with it.
    pub async fn close(&self) {
        match self.shared.state() {
            ConnectionState::Disconnected | ConnectionState::Closing => return,
            _ => {}
        }
        self.shared.set_state(ConnectionState::Closing);

        // Best effort: the peer may already be gone.
        let mut sink = self.shared.sink.lock().await;
        if let Err(e) = sink.send(WsMessage::Close(None)).await {
            debug!("close frame not delivered: {e}");
        }
        drop(sink);

        self.reader.abort();
        self.shared.set_state(ConnectionState::Disconnected);
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        // Releases the read half even when close() was never called.
        self.reader.abort();
    }
}

/// Reader task: forwards inbound frames to the session in arrival order.
async fn read_frames(
    mut stream: futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    shared: Arc<Shared>,
    events: mpsc::Sender<TransportEvent>,
) {
    loop {
        let frame = match stream.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(WsError::ConnectionClosed)) | None => {
                debug!("websocket closed by peer");
                shared.set_state(ConnectionState::Disconnected);
                let _ = events.send(TransportEvent::Closed).await;
                break;
            }
            Some(Err(e)) => {
                warn!("websocket read error: {e}");
                shared.set_state(ConnectionState::Failed);
                let _ = events.send(TransportEvent::Error(e.to_string())).await;
                break;
            }
        };

        match frame {
            WsMessage::Text(text) => {
                // Receiver dropped means the session is shutting down.
                if events.send(TransportEvent::Text(text)).await.is_err() {
                    break;
                }
            }
            WsMessage::Close(_) => {
                debug!("received Close frame");
                shared.set_state(ConnectionState::Disconnected);
                let _ = events.send(TransportEvent::Closed).await;
                break;
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => {
                // tungstenite answers pings on the next sink write; nothing to do.
            }
            WsMessage::Binary(data) => {
                // SSAP is text-only; a binary frame is unexpected but not fatal.
                warn!("unexpected binary frame ({} bytes) ignored", data.len());
            }
            WsMessage::Frame(_) => {
                debug!("raw frame ignored");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_to_unreachable_endpoint_fails_with_connect_error() {
        // Port 1 on loopback is essentially never listening.
        let endpoint = DeviceEndpoint::new("127.0.0.1", 1);

        let result = Transport::connect(&endpoint).await;

        match result {
            Err(TvError::Connect { endpoint: ep, .. }) => {
                assert_eq!(ep, "127.0.0.1:1");
            }
            Ok(_) => panic!("connect to a closed port must fail"),
            Err(other) => panic!("expected Connect error, got {other}"),
        }
    }
}
