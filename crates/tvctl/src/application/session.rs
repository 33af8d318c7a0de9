//! The protocol session: pairing handshake plus correlated request/response
//! multiplexing over one WebSocket connection.
//!
//! # Design
//!
//! One logical session per process, many concurrent logical requests over the
//! single connection.  A dedicated *router* task consumes the transport's
//! ordered event stream and dispatches each inbound frame to a
//! correlation-keyed table of oneshot completions.  Request callers suspend on
//! their own oneshot receiver and are resumed exactly once — with the matching
//! response, a device error, a timeout, or [`TvError::ConnectionClosed`] when
//! the session shuts down underneath them.
//!
//! The waiter table is behind a `tokio::sync::Mutex`: both the router and
//! request submission touch it from different runtime threads, and serialising
//! access is what preserves the at-most-once completion invariant (an entry is
//! removed under the lock before its sender is consumed).
//!
//! # Handshake
//!
//! ```text
//! Client                                TV
//! ──────                                ──
//! connect()            ws handshake →
//! register(key?)       register {client-key, manifest} →
//!                                       (user confirms on screen)
//!                      ← registered {client-key: "fresh"}   new pairing
//!                      ← registered {}                      stored key reused
//!                      ← error {…}                          rejected
//! request(uri, params) request {id, uri, payload} →
//!                      ← response {id, payload}  (any order, matched by id)
//! ```
//!
//! Requests submitted before `register` succeeds fail immediately with
//! [`TvError::NotAuthenticated`] without touching the transport.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use ssap_core::protocol::correlation::{CorrelationCounter, REGISTER_ID};
use ssap_core::protocol::manifest::register_payload;
use ssap_core::protocol::messages::SsapMessage;
use ssap_core::DeviceEndpoint;

use crate::domain::config::ClientConfig;
use crate::domain::error::TvError;
use crate::infrastructure::transport::{Transport, TransportEvent};

/// What a suspended `request` caller eventually receives.
type RequestReply = Result<Value, TvError>;

/// What a suspended `register` caller eventually receives: the fresh
/// credential, or `None` when the stored one was reused.
type PairingReply = Result<Option<String>, TvError>;

/// Correlation-keyed completions shared between the session and its router.
struct Waiters {
    /// In-flight requests, keyed by correlation id.
    pending: Mutex<HashMap<String, oneshot::Sender<RequestReply>>>,
    /// The single in-flight registration, if any.
    pairing: Mutex<Option<oneshot::Sender<PairingReply>>>,
}

impl Waiters {
    fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            pairing: Mutex::new(None),
        }
    }

    /// Completes every waiter with [`TvError::ConnectionClosed`].
    ///
    /// Entries are drained under the lock, so each oneshot fires at most once
    /// even when the router and `close()` race here.
    async fn fail_all(&self) {
        let drained: Vec<_> = {
            let mut pending = self.pending.lock().await;
            pending.drain().collect()
        };
        for (id, tx) in drained {
            debug!("failing pending request {id}: connection closed");
            let _ = tx.send(Err(TvError::ConnectionClosed));
        }
        if let Some(tx) = self.pairing.lock().await.take() {
            let _ = tx.send(Err(TvError::ConnectionClosed));
        }
    }
}

/// A live session with one TV.
///
/// Created unauthenticated by [`connect`](Self::connect); becomes
/// authenticated after [`register`](Self::register) succeeds.  Dropping the
/// session aborts its background tasks; call [`close`](Self::close) for an
/// orderly shutdown that fails outstanding requests instead of stranding them.
pub struct TvSession {
    config: ClientConfig,
    transport: Transport,
    waiters: Arc<Waiters>,
    authenticated: AtomicBool,
    closed: AtomicBool,
    ids: CorrelationCounter,
    router: JoinHandle<()>,
}

impl TvSession {
    /// Opens the WebSocket connection and starts the router task.
    ///
    /// The whole connection establishment is bounded by
    /// `config.request_timeout`.
    ///
    /// # Errors
    ///
    /// [`TvError::Connect`] when the TV is unreachable or refuses the
    /// connection; [`TvError::Timeout`] when establishment exceeds the bound.
    pub async fn connect(config: ClientConfig) -> Result<Self, TvError> {
        info!("connecting to TV at {}", config.endpoint);
        let (transport, events) =
            timeout(config.request_timeout, Transport::connect(&config.endpoint))
                .await
                .map_err(|_| TvError::Timeout(config.request_timeout))??;

        let waiters = Arc::new(Waiters::new());
        let router = tokio::spawn(route_events(events, Arc::clone(&waiters)));

        Ok(Self {
            config,
            transport,
            waiters,
            authenticated: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            ids: CorrelationCounter::new(),
            router,
        })
    }

    /// The endpoint this session is connected to.
    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.config.endpoint
    }

    /// Whether the pairing handshake has completed.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Performs the registration handshake.
    ///
    /// Sends the `register` frame carrying the stored credential (empty string
    /// when `None`) and the fixed manifest, then waits — under the pairing
    /// timeout, since the user may need to confirm on the TV — for the verdict.
    ///
    /// On success the session is authenticated.  Returns the freshly issued
    /// credential, or `None` when the TV accepted the stored one (nothing new
    /// to persist).
    ///
    /// # Errors
    ///
    /// [`TvError::PairingRejected`] when the TV declines,
    /// [`TvError::Timeout`] when no verdict arrives in time (the session is
    /// closed), [`TvError::NotConnected`] when the transport is already gone.
    pub async fn register(&self, credential: Option<&str>) -> Result<Option<String>, TvError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut slot = self.waiters.pairing.lock().await;
            *slot = Some(tx);
        }

        let msg = SsapMessage::Register {
            id: REGISTER_ID.to_string(),
            payload: register_payload(credential.unwrap_or("")),
        };
        let text = msg.to_json()?;
        if let Err(e) = self.transport.send(text).await {
            self.waiters.pairing.lock().await.take();
            return Err(e);
        }
        debug!(
            "sent register frame ({} stored credential)",
            if credential.is_some() { "with" } else { "no" }
        );

        match timeout(self.config.pairing_timeout, rx).await {
            Err(_) => {
                // No verdict in time: drop the waiter so a late registered
                // frame is discarded, and tear the connection down.
                self.waiters.pairing.lock().await.take();
                self.close().await;
                Err(TvError::Timeout(self.config.pairing_timeout))
            }
            Ok(Err(_)) => Err(TvError::ConnectionClosed),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Ok(Ok(new_key))) => {
                self.authenticated.store(true, Ordering::SeqCst);
                info!(
                    "registered with TV ({})",
                    if new_key.is_some() {
                        "new credential issued"
                    } else {
                        "stored credential reused"
                    }
                );
                Ok(new_key)
            }
        }
    }

    /// Issues one correlated request and waits for its reply.
    ///
    /// Concurrent calls on the same session are fine: each gets a fresh
    /// correlation id and replies are matched purely by id, in whatever order
    /// the TV produces them.
    ///
    /// # Errors
    ///
    /// [`TvError::NotAuthenticated`] before [`register`](Self::register)
    /// succeeds (checked first, without touching the transport);
    /// [`TvError::Timeout`] when no reply arrives within the request timeout —
    /// the pending entry is removed, so a late reply with this id is silently
    /// discarded; [`TvError::Device`] when the TV answers with an error frame;
    /// [`TvError::ConnectionClosed`] when the session closes mid-flight.
    pub async fn request(&self, uri: &str, params: Option<Value>) -> Result<Value, TvError> {
        if !self.is_authenticated() {
            return Err(TvError::NotAuthenticated);
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(TvError::NotConnected);
        }

        let id = self.ids.next();
        let (tx, rx) = oneshot::channel();
        self.waiters.pending.lock().await.insert(id.clone(), tx);

        let msg = SsapMessage::Request {
            id: id.clone(),
            uri: uri.to_string(),
            payload: params,
        };
        let text = match msg.to_json() {
            Ok(t) => t,
            Err(e) => {
                self.waiters.pending.lock().await.remove(&id);
                return Err(e.into());
            }
        };
        if let Err(e) = self.transport.send(text).await {
            self.waiters.pending.lock().await.remove(&id);
            return Err(e);
        }
        debug!("sent request {id} for {uri}");

        match timeout(self.config.request_timeout, rx).await {
            Err(_) => {
                // Remove the entry so the late reply (if the TV is merely
                // slow) is dropped as unmatched instead of resuming a caller
                // that already gave up.
                self.waiters.pending.lock().await.remove(&id);
                Err(TvError::Timeout(self.config.request_timeout))
            }
            Ok(Err(_)) => Err(TvError::ConnectionClosed),
            Ok(Ok(reply)) => reply,
        }
    }

    /// Closes the session.
    ///
    /// Idempotent.  Every currently-pending request completes with
    /// [`TvError::ConnectionClosed`] rather than being left to time out.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("closing session with {}", self.config.endpoint);
        self.transport.close().await;
        self.waiters.fail_all().await;
    }
}

impl Drop for TvSession {
    fn drop(&mut self) {
        self.router.abort();
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Consumes the transport event stream and routes frames to waiters.
///
/// Runs until the transport closes or fails, then fails every remaining
/// waiter.  Malformed frames are logged and dropped — one garbled frame must
/// not kill the session.
async fn route_events(mut events: mpsc::Receiver<TransportEvent>, waiters: Arc<Waiters>) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Text(text) => match SsapMessage::from_json(&text) {
                Ok(msg) => {
                    debug!(
                        "inbound {} frame (id {:?})",
                        msg.message_type(),
                        msg.correlation_id()
                    );
                    dispatch(msg, &waiters).await;
                }
                Err(e) => warn!("dropping malformed frame: {e}"),
            },
            TransportEvent::Closed => {
                debug!("transport closed; router exiting");
                break;
            }
            TransportEvent::Error(detail) => {
                warn!("transport error: {detail}; router exiting");
                break;
            }
        }
    }
    waiters.fail_all().await;
}

/// Routes one parsed frame to at most one waiter.
async fn dispatch(msg: SsapMessage, waiters: &Waiters) {
    match msg {
        SsapMessage::Registered { payload, .. } => {
            let key = payload.and_then(|p| p.client_key);
            match waiters.pairing.lock().await.take() {
                Some(tx) => {
                    let _ = tx.send(Ok(key));
                }
                None => debug!("unsolicited registered frame discarded"),
            }
        }

        SsapMessage::Response { id, payload } => {
            match waiters.pending.lock().await.remove(&id) {
                Some(tx) => {
                    let _ = tx.send(Ok(payload.unwrap_or(Value::Null)));
                }
                None => debug!("unmatched response {id} discarded"),
            }
        }

        SsapMessage::Error { id, error, .. } => {
            let detail = error.unwrap_or_else(|| "unspecified device error".to_string());
            if let Some(id) = id.as_deref() {
                if let Some(tx) = waiters.pending.lock().await.remove(id) {
                    let _ = tx.send(Err(TvError::Device(detail)));
                    return;
                }
                // A request id nobody is waiting on (e.g., the caller timed
                // out) must not spill over into the handshake.
                if id != REGISTER_ID {
                    debug!("unmatched error for {id} discarded: {detail}");
                    return;
                }
            }
            // No id, or the register id: during the handshake the TV reports
            // rejection either way.
            match waiters.pairing.lock().await.take() {
                Some(tx) => {
                    let _ = tx.send(Err(TvError::PairingRejected(detail)));
                }
                None => debug!("unmatched error frame discarded: {detail}"),
            }
        }

        // The TV never sends client→TV frame types; drop defensively.
        SsapMessage::Register { .. } | SsapMessage::Request { .. } => {
            warn!("ignoring client-only frame type from TV");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
//
// These cover the routing invariants in isolation; the full connect/register/
// request lifecycle against a live in-process TV lives in
// tests/session_integration.rs.

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ssap_core::protocol::messages::RegisteredPayload;

    async fn waiters_with_pending(id: &str) -> (Waiters, oneshot::Receiver<RequestReply>) {
        let waiters = Waiters::new();
        let (tx, rx) = oneshot::channel();
        waiters.pending.lock().await.insert(id.to_string(), tx);
        (waiters, rx)
    }

    #[tokio::test]
    async fn test_response_resumes_the_matching_waiter() {
        // Arrange
        let (waiters, rx) = waiters_with_pending("req_0").await;

        // Act
        dispatch(
            SsapMessage::Response {
                id: "req_0".to_string(),
                payload: Some(json!({"returnValue": true})),
            },
            &waiters,
        )
        .await;

        // Assert
        let reply = rx.await.expect("completed").expect("success");
        assert_eq!(reply["returnValue"], json!(true));
        assert!(waiters.pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_response_is_discarded() {
        // A reply for an id nobody is waiting on (e.g., after a timeout
        // removed the entry) must be dropped without disturbing others.
        let (waiters, rx) = waiters_with_pending("req_0").await;

        dispatch(
            SsapMessage::Response {
                id: "req_99".to_string(),
                payload: None,
            },
            &waiters,
        )
        .await;

        // The unrelated waiter is still pending.
        assert!(waiters.pending.lock().await.contains_key("req_0"));
        drop(waiters);
        assert!(rx.await.is_err(), "waiter must not have been completed");
    }

    #[tokio::test]
    async fn test_error_frame_resumes_waiter_with_device_error() {
        let (waiters, rx) = waiters_with_pending("req_4").await;

        dispatch(
            SsapMessage::Error {
                id: Some("req_4".to_string()),
                error: Some("500 app not found".to_string()),
                payload: None,
            },
            &waiters,
        )
        .await;

        match rx.await.expect("completed") {
            Err(TvError::Device(detail)) => assert_eq!(detail, "500 app not found"),
            other => panic!("expected Device error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_registered_with_key_resumes_pairing_waiter() {
        // Arrange
        let waiters = Waiters::new();
        let (tx, rx) = oneshot::channel();
        *waiters.pairing.lock().await = Some(tx);

        // Act
        dispatch(
            SsapMessage::Registered {
                id: Some(REGISTER_ID.to_string()),
                payload: Some(RegisteredPayload {
                    client_key: Some("fresh-key".to_string()),
                }),
            },
            &waiters,
        )
        .await;

        // Assert
        let verdict = rx.await.expect("completed").expect("accepted");
        assert_eq!(verdict.as_deref(), Some("fresh-key"));
    }

    #[tokio::test]
    async fn test_registered_without_key_signals_reuse() {
        let waiters = Waiters::new();
        let (tx, rx) = oneshot::channel();
        *waiters.pairing.lock().await = Some(tx);

        dispatch(
            SsapMessage::Registered {
                id: None,
                payload: None,
            },
            &waiters,
        )
        .await;

        let verdict = rx.await.expect("completed").expect("accepted");
        assert_eq!(verdict, None);
    }

    #[tokio::test]
    async fn test_error_without_id_rejects_pairing() {
        let waiters = Waiters::new();
        let (tx, rx) = oneshot::channel();
        *waiters.pairing.lock().await = Some(tx);

        dispatch(
            SsapMessage::Error {
                id: None,
                error: Some("403 pairing denied".to_string()),
                payload: None,
            },
            &waiters,
        )
        .await;

        match rx.await.expect("completed") {
            Err(TvError::PairingRejected(detail)) => assert_eq!(detail, "403 pairing denied"),
            other => panic!("expected PairingRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_with_unknown_request_id_does_not_reject_pairing() {
        // Arrange: a pairing in flight, and an error bearing a request id
        // nobody is waiting on (its caller already timed out).
        let waiters = Waiters::new();
        let (tx, rx) = oneshot::channel();
        *waiters.pairing.lock().await = Some(tx);

        // Act
        dispatch(
            SsapMessage::Error {
                id: Some("req_7".to_string()),
                error: Some("500 too late".to_string()),
                payload: None,
            },
            &waiters,
        )
        .await;

        // Assert: the frame was discarded, not routed to the pairing waiter
        assert!(waiters.pairing.lock().await.is_some());
        drop(waiters);
        assert!(rx.await.is_err(), "pairing must not have been completed");
    }

    #[tokio::test]
    async fn test_fail_all_completes_every_waiter_exactly_once() {
        // Arrange: three pending requests and a pairing waiter
        let waiters = Waiters::new();
        let mut receivers = Vec::new();
        for i in 0..3 {
            let (tx, rx) = oneshot::channel();
            waiters
                .pending
                .lock()
                .await
                .insert(format!("req_{i}"), tx);
            receivers.push(rx);
        }
        let (ptx, prx) = oneshot::channel();
        *waiters.pairing.lock().await = Some(ptx);

        // Act: racing fail_all twice must still complete each waiter once
        waiters.fail_all().await;
        waiters.fail_all().await;

        // Assert
        for rx in receivers {
            match rx.await.expect("completed once") {
                Err(TvError::ConnectionClosed) => {}
                other => panic!("expected ConnectionClosed, got {other:?}"),
            }
        }
        assert!(matches!(
            prx.await.expect("completed once"),
            Err(TvError::ConnectionClosed)
        ));
        assert!(waiters.pending.lock().await.is_empty());
    }
}
