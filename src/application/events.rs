//! One-shot delivery of the attempt's `connect` or `error` event.
//!
//! The sender is consumed by `emit`, so an attempt can fire at most one
//! event; the receiver caches it so callers may observe it any number of
//! times.

use tokio::sync::oneshot;

use crate::application::handshake::{ConnectError, HandshakeFailure};
use crate::protocol::wire::ServerInfo;

/// Terminal event of one connection attempt.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Handshake accepted; carries the server `INFO`.
    Connect(Box<ServerInfo>),
    /// Handshake failed; carries the classified error.
    Error(ConnectError),
}

impl ConnectionEvent {
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self, ConnectionEvent::Connect(_))
    }

    /// The error, if this is an `error` event.
    #[must_use]
    pub fn error(&self) -> Option<&ConnectError> {
        match self {
            ConnectionEvent::Error(e) => Some(e),
            ConnectionEvent::Connect(_) => None,
        }
    }
}

/// Create a linked sender/receiver pair for one attempt.
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = oneshot::channel();
    (
        EventSender(tx),
        EventReceiver {
            rx: Some(rx),
            event: None,
        },
    )
}

/// Emitting half; held by the handshake driver.
#[derive(Debug)]
pub struct EventSender(oneshot::Sender<ConnectionEvent>);

impl EventSender {
    /// Deliver the attempt's event. Returns `false` if the receiver is gone.
    pub fn emit(self, event: ConnectionEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

/// Receiving half; held by the caller's `ConnectionHandle`.
#[derive(Debug)]
pub struct EventReceiver {
    rx: Option<oneshot::Receiver<ConnectionEvent>>,
    event: Option<ConnectionEvent>,
}

impl EventReceiver {
    /// Wait for the event. Resolves immediately once it has been received.
    ///
    /// Cancel safe: dropping the future before it resolves loses nothing.
    /// If the driver went away without emitting (task aborted or panicked),
    /// this resolves to a `CONNECTION_ERROR`.
    pub async fn recv(&mut self) -> &ConnectionEvent {
        if let Some(rx) = self.rx.as_mut() {
            let event = rx.await.unwrap_or_else(|_| orphaned());
            self.rx = None;
            self.event = Some(event);
        }
        self.event.get_or_insert_with(orphaned)
    }

    /// Non-blocking peek; `None` while the attempt is still running.
    #[must_use]
    pub fn try_get(&mut self) -> Option<&ConnectionEvent> {
        if let Some(rx) = self.rx.as_mut() {
            let event = match rx.try_recv() {
                Ok(event) => event,
                Err(oneshot::error::TryRecvError::Empty) => return None,
                Err(oneshot::error::TryRecvError::Closed) => orphaned(),
            };
            self.rx = None;
            self.event = Some(event);
        }
        self.event.as_ref()
    }
}

fn orphaned() -> ConnectionEvent {
    ConnectionEvent::Error(ConnectError::from(HandshakeFailure::Transport(
        std::io::Error::other("handshake task ended without an outcome"),
    )))
}
