//! Async driver running one handshake attempt over a byte-stream transport.
//!
//! The driver owns the transport for the duration of the attempt. It feeds
//! decoded frames to a `HandshakeCoordinator`, writes whatever the
//! coordinator asks for, and races every read and write against the connect
//! timer and caller cancellation. When the coordinator finishes, the outcome
//! is classified and emitted as the attempt's single event.

use core::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::application::events::{self, ConnectionEvent, EventReceiver, EventSender};
use crate::application::handshake::{
    ConnectError, HandshakeCoordinator, HandshakeFailure, HandshakeOutcome, Step, classify,
};
use crate::config::ConnectOptions;
use crate::protocol::wire::FrameDecoder;

const READ_CHUNK: usize = 4096;
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Caller-side handle for one connection attempt.
///
/// `event()` is the single completion signal (`connect` or `error`);
/// `flush()` resolves only after `connect` has fired. Dropping the handle
/// cancels an attempt that is still running.
#[derive(Debug)]
pub struct ConnectionHandle<T> {
    events: EventReceiver,
    cancel: CancellationToken,
    task: JoinHandle<Option<(T, Vec<u8>)>>,
    _cancel_on_drop: DropGuard,
}

impl<T> ConnectionHandle<T> {
    /// Wait for the attempt's event. Safe to call repeatedly.
    pub async fn event(&mut self) -> &ConnectionEvent {
        self.events.recv().await
    }

    /// Resolve once `connect` has fired.
    ///
    /// # Errors
    /// Returns the classified error if the attempt emitted `error` instead.
    pub async fn flush(&mut self) -> Result<(), ConnectError> {
        match self.event().await {
            ConnectionEvent::Connect(_) => Ok(()),
            ConnectionEvent::Error(e) => Err(e.clone()),
        }
    }

    /// Cancel the attempt. No effect once it has finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token cancelling this attempt, for wiring into a caller's own shutdown.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the driver and take the transport back.
    ///
    /// `Some` only when the handshake was accepted. The `Vec<u8>` holds bytes
    /// the server sent after its acceptance that were already read off the
    /// transport; they belong in front of anything read next.
    pub async fn into_transport(self) -> Option<(T, Vec<u8>)> {
        let Self {
            task,
            _cancel_on_drop,
            ..
        } = self;
        match task.await {
            Ok(parts) => parts,
            Err(e) => {
                warn!(error = %e, "handshake task did not complete");
                None
            }
        }
    }
}

/// Start a handshake over an already connected transport.
///
/// Must be called from within a tokio runtime; the attempt runs on a spawned
/// task and reports through the returned handle.
pub fn connect<T>(options: ConnectOptions, transport: T) -> ConnectionHandle<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let cancel = CancellationToken::new();
    let (tx, rx) = events::channel();
    let task = tokio::spawn(drive(options, transport, cancel.clone(), tx));
    ConnectionHandle {
        events: rx,
        _cancel_on_drop: cancel.clone().drop_guard(),
        cancel,
        task,
    }
}

/// Open a TCP connection to `addr` and start the handshake on it.
///
/// The TCP connect counts against `options.connect_timeout`, and the
/// handshake then gets a fresh timer of the same length.
///
/// # Errors
/// - `CONNECTION_TIMEOUT` if the TCP connect does not finish in time.
/// - `CONNECTION_ERROR` if the TCP connect fails.
pub async fn connect_tcp<A: ToSocketAddrs>(
    addr: A,
    options: ConnectOptions,
) -> Result<ConnectionHandle<TcpStream>, ConnectError> {
    let stream = match tokio::time::timeout(options.connect_timeout, TcpStream::connect(addr)).await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(HandshakeFailure::Transport(e).into()),
        Err(_) => return Err(HandshakeFailure::Timeout.into()),
    };
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "could not set TCP_NODELAY");
    }
    Ok(connect(options, stream))
}

async fn drive<T>(
    options: ConnectOptions,
    mut transport: T,
    cancel: CancellationToken,
    events: EventSender,
) -> Option<(T, Vec<u8>)>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut coordinator = HandshakeCoordinator::new(&options);
    let mut decoder = FrameDecoder::new(options.max_control_line);
    let mut buf = vec![0u8; READ_CHUNK];
    let deadline = tokio::time::sleep(options.connect_timeout);
    tokio::pin!(deadline);

    let outcome = loop {
        let step = match decoder.next_frame() {
            Ok(Some(frame)) => coordinator.on_frame(frame),
            Err(e) => coordinator.on_wire_error(e),
            Ok(None) => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => coordinator.cancel(),
                    () = &mut deadline => coordinator.on_timeout(),
                    read = transport.read(&mut buf) => match read {
                        Ok(0) => coordinator.on_transport_error(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "connection closed before the handshake completed",
                        )),
                        Ok(n) => {
                            decoder.extend(&buf[..n]);
                            Step::Pending
                        }
                        Err(e) => coordinator.on_transport_error(e),
                    },
                }
            }
        };
        match step {
            Step::Send(bytes) => {
                // A peer that stops reading must not outlive the deadline.
                let sent = tokio::select! {
                    biased;
                    () = cancel.cancelled() => coordinator.cancel(),
                    () = &mut deadline => coordinator.on_timeout(),
                    res = write_all(&mut transport, &bytes) => match res {
                        Ok(()) => Step::Pending,
                        Err(e) => coordinator.on_transport_error(e),
                    },
                };
                if let Step::Finished(outcome) = sent {
                    break outcome;
                }
            }
            Step::Finished(outcome) => break outcome,
            Step::Pending | Step::Ignored => {}
        }
    };

    let accepted = matches!(outcome, HandshakeOutcome::Accepted);
    let event = match classify(outcome) {
        Ok(()) => {
            let info = coordinator.into_server_info().unwrap_or_default();
            info!(server_id = %info.server_id, "connected");
            ConnectionEvent::Connect(Box::new(info))
        }
        Err(e) => {
            warn!(code = %e.code(), error = %e, "connection attempt failed");
            ConnectionEvent::Error(e)
        }
    };
    if !events.emit(event) {
        debug!("connection handle dropped before the outcome was delivered");
    }

    if accepted {
        let leftover = decoder.take_buffered();
        if !leftover.is_empty() {
            debug!(bytes = leftover.len(), "returning bytes read past the acceptance");
        }
        Some((transport, leftover))
    } else {
        match tokio::time::timeout(SHUTDOWN_GRACE, transport.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "transport shutdown failed"),
            Err(_) => debug!("transport shutdown did not finish; dropping it"),
        }
        None
    }
}

async fn write_all<T: AsyncWrite + Unpin>(transport: &mut T, bytes: &[u8]) -> std::io::Result<()> {
    transport.write_all(bytes).await?;
    transport.flush().await
}
