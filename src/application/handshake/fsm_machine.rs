use tracing::{debug, warn};

use crate::config::ConnectOptions;
use crate::domain::auth::{AuthHandler, Nonce};
use crate::protocol::wire::{
    ClientFrame, ConnectRequest, ServerFrame, ServerInfo, WireError, encode_frames,
};

use super::errors::HandshakeFailure;
use super::fsm_types::{HandshakeEvent, HandshakeOutcome, HandshakeState, Step};

/// Drives one INFO → sign → CONNECT → decision exchange.
///
/// The coordinator does no I/O. A driver feeds it server frames and external
/// signals (timer expiry, cancellation, transport failure) and acts on the
/// returned `Step`: write the bytes of `Step::Send`, stop at `Step::Finished`.
///
/// Ordering guarantees:
/// - `INFO` is fully processed, including signing and failure detection,
///   before any CONNECT bytes are returned.
/// - CONNECT is returned together with a PING so the server's PONG acts as
///   the acceptance signal.
/// - Exactly one `Step::Finished` is returned per instance; every later input
///   yields `Step::Ignored`.
///
/// Error strategy: nothing escapes as `Err` or panic. Every failure becomes
/// the attempt's `HandshakeOutcome`.
#[derive(Debug)]
pub struct HandshakeCoordinator {
    state: HandshakeState,
    auth: Option<AuthHandler>,
    template: ConnectRequest,
    info: Option<ServerInfo>,
    nonce: Option<Nonce>,
}

impl HandshakeCoordinator {
    /// Construct a coordinator for one attempt, starting in `AwaitingInfo`.
    #[must_use]
    pub fn new(options: &ConnectOptions) -> Self {
        Self::with_parts(options.auth_handler.clone(), options.connect_template())
    }

    /// Construct from an explicit auth handler and CONNECT template.
    #[must_use]
    pub fn with_parts(auth: Option<AuthHandler>, template: ConnectRequest) -> Self {
        Self {
            state: HandshakeState::AwaitingInfo,
            auth,
            template,
            info: None,
            nonce: None,
        }
    }

    fn state_ordinal(state: HandshakeState) -> u8 {
        match state {
            HandshakeState::AwaitingInfo => 0,
            HandshakeState::Signing => 1,
            HandshakeState::AwaitingServerDecision => 2,
            HandshakeState::Accepted | HandshakeState::Rejected | HandshakeState::LocalFailure => 3,
        }
    }

    fn apply(&mut self, ev: HandshakeEvent) -> Result<(), HandshakeFailure> {
        let old = self.state;
        let new = match (old, ev) {
            (HandshakeState::AwaitingInfo, HandshakeEvent::RecvInfo) => HandshakeState::Signing,
            (HandshakeState::Signing, HandshakeEvent::ConnectReady) => {
                HandshakeState::AwaitingServerDecision
            }
            (HandshakeState::AwaitingServerDecision, HandshakeEvent::ServerAccept) => {
                HandshakeState::Accepted
            }
            (
                HandshakeState::AwaitingInfo | HandshakeState::AwaitingServerDecision,
                HandshakeEvent::ServerReject,
            ) => HandshakeState::Rejected,
            (s, HandshakeEvent::Fail) if !s.is_terminal() => HandshakeState::LocalFailure,
            _ => {
                return Err(HandshakeFailure::Protocol(format!(
                    "invalid transition {ev:?} in {old:?}"
                )));
            }
        };
        debug_assert!(
            Self::state_ordinal(new) >= Self::state_ordinal(old),
            "state regression: {old:?} -> {new:?}"
        );
        debug!(from = ?old, to = ?new, "handshake transition");
        self.state = new;
        Ok(())
    }

    /// Move to `LocalFailure` and hand out the outcome.
    fn fail(&mut self, failure: HandshakeFailure) -> Step {
        if self.state.is_terminal() {
            debug!(state = ?self.state, %failure, "failure after terminal state ignored");
            return Step::Ignored;
        }
        warn!(state = ?self.state, %failure, "handshake failed");
        // Fail is valid from every non-terminal state.
        let _ = self.apply(HandshakeEvent::Fail);
        Step::Finished(HandshakeOutcome::LocalFailure(failure))
    }

    fn finish(&mut self, ev: HandshakeEvent, outcome: HandshakeOutcome) -> Step {
        match self.apply(ev) {
            Ok(()) => Step::Finished(outcome),
            Err(e) => self.fail(e),
        }
    }

    /// Feed one decoded server frame.
    pub fn on_frame(&mut self, frame: ServerFrame) -> Step {
        if self.state.is_terminal() {
            debug!(op = frame.op(), state = ?self.state, "late frame ignored");
            return Step::Ignored;
        }
        debug!(op = frame.op(), state = ?self.state, "server frame");
        match (self.state, frame) {
            (HandshakeState::AwaitingInfo, ServerFrame::Info(info)) => self.on_info(*info),
            (_, ServerFrame::Err(reason)) => {
                warn!(%reason, "server rejected connection");
                let ev = HandshakeEvent::ServerReject;
                self.finish(ev, HandshakeOutcome::Rejected(reason))
            }
            (HandshakeState::AwaitingServerDecision, ServerFrame::Pong | ServerFrame::Ok) => {
                tracing::info!(
                    server_id = self.info.as_ref().map_or("", |i| i.server_id.as_str()),
                    "server accepted connection"
                );
                self.finish(HandshakeEvent::ServerAccept, HandshakeOutcome::Accepted)
            }
            (HandshakeState::AwaitingServerDecision, ServerFrame::Ping) => {
                match encode_frames(&[ClientFrame::Pong]) {
                    Ok(bytes) => Step::Send(bytes),
                    Err(e) => self.fail(e.into()),
                }
            }
            (HandshakeState::AwaitingServerDecision, ServerFrame::Info(_)) => self.fail(
                HandshakeFailure::Protocol("second INFO received during handshake".into()),
            ),
            (state, frame) => self.fail(HandshakeFailure::Protocol(format!(
                "unexpected {} while {state:?}",
                frame.op()
            ))),
        }
    }

    /// Process the server `INFO`: sign its nonce (if any) and compose CONNECT.
    ///
    /// Returns `Step::Send` with `CONNECT` + `PING`, or `Step::Finished` with
    /// a `LocalFailure` if signing failed. In that case nothing is sent.
    pub fn on_info(&mut self, info: ServerInfo) -> Step {
        if let Err(e) = self.apply(HandshakeEvent::RecvInfo) {
            return match self.state {
                HandshakeState::AwaitingServerDecision => self.fail(HandshakeFailure::Protocol(
                    "second INFO received during handshake".into(),
                )),
                _ => self.fail(e),
            };
        }
        let mut connect = self.template.clone();
        match (info.challenge().cloned(), self.auth.as_ref()) {
            (Some(nonce), Some(auth)) => {
                debug!(id = %auth.id(), %nonce, "signing server nonce");
                match auth.sign(&nonce) {
                    Ok(sig) => connect.set_nkey_auth(auth.id(), &sig, &nonce),
                    Err(e) => {
                        self.info = Some(info);
                        return self.fail(HandshakeFailure::Signing(e));
                    }
                }
                self.nonce = Some(nonce);
            }
            (Some(nonce), None) => {
                debug!(%nonce, "server issued a nonce but no auth handler is configured");
            }
            (None, Some(auth)) => {
                debug!(id = %auth.id(), "server issued no nonce; connecting without signature");
            }
            (None, None) => {}
        }
        self.info = Some(info);
        let bytes = match encode_frames(&[ClientFrame::Connect(Box::new(connect)), ClientFrame::Ping])
        {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(e.into()),
        };
        match self.apply(HandshakeEvent::ConnectReady) {
            Ok(()) => Step::Send(bytes),
            Err(e) => self.fail(e),
        }
    }

    /// The server sent bytes that could not be decoded.
    pub fn on_wire_error(&mut self, err: WireError) -> Step {
        self.fail(HandshakeFailure::Wire(err))
    }

    /// The transport failed or reached EOF.
    pub fn on_transport_error(&mut self, err: std::io::Error) -> Step {
        self.fail(HandshakeFailure::Transport(err))
    }

    /// The connect timer fired.
    pub fn on_timeout(&mut self) -> Step {
        self.fail(HandshakeFailure::Timeout)
    }

    /// The caller cancelled the attempt.
    pub fn cancel(&mut self) -> Step {
        self.fail(HandshakeFailure::Cancelled)
    }

    /// Current handshake state.
    #[must_use]
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// `INFO` received for this attempt, if any.
    #[must_use]
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.info.as_ref()
    }

    /// Nonce that was signed for this attempt, if any.
    #[must_use]
    pub fn signed_nonce(&self) -> Option<&Nonce> {
        self.nonce.as_ref()
    }

    /// Consume the coordinator, returning the server `INFO`.
    #[must_use]
    pub fn into_server_info(self) -> Option<ServerInfo> {
        self.info
    }
}
