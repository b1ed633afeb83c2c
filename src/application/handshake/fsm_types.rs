use super::errors::HandshakeFailure;

/// Coarse states of one handshake attempt (`HandshakeCoordinator`).
///
/// Transitions are monotonic; the three terminal states are absorbing and
/// exactly one of them is reached per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for the server's `INFO`.
    AwaitingInfo,
    /// `INFO` received; the auth handler is signing the nonce. CONNECT has
    /// not been produced yet.
    Signing,
    /// CONNECT (followed by PING) handed to the transport; waiting for PONG
    /// or `-ERR`.
    AwaitingServerDecision,
    /// Server accepted the connection.
    Accepted,
    /// Server answered with `-ERR`.
    Rejected,
    /// The attempt failed client side (signer, timeout, cancel, protocol, transport).
    LocalFailure,
}

impl HandshakeState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            HandshakeState::Accepted | HandshakeState::Rejected | HandshakeState::LocalFailure
        )
    }
}

/// Internal events that drive transitions inside `HandshakeCoordinator`.
///
/// Logical triggers, not on-wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeEvent {
    /// First `INFO` arrived.
    RecvInfo,
    /// CONNECT composed (signed or plain) and ready to transmit.
    ConnectReady,
    /// PONG or `+OK` after CONNECT.
    ServerAccept,
    /// `-ERR` from the server.
    ServerReject,
    /// Any client-side failure.
    Fail,
}

/// Terminal result of one attempt. Produced exactly once.
#[derive(Debug)]
pub enum HandshakeOutcome {
    Accepted,
    /// Server `-ERR` text, unmodified.
    Rejected(String),
    LocalFailure(HandshakeFailure),
}

/// What the transport driver must do after feeding the coordinator.
#[derive(Debug)]
pub enum Step {
    /// Write these bytes, then keep reading.
    Send(Vec<u8>),
    /// Nothing to write; keep reading.
    Pending,
    /// The attempt just reached its terminal state. Returned once.
    Finished(HandshakeOutcome),
    /// The attempt was already over; the input was dropped.
    Ignored,
}
