//! Control-line framing for the text protocol.
//!
//! Every frame the handshake cares about is a single `\r\n` terminated line:
//! `INFO {json}`, `-ERR '<text>'`, `+OK`, `PING`, `PONG`. `MSG`/`HMSG` headers
//! are recognised only so they can be reported as unexpected; their payloads
//! are never read during the handshake.

use core::fmt;

use crate::protocol::wire::{ConnectRequest, ServerInfo};

/// Default ceiling for a single control line.
pub const DEFAULT_MAX_CONTROL_LINE: usize = 4096;

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown protocol operation: {0}")]
    UnknownOperation(String),
    #[error("control line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
    #[error("control line is not valid UTF-8")]
    NotUtf8,
    #[error("empty control line")]
    Empty,
}

/// Frames the server sends while a connection is being established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    Info(Box<ServerInfo>),
    /// `-ERR` with its quotes stripped and whitespace trimmed.
    Err(String),
    Ok,
    Ping,
    Pong,
    /// `MSG`/`HMSG` control line, kept verbatim for diagnostics.
    Msg(String),
}

impl ServerFrame {
    /// Operation name, used in logs and protocol-violation messages.
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            ServerFrame::Info(_) => "INFO",
            ServerFrame::Err(_) => "-ERR",
            ServerFrame::Ok => "+OK",
            ServerFrame::Ping => "PING",
            ServerFrame::Pong => "PONG",
            ServerFrame::Msg(_) => "MSG",
        }
    }
}

impl fmt::Display for ServerFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.op())
    }
}

/// Frames the client sends during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    Connect(Box<ConnectRequest>),
    Ping,
    Pong,
}

impl ClientFrame {
    /// Append the encoded frame, including its `\r\n`, to `out`.
    ///
    /// # Errors
    /// Returns `WireError::Json` if the CONNECT payload cannot be serialized.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        match self {
            ClientFrame::Connect(req) => {
                out.extend_from_slice(b"CONNECT ");
                serde_json::to_writer(&mut *out, req.as_ref())?;
            }
            ClientFrame::Ping => out.extend_from_slice(b"PING"),
            ClientFrame::Pong => out.extend_from_slice(b"PONG"),
        }
        out.extend_from_slice(CRLF);
        Ok(())
    }
}

/// Encode a batch of frames into one buffer so they go out in a single write.
///
/// # Errors
/// Propagates the first `ClientFrame::encode_into` failure.
pub fn encode_frames(frames: &[ClientFrame]) -> Result<Vec<u8>, WireError> {
    let mut out = Vec::with_capacity(256);
    for frame in frames {
        frame.encode_into(&mut out)?;
    }
    Ok(out)
}

/// Parse one control line (without its terminator).
///
/// Operation names are case-insensitive.
///
/// # Errors
/// - `WireError::Empty` for a blank line.
/// - `WireError::UnknownOperation` for anything that is not a known operation.
/// - `WireError::Json` if an `INFO` payload is not valid JSON.
pub fn parse_line(line: &str) -> Result<ServerFrame, WireError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(WireError::Empty);
    }
    let (op, rest) = match line.find(char::is_whitespace) {
        Some(idx) => (&line[..idx], line[idx..].trim()),
        None => (line, ""),
    };
    match op.to_ascii_uppercase().as_str() {
        "INFO" => Ok(ServerFrame::Info(Box::new(serde_json::from_str(rest)?))),
        "-ERR" => Ok(ServerFrame::Err(unquote(rest).to_owned())),
        "+OK" => Ok(ServerFrame::Ok),
        "PING" => Ok(ServerFrame::Ping),
        "PONG" => Ok(ServerFrame::Pong),
        "MSG" | "HMSG" => Ok(ServerFrame::Msg(line.to_owned())),
        _ => Err(WireError::UnknownOperation(op.to_owned())),
    }
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(s)
        .trim()
}

/// Incremental decoder turning a byte stream into `ServerFrame`s.
///
/// Bytes are pushed as they arrive from the transport; `next_frame` yields a
/// frame once a full line is buffered. A bare `\n` terminator is tolerated.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    max_line: usize,
}

impl FrameDecoder {
    #[must_use]
    pub fn new(max_line: usize) -> Self {
        Self {
            buf: Vec::with_capacity(512),
            max_line,
        }
    }

    /// Buffer bytes read from the transport.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes buffered but not yet decoded.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Take the undecoded bytes, leaving the decoder empty.
    pub fn take_buffered(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.buf)
    }

    /// Decode the next complete frame, or `Ok(None)` if more bytes are needed.
    ///
    /// # Errors
    /// - `WireError::LineTooLong` if a line (complete or not) exceeds the limit.
    /// - `WireError::NotUtf8` if the line is not UTF-8.
    /// - Any `parse_line` error.
    pub fn next_frame(&mut self) -> Result<Option<ServerFrame>, WireError> {
        let Some(nl) = self.buf.iter().position(|b| *b == b'\n') else {
            if self.buf.len() > self.max_line {
                return Err(WireError::LineTooLong {
                    limit: self.max_line,
                });
            }
            return Ok(None);
        };
        if nl > self.max_line {
            return Err(WireError::LineTooLong {
                limit: self.max_line,
            });
        }
        let line: Vec<u8> = self.buf.drain(..=nl).collect();
        let line = line.as_slice();
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let text = core::str::from_utf8(line).map_err(|_| WireError::NotUtf8)?;
        parse_line(text).map(Some)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTROL_LINE)
    }
}
