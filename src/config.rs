//! Connection options.

use core::time::Duration;
use serde::{Deserialize, Deserializer};

use crate::domain::auth::AuthHandler;
use crate::protocol::wire::{ConnectRequest, DEFAULT_MAX_CONTROL_LINE};

/// Default time allowed for the whole handshake (INFO through server decision).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Options for one connection attempt.
///
/// Deserializable (e.g. from a JSON or TOML settings file) for every field
/// except `auth_handler`, which carries a live signer and must be set in code.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectOptions {
    /// Client name reported in `CONNECT.name`.
    #[serde(default)]
    pub name: Option<String>,

    /// Ask the server to acknowledge every frame with `+OK`.
    #[serde(default)]
    pub verbose: bool,

    /// Ask the server for strict subject checking.
    #[serde(default)]
    pub pedantic: bool,

    /// Receive our own published messages.
    #[serde(default = "default_echo")]
    pub echo: bool,

    /// Advertise header support.
    #[serde(default)]
    pub headers: bool,

    #[serde(default)]
    pub tls_required: bool,

    /// Handshake deadline; expiry is a terminal `CONNECTION_TIMEOUT`.
    #[serde(
        default = "default_connect_timeout",
        rename = "connect_timeout_ms",
        deserialize_with = "de_millis"
    )]
    pub connect_timeout: Duration,

    /// Longest control line accepted from the server.
    #[serde(default = "default_max_control_line")]
    pub max_control_line: usize,

    /// NKey identity and signer; `None` connects without NKey proof.
    #[serde(skip)]
    pub auth_handler: Option<AuthHandler>,
}

// Default value functions
fn default_echo() -> bool {
    true
}
fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}
fn default_max_control_line() -> usize {
    DEFAULT_MAX_CONTROL_LINE
}

fn de_millis<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    u64::deserialize(d).map(Duration::from_millis)
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            name: None,
            verbose: false,
            pedantic: false,
            echo: default_echo(),
            headers: false,
            tls_required: false,
            connect_timeout: default_connect_timeout(),
            max_control_line: default_max_control_line(),
            auth_handler: None,
        }
    }
}

impl ConnectOptions {
    #[must_use]
    pub fn with_auth_handler(mut self, auth: AuthHandler) -> Self {
        self.auth_handler = Some(auth);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_max_control_line(mut self, max: usize) -> Self {
        self.max_control_line = max;
        self
    }

    /// CONNECT payload without authentication fields.
    #[must_use]
    pub fn connect_template(&self) -> ConnectRequest {
        ConnectRequest {
            verbose: self.verbose,
            pedantic: self.pedantic,
            tls_required: self.tls_required,
            name: self.name.clone(),
            echo: self.echo,
            headers: self.headers,
            ..ConnectRequest::default()
        }
    }
}
