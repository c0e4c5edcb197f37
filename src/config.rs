//! TV endpoint configuration.
//!
//! Provides a type-safe builder for the TV connection parameters: network
//! address, remote-channel port, client display name, fixed client id, and
//! the timing knobs of the session (heartbeat and reconnect intervals).
//!
//! # Example
//!
//! ```ignore
//! use samsung_remote::TvConfig;
//!
//! let config = TvConfig::new("192.168.1.9")
//!     .with_name("Living Room Remote")
//!     .with_client_id("MyPhoneRemote");
//!
//! let url = config.url(Some("17447402"))?;
//! // wss://192.168.1.9:8002/api/v2/channels/samsung.remote.control?name=...&id=...&token=...
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default remote-control channel port (token-based secure variant).
pub const DEFAULT_PORT: u16 = 8002;

/// Remote-control channel path on the TV.
const CHANNEL_PATH: &str = "/api/v2/channels/samsung.remote.control";

/// Default client display name shown in the TV's device list.
const DEFAULT_NAME: &str = "Remote";

/// Heartbeat interval while paired (no-op pointer move).
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(4);

/// Reconnect delay while pairing approval is still outstanding.
const DEFAULT_PAIRING_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Reconnect delay once a pairing has succeeded at least once.
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on a single WebSocket connect attempt.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// TvConfig
// ============================================================================

/// Samsung TV connection configuration.
///
/// Controls how the session connects: target address, channel port, the
/// identity presented to the TV, and the session timing intervals. The TV
/// address is assumed pre-configured; discovery is out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvConfig {
    /// TV network address (IP or hostname).
    pub host: String,

    /// Remote-control channel port.
    pub port: u16,

    /// Client display name, base64-encoded into the connection URL.
    pub name: String,

    /// Fixed client identifier, omitted from the URL when `None`.
    pub client_id: Option<String>,

    /// Heartbeat interval while paired.
    pub heartbeat_interval: Duration,

    /// Reconnect delay while pairing approval is outstanding.
    pub pairing_retry_delay: Duration,

    /// Reconnect delay once previously paired.
    pub reconnect_delay: Duration,

    /// Timeout for a single connection attempt.
    pub connect_timeout: Duration,
}

// ============================================================================
// Constructors
// ============================================================================

impl TvConfig {
    /// Creates a configuration for the given TV address with defaults.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            name: DEFAULT_NAME.to_string(),
            client_id: None,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            pairing_retry_delay: DEFAULT_PAIRING_RETRY_DELAY,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TvConfig {
    /// Sets the remote-control channel port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the client display name shown on the TV.
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the fixed client identifier.
    #[inline]
    #[must_use]
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the reconnect delay used while pairing is outstanding.
    #[inline]
    #[must_use]
    pub fn with_pairing_retry_delay(mut self, delay: Duration) -> Self {
        self.pairing_retry_delay = delay;
        self
    }

    /// Sets the reconnect delay used once previously paired.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the connect attempt timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl TvConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host or display name is empty, or
    /// any interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::config("TV host must not be empty"));
        }
        if self.name.is_empty() {
            return Err(Error::config("client name must not be empty"));
        }
        if self.heartbeat_interval.is_zero()
            || self.pairing_retry_delay.is_zero()
            || self.reconnect_delay.is_zero()
        {
            return Err(Error::config("session intervals must be non-zero"));
        }
        Ok(())
    }

    /// Builds the remote-control channel URL.
    ///
    /// The display name travels base64-encoded in the `name` query
    /// parameter. The `id` parameter is included when a client id is
    /// configured and `token` when a persisted pairing token is supplied;
    /// a first-time pairing attempt omits it entirely.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host does not form a valid URL.
    pub fn url(&self, token: Option<&str>) -> Result<Url> {
        let base = format!("wss://{}:{}{}", self.host, self.port, CHANNEL_PATH);
        let mut url =
            Url::parse(&base).map_err(|e| Error::config(format!("invalid TV address: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("name", &BASE64.encode(&self.name));

            if let Some(id) = &self.client_id {
                query.append_pair("id", id);
            }

            if let Some(token) = token {
                query.append_pair("token", token);
            }
        }

        Ok(url)
    }
}

// ============================================================================
// Tests
// ============================================================================
