//! High-level remote-control façade.
//!
//! [`Remote`] is the public entry point: it wires the configuration, token
//! store, and transport into a running session manager and exposes the
//! small command API the UI layer calls.
//!
//! Commands are fire-and-forget. If the session is disconnected when a
//! command arrives, the command is dropped and a reconnect attempt is
//! triggered instead: a remote-control action has no value once stale, so
//! nothing is ever queued across a disconnect.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::TvConfig;
use crate::error::Result;
use crate::protocol::RemoteCommand;
use crate::session::{ManagerHandle, SessionManager, Status};
use crate::store::SharedTokenStore;
use crate::transport::{Connector, WsConnector};

// ============================================================================
// Remote
// ============================================================================

/// Remote-control handle to one Samsung TV.
///
/// Owns the session manager task; dropping the `Remote` (and any
/// outstanding status receivers) shuts the task down.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use samsung_remote::{FileTokenStore, Remote, TvConfig, keys};
///
/// #[tokio::main]
/// async fn main() -> samsung_remote::Result<()> {
///     let config = TvConfig::new("192.168.1.9").with_client_id("MyPhoneRemote");
///     let store = Arc::new(FileTokenStore::new("/tmp/tv-token"));
///
///     let remote = Remote::new(config, store)?;
///     remote.connect()?;
///
///     // Later, once the status stream reports `Paired`:
///     remote.send_key(keys::VOLUME_UP)?;
///     remote.send_pointer(5, -3)?;
///     Ok(())
/// }
/// ```
pub struct Remote {
    handle: ManagerHandle,
}

impl Remote {
    /// Creates a remote for the given TV using the WebSocket transport.
    ///
    /// Spawns the session manager task; must be called from within a tokio
    /// runtime. The session stays idle until [`Remote::connect`] or the
    /// first command.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the configuration is invalid.
    pub fn new(config: TvConfig, store: SharedTokenStore) -> Result<Self> {
        config.validate()?;
        let connector = Arc::new(WsConnector::new(config.connect_timeout));
        Ok(Self::with_connector(config, store, connector))
    }

    /// Creates a remote with a custom transport connector.
    ///
    /// The seam used by tests and by callers with unusual network setups.
    #[must_use]
    pub fn with_connector(
        config: TvConfig,
        store: SharedTokenStore,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let handle = SessionManager::spawn(config, store, connector);
        Self { handle }
    }

    /// Requests a connection attempt. Idempotent while one is outstanding.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConnectionClosed`] if the session manager
    /// has shut down.
    pub fn connect(&self) -> Result<()> {
        self.handle.connect()
    }

    /// Sends a remote key press, e.g. `KEY_VOLUP`.
    ///
    /// Dropped (with a reconnect kick) when disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConnectionClosed`] if the session manager
    /// has shut down.
    pub fn send_key(&self, code: impl Into<String>) -> Result<()> {
        self.handle.send(RemoteCommand::key(code))
    }

    /// Sends a relative pointer movement.
    ///
    /// Dropped (with a reconnect kick) when disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConnectionClosed`] if the session manager
    /// has shut down.
    pub fn send_pointer(&self, dx: i32, dy: i32) -> Result<()> {
        self.handle.send(RemoteCommand::pointer_move(dx, dy))
    }

    /// Sends an arbitrary [`RemoteCommand`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConnectionClosed`] if the session manager
    /// has shut down.
    pub fn send(&self, command: RemoteCommand) -> Result<()> {
        self.handle.send(command)
    }

    /// Clears the pairing-required flag after the user dismissed it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConnectionClosed`] if the session manager
    /// has shut down.
    pub fn reset_pairing(&self) -> Result<()> {
        self.handle.reset_pairing()
    }

    /// Returns a watch receiver for UI status display.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<Status> {
        self.handle.status()
    }

    /// Returns the current status snapshot.
    #[must_use]
    pub fn current_status(&self) -> Status {
        self.handle.current_status()
    }

    /// Stops the session manager task.
    pub fn shutdown(&self) {
        self.handle.shutdown();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::store::MemoryTokenStore;

    #[tokio::test]
    async fn test_new_validates_config() {
        let store = Arc::new(MemoryTokenStore::new());
        assert!(Remote::new(TvConfig::new(""), store).is_err());
    }

    #[tokio::test]
    async fn test_new_starts_idle() {
        let store = Arc::new(MemoryTokenStore::new());
        let remote = Remote::new(TvConfig::new("192.168.1.9"), store).expect("remote");
        assert_eq!(remote.current_status(), Status::Idle);
        remote.shutdown();
    }
}
