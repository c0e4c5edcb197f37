//! Samsung Smart TV remote-control client.
//!
//! This library implements the connection/session core of a TV remote:
//! establishing a WebSocket connection to the TV's remote-control channel,
//! performing the pairing handshake (token acquisition and persistence),
//! handling unauthorized/pending states, keeping the channel alive with
//! heartbeats, and recovering from disconnects with state-dependent
//! backoff.
//!
//! # Architecture
//!
//! - A pure state machine ([`session::state`]) decides every transition;
//!   the manager task executes its effects against the real transport,
//!   timers, and token store
//! - Exactly one live connection per [`Remote`]; concurrent connection
//!   attempts are guarded away
//! - Commands are fire-and-forget and never queued across a disconnect
//! - No failure in this crate is fatal: everything routes back to idle and
//!   a scheduled reconnect
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use samsung_remote::{FileTokenStore, Remote, Status, TvConfig, keys};
//!
//! #[tokio::main]
//! async fn main() -> samsung_remote::Result<()> {
//!     let config = TvConfig::new("192.168.1.9")
//!         .with_name("My Remote")
//!         .with_client_id("MyPhoneRemote");
//!     let store = Arc::new(FileTokenStore::new("/tmp/tv-token"));
//!
//!     let remote = Remote::new(config, store)?;
//!     remote.connect()?;
//!
//!     // Watch the session status; pairing may need on-TV approval.
//!     let mut status = remote.status();
//!     status.wait_for(|s| *s == Status::Paired).await.ok();
//!
//!     remote.send_key(keys::HOME)?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | TV endpoint configuration and URL construction |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Wire envelopes: outbound commands, inbound events |
//! | [`remote`] | High-level [`Remote`] façade |
//! | [`session`] | State machine and session manager (core) |
//! | [`store`] | Pairing-token persistence |
//! | [`transport`] | WebSocket transport and its test seam |

// ============================================================================
// Modules
// ============================================================================

/// TV endpoint configuration.
pub mod config;

/// Error types and result aliases.
pub mod error;

/// Wire protocol message types.
pub mod protocol;

/// High-level remote-control façade.
pub mod remote;

/// Session core: state machine and manager.
pub mod session;

/// Pairing token persistence.
pub mod store;

/// Transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::TvConfig;

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{InboundEvent, RemoteCommand, keys};

// Façade
pub use remote::Remote;

// Session types
pub use session::{ConnectionState, ManagerHandle, SessionManager, Status};

// Token stores
pub use store::{FileTokenStore, MemoryTokenStore, SharedTokenStore, TokenStore};

// Transport
pub use transport::{Connector, FrameSink, FrameStream, WsConnector};
