//! Transport layer between the session and the TV.
//!
//! The session's event loop needs to read inbound frames while writing
//! outbound ones, so a connection is handed over as a split
//! sink/stream pair. The seam is a set of object-safe traits: production
//! code uses the WebSocket implementation in [`ws`], tests inject a
//! channel-backed fake and drive the session without a live socket.

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket transport implementation.
pub mod ws;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

// ============================================================================
// Traits
// ============================================================================

/// Write half of an established connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Sends one text frame. Fire-and-forget at the protocol level; the
    /// error only reports transport-level failure.
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Closes the connection. Best-effort; errors are discarded.
    async fn close(&mut self);
}

/// Read half of an established connection.
#[async_trait]
pub trait FrameStream: Send {
    /// Waits for the next inbound text frame.
    ///
    /// Returns `None` once the connection is closed, `Some(Err(_))` on a
    /// transport error. Non-text frames are skipped internally.
    async fn next(&mut self) -> Option<Result<String>>;
}

/// Factory establishing connections to the TV.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a connection to `url` and returns its split halves.
    async fn connect(&self, url: &Url) -> Result<(Box<dyn FrameSink>, Box<dyn FrameStream>)>;
}

// ============================================================================
// Re-exports
// ============================================================================

pub use ws::WsConnector;
