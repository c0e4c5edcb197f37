//! Wire protocol message types.
//!
//! This module defines the JSON envelopes exchanged with the TV on the
//! remote-control channel.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `ms.remote.control` / `Click` | Client → TV | Key press |
//! | `ms.remote.control` / `Move` | Client → TV | Pointer move |
//! | `ms.channel.connect` | TV → Client | Pairing success (optional token) |
//! | `ms.channel.unauthorized` | TV → Client | Pairing rejection |
//!
//! Inbound decoding is tolerant: anything unrecognized becomes
//! [`InboundEvent::Other`]. The codec has no side effects; interpretation
//! belongs to the session layer.

// ============================================================================
// Submodules
// ============================================================================

/// Outbound command types and wire envelopes.
pub mod command;

/// Inbound event decoding.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{RemoteCommand, keys};
pub use event::InboundEvent;
