//! Session core: pairing state machine and connection management.
//!
//! Split in two along the testability seam:
//!
//! | Module | Description |
//! |--------|-------------|
//! | `state` | Pure state machine (no I/O): events in, effects out |
//! | `manager` | Event-loop task: transport, timers, token store |
//!
//! The manager translates everything that happens (caller commands,
//! inbound frames, timer expiry) into state-machine events, and executes
//! the effects the machine returns. Exactly one live session exists per
//! manager, and no two of its callbacks run concurrently.

// ============================================================================
// Submodules
// ============================================================================

/// Pure session state machine.
pub mod state;

/// Session manager and event loop.
pub mod manager;

// ============================================================================
// Re-exports
// ============================================================================

pub use manager::{ManagerHandle, SessionManager};
pub use state::{ConnectionState, Effect, Session, SessionEvent, Status};
