//! Pure session state machine.
//!
//! All connection/pairing logic lives here as a deterministic transition
//! function: the manager feeds [`SessionEvent`]s in and executes the
//! returned [`Effect`]s. No sockets, timers, or storage are touched in this
//! module, which is what makes the machine unit-testable without a TV.
//!
//! # States
//!
//! | State | Meaning |
//! |-------|---------|
//! | `Idle` | No transport; a reconnect may be pending |
//! | `Connecting` | WebSocket handshake in flight |
//! | `ConnectedUnpaired` | Transport open, waiting for the channel ack |
//! | `ConnectedPaired` | Channel ack received; heartbeat running |
//!
//! The mutable flags of the original design (reentrancy guard, pairing
//! flag, reconnect-pending) are fields of [`Session`] and transition
//! together with the state, never as free-floating globals.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::debug;

use crate::protocol::InboundEvent;

// ============================================================================
// ConnectionState
// ============================================================================

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport.
    Idle,
    /// Connection attempt in flight.
    Connecting,
    /// Transport open; channel ack outstanding.
    ConnectedUnpaired,
    /// Paired; commands flow and the heartbeat runs.
    ConnectedPaired,
}

// ============================================================================
// SessionEvent
// ============================================================================

/// Inputs to the state machine.
///
/// Transport callbacks, timer expiry, and caller requests all funnel
/// through this one enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A connection was requested (caller, façade, or reconnect timer).
    ConnectRequested,
    /// The transport handshake completed.
    TransportOpened,
    /// The transport closed.
    TransportClosed,
    /// The transport failed with an error.
    TransportFailed,
    /// An inbound frame was decoded.
    Frame(InboundEvent),
    /// The caller explicitly cleared the pairing-required flag.
    PairingReset,
}

// ============================================================================
// Effect
// ============================================================================

/// Outputs of a transition, executed by the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin a connection attempt (also cancels any armed reconnect timer).
    OpenTransport,
    /// Tear down the current transport.
    CloseTransport,
    /// Persist a freshly issued pairing token.
    PersistToken(String),
    /// Arm the heartbeat timer.
    StartHeartbeat,
    /// Disarm the heartbeat timer.
    StopHeartbeat,
    /// Arm the reconnect timer with the given delay.
    ScheduleReconnect(Duration),
}

// ============================================================================
// Status
// ============================================================================

/// Caller-visible session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not connected, nothing pending.
    Idle,
    /// Connection attempt in flight.
    Connecting,
    /// Transport open, waiting for the TV's channel ack.
    Connected,
    /// Paired and ready for commands.
    Paired,
    /// The TV rejected the client; approve pairing on the TV screen.
    PairingRequired,
    /// Disconnected with a reconnect scheduled.
    Retrying,
}

// ============================================================================
// Session
// ============================================================================

/// Session state: connection state plus the flags that travel with it.
///
/// Invariant kept with the manager: `reconnect_pending` is `true` exactly
/// while the reconnect timer is armed: transitions that set it emit
/// [`Effect::ScheduleReconnect`], and [`Effect::OpenTransport`] cancels the
/// timer on the manager side while the transition clears the flag.
#[derive(Debug)]
pub struct Session {
    state: ConnectionState,
    /// Reentrancy guard: set for the duration of a connection attempt.
    connect_in_flight: bool,
    /// Raised on `unauthorized`, cleared on pairing success or reset.
    pairing_required: bool,
    /// Whether any pairing has ever succeeded; selects the backoff delay.
    paired_once: bool,
    /// Whether a reconnect timer is armed.
    reconnect_pending: bool,
    pairing_retry_delay: Duration,
    reconnect_delay: Duration,
}

impl Session {
    /// Creates an idle session with the given backoff delays.
    #[must_use]
    pub const fn new(pairing_retry_delay: Duration, reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Idle,
            connect_in_flight: false,
            pairing_required: false,
            paired_once: false,
            reconnect_pending: false,
            pairing_retry_delay,
            reconnect_delay,
        }
    }

    /// Current connection state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `true` while the TV-side pairing approval is outstanding.
    #[inline]
    #[must_use]
    pub const fn pairing_required(&self) -> bool {
        self.pairing_required
    }

    /// Returns `true` if the transport is open (paired or not).
    #[inline]
    #[must_use]
    pub const fn transport_open(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::ConnectedUnpaired | ConnectionState::ConnectedPaired
        )
    }

    /// Caller-visible status snapshot.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self.state {
            ConnectionState::Connecting => Status::Connecting,
            ConnectionState::ConnectedUnpaired => Status::Connected,
            ConnectionState::ConnectedPaired => Status::Paired,
            ConnectionState::Idle => {
                if self.pairing_required {
                    Status::PairingRequired
                } else if self.reconnect_pending {
                    Status::Retrying
                } else {
                    Status::Idle
                }
            }
        }
    }

    /// Applies one event and returns the effects to execute.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        let before = self.state;
        let effects = self.transition(event);

        if before != self.state {
            debug!(from = ?before, to = ?self.state, "Session state transition");
        }

        effects
    }

    fn transition(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::ConnectRequested => self.on_connect_requested(),
            SessionEvent::TransportOpened => self.on_transport_opened(),
            SessionEvent::TransportClosed | SessionEvent::TransportFailed => self.on_disconnect(),
            SessionEvent::Frame(inbound) => self.on_frame(inbound),
            SessionEvent::PairingReset => {
                self.pairing_required = false;
                Vec::new()
            }
        }
    }

    fn on_connect_requested(&mut self) -> Vec<Effect> {
        // Reentrancy guard: one attempt at a time, extra requests no-op.
        if self.state != ConnectionState::Idle || self.connect_in_flight {
            debug!(state = ?self.state, "Connect request ignored, attempt already outstanding");
            return Vec::new();
        }

        self.state = ConnectionState::Connecting;
        self.connect_in_flight = true;
        self.reconnect_pending = false;
        vec![Effect::OpenTransport]
    }

    fn on_transport_opened(&mut self) -> Vec<Effect> {
        self.connect_in_flight = false;
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::ConnectedUnpaired;
        }
        Vec::new()
    }

    fn on_disconnect(&mut self) -> Vec<Effect> {
        let was_paired = self.state == ConnectionState::ConnectedPaired;
        self.state = ConnectionState::Idle;
        self.connect_in_flight = false;

        let mut effects = Vec::new();
        if was_paired {
            effects.push(Effect::StopHeartbeat);
        }
        effects.push(Effect::CloseTransport);

        // At most one pending reconnect, whatever the close/error sequence.
        if !self.reconnect_pending {
            self.reconnect_pending = true;
            effects.push(Effect::ScheduleReconnect(self.reconnect_delay_for_state()));
        }

        effects
    }

    fn on_frame(&mut self, inbound: InboundEvent) -> Vec<Effect> {
        match inbound {
            InboundEvent::Connected { token } => self.on_channel_connect(token),
            InboundEvent::Unauthorized => self.on_unauthorized(),
            InboundEvent::Other => Vec::new(),
        }
    }

    fn on_channel_connect(&mut self, token: Option<String>) -> Vec<Effect> {
        if !self.transport_open() {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if let Some(token) = token {
            effects.push(Effect::PersistToken(token));
        }

        if self.state == ConnectionState::ConnectedUnpaired {
            self.state = ConnectionState::ConnectedPaired;
            effects.push(Effect::StartHeartbeat);
        }

        self.pairing_required = false;
        self.paired_once = true;
        effects
    }

    fn on_unauthorized(&mut self) -> Vec<Effect> {
        self.pairing_required = true;

        let was_paired = self.state == ConnectionState::ConnectedPaired;
        self.state = ConnectionState::Idle;
        self.connect_in_flight = false;

        let mut effects = Vec::new();
        if was_paired {
            effects.push(Effect::StopHeartbeat);
        }
        effects.push(Effect::CloseTransport);

        // Retry at the short interval so the TV-side approval is picked up
        // without an app restart.
        if !self.reconnect_pending {
            self.reconnect_pending = true;
            effects.push(Effect::ScheduleReconnect(self.pairing_retry_delay));
        }

        effects
    }

    /// Backoff delay for the next reconnect: short while pairing is still
    /// outstanding, longer once previously paired.
    const fn reconnect_delay_for_state(&self) -> Duration {
        if self.paired_once && !self.pairing_required {
            self.reconnect_delay
        } else {
            self.pairing_retry_delay
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRING_DELAY: Duration = Duration::from_millis(3000);
    const RECONNECT_DELAY: Duration = Duration::from_millis(5000);

    fn session() -> Session {
        Session::new(PAIRING_DELAY, RECONNECT_DELAY)
    }

    /// Drives a session to `ConnectedPaired`.
    fn paired_session() -> Session {
        let mut s = session();
        s.apply(SessionEvent::ConnectRequested);
        s.apply(SessionEvent::TransportOpened);
        s.apply(SessionEvent::Frame(InboundEvent::Connected { token: None }));
        assert_eq!(s.state(), ConnectionState::ConnectedPaired);
        s
    }

    #[test]
    fn test_connect_from_idle() {
        let mut s = session();
        let effects = s.apply(SessionEvent::ConnectRequested);
        assert_eq!(effects, vec![Effect::OpenTransport]);
        assert_eq!(s.state(), ConnectionState::Connecting);
        assert_eq!(s.status(), Status::Connecting);
    }

    #[test]
    fn test_connect_is_reentrancy_guarded() {
        let mut s = session();
        s.apply(SessionEvent::ConnectRequested);

        // A second request while the attempt is outstanding is a no-op.
        assert!(s.apply(SessionEvent::ConnectRequested).is_empty());

        s.apply(SessionEvent::TransportOpened);
        assert!(s.apply(SessionEvent::ConnectRequested).is_empty());
    }

    #[test]
    fn test_open_then_ack_pairs_and_starts_heartbeat() {
        let mut s = session();
        s.apply(SessionEvent::ConnectRequested);
        s.apply(SessionEvent::TransportOpened);
        assert_eq!(s.state(), ConnectionState::ConnectedUnpaired);
        assert_eq!(s.status(), Status::Connected);

        let effects = s.apply(SessionEvent::Frame(InboundEvent::Connected {
            token: Some("17447402".into()),
        }));
        assert_eq!(
            effects,
            vec![
                Effect::PersistToken("17447402".into()),
                Effect::StartHeartbeat,
            ]
        );
        assert_eq!(s.state(), ConnectionState::ConnectedPaired);
        assert_eq!(s.status(), Status::Paired);
    }

    #[test]
    fn test_ack_without_token_persists_nothing() {
        let mut s = session();
        s.apply(SessionEvent::ConnectRequested);
        s.apply(SessionEvent::TransportOpened);

        let effects = s.apply(SessionEvent::Frame(InboundEvent::Connected { token: None }));
        assert_eq!(effects, vec![Effect::StartHeartbeat]);
    }

    #[test]
    fn test_single_pending_reconnect_for_any_close_sequence() {
        let mut s = paired_session();

        // Error followed by close on the same socket: only the first
        // disconnect schedules a reconnect.
        let first = s.apply(SessionEvent::TransportFailed);
        let scheduled = first
            .iter()
            .filter(|e| matches!(e, Effect::ScheduleReconnect(_)))
            .count();
        assert_eq!(scheduled, 1);

        for event in [
            SessionEvent::TransportClosed,
            SessionEvent::TransportFailed,
            SessionEvent::TransportClosed,
        ] {
            let effects = s.apply(event);
            assert!(
                !effects
                    .iter()
                    .any(|e| matches!(e, Effect::ScheduleReconnect(_))),
                "duplicate reconnect scheduled"
            );
        }
    }

    #[test]
    fn test_reconnect_delay_shorter_before_pairing() {
        // First close happens before any pairing success.
        let mut s = session();
        s.apply(SessionEvent::ConnectRequested);
        s.apply(SessionEvent::TransportOpened);
        let effects = s.apply(SessionEvent::TransportClosed);
        assert!(effects.contains(&Effect::ScheduleReconnect(PAIRING_DELAY)));

        // Second close happens after a successful pairing.
        s.apply(SessionEvent::ConnectRequested);
        s.apply(SessionEvent::TransportOpened);
        s.apply(SessionEvent::Frame(InboundEvent::Connected { token: None }));
        let effects = s.apply(SessionEvent::TransportClosed);
        assert!(effects.contains(&Effect::ScheduleReconnect(RECONNECT_DELAY)));
    }

    #[test]
    fn test_close_while_paired_stops_heartbeat() {
        let mut s = paired_session();
        let effects = s.apply(SessionEvent::TransportClosed);
        assert_eq!(effects[0], Effect::StopHeartbeat);
        assert_eq!(s.state(), ConnectionState::Idle);
        assert_eq!(s.status(), Status::Retrying);
    }

    #[test]
    fn test_close_while_unpaired_has_no_heartbeat_to_stop() {
        let mut s = session();
        s.apply(SessionEvent::ConnectRequested);
        s.apply(SessionEvent::TransportOpened);
        let effects = s.apply(SessionEvent::TransportClosed);
        assert!(!effects.contains(&Effect::StopHeartbeat));
    }

    #[test]
    fn test_unauthorized_raises_flag_and_retries_fast() {
        let mut s = session();
        s.apply(SessionEvent::ConnectRequested);
        s.apply(SessionEvent::TransportOpened);

        let effects = s.apply(SessionEvent::Frame(InboundEvent::Unauthorized));
        assert!(s.pairing_required());
        assert_eq!(s.status(), Status::PairingRequired);
        assert!(effects.contains(&Effect::CloseTransport));
        assert!(effects.contains(&Effect::ScheduleReconnect(PAIRING_DELAY)));
    }

    #[test]
    fn test_pairing_flag_cleared_by_connected_event() {
        let mut s = session();
        s.apply(SessionEvent::ConnectRequested);
        s.apply(SessionEvent::TransportOpened);
        s.apply(SessionEvent::Frame(InboundEvent::Unauthorized));
        assert!(s.pairing_required());

        // Flag survives the retry cycle until the TV acks the channel.
        s.apply(SessionEvent::ConnectRequested);
        assert!(s.pairing_required());
        s.apply(SessionEvent::TransportOpened);
        assert!(s.pairing_required());

        s.apply(SessionEvent::Frame(InboundEvent::Connected { token: None }));
        assert!(!s.pairing_required());
    }

    #[test]
    fn test_pairing_flag_cleared_by_explicit_reset() {
        let mut s = session();
        s.apply(SessionEvent::ConnectRequested);
        s.apply(SessionEvent::TransportOpened);
        s.apply(SessionEvent::Frame(InboundEvent::Unauthorized));
        assert!(s.pairing_required());

        s.apply(SessionEvent::PairingReset);
        assert!(!s.pairing_required());
    }

    #[test]
    fn test_unauthorized_after_pairing_uses_short_delay() {
        let mut s = paired_session();
        let effects = s.apply(SessionEvent::Frame(InboundEvent::Unauthorized));

        // Token revoked: back to the fast pairing retry, not the long delay.
        assert!(effects.contains(&Effect::StopHeartbeat));
        assert!(effects.contains(&Effect::ScheduleReconnect(PAIRING_DELAY)));
    }

    #[test]
    fn test_other_frames_are_ignored() {
        let mut s = paired_session();
        assert!(s.apply(SessionEvent::Frame(InboundEvent::Other)).is_empty());
        assert_eq!(s.state(), ConnectionState::ConnectedPaired);
    }

    #[test]
    fn test_repeat_ack_refreshes_token_without_rearming_heartbeat() {
        let mut s = paired_session();
        let effects = s.apply(SessionEvent::Frame(InboundEvent::Connected {
            token: Some("fresh".into()),
        }));
        assert_eq!(effects, vec![Effect::PersistToken("fresh".into())]);
    }

    #[test]
    fn test_frames_ignored_while_idle() {
        let mut s = session();
        let effects = s.apply(SessionEvent::Frame(InboundEvent::Connected {
            token: Some("stray".into()),
        }));
        assert!(effects.is_empty());
        assert_eq!(s.state(), ConnectionState::Idle);
    }

    #[test]
    fn test_status_idle_initially() {
        assert_eq!(session().status(), Status::Idle);
    }
}
