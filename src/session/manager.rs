//! Session manager and event loop.
//!
//! The manager owns the one live transport connection, the heartbeat and
//! reconnect timers, and the token-store discipline (read before connect,
//! write on pairing). It runs as a spawned tokio task; callers hold a
//! cloneable [`ManagerHandle`] and talk to it over a command channel.
//!
//! # Event Loop
//!
//! Every external stimulus (caller commands, inbound frames, timer expiry)
//! is translated into a [`SessionEvent`] and fed to the pure state
//! machine; the effects it returns are the only place sockets, timers, and
//! storage get touched. Transport outcomes feed back in as further events,
//! so the loop never recurses.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, trace, warn};

use crate::config::TvConfig;
use crate::error::{Error, Result};
use crate::protocol::{InboundEvent, RemoteCommand};
use crate::session::state::{Effect, Session, SessionEvent, Status};
use crate::store::SharedTokenStore;
use crate::transport::{Connector, FrameSink, FrameStream};

// ============================================================================
// ManagerCommand
// ============================================================================

/// Commands accepted by the event loop.
enum ManagerCommand {
    /// Send a remote command (dropped when disconnected).
    Send(RemoteCommand),
    /// Request a connection attempt.
    Connect,
    /// Clear the pairing-required flag.
    ResetPairing,
    /// Stop the event loop.
    Shutdown,
}

/// Internal loop stimulus, gathered by the select arms.
enum LoopEvent {
    Command(Option<ManagerCommand>),
    Frame(Option<Result<String>>),
    HeartbeatDue,
    ReconnectDue,
}

// ============================================================================
// ManagerHandle
// ============================================================================

/// Cloneable handle to a running session manager.
///
/// All operations are non-blocking; the command channel is unbounded and
/// the manager drops (rather than queues) commands it cannot deliver.
#[derive(Clone)]
pub struct ManagerHandle {
    command_tx: mpsc::UnboundedSender<ManagerCommand>,
    status_rx: watch::Receiver<Status>,
}

impl ManagerHandle {
    /// Queues a remote command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the manager has shut down.
    pub fn send(&self, command: RemoteCommand) -> Result<()> {
        self.command_tx
            .send(ManagerCommand::Send(command))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Requests a connection attempt. Idempotent while one is outstanding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the manager has shut down.
    pub fn connect(&self) -> Result<()> {
        self.command_tx
            .send(ManagerCommand::Connect)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Clears the pairing-required flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the manager has shut down.
    pub fn reset_pairing(&self) -> Result<()> {
        self.command_tx
            .send(ManagerCommand::ResetPairing)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Stops the event loop. Safe to call more than once.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ManagerCommand::Shutdown);
    }

    /// Returns a watch receiver for the session status.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<Status> {
        self.status_rx.clone()
    }

    /// Returns the current status snapshot.
    #[must_use]
    pub fn current_status(&self) -> Status {
        *self.status_rx.borrow()
    }
}

// ============================================================================
// SessionManager
// ============================================================================

/// The event-loop task behind a [`ManagerHandle`].
pub struct SessionManager {
    config: TvConfig,
    store: SharedTokenStore,
    connector: Arc<dyn Connector>,
    session: Session,
    command_rx: mpsc::UnboundedReceiver<ManagerCommand>,
    status_tx: watch::Sender<Status>,
    writer: Option<Box<dyn FrameSink>>,
    reader: Option<Box<dyn FrameStream>>,
    heartbeat: Option<Interval>,
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl SessionManager {
    /// Spawns the event loop and returns its handle.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        config: TvConfig,
        store: SharedTokenStore,
        connector: Arc<dyn Connector>,
    ) -> ManagerHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let session = Session::new(config.pairing_retry_delay, config.reconnect_delay);
        let (status_tx, status_rx) = watch::channel(session.status());

        let manager = Self {
            config,
            store,
            connector,
            session,
            command_rx,
            status_tx,
            writer: None,
            reader: None,
            heartbeat: None,
            reconnect: None,
        };

        tokio::spawn(manager.run());

        ManagerHandle {
            command_tx,
            status_rx,
        }
    }

    /// Event loop: one stimulus at a time, no two callbacks concurrently.
    async fn run(mut self) {
        loop {
            let next = {
                let command_rx = &mut self.command_rx;
                let reader = self.reader.as_mut();
                let has_reader = reader.is_some();
                let heartbeat = self.heartbeat.as_mut();
                let has_heartbeat = heartbeat.is_some();
                let reconnect = self.reconnect.as_mut();
                let has_reconnect = reconnect.is_some();

                tokio::select! {
                    command = command_rx.recv() => LoopEvent::Command(command),

                    frame = async {
                        match reader {
                            Some(reader) => reader.next().await,
                            None => pending().await,
                        }
                    }, if has_reader => LoopEvent::Frame(frame),

                    () = async {
                        match heartbeat {
                            Some(heartbeat) => {
                                heartbeat.tick().await;
                            }
                            None => pending().await,
                        }
                    }, if has_heartbeat => LoopEvent::HeartbeatDue,

                    () = async {
                        match reconnect {
                            Some(reconnect) => reconnect.as_mut().await,
                            None => pending().await,
                        }
                    }, if has_reconnect => LoopEvent::ReconnectDue,
                }
            };

            match next {
                LoopEvent::Command(None) | LoopEvent::Command(Some(ManagerCommand::Shutdown)) => {
                    debug!("Session manager shutting down");
                    break;
                }

                LoopEvent::Command(Some(ManagerCommand::Send(command))) => {
                    self.handle_send(command).await;
                }

                LoopEvent::Command(Some(ManagerCommand::Connect)) => {
                    self.step(SessionEvent::ConnectRequested).await;
                }

                LoopEvent::Command(Some(ManagerCommand::ResetPairing)) => {
                    self.step(SessionEvent::PairingReset).await;
                }

                LoopEvent::Frame(frame) => self.handle_frame(frame).await,

                LoopEvent::HeartbeatDue => self.send_heartbeat().await,

                LoopEvent::ReconnectDue => {
                    self.reconnect = None;
                    trace!("Reconnect timer fired");
                    self.step(SessionEvent::ConnectRequested).await;
                }
            }
        }

        self.close_transport().await;
    }

    // ========================================================================
    // State Machine Driving
    // ========================================================================

    /// Feeds one event through the state machine and executes the effects.
    ///
    /// Effects that produce transport outcomes queue follow-up events, so
    /// a connect attempt and its result are handled in one pass.
    async fn step(&mut self, event: SessionEvent) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let effects = self.session.apply(event);
            self.publish_status();

            for effect in effects {
                if let Some(follow_up) = self.run_effect(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }

        self.publish_status();
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<SessionEvent> {
        match effect {
            Effect::OpenTransport => Some(self.open_transport().await),

            Effect::CloseTransport => {
                self.close_transport().await;
                None
            }

            Effect::PersistToken(token) => {
                // A dropped write degrades to re-pairing on the next run.
                match self.store.set(&token).await {
                    Ok(()) => debug!("Pairing token persisted"),
                    Err(e) => warn!(error = %e, "Failed to persist pairing token"),
                }
                None
            }

            Effect::StartHeartbeat => {
                let period = self.config.heartbeat_interval;
                let mut interval = time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.heartbeat = Some(interval);
                debug!(?period, "Heartbeat started");
                None
            }

            Effect::StopHeartbeat => {
                self.heartbeat = None;
                debug!("Heartbeat stopped");
                None
            }

            Effect::ScheduleReconnect(delay) => {
                debug!(?delay, "Reconnect scheduled");
                self.reconnect = Some(Box::pin(time::sleep(delay)));
                None
            }
        }
    }

    fn publish_status(&self) {
        let status = self.session.status();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Runs one connection attempt and reports its outcome as an event.
    async fn open_transport(&mut self) -> SessionEvent {
        // An explicit attempt supersedes any armed reconnect timer.
        self.reconnect = None;

        let token = match self.store.get().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Token read failed, connecting without token");
                None
            }
        };

        let url = match self.config.url(token.as_deref()) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Failed to build connection URL");
                return SessionEvent::TransportFailed;
            }
        };

        debug!(host = %self.config.host, has_token = token.is_some(), "Connecting to TV");

        match self.connector.connect(&url).await {
            Ok((sink, stream)) => {
                self.writer = Some(sink);
                self.reader = Some(stream);
                SessionEvent::TransportOpened
            }
            Err(e) => {
                if self.session.pairing_required() {
                    // Expected while the user approves pairing on the TV.
                    debug!(error = %e, "Connect failed during pairing approval window");
                } else {
                    warn!(error = %e, "Connect failed");
                }
                SessionEvent::TransportFailed
            }
        }
    }

    async fn close_transport(&mut self) {
        self.reader = None;
        if let Some(mut writer) = self.writer.take() {
            writer.close().await;
        }
    }

    // ========================================================================
    // Commands and Frames
    // ========================================================================

    async fn handle_send(&mut self, command: RemoteCommand) {
        if !self.session.transport_open() || self.writer.is_none() {
            // A stale remote action has no value: drop it, kick a reconnect.
            debug!(?command, "Dropping command while disconnected, triggering reconnect");
            self.step(SessionEvent::ConnectRequested).await;
            return;
        }

        self.write_frame(command).await;
    }

    async fn write_frame(&mut self, command: RemoteCommand) {
        let frame = match command.encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode command");
                return;
            }
        };

        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        if let Err(e) = writer.send(frame).await {
            warn!(error = %e, "Send failed, tearing down transport");
            self.step(SessionEvent::TransportFailed).await;
        } else {
            trace!(?command, "Command sent");
        }
    }

    async fn send_heartbeat(&mut self) {
        trace!("Heartbeat tick");
        self.write_frame(RemoteCommand::heartbeat()).await;
    }

    async fn handle_frame(&mut self, frame: Option<Result<String>>) {
        match frame {
            Some(Ok(text)) => {
                let event = InboundEvent::decode(&text);
                trace!(?event, "Inbound frame");
                self.step(SessionEvent::Frame(event)).await;
            }

            Some(Err(e)) => {
                if self.session.pairing_required() {
                    debug!(error = %e, "Transport error during pairing approval window");
                } else {
                    warn!(error = %e, "Transport error");
                }
                self.step(SessionEvent::TransportFailed).await;
            }

            None => {
                debug!("Transport closed by TV");
                self.step(SessionEvent::TransportClosed).await;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
