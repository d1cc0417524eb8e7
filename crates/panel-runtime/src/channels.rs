use futures_channel::{mpsc, oneshot};
use panel_protocol::{ControlError, PanelCommand, PanelEvent};
use panel_transport::SessionEvent;

/// Message types for each actor in the engine.
///
/// Dispatch runs on [`PanelCommand`] directly; the link and dimmer actors
/// have their own internal vocabularies below.
pub enum LinkMessage {
    /// Connect if disconnected, otherwise confirm the current session.
    /// Replies once the attempt settles.
    EnsureConnected {
        reply: oneshot::Sender<Result<(), ControlError>>,
    },
    /// Publish one payload on the configured command topic.
    Publish {
        payload: Vec<u8>,
        reply: oneshot::Sender<Result<(), ControlError>>,
    },
    /// Event forwarded from the live session's event stream.
    SessionEvent {
        /// Session sequence number to match against the current session
        session_id: u32,
        event: SessionEvent,
    },
    /// Release the session and stop. Replies when the link is down.
    Shutdown { done: oneshot::Sender<()> },
}

// Manual Debug implementation to handle the oneshot reply slots
impl std::fmt::Debug for LinkMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnsureConnected { .. } => f
                .debug_struct("EnsureConnected")
                .field("reply", &"<oneshot>")
                .finish(),
            Self::Publish { payload, .. } => f
                .debug_struct("Publish")
                .field("payload", payload)
                .field("reply", &"<oneshot>")
                .finish(),
            Self::SessionEvent { session_id, event } => f
                .debug_struct("SessionEvent")
                .field("session_id", session_id)
                .field("event", event)
                .finish(),
            Self::Shutdown { .. } => f.debug_struct("Shutdown").field("done", &"<oneshot>").finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DimmerMessage {
    /// Begin the brightness sweep. Idempotent while already sweeping.
    Start,
    /// Stop the sweep and hold the current brightness.
    Stop,
}

/// Handles for spawning actors
pub struct EngineHandles {
    pub dispatch_rx: mpsc::Receiver<PanelCommand>,
    pub link_rx: mpsc::Receiver<LinkMessage>,
    pub dimmer_rx: mpsc::Receiver<DimmerMessage>,
    pub event_tx: mpsc::Sender<PanelEvent>,
}

/// Channel manager for actor communication
///
/// This manages all communication channels between actors and provides
/// a unified interface for sending commands.
pub struct ChannelManager {
    // Senders for each actor (all Clone)
    // Using bounded channels to prevent memory exhaustion under load
    dispatch_tx: mpsc::Sender<PanelCommand>,
    link_tx: mpsc::Sender<LinkMessage>,
    dimmer_tx: mpsc::Sender<DimmerMessage>,

    // Event receiver (NOT cloned, replaced with dummy in Clone impl)
    // Note: Clone creates a disconnected receiver - use take_event_receiver() before cloning
    event_rx: mpsc::Receiver<PanelEvent>,
}

impl Clone for ChannelManager {
    fn clone(&self) -> Self {
        // Create a dummy receiver for API compatibility
        // Note: This receiver is intentionally disconnected and will never receive events
        // The real event_rx should be taken with take_event_receiver() before cloning
        let (_dummy_tx, dummy_rx) = mpsc::channel(1);
        Self {
            dispatch_tx: self.dispatch_tx.clone(),
            link_tx: self.link_tx.clone(),
            dimmer_tx: self.dimmer_tx.clone(),
            event_rx: dummy_rx, // Dummy receiver (disconnected)
        }
    }
}

impl ChannelManager {
    /// Create a new channel manager and actor handles
    ///
    /// Returns (ChannelManager for the panel surface, EngineHandles for spawning actors)
    ///
    /// Channel capacities:
    /// - dispatch_tx: 256 - Panel commands (user driven, plus dim pulses at 5 Hz)
    /// - link_tx: 64 - Connection control and session events (low frequency)
    /// - dimmer_tx: 16 - Sweep start/stop (rare)
    /// - event_tx: 1024 - Events for the panel surface (notices, fixture snapshots, dim levels)
    pub fn new() -> (Self, EngineHandles) {
        let (dispatch_tx, dispatch_rx) = mpsc::channel(256);
        let (link_tx, link_rx) = mpsc::channel(64);
        let (dimmer_tx, dimmer_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(1024);

        let handles = EngineHandles {
            dispatch_rx,
            link_rx,
            dimmer_rx,
            event_tx,
        };

        let manager = Self {
            dispatch_tx,
            link_tx,
            dimmer_tx,
            event_rx,
        };

        (manager, handles)
    }

    /// Send a panel command to the dispatch actor
    pub fn send_command(&self, cmd: PanelCommand) -> Result<(), String> {
        self.dispatch_tx.clone().try_send(cmd).map_err(|e| {
            if e.is_full() {
                "Engine overloaded: too many pending commands. Please slow down.".to_string()
            } else {
                "Engine stopped: command dispatch unavailable.".to_string()
            }
        })
    }

    /// Get mutable reference to event receiver
    ///
    /// This allows the panel surface to poll for events from actors
    pub fn event_receiver(&mut self) -> &mut mpsc::Receiver<PanelEvent> {
        &mut self.event_rx
    }

    /// Take ownership of event receiver
    ///
    /// This allows the panel surface to move the receiver into its own task
    pub fn take_event_receiver(&mut self) -> mpsc::Receiver<PanelEvent> {
        let (_new_tx, new_rx) = mpsc::channel(1);
        // Note: _new_tx is dropped, so events sent after this call will be lost
        // This is intentional - the receiver should only be taken once
        std::mem::replace(&mut self.event_rx, new_rx)
    }

    /// Clone senders for direct actor-to-actor communication
    ///
    /// These clones can be passed to actors for internal messaging
    pub fn dispatch_sender(&self) -> mpsc::Sender<PanelCommand> {
        self.dispatch_tx.clone()
    }

    pub fn link_sender(&self) -> mpsc::Sender<LinkMessage> {
        self.link_tx.clone()
    }

    pub fn dimmer_sender(&self) -> mpsc::Sender<DimmerMessage> {
        self.dimmer_tx.clone()
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new().0
    }
}
