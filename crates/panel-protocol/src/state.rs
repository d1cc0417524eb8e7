/// # Link State Machine
///
/// The panel owns exactly one transport link, and the link owns this state.
/// Every mutation goes through the link actor's transition function, which
/// validates against the table below; no other component writes the state,
/// they read snapshots carried on the event channel.
///
/// ## State Transition Diagram
///
/// ```text
///                     connect requested
///     Disconnected ──────────────────────> Connecting
///          ^                                    │
///          │  connect failed / shutdown         │ transport
///          │<───────────────────────────────────┤ confirmed
///          │                                    v
///          │        error / closed /        Connected
///          │<────── offline / shutdown ─────────┘
/// ```
///
/// ## Transition Triggers
///
/// Transitions are driven only by transport outcomes, with one exception:
/// entering `Connecting` is the guarded connect request itself. A second
/// connect request while `Connecting` or `Connected` is a no-op; the
/// idempotency guard returns before the state is touched, so at most one
/// connect attempt is ever in flight.
///
/// ## State Invariants
///
/// - **Disconnected**: no session held; the next send may start a connection
/// - **Connecting**: one connect attempt in flight, caller suspended on it
/// - **Connected**: session held; publishes may be attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LinkState {
    /// No session, ready to connect
    Disconnected,

    /// Connect attempt in flight
    Connecting,

    /// Session established and operational
    Connected,
}

impl LinkState {
    /// User-facing status text
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
        }
    }

    /// What color should the status indicator be?
    pub fn indicator_color(&self) -> &'static str {
        match self {
            Self::Connected => "rgb(95, 200, 85)",     // Green
            Self::Disconnected => "rgb(240, 105, 95)", // Red
            Self::Connecting => "rgb(245, 190, 80)",   // Orange
        }
    }

    /// Validate if transition to new_state is allowed from current state
    pub fn can_transition_to(&self, new_state: LinkState) -> bool {
        use LinkState::*;

        match (self, new_state) {
            // From Disconnected
            (Disconnected, Connecting) => true, // Connect requested
            (Disconnected, Disconnected) => true, // Idempotent (shutdown while idle)

            // From Connecting
            (Connecting, Connected) => true, // Transport confirmed the session
            (Connecting, Disconnected) => true, // Connect failed, or shutdown raced it

            // From Connected
            (Connected, Disconnected) => true, // Error, close, offline or shutdown

            // All other transitions are invalid. Duplicate transport
            // confirmations are dropped before reaching the state machine.
            _ => false,
        }
    }
}
