use futures::stream::StreamExt;
use futures_channel::mpsc;
use panel_protocol::{ControlError, LinkState, NoticeLevel, PanelEvent};
use panel_runtime::{actor_debug, actor_warn, Actor, LinkMessage};
use panel_transport::{ConnectOptions, Session, SessionEvent, Transport};

/// LinkActor owns the transport session and the connection state machine
///
/// Responsibilities:
/// - Maintain single source of truth for link state
/// - Validate and execute state transitions
/// - Open sessions on demand and release them on shutdown
/// - Emit state change events and connection notices to the panel
///
/// ## State Machine
///
/// For the complete transition diagram and invariants, see:
/// `panel-protocol/src/state.rs` - LinkState documentation
///
/// Key coordination patterns:
/// - **On-demand connect**: EnsureConnected from Disconnected opens a session inline
/// - **Event-driven loss**: session events drive Connected → Disconnected
/// - **No background retry**: a lost link stays down until the next command asks for it
pub struct LinkActor<T: Transport> {
    transport: T,
    options: ConnectOptions,
    topic: String,
    session: Option<T::Session>,
    state: LinkState,

    // Last state a connection notice was sent for; keeps "Connected" and
    // "Connection lost" from repeating when confirmations arrive twice
    last_reported: Option<LinkState>,

    // Session sequence tracking for detecting stale events
    // Incremented on each successful connect, used to validate SessionEvent
    session_sequence: u32,

    // Channel to send messages to self (for the event forwarder)
    self_tx: mpsc::Sender<LinkMessage>,
    event_tx: mpsc::Sender<PanelEvent>,
}

impl<T: Transport> LinkActor<T> {
    pub fn new(
        transport: T,
        options: ConnectOptions,
        topic: String,
        self_tx: mpsc::Sender<LinkMessage>,
        event_tx: mpsc::Sender<PanelEvent>,
    ) -> Self {
        Self {
            transport,
            options,
            topic,
            session: None,
            state: LinkState::Disconnected,
            last_reported: None,
            session_sequence: 0,
            self_tx,
            event_tx,
        }
    }

    /// Panel notifications are drop-tolerant; a full event queue must never
    /// stall the link.
    fn send_panel_event(&self, event: PanelEvent) {
        if let Err(e) = self.event_tx.clone().try_send(event) {
            actor_warn!("Panel event dropped: {:?}", e);
        }
    }

    /// Send a connection notice unless one was already sent for this state.
    fn notice_once(&mut self, state: LinkState, level: NoticeLevel, message: &str) {
        if self.last_reported == Some(state) {
            return;
        }
        self.last_reported = Some(state);
        self.send_panel_event(PanelEvent::notice(level, message));
    }

    /// Attempt to transition to a new state
    ///
    /// Returns Ok if transition is valid, Err otherwise
    fn transition(&mut self, new_state: LinkState) -> Result<(), ControlError> {
        if !self.state.can_transition_to(new_state) {
            return Err(ControlError::InvalidTransition(format!(
                "{:?} → {:?}",
                self.state, new_state
            )));
        }

        #[cfg(debug_assertions)]
        let old_state = self.state;

        self.state = new_state;

        // Notify the panel of the change (non-critical)
        self.send_panel_event(PanelEvent::StateChanged { state: new_state });

        actor_debug!("Link: {:?} → {:?}", old_state, new_state);

        Ok(())
    }

    /// Connect if disconnected; otherwise report on the current attempt.
    ///
    /// The connect runs inline, so the mailbox (and with it every queued
    /// command) waits until the attempt settles. Only one attempt can ever
    /// be in flight.
    async fn ensure_connected(&mut self) -> Result<(), ControlError> {
        match self.state {
            LinkState::Connected => return Ok(()),
            LinkState::Connecting => {
                return Err(ControlError::NotConnected(
                    "connection attempt already in progress".into(),
                ))
            }
            LinkState::Disconnected => {}
        }

        self.transition(LinkState::Connecting)?;

        match self.transport.connect(&self.options).await {
            Ok(mut session) => {
                self.session_sequence = self.session_sequence.wrapping_add(1);
                spawn_event_forwarder(
                    session.take_events(),
                    self.self_tx.clone(),
                    self.session_sequence,
                );
                self.session = Some(session);
                self.transition(LinkState::Connected)?;
                self.notice_once(LinkState::Connected, NoticeLevel::Success, "Connected");
                Ok(())
            }
            Err(e) => {
                self.transition(LinkState::Disconnected)?;
                // Failures are reported every time; only successes dedup
                self.last_reported = Some(LinkState::Disconnected);
                self.send_panel_event(PanelEvent::notice(
                    NoticeLevel::Error,
                    format!("Connection failed: {e}"),
                ));
                Err(ControlError::Transport(e.to_string()))
            }
        }
    }

    async fn publish(&mut self, payload: &[u8]) -> Result<(), ControlError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ControlError::NotConnected("no live session".into()))?;
        session
            .publish(&self.topic, payload)
            .await
            .map_err(|e| ControlError::Transmission(e.to_string()))
    }

    async fn handle_session_event(
        &mut self,
        session_id: u32,
        event: SessionEvent,
    ) -> Result<(), ControlError> {
        // Events from a replaced session must not disturb the current one
        if session_id != self.session_sequence {
            actor_debug!(
                "Ignoring stale session event (session_id={}, expected={})",
                session_id,
                self.session_sequence
            );
            return Ok(());
        }

        match event {
            SessionEvent::Connected => {
                // Some transports confirm more than once; the state machine
                // only hears the first
                actor_debug!("Dropping duplicate Connected confirmation");
                Ok(())
            }
            SessionEvent::Error { message } => {
                self.drop_session().await;
                self.transition(LinkState::Disconnected)?;
                self.last_reported = Some(LinkState::Disconnected);
                self.send_panel_event(PanelEvent::notice(
                    NoticeLevel::Error,
                    format!("Connection error: {message}"),
                ));
                Ok(())
            }
            SessionEvent::Closed | SessionEvent::Offline => {
                self.drop_session().await;
                self.transition(LinkState::Disconnected)?;
                self.notice_once(LinkState::Disconnected, NoticeLevel::Warning, "Connection lost");
                Ok(())
            }
        }
    }

    async fn drop_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            let _ = session.close().await;
        }
    }

    /// Release the session and settle in Disconnected. Idempotent; runs on
    /// the Shutdown message and again when the mailbox closes.
    async fn release(&mut self) {
        self.drop_session().await;
        if self.state != LinkState::Disconnected {
            let _ = self.transition(LinkState::Disconnected);
        }
    }
}

impl<T: Transport + 'static> Actor for LinkActor<T> {
    type Message = LinkMessage;

    fn name(&self) -> &'static str {
        "LinkActor"
    }

    async fn handle(&mut self, msg: LinkMessage) -> Result<(), ControlError> {
        match msg {
            LinkMessage::EnsureConnected { reply } => {
                // The outcome travels on the reply slot; the caller decides
                // how to surface it
                let outcome = self.ensure_connected().await;
                let _ = reply.send(outcome);
            }
            LinkMessage::Publish { payload, reply } => {
                let outcome = self.publish(&payload).await;
                let _ = reply.send(outcome);
            }
            LinkMessage::SessionEvent { session_id, event } => {
                self.handle_session_event(session_id, event).await?
            }
            LinkMessage::Shutdown { done } => {
                self.release().await;
                let _ = done.send(());
            }
        }
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.release().await;
    }
}

/// Forwards session events to the link mailbox, tagged with the session
/// sequence number so events from a replaced session are recognized as
/// stale. Ends with the stream, or early once the link goes away. A full
/// mailbox only costs the one event; the loop keeps draining so a later
/// Closed/Offline still reaches the link.
fn spawn_event_forwarder(
    mut events: mpsc::Receiver<SessionEvent>,
    mut link_tx: mpsc::Sender<LinkMessage>,
    session_id: u32,
) {
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match link_tx.try_send(LinkMessage::SessionEvent { session_id, event }) {
                Ok(()) => {}
                Err(e) if e.is_disconnected() => break,
                Err(e) => actor_debug!("Session event dropped: {:?}", e),
            }
        }
    });
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use panel_transport::TransportError;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct MockTransport {
        connect_attempts: Arc<AtomicU32>,
        fail_connects: Arc<AtomicBool>,
        published: Arc<Mutex<Vec<Vec<u8>>>>,
        closed: Arc<AtomicBool>,
    }

    struct MockSession {
        published: Arc<Mutex<Vec<Vec<u8>>>>,
        closed: Arc<AtomicBool>,
        events: Option<mpsc::Receiver<SessionEvent>>,
    }

    impl Transport for MockTransport {
        type Session = MockSession;

        async fn connect(&self, _options: &ConnectOptions) -> Result<MockSession, TransportError> {
            self.connect_attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_connects.load(Ordering::SeqCst) {
                return Err(TransportError::ConnectionFailed("refused".into()));
            }
            let (_event_tx, event_rx) = mpsc::channel(16);
            Ok(MockSession {
                published: Arc::clone(&self.published),
                closed: Arc::clone(&self.closed),
                events: Some(event_rx),
            })
        }
    }

    impl Session for MockSession {
        async fn publish(&mut self, _topic: &str, payload: &[u8]) -> Result<(), TransportError> {
            self.published.lock().unwrap().push(payload.to_vec());
            Ok(())
        }

        fn take_events(&mut self) -> mpsc::Receiver<SessionEvent> {
            self.events.take().unwrap_or_else(|| mpsc::channel(1).1)
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn create_test_actor() -> (
        LinkActor<MockTransport>,
        MockTransport,
        mpsc::Receiver<LinkMessage>,
        mpsc::Receiver<PanelEvent>,
    ) {
        let transport = MockTransport::default();
        let (link_tx, link_rx) = mpsc::channel(100);
        let (event_tx, event_rx) = mpsc::channel(100);
        let actor = LinkActor::new(
            transport.clone(),
            ConnectOptions::new("mqtt://localhost:1883"),
            "lights/control".to_string(),
            link_tx,
            event_tx,
        );
        (actor, transport, link_rx, event_rx)
    }

    fn drain_events(event_rx: &mut mpsc::Receiver<PanelEvent>) -> Vec<PanelEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = event_rx.try_next() {
            events.push(event);
        }
        events
    }

    fn count_notices(events: &[PanelEvent], level: NoticeLevel) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, PanelEvent::Notice { level: l, .. } if *l == level))
            .count()
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (actor, _, _, _) = create_test_actor();
        assert_eq!(actor.state, LinkState::Disconnected);
    }

    #[tokio::test]
    async fn test_ensure_connects_and_notifies_once() {
        let (mut actor, transport, _link_rx, mut event_rx) = create_test_actor();

        actor.ensure_connected().await.unwrap();

        assert_eq!(actor.state, LinkState::Connected);
        assert_eq!(transport.connect_attempts.load(Ordering::SeqCst), 1);

        let events = drain_events(&mut event_rx);
        assert_eq!(count_notices(&events, NoticeLevel::Success), 1);
        match &events[0] {
            PanelEvent::StateChanged { state } => assert_eq!(*state, LinkState::Connecting),
            _ => panic!("Wrong event"),
        }
        match &events[1] {
            PanelEvent::StateChanged { state } => assert_eq!(*state, LinkState::Connected),
            _ => panic!("Wrong event"),
        }
    }

    #[tokio::test]
    async fn test_ensure_twice_is_a_single_attempt() {
        let (mut actor, transport, _link_rx, mut event_rx) = create_test_actor();

        actor.ensure_connected().await.unwrap();
        actor.ensure_connected().await.unwrap();

        assert_eq!(transport.connect_attempts.load(Ordering::SeqCst), 1);
        let events = drain_events(&mut event_rx);
        assert_eq!(count_notices(&events, NoticeLevel::Success), 1);
    }

    #[tokio::test]
    async fn test_ensure_while_connecting_is_rejected() {
        let (mut actor, transport, _link_rx, _event_rx) = create_test_actor();

        // A second ensure arriving mid-attempt must not start another one
        actor.state = LinkState::Connecting;

        match actor.ensure_connected().await {
            Err(ControlError::NotConnected(reason)) => {
                assert!(reason.contains("in progress"));
            }
            other => panic!("Expected NotConnected, got {other:?}"),
        }
        assert_eq!(transport.connect_attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_connected_event_is_dropped() {
        let (mut actor, _, _link_rx, mut event_rx) = create_test_actor();

        actor.ensure_connected().await.unwrap();
        let _ = drain_events(&mut event_rx);

        let session_id = actor.session_sequence;
        actor
            .handle(LinkMessage::SessionEvent {
                session_id,
                event: SessionEvent::Connected,
            })
            .await
            .unwrap();

        assert_eq!(actor.state, LinkState::Connected);
        let events = drain_events(&mut event_rx);
        assert!(events.is_empty(), "duplicate confirmation leaked: {events:?}");
    }

    #[tokio::test]
    async fn test_connect_failure_reports_error() {
        let (mut actor, transport, _link_rx, mut event_rx) = create_test_actor();
        transport.fail_connects.store(true, Ordering::SeqCst);

        assert!(actor.ensure_connected().await.is_err());

        assert_eq!(actor.state, LinkState::Disconnected);
        let events = drain_events(&mut event_rx);
        assert_eq!(count_notices(&events, NoticeLevel::Error), 1);
        let has_reason = events.iter().any(|event| {
            matches!(event, PanelEvent::Notice { message, .. } if message.contains("Connection failed"))
        });
        assert!(has_reason);
    }

    #[tokio::test]
    async fn test_connection_lost_warns_once() {
        let (mut actor, transport, _link_rx, mut event_rx) = create_test_actor();

        actor.ensure_connected().await.unwrap();
        let _ = drain_events(&mut event_rx);
        let session_id = actor.session_sequence;

        actor
            .handle(LinkMessage::SessionEvent {
                session_id,
                event: SessionEvent::Closed,
            })
            .await
            .unwrap();
        actor
            .handle(LinkMessage::SessionEvent {
                session_id,
                event: SessionEvent::Closed,
            })
            .await
            .unwrap();

        assert_eq!(actor.state, LinkState::Disconnected);
        assert!(transport.closed.load(Ordering::SeqCst));
        let events = drain_events(&mut event_rx);
        assert_eq!(count_notices(&events, NoticeLevel::Warning), 1);
    }

    #[tokio::test]
    async fn test_reconnect_after_loss_notifies_again() {
        let (mut actor, transport, _link_rx, mut event_rx) = create_test_actor();

        actor.ensure_connected().await.unwrap();
        let session_id = actor.session_sequence;
        actor
            .handle(LinkMessage::SessionEvent {
                session_id,
                event: SessionEvent::Closed,
            })
            .await
            .unwrap();
        let _ = drain_events(&mut event_rx);

        actor.ensure_connected().await.unwrap();

        assert_eq!(transport.connect_attempts.load(Ordering::SeqCst), 2);
        let events = drain_events(&mut event_rx);
        assert_eq!(count_notices(&events, NoticeLevel::Success), 1);
    }

    #[tokio::test]
    async fn test_stale_session_events_are_ignored() {
        let (mut actor, _, _link_rx, mut event_rx) = create_test_actor();

        actor.ensure_connected().await.unwrap();
        let _ = drain_events(&mut event_rx);

        // An event from a previous session arrives after reconnect
        actor
            .handle(LinkMessage::SessionEvent {
                session_id: actor.session_sequence.wrapping_sub(1),
                event: SessionEvent::Closed,
            })
            .await
            .unwrap();

        assert_eq!(actor.state, LinkState::Connected);
        assert!(actor.session.is_some());
        assert!(drain_events(&mut event_rx).is_empty());
    }

    #[tokio::test]
    async fn test_publish_without_session() {
        let (mut actor, _, _link_rx, _event_rx) = create_test_actor();

        match actor.publish(b"1,0,0,0,255").await {
            Err(ControlError::NotConnected(_)) => {}
            other => panic!("Expected NotConnected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_session() {
        let (mut actor, transport, _link_rx, _event_rx) = create_test_actor();

        actor.ensure_connected().await.unwrap();
        actor.publish(b"7,10,20,30,0").await.unwrap();

        let published = transport.published.lock().unwrap();
        assert_eq!(published.as_slice(), [b"7,10,20,30,0".to_vec()]);
    }

    #[tokio::test]
    async fn test_forwarder_outlives_a_full_link_mailbox() {
        let (mut session_tx, session_rx) = mpsc::channel(16);
        // Buffer 0 with one sender: a single undelivered message fills it
        let (link_tx, mut link_rx) = mpsc::channel(0);
        spawn_event_forwarder(session_rx, link_tx, 7);

        // The first event lands; the second hits the full mailbox
        session_tx.try_send(SessionEvent::Connected).unwrap();
        session_tx.try_send(SessionEvent::Offline).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        match link_rx.try_next() {
            Ok(Some(LinkMessage::SessionEvent {
                session_id: 7,
                event: SessionEvent::Connected,
            })) => {}
            other => panic!("Wrong message type: {other:?}"),
        }

        // The forwarder kept draining, so a loss event still gets through
        session_tx.try_send(SessionEvent::Closed).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        match link_rx.try_next() {
            Ok(Some(LinkMessage::SessionEvent {
                event: SessionEvent::Closed,
                ..
            })) => {}
            other => panic!("Wrong message type: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shutdown_releases_session() {
        let (mut actor, transport, _link_rx, _event_rx) = create_test_actor();

        actor.ensure_connected().await.unwrap();

        let (done, confirmation) = futures_channel::oneshot::channel();
        actor.handle(LinkMessage::Shutdown { done }).await.unwrap();

        confirmation.await.unwrap();
        assert!(transport.closed.load(Ordering::SeqCst));
        assert_eq!(actor.state, LinkState::Disconnected);
        assert!(actor.session.is_none());
    }
}
