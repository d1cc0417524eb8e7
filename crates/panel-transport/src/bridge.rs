//! HTTP bridge session.
//!
//! For deployments where the broker is not reachable directly, a small web
//! service accepts `{topic, payload}` documents and republishes them. Each
//! publish is one POST; no socket stays open between commands, so the
//! session event stream stays silent for the life of the session.

use futures_channel::mpsc;
use serde::Serialize;

use crate::{ConnectOptions, Session, SessionEvent, Transport, TransportError};

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    topic: &'a str,
    payload: &'a str,
}

/// Opens sessions against an HTTP republishing bridge.
#[derive(Debug, Clone, Default)]
pub struct BridgeTransport;

impl BridgeTransport {
    pub fn new() -> Self {
        BridgeTransport
    }
}

impl Transport for BridgeTransport {
    type Session = BridgeSession;

    async fn connect(&self, options: &ConnectOptions) -> Result<BridgeSession, TransportError> {
        let endpoint = reqwest::Url::parse(&options.url).map_err(|e| {
            TransportError::ConnectionFailed(format!("bad bridge URL '{}': {e}", options.url))
        })?;
        let mut builder = reqwest::Client::builder();
        if let Some(limit) = options.connect_timeout {
            builder = builder.connect_timeout(limit);
        }
        let client = builder.build().map_err(|e| {
            TransportError::ConnectionFailed(format!("HTTP client setup failed: {e}"))
        })?;
        let (event_tx, event_rx) = mpsc::channel(1);
        Ok(BridgeSession {
            client,
            endpoint,
            events: Some(event_rx),
            _event_tx: event_tx,
            closed: false,
        })
    }
}

#[derive(Debug)]
pub struct BridgeSession {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    events: Option<mpsc::Receiver<SessionEvent>>,
    /// Held so the event stream stays open for the life of the session.
    _event_tx: mpsc::Sender<SessionEvent>,
    closed: bool,
}

impl Session for BridgeSession {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::NotConnected);
        }
        let payload = String::from_utf8_lossy(payload);
        let request = BridgeRequest {
            topic,
            payload: &payload,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Request(format!("bridge request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(TransportError::Request(format!(
                "bridge returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn take_events(&mut self) -> mpsc::Receiver<SessionEvent> {
        self.events.take().unwrap_or_else(crate::closed_event_stream)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}
