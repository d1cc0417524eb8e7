//! # Panel Transport
//!
//! Session-layer implementations for the control engine. Two kinds of
//! session exist: a minimal pub/sub socket client ([`mqtt`]) and an HTTP
//! bridge ([`bridge`]) that wraps each publish in a POST. The link actor
//! drives either through the [`Transport`]/[`Session`] traits and never
//! sees which one it holds.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

use std::future::Future;
use std::time::Duration;

use futures_channel::mpsc;
use thiserror::Error;

pub mod bridge;
pub mod mqtt;

pub use bridge::{BridgeSession, BridgeTransport};
pub use mqtt::{MqttSession, MqttTransport};

/// Default keep-alive interval when the configuration does not set one.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Not connected")]
    NotConnected,
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Other: {0}")]
    Other(String),
}

/// Connection parameters shared by every session kind.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Where to connect. The scheme picks the session kind at the
    /// composition root; the transports themselves accept what they get.
    pub url: String,
    /// Client identity announced to the broker.
    pub client_id: String,
    /// Ping interval keeping an otherwise idle session open.
    pub keep_alive: Duration,
    /// Abort a connect attempt after this long. `None` waits indefinitely;
    /// a stuck attempt then only resolves through a transport error.
    pub connect_timeout: Option<Duration>,
}

impl ConnectOptions {
    pub fn new(url: impl Into<String>) -> Self {
        ConnectOptions {
            url: url.into(),
            client_id: "panel".to_string(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            connect_timeout: None,
        }
    }
}

/// Session-level happenings, surfaced asynchronously after connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The transport (re)confirmed the session. Duplicates possible.
    Connected,
    /// The session hit an error and should be considered gone.
    Error { message: String },
    /// The remote side closed the session.
    Closed,
    /// The session lost connectivity without a close.
    Offline,
}

/// Something that can open sessions.
///
/// The async methods are declared as `Send` futures so actors generic over
/// a transport can run on a multithreaded executor; implementations write
/// plain `async fn` (Rust 1.75+). The engine is generic over this, so tests
/// substitute in-memory fakes freely.
pub trait Transport: Send {
    type Session: Session;

    /// Open a session. Suspends the caller until the transport confirms or
    /// fails; there is no partial result.
    fn connect(
        &self,
        options: &ConnectOptions,
    ) -> impl Future<Output = Result<Self::Session, TransportError>> + Send;
}

/// An open session.
pub trait Session: Send {
    /// Publish one payload on a topic.
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Hand out the session event stream. May be taken once; later calls
    /// return a stream that ends immediately.
    fn take_events(&mut self) -> mpsc::Receiver<SessionEvent>;

    /// Close the session and release its resources. Idempotent.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// A receiver whose sender is already gone; the stream ends immediately.
/// Backs repeat calls to [`Session::take_events`].
pub(crate) fn closed_event_stream() -> mpsc::Receiver<SessionEvent> {
    let (_tx, rx) = mpsc::channel(1);
    rx
}
