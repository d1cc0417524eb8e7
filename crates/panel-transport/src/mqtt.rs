//! Minimal MQTT 3.1.1 session, publish-only.
//!
//! The panel needs four packets: CONNECT/CONNACK for the handshake, QoS-0
//! PUBLISH for commands, PINGREQ to keep an idle session alive and
//! DISCONNECT for a clean close. No subscriptions exist; a background read
//! loop drains whatever the broker sends and its real job is noticing when
//! the socket dies, which it reports on the session event stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_channel::mpsc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{ConnectOptions, Session, SessionEvent, Transport, TransportError};

/// Incoming packets larger than this are treated as protocol corruption.
/// The panel subscribes to nothing, so legitimate broker traffic is tiny.
const MAX_INCOMING_PACKET: usize = 64 * 1024;

mod packet {
    use std::time::Duration;

    pub const CONNECT: u8 = 0x10;
    pub const CONNACK: u8 = 0x20;
    pub const PUBLISH: u8 = 0x30;
    pub const PINGREQ: u8 = 0xC0;
    pub const DISCONNECT: u8 = 0xE0;

    /// Remaining-length varint: 7 bits per byte, high bit set while more
    /// bytes follow.
    pub fn push_remaining_length(buf: &mut Vec<u8>, mut length: usize) {
        loop {
            let mut byte = (length % 128) as u8;
            length /= 128;
            if length > 0 {
                byte |= 0x80;
            }
            buf.push(byte);
            if length == 0 {
                break;
            }
        }
    }

    /// Length-prefixed UTF-8 string field.
    fn push_string(buf: &mut Vec<u8>, value: &str) {
        let length = value.len().min(usize::from(u16::MAX));
        buf.extend_from_slice(&(length as u16).to_be_bytes());
        buf.extend(value.as_bytes().iter().take(length));
    }

    fn finish(packet_type: u8, body: Vec<u8>) -> Vec<u8> {
        let mut packet = Vec::with_capacity(body.len() + 5);
        packet.push(packet_type);
        push_remaining_length(&mut packet, body.len());
        packet.extend_from_slice(&body);
        packet
    }

    pub fn connect(client_id: &str, keep_alive: Duration) -> Vec<u8> {
        let keep_alive_secs = keep_alive.as_secs().min(u64::from(u16::MAX)) as u16;
        let mut body = Vec::with_capacity(12 + client_id.len());
        push_string(&mut body, "MQTT");
        body.push(0x04); // protocol level 4 = 3.1.1
        body.push(0x02); // clean session, no will, no credentials
        body.extend_from_slice(&keep_alive_secs.to_be_bytes());
        push_string(&mut body, client_id);
        finish(CONNECT, body)
    }

    pub fn publish(topic: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::with_capacity(2 + topic.len() + payload.len());
        push_string(&mut body, topic);
        // QoS 0 carries no packet identifier between topic and payload.
        body.extend_from_slice(payload);
        finish(PUBLISH, body)
    }

    pub fn pingreq() -> Vec<u8> {
        vec![PINGREQ, 0]
    }

    pub fn disconnect() -> Vec<u8> {
        vec![DISCONNECT, 0]
    }
}

/// Opens plain-socket sessions to a broker.
#[derive(Debug, Clone, Copy, Default)]
pub struct MqttTransport;

impl MqttTransport {
    pub fn new() -> Self {
        MqttTransport
    }
}

impl Transport for MqttTransport {
    type Session = MqttSession;

    async fn connect(&self, options: &ConnectOptions) -> Result<MqttSession, TransportError> {
        match options.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, MqttSession::open(options))
                .await
                .map_err(|_| {
                    TransportError::ConnectionFailed(format!(
                        "connect to {} timed out after {}ms",
                        options.url,
                        limit.as_millis()
                    ))
                })?,
            None => MqttSession::open(options).await,
        }
    }
}

#[derive(Debug)]
pub struct MqttSession {
    writer: Arc<Mutex<OwnedWriteHalf>>,
    events: Option<mpsc::Receiver<SessionEvent>>,
    closing: Arc<AtomicBool>,
    ping_task: Option<JoinHandle<()>>,
    closed: bool,
}

impl MqttSession {
    async fn open(options: &ConnectOptions) -> Result<Self, TransportError> {
        let address = host_and_port(&options.url)?;
        let mut stream = TcpStream::connect(&address).await.map_err(|e| {
            TransportError::ConnectionFailed(format!("connect to {address} failed: {e}"))
        })?;

        stream
            .write_all(&packet::connect(&options.client_id, options.keep_alive))
            .await
            .map_err(io_error)?;
        read_connack(&mut stream).await?;

        let (read_half, write_half) = stream.into_split();
        let writer = Arc::new(Mutex::new(write_half));
        let closing = Arc::new(AtomicBool::new(false));
        let (event_tx, event_rx) = mpsc::channel(16);

        spawn_read_loop(read_half, event_tx, Arc::clone(&closing));
        let ping_task = spawn_keep_alive(
            Arc::clone(&writer),
            options.keep_alive,
            Arc::clone(&closing),
        );

        Ok(MqttSession {
            writer,
            events: Some(event_rx),
            closing,
            ping_task: Some(ping_task),
            closed: false,
        })
    }
}

impl Session for MqttSession {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::NotConnected);
        }
        let mut writer = self.writer.lock().await;
        writer
            .write_all(&packet::publish(topic, payload))
            .await
            .map_err(|e| TransportError::Io(format!("publish failed: {e}")))
    }

    fn take_events(&mut self) -> mpsc::Receiver<SessionEvent> {
        self.events.take().unwrap_or_else(crate::closed_event_stream)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.closing.store(true, Ordering::SeqCst);
        if let Some(task) = self.ping_task.take() {
            task.abort();
        }
        // Best effort: the socket may already be gone.
        let mut writer = self.writer.lock().await;
        let _ = writer.write_all(&packet::disconnect()).await;
        let _ = writer.shutdown().await;
        Ok(())
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        self.closing.store(true, Ordering::SeqCst);
        if let Some(task) = self.ping_task.take() {
            task.abort();
        }
    }
}

/// Accepts `mqtt://host[:port]`, `tcp://host[:port]` or a bare authority.
/// The default port is 1883.
fn host_and_port(url: &str) -> Result<String, TransportError> {
    let trimmed = url.trim();
    let authority = trimmed
        .strip_prefix("mqtt://")
        .or_else(|| trimmed.strip_prefix("tcp://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');
    if authority.is_empty() {
        return Err(TransportError::ConnectionFailed(format!(
            "no host in URL '{url}'"
        )));
    }
    if authority.contains(':') {
        Ok(authority.to_string())
    } else {
        Ok(format!("{authority}:1883"))
    }
}

fn io_error(error: std::io::Error) -> TransportError {
    TransportError::Io(error.to_string())
}

async fn read_connack(stream: &mut TcpStream) -> Result<(), TransportError> {
    let packet_type = stream.read_u8().await.map_err(|e| {
        TransportError::ConnectionFailed(format!("broker closed during handshake: {e}"))
    })?;
    if packet_type != packet::CONNACK {
        return Err(TransportError::Protocol(format!(
            "expected CONNACK, got packet type 0x{packet_type:02X}"
        )));
    }
    let length = read_remaining_length(stream).await?;
    if length != 2 {
        return Err(TransportError::Protocol(format!(
            "CONNACK with remaining length {length}"
        )));
    }
    let _session_present = stream.read_u8().await.map_err(io_error)?;
    let code = stream.read_u8().await.map_err(io_error)?;
    if code != 0 {
        return Err(connack_error(code));
    }
    Ok(())
}

fn connack_error(code: u8) -> TransportError {
    let reason = match code {
        1 => "unacceptable protocol version",
        2 => "client identifier rejected",
        3 => "server unavailable",
        4 => "bad user name or password",
        5 => "not authorized",
        _ => "unknown refusal code",
    };
    TransportError::ConnectionFailed(format!("broker refused the session: {reason} ({code})"))
}

async fn read_remaining_length<R>(reader: &mut R) -> Result<usize, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut value = 0usize;
    let mut shift = 0u32;
    loop {
        let byte = reader.read_u8().await.map_err(io_error)?;
        value |= usize::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > 21 {
            return Err(TransportError::Protocol(
                "remaining length varint too long".into(),
            ));
        }
    }
}

/// Drains broker traffic until the socket dies, then reports how it died.
/// A deliberate close sets `closing` first, so no event is emitted for it.
fn spawn_read_loop(
    mut reader: OwnedReadHalf,
    mut events: mpsc::Sender<SessionEvent>,
    closing: Arc<AtomicBool>,
) {
    tokio::spawn(async move {
        loop {
            let _packet_type = match reader.read_u8().await {
                Ok(byte) => byte,
                Err(error) => {
                    if !closing.load(Ordering::SeqCst) {
                        let event = if error.kind() == std::io::ErrorKind::UnexpectedEof {
                            SessionEvent::Closed
                        } else {
                            SessionEvent::Error {
                                message: error.to_string(),
                            }
                        };
                        let _ = events.try_send(event);
                    }
                    break;
                }
            };
            let length = match read_remaining_length(&mut reader).await {
                Ok(length) if length <= MAX_INCOMING_PACKET => length,
                _ => {
                    if !closing.load(Ordering::SeqCst) {
                        let _ = events.try_send(SessionEvent::Error {
                            message: "malformed packet from broker".to_string(),
                        });
                    }
                    break;
                }
            };
            let mut body = vec![0u8; length];
            if reader.read_exact(&mut body).await.is_err() {
                if !closing.load(Ordering::SeqCst) {
                    let _ = events.try_send(SessionEvent::Closed);
                }
                break;
            }
            // The panel never subscribes; PINGRESP and anything the broker
            // pushes are drained and dropped.
        }
    });
}

/// Pings at half the negotiated interval so the broker never reaps an idle
/// session. Stops silently when the session closes or the socket dies; the
/// read loop owns failure reporting.
fn spawn_keep_alive(
    writer: Arc<Mutex<OwnedWriteHalf>>,
    keep_alive: Duration,
    closing: Arc<AtomicBool>,
) -> JoinHandle<()> {
    let interval = (keep_alive / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            if closing.load(Ordering::SeqCst) {
                break;
            }
            let mut writer = writer.lock().await;
            if writer.write_all(&packet::pingreq()).await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_connect_packet_layout() {
        let bytes = packet::connect("panel", Duration::from_secs(60));
        let expected = [
            0x10, 17, // fixed header
            0, 4, b'M', b'Q', b'T', b'T', 4, 2, // protocol name, level, flags
            0, 60, // keep alive
            0, 5, b'p', b'a', b'n', b'e', b'l', // client id
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_publish_packet_layout() {
        let bytes = packet::publish("t", b"x");
        assert_eq!(bytes, [0x30, 4, 0, 1, b't', b'x']);
    }

    #[test]
    fn test_remaining_length_varint() {
        let encode = |length: usize| {
            let mut buf = Vec::new();
            packet::push_remaining_length(&mut buf, length);
            buf
        };
        assert_eq!(encode(0), [0x00]);
        assert_eq!(encode(127), [0x7F]);
        assert_eq!(encode(128), [0x80, 0x01]);
        assert_eq!(encode(321), [0xC1, 0x02]);
        assert_eq!(encode(16_384), [0x80, 0x80, 0x01]);
    }

    #[tokio::test]
    async fn test_remaining_length_round_trip() {
        for length in [0usize, 1, 127, 128, 321, 16_383, 16_384, 100_000] {
            let mut buf = Vec::new();
            packet::push_remaining_length(&mut buf, length);
            let mut cursor = std::io::Cursor::new(buf);
            assert_eq!(read_remaining_length(&mut cursor).await.unwrap(), length);
        }
    }

    #[test]
    fn test_host_and_port_parsing() {
        assert_eq!(host_and_port("mqtt://broker").unwrap(), "broker:1883");
        assert_eq!(host_and_port("tcp://host:99").unwrap(), "host:99");
        assert_eq!(host_and_port("host:99").unwrap(), "host:99");
        assert_eq!(host_and_port("mqtt://host:1883/").unwrap(), "host:1883");
        assert!(host_and_port("mqtt://").is_err());
    }

    async fn read_packet(socket: &mut tokio::net::TcpStream) -> (u8, Vec<u8>) {
        let packet_type = socket.read_u8().await.unwrap();
        let length = read_remaining_length(socket).await.unwrap();
        let mut body = vec![0u8; length];
        socket.read_exact(&mut body).await.unwrap();
        (packet_type, body)
    }

    #[tokio::test]
    async fn test_handshake_and_publish() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let (packet_type, body) = read_packet(&mut socket).await;
            assert_eq!(packet_type, 0x10);
            assert_eq!(&body[..6], &[0, 4, b'M', b'Q', b'T', b'T']);
            socket.write_all(&[0x20, 2, 0, 0]).await.unwrap();

            let (packet_type, body) = read_packet(&mut socket).await;
            assert_eq!(packet_type & 0xF0, 0x30);
            let topic_len = usize::from(u16::from_be_bytes([body[0], body[1]]));
            assert_eq!(&body[2..2 + topic_len], b"lights/control");
            assert_eq!(&body[2 + topic_len..], b"7,1,2,3,0");
        });

        let mut options = ConnectOptions::new(format!("mqtt://{address}"));
        options.client_id = "test-panel".to_string();
        let mut session = MqttTransport::new().connect(&options).await.unwrap();
        session.publish("lights/control", b"7,1,2,3,0").await.unwrap();
        server.await.unwrap();
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_session_reports_reason() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_packet(&mut socket).await;
            socket.write_all(&[0x20, 2, 0, 5]).await.unwrap();
        });

        let options = ConnectOptions::new(format!("mqtt://{address}"));
        let error = MqttTransport::new().connect(&options).await.unwrap_err();
        assert!(error.to_string().contains("not authorized"));
    }

    #[tokio::test]
    async fn test_server_drop_emits_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_packet(&mut socket).await;
            socket.write_all(&[0x20, 2, 0, 0]).await.unwrap();
            // Dropping the socket closes the session from the remote side.
        });

        let options = ConnectOptions::new(format!("mqtt://{address}"));
        let mut session = MqttTransport::new().connect(&options).await.unwrap();
        let mut events = session.take_events();
        assert_eq!(events.next().await, Some(SessionEvent::Closed));
    }

    #[tokio::test]
    async fn test_connect_timeout_fires() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            // Accept and go quiet: no CONNACK ever arrives.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let mut options = ConnectOptions::new(format!("mqtt://{address}"));
        options.connect_timeout = Some(Duration::from_millis(100));
        let error = MqttTransport::new().connect(&options).await.unwrap_err();
        assert!(error.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_take_events_twice_yields_ended_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_packet(&mut socket).await;
            socket.write_all(&[0x20, 2, 0, 0]).await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let options = ConnectOptions::new(format!("mqtt://{address}"));
        let mut session = MqttTransport::new().connect(&options).await.unwrap();
        let _first = session.take_events();
        let mut second = session.take_events();
        assert_eq!(second.next().await, None);
    }
}
