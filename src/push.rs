use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use tungstenite::{Message, WebSocket};
use url::Url;

use crate::state::StatusReport;

/// Name of the event that carries a state update.
pub const STATE_EVENT: &str = "get_state";

/// Upper bound for the tcp connect and for the websocket upgrade.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Deserialize)]
struct PushFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Decodes a text frame. Returns `None` for events other than `get_state`.
pub fn decode_frame(text: &str) -> anyhow::Result<Option<StatusReport>> {
    let frame: PushFrame = serde_json::from_str(text).context("malformed push frame")?;
    if frame.event != STATE_EVENT {
        return Ok(None);
    }
    if frame.data.is_null() {
        bail!("'{}' event without data", STATE_EVENT);
    }
    let report = serde_json::from_value(frame.data).context("malformed state in push frame")?;
    return Ok(Some(report));
}

/// Derives the push channel address from the device's http base url.
/// Only plain http devices can push: there is no tls on the push channel.
pub fn events_url(base_url: &str) -> anyhow::Result<String> {
    let base = base_url.trim_end_matches('/');
    if base.starts_with("https://") {
        bail!("push updates need a plain http device url, got {}; poll instead", base_url);
    }
    match base.strip_prefix("http://") {
        Some(rest) => Ok(format!("ws://{}/events", rest)),
        None => bail!("base url must start with http://: {}", base_url),
    }
}

/// What a single read from the push channel produced.
#[derive(Debug, PartialEq)]
pub enum PushEvent {
    State(StatusReport),
    /// Nothing to render: read timed out, or the frame was ignored.
    Idle,
    Closed,
}

/// A connected push channel.
pub struct PushConnection {
    socket: WebSocket<TcpStream>,
}

impl PushConnection {
    /// Connects to a `ws://` url. Reads give up after `read_timeout`
    /// so the caller gets a chance to stop between frames.
    pub fn connect(url: &str, read_timeout: Duration) -> anyhow::Result<PushConnection> {
        return PushConnection::connect_with_handshake_timeout(url, HANDSHAKE_TIMEOUT, read_timeout);
    }

    /// Like `connect`, failing if the device takes longer than
    /// `handshake_timeout` to accept the connection or answer the upgrade.
    pub fn connect_with_handshake_timeout(
        url: &str,
        handshake_timeout: Duration,
        read_timeout: Duration,
    ) -> anyhow::Result<PushConnection> {
        let parsed = Url::parse(url).with_context(|| format!("invalid push url {}", url))?;
        if parsed.scheme() != "ws" {
            bail!("unsupported push url scheme '{}'", parsed.scheme());
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| anyhow!("push url has no host: {}", url))?;
        let port = parsed.port_or_known_default().unwrap_or(80);
        let addr = (host, port)
            .to_socket_addrs()
            .with_context(|| format!("can't resolve {}:{}", host, port))?
            .next()
            .ok_or_else(|| anyhow!("{}:{} resolved to no address", host, port))?;
        let stream = TcpStream::connect_timeout(&addr, handshake_timeout)
            .with_context(|| format!("failed to connect to {}", addr))?;
        stream.set_read_timeout(Some(handshake_timeout))?;
        stream.set_write_timeout(Some(handshake_timeout))?;
        let (mut socket, _response) = tungstenite::client(url, stream)
            .map_err(|e| anyhow!("websocket handshake with {} failed: {}", url, e))?;
        socket.get_mut().set_read_timeout(Some(read_timeout))?;
        log::info!("subscribed to {}", url);
        return Ok(PushConnection { socket });
    }

    pub fn next(&mut self) -> anyhow::Result<PushEvent> {
        match self.socket.read() {
            Ok(Message::Text(text)) => match decode_frame(&text) {
                Ok(Some(report)) => Ok(PushEvent::State(report)),
                Ok(None) => {
                    log::debug!("ignoring push frame {}", text);
                    Ok(PushEvent::Idle)
                }
                Err(e) => {
                    log::warn!("{:#}", e);
                    Ok(PushEvent::Idle)
                }
            },
            Ok(Message::Close(_)) => Ok(PushEvent::Closed),
            Ok(_) => Ok(PushEvent::Idle),
            Err(tungstenite::Error::Io(e))
                if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut =>
            {
                Ok(PushEvent::Idle)
            }
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                Ok(PushEvent::Closed)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn close(mut self) {
        let _ = self.socket.close(None);
        let _ = self.socket.flush();
    }
}
